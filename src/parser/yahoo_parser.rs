// Yahoo Finance chart and quoteSummary payload parsing
use crate::model::{Bar, InstrumentInfo, ParserError};
use crate::utils::date_from_timestamp;
use serde::Deserialize;

pub trait Parser {
    fn parse(&self, body: &str) -> Result<ChartData, ParserError>;
}

/// Bars and the metadata embedded in a chart response.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    pub bars: Vec<Bar>,
    pub info: InstrumentInfo,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(rename = "gmtoffset")]
    gmt_offset: Option<i64>,
    long_name: Option<String>,
    short_name: Option<String>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

impl From<ProviderErrorBody> for ParserError {
    fn from(body: ProviderErrorBody) -> Self {
        ParserError::Provider {
            code: body.code,
            description: body.description.unwrap_or_default(),
        }
    }
}

pub struct YahooChartParser;

impl YahooChartParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for YahooChartParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for YahooChartParser {
    fn parse(&self, body: &str) -> Result<ChartData, ParserError> {
        let envelope: ChartEnvelope = serde_json::from_str(body)?;
        if let Some(error) = envelope.chart.error {
            return Err(error.into());
        }
        let result = envelope
            .chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or(ParserError::MissingField("chart.result"))?;

        let (gmt_offset, info) = match result.meta {
            Some(meta) => (
                meta.gmt_offset.unwrap_or(0),
                InstrumentInfo {
                    long_name: meta.long_name.or(meta.short_name),
                    fifty_two_week_high: meta.fifty_two_week_high,
                    fifty_two_week_low: meta.fifty_two_week_low,
                    ..Default::default()
                },
            ),
            None => (0, InstrumentInfo::default()),
        };

        // An empty range comes back without timestamps at all.
        let timestamps = result.timestamp.unwrap_or_default();
        if timestamps.is_empty() {
            return Ok(ChartData { bars: Vec::new(), info });
        }

        let indicators = result
            .indicators
            .ok_or(ParserError::MissingField("indicators"))?;
        let adjclose = indicators
            .adjclose
            .and_then(|a| a.into_iter().next())
            .map(|a| a.adjclose);
        let quote = indicators
            .quote
            .into_iter()
            .next()
            .ok_or(ParserError::MissingField("indicators.quote"))?;
        let expected = timestamps.len();
        for (column, values) in [
            ("open", &quote.open),
            ("high", &quote.high),
            ("low", &quote.low),
            ("close", &quote.close),
            ("volume", &quote.volume),
        ] {
            if values.len() != expected {
                return Err(ParserError::LengthMismatch {
                    column,
                    expected,
                    actual: values.len(),
                });
            }
        }
        if let Some(adj) = &adjclose {
            if adj.len() != expected {
                return Err(ParserError::LengthMismatch {
                    column: "adjclose",
                    expected,
                    actual: adj.len(),
                });
            }
        }

        let mut bars: Vec<Bar> = Vec::with_capacity(expected);
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = date_from_timestamp(ts, gmt_offset).ok_or(ParserError::InvalidTimestamp(ts))?;
            // Rows with a missing price are placeholders, not trading days.
            let (Some(open), Some(high), Some(low), Some(close)) =
                (quote.open[i], quote.high[i], quote.low[i], quote.close[i])
            else {
                continue;
            };
            let adj_close = adjclose.as_ref().and_then(|a| a[i]);
            let (open, high, low, close) = adjust(open, high, low, close, adj_close);
            let volume = match quote.volume[i] {
                None => 0,
                Some(v) if v.is_finite() && v >= 0.0 => v.round() as u64,
                Some(v) => return Err(ParserError::InvalidVolume { date, volume: v }),
            };
            let bar = Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            };
            // Intraday refreshes repeat the current session; the later row wins.
            match bars.last_mut() {
                Some(last) if last.date == date => *last = bar,
                _ => bars.push(bar),
            }
        }

        Ok(ChartData { bars, info })
    }
}

/// Rescales a bar onto the dividend- and split-adjusted close. The close
/// becomes the adjusted value and open/high/low move by the same ratio.
/// Without a usable adjusted close the raw prices are kept.
fn adjust(open: f64, high: f64, low: f64, close: f64, adj_close: Option<f64>) -> (f64, f64, f64, f64) {
    match adj_close {
        Some(adj) if adj.is_finite() && close != 0.0 => {
            let ratio = adj / close;
            (open * ratio, high * ratio, low * ratio, adj)
        }
        _ => (open, high, low, close),
    }
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryBody,
}

#[derive(Debug, Deserialize)]
struct SummaryBody {
    result: Option<Vec<SummaryResult>>,
    error: Option<ProviderErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    asset_profile: Option<AssetProfile>,
    summary_detail: Option<SummaryDetail>,
    price: Option<PriceModule>,
}

#[derive(Debug, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    beta: Option<RawNumber>,
    market_cap: Option<RawNumber>,
    fifty_two_week_high: Option<RawNumber>,
    fifty_two_week_low: Option<RawNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    market_cap: Option<RawNumber>,
}

#[derive(Debug, Deserialize)]
struct RawNumber {
    raw: Option<f64>,
}

fn raw(value: Option<RawNumber>) -> Option<f64> {
    value.and_then(|v| v.raw)
}

/// Reads the company profile modules. Every field is optional.
pub fn parse_quote_summary(body: &str) -> Result<InstrumentInfo, ParserError> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)?;
    if let Some(error) = envelope.quote_summary.error {
        return Err(error.into());
    }
    let result = envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or(ParserError::MissingField("quoteSummary.result"))?;

    let mut info = InstrumentInfo::default();
    if let Some(profile) = result.asset_profile {
        info.sector = profile.sector;
        info.industry = profile.industry;
        info.country = profile.country;
    }
    if let Some(price) = result.price {
        info.long_name = price.long_name.or(price.short_name);
        info.market_cap = raw(price.market_cap);
    }
    if let Some(detail) = result.summary_detail {
        info.beta = raw(detail.beta);
        info.market_cap = info.market_cap.or(raw(detail.market_cap));
        info.fifty_two_week_high = raw(detail.fifty_two_week_high);
        info.fifty_two_week_low = raw(detail.fifty_two_week_low);
    }
    Ok(info)
}
