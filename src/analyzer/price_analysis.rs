use crate::analyzer::rolling::{annualization_factor, moving_average, rolling_sample_std};
use crate::analyzer::summary::{KeyMetrics, SummaryStats};
use crate::model::Bar;
use thiserror::Error;

/// Trailing windows of the three moving-average columns.
pub const MA_WINDOWS: [usize; 3] = [20, 50, 200];
/// Number of daily returns in the rolling volatility window.
pub const VOLATILITY_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricsError {
    #[error("no price data to analyze")]
    NoData,
}

/// One input bar plus its derived columns. `None` means "not computable
/// yet", never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub bar: Bar,
    pub daily_return: Option<f64>,
    pub cumulative_return: Option<f64>,
    pub ma_20: Option<f64>,
    pub ma_50: Option<f64>,
    pub ma_200: Option<f64>,
    pub volatility: Option<f64>,
}

/// Non-empty enriched table, same length and order as the input bars.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedSeries {
    rows: Vec<EnrichedRow>,
    summary: SummaryStats,
}

impl EnrichedSeries {
    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn summary(&self) -> &SummaryStats {
        &self.summary
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn first(&self) -> &EnrichedRow {
        &self.rows[0]
    }

    pub fn last(&self) -> &EnrichedRow {
        &self.rows[self.rows.len() - 1]
    }
}

/// Trait defining the interface of the metrics engine.
pub trait Analyzer {
    fn enrich(&self, bars: &[Bar]) -> Result<EnrichedSeries, MetricsError>;
    fn key_metrics(&self, series: &EnrichedSeries) -> KeyMetrics;
}

/// Default metrics engine.
pub struct AnalyzerImpl;

impl AnalyzerImpl {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AnalyzerImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for AnalyzerImpl {
    fn enrich(&self, bars: &[Bar]) -> Result<EnrichedSeries, MetricsError> {
        enrich(bars)
    }

    fn key_metrics(&self, series: &EnrichedSeries) -> KeyMetrics {
        KeyMetrics::from_series(series)
    }
}

/// `close[i] / close[i-1] - 1`, absent at the first row. A zero previous
/// close yields the IEEE result (`inf` or `NaN`) for that row only.
pub fn daily_returns(closes: &[f64]) -> Vec<Option<f64>> {
    if closes.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(closes.len());
    out.push(None);
    out.extend(closes.windows(2).map(|w| Some(w[1] / w[0] - 1.0)));
    out
}

/// Running compound product of the daily returns, minus one. Rows without a
/// return stay absent and do not touch the product.
pub fn cumulative_returns(daily: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut growth = 1.0;
    daily
        .iter()
        .map(|r| {
            r.map(|r| {
                growth *= 1.0 + r;
                growth - 1.0
            })
        })
        .collect()
}

/// Builds the enriched series and its summary statistics from `bars`.
///
/// The input must be date-ascending; ordering is checked upstream by
/// `normalizer::validate_bars`. Every column is computed left to right so
/// identical input gives bit-identical output.
pub fn enrich(bars: &[Bar]) -> Result<EnrichedSeries, MetricsError> {
    if bars.is_empty() {
        return Err(MetricsError::NoData);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let daily = daily_returns(&closes);
    let cumulative = cumulative_returns(&daily);
    let [ma_20, ma_50, ma_200] = MA_WINDOWS.map(|k| moving_average(&closes, k));
    let factor = annualization_factor();
    let volatility: Vec<Option<f64>> = rolling_sample_std(&daily, VOLATILITY_WINDOW)
        .into_iter()
        .map(|std| std.map(|s| s * factor))
        .collect();

    let rows = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| EnrichedRow {
            bar: bar.clone(),
            daily_return: daily[i],
            cumulative_return: cumulative[i],
            ma_20: ma_20[i],
            ma_50: ma_50[i],
            ma_200: ma_200[i],
            volatility: volatility[i],
        })
        .collect();

    Ok(EnrichedSeries {
        rows,
        summary: SummaryStats::from_returns(&daily),
    })
}
