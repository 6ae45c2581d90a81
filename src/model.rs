// Core structs: Bar, Ticker, Period, AnalysisRequest, InstrumentInfo
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::normalizer::normalize_ticker;

/// One trading day of OHLCV data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Upper-cased, trimmed, non-empty instrument symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

impl Ticker {
    /// Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        normalize_ticker(raw).map(Ticker)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// History range accepted by the loader. No custom date ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
pub enum Period {
    #[serde(rename = "1mo")]
    #[value(name = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    #[value(name = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    #[value(name = "6mo")]
    SixMonths,
    #[default]
    #[serde(rename = "1y")]
    #[value(name = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    #[value(name = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    #[value(name = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    #[value(name = "max")]
    Max,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::TwoYears,
        Period::FiveYears,
        Period::Max,
    ];

    /// Provider-facing range token, also used in export file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::TwoYears => "2y",
            Period::FiveYears => "5y",
            Period::Max => "max",
        }
    }

    /// Calendar days spanned by the period. `Max` is capped at ten years.
    pub fn calendar_days(&self) -> i64 {
        match self {
            Period::OneMonth => 30,
            Period::ThreeMonths => 91,
            Period::SixMonths => 182,
            Period::OneYear => 365,
            Period::TwoYears => 730,
            Period::FiveYears => 1826,
            Period::Max => 3652,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Period::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| format!("unsupported period '{}'", s))
    }
}

/// The three display toggles of the request form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub moving_averages: bool,
    pub volume: bool,
    pub returns: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            moving_averages: true,
            volume: true,
            returns: true,
        }
    }
}

/// Raw form input, exactly as submitted.
#[derive(Debug, Clone)]
pub struct RequestForm {
    pub ticker: String,
    pub period: Period,
    pub display: DisplayOptions,
}

/// Validated, immutable parameters for one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub ticker: Ticker,
    pub period: Period,
    pub display: DisplayOptions,
}

impl AnalysisRequest {
    /// Returns `None` when the ticker field is blank.
    pub fn from_form(form: &RequestForm) -> Option<Self> {
        Some(Self {
            ticker: Ticker::parse(&form.ticker)?,
            period: form.period,
            display: form.display,
        })
    }
}

/// Optional instrument metadata used only for display.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstrumentInfo {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub country: Option<String>,
    pub market_cap: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub beta: Option<f64>,
}

impl InstrumentInfo {
    pub fn is_empty(&self) -> bool {
        *self == InstrumentInfo::default()
    }

    /// Fills fields missing in `self` from `other`.
    pub fn merge(self, other: InstrumentInfo) -> InstrumentInfo {
        InstrumentInfo {
            long_name: self.long_name.or(other.long_name),
            sector: self.sector.or(other.sector),
            industry: self.industry.or(other.industry),
            country: self.country.or(other.country),
            market_cap: self.market_cap.or(other.market_cap),
            fifty_two_week_high: self.fifty_two_week_high.or(other.fifty_two_week_high),
            fifty_two_week_low: self.fifty_two_week_low.or(other.fifty_two_week_low),
            beta: self.beta.or(other.beta),
        }
    }
}

/// What a loader hands back for one request.
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub bars: Vec<Bar>,
    pub info: Option<InstrumentInfo>,
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("no instrument found for ticker {0}")]
    InvalidTicker(String),
    #[error("no price history for {ticker} over {period}")]
    EmptyHistory { ticker: String, period: Period },
    #[error("provider request failed: {0}")]
    Transient(String),
    #[error("provider payload could not be read: {0}")]
    Malformed(#[from] ParserError),
    #[error("cannot initialise loader: {0}")]
    Init(String),
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing field: {0}")]
    MissingField(&'static str),
    #[error("column lengths differ: {column} has {actual} values, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
    #[error("invalid volume {volume} on {date}")]
    InvalidVolume { date: NaiveDate, volume: f64 },
    #[error("provider error {code}: {description}")]
    Provider { code: String, description: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("row {index}: date {current} does not follow {previous}")]
    OutOfOrder {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
    #[error("{date}: {field} must be positive, got {value}")]
    NonPositivePrice {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },
    #[error("{date}: {field} is not a finite number")]
    NonFinitePrice { date: NaiveDate, field: &'static str },
}
