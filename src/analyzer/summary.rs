use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzer::price_analysis::EnrichedSeries;
use crate::analyzer::rolling::{annualization_factor, mean, sample_std};

/// Scalar statistics over the defined `daily_return` entries.
///
/// Non-finite returns (from a zero close fed straight into the engine) are
/// kept and propagate into these values instead of being skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryStats {
    pub observations: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// `mean / std_dev * √252`; absent when the deviation is zero or undefined.
    pub sharpe_approx: Option<f64>,
}

impl SummaryStats {
    pub fn from_returns(daily_returns: &[Option<f64>]) -> Self {
        let values: Vec<f64> = daily_returns.iter().flatten().copied().collect();
        let mean = mean(&values);
        let std_dev = sample_std(&values);
        let sharpe_approx = match (mean, std_dev) {
            (Some(m), Some(s)) if s != 0.0 => Some(m / s * annualization_factor()),
            _ => None,
        };

        Self {
            observations: values.len(),
            mean,
            std_dev,
            min: extreme(&values, f64::min),
            max: extreme(&values, f64::max),
            sharpe_approx,
        }
    }
}

// f64::min/max drop NaN operands; a NaN anywhere must stay visible.
fn extreme(values: &[f64], pick: fn(f64, f64) -> f64) -> Option<f64> {
    values
        .iter()
        .copied()
        .reduce(|acc, v| if acc.is_nan() || v.is_nan() { f64::NAN } else { pick(acc, v) })
}

/// Headline numbers handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KeyMetrics {
    pub latest_date: NaiveDate,
    pub latest_close: f64,
    /// Latest close minus the previous close.
    pub price_change: Option<f64>,
    /// `price_change` relative to the previous close.
    pub price_change_ratio: Option<f64>,
    /// `(close[last] - close[first]) / close[first]`.
    pub total_return: f64,
    pub mean_volume: f64,
    pub latest_volatility: Option<f64>,
}

impl KeyMetrics {
    pub fn from_series(series: &EnrichedSeries) -> Self {
        let rows = series.rows();
        let first = series.first();
        let last = series.last();

        let previous_close = rows.len().checked_sub(2).map(|i| rows[i].bar.close);
        let price_change = previous_close.map(|prev| last.bar.close - prev);
        let price_change_ratio = previous_close
            .zip(price_change)
            .map(|(prev, change)| change / prev);

        let volume_total = rows.iter().map(|r| r.bar.volume as f64).sum::<f64>();

        Self {
            latest_date: last.bar.date,
            latest_close: last.bar.close,
            price_change,
            price_change_ratio,
            total_return: (last.bar.close - first.bar.close) / first.bar.close,
            mean_volume: volume_total / rows.len() as f64,
            latest_volatility: rows.iter().rev().find_map(|r| r.volatility),
        }
    }
}
