/// Trading days per year used for annualization.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualization factor for daily statistics (√252).
pub fn annualization_factor() -> f64 {
    TRADING_DAYS_PER_YEAR.sqrt()
}

/// Arithmetic mean, accumulated left to right. `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (divisor n - 1). `None` below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let sum_sq = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Trailing moving average aligned with `data`: entry `i` covers
/// `data[i + 1 - window ..= i]` and is `None` until the window is full.
pub fn moving_average(data: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if window == 0 || data.len() < window {
        return out;
    }
    for (offset, slice) in data.windows(window).enumerate() {
        out[offset + window - 1] = mean(slice);
    }
    out
}

/// Trailing sample standard deviation aligned with `data`. A window that
/// contains any missing value yields `None`.
pub fn rolling_sample_std(data: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if window < 2 || data.len() < window {
        return out;
    }
    for (offset, slice) in data.windows(window).enumerate() {
        let values: Option<Vec<f64>> = slice.iter().copied().collect();
        out[offset + window - 1] = values.and_then(|v| sample_std(&v));
    }
    out
}
