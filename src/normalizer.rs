use crate::model::{Bar, DataError};

/// Trims and upper-cases a ticker. Blank input yields `None`.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        None
    } else {
        Some(ticker)
    }
}

/// Checks loader output before it reaches the metrics engine:
/// strictly ascending dates and finite, positive prices.
pub fn validate_bars(bars: &[Bar]) -> Result<(), DataError> {
    for (index, bar) in bars.iter().enumerate() {
        validate_bar(bar)?;
        if index > 0 {
            let previous = bars[index - 1].date;
            if bar.date <= previous {
                return Err(DataError::OutOfOrder {
                    index,
                    previous,
                    current: bar.date,
                });
            }
        }
    }
    Ok(())
}

fn validate_bar(bar: &Bar) -> Result<(), DataError> {
    let fields = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ];
    for (field, value) in fields {
        if !value.is_finite() {
            return Err(DataError::NonFinitePrice {
                date: bar.date,
                field,
            });
        }
        if value <= 0.0 {
            return Err(DataError::NonPositivePrice {
                date: bar.date,
                field,
                value,
            });
        }
    }
    Ok(())
}
