// Utility functions
use chrono::{DateTime, NaiveDate};

/// Converts a UTC epoch timestamp into the exchange-local calendar date.
pub fn date_from_timestamp(timestamp: i64, gmt_offset_seconds: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp.checked_add(gmt_offset_seconds)?, 0).map(|dt| dt.date_naive())
}

/// Formats a ratio as a percentage, or `N/A` when absent.
pub fn format_percent(ratio: Option<f64>, decimals: usize) -> String {
    match ratio {
        Some(r) => format!("{:.*}%", decimals, r * 100.0),
        None => "N/A".to_string(),
    }
}

/// Like [`format_percent`] but always carries a sign.
pub fn format_signed_percent(ratio: Option<f64>, decimals: usize) -> String {
    match ratio {
        Some(r) => format!("{:+.*}%", decimals, r * 100.0),
        None => "N/A".to_string(),
    }
}

pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals, v),
        None => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_from_timestamp_uses_offset() {
        // 2024-03-15 04:00:00 UTC is still the 14th in New York (UTC-4).
        let ts = 1_710_475_200;
        assert_eq!(
            date_from_timestamp(ts, 0),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            date_from_timestamp(ts, -4 * 3600),
            NaiveDate::from_ymd_opt(2024, 3, 14)
        );
    }

    #[test]
    fn test_percent_formatting() {
        assert_eq!(format_percent(Some(0.012345), 2), "1.23%");
        assert_eq!(format_signed_percent(Some(0.05), 2), "+5.00%");
        assert_eq!(format_signed_percent(Some(-0.05), 2), "-5.00%");
        assert_eq!(format_percent(None, 4), "N/A");
        assert_eq!(format_percent(Some(f64::NAN), 2), "NaN%");
        assert_eq!(format_number(Some(1.23456), 2), "1.23");
    }
}
