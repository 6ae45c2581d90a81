use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::analyzer::EnrichedSeries;
use crate::model::{AnalysisRequest, Period, Ticker};
use crate::report::panels::Panel;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to flush CSV writer: {0}")]
    Flush(String),
    #[error("CSV output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Raw columns first, then derived ones; the date leads every row.
pub const HEADER: [&str; 12] = [
    "Date",
    "Open",
    "High",
    "Low",
    "Close",
    "Volume",
    "Daily_Return",
    "Cumulative_Return",
    "MA_20",
    "MA_50",
    "MA_200",
    "Volatility",
];

// Absent values are empty cells; non-finite ones print as NaN / inf.
fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Serializes the enriched table. Floats use the shortest round-trip form,
/// so the same series always produces the same bytes.
pub fn export_csv(series: &EnrichedSeries) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(HEADER)?;

    for row in series.rows() {
        let bar = &row.bar;
        wtr.write_record([
            bar.date.format("%Y-%m-%d").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.volume.to_string(),
            cell(row.daily_return),
            cell(row.cumulative_return),
            cell(row.ma_20),
            cell(row.ma_50),
            cell(row.ma_200),
            cell(row.volatility),
        ])?;
    }

    let data = wtr.into_inner().map_err(|e| ExportError::Flush(e.to_string()))?;
    Ok(String::from_utf8(data)?)
}

// Keeps the ticker a single path component: separators and other
// characters outside the symbol alphabet become '_'.
fn file_stem(ticker: &Ticker, period: Period) -> String {
    let symbol: String = ticker
        .as_str()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}", symbol, period)
}

pub fn export_file_name(ticker: &Ticker, period: Period) -> String {
    format!("{}_data.csv", file_stem(ticker, period))
}

pub fn panels_file_name(ticker: &Ticker, period: Period) -> String {
    format!("{}_panels.json", file_stem(ticker, period))
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, content)?;
    info!("Saved {}", path.display());
    Ok(path)
}

/// Writes `{TICKER}_{PERIOD}_data.csv` under `dir`.
pub fn save_export(
    dir: &Path,
    request: &AnalysisRequest,
    series: &EnrichedSeries,
) -> Result<PathBuf, ExportError> {
    let csv = export_csv(series)?;
    write_file(dir, &export_file_name(&request.ticker, request.period), &csv)
}

/// Writes the chart panels as `{TICKER}_{PERIOD}_panels.json` under `dir`.
pub fn save_panels(
    dir: &Path,
    request: &AnalysisRequest,
    panels: &[Panel],
) -> Result<PathBuf, ExportError> {
    let json = serde_json::to_string_pretty(panels)?;
    write_file(dir, &panels_file_name(&request.ticker, request.period), &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::price_analysis::enrich;
    use crate::model::{Bar, DisplayOptions};
    use crate::report::panels::build_panels;
    use chrono::{Duration, NaiveDate};

    fn bars(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: start + Duration::days(i as i64),
                open: 10.0,
                high: 12.5,
                low: 9.75,
                close,
                volume: 1_200 + i as u64,
            })
            .collect()
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            ticker: Ticker::parse("aapl").unwrap(),
            period: Period::OneYear,
            display: DisplayOptions::default(),
        }
    }

    #[test]
    fn test_header_and_first_rows() {
        let series = enrich(&bars(&[10.0, 12.5])).unwrap();
        let csv = export_csv(&series).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "Date,Open,High,Low,Close,Volume,Daily_Return,Cumulative_Return,MA_20,MA_50,MA_200,Volatility"
        );
        assert_eq!(lines[1], "2024-05-01,10,12.5,9.75,10,1200,,,,,,");
        assert_eq!(lines[2], "2024-05-02,10,12.5,9.75,12.5,1201,0.25,0.25,,,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_export_is_byte_identical_across_runs() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i as f64 * 0.3).cos() * 7.0).collect();
        let first = export_csv(&enrich(&bars(&closes)).unwrap()).unwrap();
        let second = export_csv(&enrich(&bars(&closes)).unwrap()).unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(first.lines().count(), 251);
    }

    #[test]
    fn test_non_finite_values_are_marked() {
        let series = enrich(&bars(&[10.0, 0.0, 5.0])).unwrap();
        let csv = export_csv(&series).unwrap();
        let last = csv.lines().nth(3).unwrap();
        let cells: Vec<&str> = last.split(',').collect();
        assert_eq!(cells[6], "inf");
        assert_eq!(cells[7], "NaN");
    }

    #[test]
    fn test_file_names() {
        let r = request();
        assert_eq!(export_file_name(&r.ticker, r.period), "AAPL_1y_data.csv");
        assert_eq!(panels_file_name(&r.ticker, Period::Max), "AAPL_max_panels.json");
    }

    #[test]
    fn test_file_names_stay_inside_export_dir() {
        let ticker = Ticker::parse("../etc/brk\\b").unwrap();
        let name = export_file_name(&ticker, Period::OneYear);
        assert_eq!(name, ".._ETC_BRK_B_1y_data.csv");
        assert!(!name.contains('/') && !name.contains('\\'));

        let dir = tempfile::tempdir().unwrap();
        let series = enrich(&bars(&[10.0, 11.0])).unwrap();
        let request = AnalysisRequest {
            ticker,
            period: Period::OneYear,
            display: DisplayOptions::default(),
        };
        let path = save_export(dir.path(), &request, &series).unwrap();
        assert_eq!(path.parent().unwrap(), dir.path());
    }

    #[test]
    fn test_save_export_and_panels() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let series = enrich(&bars(&[10.0, 11.0, 12.0])).unwrap();

        let csv_path = save_export(&out, &request(), &series).unwrap();
        assert_eq!(csv_path.file_name().unwrap(), "AAPL_1y_data.csv");
        assert_eq!(fs::read_to_string(&csv_path).unwrap(), export_csv(&series).unwrap());

        let panels = build_panels(&request().ticker, &series, DisplayOptions::default());
        let json_path = save_panels(&out, &request(), &panels).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 4);
    }
}
