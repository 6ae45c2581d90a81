// Presentation boundary: text summary, chart panel data and CSV export.

pub mod export;
pub mod panels;

use crate::analyzer::{KeyMetrics, SummaryStats};
use crate::model::InstrumentInfo;
use crate::orchestrator::AnalysisReport;
use crate::utils::{format_number, format_percent, format_signed_percent};

/// One display line per metadata field that is present.
pub fn company_lines(info: &InstrumentInfo) -> Vec<String> {
    let mut lines = Vec::new();
    let text_fields = [
        ("Company Name", &info.long_name),
        ("Sector", &info.sector),
        ("Industry", &info.industry),
        ("Country", &info.country),
    ];
    for (label, value) in text_fields {
        if let Some(value) = value {
            lines.push(format!("{}: {}", label, value));
        }
    }
    if let Some(cap) = info.market_cap {
        lines.push(format!("Market Cap: ${:.2}B", cap / 1e9));
    }
    if let Some(high) = info.fifty_two_week_high {
        lines.push(format!("52 Week High: ${:.2}", high));
    }
    if let Some(low) = info.fifty_two_week_low {
        lines.push(format!("52 Week Low: ${:.2}", low));
    }
    if let Some(beta) = info.beta {
        lines.push(format!("Beta: {:.2}", beta));
    }
    lines
}

pub fn key_metric_lines(metrics: &KeyMetrics) -> Vec<String> {
    vec![
        format!(
            "Current Price: ${:.2} ({})",
            metrics.latest_close,
            format_signed_percent(metrics.price_change_ratio, 2)
        ),
        format!(
            "Total Return: {} (period)",
            format_signed_percent(Some(metrics.total_return), 2)
        ),
        format!("Avg Daily Volume: {:.2}M", metrics.mean_volume / 1e6),
        format!(
            "Volatility (20d): {}",
            format_percent(metrics.latest_volatility, 2)
        ),
    ]
}

/// Rows of the statistical summary table as (metric, value).
pub fn summary_table(stats: &SummaryStats) -> Vec<(&'static str, String)> {
    vec![
        ("Mean Return", format_percent(stats.mean, 4)),
        ("Std Deviation", format_percent(stats.std_dev, 4)),
        ("Min Return", format_percent(stats.min, 2)),
        ("Max Return", format_percent(stats.max, 2)),
        ("Sharpe Ratio (approx)", format_number(stats.sharpe_approx, 2)),
    ]
}

/// Renders the full text report, honouring the request's display toggles.
pub fn render_report(report: &AnalysisReport) -> String {
    let display = report.request.display;
    let last = report.series.last();
    let mut out = vec![format!(
        "== {} ({}) ==",
        report.request.ticker, report.request.period
    )];

    if let Some(info) = &report.info {
        let lines = company_lines(info);
        if !lines.is_empty() {
            out.push("Company Information".to_string());
            out.extend(lines.into_iter().map(|l| format!("  {}", l)));
        }
    }

    out.push(format!("Key Metrics (as of {})", report.key_metrics.latest_date));
    out.extend(
        key_metric_lines(&report.key_metrics)
            .into_iter()
            .map(|l| format!("  {}", l)),
    );

    if display.moving_averages {
        out.push("Moving Averages".to_string());
        for (label, value) in [
            ("20-day MA", last.ma_20),
            ("50-day MA", last.ma_50),
            ("200-day MA", last.ma_200),
        ] {
            out.push(format!("  {}: {}", label, format_number(value, 2)));
        }
    }

    if display.volume {
        out.push("Volume".to_string());
        out.push(format!("  Latest Volume: {:.2}M", last.bar.volume as f64 / 1e6));
    }

    if display.returns {
        out.push("Statistical Summary".to_string());
        for (metric, value) in summary_table(report.series.summary()) {
            out.push(format!("  {}: {}", metric, value));
        }
    }

    out.join("\n")
}
