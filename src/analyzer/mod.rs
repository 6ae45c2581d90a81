// Analyzer module: the metrics engine and its rolling-window helpers.

pub mod price_analysis;
pub mod rolling;
pub mod summary;

// Re-export the main Analyzer implementation for ease of use.
pub use price_analysis::{Analyzer, AnalyzerImpl, EnrichedRow, EnrichedSeries, MetricsError};
pub use summary::{KeyMetrics, SummaryStats};
