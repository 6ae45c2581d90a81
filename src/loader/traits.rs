use crate::model::{LoadedSeries, LoaderError, Period, Ticker};

/// Source of daily bars for one instrument. This is the only blocking step
/// of a request.
#[async_trait::async_trait]
pub trait SeriesLoader: Send + Sync {
    async fn load(&self, ticker: &Ticker, period: Period) -> Result<LoadedSeries, LoaderError>;
}
