use crate::analyzer::{Analyzer, AnalyzerImpl, EnrichedSeries, KeyMetrics, MetricsError};
use crate::model::{
    AnalysisRequest, DataError, InstrumentInfo, LoaderError, Period, RequestForm,
};
use crate::loader::SeriesLoader;
use crate::normalizer::validate_bars;

use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the presentation layer needs for one finished request.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub request: AnalysisRequest,
    pub series: EnrichedSeries,
    pub key_metrics: KeyMetrics,
    pub info: Option<InstrumentInfo>,
}

/// Why a request ended in `Failed`. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    MissingInput,
    InvalidTicker(String),
    EmptyHistory { ticker: String, period: Period },
    TransientFetchError(String),
    DataError(String),
}

impl FailureReason {
    /// Only transient failures are worth resubmitting unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureReason::TransientFetchError(_))
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MissingInput => {
                write!(f, "Please enter a stock ticker to begin analysis.")
            }
            FailureReason::InvalidTicker(ticker) => write!(
                f,
                "Unknown ticker '{}'. Check the symbol and try again (e.g. AAPL for Apple, MSFT for Microsoft).",
                ticker
            ),
            FailureReason::EmptyHistory { ticker, period } => write!(
                f,
                "No price history for '{}' over the last {}. Try a longer period.",
                ticker, period
            ),
            FailureReason::TransientFetchError(detail) => write!(
                f,
                "Could not reach the data provider ({}). Please try again.",
                detail
            ),
            FailureReason::DataError(detail) => {
                write!(f, "The provider returned unusable data: {}", detail)
            }
        }
    }
}

impl From<LoaderError> for FailureReason {
    fn from(e: LoaderError) -> Self {
        match e {
            LoaderError::InvalidTicker(ticker) => FailureReason::InvalidTicker(ticker),
            LoaderError::EmptyHistory { ticker, period } => {
                FailureReason::EmptyHistory { ticker, period }
            }
            LoaderError::Transient(detail) | LoaderError::Init(detail) => {
                FailureReason::TransientFetchError(detail)
            }
            LoaderError::Malformed(e) => FailureReason::DataError(e.to_string()),
        }
    }
}

impl From<DataError> for FailureReason {
    fn from(e: DataError) -> Self {
        FailureReason::DataError(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub enum RequestState {
    Idle,
    Fetching,
    Enriching,
    Ready(Box<AnalysisReport>),
    Failed(FailureReason),
}

/// Payload-free view of [`RequestState`], kept as a transition trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fetching,
    Enriching,
    Ready,
    Failed,
}

impl RequestState {
    pub fn phase(&self) -> Phase {
        match self {
            RequestState::Idle => Phase::Idle,
            RequestState::Fetching => Phase::Fetching,
            RequestState::Enriching => Phase::Enriching,
            RequestState::Ready(_) => Phase::Ready,
            RequestState::Failed(_) => Phase::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Ready(_) | RequestState::Failed(_))
    }
}

/// Drives one request through Loader → Metrics Engine and holds its state.
/// Each request gets its own orchestrator; only the loader is shared.
pub struct Orchestrator {
    loader: Arc<dyn SeriesLoader>,
    analyzer: AnalyzerImpl,
    state: RequestState,
    trace: Vec<Phase>,
}

impl Orchestrator {
    pub fn new(loader: Arc<dyn SeriesLoader>) -> Self {
        Self {
            loader,
            analyzer: AnalyzerImpl::new(),
            state: RequestState::Idle,
            trace: vec![Phase::Idle],
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// Phases visited by the latest submission, starting at `Idle`.
    pub fn trace(&self) -> &[Phase] {
        &self.trace
    }

    fn transition(&mut self, next: RequestState) {
        self.trace.push(next.phase());
        self.state = next;
    }

    /// Runs a submission to a terminal state. No automatic retries.
    pub async fn submit(&mut self, form: &RequestForm) -> &RequestState {
        self.state = RequestState::Idle;
        self.trace = vec![Phase::Idle];

        let next = match self.run(form).await {
            Ok(report) => {
                info!(
                    "Analysis of {} ({}) ready: {} rows",
                    report.request.ticker,
                    report.request.period,
                    report.series.len()
                );
                RequestState::Ready(Box::new(report))
            }
            Err(reason) => {
                warn!("Request for '{}' failed: {:?}", form.ticker.trim(), reason);
                RequestState::Failed(reason)
            }
        };
        self.transition(next);
        debug_assert!(self.state.is_terminal());
        &self.state
    }

    async fn run(&mut self, form: &RequestForm) -> Result<AnalysisReport, FailureReason> {
        let request = AnalysisRequest::from_form(form).ok_or(FailureReason::MissingInput)?;
        info!("Submitted {} over {}", request.ticker, request.period);

        self.transition(RequestState::Fetching);
        let loaded = self.loader.load(&request.ticker, request.period).await?;

        self.transition(RequestState::Enriching);
        validate_bars(&loaded.bars)?;
        let series = self.analyzer.enrich(&loaded.bars).map_err(|e| match e {
            MetricsError::NoData => FailureReason::EmptyHistory {
                ticker: request.ticker.to_string(),
                period: request.period,
            },
        })?;
        let key_metrics = self.analyzer.key_metrics(&series);

        Ok(AnalysisReport {
            request,
            series,
            key_metrics,
            info: loaded.info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Bar, DisplayOptions, LoadedSeries, ParserError, Ticker};
    use chrono::{Duration, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};

    type Response = fn(&Ticker, Period) -> Result<LoadedSeries, LoaderError>;

    struct StubLoader {
        respond: Response,
        calls: AtomicUsize,
    }

    impl StubLoader {
        fn new(respond: Response) -> Arc<Self> {
            Arc::new(Self {
                respond,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl SeriesLoader for StubLoader {
        async fn load(&self, ticker: &Ticker, period: Period) -> Result<LoadedSeries, LoaderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.respond)(ticker, period)
        }
    }

    fn bars(n: usize) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let close = 100.0 + i as f64;
                Bar {
                    date: start + Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000,
                }
            })
            .collect()
    }

    fn ok_series(_: &Ticker, _: Period) -> Result<LoadedSeries, LoaderError> {
        Ok(LoadedSeries {
            bars: bars(30),
            info: None,
        })
    }

    fn form(ticker: &str) -> RequestForm {
        RequestForm {
            ticker: ticker.to_string(),
            period: Period::OneMonth,
            display: DisplayOptions::default(),
        }
    }

    async fn failure_for(respond: Response) -> FailureReason {
        let mut orchestrator = Orchestrator::new(StubLoader::new(respond));
        match orchestrator.submit(&form("aapl")).await {
            RequestState::Failed(reason) => reason.clone(),
            other => panic!("expected failure, got {:?}", other.phase()),
        }
    }

    #[tokio::test]
    async fn test_successful_request_reaches_ready() {
        let loader = StubLoader::new(ok_series);
        let mut orchestrator = Orchestrator::new(loader.clone());
        assert_eq!(orchestrator.state().phase(), Phase::Idle);

        let state = orchestrator.submit(&form("  aapl ")).await;
        let RequestState::Ready(report) = state else {
            panic!("expected ready state");
        };
        assert_eq!(report.request.ticker.as_str(), "AAPL");
        assert_eq!(report.series.len(), 30);
        assert_eq!(report.key_metrics.latest_close, 129.0);
        assert_eq!(
            orchestrator.trace(),
            &[Phase::Idle, Phase::Fetching, Phase::Enriching, Phase::Ready]
        );
        assert!(orchestrator.state().is_terminal());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_ticker_fails_before_fetching() {
        let loader = StubLoader::new(ok_series);
        let mut orchestrator = Orchestrator::new(loader.clone());
        let state = orchestrator.submit(&form("   ")).await;
        assert!(matches!(state, RequestState::Failed(FailureReason::MissingInput)));
        assert_eq!(orchestrator.trace(), &[Phase::Idle, Phase::Failed]);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_ticker() {
        let reason = failure_for(|t, _| Err(LoaderError::InvalidTicker(t.to_string()))).await;
        assert_eq!(reason, FailureReason::InvalidTicker("AAPL".into()));
        assert!(!reason.is_retryable());
    }

    #[tokio::test]
    async fn test_empty_history_from_loader() {
        let reason = failure_for(|t, p| {
            Err(LoaderError::EmptyHistory {
                ticker: t.to_string(),
                period: p,
            })
        })
        .await;
        assert!(matches!(reason, FailureReason::EmptyHistory { .. }));
    }

    #[tokio::test]
    async fn test_empty_bars_become_empty_history() {
        let reason = failure_for(|_, _| {
            Ok(LoadedSeries {
                bars: Vec::new(),
                info: None,
            })
        })
        .await;
        assert_eq!(
            reason,
            FailureReason::EmptyHistory {
                ticker: "AAPL".into(),
                period: Period::OneMonth
            }
        );
    }

    #[tokio::test]
    async fn test_transient_failure_is_retryable() {
        let reason = failure_for(|_, _| Err(LoaderError::Transient("timed out".into()))).await;
        assert!(matches!(reason, FailureReason::TransientFetchError(_)));
        assert!(reason.is_retryable());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_data_error() {
        let reason =
            failure_for(|_, _| Err(LoaderError::Malformed(ParserError::MissingField("chart.result"))))
                .await;
        assert!(matches!(reason, FailureReason::DataError(_)));
    }

    #[tokio::test]
    async fn test_unordered_bars_fail_during_enriching() {
        let loader = StubLoader::new(|_, _| {
            let mut b = bars(5);
            b.swap(1, 3);
            Ok(LoadedSeries { bars: b, info: None })
        });
        let mut orchestrator = Orchestrator::new(loader);
        let state = orchestrator.submit(&form("AAPL")).await;
        assert!(matches!(state, RequestState::Failed(FailureReason::DataError(_))));
        assert_eq!(
            orchestrator.trace(),
            &[Phase::Idle, Phase::Fetching, Phase::Enriching, Phase::Failed]
        );
    }

    #[tokio::test]
    async fn test_resubmission_restarts_from_idle() {
        let mut orchestrator = Orchestrator::new(StubLoader::new(ok_series));
        orchestrator.submit(&form("")).await;
        assert_eq!(orchestrator.state().phase(), Phase::Failed);

        orchestrator.submit(&form("MSFT")).await;
        assert_eq!(orchestrator.state().phase(), Phase::Ready);
        assert_eq!(orchestrator.trace()[0], Phase::Idle);
        assert_eq!(orchestrator.trace().len(), 4);
    }

    #[test]
    fn test_failure_messages_are_distinct() {
        let reasons = [
            FailureReason::MissingInput,
            FailureReason::InvalidTicker("X".into()),
            FailureReason::EmptyHistory {
                ticker: "X".into(),
                period: Period::OneYear,
            },
            FailureReason::TransientFetchError("boom".into()),
            FailureReason::DataError("bad".into()),
        ];
        let messages: Vec<String> = reasons.iter().map(|r| r.to_string()).collect();
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(messages[0].contains("ticker"));
    }
}
