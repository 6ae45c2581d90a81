use crate::config::YahooConfig;
use crate::loader::traits::SeriesLoader;
use crate::model::{InstrumentInfo, LoadedSeries, LoaderError, ParserError, Period, Ticker};
use crate::parser::{ChartData, Parser, YahooChartParser, parse_quote_summary};

use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Daily bars from the Yahoo Finance chart API.
pub struct YahooLoader {
    client: Client,
    base_url: String,
    fetch_info: bool,
    parser: YahooChartParser,
}

impl YahooLoader {
    pub fn new(config: &YahooConfig) -> Result<Self, LoaderError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| LoaderError::Init(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            fetch_info: config.fetch_info,
            parser: YahooChartParser::new(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, LoaderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| LoaderError::Init(format!("bad base url {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| LoaderError::Init(format!("base url {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn chart_url(&self, ticker: &Ticker, period: Period) -> Result<Url, LoaderError> {
        let mut url = self.endpoint(&["v8", "finance", "chart", ticker.as_str()])?;
        url.query_pairs_mut()
            .append_pair("range", period.as_str())
            .append_pair("interval", "1d")
            .append_pair("includePrePost", "false");
        Ok(url)
    }

    pub fn profile_url(&self, ticker: &Ticker) -> Result<Url, LoaderError> {
        let mut url = self.endpoint(&["v10", "finance", "quoteSummary", ticker.as_str()])?;
        url.query_pairs_mut()
            .append_pair("modules", "assetProfile,summaryDetail,price");
        Ok(url)
    }

    async fn get(&self, url: Url, ticker: &Ticker) -> Result<String, LoaderError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(transport_error)?;
        let status = response.status();
        if let Some(err) = classify_status(status, ticker) {
            return Err(err);
        }
        response.text().await.map_err(transport_error)
    }

    async fn fetch_chart(&self, ticker: &Ticker, period: Period) -> Result<ChartData, LoaderError> {
        let body = self.get(self.chart_url(ticker, period)?, ticker).await?;
        self.parser
            .parse(&body)
            .map_err(|e| classify_parser_error(e, ticker))
    }

    async fn fetch_profile(&self, ticker: &Ticker) -> Result<InstrumentInfo, LoaderError> {
        let body = self.get(self.profile_url(ticker)?, ticker).await?;
        parse_quote_summary(&body).map_err(|e| classify_parser_error(e, ticker))
    }
}

#[async_trait::async_trait]
impl SeriesLoader for YahooLoader {
    async fn load(&self, ticker: &Ticker, period: Period) -> Result<LoadedSeries, LoaderError> {
        info!("Fetching {} of daily bars for {}...", period, ticker);
        let chart = self.fetch_chart(ticker, period).await?;
        if chart.bars.is_empty() {
            return Err(LoaderError::EmptyHistory {
                ticker: ticker.to_string(),
                period,
            });
        }
        info!("Fetched {} bars for {}", chart.bars.len(), ticker);

        let mut info = chart.info;
        if self.fetch_info {
            match self.fetch_profile(ticker).await {
                Ok(profile) => info = profile.merge(info),
                Err(e) => warn!("Profile lookup for {} failed: {}", ticker, e),
            }
        }

        Ok(LoadedSeries {
            bars: chart.bars,
            info: (!info.is_empty()).then_some(info),
        })
    }
}

fn transport_error(e: reqwest::Error) -> LoaderError {
    if e.is_timeout() {
        LoaderError::Transient("request timed out".to_string())
    } else {
        LoaderError::Transient(e.to_string())
    }
}

/// Maps a non-success HTTP status onto the loader taxonomy.
fn classify_status(status: StatusCode, ticker: &Ticker) -> Option<LoaderError> {
    if status.is_success() {
        None
    } else if status == StatusCode::NOT_FOUND {
        Some(LoaderError::InvalidTicker(ticker.to_string()))
    } else {
        Some(LoaderError::Transient(format!("provider responded with {}", status)))
    }
}

fn classify_parser_error(e: ParserError, ticker: &Ticker) -> LoaderError {
    match e {
        ParserError::Provider { code, .. } if code == "Not Found" => {
            LoaderError::InvalidTicker(ticker.to_string())
        }
        other => LoaderError::Malformed(other),
    }
}
