use crate::config::SyntheticConfig;
use crate::loader::traits::SeriesLoader;
use crate::model::{Bar, InstrumentInfo, LoadedSeries, LoaderError, Period, Ticker};

use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Offline loader producing a seeded random walk of weekday bars.
/// The same ticker, period and settings always give the same series.
pub struct SyntheticLoader {
    seed: u64,
    start_price: f64,
    end_date: NaiveDate,
}

impl SyntheticLoader {
    pub fn new(config: &SyntheticConfig) -> Self {
        Self {
            seed: config.seed,
            start_price: config.start_price,
            end_date: config.end_date.unwrap_or_else(|| Utc::now().date_naive()),
        }
    }

    // FNV-1a; std's hasher is not stable across releases.
    fn ticker_seed(&self, ticker: &Ticker) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in ticker.as_str().bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        hash ^ self.seed
    }

    pub fn generate(&self, ticker: &Ticker, period: Period) -> Vec<Bar> {
        let mut rng = StdRng::seed_from_u64(self.ticker_seed(ticker));
        let start = self.end_date - Duration::days(period.calendar_days() - 1);

        let mut bars = Vec::new();
        let mut close = self.start_price;
        let drift = 0.0003;
        let daily_range = 0.04;

        for date in start.iter_days().take_while(|d| *d <= self.end_date) {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            let gap = (rng.random::<f64>() - 0.5) * 0.01;
            let open = close * (1.0 + gap);
            let ret = drift + (rng.random::<f64>() - 0.5) * daily_range;
            close = open * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.random::<f64>() * 0.01);
            let low = open.min(close) * (1.0 - rng.random::<f64>() * 0.01);
            let volume = rng.random_range(1_000_000..5_000_000);

            bars.push(Bar {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }
        bars
    }
}

fn is_valid_symbol(ticker: &Ticker) -> bool {
    ticker
        .as_str()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
}

#[async_trait::async_trait]
impl SeriesLoader for SyntheticLoader {
    async fn load(&self, ticker: &Ticker, period: Period) -> Result<LoadedSeries, LoaderError> {
        if !is_valid_symbol(ticker) {
            return Err(LoaderError::InvalidTicker(ticker.to_string()));
        }
        let bars = self.generate(ticker, period);
        if bars.is_empty() {
            return Err(LoaderError::EmptyHistory {
                ticker: ticker.to_string(),
                period,
            });
        }
        info!("Generated {} synthetic bars for {}", bars.len(), ticker);

        Ok(LoadedSeries {
            bars,
            info: Some(InstrumentInfo {
                long_name: Some(format!("{} (synthetic)", ticker)),
                ..Default::default()
            }),
        })
    }
}
