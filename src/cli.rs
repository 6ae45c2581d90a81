use clap::Parser;

use crate::model::{DisplayOptions, Period, RequestForm};

/// Descriptive analytics over a stock's daily price history.
#[derive(Debug, Parser)]
#[command(name = "ticker-analyzer", version)]
pub struct Cli {
    /// Ticker symbol (e.g. AAPL). Repeat to analyse several independently.
    #[arg(short, long = "ticker", value_name = "TICKER")]
    pub tickers: Vec<String>,

    /// History range to analyse.
    #[arg(short, long, value_enum, default_value_t = Period::OneYear)]
    pub period: Period,

    /// Hide moving averages.
    #[arg(long)]
    pub no_ma: bool,

    /// Hide volume analysis.
    #[arg(long)]
    pub no_volume: bool,

    /// Hide returns, distribution and volatility analysis.
    #[arg(long)]
    pub no_returns: bool,

    /// Write the enriched table as {TICKER}_{PERIOD}_data.csv.
    #[arg(long)]
    pub export: bool,

    /// Write chart panel data as {TICKER}_{PERIOD}_panels.json.
    #[arg(long)]
    pub chart_data: bool,

    /// Use the seeded synthetic loader instead of the configured provider.
    #[arg(long)]
    pub offline: bool,

    /// Path to the JSON config file.
    #[arg(short, long, default_value = "config.json")]
    pub config: String,
}

impl Cli {
    pub fn display(&self) -> DisplayOptions {
        DisplayOptions {
            moving_averages: !self.no_ma,
            volume: !self.no_volume,
            returns: !self.no_returns,
        }
    }

    /// One form per ticker. With no ticker at all a single blank form is
    /// produced so the missing input is reported like any other failure.
    pub fn forms(&self) -> Vec<RequestForm> {
        let display = self.display();
        let tickers = if self.tickers.is_empty() {
            vec![String::new()]
        } else {
            self.tickers.clone()
        };
        tickers
            .into_iter()
            .map(|ticker| RequestForm {
                ticker,
                period: self.period,
                display,
            })
            .collect()
    }
}
