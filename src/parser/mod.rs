pub mod yahoo_parser;

pub use yahoo_parser::{ChartData, Parser, YahooChartParser, parse_quote_summary};
