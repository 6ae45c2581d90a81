pub mod synthetic;
pub mod traits;
pub mod yahoo;

pub use synthetic::SyntheticLoader;
pub use traits::SeriesLoader;
pub use yahoo::YahooLoader;
