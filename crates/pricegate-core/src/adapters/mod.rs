//! Provider adapters.

pub mod coingecko;
pub mod stooq;
pub mod yahoo;

pub use coingecko::CoingeckoAdapter;
pub use stooq::StooqAdapter;
pub use yahoo::YahooChartAdapter;
