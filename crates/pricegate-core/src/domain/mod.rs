//! # Domain Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, upper-cased instrument symbol |
//! | [`AssetClass`] | Stock, Future, Index or Crypto |
//! | [`Quote`] | Normalized price result from one provider |
//! | [`PriceHistory`] | Parallel OHLCV arrays of equal length |
//!
//! [`classify`] maps a raw symbol to its [`AssetClass`] without any I/O.

mod asset_class;
mod quote;
mod symbol;

pub use asset_class::{classify, AssetClass};
pub use quote::{PriceHistory, Quote};
pub use symbol::Symbol;
