use serde::{Deserialize, Serialize};

use crate::{AssetClass, ProviderId, Symbol};

/// Normalized price result for one symbol from one provider.
///
/// Fields a provider does not report stay `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: Symbol,
    pub asset_class: AssetClass,
    pub source: ProviderId,
    /// Spelling sent to `source`, e.g. `aapl.us` for Stooq.
    pub provider_symbol: String,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub previous_close: Option<f64>,
    pub exchange_name: Option<String>,
    pub market_state: Option<String>,
    pub history: Option<PriceHistory>,
}

impl Quote {
    /// Bare quote carrying only identity fields; providers fill the rest.
    pub fn new(
        symbol: Symbol,
        asset_class: AssetClass,
        source: ProviderId,
        provider_symbol: impl Into<String>,
    ) -> Self {
        Self {
            symbol,
            asset_class,
            source,
            provider_symbol: provider_symbol.into(),
            price: None,
            currency: None,
            previous_close: None,
            exchange_name: None,
            market_state: None,
            history: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_history(mut self, history: PriceHistory) -> Self {
        self.history = Some(history);
        self
    }
}

/// Parallel daily OHLCV arrays.
///
/// All six arrays always have the same length. Gaps are `None` entries; an
/// array is never shorter than its siblings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    timestamps: Vec<Option<i64>>,
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

impl PriceHistory {
    /// Build a history, padding shorter arrays with `None` up to the longest one.
    pub fn new(
        mut timestamps: Vec<Option<i64>>,
        mut open: Vec<Option<f64>>,
        mut high: Vec<Option<f64>>,
        mut low: Vec<Option<f64>>,
        mut close: Vec<Option<f64>>,
        mut volume: Vec<Option<u64>>,
    ) -> Self {
        let len = [
            timestamps.len(),
            open.len(),
            high.len(),
            low.len(),
            close.len(),
            volume.len(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        timestamps.resize(len, None);
        open.resize(len, None);
        high.resize(len, None);
        low.resize(len, None);
        close.resize(len, None);
        volume.resize(len, None);

        Self {
            timestamps,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[Option<i64>] {
        &self.timestamps
    }

    pub fn open(&self) -> &[Option<f64>] {
        &self.open
    }

    pub fn high(&self) -> &[Option<f64>] {
        &self.high
    }

    pub fn low(&self) -> &[Option<f64>] {
        &self.low
    }

    pub fn close(&self) -> &[Option<f64>] {
        &self.close
    }

    pub fn volume(&self) -> &[Option<u64>] {
        &self.volume
    }
}
