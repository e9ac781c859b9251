//! Response bodies.
//!
//! Field names follow what existing clients parse, hence the mix of
//! snake_case and camelCase keys.

use pricegate_core::{AssetClass, HistoryPoint, PriceSummary, ProviderId, Quote};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBody {
    pub source: ProviderId,
    pub asset_type: AssetClass,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stooq_symbol: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "previousClose", skip_serializing_if = "Option::is_none")]
    pub previous_close: Option<f64>,
    #[serde(rename = "exchangeName", skip_serializing_if = "Option::is_none")]
    pub exchange_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(rename = "marketState", skip_serializing_if = "Option::is_none")]
    pub market_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<Vec<Option<i64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<Vec<Option<f64>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Vec<Option<u64>>>,
}

impl PriceBody {
    pub fn from_quote(quote: Quote, endpoint: Option<&'static str>) -> Self {
        let stooq_symbol = (quote.source == ProviderId::Stooq).then(|| quote.provider_symbol.clone());
        let history = quote.history.as_ref();

        Self {
            source: quote.source,
            asset_type: quote.asset_class,
            symbol: quote.symbol.to_string(),
            endpoint,
            stooq_symbol,
            price: quote.price,
            previous_close: quote.previous_close,
            exchange_name: quote.exchange_name,
            currency: quote.currency,
            market_state: quote.market_state,
            timestamps: history.map(|h| h.timestamps().to_vec()),
            open: history.map(|h| h.open().to_vec()),
            high: history.map(|h| h.high().to_vec()),
            low: history.map(|h| h.low().to_vec()),
            close: history.map(|h| h.close().to_vec()),
            volume: history.map(|h| h.volume().to_vec()),
        }
    }
}

/// Success-shaped failure for the quote routes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub symbol: String,
    pub asset_type: AssetClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PriceReply {
    Found(Box<PriceBody>),
    Missing(ErrorBody),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CryptoBody {
    pub source: ProviderId,
    pub symbol: String,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryBody {
    pub source: ProviderId,
    pub asset_type: AssetClass,
    pub symbol: String,
    #[serde(flatten)]
    pub summary: PriceSummary,
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HistoryReply {
    Found(HistoryBody),
    Missing(ErrorBody),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailBody {
    pub detail: String,
}
