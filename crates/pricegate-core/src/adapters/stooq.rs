use std::sync::Arc;

use serde_json::Value;

use crate::data_source::{QuoteFuture, QuoteProvider, QuoteRequest, SourceError};
use crate::relay::RelayRotator;
use crate::{ProviderId, Quote};

const DEFAULT_BASE_URL: &str = "https://stooq.com/q/l/";

/// Values Stooq puts in `close` when it has no quote.
const MISSING_CLOSE: [&str; 2] = ["N/A", "N/D"];

/// Secondary provider: Stooq last-close quotes. No history.
#[derive(Clone)]
pub struct StooqAdapter {
    rotator: Arc<RelayRotator>,
    base_url: String,
}

impl StooqAdapter {
    pub fn new(rotator: Arc<RelayRotator>) -> Self {
        Self {
            rotator,
            base_url: String::from(DEFAULT_BASE_URL),
        }
    }

    pub fn quote_url(&self, provider_symbol: &str) -> String {
        format!(
            "{}?s={}&f=sd2t2ohlcv&h&e=json",
            self.base_url,
            urlencoding::encode(provider_symbol)
        )
    }

    fn parse_close(body: &Value) -> Result<f64, SourceError> {
        let rows = match body {
            Value::Array(rows) => Some(rows),
            Value::Object(map) => map.get("symbols").and_then(Value::as_array),
            _ => None,
        };

        let row = rows
            .and_then(|rows| rows.first())
            .ok_or_else(|| SourceError::no_data("Invalid Stooq response"))?;

        let close = match row.get("close") {
            Some(Value::Number(number)) => number.as_f64(),
            Some(Value::String(text)) => {
                let text = text.trim();
                if text.is_empty() || MISSING_CLOSE.contains(&text) {
                    None
                } else {
                    text.parse::<f64>().ok()
                }
            }
            _ => None,
        };

        close.ok_or_else(|| SourceError::no_data("Stooq close unavailable"))
    }
}

impl QuoteProvider for StooqAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Stooq
    }

    fn fetch_quote<'a>(&'a self, req: QuoteRequest) -> QuoteFuture<'a> {
        Box::pin(async move {
            let url = self.quote_url(&req.provider_symbol);
            let body = self.rotator.relayed_get(&url).await?;
            let close = Self::parse_close(&body)?;

            Ok(Quote::new(req.symbol, req.asset_class, ProviderId::Stooq, req.provider_symbol)
                .with_price(close))
        })
    }
}
