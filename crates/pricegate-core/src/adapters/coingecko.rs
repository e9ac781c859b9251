use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::data_source::{QuoteFuture, QuoteProvider, QuoteRequest, SourceError};
use crate::relay::RelayRotator;
use crate::{PriceHistory, ProviderId, Quote};

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

const MARKET_CHART_DAYS: u32 = 90;

/// Crypto provider: CoinGecko spot USD price keyed by coin id (`bitcoin`,
/// not `BTC`). Ids are not looked up from tickers.
#[derive(Clone)]
pub struct CoingeckoAdapter {
    rotator: Arc<RelayRotator>,
    base_url: String,
}

impl CoingeckoAdapter {
    pub fn new(rotator: Arc<RelayRotator>) -> Self {
        Self {
            rotator,
            base_url: String::from(DEFAULT_BASE_URL),
        }
    }

    pub fn price_url(&self, coin_id: &str) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url,
            urlencoding::encode(coin_id)
        )
    }

    pub fn market_chart_url(&self, coin_id: &str) -> String {
        format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days={MARKET_CHART_DAYS}",
            self.base_url,
            urlencoding::encode(coin_id)
        )
    }

    /// 90-day USD price series for `req.provider_symbol`.
    ///
    /// The quote's price is the last point of the series and its history
    /// carries the prices as closes, timestamps in epoch seconds.
    pub fn fetch_history<'a>(&'a self, req: QuoteRequest) -> QuoteFuture<'a> {
        Box::pin(async move {
            let url = self.market_chart_url(&req.provider_symbol);
            let body = self.rotator.relayed_get(&url).await?;
            let history = Self::parse_market_chart(&body, &req.provider_symbol)?;

            let mut quote =
                Quote::new(req.symbol, req.asset_class, ProviderId::Coingecko, req.provider_symbol)
                    .with_currency("USD");
            quote.price = history.close().iter().rev().find_map(|close| *close);
            Ok(quote.with_history(history))
        })
    }

    fn parse_usd(body: &Value, coin_id: &str) -> Result<f64, SourceError> {
        body.get(coin_id)
            .and_then(|coin| coin.get("usd"))
            .and_then(Value::as_f64)
            .ok_or_else(|| SourceError::no_data(format!("No CoinGecko price for '{coin_id}'")))
    }

    fn parse_market_chart(body: &Value, coin_id: &str) -> Result<PriceHistory, SourceError> {
        let chart = MarketChart::deserialize(body)
            .map_err(|e| SourceError::transport(format!("failed to parse coingecko chart: {e}")))?;

        if chart.prices.is_empty() {
            return Err(SourceError::no_data(format!(
                "No CoinGecko history for '{coin_id}'"
            )));
        }

        let (timestamps, closes): (Vec<_>, Vec<_>) = chart
            .prices
            .into_iter()
            .map(|(ms, price)| (Some(ms.div_euclid(1000)), price))
            .unzip();

        Ok(PriceHistory::new(
            timestamps,
            Vec::new(),
            Vec::new(),
            Vec::new(),
            closes,
            Vec::new(),
        ))
    }
}

impl QuoteProvider for CoingeckoAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Coingecko
    }

    fn fetch_quote<'a>(&'a self, req: QuoteRequest) -> QuoteFuture<'a> {
        Box::pin(async move {
            let url = self.price_url(&req.provider_symbol);
            let body = self.rotator.relayed_get(&url).await?;
            let price = Self::parse_usd(&body, &req.provider_symbol)?;

            Ok(
                Quote::new(req.symbol, req.asset_class, ProviderId::Coingecko, req.provider_symbol)
                    .with_price(price)
                    .with_currency("USD"),
            )
        })
    }
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(i64, Option<f64>)>,
}
