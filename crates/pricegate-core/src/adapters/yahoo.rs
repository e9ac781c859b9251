use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::data_source::{QuoteFuture, QuoteProvider, QuoteRequest, SourceError};
use crate::relay::RelayRotator;
use crate::{PriceHistory, ProviderId, Quote};

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart/";

// Daily bars over roughly the last 90 calendar days.
const CHART_INTERVAL: &str = "1d";
const CHART_RANGE: &str = "3mo";

/// Primary provider: Yahoo Finance chart API.
///
/// One call returns real-time metadata plus a trailing window of daily OHLCV
/// bars.
#[derive(Clone)]
pub struct YahooChartAdapter {
    rotator: Arc<RelayRotator>,
    base_url: String,
}

impl YahooChartAdapter {
    pub fn new(rotator: Arc<RelayRotator>) -> Self {
        Self {
            rotator,
            base_url: String::from(DEFAULT_BASE_URL),
        }
    }

    pub fn chart_url(&self, provider_symbol: &str) -> String {
        format!(
            "{}{}?interval={CHART_INTERVAL}&range={CHART_RANGE}",
            self.base_url,
            urlencoding::encode(provider_symbol)
        )
    }

    fn parse_chart(req: &QuoteRequest, body: &Value) -> Result<Quote, SourceError> {
        let response = ChartResponse::deserialize(body)
            .map_err(|e| SourceError::transport(format!("failed to parse yahoo chart: {e}")))?;

        if let Some(error) = response.chart.error.filter(|error| !error.is_null()) {
            return Err(SourceError::no_data(format!("yahoo chart API error: {error}")));
        }

        let chart = response
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| SourceError::no_data("No Yahoo Chart data"))?;

        let meta = chart.meta;
        let price = meta
            .regular_market_price
            .ok_or_else(|| SourceError::no_data("yahoo chart has no regularMarketPrice"))?;

        let block = chart.indicators.quote.into_iter().next().unwrap_or_default();
        let history = PriceHistory::new(
            chart.timestamp.unwrap_or_default(),
            block.open,
            block.high,
            block.low,
            block.close,
            block
                .volume
                .into_iter()
                .map(|volume| volume.map(|v| v.max(0.0) as u64))
                .collect(),
        );

        let mut quote = Quote::new(
            req.symbol.clone(),
            req.asset_class,
            ProviderId::YahooChart,
            req.provider_symbol.clone(),
        )
        .with_price(price);
        quote.currency = meta.currency;
        quote.previous_close = meta.previous_close;
        quote.exchange_name = meta.exchange_name;
        quote.market_state = meta.market_state;
        if !history.is_empty() {
            quote.history = Some(history);
        }

        Ok(quote)
    }
}

impl QuoteProvider for YahooChartAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::YahooChart
    }

    fn fetch_quote<'a>(&'a self, req: QuoteRequest) -> QuoteFuture<'a> {
        Box::pin(async move {
            let url = self.chart_url(&req.provider_symbol);
            let body = self.rotator.relayed_get(&url).await?;
            Self::parse_chart(&req, &body)
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<Option<i64>>>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    exchange_name: Option<String>,
    currency: Option<String>,
    market_state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
