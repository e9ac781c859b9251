use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use pricegate_core::{
    classify, close_points, AssetClass, ForwardPayload, ForwardRequest, PriceSummary,
    ResolveError, Resolution,
};
use serde::Deserialize;
use tracing::debug;

use crate::app::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CryptoBody, ErrorBody, HealthBody, HistoryBody, HistoryReply, PriceBody, PriceReply,
};

const PRICE_MISSING: &str = "Invalid symbol or no data available";
const FUTURE_MISSING: &str = "Invalid future symbol";
const INDEX_MISSING: &str = "Invalid index symbol";
const HISTORY_MISSING: &str = "No history available";

pub async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// `GET /price/{symbol}`: classify, then walk the class chain.
pub async fn price(State(state): State<AppState>, Path(symbol): Path<String>) -> Json<PriceReply> {
    let display = display_symbol(&symbol);
    let asset_class = classify(&display);
    let result = state.engine.resolve(&symbol).await;
    Json(price_reply(result, display, asset_class, None, PRICE_MISSING))
}

pub async fn futures(State(state): State<AppState>, Path(symbol): Path<String>) -> Json<PriceReply> {
    let result = state.engine.resolve_as(&symbol, AssetClass::Future).await;
    Json(price_reply(
        result,
        display_symbol(&symbol),
        AssetClass::Future,
        Some("futures"),
        FUTURE_MISSING,
    ))
}

pub async fn index(State(state): State<AppState>, Path(symbol): Path<String>) -> Json<PriceReply> {
    let result = state.engine.resolve_as(&symbol, AssetClass::Index).await;
    Json(price_reply(
        result,
        display_symbol(&symbol),
        AssetClass::Index,
        Some("index"),
        INDEX_MISSING,
    ))
}

/// `GET /crypto/{symbol}`: CoinGecko only, `400 {detail}` on failure.
pub async fn crypto(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> ApiResult<Json<CryptoBody>> {
    let resolution = state
        .engine
        .resolve_as(&symbol, AssetClass::Crypto)
        .await
        .map_err(crypto_error)?;

    let quote = resolution.quote;
    Ok(Json(CryptoBody {
        source: quote.source,
        symbol: quote.symbol.to_string(),
        price: quote.price,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub asset_type: Option<AssetClass>,
}

/// `GET /history/{symbol}?asset_type=`: close series plus a volatility
/// summary. Crypto history comes from the CoinGecko market chart.
pub async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Json<HistoryReply> {
    let shown = display_symbol(&symbol);
    let asset_class = params.asset_type.unwrap_or_else(|| classify(&shown));

    let result = match params.asset_type {
        None => state.engine.resolve(&symbol).await,
        Some(AssetClass::Crypto) => state.engine.crypto_history(&symbol).await,
        Some(fixed) => state.engine.resolve_as(&symbol, fixed).await,
    };

    let found = match result {
        Ok(resolution) => history_body(resolution),
        Err(error) => {
            debug!(symbol = %shown, error = %error, "history unavailable");
            None
        }
    };

    Json(match found {
        Some(body) => HistoryReply::Found(body),
        None => HistoryReply::Missing(ErrorBody {
            error: HISTORY_MISSING,
            symbol: shown,
            asset_type: asset_class,
            endpoint: None,
        }),
    })
}

#[derive(Debug, Deserialize)]
pub struct ProxyParams {
    pub url: String,
    #[serde(default = "default_method")]
    pub method: String,
}

fn default_method() -> String {
    String::from("GET")
}

/// `GET|POST /proxy?url=&method=`: allow-listed pass-through.
pub async fn proxy(
    State(state): State<AppState>,
    Query(params): Query<ProxyParams>,
    body: Bytes,
) -> ApiResult<Json<ForwardPayload>> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(
            serde_json::from_slice(&body)
                .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))?,
        )
    };

    let request = ForwardRequest::new(&params.url, &params.method, body)?;
    let response = state.engine.forward(request).await?;
    Ok(Json(response.into_payload()))
}

fn display_symbol(raw: &str) -> String {
    raw.trim().to_uppercase()
}

fn price_reply(
    result: Result<Resolution, ResolveError>,
    shown: String,
    asset_class: AssetClass,
    endpoint: Option<&'static str>,
    missing: &'static str,
) -> PriceReply {
    match result {
        Ok(resolution) => PriceReply::Found(Box::new(PriceBody::from_quote(
            resolution.quote,
            endpoint,
        ))),
        Err(error) => {
            debug!(symbol = %shown, error = %error, "no provider answered");
            PriceReply::Missing(ErrorBody {
                error: missing,
                symbol: shown,
                asset_type: asset_class,
                endpoint,
            })
        }
    }
}

fn history_body(resolution: Resolution) -> Option<HistoryBody> {
    let quote = resolution.quote;
    let points = close_points(quote.history.as_ref()?);
    let summary = PriceSummary::from_points(&points)?;

    Some(HistoryBody {
        source: quote.source,
        asset_type: quote.asset_class,
        symbol: quote.symbol.to_string(),
        summary,
        history: points,
    })
}

/// Surface the crypto provider's own message when there is one.
fn crypto_error(error: ResolveError) -> ApiError {
    let detail = error
        .failure()
        .and_then(|failure| failure.attempts.last())
        .and_then(|attempt| attempt.error.as_ref())
        .map(|source_error| source_error.message().to_owned())
        .unwrap_or_else(|| error.to_string());
    ApiError::BadRequest(detail)
}
