//! Behavior-driven tests for quote resolution.
//!
//! These tests drive the fully wired engine over a scripted transport and
//! verify which provider answers, in what spelling, and how often the
//! network is touched.

use std::sync::Arc;
use std::time::Duration;

use pricegate_core::http_client::{HttpResponse, ScriptedHttpClient};
use pricegate_core::{
    AssetClass, Engine, EngineConfig, ProviderChains, ProviderId, ResolveError, RetryPolicy,
    SourceErrorKind,
};

const YAHOO_AAPL: &str = "https://query2.finance.yahoo.com/v8/finance/chart/AAPL";
const YAHOO_GSPC: &str = "https://query2.finance.yahoo.com/v8/finance/chart/%5EGSPC";
const STOOQ_AAPL: &str = "https://stooq.com/q/l/?s=aapl.us";
const STOOQ_GSPC: &str = "https://stooq.com/q/l/?s=%5Egspc";
const COINGECKO_BITCOIN: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd";

const AAPL_CHART: &str = r#"{
    "chart": {
        "result": [{
            "meta": {
                "currency": "USD",
                "exchangeName": "NMS",
                "regularMarketPrice": 190.12,
                "previousClose": 189.5,
                "marketState": "REGULAR"
            },
            "timestamp": [1700000000, 1700086400],
            "indicators": { "quote": [{ "close": [189.5, 190.12], "volume": [10, 20] }] }
        }],
        "error": null
    }
}"#;

fn engine(client: &Arc<ScriptedHttpClient>) -> Engine {
    let config = EngineConfig::default()
        .with_retry(RetryPolicy::linear(3, Duration::from_millis(1)));
    Engine::with_http_client(config, client.clone())
}

// =============================================================================
// Resolution: end-to-end scenarios
// =============================================================================

#[tokio::test]
async fn when_primary_answers_stock_is_tagged_yahoo_chart() {
    // Given: Yahoo knows AAPL
    let client = Arc::new(ScriptedHttpClient::new().on_json(YAHOO_AAPL, AAPL_CHART));
    let engine = engine(&client);

    // When
    let resolution = engine.resolve("AAPL").await.expect("AAPL resolves");

    // Then
    let quote = &resolution.quote;
    assert_eq!(quote.source, ProviderId::YahooChart);
    assert_eq!(quote.asset_class, AssetClass::Stock);
    assert_eq!(quote.price, Some(190.12));
    assert_eq!(quote.previous_close, Some(189.5));
    assert_eq!(quote.history.as_ref().map(|h| h.len()), Some(2));
}

#[tokio::test]
async fn when_primary_has_nothing_index_falls_back_to_stooq() {
    // Given: Yahoo returns an empty chart, Stooq has the index
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_json(YAHOO_GSPC, r#"{"chart":{"result":[],"error":null}}"#)
            .on_json(STOOQ_GSPC, r#"[{"symbol":"^GSPC","close":"4500.25"}]"#),
    );
    let engine = engine(&client);

    // When
    let resolution = engine.resolve("^GSPC").await.expect("index resolves");

    // Then: Stooq answered with its own spelling
    let quote = &resolution.quote;
    assert_eq!(quote.source, ProviderId::Stooq);
    assert_eq!(quote.asset_class, AssetClass::Index);
    assert_eq!(quote.provider_symbol, "^gspc");
    assert_eq!(quote.price, Some(4500.25));
    assert_eq!(quote.history, None);
    assert_eq!(resolution.attempts.len(), 2);
    assert_eq!(
        resolution.attempts[0].error.as_ref().map(|e| e.kind()),
        Some(SourceErrorKind::NoData)
    );
}

#[tokio::test]
async fn crypto_route_uses_lowercase_coin_id_and_uppercase_symbol() {
    let client =
        Arc::new(ScriptedHttpClient::new().on_json(COINGECKO_BITCOIN, r#"{"bitcoin":{"usd":65000.5}}"#));
    let engine = engine(&client);

    let resolution = engine
        .resolve_as("bitcoin", AssetClass::Crypto)
        .await
        .expect("bitcoin resolves");

    assert_eq!(resolution.quote.source, ProviderId::Coingecko);
    assert_eq!(resolution.quote.symbol.as_str(), "BITCOIN");
    assert_eq!(resolution.quote.price, Some(65000.5));
    assert_eq!(resolution.quote.currency.as_deref(), Some("USD"));
}

// =============================================================================
// Resolution: priority and failure
// =============================================================================

#[tokio::test]
async fn first_success_wins_and_later_providers_are_never_called() {
    // Given: both providers would answer
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_json(YAHOO_AAPL, AAPL_CHART)
            .on_json(STOOQ_AAPL, r#"[{"close":"1.0"}]"#),
    );
    let engine = engine(&client);

    // When
    let resolution = engine.resolve("aapl").await.expect("resolves");

    // Then
    assert_eq!(resolution.quote.source, ProviderId::YahooChart);
    assert_eq!(client.call_count(STOOQ_AAPL), 0);
}

#[tokio::test]
async fn rate_limited_primary_is_retried_then_skipped() {
    // Given: Yahoo keeps answering 429
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on(YAHOO_AAPL, Ok(HttpResponse::new(429, "Too Many Requests")))
            .on_json(STOOQ_AAPL, r#"[{"symbol":"AAPL.US","close":"190.00"}]"#),
    );
    let engine = engine(&client);

    // When
    let resolution = engine.resolve("AAPL").await.expect("stooq answers");

    // Then: the whole retry budget was spent on Yahoo before falling back
    assert_eq!(client.call_count(YAHOO_AAPL), 3);
    assert_eq!(resolution.quote.source, ProviderId::Stooq);
    assert_eq!(
        resolution.attempts[0].error.as_ref().map(|e| e.kind()),
        Some(SourceErrorKind::RateLimited)
    );
}

#[tokio::test]
async fn when_every_provider_fails_error_carries_raw_symbol() {
    // Given: nothing is scripted, so every call answers 404
    let client = Arc::new(ScriptedHttpClient::new());
    let engine = engine(&client);

    // When
    let error = engine.resolve("zzzz9").await.expect_err("nobody knows it");

    // Then
    let failure = match error {
        ResolveError::AllProvidersFailed(failure) => failure,
        other => panic!("expected aggregate failure, got {other:?}"),
    };
    assert_eq!(failure.raw_symbol, "zzzz9");
    assert_eq!(failure.asset_class, AssetClass::Stock);
    let providers: Vec<_> = failure.attempts.iter().map(|a| a.provider).collect();
    assert_eq!(providers, vec![ProviderId::YahooChart, ProviderId::Stooq]);
}

#[tokio::test]
async fn blank_symbol_is_rejected_before_any_request() {
    let client = Arc::new(ScriptedHttpClient::new());
    let engine = engine(&client);

    let error = engine.resolve("   ").await.expect_err("invalid");

    assert!(matches!(error, ResolveError::InvalidSymbol(_)));
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn punctuated_ticker_is_encoded_and_resolved() {
    // Given: Yahoo lists an NSE ticker with an ampersand
    let client = Arc::new(ScriptedHttpClient::new().on_json(
        "https://query2.finance.yahoo.com/v8/finance/chart/M%26M.NS?",
        r#"{"chart":{"result":[{"meta":{"regularMarketPrice":2890.4,"currency":"INR"}}],"error":null}}"#,
    ));
    let engine = engine(&client);

    // When
    let resolution = engine.resolve("m&m.ns").await.expect("M&M.NS resolves");

    // Then
    assert_eq!(resolution.quote.source, ProviderId::YahooChart);
    assert_eq!(resolution.quote.symbol.as_str(), "M&M.NS");
    assert_eq!(resolution.quote.price, Some(2890.4));
    assert_eq!(client.calls().len(), 1);
}

// =============================================================================
// Cache
// =============================================================================

#[tokio::test]
async fn identical_lookups_hit_the_network_once() {
    let client = Arc::new(ScriptedHttpClient::new().on_json(YAHOO_AAPL, AAPL_CHART));
    let engine = engine(&client);

    let first = engine.resolve("AAPL").await.expect("first");
    let second = engine.resolve("aapl").await.expect("second");

    assert_eq!(first.quote, second.quote);
    assert_eq!(client.calls().len(), 1);
    assert_eq!(engine.cache_stats().hits, 1);
    assert_eq!(engine.cached_responses(), 1);
}

#[tokio::test]
async fn failed_lookups_are_not_cached() {
    let client = Arc::new(ScriptedHttpClient::new().on_sequence(
        YAHOO_AAPL,
        vec![
            Ok(HttpResponse::new(500, "oops")),
            Ok(HttpResponse::ok_json(AAPL_CHART)),
        ],
    ));
    let engine = engine(&client);

    let _ = engine.resolve("AAPL").await;
    let resolution = engine.resolve("AAPL").await.expect("second try succeeds");

    assert_eq!(resolution.quote.source, ProviderId::YahooChart);
    assert_eq!(client.call_count(YAHOO_AAPL), 2);
}

#[tokio::test]
async fn zero_capacity_cache_refetches_every_time() {
    let client = Arc::new(ScriptedHttpClient::new().on_json(YAHOO_AAPL, AAPL_CHART));
    let config = EngineConfig::default()
        .with_cache(0, None)
        .with_retry(RetryPolicy::no_retry());
    let engine = Engine::with_http_client(config, client.clone());

    engine.resolve("AAPL").await.expect("first");
    engine.resolve("AAPL").await.expect("second");

    assert_eq!(client.call_count(YAHOO_AAPL), 2);
    assert_eq!(engine.cached_responses(), 0);
}

#[tokio::test]
async fn configured_chain_order_is_respected() {
    // Given: indices are routed to Stooq before Yahoo
    let client = Arc::new(
        ScriptedHttpClient::new()
            .on_json(YAHOO_GSPC, AAPL_CHART)
            .on_json(STOOQ_GSPC, r#"[{"close":"4500.25"}]"#),
    );
    let chains = ProviderChains::default().with_chain(
        AssetClass::Index,
        vec![ProviderId::Stooq, ProviderId::YahooChart],
    );
    let config = EngineConfig::default()
        .with_chains(chains)
        .with_retry(RetryPolicy::no_retry());
    let engine = Engine::with_http_client(config, client.clone());

    // When
    let resolution = engine.resolve("^GSPC").await.expect("resolves");

    // Then
    assert_eq!(resolution.quote.source, ProviderId::Stooq);
    assert_eq!(client.call_count(YAHOO_GSPC), 0);
}
