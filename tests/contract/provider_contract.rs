//! Contract every quote provider must honor, checked against each adapter
//! over the same scripted transport.

use std::sync::Arc;

use pricegate_core::http_client::{HttpError, HttpResponse, ScriptedHttpClient};
use pricegate_core::{
    translate, AssetClass, CoingeckoAdapter, ProviderId, QuoteProvider, QuoteRequest, RelayRotator,
    ResponseCache, RetryPolicy, SourceErrorKind, StooqAdapter, Symbol, YahooChartAdapter,
};

struct ProviderCase {
    id: ProviderId,
    asset_class: AssetClass,
    raw_symbol: &'static str,
    url_prefix: &'static str,
    ok_body: &'static str,
    empty_body: &'static str,
    has_history: bool,
}

fn provider_cases() -> Vec<ProviderCase> {
    vec![
        ProviderCase {
            id: ProviderId::YahooChart,
            asset_class: AssetClass::Stock,
            raw_symbol: "MSFT",
            url_prefix: "https://query2.finance.yahoo.com/v8/finance/chart/MSFT",
            ok_body: r#"{"chart":{"result":[{"meta":{"regularMarketPrice":410.5,"currency":"USD"},
                "timestamp":[1700000000],"indicators":{"quote":[{"close":[410.5]}]}}],"error":null}}"#,
            empty_body: r#"{"chart":{"result":[],"error":null}}"#,
            has_history: true,
        },
        ProviderCase {
            id: ProviderId::Stooq,
            asset_class: AssetClass::Future,
            raw_symbol: "CL=F",
            url_prefix: "https://stooq.com/q/l/?s=cl.f",
            ok_body: r#"[{"symbol":"CL.F","close":"78.40"}]"#,
            empty_body: r#"[{"symbol":"CL.F","close":"N/A"}]"#,
            has_history: false,
        },
        ProviderCase {
            id: ProviderId::Coingecko,
            asset_class: AssetClass::Crypto,
            raw_symbol: "ethereum",
            url_prefix: "https://api.coingecko.com/api/v3/simple/price?ids=ethereum",
            ok_body: r#"{"ethereum":{"usd":3100.25}}"#,
            empty_body: r#"{}"#,
            has_history: false,
        },
    ]
}

fn provider(id: ProviderId, client: ScriptedHttpClient) -> Arc<dyn QuoteProvider> {
    let rotator = Arc::new(
        RelayRotator::new(Arc::new(client), ResponseCache::disabled())
            .with_retry(RetryPolicy::no_retry()),
    );
    match id {
        ProviderId::YahooChart => Arc::new(YahooChartAdapter::new(rotator)),
        ProviderId::Stooq => Arc::new(StooqAdapter::new(rotator)),
        ProviderId::Coingecko => Arc::new(CoingeckoAdapter::new(rotator)),
    }
}

fn request(case: &ProviderCase) -> QuoteRequest {
    let symbol = Symbol::parse(case.raw_symbol).expect("valid symbol");
    let provider_symbol = translate(&symbol, case.asset_class, case.id);
    QuoteRequest::new(symbol, case.asset_class, provider_symbol)
}

#[tokio::test]
async fn successful_quote_is_tagged_and_keeps_identity() {
    for case in provider_cases() {
        let source = provider(case.id, ScriptedHttpClient::new().on_json(case.url_prefix, case.ok_body));
        assert_eq!(source.id(), case.id);

        let req = request(&case);
        let quote = source
            .fetch_quote(req.clone())
            .await
            .unwrap_or_else(|error| panic!("provider '{}' failed: {error}", case.id));

        assert_eq!(quote.source, case.id, "provider '{}': source tag", case.id);
        assert_eq!(quote.symbol, req.symbol, "provider '{}': symbol", case.id);
        assert_eq!(quote.asset_class, case.asset_class);
        assert_eq!(quote.provider_symbol, req.provider_symbol);
        assert!(quote.price.is_some_and(|p| p > 0.0), "provider '{}': price", case.id);
        assert_eq!(
            quote.history.is_some(),
            case.has_history,
            "provider '{}': history presence",
            case.id
        );
    }
}

#[tokio::test]
async fn empty_answer_is_no_data() {
    for case in provider_cases() {
        let source =
            provider(case.id, ScriptedHttpClient::new().on_json(case.url_prefix, case.empty_body));

        let error = source
            .fetch_quote(request(&case))
            .await
            .expect_err("empty answer must fail");

        assert_eq!(error.kind(), SourceErrorKind::NoData, "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn throttling_is_rate_limited_and_outages_are_transport_failures() {
    for case in provider_cases() {
        let throttled = provider(
            case.id,
            ScriptedHttpClient::new().on(case.url_prefix, Ok(HttpResponse::new(429, ""))),
        );
        let down = provider(
            case.id,
            ScriptedHttpClient::new().on(case.url_prefix, Err(HttpError::timeout("timed out"))),
        );

        let throttled = throttled.fetch_quote(request(&case)).await.expect_err("429");
        let down = down.fetch_quote(request(&case)).await.expect_err("timeout");

        assert_eq!(throttled.kind(), SourceErrorKind::RateLimited, "provider '{}'", case.id);
        assert_eq!(down.kind(), SourceErrorKind::TransportFailure, "provider '{}'", case.id);
    }
}

#[tokio::test]
async fn unparseable_body_is_transport_failure() {
    for case in provider_cases() {
        let source = provider(
            case.id,
            ScriptedHttpClient::new().on(case.url_prefix, Ok(HttpResponse::new(200, "<html>"))),
        );

        let error = source.fetch_quote(request(&case)).await.expect_err("html");

        assert_eq!(error.kind(), SourceErrorKind::TransportFailure, "provider '{}'", case.id);
    }
}
