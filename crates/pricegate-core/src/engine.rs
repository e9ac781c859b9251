use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::adapters::{CoingeckoAdapter, StooqAdapter, YahooChartAdapter};
use crate::cache::{CacheStats, ResponseCache};
use crate::config::EngineConfig;
use crate::data_source::{QuoteProvider, QuoteRequest, SourceError};
use crate::forward::{AllowList, ForwardRequest, ForwardResponse, Forwarder};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::relay::RelayRotator;
use crate::resolver::{elapsed_ms, FallbackAttempt, FallbackResolver, Resolution, ResolveFailure};
use crate::symbol_map::translate;
use crate::{AssetClass, ProviderId, ResolveError, Symbol};

/// Fully wired quote engine: one cache and one relay rotator shared by all
/// providers, plus the forwarder.
pub struct Engine {
    resolver: FallbackResolver,
    coingecko: Arc<CoingeckoAdapter>,
    forwarder: Forwarder,
    cache: ResponseCache,
}

impl Engine {
    /// Engine with a reqwest transport.
    pub fn new(config: EngineConfig) -> Self {
        let http = Arc::new(ReqwestHttpClient::with_user_agent(&config.user_agent));
        Self::with_http_client(config, http)
    }

    /// Engine over an arbitrary transport.
    pub fn with_http_client(config: EngineConfig, http: Arc<dyn HttpClient>) -> Self {
        let cache = ResponseCache::new(config.cache_capacity, config.cache_ttl);

        let mut rotator = RelayRotator::new(Arc::clone(&http), cache.clone())
            .with_retry(config.retry.clone())
            .with_timeout_ms(config.timeout_ms)
            .with_fallbacks(config.fallback_relays.clone());
        if let Some(primary) = config.primary_relay.clone() {
            rotator = rotator.with_primary(primary);
        }
        if let Some(seed) = config.relay_seed {
            rotator = rotator.with_seed(seed);
        }
        let rotator = Arc::new(rotator);

        let coingecko = Arc::new(CoingeckoAdapter::new(Arc::clone(&rotator)));
        let providers: Vec<Arc<dyn QuoteProvider>> = vec![
            Arc::new(YahooChartAdapter::new(Arc::clone(&rotator))),
            Arc::new(StooqAdapter::new(rotator)),
            coingecko.clone(),
        ];

        info!(
            cache_capacity = config.cache_capacity,
            cache_ttl_secs = config.cache_ttl.map(|ttl| ttl.as_secs()),
            primary_relay = config.primary_relay.is_some(),
            fallback_relays = config.fallback_relays.len(),
            "quote engine ready"
        );

        Self {
            resolver: FallbackResolver::new(providers, config.chains),
            coingecko,
            forwarder: Forwarder::new(http, AllowList::new(&config.allowed_hosts))
                .with_timeout_ms(config.timeout_ms),
            cache,
        }
    }

    pub async fn resolve(&self, raw_symbol: &str) -> Result<Resolution, ResolveError> {
        self.resolver.resolve(raw_symbol).await
    }

    pub async fn resolve_as(
        &self,
        raw_symbol: &str,
        asset_class: AssetClass,
    ) -> Result<Resolution, ResolveError> {
        self.resolver.resolve_as(raw_symbol, asset_class).await
    }

    /// 90-day CoinGecko price series for a coin id.
    ///
    /// Bypasses the provider chains: only CoinGecko serves crypto history.
    pub async fn crypto_history(&self, raw_symbol: &str) -> Result<Resolution, ResolveError> {
        let started = Instant::now();
        let symbol = Symbol::parse(raw_symbol)?;
        let provider_symbol = translate(&symbol, AssetClass::Crypto, ProviderId::Coingecko);
        let request = QuoteRequest::new(symbol, AssetClass::Crypto, provider_symbol.clone());

        let outcome = self.coingecko.fetch_history(request).await;
        let latency_ms = elapsed_ms(started);

        match outcome {
            Ok(quote) => Ok(Resolution {
                quote,
                attempts: vec![FallbackAttempt {
                    provider: ProviderId::Coingecko,
                    provider_symbol,
                    error: None,
                }],
                latency_ms,
            }),
            Err(error) => {
                warn!(symbol = raw_symbol, error = %error, "crypto history unavailable");
                Err(ResolveError::AllProvidersFailed(ResolveFailure {
                    raw_symbol: raw_symbol.to_owned(),
                    asset_class: AssetClass::Crypto,
                    attempts: vec![FallbackAttempt {
                        provider: ProviderId::Coingecko,
                        provider_symbol,
                        error: Some(error),
                    }],
                    latency_ms,
                }))
            }
        }
    }

    pub async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, SourceError> {
        self.forwarder.forward(request).await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_responses(&self) -> usize {
        self.cache.len()
    }
}
