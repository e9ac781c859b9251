//! Ordered provider fallback.
//!
//! The resolver classifies a raw symbol once, then walks the provider chain
//! configured for that asset class. Each candidate gets the symbol in its own
//! spelling; the first success wins and every failure is kept as a
//! [`FallbackAttempt`] for diagnostics. Results are never merged across
//! providers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::data_source::{QuoteProvider, QuoteRequest, SourceError};
use crate::symbol_map::translate;
use crate::{classify, AssetClass, ProviderId, Quote, ResolveError, Symbol};

/// Ordered candidate providers per asset class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderChains {
    stock: Vec<ProviderId>,
    future: Vec<ProviderId>,
    index: Vec<ProviderId>,
    crypto: Vec<ProviderId>,
}

impl Default for ProviderChains {
    fn default() -> Self {
        let equities = vec![ProviderId::YahooChart, ProviderId::Stooq];
        Self {
            stock: equities.clone(),
            future: equities.clone(),
            index: equities,
            crypto: vec![ProviderId::Coingecko],
        }
    }
}

impl ProviderChains {
    /// Replace the chain for one class. Duplicates are dropped, first
    /// occurrence wins.
    pub fn with_chain(mut self, asset_class: AssetClass, chain: Vec<ProviderId>) -> Self {
        let chain = dedupe_chain(&chain);
        match asset_class {
            AssetClass::Stock => self.stock = chain,
            AssetClass::Future => self.future = chain,
            AssetClass::Index => self.index = chain,
            AssetClass::Crypto => self.crypto = chain,
        }
        self
    }

    pub fn chain_for(&self, asset_class: AssetClass) -> &[ProviderId] {
        match asset_class {
            AssetClass::Stock => &self.stock,
            AssetClass::Future => &self.future,
            AssetClass::Index => &self.index,
            AssetClass::Crypto => &self.crypto,
        }
    }
}

/// One provider invocation during a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackAttempt {
    pub provider: ProviderId,
    pub provider_symbol: String,
    pub error: Option<SourceError>,
}

impl FallbackAttempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Successful resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub quote: Quote,
    pub attempts: Vec<FallbackAttempt>,
    pub latency_ms: u64,
}

impl Resolution {
    pub fn source(&self) -> ProviderId {
        self.quote.source
    }
}

/// Every candidate failed.
#[derive(Debug, Clone)]
pub struct ResolveFailure {
    pub raw_symbol: String,
    pub asset_class: AssetClass,
    pub attempts: Vec<FallbackAttempt>,
    pub latency_ms: u64,
}

/// Provider registry plus per-class chains.
pub struct FallbackResolver {
    providers: HashMap<ProviderId, Arc<dyn QuoteProvider>>,
    chains: ProviderChains,
}

impl FallbackResolver {
    pub fn new(providers: Vec<Arc<dyn QuoteProvider>>, chains: ProviderChains) -> Self {
        let providers = providers
            .into_iter()
            .map(|provider| (provider.id(), provider))
            .collect();
        Self { providers, chains }
    }

    /// Classify `raw_symbol` and resolve it through that class's chain.
    pub async fn resolve(&self, raw_symbol: &str) -> Result<Resolution, ResolveError> {
        let symbol = Symbol::parse(raw_symbol)?;
        let asset_class = classify(symbol.as_str());
        self.run_chain(raw_symbol, symbol, asset_class).await
    }

    /// Resolve with a fixed asset class, skipping classification.
    pub async fn resolve_as(
        &self,
        raw_symbol: &str,
        asset_class: AssetClass,
    ) -> Result<Resolution, ResolveError> {
        let symbol = Symbol::parse(raw_symbol)?;
        self.run_chain(raw_symbol, symbol, asset_class).await
    }

    async fn run_chain(
        &self,
        raw_symbol: &str,
        symbol: Symbol,
        asset_class: AssetClass,
    ) -> Result<Resolution, ResolveError> {
        let started = Instant::now();
        let chain = self.chains.chain_for(asset_class);
        let mut attempts = Vec::with_capacity(chain.len());

        for &provider in chain {
            let provider_symbol = translate(&symbol, asset_class, provider);

            let Some(adapter) = self.providers.get(&provider) else {
                attempts.push(FallbackAttempt {
                    provider,
                    provider_symbol,
                    error: Some(SourceError::transport(format!(
                        "provider '{provider}' is not registered"
                    ))),
                });
                continue;
            };

            debug!(
                symbol = %symbol,
                asset_class = %asset_class,
                provider = %provider,
                provider_symbol = %provider_symbol,
                "trying provider"
            );

            let request = QuoteRequest::new(symbol.clone(), asset_class, provider_symbol.clone());
            match adapter.fetch_quote(request).await {
                Ok(quote) => {
                    attempts.push(FallbackAttempt {
                        provider,
                        provider_symbol,
                        error: None,
                    });
                    return Ok(Resolution {
                        quote,
                        attempts,
                        latency_ms: elapsed_ms(started),
                    });
                }
                Err(error) => {
                    warn!(
                        symbol = %symbol,
                        provider = %provider,
                        kind = error.kind().as_str(),
                        error = %error,
                        "provider failed, falling back"
                    );
                    attempts.push(FallbackAttempt {
                        provider,
                        provider_symbol,
                        error: Some(error),
                    });
                }
            }
        }

        Err(ResolveError::AllProvidersFailed(ResolveFailure {
            raw_symbol: raw_symbol.to_owned(),
            asset_class,
            attempts,
            latency_ms: elapsed_ms(started),
        }))
    }
}

fn dedupe_chain(chain: &[ProviderId]) -> Vec<ProviderId> {
    let mut seen = HashSet::new();
    chain
        .iter()
        .copied()
        .filter(|provider| seen.insert(*provider))
        .collect()
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}
