//! Engine configuration.
//!
//! # Environment Variables
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `PRICEGATE_TIMEOUT_MS` | per-call timeout | `10000` |
//! | `PRICEGATE_CACHE_CAPACITY` | cached responses, `0` disables | `256` |
//! | `PRICEGATE_CACHE_TTL_SECS` | entry lifetime, `0` keeps forever | `30` |
//! | `PRICEGATE_RETRY_ATTEMPTS` | attempts per call on `429` | `3` |
//! | `PRICEGATE_RETRY_BASE_MS` | backoff base delay | `1000` |
//! | `PRICEGATE_RETRY_BACKOFF` | `linear` or `exponential` | `linear` |
//! | `PRICEGATE_PRIMARY_RELAY` | relay tried first | none |
//! | `PRICEGATE_FALLBACK_RELAYS` | comma-separated relays, shuffled | none |
//! | `PRICEGATE_ALLOWED_HOSTS` | comma-separated forwarding hosts | built-in list |
//! | `PRICEGATE_USER_AGENT` | outbound `User-Agent` | browser-like |
//! | `PRICEGATE_CHAIN_STOCK` | comma-separated provider ids, in order | `yahoo_chart,stooq` |
//! | `PRICEGATE_CHAIN_FUTURE` | same, for futures | `yahoo_chart,stooq` |
//! | `PRICEGATE_CHAIN_INDEX` | same, for indices | `yahoo_chart,stooq` |
//! | `PRICEGATE_CHAIN_CRYPTO` | same, for crypto | `coingecko` |

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_CAPACITY;
use crate::forward::DEFAULT_ALLOWED_HOSTS;
use crate::http_client::{DEFAULT_TIMEOUT_MS, DEFAULT_USER_AGENT};
use crate::relay::Relay;
use crate::resolver::ProviderChains;
use crate::retry::{Backoff, RetryPolicy};
use crate::{AssetClass, ProviderId, ValidationError};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

const EXPONENTIAL_FACTOR: f64 = 2.0;
const EXPONENTIAL_MAX: Duration = Duration::from_secs(30);

const CHAIN_VARIABLES: [(&str, AssetClass); 4] = [
    ("PRICEGATE_CHAIN_STOCK", AssetClass::Stock),
    ("PRICEGATE_CHAIN_FUTURE", AssetClass::Future),
    ("PRICEGATE_CHAIN_INDEX", AssetClass::Index),
    ("PRICEGATE_CHAIN_CRYPTO", AssetClass::Crypto),
];

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub timeout_ms: u64,
    pub cache_capacity: usize,
    pub cache_ttl: Option<Duration>,
    pub retry: RetryPolicy,
    pub primary_relay: Option<Relay>,
    pub fallback_relays: Vec<Relay>,
    /// Fixed shuffle seed for the fallback relays. Random when `None`.
    pub relay_seed: Option<u64>,
    pub allowed_hosts: Vec<String>,
    pub user_agent: String,
    pub chains: ProviderChains,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl: Some(DEFAULT_CACHE_TTL),
            retry: RetryPolicy::default(),
            primary_relay: None,
            fallback_relays: Vec::new(),
            relay_seed: None,
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|h| (*h).to_owned()).collect(),
            user_agent: String::from(DEFAULT_USER_AGENT),
            chains: ProviderChains::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `PRICEGATE_*` environment variables.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get("PRICEGATE_TIMEOUT_MS") {
            config.timeout_ms = parse_number("PRICEGATE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = get("PRICEGATE_CACHE_CAPACITY") {
            config.cache_capacity = parse_number("PRICEGATE_CACHE_CAPACITY", &value)?;
        }
        if let Some(value) = get("PRICEGATE_CACHE_TTL_SECS") {
            let secs: u64 = parse_number("PRICEGATE_CACHE_TTL_SECS", &value)?;
            config.cache_ttl = (secs > 0).then(|| Duration::from_secs(secs));
        }

        if let Some(value) = get("PRICEGATE_RETRY_ATTEMPTS") {
            let attempts: u32 = parse_number("PRICEGATE_RETRY_ATTEMPTS", &value)?;
            config.retry.max_attempts = attempts.max(1);
        }
        let base = match get("PRICEGATE_RETRY_BASE_MS") {
            Some(value) => Duration::from_millis(parse_number("PRICEGATE_RETRY_BASE_MS", &value)?),
            None => Duration::from_secs(1),
        };
        config.retry.backoff = match get("PRICEGATE_RETRY_BACKOFF").as_deref().map(str::trim) {
            None => Backoff::Linear { base },
            Some(kind) if kind.eq_ignore_ascii_case("linear") => Backoff::Linear { base },
            Some(kind) if kind.eq_ignore_ascii_case("exponential") => Backoff::Exponential {
                base,
                factor: EXPONENTIAL_FACTOR,
                max: EXPONENTIAL_MAX,
                jitter: true,
            },
            Some(other) => {
                return Err(ValidationError::InvalidConfig {
                    name: "PRICEGATE_RETRY_BACKOFF",
                    value: other.to_owned(),
                })
            }
        };

        if let Some(value) = get("PRICEGATE_PRIMARY_RELAY") {
            config.primary_relay = Some(Relay::parse(&value)?);
        }
        if let Some(value) = get("PRICEGATE_FALLBACK_RELAYS") {
            config.fallback_relays = split_list(&value)
                .map(Relay::parse)
                .collect::<Result<_, _>>()?;
        }
        if let Some(value) = get("PRICEGATE_ALLOWED_HOSTS") {
            config.allowed_hosts = split_list(&value).map(str::to_owned).collect();
        }
        if let Some(value) = get("PRICEGATE_USER_AGENT") {
            config.user_agent = value.trim().to_owned();
        }

        for (name, asset_class) in CHAIN_VARIABLES {
            let Some(value) = get(name) else {
                continue;
            };
            let chain = split_list(&value)
                .map(str::parse::<ProviderId>)
                .collect::<Result<Vec<_>, _>>()?;
            if chain.is_empty() {
                return Err(ValidationError::InvalidConfig { name, value });
            }
            config.chains = config.chains.with_chain(asset_class, chain);
        }

        Ok(config)
    }

    pub fn with_primary_relay(mut self, relay: Relay) -> Self {
        self.primary_relay = Some(relay);
        self
    }

    pub fn with_fallback_relays(mut self, relays: Vec<Relay>) -> Self {
        self.fallback_relays = relays;
        self
    }

    pub fn with_cache(mut self, capacity: usize, ttl: Option<Duration>) -> Self {
        self.cache_capacity = capacity;
        self.cache_ttl = ttl;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_relay_seed(mut self, seed: u64) -> Self {
        self.relay_seed = Some(seed);
        self
    }

    pub fn with_chains(mut self, chains: ProviderChains) -> Self {
        self.chains = chains;
        self
    }
}

fn parse_number<T: FromStr>(name: &'static str, value: &str) -> Result<T, ValidationError> {
    value
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidConfig {
            name,
            value: value.to_owned(),
        })
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|item| !item.is_empty())
}
