//! Outbound relay rotation.
//!
//! Some hosts get their outbound IP throttled by quote providers. A relay is a
//! third-party forwarding endpoint that fetches the target URL on our behalf.
//! The rotator tries the primary relay first and then every fallback relay in
//! a freshly shuffled order, returning the first parsed JSON body.

use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::ResponseCache;
use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::retry::RetryPolicy;
use crate::ValidationError;

const URL_PLACEHOLDER: &str = "{url}";

/// How a target URL is wrapped before it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relay {
    /// Call the target directly.
    Direct,
    /// Append the percent-encoded target to `base`,
    /// e.g. `https://corsproxy.io/?`.
    Prefix { base: String },
    /// Substitute the percent-encoded target for `{url}`,
    /// e.g. `https://api.allorigins.win/raw?url={url}`.
    Template { template: String },
}

impl Relay {
    /// Parse a relay spec: `direct`, a template containing `{url}`, or an
    /// http(s) prefix.
    pub fn parse(spec: &str) -> Result<Self, ValidationError> {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("direct") {
            return Ok(Self::Direct);
        }

        let is_http = spec.starts_with("https://") || spec.starts_with("http://");
        if !is_http {
            return Err(ValidationError::InvalidRelay {
                value: spec.to_owned(),
            });
        }

        if spec.contains(URL_PLACEHOLDER) {
            Ok(Self::Template {
                template: spec.to_owned(),
            })
        } else {
            Ok(Self::Prefix {
                base: spec.to_owned(),
            })
        }
    }

    /// Final URL to request for `target`.
    pub fn wrap(&self, target: &str) -> String {
        match self {
            Self::Direct => target.to_owned(),
            Self::Prefix { base } => format!("{base}{}", urlencoding::encode(target)),
            Self::Template { template } => {
                template.replace(URL_PLACEHOLDER, &urlencoding::encode(target))
            }
        }
    }
}

impl Display for Relay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Prefix { base } => f.write_str(base),
            Self::Template { template } => f.write_str(template),
        }
    }
}

/// Fetches JSON through the configured relays, caching by final URL.
pub struct RelayRotator {
    http: Arc<dyn HttpClient>,
    cache: ResponseCache,
    retry: RetryPolicy,
    primary: Option<Relay>,
    fallbacks: Vec<Relay>,
    timeout_ms: u64,
    rng: Mutex<fastrand::Rng>,
}

impl RelayRotator {
    /// Rotator with no relays: every call goes straight to the target.
    pub fn new(http: Arc<dyn HttpClient>, cache: ResponseCache) -> Self {
        Self {
            http,
            cache,
            retry: RetryPolicy::default(),
            primary: None,
            fallbacks: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    pub fn with_primary(mut self, relay: Relay) -> Self {
        self.primary = Some(relay);
        self
    }

    pub fn with_fallbacks(mut self, relays: Vec<Relay>) -> Self {
        self.fallbacks = relays;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Seed the fallback shuffle, for reproducible ordering.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            ..self
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// GET `raw_url` and parse the body as JSON.
    ///
    /// Order: primary relay, then the fallbacks shuffled. With no relays at
    /// all the target is called directly. When every attempt fails the last
    /// error is returned.
    pub async fn relayed_get(&self, raw_url: &str) -> Result<Arc<Value>, SourceError> {
        if self.primary.is_none() && self.fallbacks.is_empty() {
            return self.attempt(&Relay::Direct, raw_url).await;
        }

        let mut last_error = None;

        if let Some(primary) = &self.primary {
            match self.attempt(primary, raw_url).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(relay = %primary, error = %error, "primary relay failed");
                    last_error = Some(error);
                }
            }
        }

        for relay in self.shuffled_fallbacks() {
            match self.attempt(&relay, raw_url).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    warn!(relay = %relay, error = %error, "fallback relay failed");
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SourceError::transport("no relay attempted")))
    }

    fn shuffled_fallbacks(&self) -> Vec<Relay> {
        let mut relays = self.fallbacks.clone();
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shuffle(&mut relays);
        relays
    }

    async fn attempt(&self, relay: &Relay, raw_url: &str) -> Result<Arc<Value>, SourceError> {
        let url = relay.wrap(raw_url);
        debug!(relay = %relay, url = %url, "outbound fetch");
        self.cache.get_or_fetch(&url, || self.fetch_json(&url)).await
    }

    async fn fetch_json(&self, url: &str) -> Result<Value, SourceError> {
        let request = HttpRequest::get(url).with_timeout_ms(self.timeout_ms);
        let response = self.retry.execute(self.http.as_ref(), request).await?;

        serde_json::from_str(&response.body)
            .map_err(|e| SourceError::transport(format!("invalid JSON from {url}: {e}")))
    }
}
