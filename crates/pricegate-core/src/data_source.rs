//! Provider contract and failure taxonomy.
//!
//! Every quote provider implements [`QuoteProvider`]. Failures are typed with
//! [`SourceErrorKind`] so callers can tell an empty answer from a throttled or
//! broken upstream.
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `NoData` | provider answered but has nothing for the symbol |
//! | `RateLimited` | explicit rate-limit status, retry budget exhausted |
//! | `TransportFailure` | network error, timeout, non-2xx or unreadable body |
//! | `DomainNotAllowed` | forwarding target is not on the allow-list |

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{AssetClass, ProviderId, Quote, Symbol};

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorKind {
    NoData,
    RateLimited,
    TransportFailure,
    DomainNotAllowed,
}

impl SourceErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::RateLimited => "rate_limited",
            Self::TransportFailure => "transport_failure",
            Self::DomainNotAllowed => "domain_not_allowed",
        }
    }
}

/// Structured failure from a provider, relay or forwarding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn no_data(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NoData,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::TransportFailure,
            message: message.into(),
        }
    }

    pub fn domain_not_allowed(host: &str) -> Self {
        Self {
            kind: SourceErrorKind::DomainNotAllowed,
            message: format!("Domain not allowed: {host}"),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind.as_str())
    }
}

impl std::error::Error for SourceError {}

/// One provider call: canonical identity plus the provider's own spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
    pub symbol: Symbol,
    pub asset_class: AssetClass,
    pub provider_symbol: String,
}

impl QuoteRequest {
    pub fn new(symbol: Symbol, asset_class: AssetClass, provider_symbol: impl Into<String>) -> Self {
        Self {
            symbol,
            asset_class,
            provider_symbol: provider_symbol.into(),
        }
    }
}

pub type QuoteFuture<'a> = Pin<Box<dyn Future<Output = Result<Quote, SourceError>> + Send + 'a>>;

/// Quote provider contract.
///
/// Implementations build the upstream request for `req.provider_symbol`,
/// fetch it and normalize the native payload into a [`Quote`] tagged with
/// [`id`](QuoteProvider::id).
pub trait QuoteProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    fn fetch_quote<'a>(&'a self, req: QuoteRequest) -> QuoteFuture<'a>;
}
