use thiserror::Error;

use crate::resolver::ResolveFailure;

/// Validation errors raised at the engine boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },

    #[error("invalid provider '{value}', expected one of yahoo_chart, stooq, coingecko")]
    InvalidProvider { value: String },
    #[error("invalid relay '{value}'")]
    InvalidRelay { value: String },

    #[error("invalid url '{value}'")]
    InvalidUrl { value: String },
    #[error("Only GET and POST are supported")]
    UnsupportedMethod { value: String },

    #[error("invalid value '{value}' for {name}")]
    InvalidConfig { name: &'static str, value: String },
}

/// Error returned by the fallback resolver.
#[derive(Debug, Error, Clone)]
pub enum ResolveError {
    #[error(transparent)]
    InvalidSymbol(#[from] ValidationError),

    #[error("all providers failed for '{}' ({})", .0.raw_symbol, .0.asset_class)]
    AllProvidersFailed(ResolveFailure),
}

impl ResolveError {
    pub fn failure(&self) -> Option<&ResolveFailure> {
        match self {
            Self::AllProvidersFailed(failure) => Some(failure),
            Self::InvalidSymbol(_) => None,
        }
    }
}
