//! # Pricegate Core
//!
//! Quote resolution engine: turns a human-supplied instrument symbol into a
//! normalized price (and recent daily history when available) by walking an
//! ordered chain of unreliable, rate-limited public quote providers.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo chart, Stooq and CoinGecko providers |
//! | [`analytics`] | Close-series summary (change, volatility, risk bucket) |
//! | [`cache`] | LRU response cache keyed by final outbound URL |
//! | [`config`] | Engine configuration and `PRICEGATE_*` variables |
//! | [`data_source`] | Provider trait and failure taxonomy |
//! | [`domain`] | Symbol, asset class, quote and history models |
//! | [`engine`] | Wired engine used by the server |
//! | [`error`] | Validation and resolution errors |
//! | [`forward`] | Allow-listed request forwarding |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`relay`] | Relay wrapping and primary/fallback rotation |
//! | [`resolver`] | Ordered provider fallback |
//! | [`retry`] | Rate-limit retry with backoff |
//! | [`source`] | Provider identifiers |
//! | [`symbol_map`] | Per-provider symbol spelling |
//!
//! ## Architecture
//!
//! ```text
//! raw symbol
//!     │
//!     ▼
//! ┌──────────────────┐   classify + translate
//! │ FallbackResolver │──────────────────────────┐
//! └────────┬─────────┘                          │
//!          │ first success wins                 ▼
//!          ▼                           ┌─────────────────┐
//! ┌──────────────────┐                 │ QuoteProvider   │
//! │ RelayRotator     │◀────────────────│ yahoo/stooq/cg  │
//! └────────┬─────────┘                 └─────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐     ┌──────────────────┐
//! │ ResponseCache    │────▶│ RetryPolicy +    │
//! │ (by final URL)   │     │ HttpClient       │
//! └──────────────────┘     └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pricegate_core::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::from_env()?);
//! let resolution = engine.resolve("^GSPC").await?;
//! println!("{} via {}", resolution.quote.price.unwrap_or_default(), resolution.source());
//! ```

pub mod adapters;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod engine;
pub mod error;
pub mod forward;
pub mod http_client;
pub mod relay;
pub mod resolver;
pub mod retry;
pub mod source;
pub mod symbol_map;

pub use adapters::{CoingeckoAdapter, StooqAdapter, YahooChartAdapter};
pub use analytics::{close_points, HistoryPoint, PriceSummary, RiskLevel};
pub use cache::{CacheStats, ResponseCache};
pub use config::EngineConfig;
pub use data_source::{QuoteProvider, QuoteRequest, SourceError, SourceErrorKind};
pub use domain::{classify, AssetClass, PriceHistory, Quote, Symbol};
pub use engine::Engine;
pub use error::{ResolveError, ValidationError};
pub use forward::{AllowList, ForwardPayload, ForwardRequest, ForwardResponse, Forwarder};
pub use http_client::{HttpClient, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use relay::{Relay, RelayRotator};
pub use resolver::{FallbackAttempt, FallbackResolver, ProviderChains, Resolution, ResolveFailure};
pub use retry::{Backoff, RetryPolicy};
pub use source::ProviderId;
pub use symbol_map::translate;
