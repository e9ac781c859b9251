//! Allow-listed request forwarding.
//!
//! Forwarded calls go straight to the target: no relay, no retry and no
//! cache, since a POST is not idempotent and the caller owns the semantics.

use std::collections::BTreeSet;
use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpMethod, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::ValidationError;

/// Hosts the forwarding endpoint may reach out of the box.
pub const DEFAULT_ALLOWED_HOSTS: [&str; 7] = [
    "query1.finance.yahoo.com",
    "query2.finance.yahoo.com",
    "stooq.com",
    "api.coingecko.com",
    "symbol-search.tradingview.com",
    "www.alphavantage.co",
    "finnhub.io",
];

/// Case-insensitive set of permitted hostnames. Ports are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    hosts: BTreeSet<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS)
    }
}

impl AllowList {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(|host| host.as_ref().trim().to_ascii_lowercase())
            .filter(|host| !host.is_empty())
            .collect();
        Self { hosts }
    }

    pub fn allows(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }
}

/// Lower-cased hostname of `url`, without port.
pub fn host_of(url: &str) -> Result<String, ValidationError> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_ascii_lowercase))
        .ok_or_else(|| ValidationError::InvalidUrl {
            value: url.to_owned(),
        })
}

/// A validated forwarding request.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRequest {
    url: String,
    host: String,
    method: HttpMethod,
    body: Option<Value>,
}

impl ForwardRequest {
    /// Validate the target URL and method. `method` is case-insensitive and
    /// only `GET`/`POST` are accepted.
    pub fn new(url: &str, method: &str, body: Option<Value>) -> Result<Self, ValidationError> {
        let method = method.parse::<HttpMethod>()?;
        let host = host_of(url)?;
        Ok(Self {
            url: url.to_owned(),
            host,
            method,
            body,
        })
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }
}

/// Raw upstream answer, any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// What the caller sees: JSON passed through verbatim, anything else wrapped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForwardPayload {
    Json(Value),
    Raw { status_code: u16, content: String },
}

impl ForwardResponse {
    pub fn into_payload(self) -> ForwardPayload {
        let is_json = self
            .content_type
            .as_deref()
            .is_some_and(|value| value.to_ascii_lowercase().contains("application/json"));

        if is_json {
            if let Ok(value) = serde_json::from_str(&self.body) {
                return ForwardPayload::Json(value);
            }
        }

        ForwardPayload::Raw {
            status_code: self.status,
            content: self.body,
        }
    }
}

pub struct Forwarder {
    http: Arc<dyn HttpClient>,
    allow_list: AllowList,
    timeout_ms: u64,
}

impl Forwarder {
    pub fn new(http: Arc<dyn HttpClient>, allow_list: AllowList) -> Self {
        Self {
            http,
            allow_list,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Forward `request` if its host is allowed.
    ///
    /// Upstream non-2xx statuses are returned as-is; only transport errors
    /// and disallowed hosts are errors.
    pub async fn forward(&self, request: ForwardRequest) -> Result<ForwardResponse, SourceError> {
        if !self.allow_list.allows(&request.host) {
            warn!(host = %request.host, "forwarding refused");
            return Err(SourceError::domain_not_allowed(&request.host));
        }

        debug!(method = request.method.as_str(), url = %request.url, "forwarding");

        let mut outbound =
            HttpRequest::new(request.method, request.url).with_timeout_ms(self.timeout_ms);
        if let (HttpMethod::Post, Some(body)) = (request.method, request.body) {
            outbound = outbound
                .with_header("content-type", "application/json")
                .with_body(body.to_string());
        }

        let response = self
            .http
            .execute(outbound)
            .await
            .map_err(|e| SourceError::transport(e.message().to_owned()))?;

        Ok(ForwardResponse {
            status: response.status,
            content_type: response.content_type,
            body: response.body,
        })
    }
}
