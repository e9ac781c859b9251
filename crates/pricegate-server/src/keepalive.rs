//! Self-ping task that keeps an idle-suspending host awake.
//!
//! Waits a short initial delay, then GETs `{base}/health` on a fixed
//! interval. Failures are logged at debug level and otherwise ignored.

use std::sync::Arc;
use std::time::Duration;

use pricegate_core::{HttpClient, HttpRequest};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

pub const INITIAL_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

const PING_TIMEOUT_MS: u64 = 10_000;

pub struct KeepAlive {
    url: String,
    http: Arc<dyn HttpClient>,
    initial_delay: Duration,
    interval: Duration,
}

impl KeepAlive {
    /// Ping `{base_url}/health`.
    pub fn new(base_url: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            url: format!("{}/health", base_url.trim_end_matches('/')),
            http,
            initial_delay: INITIAL_DELAY,
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn spawn(self) -> KeepAliveHandle {
        let task = tokio::spawn(async move {
            info!(url = %self.url, interval_secs = self.interval.as_secs(), "keep-alive started");
            tokio::time::sleep(self.initial_delay).await;

            let mut ticker = tokio::time::interval(self.interval);
            // A ping that hangs must not be followed by a burst of catch-up pings.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.ping().await;
            }
        });

        KeepAliveHandle { task }
    }

    async fn ping(&self) {
        let request = HttpRequest::get(&self.url).with_timeout_ms(PING_TIMEOUT_MS);
        match self.http.execute(request).await {
            Ok(response) => debug!(status = response.status, "keep-alive ping"),
            Err(error) => debug!(error = %error, "keep-alive ping failed"),
        }
    }
}

/// Owns the spawned ping task.
#[derive(Debug)]
pub struct KeepAliveHandle {
    task: JoinHandle<()>,
}

impl KeepAliveHandle {
    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
