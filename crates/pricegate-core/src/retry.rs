//! Rate-limit retry with backoff.
//!
//! Only an explicit `429` is retried. Any other failure is surfaced on the
//! first attempt.

use std::time::Duration;

use tracing::debug;

use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};

/// Delay strategy between rate-limited attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `base * attempt`, where `attempt` counts from 1.
    Linear { base: Duration },
    /// `base * factor ^ (attempt - 1)`, capped at `max`, optionally with
    /// +/- 50% jitter.
    Exponential {
        base: Duration,
        factor: f64,
        max: Duration,
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear {
            base: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay(self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        match self {
            Self::Linear { base } => base.saturating_mul(attempt),
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt as i32 - 1);
                let seconds = (base.as_secs_f64() * scale).min(max.as_secs_f64());
                let mut delay = Duration::from_secs_f64(seconds);

                if jitter {
                    let jitter_ms = (delay.as_millis() as f64 * 0.5) as u64;
                    let offset = fastrand::u64(0..=(jitter_ms * 2));
                    let total_ms = delay.as_millis() as i64 + (offset as i64 - jitter_ms as i64);
                    delay = Duration::from_millis(total_ms.max(0) as u64);
                }

                delay
            }
        }
    }
}

/// Retry budget for a single outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    pub fn linear(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Linear { base },
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Run `request` through `client`, sleeping between rate-limited attempts.
    ///
    /// Returns the first 2xx response. Transport errors and non-2xx statuses
    /// other than `429` fail immediately with `TransportFailure`; running out
    /// of attempts on `429` fails with `RateLimited`.
    pub async fn execute(
        &self,
        client: &dyn HttpClient,
        request: HttpRequest,
    ) -> Result<HttpResponse, SourceError> {
        let max_attempts = self.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let response = client.execute(request.clone()).await.map_err(|error| {
                if error.timed_out() {
                    SourceError::transport(format!(
                        "{} timed out after {} ms: {}",
                        request.url,
                        request.timeout_ms,
                        error.message()
                    ))
                } else {
                    SourceError::transport(format!("{}: {}", request.url, error.message()))
                }
            })?;

            if response.is_rate_limited() {
                if attempt < max_attempts {
                    let delay = self.backoff.delay(attempt);
                    debug!(url = %request.url, attempt, delay_ms = delay.as_millis() as u64, "rate limited, backing off");
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            if !response.is_success() {
                return Err(SourceError::transport(format!(
                    "{} returned status {}",
                    request.url, response.status
                )));
            }

            return Ok(response);
        }

        Err(SourceError::rate_limited(format!(
            "{} still rate limited after {max_attempts} attempt(s)",
            request.url
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::{HttpError, ScriptedHttpClient};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::linear(3, Duration::from_millis(1))
    }

    #[test]
    fn linear_backoff_grows_with_attempt_number() {
        let backoff = Backoff::Linear {
            base: Duration::from_millis(500),
        };

        assert_eq!(backoff.delay(1), Duration::from_millis(500));
        assert_eq!(backoff.delay(2), Duration::from_millis(1000));
        assert_eq!(backoff.delay(3), Duration::from_millis(1500));
    }

    #[test]
    fn exponential_backoff_is_capped() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_millis(300),
            jitter: false,
        };

        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(300));
    }

    #[test]
    fn jitter_stays_within_half_of_the_delay() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(200),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };

        for _ in 0..50 {
            let ms = backoff.delay(2).as_millis();
            assert!((200..=600).contains(&ms), "delay {ms}ms out of range");
        }
    }

    #[tokio::test]
    async fn retries_after_rate_limit_then_succeeds() {
        let client = ScriptedHttpClient::new().on_sequence(
            "https://p.test/",
            vec![
                Ok(HttpResponse::new(429, "")),
                Ok(HttpResponse::ok_json("{}")),
            ],
        );

        let response = fast_policy()
            .execute(&client, HttpRequest::get("https://p.test/q"))
            .await
            .expect("second attempt succeeds");

        assert_eq!(response.status, 200);
        assert_eq!(client.call_count("https://p.test/"), 2);
    }

    #[tokio::test]
    async fn exhausted_budget_is_rate_limited() {
        let client = ScriptedHttpClient::new().on("https://p.test/", Ok(HttpResponse::new(429, "")));

        let error = fast_policy()
            .execute(&client, HttpRequest::get("https://p.test/q"))
            .await
            .expect_err("always throttled");

        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        assert_eq!(client.call_count("https://p.test/"), 3);
    }

    #[tokio::test]
    async fn other_statuses_are_not_retried() {
        let client = ScriptedHttpClient::new().on("https://p.test/", Ok(HttpResponse::new(503, "")));

        let error = fast_policy()
            .execute(&client, HttpRequest::get("https://p.test/q"))
            .await
            .expect_err("503 fails");

        assert_eq!(error.kind(), SourceErrorKind::TransportFailure);
        assert!(error.message().contains("503"));
        assert_eq!(client.call_count("https://p.test/"), 1);
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        let client =
            ScriptedHttpClient::new().on("https://p.test/", Err(HttpError::timeout("timed out")));

        let error = fast_policy()
            .execute(&client, HttpRequest::get("https://p.test/q"))
            .await
            .expect_err("timeout fails");

        assert_eq!(error.kind(), SourceErrorKind::TransportFailure);
        assert!(error.message().contains("timed out after 10000 ms"));
        assert_eq!(client.call_count("https://p.test/"), 1);
    }
}
