//! Submit-then-poll support for providers that answer with a
//! `results_location` handle instead of inline data.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tokio::time::Instant;

use crate::error::ProviderError;

/// Fixed-interval polling schedule with a wall-clock budget.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub budget: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1_500),
            budget: Duration::from_secs(60),
        }
    }
}

impl PollConfig {
    #[must_use]
    pub fn from_config(config: &reviewlens_core::AppConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            budget: config.poll_budget(),
        }
    }
}

/// What a single poll body says about the job.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStatus {
    Pending,
    Ready(Value),
    Failed(String),
}

/// Classifies a 2xx poll body.
///
/// Ready when the body is a JSON array or an object whose `status` is
/// `success` (any case). A `status` of `error` or `failed` ends the job.
/// Anything else, including bodies that are not JSON, is still pending.
#[must_use]
pub fn classify_poll_body(body: &str) -> PollStatus {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return PollStatus::Pending;
    };
    if value.is_array() {
        return PollStatus::Ready(value);
    }
    let status = value
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase);
    match status.as_deref() {
        Some("success") => PollStatus::Ready(value),
        Some("error" | "failed") => PollStatus::Failed(failure_message(&value)),
        _ => PollStatus::Pending,
    }
}

fn failure_message(value: &Value) -> String {
    ["error", "message", "errorMessage"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or("job reported a failed status")
        .to_owned()
}

/// Polls the request produced by `build` until the job is ready, fails, or
/// `config.budget` runs out.
///
/// HTTP 429, 5xx, transport errors and unparseable bodies count as "not
/// ready yet". Other non-2xx statuses fail immediately.
///
/// # Errors
///
/// - [`ProviderError::Timeout`] once the budget is spent.
/// - [`ProviderError::Api`] when the job reports `error` / `failed`.
/// - [`ProviderError::UnexpectedStatus`] for a non-retriable 4xx.
pub async fn poll_until_ready<F>(
    provider: &'static str,
    config: PollConfig,
    build: F,
) -> Result<Value, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    let started = Instant::now();
    let mut polls = 0u32;

    loop {
        let Some(remaining) = config.budget.checked_sub(started.elapsed()) else {
            return Err(timeout(provider, started));
        };
        polls += 1;

        let exchange = async {
            let response = build().send().await?;
            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        match tokio::time::timeout(remaining, exchange).await {
            Err(_) => return Err(timeout(provider, started)),
            Ok(Err(e)) => {
                tracing::debug!(provider, polls, error = %e.without_url(), "poll request failed; will retry");
            }
            Ok(Ok((status, body))) => {
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    tracing::debug!(provider, polls, status = status.as_u16(), "poll not ready");
                } else if !status.is_success() {
                    return Err(ProviderError::status(provider, status.as_u16(), &body));
                } else {
                    match classify_poll_body(&body) {
                        PollStatus::Ready(value) => {
                            tracing::debug!(provider, polls, "poll results ready");
                            return Ok(value);
                        }
                        PollStatus::Failed(message) => {
                            return Err(ProviderError::Api { provider, message });
                        }
                        PollStatus::Pending => {}
                    }
                }
            }
        }

        let Some(remaining) = config.budget.checked_sub(started.elapsed()) else {
            return Err(timeout(provider, started));
        };
        tokio::time::sleep(config.interval.min(remaining)).await;
    }
}

fn timeout(provider: &'static str, started: Instant) -> ProviderError {
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::warn!(provider, elapsed_ms, "polling budget exhausted");
    ProviderError::Timeout {
        provider,
        elapsed_ms,
    }
}
