//! Shared request plumbing for the synchronous protocol.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::error::ProviderError;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Builds the `reqwest::Client` every adapter uses.
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if the client cannot be constructed.
pub fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()
        .map_err(|e| ProviderError::http("http_client", e))
}

/// Sends the request produced by `build` and decodes a JSON body, retrying
/// transient failures under `policy`.
///
/// `build` is called once per attempt because `RequestBuilder` is consumed
/// by `send`.
///
/// # Errors
///
/// - [`ProviderError::RateLimited`] — HTTP 429 after all attempts.
/// - [`ProviderError::UnexpectedStatus`] — any other non-2xx status.
/// - [`ProviderError::Http`] — transport failure after all attempts.
/// - [`ProviderError::Deserialize`] — 2xx body that is not JSON.
pub async fn send_json<F>(
    policy: &RetryPolicy,
    provider: &'static str,
    build: F,
) -> Result<Value, ProviderError>
where
    F: Fn() -> RequestBuilder,
{
    retry_with_backoff(policy, provider, || {
        let request = build();
        async move {
            let response = request
                .send()
                .await
                .map_err(|e| ProviderError::http(provider, e))?;
            let body = success_body(provider, response).await?;
            parse_json(provider, &body)
        }
    })
    .await
}

/// Reads the body of a 2xx response, mapping every other status to a typed
/// error that carries a truncated copy of the body.
pub(crate) async fn success_body(
    provider: &'static str,
    response: Response,
) -> Result<String, ProviderError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ProviderError::RateLimited { provider });
    }
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::http(provider, e))?;
    if !status.is_success() {
        return Err(ProviderError::status(provider, status.as_u16(), &body));
    }
    Ok(body)
}

pub(crate) fn parse_json(provider: &'static str, body: &str) -> Result<Value, ProviderError> {
    serde_json::from_str(body).map_err(|source| ProviderError::Deserialize {
        context: format!("{provider} response"),
        source,
    })
}
