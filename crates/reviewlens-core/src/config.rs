use crate::app_config::{AppConfig, Environment};
use crate::provider::{parse_provider_order, ProviderKind};
use crate::ConfigError;

const MAX_DERIVED_DEADLINE_SECS: u64 = 180;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if values are present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Provider credentials are all optional: a missing key disables that
/// collaborator at call time instead of failing startup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let secret = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("REVIEWLENS_ENV", "development"))?;

    let bind_addr = or_default("REVIEWLENS_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("REVIEWLENS_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("REVIEWLENS_LOG_LEVEL", "info");

    let google_maps_api_key = secret("GOOGLE_MAPS_API_KEY");
    let outscraper_api_key = secret("OUTSCRAPER_API_KEY");
    let serpapi_key = secret("SERPAPI_KEY");
    let openai_api_key = secret("OPENAI_API_KEY");
    let openai_model = or_default("REVIEWLENS_OPENAI_MODEL", "gpt-4o-mini");

    let provider_order = match lookup("REVIEWLENS_PROVIDER_ORDER") {
        Ok(raw) => parse_provider_order(&raw)
            .map_err(|reason| invalid("REVIEWLENS_PROVIDER_ORDER", reason))?,
        Err(_) => ProviderKind::DEFAULT_ORDER.to_vec(),
    };

    let http_timeout_secs = parse_u64("REVIEWLENS_HTTP_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("REVIEWLENS_USER_AGENT", "reviewlens/0.1 (review-retrieval)");

    let retry_max_attempts = parse_u32("REVIEWLENS_RETRY_MAX_ATTEMPTS", "4")?;
    if retry_max_attempts == 0 {
        return Err(invalid(
            "REVIEWLENS_RETRY_MAX_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let retry_base_delay_ms = parse_u64("REVIEWLENS_RETRY_BASE_DELAY_MS", "400")?;
    let retry_max_jitter_ms = parse_u64("REVIEWLENS_RETRY_MAX_JITTER_MS", "150")?;

    let poll_interval_ms = parse_u64("REVIEWLENS_POLL_INTERVAL_MS", "1500")?;
    if poll_interval_ms == 0 {
        return Err(invalid(
            "REVIEWLENS_POLL_INTERVAL_MS",
            "must be greater than zero".to_string(),
        ));
    }
    let poll_budget_secs = parse_u64("REVIEWLENS_POLL_BUDGET_SECS", "60")?;

    let derived_deadline = poll_budget_secs
        .saturating_mul(provider_order.len() as u64)
        .min(MAX_DERIVED_DEADLINE_SECS);
    let request_deadline_secs = parse_u64(
        "REVIEWLENS_REQUEST_DEADLINE_SECS",
        &derived_deadline.to_string(),
    )?;

    let max_reviews = parse_usize("REVIEWLENS_MAX_REVIEWS", "250")?;
    if max_reviews == 0 {
        return Err(invalid(
            "REVIEWLENS_MAX_REVIEWS",
            "must be at least 1".to_string(),
        ));
    }
    let reviews_per_request = parse_u32("REVIEWLENS_REVIEWS_PER_REQUEST", "120")?;

    let api_keys = parse_key_list(&or_default("REVIEWLENS_API_KEYS", ""));
    let rate_limit_per_minute = parse_usize("REVIEWLENS_RATE_LIMIT_PER_MINUTE", "120")?;
    if rate_limit_per_minute == 0 {
        return Err(invalid(
            "REVIEWLENS_RATE_LIMIT_PER_MINUTE",
            "must be at least 1".to_string(),
        ));
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        google_maps_api_key,
        outscraper_api_key,
        serpapi_key,
        openai_api_key,
        openai_model,
        provider_order,
        http_timeout_secs,
        user_agent,
        retry_max_attempts,
        retry_base_delay_ms,
        retry_max_jitter_ms,
        poll_interval_ms,
        poll_budget_secs,
        request_deadline_secs,
        max_reviews,
        reviews_per_request,
        api_keys,
        rate_limit_per_minute,
    })
}

/// Comma-separated tokens, trimmed, blanks and duplicates dropped.
fn parse_key_list(raw: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "REVIEWLENS_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
