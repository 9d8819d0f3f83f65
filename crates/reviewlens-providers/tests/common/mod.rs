//! Shared fixtures for the adapter integration tests.

#![allow(dead_code)]

use std::time::Duration;

use reqwest::Client;
use reviewlens_providers::{http::build_client, AdapterSettings, PollConfig, RetryPolicy};

pub const TEST_KEY: &str = "test-key";

pub fn client() -> Client {
    build_client(5, "reviewlens-test/0.1").expect("failed to build test client")
}

/// No retries, fast polling.
pub fn settings() -> AdapterSettings {
    AdapterSettings {
        retry: RetryPolicy::no_retry(),
        poll: PollConfig {
            interval: Duration::from_millis(20),
            budget: Duration::from_secs(2),
        },
        reviews_limit: 120,
    }
}

pub fn settings_with(retry: RetryPolicy, poll: PollConfig) -> AdapterSettings {
    AdapterSettings {
        retry,
        poll,
        reviews_limit: 120,
    }
}
