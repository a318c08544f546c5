//! Test helpers for the Stripe API

use super::client::{Client, ClientConfig};
use super::retry::RetryConfig;
use std::time::Duration;

pub const TEST_API_KEY: &str = "sk_test_123";

pub fn create_test_client(url: &str) -> Client {
    create_test_client_with_retry(url, fast_retry(Some(0)))
}

pub fn create_test_client_with_retry(url: &str, retry: RetryConfig) -> Client {
    let mut config = ClientConfig::new(TEST_API_KEY);
    config.api_base = url.to_string();
    config.retry = retry;
    config.timeout = Duration::from_secs(5);
    Client::new(config).unwrap()
}

/// Millisecond backoff so retry paths run against a real mock server
pub fn fast_retry(max_retries: Option<u32>) -> RetryConfig {
    RetryConfig {
        initial_backoff: Duration::from_millis(5),
        max_backoff: Some(Duration::from_millis(20)),
        max_retries,
    }
}
