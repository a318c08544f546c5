pub mod balance;
pub mod billing_meters;
pub mod billing_portal;
pub mod client;
pub mod common;
pub mod coupons;
pub mod customers;
pub mod entitlements;
pub mod error;
pub mod form;
pub mod payment_links;
pub mod prices;
pub mod products;
pub mod promotion_codes;
pub mod retry;
pub mod shipping_rates;
pub mod tax_rates;
pub mod webhook_endpoints;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, ClientConfig, DEFAULT_API_BASE, STRIPE_API_VERSION};
pub use common::{Deleted, Metadata};
pub use error::ApiError;
pub use form::FormParams;
pub use retry::{retry_with_backoff, RetryConfig, Retryable};
