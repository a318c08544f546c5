use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tfplug::Context;
use url::Url;

use super::error::ApiError;
use super::form::FormParams;
use super::retry::{retry_with_backoff, RetryConfig};

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";
pub const STRIPE_API_VERSION: &str = "2024-04-10";

/// Stripe API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry_config: RetryConfig,
}

#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub api_base: String,
    pub retry: RetryConfig,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            retry: RetryConfig::default(),
            timeout: Duration::from_secs(80),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        if config.api_key.is_empty() {
            return Err(ApiError::InvalidConfig("api_key must not be empty".to_string()));
        }

        let base = Url::parse(&config.api_base).map_err(|e| {
            ApiError::InvalidConfig(format!("invalid api_base '{}': {}", config.api_base, e))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ApiError::InvalidConfig(format!(
                "api_base must be an http(s) URL, got '{}'",
                config.api_base
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert("Stripe-Version", HeaderValue::from_static(STRIPE_API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!(
                "terraform-provider-stripe/",
                env!("CARGO_PKG_VERSION")
            )),
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: config.api_base.trim_end_matches('/').to_string(),
                api_key: config.api_key,
                retry_config: config.retry,
            }),
        })
    }

    /// GET with params as query string
    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        params: &FormParams,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(ctx, Method::GET, path, params).await
    }

    /// POST with params as form body
    pub async fn post<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        params: &FormParams,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(ctx, Method::POST, path, params).await
    }

    /// DELETE with params as query string
    pub async fn delete<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        path: &str,
        params: &FormParams,
    ) -> Result<T, ApiError> {
        self.execute_with_retry(ctx, Method::DELETE, path, params).await
    }

    async fn execute_with_retry<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        method: Method,
        path: &str,
        params: &FormParams,
    ) -> Result<T, ApiError> {
        retry_with_backoff(ctx, &self.inner.retry_config, || {
            self.execute(method.clone(), path, params)
        })
        .await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &FormParams,
    ) -> Result<T, ApiError> {
        let mut url = format!("{}{}", self.inner.base_url, path);
        if method != Method::POST {
            url.push_str(&params.to_query_string());
        }

        tracing::debug!("{} request to: {}", method, url);

        let mut request = self
            .inner
            .http_client
            .request(method.clone(), &url)
            .basic_auth(&self.inner.api_key, None::<&str>);
        if method == Method::POST {
            request = request
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(params.encode());
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            self.parse_success_response(response).await
        } else {
            self.handle_error_response(response).await
        }
    }

    async fn parse_success_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        tracing::trace!("API response body: {}", text);

        serde_json::from_str::<T>(&text).map_err(|e| {
            tracing::error!("Failed to deserialize response: {}", e);
            ApiError::Parse(format!("Failed to parse response: {}", e))
        })
    }

    async fn handle_error_response<T>(&self, response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let error = ApiError::from_response(status, &text);
        if error.is_rate_limited() {
            tracing::warn!("Stripe rate limit hit (HTTP {})", status);
        } else {
            tracing::debug!("API error response: {}", error);
        }
        Err(error)
    }

    pub fn products(&self) -> super::products::ProductsApi<'_> {
        super::products::ProductsApi::new(self)
    }

    pub fn prices(&self) -> super::prices::PricesApi<'_> {
        super::prices::PricesApi::new(self)
    }

    pub fn customers(&self) -> super::customers::CustomersApi<'_> {
        super::customers::CustomersApi::new(self)
    }

    pub fn coupons(&self) -> super::coupons::CouponsApi<'_> {
        super::coupons::CouponsApi::new(self)
    }

    pub fn promotion_codes(&self) -> super::promotion_codes::PromotionCodesApi<'_> {
        super::promotion_codes::PromotionCodesApi::new(self)
    }

    pub fn tax_rates(&self) -> super::tax_rates::TaxRatesApi<'_> {
        super::tax_rates::TaxRatesApi::new(self)
    }

    pub fn shipping_rates(&self) -> super::shipping_rates::ShippingRatesApi<'_> {
        super::shipping_rates::ShippingRatesApi::new(self)
    }

    pub fn webhook_endpoints(&self) -> super::webhook_endpoints::WebhookEndpointsApi<'_> {
        super::webhook_endpoints::WebhookEndpointsApi::new(self)
    }

    pub fn billing_meters(&self) -> super::billing_meters::BillingMetersApi<'_> {
        super::billing_meters::BillingMetersApi::new(self)
    }

    pub fn entitlements(&self) -> super::entitlements::EntitlementsApi<'_> {
        super::entitlements::EntitlementsApi::new(self)
    }

    pub fn payment_links(&self) -> super::payment_links::PaymentLinksApi<'_> {
        super::payment_links::PaymentLinksApi::new(self)
    }

    pub fn billing_portal(&self) -> super::billing_portal::BillingPortalApi<'_> {
        super::billing_portal::BillingPortalApi::new(self)
    }

    pub fn balance(&self) -> super::balance::BalanceApi<'_> {
        super::balance::BalanceApi::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, create_test_client_with_retry, fast_retry};
    use mockito::{Matcher, Server};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Echo {
        id: String,
    }

    #[tokio::test]
    async fn sends_auth_version_and_form_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/products")
            // base64("sk_test_123:")
            .match_header("authorization", "Basic c2tfdGVzdF8xMjM6")
            .match_header("stripe-version", STRIPE_API_VERSION)
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("name".into(), "Gold".into()),
                Matcher::UrlEncoded("metadata[tier]".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":"prod_1"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let params = FormParams::new().add("name", "Gold").add("metadata[tier]", 1);
        let echo: Echo = client
            .post(&Context::new(), "/v1/products", &params)
            .await
            .unwrap();

        assert_eq!(echo.id, "prod_1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn get_sends_query_string() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/customers/cus_1")
            .match_query(Matcher::UrlEncoded("expand[]".into(), "tax".into()))
            .with_body(r#"{"id":"cus_1"}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let echo: Echo = client
            .get(
                &Context::new(),
                "/v1/customers/cus_1",
                &FormParams::new().expand("tax"),
            )
            .await
            .unwrap();

        assert_eq!(echo.id, "cus_1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_body_becomes_stripe_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/v1/coupons/GONE")
            .with_status(404)
            .with_body(r#"{"error":{"type":"invalid_request_error","code":"resource_missing","message":"No such coupon: 'GONE'","param":"coupon"}}"#)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client
            .delete::<Echo>(&Context::new(), "/v1/coupons/GONE", &FormParams::new())
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(err.to_string().contains("No such coupon"));
    }

    #[tokio::test]
    async fn rate_limited_request_is_retried() {
        let mut server = Server::new_async().await;
        // mockito serves the first mock still short of its expected hits
        let limited = server
            .mock("GET", "/v1/balance")
            .with_status(429)
            .with_body(r#"{"error":{"type":"invalid_request_error","code":"rate_limit","message":"Too many requests"}}"#)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/v1/balance")
            .with_body(r#"{"id":"balance"}"#)
            .expect(1)
            .create_async()
            .await;

        let client = create_test_client_with_retry(&server.url(), fast_retry(None));
        let echo: Echo = client
            .get(&Context::new(), "/v1/balance", &FormParams::new())
            .await
            .unwrap();

        assert_eq!(echo.id, "balance");
        limited.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn exhausted_retries_surface_rate_limit() {
        let mut server = Server::new_async().await;
        let limited = server
            .mock("GET", "/v1/balance")
            .with_status(429)
            .with_body("")
            .expect(3)
            .create_async()
            .await;

        let client = create_test_client_with_retry(&server.url(), fast_retry(Some(2)));
        let err = client
            .get::<Echo>(&Context::new(), "/v1/balance", &FormParams::new())
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        limited.assert_async().await;
    }

    #[tokio::test]
    async fn unparseable_success_body_is_parse_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/products/prod_1")
            .with_body("not json")
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let err = client
            .get::<Echo>(&Context::new(), "/v1/products/prod_1", &FormParams::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn rejects_invalid_configuration() {
        let mut config = ClientConfig::new("sk_test_123");
        config.api_base = "not a url".to_string();
        assert!(matches!(Client::new(config), Err(ApiError::InvalidConfig(_))));

        assert!(matches!(
            Client::new(ClientConfig::new("")),
            Err(ApiError::InvalidConfig(_))
        ));

        let debug = format!("{:?}", ClientConfig::new("sk_live_secret"));
        assert!(!debug.contains("sk_live_secret"));
    }
}
