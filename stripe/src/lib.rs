//! Terraform provider for Stripe
//!
//! [`StripeProvider`] reads its configuration (block first, then `STRIPE_*`
//! environment variables), builds the API client and hands it to every
//! resource and data source through [`provider_data::StripeProviderData`].

pub mod api;
pub mod convert;
pub mod data_sources;
pub mod diagnostics;
pub mod metadata;
pub mod provider_data;
pub mod resource_data;
pub mod resources;

use api::{Client, ClientConfig, RetryConfig};
use async_trait::async_trait;
use provider_data::StripeProviderData;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tfplug::context::Context;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, ProviderMetadataRequest,
    ProviderMetadataResponse, ProviderSchemaRequest, ProviderSchemaResponse,
};
use tfplug::validator::{validate_config, NumberRange};
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, DataSourceFactory, Diagnostic, Dynamic,
    DynamicValue, Provider, ResourceFactory, Schema, SchemaBuilder,
};

pub const ENV_API_KEY: &str = "STRIPE_API_KEY";
pub const ENV_API_BASE: &str = "STRIPE_API_BASE";
pub const ENV_MAX_RETRIES: &str = "STRIPE_MAX_RETRIES";
pub const ENV_INITIAL_BACKOFF_MS: &str = "STRIPE_INITIAL_BACKOFF_MS";
pub const ENV_MAX_BACKOFF_MS: &str = "STRIPE_MAX_BACKOFF_MS";
pub const ENV_TIMEOUT_SECONDS: &str = "STRIPE_TIMEOUT_SECONDS";

#[derive(Default)]
pub struct StripeProvider {
    provider_data: Option<Arc<StripeProviderData>>,
}

impl StripeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.provider_data.is_some()
    }

    fn schema_static() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manage Stripe objects")
            .attribute(
                AttributeBuilder::new("api_key", AttributeType::String)
                    .description("Stripe secret key; defaults to STRIPE_API_KEY")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_base", AttributeType::String)
                    .description("API base URL; defaults to STRIPE_API_BASE, then https://api.stripe.com")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("max_retries", AttributeType::Number)
                    .description("Rate-limit retries before giving up; unlimited when unset")
                    .optional()
                    .validator(NumberRange::at_least(0.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("initial_backoff_ms", AttributeType::Number)
                    .description("First rate-limit backoff in milliseconds, doubled on every retry")
                    .optional()
                    .validator(NumberRange::at_least(1.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("max_backoff_ms", AttributeType::Number)
                    .description("Cap on a single backoff in milliseconds; uncapped when unset")
                    .optional()
                    .validator(NumberRange::at_least(1.0))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("timeout_seconds", AttributeType::Number)
                    .description("Per-request HTTP timeout")
                    .optional()
                    .validator(NumberRange::at_least(1.0))
                    .build(),
            )
            .build()
    }
}

/// Config attribute when set and non-empty, else the environment variable
fn config_string(config: &DynamicValue, name: &str, env: &str) -> Option<String> {
    config
        .get_string(&AttributePath::new(name))
        .ok()
        .filter(|s| !s.is_empty())
        .or_else(|| std::env::var(env).ok().filter(|s| !s.is_empty()))
}

/// Integer setting of at least `min`; anything else is reported on `name`
fn config_u64(
    config: &DynamicValue,
    name: &str,
    env: &str,
    min: u64,
) -> Result<Option<u64>, Diagnostic> {
    let invalid = |value: String| {
        Diagnostic::error(
            format!("Invalid {}", name),
            format!("expected an integer of at least {}, got {}", min, value),
        )
        .with_attribute(AttributePath::new(name))
    };

    if let Ok(Dynamic::Number(n)) = config.get(&AttributePath::new(name)) {
        if *n < min as f64 || n.fract() != 0.0 {
            return Err(invalid(n.to_string()));
        }
        return Ok(Some(*n as u64));
    }

    match std::env::var(env) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse::<u64>() {
            Ok(value) if value >= min => Ok(Some(value)),
            _ => Err(invalid(format!("{}={}", env, raw))),
        },
        _ => Ok(None),
    }
}

fn client_config(config: &DynamicValue) -> Result<ClientConfig, Vec<Diagnostic>> {
    let mut diagnostics = vec![];

    let api_key = config_string(config, "api_key", ENV_API_KEY);
    if api_key.is_none() {
        diagnostics.push(
            Diagnostic::error(
                "Missing API key",
                format!(
                    "set api_key in the provider block or the {} environment variable",
                    ENV_API_KEY
                ),
            )
            .with_attribute(AttributePath::new("api_key")),
        );
    }

    let mut numbers = HashMap::new();
    // a zero backoff would turn sustained throttling into a busy loop
    for (name, env, min) in [
        ("max_retries", ENV_MAX_RETRIES, 0),
        ("initial_backoff_ms", ENV_INITIAL_BACKOFF_MS, 1),
        ("max_backoff_ms", ENV_MAX_BACKOFF_MS, 1),
        ("timeout_seconds", ENV_TIMEOUT_SECONDS, 1),
    ] {
        match config_u64(config, name, env, min) {
            Ok(Some(value)) => {
                numbers.insert(name, value);
            }
            Ok(None) => {}
            Err(diag) => diagnostics.push(diag),
        }
    }

    let Some(api_key) = api_key.filter(|_| diagnostics.is_empty()) else {
        return Err(diagnostics);
    };

    let mut client_config = ClientConfig::new(api_key);
    if let Some(api_base) = config_string(config, "api_base", ENV_API_BASE) {
        client_config.api_base = api_base;
    }
    let defaults = RetryConfig::default();
    client_config.retry = RetryConfig {
        initial_backoff: numbers
            .get("initial_backoff_ms")
            .map_or(defaults.initial_backoff, |ms| Duration::from_millis(*ms)),
        max_backoff: numbers.get("max_backoff_ms").map(|ms| Duration::from_millis(*ms)),
        max_retries: numbers
            .get("max_retries")
            .map(|n| u32::try_from(*n).unwrap_or(u32::MAX)),
    };
    if let Some(seconds) = numbers.get("timeout_seconds") {
        client_config.timeout = Duration::from_secs(*seconds);
    }

    Ok(client_config)
}

#[async_trait]
impl Provider for StripeProvider {
    fn type_name(&self) -> &str {
        "stripe"
    }

    async fn metadata(
        &self,
        _ctx: Context,
        _request: ProviderMetadataRequest,
    ) -> ProviderMetadataResponse {
        ProviderMetadataResponse {
            type_name: "stripe".to_string(),
        }
    }

    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        ProviderSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        tfplug::logging::init_from_env();

        let mut response = ConfigureProviderResponse {
            diagnostics: validate_config(&Self::schema_static(), &request.config),
            provider_data: None,
        };
        if !response.diagnostics.is_empty() {
            return response;
        }

        let config = match client_config(&request.config) {
            Ok(config) => config,
            Err(diagnostics) => {
                response.diagnostics = diagnostics;
                return response;
            }
        };

        tracing::info!(
            "Configuring Stripe provider (api_base: {}, terraform {})",
            config.api_base,
            request.terraform_version
        );
        tracing::debug!("Client configuration: {:?}", config);

        match Client::new(config) {
            Ok(client) => {
                let data = Arc::new(StripeProviderData::new(client));
                response.provider_data = Some(data.clone());
                self.provider_data = Some(data);
            }
            Err(e) => response.diagnostics.push(
                Diagnostic::error("Failed to create Stripe client", e.to_string())
                    .with_attribute(AttributePath::new("api_base")),
            ),
        }

        response
    }

    fn resources(&self) -> HashMap<String, ResourceFactory> {
        use resources::*;

        [
            ("stripe_product", factory::<ProductResource>()),
            ("stripe_price", factory::<PriceResource>()),
            ("stripe_customer", factory::<CustomerResource>()),
            ("stripe_coupon", factory::<CouponResource>()),
            ("stripe_promotion_code", factory::<PromotionCodeResource>()),
            ("stripe_tax_rate", factory::<TaxRateResource>()),
            ("stripe_shipping_rate", factory::<ShippingRateResource>()),
            ("stripe_webhook_endpoint", factory::<WebhookEndpointResource>()),
            ("stripe_meter", factory::<MeterResource>()),
            ("stripe_entitlements_feature", factory::<EntitlementsFeatureResource>()),
            ("stripe_product_feature", factory::<ProductFeatureResource>()),
            ("stripe_payment_link", factory::<PaymentLinkResource>()),
            ("stripe_portal_configuration", factory::<PortalConfigurationResource>()),
        ]
        .into_iter()
        .map(|(name, factory)| (name.to_string(), factory))
        .collect()
    }

    fn data_sources(&self) -> HashMap<String, DataSourceFactory> {
        HashMap::from([(
            "stripe_balance".to_string(),
            data_sources::balance_factory(),
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tfplug::types::ClientCapabilities;

    const ALL_ENV: [&str; 6] = [
        ENV_API_KEY,
        ENV_API_BASE,
        ENV_MAX_RETRIES,
        ENV_INITIAL_BACKOFF_MS,
        ENV_MAX_BACKOFF_MS,
        ENV_TIMEOUT_SECONDS,
    ];

    fn clear_env() {
        for var in ALL_ENV {
            std::env::remove_var(var);
        }
    }

    fn request(pairs: Vec<(&str, Dynamic)>) -> ConfigureProviderRequest {
        ConfigureProviderRequest {
            terraform_version: "1.9.0".to_string(),
            config: DynamicValue::new(Dynamic::Map(
                pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            )),
            client_capabilities: ClientCapabilities::default(),
        }
    }

    #[tokio::test]
    #[serial]
    async fn configures_from_environment() {
        clear_env();
        std::env::set_var(ENV_API_KEY, "sk_test_env");
        std::env::set_var(ENV_API_BASE, "http://localhost:12111");

        let mut provider = StripeProvider::new();
        let response = provider.configure(Context::new(), request(vec![])).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        assert!(response.provider_data.is_some());
        assert!(provider.is_configured());
        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn missing_api_key_is_reported_on_attribute() {
        clear_env();

        let mut provider = StripeProvider::new();
        let response = provider.configure(Context::new(), request(vec![])).await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("api_key"))
        );
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    #[serial]
    async fn invalid_api_base_is_reported() {
        clear_env();

        let mut provider = StripeProvider::new();
        let response = provider
            .configure(
                Context::new(),
                request(vec![
                    ("api_key", "sk_test_123".into()),
                    ("api_base", "not a url".into()),
                ]),
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(response.diagnostics[0].summary, "Failed to create Stripe client");
        assert!(response.provider_data.is_none());
    }

    #[test]
    #[serial]
    fn config_block_wins_over_environment() {
        clear_env();
        std::env::set_var(ENV_API_KEY, "sk_test_env");
        std::env::set_var(ENV_MAX_RETRIES, "9");

        let config = request(vec![
            ("api_key", "sk_test_block".into()),
            ("max_retries", 2.0.into()),
            ("initial_backoff_ms", 250.0.into()),
        ])
        .config;
        let client_config = client_config(&config).unwrap();

        assert_eq!(client_config.api_key, "sk_test_block");
        assert_eq!(client_config.api_base, api::DEFAULT_API_BASE);
        assert_eq!(client_config.retry.max_retries, Some(2));
        assert_eq!(client_config.retry.initial_backoff, Duration::from_millis(250));
        assert_eq!(client_config.retry.max_backoff, None);
        assert_eq!(client_config.timeout, Duration::from_secs(80));
        clear_env();
    }

    #[test]
    #[serial]
    fn retries_are_unbounded_by_default() {
        clear_env();
        let config = request(vec![("api_key", "sk_test_123".into())]).config;
        let client_config = client_config(&config).unwrap();
        assert_eq!(client_config.retry, RetryConfig::default());
    }

    #[test]
    #[serial]
    fn malformed_numbers_are_rejected() {
        clear_env();
        std::env::set_var(ENV_TIMEOUT_SECONDS, "soon");

        let config = request(vec![
            ("api_key", "sk_test_123".into()),
            ("max_retries", (-1.0).into()),
        ])
        .config;
        let diags = client_config(&config).unwrap_err();

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].attribute, Some(AttributePath::new("max_retries")));
        assert_eq!(diags[1].attribute, Some(AttributePath::new("timeout_seconds")));
        clear_env();
    }

    #[test]
    #[serial]
    fn zero_backoff_is_rejected() {
        clear_env();
        std::env::set_var(ENV_INITIAL_BACKOFF_MS, "0");

        let config = request(vec![
            ("api_key", "sk_test_123".into()),
            ("max_backoff_ms", 0.0.into()),
            ("max_retries", 0.0.into()),
        ])
        .config;
        let diags = client_config(&config).unwrap_err();

        let attributes: Vec<_> = diags.iter().filter_map(|d| d.attribute.clone()).collect();
        assert_eq!(
            attributes,
            vec![
                AttributePath::new("initial_backoff_ms"),
                AttributePath::new("max_backoff_ms"),
            ]
        );
        clear_env();
    }

    #[tokio::test]
    #[serial]
    async fn zero_backoff_in_provider_block_fails_validation() {
        clear_env();
        let mut provider = StripeProvider::new();
        let response = provider
            .configure(
                Context::new(),
                request(vec![
                    ("api_key", "sk_test_123".into()),
                    ("initial_backoff_ms", 0.0.into()),
                ]),
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert_eq!(
            response.diagnostics[0].attribute,
            Some(AttributePath::new("initial_backoff_ms"))
        );
        assert!(response.provider_data.is_none());
    }

    #[test]
    fn registers_every_resource_and_data_source() {
        let provider = StripeProvider::new();
        let resources = provider.resources();

        assert_eq!(resources.len(), 13);
        for (name, factory) in &resources {
            assert_eq!(factory().type_name(), name);
        }
        assert!(provider.data_sources().contains_key("stripe_balance"));
    }
}
