//! Drives the provider the way Terraform does: configure, look up factories,
//! plan with the resource schema, then apply against a mock Stripe API.

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use mockito::{Matcher, Server};
use std::collections::HashMap;
use stripe::StripeProvider;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, DataSource, DataSourceWithConfigure, ReadDataSourceRequest,
};
use tfplug::provider::ConfigureProviderRequest;
use tfplug::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, Resource, ResourceSchemaRequest,
    ResourceWithConfigure, ResourceWithImportState, UpdateResourceRequest,
};
use tfplug::types::ClientCapabilities;
use tfplug::{plan_resource_change, AttributePath, Dynamic, DynamicValue, Provider};

const PRODUCT: &str = r#"{
    "id": "prod_1",
    "object": "product",
    "name": "Gold",
    "active": true,
    "description": null,
    "images": [],
    "url": null,
    "statement_descriptor": null,
    "unit_label": "seat",
    "metadata": {"tier": "gold"}
}"#;

fn object(pairs: Vec<(&str, Dynamic)>) -> DynamicValue {
    DynamicValue::new(Dynamic::Map(
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
    ))
}

async fn configured_provider(url: &str) -> (StripeProvider, ConfigureResourceRequest) {
    let mut provider = StripeProvider::new();
    let response = provider
        .configure(
            Context::new(),
            ConfigureProviderRequest {
                terraform_version: "1.9.0".to_string(),
                config: object(vec![
                    ("api_key", "sk_test_lifecycle".into()),
                    ("api_base", url.into()),
                    ("max_retries", 0.0.into()),
                ]),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);

    let request = ConfigureResourceRequest {
        provider_data: response.provider_data,
    };
    (provider, request)
}

async fn resource(
    provider: &StripeProvider,
    type_name: &str,
    configure: &ConfigureResourceRequest,
) -> Box<dyn ResourceWithConfigure> {
    let factories = provider.resources();
    let mut resource = factories.get(type_name).unwrap()();
    let response = resource
        .configure(
            Context::new(),
            ConfigureResourceRequest {
                provider_data: configure.provider_data.clone(),
            },
        )
        .await;
    assert!(response.diagnostics.is_empty());
    resource
}

#[tokio::test]
async fn product_create_update_delete() {
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/v1/products")
        .match_header("authorization", Matcher::Regex("^Basic ".into()))
        .match_header("stripe-version", "2024-04-10")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("name".into(), "Gold".into()),
            Matcher::UrlEncoded("active".into(), "true".into()),
            Matcher::UrlEncoded("metadata[tier]".into(), "gold".into()),
        ]))
        .with_body(PRODUCT)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/v1/products/prod_1")
        .with_body(PRODUCT)
        .create_async()
        .await;

    let (provider, configure) = configured_provider(&server.url()).await;
    let product = resource(&provider, "stripe_product", &configure).await;
    let schema = product
        .schema(Context::new(), ResourceSchemaRequest)
        .await
        .schema;

    let tier = || Dynamic::Map(HashMap::from([("tier".to_string(), "gold".into())]));
    let config = object(vec![
        ("name", "Gold".into()),
        ("unit_label", "seat".into()),
        ("metadata", tier()),
    ]);
    let plan = plan_resource_change(&schema, &DynamicValue::null(), &config);
    assert!(plan.diagnostics.is_empty());

    let created = product
        .create(
            Context::new(),
            CreateResourceRequest {
                type_name: "stripe_product".to_string(),
                planned_state: plan.planned_state,
                config: config.clone(),
            },
        )
        .await;
    assert!(created.diagnostics.is_empty(), "{:?}", created.diagnostics);
    create.assert_async().await;
    let state = created.new_state;
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "prod_1");

    // rename in place
    get.remove_async().await;
    let update = server
        .mock("POST", "/v1/products/prod_1")
        .match_body(Matcher::Exact("name=Platinum".into()))
        .with_body(PRODUCT.replace("Gold", "Platinum"))
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/v1/products/prod_1")
        .with_body(PRODUCT.replace("Gold", "Platinum"))
        .create_async()
        .await;

    let config = object(vec![
        ("name", "Platinum".into()),
        ("unit_label", "seat".into()),
        ("metadata", tier()),
    ]);
    let plan = plan_resource_change(&schema, &state, &config);
    assert!(plan.requires_replace.is_empty());

    let updated = product
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "stripe_product".to_string(),
                prior_state: state,
                planned_state: plan.planned_state,
                config,
            },
        )
        .await;
    assert!(updated.diagnostics.is_empty(), "{:?}", updated.diagnostics);
    update.assert_async().await;
    assert_eq!(
        updated
            .new_state
            .get_string(&AttributePath::new("name"))
            .unwrap(),
        "Platinum"
    );

    let delete = server
        .mock("DELETE", "/v1/products/prod_1")
        .with_body(r#"{"id":"prod_1","object":"product","deleted":true}"#)
        .create_async()
        .await;
    let deleted = product
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "stripe_product".to_string(),
                prior_state: updated.new_state,
            },
        )
        .await;
    assert!(deleted.diagnostics.is_empty());
    delete.assert_async().await;
}

#[tokio::test]
async fn changing_price_currency_plans_replacement() {
    let server = Server::new_async().await;
    let (provider, configure) = configured_provider(&server.url()).await;
    let price = resource(&provider, "stripe_price", &configure).await;
    let schema = price.schema(Context::new(), ResourceSchemaRequest).await.schema;

    let prior = object(vec![
        ("id", "price_1".into()),
        ("currency", "usd".into()),
        ("product_id", "prod_1".into()),
        ("unit_amount", 1000.0.into()),
        ("active", true.into()),
        ("billing_scheme", "per_unit".into()),
    ]);
    let config = object(vec![
        ("currency", "eur".into()),
        ("product_id", "prod_1".into()),
        ("unit_amount", 1000.0.into()),
    ]);
    let plan = plan_resource_change(&schema, &prior, &config);

    assert_eq!(plan.requires_replace, vec![AttributePath::new("currency")]);
}

#[tokio::test]
async fn unchanged_coupon_plans_no_diff() {
    let server = Server::new_async().await;
    let (provider, configure) = configured_provider(&server.url()).await;
    let coupon = resource(&provider, "stripe_coupon", &configure).await;
    let schema = coupon.schema(Context::new(), ResourceSchemaRequest).await.schema;

    // coupon_id was generated by Stripe and is not in the configuration
    let prior = object(vec![
        ("id", "AUTO1".into()),
        ("coupon_id", "AUTO1".into()),
        ("percent_off", 10.0.into()),
        ("duration", "once".into()),
        ("times_redeemed", 0.0.into()),
        ("valid", true.into()),
    ]);
    let config = object(vec![("percent_off", 10.0.into())]);
    let plan = plan_resource_change(&schema, &prior, &config);

    assert!(plan.diagnostics.is_empty(), "{:?}", plan.diagnostics);
    assert!(plan.requires_replace.is_empty());
    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let stored = prior.get(&path).cloned().unwrap_or(Dynamic::Null);
        assert_eq!(
            plan.planned_state.get(&path).unwrap(),
            &stored,
            "{} changed",
            attr.name
        );
    }

    // a real change still leaves the server-side counters to be refreshed
    let config = object(vec![("percent_off", 10.0.into()), ("name", "Launch".into())]);
    let plan = plan_resource_change(&schema, &prior, &config);
    let planned = &plan.planned_state;
    assert_eq!(planned.get_string(&AttributePath::new("coupon_id")).unwrap(), "AUTO1");
    assert!(planned
        .get(&AttributePath::new("times_redeemed"))
        .unwrap()
        .is_unknown());
}

#[tokio::test]
async fn shipping_rate_gone_remotely_leaves_state() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/v1/shipping_rates/shr_1")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(
            r#"{"error":{"type":"invalid_request_error","code":"resource_missing","message":"No such shipping rate: 'shr_1'"}}"#,
        )
        .create_async()
        .await;

    let (provider, configure) = configured_provider(&server.url()).await;
    let rate = resource(&provider, "stripe_shipping_rate", &configure).await;
    let response = rate
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "stripe_shipping_rate".to_string(),
                current_state: object(vec![("id", "shr_1".into())]),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.is_none());
}

#[tokio::test]
async fn product_feature_import_through_factory() {
    let server = Server::new_async().await;
    let (provider, configure) = configured_provider(&server.url()).await;
    let attachment = resource(&provider, "stripe_product_feature", &configure).await;

    let response = attachment
        .as_import_state()
        .unwrap()
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "stripe_product_feature".to_string(),
                id: "prod_1:prodft_1".to_string(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    let state = &response.imported_resources[0].state;
    assert_eq!(state.get_string(&AttributePath::new("product")).unwrap(), "prod_1");
    assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "prodft_1");
}

#[tokio::test]
async fn balance_data_source_reads_through_provider() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/v1/balance")
        .with_body(
            r#"{"object":"balance","livemode":true,
                "available":[{"amount":1200,"currency":"usd","source_types":{"card":1200}}],
                "pending":[]}"#,
        )
        .create_async()
        .await;

    let (provider, configure) = configured_provider(&server.url()).await;
    let mut balance = provider.data_sources().get("stripe_balance").unwrap()();
    let configured = balance
        .configure(
            Context::new(),
            ConfigureDataSourceRequest {
                provider_data: configure.provider_data,
            },
        )
        .await;
    assert!(configured.diagnostics.is_empty());

    let response = balance
        .read(
            Context::new(),
            ReadDataSourceRequest {
                type_name: "stripe_balance".to_string(),
                config: DynamicValue::object(),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert!(response
        .state
        .get_bool(&AttributePath::new("livemode"))
        .unwrap());
    assert_eq!(
        response
            .state
            .get_string(&AttributePath::new("available").index(0).attribute("currency"))
            .unwrap(),
        "usd"
    );
}

#[tokio::test]
async fn resources_refuse_to_work_unconfigured() {
    let provider = StripeProvider::new();
    let factories = provider.resources();
    let coupon = factories.get("stripe_coupon").unwrap()();

    let response = coupon
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "stripe_coupon".to_string(),
                current_state: object(vec![("id", "SUMMER25".into())]),
                client_capabilities: ClientCapabilities::default(),
            },
        )
        .await;

    assert_eq!(response.diagnostics[0].summary, "Provider not configured");
}
