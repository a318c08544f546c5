//! stripe_webhook_endpoint
//!
//! The signing secret is only returned when the endpoint is created, so it
//! is captured then and carried through later reads untouched.

use super::{non_empty, non_empty_map, rfc3339_from_unix, update_metadata, StripeResource};
use crate::api::{Client, FormParams};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::{ListLength, StringPattern};
use tfplug::{AttributeBuilder, AttributePath, AttributeType, Diagnostic, Schema, SchemaBuilder};

#[derive(Default)]
pub struct WebhookEndpointResource;

#[async_trait]
impl StripeResource for WebhookEndpointResource {
    fn type_name(&self) -> &'static str {
        "stripe_webhook_endpoint"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Endpoints Stripe sends event notifications to")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("The URL of the webhook endpoint")
                    .required()
                    .validator(StringPattern::new("^https?://", "an http or https URL"))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("enabled_events", AttributeType::string_list())
                    .description("Events to send, or [\"*\"] for all events")
                    .required()
                    .validator(ListLength::at_least(1))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("An optional description of what the endpoint is used for")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("disabled", AttributeType::Bool)
                    .description("Disable the endpoint; only possible once it exists")
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("api_version", AttributeType::String)
                    .description("Stripe API version events are rendered as; the account default when unset")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("connect", AttributeType::Bool)
                    .description("Receive events from connected accounts instead of your own")
                    .default(StaticDefault::bool(false))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("secret", AttributeType::String)
                    .description("Signing secret, available only from creation")
                    .computed()
                    .sensitive()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .description("enabled or disabled")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::String)
                    .description("RFC3339 creation time")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("livemode", AttributeType::Bool)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("application", AttributeType::String)
                    .description("ID of the associated Connect application")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("metadata", AttributeType::string_map())
                    .description("Set of key-value pairs attached to the object")
                    .optional()
                    .build(),
            )
            .build()
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        if d.extract_bool("disabled") {
            return vec![Diagnostic::error(
                "Invalid disabled",
                "disabled can only be set on an existing webhook endpoint",
            )
            .with_attribute(AttributePath::new("disabled"))];
        }

        let mut params = FormParams::new()
            .add("url", d.extract_string("url"))
            .add_list("enabled_events", &d.extract_string_list("enabled_events"))
            .add_optional("description", d.optional_string("description"))
            .add_optional("api_version", d.optional_string("api_version"));
        if d.extract_bool("connect") {
            params = params.add("connect", true);
        }
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        let endpoint = match client.webhook_endpoints().create(ctx, &params).await {
            Ok(endpoint) => endpoint,
            Err(e) => return vec![api_error("create webhook endpoint", e)],
        };
        d.set_id(&endpoint.id);

        let diags = call_set([d.set("secret", endpoint.secret)]);
        if !diags.is_empty() {
            return diags;
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let endpoint = match client.webhook_endpoints().get(ctx, &d.id()).await {
            Ok(endpoint) => endpoint,
            Err(e) => return vec![api_error("read webhook endpoint", e)],
        };

        call_set([
            d.set("url", endpoint.url),
            d.set("enabled_events", endpoint.enabled_events),
            d.set("description", non_empty(endpoint.description)),
            d.set("disabled", endpoint.status == "disabled"),
            d.set("status", endpoint.status),
            d.set("api_version", non_empty(endpoint.api_version)),
            d.set("created", rfc3339_from_unix(endpoint.created)),
            d.set("livemode", endpoint.livemode),
            d.set("application", non_empty(endpoint.application)),
            d.set("metadata", non_empty_map(endpoint.metadata)),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        if d.has_change("url") {
            params = params.add("url", d.extract_string("url"));
        }
        if d.has_change("enabled_events") {
            params = params.add_list("enabled_events", &d.extract_string_list("enabled_events"));
        }
        if d.has_change("description") {
            params = params.add("description", d.extract_string("description"));
        }
        if d.has_change("disabled") {
            params = params.add("disabled", d.extract_bool("disabled"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.webhook_endpoints().update(ctx, &d.id(), &params).await {
                return vec![api_error("update webhook endpoint", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        if let Err(e) = client.webhook_endpoints().delete(ctx, &d.id()).await {
            return vec![api_error("delete webhook endpoint", e)];
        }
        d.set_id("");
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::testing::{self, configured, object, string_at};
    use crate::resources::ResourceAdapter;
    use mockito::{Matcher, Server};
    use tfplug::Dynamic;

    const CREATED: &str = r#"{
        "id": "we_1",
        "url": "https://example.com/hook",
        "enabled_events": ["invoice.paid", "customer.created"],
        "description": null,
        "api_version": null,
        "application": null,
        "secret": "whsec_abc",
        "status": "enabled",
        "created": 1767225600,
        "livemode": false,
        "metadata": {}
    }"#;

    const FETCHED: &str = r#"{
        "id": "we_1",
        "url": "https://example.com/hook",
        "enabled_events": ["invoice.paid", "customer.created"],
        "status": "enabled",
        "created": 1767225600,
        "livemode": false
    }"#;

    fn plan() -> tfplug::DynamicValue {
        object(vec![
            ("id", Dynamic::Unknown),
            ("url", "https://example.com/hook".into()),
            (
                "enabled_events",
                Dynamic::List(vec!["invoice.paid".into(), "customer.created".into()]),
            ),
            ("secret", Dynamic::Unknown),
            ("status", Dynamic::Unknown),
            ("created", Dynamic::Unknown),
            ("livemode", Dynamic::Unknown),
            ("application", Dynamic::Unknown),
            ("api_version", Dynamic::Unknown),
        ])
    }

    #[tokio::test]
    async fn create_keeps_secret_from_create_response() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/webhook_endpoints")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("url".into(), "https://example.com/hook".into()),
                Matcher::UrlEncoded("enabled_events[0]".into(), "invoice.paid".into()),
                Matcher::UrlEncoded("enabled_events[1]".into(), "customer.created".into()),
            ]))
            .with_body(CREATED)
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/v1/webhook_endpoints/we_1")
            .with_body(FETCHED)
            .create_async()
            .await;

        let adapter = configured(WebhookEndpointResource, &server.url()).await;
        let response = testing::create(&adapter, plan()).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        create.assert_async().await;

        let state = response.new_state;
        assert_eq!(string_at(&state, AttributePath::new("secret")), "whsec_abc");
        assert_eq!(string_at(&state, AttributePath::new("created")), "2026-01-01T00:00:00Z");
        assert_eq!(string_at(&state, AttributePath::new("status")), "enabled");
        assert!(!state.get_bool(&AttributePath::new("disabled")).unwrap());
    }

    #[tokio::test]
    async fn read_preserves_secret() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/v1/webhook_endpoints/we_1")
            .with_body(FETCHED)
            .create_async()
            .await;

        let adapter = configured(WebhookEndpointResource, &server.url()).await;
        let response = testing::read(
            &adapter,
            object(vec![("id", "we_1".into()), ("secret", "whsec_abc".into())]),
        )
        .await;

        let state = response.new_state.unwrap();
        assert_eq!(string_at(&state, AttributePath::new("secret")), "whsec_abc");
    }

    #[tokio::test]
    async fn disabled_on_create_is_rejected() {
        let server = Server::new_async().await;
        let adapter = configured(WebhookEndpointResource, &server.url()).await;
        let mut planned = plan();
        planned.set(&AttributePath::new("disabled"), true).unwrap();

        let response = testing::create(&adapter, planned).await;

        assert_eq!(response.diagnostics[0].summary, "Invalid disabled");
        assert!(response.new_state.is_null());
    }

    #[tokio::test]
    async fn disabling_an_existing_endpoint() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("POST", "/v1/webhook_endpoints/we_1")
            .match_body(Matcher::Exact("disabled=true".into()))
            .with_body(FETCHED)
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/v1/webhook_endpoints/we_1")
            .with_body(FETCHED.replace("\"enabled\"", "\"disabled\""))
            .create_async()
            .await;

        let adapter = configured(WebhookEndpointResource, &server.url()).await;
        let prior = object(vec![
            ("id", "we_1".into()),
            ("url", "https://example.com/hook".into()),
            ("disabled", false.into()),
        ]);
        let planned = object(vec![
            ("id", "we_1".into()),
            ("url", "https://example.com/hook".into()),
            ("disabled", true.into()),
        ]);
        let response = testing::update(&adapter, prior, planned).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        update.assert_async().await;
        assert_eq!(
            string_at(&response.new_state, AttributePath::new("status")),
            "disabled"
        );
    }

    #[tokio::test]
    async fn url_must_be_http() {
        let adapter = ResourceAdapter::new(WebhookEndpointResource);
        let diags = testing::validate(
            &adapter,
            object(vec![
                ("url", "ftp://example.com".into()),
                ("enabled_events", Dynamic::List(vec!["*".into()])),
            ]),
        )
        .await;
        assert_eq!(diags.len(), 1);
    }
}
