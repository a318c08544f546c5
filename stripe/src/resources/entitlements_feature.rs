//! stripe_entitlements_feature

use super::{non_empty_map, update_metadata, StripeResource};
use crate::api::{Client, FormParams};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::StringPattern;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, Schema, SchemaBuilder};

#[derive(Default)]
pub struct EntitlementsFeatureResource;

#[async_trait]
impl StripeResource for EntitlementsFeatureResource {
    fn type_name(&self) -> &'static str {
        "stripe_entitlements_feature"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Features that can be attached to products and granted to customers")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier for the object")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("lookup_key", AttributeType::String)
                    .description("Your own unique identifier for the feature, up to 80 characters")
                    .required()
                    .validator(StringPattern::new("^.{1,80}$", "at most 80 characters"))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Internal name, not shown to customers")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("object", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description("Inactive features cannot be attached to new products")
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
                AttributeBuilder::new("metadata", AttributeType::string_map())
                    .description("Set of key-value pairs attached to the object")
                    .optional()
                    .build(),
            )
            .build()
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new()
            .add("lookup_key", d.extract_string("lookup_key"))
            .add("name", d.extract_string("name"));
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.entitlements().create_feature(ctx, &params).await {
            Ok(feature) => d.set_id(&feature.id),
            Err(e) => return vec![api_error("create entitlements feature", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let feature = match client.entitlements().get_feature(ctx, &d.id()).await {
            Ok(feature) => feature,
            Err(e) => return vec![api_error("read entitlements feature", e)],
        };

        call_set([
            d.set("lookup_key", feature.lookup_key),
            d.set("name", feature.name),
            d.set("object", feature.object),
            d.set("active", feature.active),
            d.set("livemode", feature.livemode),
            d.set("metadata", non_empty_map(feature.metadata)),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        if d.has_change("name") {
            params = params.add("name", d.extract_string("name"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.entitlements().update_feature(ctx, &d.id(), &params).await {
                return vec![api_error("update entitlements feature", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        tracing::warn!(
            "Stripe cannot delete entitlements features; deactivating {} instead",
            d.id()
        );
        if let Err(e) = client.entitlements().deactivate_feature(ctx, &d.id()).await {
            return vec![api_error("deactivate entitlements feature", e)];
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
    use std::collections::HashMap;
    use tfplug::{AttributePath, Dynamic};

    const FEATURE: &str = r#"{
        "id": "feat_1",
        "object": "entitlements.feature",
        "lookup_key": "sso",
        "name": "Single sign-on",
        "active": true,
        "livemode": false,
        "metadata": {"tier": "enterprise"}
    }"#;

    #[tokio::test]
    async fn create_with_metadata() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/v1/entitlements/features")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("lookup_key".into(), "sso".into()),
                Matcher::UrlEncoded("name".into(), "Single sign-on".into()),
                Matcher::UrlEncoded("metadata[tier]".into(), "enterprise".into()),
            ]))
            .with_body(FEATURE)
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/v1/entitlements/features/feat_1")
            .with_body(FEATURE)
            .create_async()
            .await;

        let adapter = configured(EntitlementsFeatureResource, &server.url()).await;
        let planned = object(vec![
            ("id", Dynamic::Unknown),
            ("lookup_key", "sso".into()),
            ("name", "Single sign-on".into()),
            (
                "metadata",
                Dynamic::Map(HashMap::from([("tier".to_string(), "enterprise".into())])),
            ),
            ("object", Dynamic::Unknown),
            ("active", Dynamic::Unknown),
            ("livemode", Dynamic::Unknown),
        ]);
        let response = testing::create(&adapter, planned).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        create.assert_async().await;
        assert_eq!(
            string_at(&response.new_state, AttributePath::new("object")),
            "entitlements.feature"
        );
        assert!(response
            .new_state
            .get_bool(&AttributePath::new("active"))
            .unwrap());
    }

    #[tokio::test]
    async fn delete_deactivates_instead() {
        let mut server = Server::new_async().await;
        let deactivate = server
            .mock("POST", "/v1/entitlements/features/feat_1")
            .match_body(Matcher::Exact("active=false".into()))
            .with_body(FEATURE.replace("\"active\": true", "\"active\": false"))
            .create_async()
            .await;

        let adapter = configured(EntitlementsFeatureResource, &server.url()).await;
        let response = testing::delete(&adapter, object(vec![("id", "feat_1".into())])).await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        deactivate.assert_async().await;
    }

    #[tokio::test]
    async fn renaming_sends_only_name() {
        let mut server = Server::new_async().await;
        let update = server
            .mock("POST", "/v1/entitlements/features/feat_1")
            .match_body(Matcher::Exact("name=SSO".into()))
            .with_body(FEATURE)
            .create_async()
            .await;
        let _get = server
            .mock("GET", "/v1/entitlements/features/feat_1")
            .with_body(FEATURE.replace("Single sign-on", "SSO"))
            .create_async()
            .await;

        let adapter = configured(EntitlementsFeatureResource, &server.url()).await;
        let response = testing::update(
            &adapter,
            object(vec![
                ("id", "feat_1".into()),
                ("lookup_key", "sso".into()),
                ("name", "Single sign-on".into()),
            ]),
            object(vec![
                ("id", "feat_1".into()),
                ("lookup_key", "sso".into()),
                ("name", "SSO".into()),
            ]),
        )
        .await;

        assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
        update.assert_async().await;
    }

    #[tokio::test]
    async fn lookup_key_is_required() {
        let adapter = ResourceAdapter::new(EntitlementsFeatureResource);
        let diags = testing::validate(&adapter, object(vec![("name", "SSO".into())])).await;
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].summary, "Missing required argument");
    }
}
