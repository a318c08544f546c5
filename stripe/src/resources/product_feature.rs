//! stripe_product_feature
//!
//! Attachment of an entitlements feature to a product. Every lookup goes
//! through the product, so imports take `<product>:<product_feature_id>`.

use super::StripeResource;
use crate::api::Client;
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::resource::{ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource};
use tfplug::{AttributeBuilder, AttributePath, AttributeType, Diagnostic, DynamicValue, Schema, SchemaBuilder};

#[derive(Default)]
pub struct ProductFeatureResource;

#[async_trait]
impl StripeResource for ProductFeatureResource {
    fn type_name(&self) -> &'static str {
        "stripe_product_feature"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Attaches an entitlements feature to a product")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier of the attachment")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("product", AttributeType::String)
                    .description("ID of the product the feature is attached to")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("entitlements_feature", AttributeType::String)
                    .description("ID of the attached entitlements feature")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("object", AttributeType::String)
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
            .build()
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let product = d.extract_string("product");
        let feature = d.extract_string("entitlements_feature");

        match client
            .entitlements()
            .attach_product_feature(ctx, &product, &feature)
            .await
        {
            Ok(attached) => d.set_id(&attached.id),
            Err(e) => return vec![api_error("attach product feature", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let product = d.extract_string("product");
        let attached = match client
            .entitlements()
            .get_product_feature(ctx, &product, &d.id())
            .await
        {
            Ok(attached) => attached,
            Err(e) => return vec![api_error("read product feature", e)],
        };

        call_set([
            d.set("product", product),
            d.set("entitlements_feature", attached.entitlement_feature),
            d.set("object", attached.object),
            d.set("livemode", attached.livemode),
        ])
    }

    /// Both inputs force replacement, so there is never anything to send
    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        self.read(ctx, client, d).await
    }

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let product = d.extract_string("product");
        if let Err(e) = client
            .entitlements()
            .detach_product_feature(ctx, &product, &d.id())
            .await
        {
            return vec![api_error("detach product feature", e)];
        }
        d.set_id("");
        vec![]
    }

    fn import_state(
        &self,
        _ctx: &Context,
        request: &ImportResourceStateRequest,
        response: &mut ImportResourceStateResponse,
    ) {
        let (product, id) = match parse_import_id(&request.id) {
            Some(parts) => parts,
            None => {
                response.diagnostics.push(Diagnostic::error(
                    "Invalid import ID",
                    format!(
                        "expected <product>:<product_feature_id>, got {:?}",
                        request.id
                    ),
                ));
                return;
            }
        };

        let mut state = DynamicValue::object();
        let set = [
            state.set(&AttributePath::new("id"), id),
            state.set(&AttributePath::new("product"), product),
        ];
        if let Some(e) = set.into_iter().find_map(Result::err) {
            response
                .diagnostics
                .push(Diagnostic::error("Failed to set import state", e.to_string()));
            return;
        }

        response.imported_resources.push(ImportedResource {
            type_name: request.type_name.clone(),
            state,
        });
    }
}

fn parse_import_id(id: &str) -> Option<(&str, &str)> {
    match id.split_once(':') {
        Some((product, feature)) if !product.is_empty() && !feature.is_empty() => {
            Some((product, feature))
        }
        _ => None,
    }
}
