//! stripe_tax_rate
//!
//! Tax rates cannot be deleted, only archived by setting `active = false`.
//! `inclusive` and `percentage` are fixed at creation.

use super::{non_empty, non_empty_map, update_metadata, StripeResource};
use crate::api::{Client, FormParams};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::NumberRange;
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, Schema, SchemaBuilder};

#[derive(Default)]
pub struct TaxRateResource;

#[async_trait]
impl StripeResource for TaxRateResource {
    fn type_name(&self) -> &'static str {
        "stripe_tax_rate"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Tax rates applied to invoices, subscriptions and Checkout Sessions")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier for the object")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("display_name", AttributeType::String)
                    .description("The display name of the tax rate, shown to users")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("inclusive", AttributeType::Bool)
                    .description("Whether the tax rate is inclusive or exclusive")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("percentage", AttributeType::Number)
                    .description("The tax rate percent out of 100")
                    .required()
                    .validator(NumberRange::between(0.0, 100.0))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description("Inactive tax rates cannot be applied to new purchases")
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("country", AttributeType::String)
                    .description("Two-letter country code (ISO 3166-1 alpha-2)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Internal description, not visible to customers")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("jurisdiction", AttributeType::String)
                    .description("Jurisdiction label, shown on invoices")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("state", AttributeType::String)
                    .description("ISO 3166-2 subdivision code without the country prefix")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tax_type", AttributeType::String)
                    .description("The high-level tax type, such as vat or sales_tax")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("metadata", AttributeType::string_map())
                    .description("Set of key-value pairs attached to the object")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("object", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("created", AttributeType::Number)
                    .description("Creation time in seconds since the Unix epoch")
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
        let mut params = FormParams::new()
            .add("display_name", d.extract_string("display_name"))
            .add("inclusive", d.extract_bool("inclusive"))
            .add("percentage", d.extract_float64("percentage"))
            .add("active", d.extract_bool("active"));
        for name in ["country", "description", "jurisdiction", "state", "tax_type"] {
            params = params.add_optional(name, d.optional_string(name));
        }
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.tax_rates().create(ctx, &params).await {
            Ok(rate) => d.set_id(&rate.id),
            Err(e) => return vec![api_error("create tax rate", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let rate = match client.tax_rates().get(ctx, &d.id()).await {
            Ok(rate) => rate,
            Err(e) => return vec![api_error("read tax rate", e)],
        };

        call_set([
            d.set("object", rate.object),
            d.set("active", rate.active),
            d.set("country", non_empty(rate.country)),
            d.set("created", rate.created),
            d.set("description", non_empty(rate.description)),
            d.set("display_name", rate.display_name),
            d.set("inclusive", rate.inclusive),
            d.set("jurisdiction", non_empty(rate.jurisdiction)),
            d.set("livemode", rate.livemode),
            d.set("metadata", non_empty_map(rate.metadata)),
            d.set("percentage", rate.percentage),
            d.set("state", non_empty(rate.state)),
            d.set("tax_type", non_empty(rate.tax_type)),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        if d.has_change("active") {
            params = params.add("active", d.extract_bool("active"));
        }
        for name in ["country", "description", "display_name", "jurisdiction", "state", "tax_type"] {
            if d.has_change(name) {
                params = params.add(name, d.extract_string(name));
            }
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.tax_rates().update(ctx, &d.id(), &params).await {
                return vec![api_error("update tax rate", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, _ctx: &Context, _client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        tracing::warn!(
            "Stripe does not support deleting tax rates; removing {} from state only",
            d.id()
        );
        d.set_id("");
        vec![]
    }
}
