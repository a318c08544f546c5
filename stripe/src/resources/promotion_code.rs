//! stripe_promotion_code
//!
//! Stripe has no endpoint for deleting promotion codes; destroying one only
//! forgets it locally.

use super::{
    non_empty, non_empty_map, rfc3339_from_unix, unix_from_rfc3339, update_metadata,
    StripeResource,
};
use crate::api::promotion_codes::Restrictions;
use crate::api::{Client, FormParams};
use crate::convert::{to_bool, to_int64, to_string};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::{ListLength, NumberRange};
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue, Schema,
    SchemaBuilder,
};

#[derive(Default)]
pub struct PromotionCodeResource;

#[async_trait]
impl StripeResource for PromotionCodeResource {
    fn type_name(&self) -> &'static str {
        "stripe_promotion_code"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Customer-redeemable codes for a coupon")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier for the object")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("coupon", AttributeType::String)
                    .description("The coupon for this promotion code")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("code", AttributeType::String)
                    .description("The customer-facing code; generated when left blank")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description("Whether the promotion code is currently active")
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("customer", AttributeType::String)
                    .description("The only customer allowed to use this code")
                    .optional()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("max_redemptions", AttributeType::Number)
                    .description("Number of times the code can be redeemed")
                    .optional()
                    .validator(NumberRange::at_least(1.0))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("expires_at", AttributeType::String)
                    .description("RFC3339 timestamp at which the code expires")
                    .optional()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "restrictions",
                    AttributeType::object_list(&[
                        ("first_time_transaction", AttributeType::Bool),
                        ("minimum_amount", AttributeType::Number),
                        ("minimum_amount_currency", AttributeType::String),
                    ]),
                )
                .description("Settings that restrict redemption of the code")
                .optional()
                .validator(ListLength::at_most(1))
                .requires_replace()
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

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        match config.get(&AttributePath::new("expires_at")) {
            Ok(Dynamic::String(expires_at)) => match unix_from_rfc3339(expires_at) {
                Ok(_) => vec![],
                Err(e) => vec![Diagnostic::error("Invalid expires_at", e)
                    .with_attribute(AttributePath::new("expires_at"))],
            },
            _ => vec![],
        }
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new()
            .add("coupon", d.extract_string("coupon"))
            .add("active", d.extract_bool("active"))
            .add_optional("code", d.optional_string("code"))
            .add_optional("customer", d.optional_string("customer"))
            .add_optional(
                "max_redemptions",
                d.get_ok("max_redemptions").map(|_| d.extract_int64("max_redemptions")),
            );

        if let Some(expires_at) = d.optional_string("expires_at") {
            match unix_from_rfc3339(&expires_at) {
                Ok(seconds) => params = params.add("expires_at", seconds),
                Err(e) => {
                    return vec![Diagnostic::error("Invalid expires_at", e)
                        .with_attribute(AttributePath::new("expires_at"))]
                }
            }
        }
        if let Some(restrictions) = d.extract_map_list("restrictions").first() {
            params = params.nested("restrictions", restriction_params(restrictions));
        }
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.promotion_codes().create(ctx, &params).await {
            Ok(code) => d.set_id(&code.id),
            Err(e) => return vec![api_error("create promotion code", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let code = match client.promotion_codes().get(ctx, &d.id()).await {
            Ok(code) => code,
            Err(e) => return vec![api_error("read promotion code", e)],
        };

        let restrictions = code
            .restrictions
            .as_ref()
            .filter(|r| d.get_ok("restrictions").is_some() || has_restrictions(r))
            .map(flatten_restrictions);

        call_set([
            d.set("coupon", code.coupon),
            d.set("code", code.code),
            d.set("active", code.active),
            d.set("customer", code.customer),
            d.set("max_redemptions", code.max_redemptions),
            d.set("expires_at", code.expires_at.filter(|t| *t != 0).map(rfc3339_from_unix)),
            d.set("restrictions", restrictions),
            d.set("metadata", non_empty_map(code.metadata)),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        if d.has_change("active") {
            params = params.add("active", d.extract_bool("active"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.promotion_codes().update(ctx, &d.id(), &params).await {
                return vec![api_error("update promotion code", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, _ctx: &Context, _client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        tracing::warn!(
            "Stripe does not support deleting promotion codes; removing {} from state only",
            d.id()
        );
        d.set_id("");
        vec![]
    }
}

fn restriction_params(restrictions: &HashMap<String, Dynamic>) -> FormParams {
    let field = |name: &str| restrictions.get(name).cloned().unwrap_or(Dynamic::Null);

    let mut params = FormParams::new().add(
        "first_time_transaction",
        to_bool(&field("first_time_transaction")),
    );
    if !field("minimum_amount").is_null() {
        params = params.add("minimum_amount", to_int64(&field("minimum_amount")));
    }
    params.add_optional(
        "minimum_amount_currency",
        non_empty(Some(to_string(&field("minimum_amount_currency")))),
    )
}

/// Stripe always returns a restrictions object; an all-default one is not
/// worth tracking unless configured
fn has_restrictions(r: &Restrictions) -> bool {
    r.first_time_transaction || r.minimum_amount.is_some()
}

fn flatten_restrictions(r: &Restrictions) -> Dynamic {
    Dynamic::List(vec![Dynamic::Map(HashMap::from([
        (
            "first_time_transaction".to_string(),
            Dynamic::from(r.first_time_transaction),
        ),
        ("minimum_amount".to_string(), Dynamic::from(r.minimum_amount)),
        (
            "minimum_amount_currency".to_string(),
            Dynamic::from(r.minimum_amount_currency.clone()),
        ),
    ]))])
}
