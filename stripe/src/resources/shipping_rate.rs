//! stripe_shipping_rate
//!
//! The only resource that treats a missing remote object as deleted: a 404
//! on read drops it from state so the next plan recreates it.

use super::{non_empty, non_empty_map, update_metadata, StripeResource};
use crate::api::shipping_rates::{DeliveryBound, ShippingRate};
use crate::api::{Client, FormParams};
use crate::convert::{to_int64, to_map, to_map_list, to_string};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::{ListLength, StringOneOf};
use tfplug::{AttributeBuilder, AttributeType, Diagnostic, Dynamic, Schema, SchemaBuilder};

const TAX_BEHAVIORS: [&str; 3] = ["inclusive", "exclusive", "unspecified"];

#[derive(Default)]
pub struct ShippingRateResource;

fn delivery_bound_type() -> AttributeType {
    AttributeType::object_list(&[("unit", AttributeType::String), ("value", AttributeType::Number)])
}

#[async_trait]
impl StripeResource for ShippingRateResource {
    fn type_name(&self) -> &'static str {
        "stripe_shipping_rate"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Shipping rates offered to customers in Checkout")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier for the object")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("How the rate is calculated; only fixed_amount is supported")
                    .default(StaticDefault::string("fixed_amount"))
                    .validator(StringOneOf::new(&["fixed_amount"]))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("display_name", AttributeType::String)
                    .description("Customer-facing name of the rate, shown on Checkout Sessions")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description("Whether the rate can be used for new purchases")
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "fixed_amount",
                    AttributeType::object_list(&[
                        ("amount", AttributeType::Number),
                        ("currency", AttributeType::String),
                        (
                            "currency_option",
                            AttributeType::object_list(&[
                                ("currency", AttributeType::String),
                                ("amount", AttributeType::Number),
                                ("tax_behavior", AttributeType::String),
                            ]),
                        ),
                    ]),
                )
                .description(
                    "Fixed amount to charge, with optional amounts in other currencies; \
                     omit a currency option's tax_behavior for unspecified",
                )
                .required()
                .validator(ListLength::between(1, 1))
                .requires_replace()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "delivery_estimate",
                    AttributeType::object_list(&[
                        ("minimum", delivery_bound_type()),
                        ("maximum", delivery_bound_type()),
                    ]),
                )
                .description("Estimated delivery window shown to the customer")
                .optional()
                .validator(ListLength::at_most(1))
                .requires_replace()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("tax_behavior", AttributeType::String)
                    .description("Whether the rate includes taxes: inclusive, exclusive or unspecified")
                    .default(StaticDefault::string("unspecified"))
                    .validator(StringOneOf::new(&TAX_BEHAVIORS))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("tax_code", AttributeType::String)
                    .description("A tax code ID; shipping is txcd_92010001")
                    .optional()
                    .requires_replace()
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
            .add("type", d.extract_string("type"))
            .add("display_name", d.extract_string("display_name"))
            .nested("fixed_amount", fixed_amount_params(&d.extract_map("fixed_amount")))
            .add_optional("tax_behavior", d.optional_string("tax_behavior"))
            .add_optional("tax_code", d.optional_string("tax_code"));
        if d.get_ok("delivery_estimate").is_some() {
            params = params.nested(
                "delivery_estimate",
                delivery_estimate_params(&d.extract_map("delivery_estimate")),
            );
        }
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.shipping_rates().create(ctx, &params).await {
            Ok(rate) => d.set_id(&rate.id),
            Err(e) => return vec![api_error("create shipping rate", e)],
        }

        // rates are always created active
        if !d.extract_bool("active") {
            if let Err(e) = client.shipping_rates().archive(ctx, &d.id()).await {
                return vec![api_error("deactivate shipping rate", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let rate = match client.shipping_rates().get(ctx, &d.id()).await {
            Ok(rate) => rate,
            Err(e) if e.is_not_found() => {
                d.set_id("");
                return vec![];
            }
            Err(e) => return vec![api_error("read shipping rate", e)],
        };

        let fixed_amount = flatten_fixed_amount(&rate);
        let delivery_estimate = flatten_delivery_estimate(&rate);

        call_set([
            d.set("type", rate.rate_type),
            d.set("display_name", rate.display_name),
            d.set("active", rate.active),
            d.set("fixed_amount", fixed_amount),
            d.set("delivery_estimate", delivery_estimate),
            d.set("tax_behavior", non_empty(rate.tax_behavior)),
            d.set("tax_code", non_empty(rate.tax_code)),
            d.set("livemode", rate.livemode),
            d.set("metadata", non_empty_map(rate.metadata)),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        if d.has_change("active") {
            params = params.add("active", d.extract_bool("active"));
        }
        if d.has_change("tax_behavior") {
            params = params.add("tax_behavior", d.extract_string("tax_behavior"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.shipping_rates().update(ctx, &d.id(), &params).await {
                return vec![api_error("update shipping rate", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    /// Archives the rate; the object leaves state even if archiving fails
    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let id = d.id();
        d.set_id("");
        match client.shipping_rates().archive(ctx, &id).await {
            Ok(_) => vec![],
            Err(e) => {
                tracing::warn!("Failed to archive shipping rate {}: {}", id, e);
                vec![Diagnostic::warning(
                    "Failed to archive shipping rate",
                    format!("{} was removed from state but may still be active: {}", id, e),
                )]
            }
        }
    }
}

fn fixed_amount_params(fixed_amount: &HashMap<String, Dynamic>) -> FormParams {
    let field = |name: &str| fixed_amount.get(name).cloned().unwrap_or(Dynamic::Null);

    let mut params = FormParams::new()
        .add("amount", to_int64(&field("amount")))
        .add("currency", to_string(&field("currency")));
    for option in to_map_list(&field("currency_option")) {
        let get = |name: &str| option.get(name).cloned().unwrap_or(Dynamic::Null);
        let currency = to_string(&get("currency"));
        params = params
            .add(
                format!("currency_options[{}][amount]", currency),
                to_int64(&get("amount")),
            )
            .add_optional(
                format!("currency_options[{}][tax_behavior]", currency),
                non_empty(Some(to_string(&get("tax_behavior")))),
            );
    }
    params
}

fn delivery_estimate_params(estimate: &HashMap<String, Dynamic>) -> FormParams {
    let mut params = FormParams::new();
    for bound in ["minimum", "maximum"] {
        let values = to_map(estimate.get(bound).unwrap_or(&Dynamic::Null));
        if values.is_empty() {
            continue;
        }
        let get = |name: &str| values.get(name).cloned().unwrap_or(Dynamic::Null);
        params = params
            .add(format!("{}[unit]", bound), to_string(&get("unit")))
            .add(format!("{}[value]", bound), to_int64(&get("value")));
    }
    params
}

/// Single-element block list. Extra currencies are sorted by code and the
/// primary currency, which Stripe repeats in `currency_options`, is skipped.
fn flatten_fixed_amount(rate: &ShippingRate) -> Dynamic {
    let Some(fixed) = &rate.fixed_amount else {
        return Dynamic::Null;
    };

    let mut options: Vec<_> = fixed
        .currency_options
        .iter()
        .filter(|(currency, _)| **currency != fixed.currency)
        .collect();
    options.sort_by(|a, b| a.0.cmp(b.0));
    let options: Vec<Dynamic> = options
        .into_iter()
        .map(|(currency, option)| {
            let tax_behavior = option
                .tax_behavior
                .clone()
                .filter(|t| !t.is_empty() && t != "unspecified");
            Dynamic::Map(HashMap::from([
                ("currency".to_string(), Dynamic::from(currency.clone())),
                ("amount".to_string(), Dynamic::from(option.amount)),
                ("tax_behavior".to_string(), Dynamic::from(tax_behavior)),
            ]))
        })
        .collect();

    Dynamic::List(vec![Dynamic::Map(HashMap::from([
        ("amount".to_string(), Dynamic::from(fixed.amount)),
        ("currency".to_string(), Dynamic::from(fixed.currency.clone())),
        (
            "currency_option".to_string(),
            if options.is_empty() {
                Dynamic::Null
            } else {
                Dynamic::List(options)
            },
        ),
    ]))])
}

fn flatten_delivery_estimate(rate: &ShippingRate) -> Dynamic {
    let Some(estimate) = &rate.delivery_estimate else {
        return Dynamic::Null;
    };

    let bound = |b: &Option<DeliveryBound>| match b {
        Some(b) => Dynamic::List(vec![Dynamic::Map(HashMap::from([
            ("unit".to_string(), Dynamic::from(b.unit.clone())),
            ("value".to_string(), Dynamic::from(b.value)),
        ]))]),
        None => Dynamic::Null,
    };

    Dynamic::List(vec![Dynamic::Map(HashMap::from([
        ("minimum".to_string(), bound(&estimate.minimum)),
        ("maximum".to_string(), bound(&estimate.maximum)),
    ]))])
}
