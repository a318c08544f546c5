//! stripe_price
//!
//! Everything but `active`, `nickname` and `metadata` is fixed once the
//! price exists, so those attributes force replacement. Prices cannot be
//! deleted; destroying one archives it.

use super::{non_empty, non_empty_map, update_metadata, StripeResource};
use crate::api::prices::{Price, PriceTier, Recurring};
use crate::api::{Client, FormParams};
use crate::convert::{optional_float64, optional_int64, to_int64, to_map_list, to_string};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::{conflicting, ListLength, StringOneOf, StringPattern};
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue, Schema,
    SchemaBuilder,
};

const RECURRING_INTERVALS: [&str; 4] = ["day", "week", "month", "year"];

#[derive(Default)]
pub struct PriceResource;

#[async_trait]
impl StripeResource for PriceResource {
    fn type_name(&self) -> &'static str {
        "stripe_price"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Prices define the unit cost, currency, and billing cycle of a product")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("currency", AttributeType::String)
                    .description("Three-letter ISO currency code, in lowercase")
                    .required()
                    .validator(StringPattern::new("^[a-z]{3}$", "a lowercase ISO currency code"))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("product_id", AttributeType::String)
                    .description("The ID of the product this price belongs to")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("unit_amount", AttributeType::Number)
                    .description("Amount in the smallest currency unit to charge")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("unit_amount_decimal", AttributeType::Number)
                    .description("Same as unit_amount, with up to 12 decimal places")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description("Whether the price can be used for new purchases")
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("nickname", AttributeType::String)
                    .description("A brief description of the price, hidden from customers")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("recurring", AttributeType::string_map())
                    .description(
                        "Recurring components: interval, interval_count, usage_type and aggregate_usage",
                    )
                    .optional()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("billing_scheme", AttributeType::String)
                    .description("How to compute the price per period: per_unit or tiered")
                    .default(StaticDefault::string("per_unit"))
                    .validator(StringOneOf::new(&["per_unit", "tiered"]))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "tiers",
                    AttributeType::object_list(&[
                        ("up_to", AttributeType::Number),
                        ("flat_amount", AttributeType::Number),
                        ("flat_amount_decimal", AttributeType::Number),
                        ("unit_amount", AttributeType::Number),
                        ("unit_amount_decimal", AttributeType::Number),
                    ]),
                )
                .description("Pricing tiers; up_to = 0 marks the last, unbounded tier")
                .optional()
                .requires_replace()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("tiers_mode", AttributeType::String)
                    .description("graduated or volume tiering")
                    .optional()
                    .validator(StringOneOf::new(&["graduated", "volume"]))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "transform_quantity",
                    AttributeType::object_list(&[
                        ("divide_by", AttributeType::Number),
                        ("round", AttributeType::String),
                    ]),
                )
                .description("Transform the reported quantity before computing the amount")
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
        let mut diags: Vec<Diagnostic> = [
            conflicting(config, "unit_amount", "unit_amount_decimal"),
            conflicting(config, "tiers", "transform_quantity"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let value = |name: &str| {
            config
                .get(&AttributePath::new(name))
                .cloned()
                .unwrap_or(Dynamic::Null)
        };

        for (present, missing) in [("tiers", "tiers_mode"), ("tiers_mode", "tiers")] {
            if !value(present).is_null() && value(missing).is_null() {
                diags.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("\"{}\": all of `tiers,tiers_mode` must be specified", present),
                    )
                    .with_attribute(AttributePath::new(missing)),
                );
            }
        }

        for (i, tier) in to_map_list(&value("tiers")).iter().enumerate() {
            if tier.get("up_to").map_or(true, Dynamic::is_null) {
                diags.push(
                    Diagnostic::error(
                        "Missing required argument",
                        "every tier needs up_to; use 0 for the last tier",
                    )
                    .with_attribute(AttributePath::new("tiers").index(i as i64).attribute("up_to")),
                );
            }
        }

        for block in to_map_list(&value("transform_quantity")) {
            if let Some(Dynamic::String(round)) = block.get("round") {
                if round != "up" && round != "down" {
                    diags.push(
                        Diagnostic::error(
                            "Invalid value for transform_quantity.round",
                            format!("expected one of [up, down], got '{}'", round),
                        )
                        .with_attribute(AttributePath::new("transform_quantity")),
                    );
                }
            }
        }

        if let Dynamic::Map(recurring) = value("recurring") {
            if let Some(Dynamic::String(interval)) = recurring.get("interval") {
                if !RECURRING_INTERVALS.contains(&interval.as_str()) {
                    diags.push(
                        Diagnostic::error(
                            "Invalid value for recurring.interval",
                            format!(
                                "expected one of [{}], got '{}'",
                                RECURRING_INTERVALS.join(", "),
                                interval
                            ),
                        )
                        .with_attribute(AttributePath::new("recurring")),
                    );
                }
            }
        }

        diags
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new()
            .add("currency", d.extract_string("currency"))
            .add("product", d.extract_string("product_id"))
            .add("active", d.extract_bool("active"))
            .add("billing_scheme", d.extract_string("billing_scheme"))
            .add_optional("nickname", d.optional_string("nickname"))
            .add_optional("tiers_mode", d.optional_string("tiers_mode"));

        // an explicit unit_amount = 0 is a valid free price
        if d.get_ok("unit_amount_decimal").is_some() {
            params = params.add("unit_amount_decimal", d.extract_float64("unit_amount_decimal"));
        } else if !d.get("unit_amount").is_null() {
            params = params.add("unit_amount", d.extract_int64("unit_amount"));
        }

        if d.get_ok("recurring").is_some() {
            params = params.nested("recurring", recurring_params(&d.extract_string_map("recurring")));
        }

        for (i, tier) in d.extract_map_list("tiers").iter().enumerate() {
            params = params.nested(&format!("tiers[{}]", i), tier_params(tier));
        }

        if let Some(tq) = d.extract_map_list("transform_quantity").first() {
            params = params
                .add("transform_quantity[divide_by]", to_int64(tq.get("divide_by").unwrap_or(&Dynamic::Null)))
                .add("transform_quantity[round]", to_string(tq.get("round").unwrap_or(&Dynamic::Null)));
        }

        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.prices().create(ctx, &params).await {
            Ok(price) => d.set_id(&price.id),
            Err(e) => return vec![api_error("create price", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let price = match client.prices().get(ctx, &d.id()).await {
            Ok(price) => price,
            Err(e) => return vec![api_error("read price", e)],
        };

        let recurring = price
            .recurring
            .as_ref()
            .map(|r| flatten_recurring(r, &d.extract_string_map("recurring")));
        let tiers: Vec<Dynamic> = price.tiers.iter().map(flatten_tier).collect();
        let transform_quantity = flatten_transform_quantity(&price);

        call_set([
            d.set("currency", price.currency),
            d.set("product_id", price.product),
            d.set("unit_amount", price.unit_amount),
            d.set("unit_amount_decimal", parse_decimal(price.unit_amount_decimal.as_deref())),
            d.set("active", price.active),
            d.set("nickname", non_empty(price.nickname)),
            d.set("billing_scheme", price.billing_scheme),
            d.set("tiers_mode", non_empty(price.tiers_mode)),
            d.set("recurring", recurring),
            d.set("tiers", if tiers.is_empty() { Dynamic::Null } else { Dynamic::List(tiers) }),
            d.set("transform_quantity", transform_quantity),
            d.set("metadata", non_empty_map(price.metadata)),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        if d.has_change("active") {
            params = params.add("active", d.extract_bool("active"));
        }
        if d.has_change("nickname") {
            params = params.add("nickname", d.extract_string("nickname"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.prices().update(ctx, &d.id(), &params).await {
                return vec![api_error("update price", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        if let Err(e) = client.prices().archive(ctx, &d.id()).await {
            return vec![api_error("archive price", e)];
        }
        d.set_id("");
        vec![]
    }
}

fn recurring_params(recurring: &HashMap<String, String>) -> FormParams {
    let mut params = FormParams::new();
    for key in ["interval", "interval_count", "usage_type", "aggregate_usage"] {
        if let Some(value) = recurring.get(key).filter(|v| !v.is_empty()) {
            params = params.add(key, value);
        }
    }
    params
}

fn tier_params(tier: &HashMap<String, Dynamic>) -> FormParams {
    let field = |name: &str| tier.get(name).cloned().unwrap_or(Dynamic::Null);

    let params = match to_int64(&field("up_to")) {
        0 => FormParams::new().add("up_to", "inf"),
        n => FormParams::new().add("up_to", n),
    };
    params
        .add_optional("flat_amount", optional_int64(&field("flat_amount")))
        .add_optional("flat_amount_decimal", optional_float64(&field("flat_amount_decimal")))
        .add_optional("unit_amount", optional_int64(&field("unit_amount")))
        .add_optional("unit_amount_decimal", optional_float64(&field("unit_amount_decimal")))
}

/// Recurring settings as `map(string)`. Keys the configuration never set
/// are left out, so Stripe's defaults (interval_count 1, licensed usage)
/// don't show up as drift. With nothing configured, as after an import,
/// every known key is kept.
fn flatten_recurring(recurring: &Recurring, configured: &HashMap<String, String>) -> HashMap<String, String> {
    let all = [
        ("interval", recurring.interval.clone()),
        ("interval_count", recurring.interval_count.to_string()),
        ("usage_type", recurring.usage_type.clone()),
        ("aggregate_usage", recurring.aggregate_usage.clone().unwrap_or_default()),
    ];
    all.into_iter()
        .filter(|(k, v)| !v.is_empty() && (configured.is_empty() || configured.contains_key(*k)))
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

/// Stripe echoes `*_decimal` next to the integer amounts; the decimal is
/// kept only when no integer amount exists
fn flatten_tier(tier: &PriceTier) -> Dynamic {
    let decimal_unless = |amount: Option<i64>, decimal: &Option<String>| match amount {
        Some(_) => None,
        None => parse_decimal(decimal.as_deref()),
    };

    Dynamic::Map(HashMap::from([
        ("up_to".to_string(), Dynamic::from(tier.up_to.unwrap_or(0))),
        ("flat_amount".to_string(), Dynamic::from(tier.flat_amount)),
        (
            "flat_amount_decimal".to_string(),
            Dynamic::from(decimal_unless(tier.flat_amount, &tier.flat_amount_decimal)),
        ),
        ("unit_amount".to_string(), Dynamic::from(tier.unit_amount)),
        (
            "unit_amount_decimal".to_string(),
            Dynamic::from(decimal_unless(tier.unit_amount, &tier.unit_amount_decimal)),
        ),
    ]))
}

fn flatten_transform_quantity(price: &Price) -> Dynamic {
    match &price.transform_quantity {
        Some(tq) => Dynamic::List(vec![Dynamic::Map(HashMap::from([
            ("divide_by".to_string(), Dynamic::from(tq.divide_by)),
            ("round".to_string(), Dynamic::from(tq.round.clone())),
        ]))]),
        None => Dynamic::Null,
    }
}

fn parse_decimal(value: Option<&str>) -> Option<f64> {
    value.and_then(|s| s.parse().ok())
}
