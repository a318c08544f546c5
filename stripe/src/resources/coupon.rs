//! stripe_coupon
//!
//! Only `name` and `metadata` can change after creation.

use super::{
    non_empty, non_empty_list, non_empty_map, rfc3339_from_unix, unix_from_rfc3339,
    update_metadata, StripeResource,
};
use crate::api::{Client, FormParams};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::{conflicting, NumberRange, StringOneOf, StringPattern};
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue, Schema,
    SchemaBuilder,
};

#[derive(Default)]
pub struct CouponResource;

#[async_trait]
impl StripeResource for CouponResource {
    fn type_name(&self) -> &'static str {
        "stripe_coupon"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Coupons apply a discount to invoices, checkout sessions or subscriptions")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("coupon_id", AttributeType::String)
                    .description("Code identifying the coupon; generated when left blank")
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name displayed to customers on invoices or receipts")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("amount_off", AttributeType::Number)
                    .description("Amount in the coupon's currency taken off the subtotal")
                    .optional()
                    .validator(NumberRange::at_least(1.0))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("currency", AttributeType::String)
                    .description("Currency of amount_off")
                    .optional()
                    .validator(StringPattern::new("^[a-z]{3}$", "a lowercase ISO currency code"))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("percent_off", AttributeType::Number)
                    .description("Percent taken off the subtotal for the duration of the coupon")
                    .optional()
                    .validator(NumberRange::between(0.0, 100.0))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("duration", AttributeType::String)
                    .description("How long the discount applies: once, repeating or forever")
                    .default(StaticDefault::string("once"))
                    .validator(StringOneOf::new(&["once", "repeating", "forever"]))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("duration_in_months", AttributeType::Number)
                    .description("Number of months a repeating coupon applies")
                    .optional()
                    .validator(NumberRange::at_least(1.0))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("max_redemptions", AttributeType::Number)
                    .description("Total redemptions allowed across all customers")
                    .optional()
                    .validator(NumberRange::at_least(1.0))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("redeem_by", AttributeType::String)
                    .description("RFC3339 date after which the coupon can no longer be redeemed")
                    .optional()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("times_redeemed", AttributeType::Number)
                    .description("Number of times the coupon has been applied")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("applies_to", AttributeType::string_list())
                    .description("Product IDs the coupon is restricted to")
                    .optional()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("metadata", AttributeType::string_map())
                    .description("Set of key-value pairs attached to the object")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("valid", AttributeType::Bool)
                    .description("Whether the coupon can still be applied")
                    .computed()
                    .build(),
            )
            .build()
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diags: Vec<Diagnostic> = [
            conflicting(config, "amount_off", "percent_off"),
            conflicting(config, "currency", "percent_off"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let get = |name: &str| config.get(&AttributePath::new(name)).ok().cloned();

        if let Some(Dynamic::String(redeem_by)) = get("redeem_by") {
            if let Err(e) = unix_from_rfc3339(&redeem_by) {
                diags.push(
                    Diagnostic::error("Invalid redeem_by", e)
                        .with_attribute(AttributePath::new("redeem_by")),
                );
            }
        }

        let amount_off_set = get("amount_off").map_or(false, |v| !v.is_null());
        let currency_set = get("currency").map_or(false, |v| !v.is_null());
        if amount_off_set && !currency_set {
            diags.push(
                Diagnostic::error(
                    "Missing required argument",
                    "\"amount_off\": currency must be set alongside amount_off",
                )
                .with_attribute(AttributePath::new("currency")),
            );
        }

        diags
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new()
            .add_optional("id", d.optional_string("coupon_id"))
            .add_optional("name", d.optional_string("name"))
            .add_optional("amount_off", d.get_ok("amount_off").map(|_| d.extract_int64("amount_off")))
            .add_optional("currency", d.optional_string("currency"))
            .add_optional("percent_off", d.get_ok("percent_off").map(|_| d.extract_float64("percent_off")))
            .add_optional("duration", d.optional_string("duration"))
            .add_optional(
                "duration_in_months",
                d.get_ok("duration_in_months").map(|_| d.extract_int64("duration_in_months")),
            )
            .add_optional(
                "max_redemptions",
                d.get_ok("max_redemptions").map(|_| d.extract_int64("max_redemptions")),
            );

        if let Some(redeem_by) = d.optional_string("redeem_by") {
            match unix_from_rfc3339(&redeem_by) {
                Ok(seconds) => params = params.add("redeem_by", seconds),
                Err(e) => {
                    return vec![Diagnostic::error("Invalid redeem_by", e)
                        .with_attribute(AttributePath::new("redeem_by"))]
                }
            }
        }
        if d.get_ok("applies_to").is_some() {
            params = params.add_list("applies_to[products]", &d.extract_string_list("applies_to"));
        }
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.coupons().create(ctx, &params).await {
            Ok(coupon) => d.set_id(&coupon.id),
            Err(e) => return vec![api_error("create coupon", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let coupon = match client.coupons().get(ctx, &d.id()).await {
            Ok(coupon) => coupon,
            Err(e) => return vec![api_error("read coupon", e)],
        };

        let applies_to = coupon.applies_to.map(|a| a.products).unwrap_or_default();
        let redeem_by = coupon.redeem_by.filter(|t| *t != 0).map(rfc3339_from_unix);

        call_set([
            d.set("coupon_id", coupon.id),
            d.set("name", non_empty(coupon.name)),
            d.set("amount_off", coupon.amount_off),
            d.set("currency", non_empty(coupon.currency)),
            d.set("percent_off", coupon.percent_off),
            d.set("duration", coupon.duration),
            d.set("duration_in_months", coupon.duration_in_months),
            d.set("max_redemptions", coupon.max_redemptions),
            d.set("redeem_by", redeem_by),
            d.set("times_redeemed", coupon.times_redeemed),
            d.set("applies_to", non_empty_list(applies_to)),
            d.set("metadata", non_empty_map(coupon.metadata)),
            d.set("valid", coupon.valid),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        if d.has_change("name") {
            params = params.add("name", d.extract_string("name"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.coupons().update(ctx, &d.id(), &params).await {
                return vec![api_error("update coupon", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        if let Err(e) = client.coupons().delete(ctx, &d.id()).await {
            return vec![api_error("delete coupon", e)];
        }
        d.set_id("");
        vec![]
    }
}
