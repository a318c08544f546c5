//! stripe_payment_link
//!
//! Stripe has no delete for payment links: destroying one deactivates its
//! URL and drops it from state. Line items cannot be edited by price, so
//! changing them recreates the link.

use super::{
    non_empty, non_empty_list, non_empty_map, unless_default, update_metadata, StripeResource,
};
use crate::api::payment_links::{AfterCompletion, AutomaticTax, LineItem, PaymentLink};
use crate::api::{Client, FormParams};
use crate::convert::{to_bool, to_int, to_map, to_map_list, to_string};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::{ListLength, NumberRange, StringOneOf};
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue, Schema,
    SchemaBuilder,
};

const DEFAULT_MAXIMUM: i64 = 99;
const DEFAULT_MINIMUM: i64 = 0;

#[derive(Default)]
pub struct PaymentLinkResource;

#[async_trait]
impl StripeResource for PaymentLinkResource {
    fn type_name(&self) -> &'static str {
        "stripe_payment_link"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Shareable URLs that open a hosted checkout page")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier for the object")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("url", AttributeType::String)
                    .description("Public URL customers visit to pay")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description(
                        "Whether the URL accepts payments; inactive links show inactive_message",
                    )
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "line_items",
                    AttributeType::object_list(&[
                        ("price", AttributeType::String),
                        ("quantity", AttributeType::Number),
                        (
                            "adjustable_quantity",
                            AttributeType::object_list(&[
                                ("enabled", AttributeType::Bool),
                                ("maximum", AttributeType::Number),
                                ("minimum", AttributeType::Number),
                            ]),
                        ),
                    ]),
                )
                .description(
                    "Prices being sold, up to 20; an adjustable quantity defaults to \
                     a 0 to 99 range",
                )
                .required()
                .validator(ListLength::between(1, 20))
                .requires_replace()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "after_completion",
                    AttributeType::object_list(&[
                        ("type", AttributeType::String),
                        ("custom_message", AttributeType::String),
                        ("url", AttributeType::String),
                    ]),
                )
                .description(
                    "What happens after payment: redirect to url, or hosted_confirmation \
                     showing custom_message",
                )
                .optional()
                .computed()
                .validator(ListLength::at_most(1))
                .build(),
            )
            .attribute(
                AttributeBuilder::new("allow_promotion_codes", AttributeType::Bool)
                    .description("Whether customers can redeem promotion codes")
                    .default(StaticDefault::bool(false))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("application_fee_amount", AttributeType::Number)
                    .description("Fee transferred to the application owner; one-time prices only")
                    .optional()
                    .validator(NumberRange::at_least(0.0))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("application_fee_percent", AttributeType::Number)
                    .description(
                        "Share of each subscription invoice transferred to the application owner",
                    )
                    .optional()
                    .validator(NumberRange::between(0.0, 100.0))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "automatic_tax",
                    AttributeType::object_list(&[
                        ("enabled", AttributeType::Bool),
                        (
                            "liability",
                            AttributeType::object_list(&[
                                ("type", AttributeType::String),
                                ("account", AttributeType::String),
                            ]),
                        ),
                    ]),
                )
                .description("Automatic tax calculation from the customer's location")
                .optional()
                .computed()
                .validator(ListLength::at_most(1))
                .build(),
            )
            .attribute(
                AttributeBuilder::new("billing_address_collection", AttributeType::String)
                    .description("Whether Checkout collects the billing address: auto or required")
                    .default(StaticDefault::string("auto"))
                    .validator(StringOneOf::new(&["auto", "required"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("currency", AttributeType::String)
                    .description(
                        "Three-letter ISO currency code; taken from the prices when left out",
                    )
                    .optional()
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("customer_creation", AttributeType::String)
                    .description("When checkout creates a Customer: always or if_required")
                    .optional()
                    .computed()
                    .validator(StringOneOf::new(&["always", "if_required"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("inactive_message", AttributeType::String)
                    .description("Message shown when the link is no longer active")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("on_behalf_of", AttributeType::String)
                    .description("Connected account the payments are settled for")
                    .optional()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("payment_method_collection", AttributeType::String)
                    .description("always, or if_required to skip collection when nothing is due")
                    .optional()
                    .computed()
                    .validator(StringOneOf::new(&["always", "if_required"]))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("payment_method_types", AttributeType::string_list())
                    .description(
                        "Allowed payment method types; Stripe picks from the dashboard \
                         settings when empty",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("submit_type", AttributeType::String)
                    .description("Wording of the pay button: auto, book, donate or pay")
                    .optional()
                    .computed()
                    .validator(StringOneOf::new(&["auto", "book", "donate", "pay"]))
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

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let value = |path: &AttributePath| config.get(path).cloned().unwrap_or(Dynamic::Null);
        let mut diags = Vec::new();

        let after = AttributePath::new("after_completion").index(0);
        match value(&after.clone().attribute("type")) {
            Dynamic::String(t) if t == "redirect" => {
                if value(&after.clone().attribute("url")).is_null() {
                    diags.push(
                        Diagnostic::error(
                            "Missing redirect URL",
                            "after_completion of type redirect needs url",
                        )
                        .with_attribute(after.attribute("url")),
                    );
                }
            }
            Dynamic::String(t) if t != "hosted_confirmation" => {
                diags.push(
                    Diagnostic::error(
                        "Invalid value for after_completion.type",
                        format!("expected one of [redirect, hosted_confirmation], got '{}'", t),
                    )
                    .with_attribute(after.attribute("type")),
                );
            }
            _ => {}
        }

        for (i, item) in to_map_list(&value(&AttributePath::new("line_items"))).iter().enumerate() {
            let adjustable = to_map(item.get("adjustable_quantity").unwrap_or(&Dynamic::Null));
            if let (Some(Dynamic::Number(min)), Some(Dynamic::Number(max))) =
                (adjustable.get("minimum"), adjustable.get("maximum"))
            {
                if min > max {
                    diags.push(
                        Diagnostic::error(
                            "Invalid adjustable quantity",
                            format!("minimum {} is above maximum {}", min, max),
                        )
                        .with_attribute(
                            AttributePath::new("line_items")
                                .index(i as i64)
                                .attribute("adjustable_quantity"),
                        ),
                    );
                }
            }
        }

        diags
    }

    async fn create(
        &self,
        ctx: &Context,
        client: &Client,
        d: &mut ResourceData,
    ) -> Vec<Diagnostic> {
        let mut params = line_item_params(&d.extract_map_list("line_items"))
            .add_optional("allow_promotion_codes", d.get_ok("allow_promotion_codes").map(|_| true))
            .add_optional(
                "application_fee_amount",
                d.get_ok("application_fee_amount")
                    .map(|_| d.extract_int64("application_fee_amount")),
            )
            .add_optional(
                "application_fee_percent",
                d.get_ok("application_fee_percent")
                    .map(|_| d.extract_float64("application_fee_percent")),
            )
            .add_optional(
                "billing_address_collection",
                d.optional_string("billing_address_collection"),
            )
            .add_optional("currency", d.optional_string("currency"))
            .add_optional("customer_creation", d.optional_string("customer_creation"))
            .add_optional("inactive_message", d.optional_string("inactive_message"))
            .add_optional("on_behalf_of", d.optional_string("on_behalf_of"))
            .add_optional(
                "payment_method_collection",
                d.optional_string("payment_method_collection"),
            )
            .add_optional("submit_type", d.optional_string("submit_type"));
        if d.get_ok("after_completion").is_some() {
            params = params.nested(
                "after_completion",
                after_completion_params(&d.extract_map("after_completion")),
            );
        }
        if d.get_ok("automatic_tax").is_some() {
            params = params.nested(
                "automatic_tax",
                automatic_tax_params(&d.extract_map("automatic_tax")),
            );
        }
        if d.get_ok("payment_method_types").is_some() {
            params = params.add_list(
                "payment_method_types",
                &d.extract_string_list("payment_method_types"),
            );
        }
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.payment_links().create(ctx, &params).await {
            Ok(link) => d.set_id(&link.id),
            Err(e) => return vec![api_error("create payment link", e)],
        }

        // links are always created active
        if !d.extract_bool("active") {
            if let Err(e) = client.payment_links().deactivate(ctx, &d.id()).await {
                return vec![api_error("deactivate payment link", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let link = match client.payment_links().get(ctx, &d.id()).await {
            Ok(link) => link,
            Err(e) => return vec![api_error("read payment link", e)],
        };

        let line_items = flatten_line_items(&link, &d.extract_map_list("line_items"));
        let after_completion = link
            .after_completion
            .as_ref()
            .map_or(Dynamic::Null, flatten_after_completion);
        let automatic_tax = link
            .automatic_tax
            .as_ref()
            .map_or(Dynamic::Null, flatten_automatic_tax);

        call_set([
            d.set("url", link.url),
            d.set("active", link.active),
            d.set("line_items", line_items),
            d.set("after_completion", after_completion),
            d.set("allow_promotion_codes", link.allow_promotion_codes),
            d.set("application_fee_amount", link.application_fee_amount),
            d.set("application_fee_percent", link.application_fee_percent),
            d.set("automatic_tax", automatic_tax),
            d.set("billing_address_collection", non_empty(link.billing_address_collection)),
            d.set("currency", non_empty(link.currency)),
            d.set("customer_creation", non_empty(link.customer_creation)),
            d.set("inactive_message", non_empty(link.inactive_message)),
            d.set("on_behalf_of", link.on_behalf_of),
            d.set("payment_method_collection", non_empty(link.payment_method_collection)),
            d.set(
                "payment_method_types",
                link.payment_method_types.and_then(non_empty_list),
            ),
            d.set("submit_type", non_empty(link.submit_type)),
            d.set("livemode", link.livemode),
            d.set("metadata", non_empty_map(link.metadata)),
        ])
    }

    async fn update(
        &self,
        ctx: &Context,
        client: &Client,
        d: &mut ResourceData,
    ) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        for name in ["active", "allow_promotion_codes"] {
            if d.has_change(name) {
                params = params.add(name, d.extract_bool(name));
            }
        }
        // an empty string clears the value remotely
        for name in [
            "billing_address_collection",
            "customer_creation",
            "inactive_message",
            "payment_method_collection",
        ] {
            if d.has_change(name) {
                params = params.add(name, d.extract_string(name));
            }
        }
        if d.has_change("after_completion") && d.get_ok("after_completion").is_some() {
            params = params.nested(
                "after_completion",
                after_completion_params(&d.extract_map("after_completion")),
            );
        }
        if d.has_change("automatic_tax") && d.get_ok("automatic_tax").is_some() {
            params = params.nested(
                "automatic_tax",
                automatic_tax_params(&d.extract_map("automatic_tax")),
            );
        }
        if d.has_change("payment_method_types") {
            params = params.add_list(
                "payment_method_types",
                &d.extract_string_list("payment_method_types"),
            );
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.payment_links().update(ctx, &d.id(), &params).await {
                return vec![api_error("update payment link", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(
        &self,
        ctx: &Context,
        client: &Client,
        d: &mut ResourceData,
    ) -> Vec<Diagnostic> {
        let id = d.id();
        tracing::warn!(
            "Payment links cannot be deleted; deactivating {} and removing it from state",
            id
        );
        match client.payment_links().deactivate(ctx, &id).await {
            Ok(_) => {
                d.set_id("");
                vec![]
            }
            Err(e) => vec![api_error("deactivate payment link", e)],
        }
    }
}

fn line_item_params(items: &[HashMap<String, Dynamic>]) -> FormParams {
    let mut params = FormParams::new();
    for (i, item) in items.iter().enumerate() {
        let field = |name: &str| item.get(name).cloned().unwrap_or(Dynamic::Null);
        let prefix = format!("line_items[{}]", i);
        params = params
            .add(format!("{}[price]", prefix), to_string(&field("price")))
            .add(format!("{}[quantity]", prefix), to_int(&field("quantity")));

        let adjustable = to_map(&field("adjustable_quantity"));
        if adjustable.is_empty() {
            continue;
        }
        let get = |name: &str| adjustable.get(name).cloned().unwrap_or(Dynamic::Null);
        params = params
            .add(
                format!("{}[adjustable_quantity][enabled]", prefix),
                to_bool(&get("enabled")),
            )
            .add_optional(
                format!("{}[adjustable_quantity][maximum]", prefix),
                Some(get("maximum")).filter(|v| !v.is_null()).map(|v| to_int(&v)),
            )
            .add_optional(
                format!("{}[adjustable_quantity][minimum]", prefix),
                Some(get("minimum")).filter(|v| !v.is_null()).map(|v| to_int(&v)),
            );
    }
    params
}

fn after_completion_params(block: &HashMap<String, Dynamic>) -> FormParams {
    let get = |name: &str| block.get(name).cloned().unwrap_or(Dynamic::Null);
    let completion_type = to_string(&get("type"));
    let params = FormParams::new().add("type", &completion_type);
    if completion_type == "redirect" {
        params.add("redirect[url]", to_string(&get("url")))
    } else {
        params.add_optional(
            "hosted_confirmation[custom_message]",
            non_empty(Some(to_string(&get("custom_message")))),
        )
    }
}

fn automatic_tax_params(block: &HashMap<String, Dynamic>) -> FormParams {
    let params = FormParams::new().add(
        "enabled",
        to_bool(block.get("enabled").unwrap_or(&Dynamic::Null)),
    );
    let liability = to_map(block.get("liability").unwrap_or(&Dynamic::Null));
    if liability.is_empty() {
        return params;
    }
    let get = |name: &str| liability.get(name).cloned().unwrap_or(Dynamic::Null);
    params
        .add("liability[type]", to_string(&get("type")))
        .add_optional("liability[account]", non_empty(Some(to_string(&get("account")))))
}

/// Line items in remote order. Quantity bounds equal to Stripe's defaults
/// stay null when the matching configured item left them out.
fn flatten_line_items(link: &PaymentLink, configured: &[HashMap<String, Dynamic>]) -> Dynamic {
    let Some(items) = &link.line_items else {
        return Dynamic::Null;
    };

    let flattened: Vec<Dynamic> = items
        .data
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let configured_bounds = configured
                .get(i)
                .map(|c| to_map(c.get("adjustable_quantity").unwrap_or(&Dynamic::Null)))
                .unwrap_or_default();
            flatten_line_item(item, &configured_bounds)
        })
        .collect();
    Dynamic::List(flattened)
}

fn flatten_line_item(item: &LineItem, configured_bounds: &HashMap<String, Dynamic>) -> Dynamic {
    let configured = |name: &str| configured_bounds.get(name).cloned().unwrap_or(Dynamic::Null);
    let adjustable = match &item.adjustable_quantity {
        Some(a) => Dynamic::List(vec![Dynamic::Map(HashMap::from([
            ("enabled".to_string(), Dynamic::from(a.enabled)),
            (
                "maximum".to_string(),
                unless_default(a.maximum.into(), &configured("maximum"), DEFAULT_MAXIMUM.into()),
            ),
            (
                "minimum".to_string(),
                unless_default(a.minimum.into(), &configured("minimum"), DEFAULT_MINIMUM.into()),
            ),
        ]))]),
        None => Dynamic::Null,
    };

    Dynamic::Map(HashMap::from([
        ("price".to_string(), Dynamic::from(item.price.clone())),
        ("quantity".to_string(), Dynamic::from(item.quantity)),
        ("adjustable_quantity".to_string(), adjustable),
    ]))
}

fn flatten_after_completion(after: &AfterCompletion) -> Dynamic {
    let custom_message = after
        .hosted_confirmation
        .as_ref()
        .and_then(|h| non_empty(h.custom_message.clone()));
    let url = after.redirect.as_ref().map(|r| r.url.clone());
    Dynamic::List(vec![Dynamic::Map(HashMap::from([
        ("type".to_string(), Dynamic::from(after.completion_type.clone())),
        ("custom_message".to_string(), Dynamic::from(custom_message)),
        ("url".to_string(), Dynamic::from(url)),
    ]))])
}

fn flatten_automatic_tax(tax: &AutomaticTax) -> Dynamic {
    let liability = match &tax.liability {
        Some(l) => Dynamic::List(vec![Dynamic::Map(HashMap::from([
            ("type".to_string(), Dynamic::from(l.liability_type.clone())),
            ("account".to_string(), Dynamic::from(l.account.clone())),
        ]))]),
        None => Dynamic::Null,
    };
    Dynamic::List(vec![Dynamic::Map(HashMap::from([
        ("enabled".to_string(), Dynamic::from(tax.enabled)),
        ("liability".to_string(), liability),
    ]))])
}
