//! stripe_meter

use super::StripeResource;
use crate::api::billing_meters::{CustomerMapping, Meter, ValueSettings};
use crate::api::{Client, FormParams};
use crate::convert::{to_map_list, to_string};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::{ListLength, StringOneOf};
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue, Schema,
    SchemaBuilder,
};

const FORMULAS: &[&str] = &["count", "sum", "last"];
const DEFAULT_CUSTOMER_KEY: &str = "stripe_customer_id";
const DEFAULT_VALUE_KEY: &str = "value";

#[derive(Default)]
pub struct MeterResource;

#[async_trait]
impl StripeResource for MeterResource {
    fn type_name(&self) -> &'static str {
        "stripe_meter"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Billing meters aggregating usage events")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("display_name", AttributeType::String)
                    .description("The meter's name")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("event_name", AttributeType::String)
                    .description("Name of the meter events recorded against this meter")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "default_aggregation",
                    AttributeType::object_list(&[("formula", AttributeType::String)]),
                )
                .description("How events are aggregated: count, sum or last")
                .required()
                .validator(ListLength::between(1, 1))
                .requires_replace()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "customer_mapping",
                    AttributeType::object_list(&[
                        ("event_payload_key", AttributeType::String),
                        ("type", AttributeType::String),
                    ]),
                )
                .description("How a meter event maps to a customer")
                .optional()
                .validator(ListLength::at_most(1))
                .requires_replace()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("event_time_window", AttributeType::String)
                    .description("Pre-aggregation window for events")
                    .optional()
                    .validator(StringOneOf::new(&["day", "hour"]))
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "value_settings",
                    AttributeType::object_list(&[("event_payload_key", AttributeType::String)]),
                )
                .description("Which payload key holds the event's value")
                .optional()
                .validator(ListLength::at_most(1))
                .requires_replace()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::String)
                    .description("active or inactive")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .build()
    }

    fn validate(&self, config: &DynamicValue) -> Vec<Diagnostic> {
        let mut diags = vec![];
        let blocks = |name: &str| {
            to_map_list(
                &config
                    .get(&AttributePath::new(name))
                    .cloned()
                    .unwrap_or(Dynamic::Null),
            )
        };

        for (i, block) in blocks("default_aggregation").iter().enumerate() {
            if let Some(Dynamic::String(formula)) = block.get("formula") {
                if !FORMULAS.contains(&formula.as_str()) {
                    diags.push(
                        Diagnostic::error(
                            "Invalid value for default_aggregation.formula",
                            format!("expected one of {:?}, got {:?}", FORMULAS, formula),
                        )
                        .with_attribute(
                            AttributePath::new("default_aggregation")
                                .index(i as i64)
                                .attribute("formula"),
                        ),
                    );
                }
            }
        }

        for (i, block) in blocks("customer_mapping").iter().enumerate() {
            if let Some(Dynamic::String(kind)) = block.get("type") {
                if kind != "by_id" {
                    diags.push(
                        Diagnostic::error(
                            "Invalid value for customer_mapping.type",
                            format!("expected \"by_id\", got {:?}", kind),
                        )
                        .with_attribute(
                            AttributePath::new("customer_mapping")
                                .index(i as i64)
                                .attribute("type"),
                        ),
                    );
                }
            }
        }

        diags
    }

    async fn create(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let mut params = FormParams::new()
            .add("display_name", d.extract_string("display_name"))
            .add("event_name", d.extract_string("event_name"))
            .add_optional("event_time_window", d.optional_string("event_time_window"));

        if let Some(block) = d.extract_map_list("default_aggregation").first() {
            params = params.nested("default_aggregation", block_params(block, &["formula"]));
        }
        if let Some(block) = d.extract_map_list("customer_mapping").first() {
            params = params.nested(
                "customer_mapping",
                block_params(block, &["event_payload_key", "type"]),
            );
        }
        if let Some(block) = d.extract_map_list("value_settings").first() {
            params = params.nested("value_settings", block_params(block, &["event_payload_key"]));
        }

        match client.billing_meters().create(ctx, &params).await {
            Ok(meter) => d.set_id(&meter.id),
            Err(e) => return vec![api_error("create meter", e)],
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let meter = match client.billing_meters().get(ctx, &d.id()).await {
            Ok(meter) => meter,
            Err(e) => return vec![api_error("read meter", e)],
        };

        let customer_mapping = tracked_customer_mapping(&meter, d.get_ok("customer_mapping").is_some());
        let value_settings = tracked_value_settings(&meter, d.get_ok("value_settings").is_some());

        call_set([
            d.set("display_name", meter.display_name),
            d.set("event_name", meter.event_name),
            d.set("event_time_window", meter.event_time_window),
            d.set("status", meter.status),
            d.set(
                "default_aggregation",
                meter.default_aggregation.map(|a| single_block(&[("formula", a.formula)])),
            ),
            d.set("customer_mapping", customer_mapping),
            d.set("value_settings", value_settings),
        ])
    }

    async fn update(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        if d.has_change("display_name") {
            let params = FormParams::new().add("display_name", d.extract_string("display_name"));
            if let Err(e) = client.billing_meters().update(ctx, &d.id(), &params).await {
                return vec![api_error("update meter", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        if let Err(e) = client.billing_meters().deactivate(ctx, &d.id()).await {
            return vec![api_error("deactivate meter", e)];
        }
        d.set_id("");
        vec![]
    }
}

fn block_params(block: &HashMap<String, Dynamic>, keys: &[&str]) -> FormParams {
    keys.iter().fold(FormParams::new(), |params, key| {
        let value = block.get(*key).map(to_string).unwrap_or_default();
        params.add_optional(*key, Some(value).filter(|v| !v.is_empty()))
    })
}

fn single_block(fields: &[(&str, String)]) -> Dynamic {
    Dynamic::List(vec![Dynamic::Map(
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), Dynamic::String(v.clone())))
            .collect(),
    )])
}

/// Stripe fills in a by_id mapping on every meter; only keep it when
/// configured or customised
fn tracked_customer_mapping(meter: &Meter, configured: bool) -> Option<Dynamic> {
    meter
        .customer_mapping
        .as_ref()
        .filter(|m: &&CustomerMapping| configured || m.event_payload_key != DEFAULT_CUSTOMER_KEY)
        .map(|m| {
            single_block(&[
                ("event_payload_key", m.event_payload_key.clone()),
                ("type", m.mapping_type.clone()),
            ])
        })
}

fn tracked_value_settings(meter: &Meter, configured: bool) -> Option<Dynamic> {
    meter
        .value_settings
        .as_ref()
        .filter(|v: &&ValueSettings| configured || v.event_payload_key != DEFAULT_VALUE_KEY)
        .map(|v| single_block(&[("event_payload_key", v.event_payload_key.clone())]))
}
