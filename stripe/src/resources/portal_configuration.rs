//! stripe_portal_configuration
//!
//! Customer portal configurations cannot be deleted through the API.
//! Destroying one only forgets it; the configuration stays in Stripe.
//!
//! Stripe reports every portal feature, configured or not. Disabled
//! features and Stripe's default modes are kept out of state unless the
//! configuration names them.

use super::{
    non_empty, non_empty_list, non_empty_map, rfc3339_from_unix, unless_default, update_metadata,
    StripeResource,
};
use crate::api::billing_portal::{
    BusinessProfile, CustomerUpdate, Features, SubscriptionCancel, SubscriptionUpdate, Toggle,
};
use crate::api::{Client, FormParams};
use crate::convert::{to_bool, to_map, to_map_list, to_string, to_string_list};
use crate::diagnostics::{api_error, call_set};
use crate::resource_data::ResourceData;
use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::defaults::StaticDefault;
use tfplug::plan_modifier::UseStateForUnknown;
use tfplug::validator::ListLength;
use tfplug::{
    AttributeBuilder, AttributePath, AttributeType, Diagnostic, Dynamic, DynamicValue, Schema,
    SchemaBuilder,
};

const CUSTOMER_UPDATES: [&str; 6] = ["email", "address", "shipping", "phone", "tax_id", "name"];
const CANCELLATION_REASONS: [&str; 8] = [
    "too_expensive",
    "missing_features",
    "switched_service",
    "unused",
    "customer_service",
    "too_complex",
    "low_quality",
    "other",
];
const CANCEL_MODES: [&str; 2] = ["immediately", "at_period_end"];
const CANCEL_PRORATIONS: [&str; 2] = ["none", "create_prorations"];
const SUBSCRIPTION_UPDATES: [&str; 3] = ["price", "quantity", "promotion_code"];
const UPDATE_PRORATIONS: [&str; 3] = ["none", "create_prorations", "always_invoice"];

const TOGGLES: [&str; 3] = ["invoice_history", "payment_method_update", "subscription_pause"];

#[derive(Default)]
pub struct PortalConfigurationResource;

fn toggle_type() -> AttributeType {
    AttributeType::object_list(&[("enabled", AttributeType::Bool)])
}

#[async_trait]
impl StripeResource for PortalConfigurationResource {
    fn type_name(&self) -> &'static str {
        "stripe_portal_configuration"
    }

    fn schema(&self) -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Behavior of the Stripe-hosted customer portal")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("Unique identifier for the object")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .description("Whether the configuration can be used for new portal sessions")
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "business_profile",
                    AttributeType::object_list(&[
                        ("headline", AttributeType::String),
                        ("privacy_policy_url", AttributeType::String),
                        ("terms_of_service_url", AttributeType::String),
                    ]),
                )
                .description("Business information shown to customers in the portal")
                .required()
                .validator(ListLength::between(1, 1))
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "features",
                    AttributeType::object_list(&[
                        (
                            "customer_update",
                            AttributeType::object_list(&[
                                ("enabled", AttributeType::Bool),
                                ("allowed_updates", AttributeType::string_list()),
                            ]),
                        ),
                        ("invoice_history", toggle_type()),
                        ("payment_method_update", toggle_type()),
                        (
                            "subscription_cancel",
                            AttributeType::object_list(&[
                                ("enabled", AttributeType::Bool),
                                (
                                    "cancellation_reason",
                                    AttributeType::object_list(&[
                                        ("enabled", AttributeType::Bool),
                                        ("options", AttributeType::string_list()),
                                    ]),
                                ),
                                ("mode", AttributeType::String),
                                ("proration_behavior", AttributeType::String),
                            ]),
                        ),
                        ("subscription_pause", toggle_type()),
                        (
                            "subscription_update",
                            AttributeType::object_list(&[
                                ("enabled", AttributeType::Bool),
                                ("default_allowed_updates", AttributeType::string_list()),
                                (
                                    "products",
                                    AttributeType::object_list(&[
                                        ("product", AttributeType::String),
                                        ("prices", AttributeType::string_list()),
                                    ]),
                                ),
                                ("proration_behavior", AttributeType::String),
                            ]),
                        ),
                    ]),
                )
                .description("Portal features offered to customers")
                .required()
                .validator(ListLength::between(1, 1))
                .build(),
            )
            .attribute(
                AttributeBuilder::new("default_return_url", AttributeType::String)
                    .description("Where customers go when they leave the portal")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("is_default", AttributeType::Bool)
                    .description("Whether this is the account's default configuration")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("application", AttributeType::String)
                    .description("Connect application that created the configuration")
                    .computed()
                    .plan_modifier(UseStateForUnknown)
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
                AttributeBuilder::new("updated", AttributeType::String)
                    .description("RFC3339 time of the last change")
                    .computed()
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
        let features = AttributePath::new("features").index(0);
        let cancel = features.clone().attribute("subscription_cancel").index(0);
        let update = features.clone().attribute("subscription_update").index(0);

        let checks = [
            (
                features
                    .attribute("customer_update")
                    .index(0)
                    .attribute("allowed_updates"),
                &CUSTOMER_UPDATES[..],
            ),
            (
                cancel
                    .clone()
                    .attribute("cancellation_reason")
                    .index(0)
                    .attribute("options"),
                &CANCELLATION_REASONS[..],
            ),
            (cancel.clone().attribute("mode"), &CANCEL_MODES[..]),
            (cancel.attribute("proration_behavior"), &CANCEL_PRORATIONS[..]),
            (
                update.clone().attribute("default_allowed_updates"),
                &SUBSCRIPTION_UPDATES[..],
            ),
            (update.attribute("proration_behavior"), &UPDATE_PRORATIONS[..]),
        ];

        checks
            .into_iter()
            .flat_map(|(path, allowed)| check_one_of(config, path, allowed))
            .collect()
    }

    async fn create(
        &self,
        ctx: &Context,
        client: &Client,
        d: &mut ResourceData,
    ) -> Vec<Diagnostic> {
        let mut params = FormParams::new()
            .nested(
                "business_profile",
                business_profile_params(&d.extract_map("business_profile")),
            )
            .nested("features", features_params(&d.extract_map("features")))
            .add_optional("default_return_url", d.optional_string("default_return_url"));
        if d.get_ok("metadata").is_some() {
            params = params.add_metadata(&d.extract_string_map("metadata"));
        }

        match client.billing_portal().create(ctx, &params).await {
            Ok(portal) => d.set_id(&portal.id),
            Err(e) => return vec![api_error("create portal configuration", e)],
        }

        // configurations are always created active
        if !d.extract_bool("active") {
            let params = FormParams::new().add("active", false);
            if let Err(e) = client.billing_portal().update(ctx, &d.id(), &params).await {
                return vec![api_error("deactivate portal configuration", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn read(&self, ctx: &Context, client: &Client, d: &mut ResourceData) -> Vec<Diagnostic> {
        let portal = match client.billing_portal().get(ctx, &d.id()).await {
            Ok(portal) => portal,
            Err(e) => return vec![api_error("read portal configuration", e)],
        };

        let features = flatten_features(&portal.features, &d.extract_map("features"));
        let business_profile = flatten_business_profile(&portal.business_profile);

        call_set([
            d.set("active", portal.active),
            d.set("business_profile", business_profile),
            d.set("features", features),
            d.set("default_return_url", non_empty(portal.default_return_url)),
            d.set("is_default", portal.is_default),
            d.set("application", portal.application),
            d.set("created", rfc3339_from_unix(portal.created)),
            d.set("updated", rfc3339_from_unix(portal.updated)),
            d.set("livemode", portal.livemode),
            d.set("metadata", non_empty_map(portal.metadata)),
        ])
    }

    async fn update(
        &self,
        ctx: &Context,
        client: &Client,
        d: &mut ResourceData,
    ) -> Vec<Diagnostic> {
        let mut params = FormParams::new();
        if d.has_change("active") {
            params = params.add("active", d.extract_bool("active"));
        }
        if d.has_change("business_profile") {
            params = params.nested(
                "business_profile",
                business_profile_params(&d.extract_map("business_profile")),
            );
        }
        if d.has_change("features") {
            params = params.nested("features", features_params(&d.extract_map("features")));
        }
        if d.has_change("default_return_url") {
            params = params.add("default_return_url", d.extract_string("default_return_url"));
        }
        params = update_metadata(d, params);

        if !params.is_empty() {
            if let Err(e) = client.billing_portal().update(ctx, &d.id(), &params).await {
                return vec![api_error("update portal configuration", e)];
            }
        }

        self.read(ctx, client, d).await
    }

    async fn delete(
        &self,
        _ctx: &Context,
        _client: &Client,
        d: &mut ResourceData,
    ) -> Vec<Diagnostic> {
        let id = d.id();
        tracing::warn!(
            "Portal configurations cannot be deleted; removing {} from state only",
            id
        );
        d.set_id("");
        vec![Diagnostic::warning(
            "Portal configuration not deleted",
            format!("{} was removed from state but still exists in Stripe", id),
        )]
    }
}

/// Every string at `path` (a string or a list of strings) must be in `allowed`
fn check_one_of(config: &DynamicValue, path: AttributePath, allowed: &[&str]) -> Vec<Diagnostic> {
    let values = match config.get(&path) {
        Ok(Dynamic::String(s)) => vec![s.clone()],
        Ok(value @ Dynamic::List(_)) => to_string_list(value),
        _ => return vec![],
    };

    values
        .into_iter()
        .filter(|v| !allowed.contains(&v.as_str()))
        .map(|v| {
            Diagnostic::error(
                format!("Invalid value for {}", path),
                format!("expected one of [{}], got '{}'", allowed.join(", "), v),
            )
            .with_attribute(path.clone())
        })
        .collect()
}

fn business_profile_params(profile: &HashMap<String, Dynamic>) -> FormParams {
    FormParams::new()
        .add_optional("headline", string_field(profile, "headline"))
        .add_optional("privacy_policy_url", string_field(profile, "privacy_policy_url"))
        .add_optional("terms_of_service_url", string_field(profile, "terms_of_service_url"))
}

fn features_params(features: &HashMap<String, Dynamic>) -> FormParams {
    let block = |name: &str| to_map(features.get(name).unwrap_or(&Dynamic::Null));
    let mut params = FormParams::new();

    let customer_update = block("customer_update");
    if !customer_update.is_empty() {
        params = params.nested(
            "customer_update",
            enabled_param(&customer_update).add_list(
                "allowed_updates",
                &list_field(&customer_update, "allowed_updates"),
            ),
        );
    }

    for name in TOGGLES {
        let toggle = block(name);
        if !toggle.is_empty() {
            params = params.nested(name, enabled_param(&toggle));
        }
    }

    let cancel = block("subscription_cancel");
    if !cancel.is_empty() {
        let mut inner = enabled_param(&cancel)
            .add_optional("mode", string_field(&cancel, "mode"))
            .add_optional("proration_behavior", string_field(&cancel, "proration_behavior"));
        let reason = to_map(cancel.get("cancellation_reason").unwrap_or(&Dynamic::Null));
        if !reason.is_empty() {
            inner = inner.nested(
                "cancellation_reason",
                enabled_param(&reason).add_list("options", &list_field(&reason, "options")),
            );
        }
        params = params.nested("subscription_cancel", inner);
    }

    let update = block("subscription_update");
    if !update.is_empty() {
        let mut inner = enabled_param(&update)
            .add_list(
                "default_allowed_updates",
                &list_field(&update, "default_allowed_updates"),
            )
            .add_optional("proration_behavior", string_field(&update, "proration_behavior"));
        let products = to_map_list(update.get("products").unwrap_or(&Dynamic::Null));
        for (i, product) in products.iter().enumerate() {
            inner = inner
                .add(
                    format!("products[{}][product]", i),
                    string_field(product, "product").unwrap_or_default(),
                )
                .add_list(
                    &format!("products[{}][prices]", i),
                    &list_field(product, "prices"),
                );
        }
        params = params.nested("subscription_update", inner);
    }

    params
}

fn enabled_param(block: &HashMap<String, Dynamic>) -> FormParams {
    FormParams::new().add(
        "enabled",
        to_bool(block.get("enabled").unwrap_or(&Dynamic::Null)),
    )
}

fn string_field(block: &HashMap<String, Dynamic>, name: &str) -> Option<String> {
    non_empty(Some(to_string(block.get(name).unwrap_or(&Dynamic::Null))))
}

fn list_field(block: &HashMap<String, Dynamic>, name: &str) -> Vec<String> {
    to_string_list(block.get(name).unwrap_or(&Dynamic::Null))
}

fn flatten_business_profile(profile: &BusinessProfile) -> Dynamic {
    Dynamic::List(vec![Dynamic::Map(HashMap::from([
        ("headline".to_string(), Dynamic::from(non_empty(profile.headline.clone()))),
        (
            "privacy_policy_url".to_string(),
            Dynamic::from(non_empty(profile.privacy_policy_url.clone())),
        ),
        (
            "terms_of_service_url".to_string(),
            Dynamic::from(non_empty(profile.terms_of_service_url.clone())),
        ),
    ]))])
}

/// `configured` is the features block from the plan or prior state
fn flatten_features(features: &Features, configured: &HashMap<String, Dynamic>) -> Dynamic {
    let configured_block = |name: &str| configured.get(name).cloned().unwrap_or(Dynamic::Null);

    let mut flattened = HashMap::from([
        (
            "customer_update".to_string(),
            unless_disabled(
                features.customer_update.as_ref().map(flatten_customer_update),
                features.customer_update.as_ref().is_some_and(|c| c.enabled),
                &configured_block("customer_update"),
            ),
        ),
        (
            "subscription_cancel".to_string(),
            unless_disabled(
                features
                    .subscription_cancel
                    .as_ref()
                    .map(|c| {
                        flatten_subscription_cancel(
                            c,
                            &to_map(&configured_block("subscription_cancel")),
                        )
                    }),
                features.subscription_cancel.as_ref().is_some_and(|c| c.enabled),
                &configured_block("subscription_cancel"),
            ),
        ),
        (
            "subscription_update".to_string(),
            unless_disabled(
                features
                    .subscription_update
                    .as_ref()
                    .map(|u| {
                        flatten_subscription_update(
                            u,
                            &to_map(&configured_block("subscription_update")),
                        )
                    }),
                features.subscription_update.as_ref().is_some_and(|u| u.enabled),
                &configured_block("subscription_update"),
            ),
        ),
    ]);

    let toggles: [(&str, &Option<Toggle>); 3] = [
        ("invoice_history", &features.invoice_history),
        ("payment_method_update", &features.payment_method_update),
        ("subscription_pause", &features.subscription_pause),
    ];
    for (name, toggle) in toggles {
        let block = toggle.as_ref().map(|t| {
            Dynamic::Map(HashMap::from([(
                "enabled".to_string(),
                Dynamic::from(t.enabled),
            )]))
        });
        let enabled = toggle.as_ref().is_some_and(|t| t.enabled);
        flattened.insert(
            name.to_string(),
            unless_disabled(block, enabled, &configured_block(name)),
        );
    }

    Dynamic::List(vec![Dynamic::Map(flattened)])
}

/// Single-block list, or null for a disabled feature the configuration
/// does not mention
fn unless_disabled(block: Option<Dynamic>, enabled: bool, configured: &Dynamic) -> Dynamic {
    match block {
        Some(block) if enabled || !configured.is_null() => Dynamic::List(vec![block]),
        _ => Dynamic::Null,
    }
}

fn flatten_customer_update(update: &CustomerUpdate) -> Dynamic {
    Dynamic::Map(HashMap::from([
        ("enabled".to_string(), Dynamic::from(update.enabled)),
        (
            "allowed_updates".to_string(),
            Dynamic::from(update.allowed_updates.clone()),
        ),
    ]))
}

fn flatten_subscription_cancel(
    cancel: &SubscriptionCancel,
    configured: &HashMap<String, Dynamic>,
) -> Dynamic {
    let configured_field = |name: &str| configured.get(name).cloned().unwrap_or(Dynamic::Null);
    let reason = cancel.cancellation_reason.as_ref().map(|r| {
        Dynamic::Map(HashMap::from([
            ("enabled".to_string(), Dynamic::from(r.enabled)),
            ("options".to_string(), Dynamic::from(r.options.clone())),
        ]))
    });
    let reason_enabled = cancel.cancellation_reason.as_ref().is_some_and(|r| r.enabled);

    Dynamic::Map(HashMap::from([
        ("enabled".to_string(), Dynamic::from(cancel.enabled)),
        (
            "cancellation_reason".to_string(),
            unless_disabled(reason, reason_enabled, &configured_field("cancellation_reason")),
        ),
        (
            "mode".to_string(),
            unless_default(
                cancel.mode.clone().into(),
                &configured_field("mode"),
                "at_period_end".into(),
            ),
        ),
        (
            "proration_behavior".to_string(),
            unless_default(
                cancel.proration_behavior.clone().into(),
                &configured_field("proration_behavior"),
                "none".into(),
            ),
        ),
    ]))
}

fn flatten_subscription_update(
    update: &SubscriptionUpdate,
    configured: &HashMap<String, Dynamic>,
) -> Dynamic {
    let products: Vec<Dynamic> = update
        .products
        .iter()
        .map(|p| {
            Dynamic::Map(HashMap::from([
                ("product".to_string(), Dynamic::from(p.product.clone())),
                ("prices".to_string(), Dynamic::from(p.prices.clone())),
            ]))
        })
        .collect();

    Dynamic::Map(HashMap::from([
        ("enabled".to_string(), Dynamic::from(update.enabled)),
        (
            "default_allowed_updates".to_string(),
            Dynamic::from(update.default_allowed_updates.clone()),
        ),
        ("products".to_string(), Dynamic::from(non_empty_list(products))),
        (
            "proration_behavior".to_string(),
            unless_default(
                update.proration_behavior.clone().into(),
                configured.get("proration_behavior").unwrap_or(&Dynamic::Null),
                "none".into(),
            ),
        ),
    ]))
}
