//! Resource change planning
//!
//! Mirrors what the plugin framework does before a resource ever sees the
//! plan: fill defaults, mark computed attributes unknown when they may
//! change, then run attribute plan modifiers.

use crate::defaults::apply_defaults;
use crate::schema::{PlanModifierRequest, Schema};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

/// Result of planning a single resource change
#[derive(Debug, Clone)]
pub struct PlannedChange {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Plan the transition from `prior_state` to the configuration-shaped
/// `proposed` value. A null `proposed` value plans a destroy.
pub fn plan_resource_change(
    schema: &Schema,
    prior_state: &DynamicValue,
    proposed: &DynamicValue,
) -> PlannedChange {
    if proposed.is_null() {
        return PlannedChange {
            planned_state: DynamicValue::null(),
            requires_replace: Vec::new(),
            diagnostics: Vec::new(),
        };
    }

    let config = proposed.clone();
    let creating = prior_state.is_null();

    let value_of = |dv: &DynamicValue, name: &str| {
        dv.get(&AttributePath::new(name))
            .cloned()
            .unwrap_or(Dynamic::Null)
    };

    // optional+computed values left out of the config keep what the provider
    // stored last time, as in Terraform's proposed new state
    let mut proposed_new = proposed.clone();
    if !creating {
        for attr in &schema.block.attributes {
            let inherits = attr.optional && attr.computed && attr.default.is_none();
            if inherits && value_of(&config, &attr.name).is_null() {
                let prior = value_of(prior_state, &attr.name);
                if let Err(e) = proposed_new.set(&AttributePath::new(&attr.name), prior) {
                    return PlannedChange {
                        planned_state: proposed_new,
                        requires_replace: Vec::new(),
                        diagnostics: vec![Diagnostic::error(
                            "Failed to plan attribute",
                            e.to_string(),
                        )
                        .with_attribute(AttributePath::new(&attr.name))],
                    };
                }
            }
        }
    }
    let mut planned = apply_defaults(schema, &proposed_new);

    // computed-only values are stable unless something configurable changed
    let changing = creating
        || schema
            .block
            .attributes
            .iter()
            .filter(|attr| attr.required || attr.optional)
            .any(|attr| value_of(&planned, &attr.name) != value_of(prior_state, &attr.name));

    let mut requires_replace = Vec::new();
    let mut diagnostics = Vec::new();

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let config_value = value_of(&config, &attr.name);
        let state_value = value_of(prior_state, &attr.name);
        let mut plan_value = value_of(&planned, &attr.name);

        if attr.provider_sets_value() && plan_value.is_null() {
            plan_value = if changing {
                Dynamic::Unknown
            } else {
                state_value.clone()
            };
        }

        for modifier in &attr.plan_modifiers {
            let response = modifier.modify(PlanModifierRequest {
                config_value: config_value.clone(),
                state_value: state_value.clone(),
                plan_value,
                path: path.clone(),
            });
            plan_value = response.plan_value;
            diagnostics.extend(response.diagnostics);
            if response.requires_replace && !requires_replace.contains(&path) {
                requires_replace.push(path.clone());
            }
        }

        if let Err(e) = planned.set(&path, plan_value) {
            diagnostics.push(
                Diagnostic::error("Failed to plan attribute", e.to_string())
                    .with_attribute(path),
            );
        }
    }

    PlannedChange {
        planned_state: planned,
        requires_replace,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::StaticDefault;
    use crate::plan_modifier::UseStateForUnknown;
    use crate::schema::{AttributeBuilder, AttributeType, SchemaBuilder};

    fn schema() -> Schema {
        SchemaBuilder::new()
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .computed()
                    .plan_modifier(UseStateForUnknown)
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("currency", AttributeType::String)
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("nickname", AttributeType::String)
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("active", AttributeType::Bool)
                    .default(StaticDefault::bool(true))
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("livemode", AttributeType::Bool)
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("lookup_key", AttributeType::String)
                    .optional()
                    .computed()
                    .build(),
            )
            .build()
    }

    fn config(currency: &str, nickname: &str) -> DynamicValue {
        let mut dv = DynamicValue::object();
        dv.set(&AttributePath::new("currency"), currency).unwrap();
        dv.set(&AttributePath::new("nickname"), nickname).unwrap();
        dv
    }

    fn prior() -> DynamicValue {
        let mut dv = config("usd", "basic");
        dv.set(&AttributePath::new("id"), "price_1").unwrap();
        dv.set(&AttributePath::new("active"), true).unwrap();
        dv.set(&AttributePath::new("livemode"), false).unwrap();
        dv.set(&AttributePath::new("lookup_key"), "basic_usd").unwrap();
        dv
    }

    #[test]
    fn create_marks_computed_unknown_and_applies_defaults() {
        let plan = plan_resource_change(&schema(), &DynamicValue::null(), &config("usd", "basic"));

        let state = &plan.planned_state;
        assert!(state.get(&AttributePath::new("id")).unwrap().is_unknown());
        assert!(state.get(&AttributePath::new("livemode")).unwrap().is_unknown());
        assert!(state.get_bool(&AttributePath::new("active")).unwrap());
        assert!(plan.requires_replace.is_empty());
    }

    #[test]
    fn in_place_update_keeps_id() {
        let plan = plan_resource_change(&schema(), &prior(), &config("usd", "premium"));

        let state = &plan.planned_state;
        assert_eq!(state.get_string(&AttributePath::new("id")).unwrap(), "price_1");
        assert!(state.get(&AttributePath::new("livemode")).unwrap().is_unknown());
        assert!(plan.requires_replace.is_empty());
    }

    #[test]
    fn no_change_keeps_computed_values() {
        let plan = plan_resource_change(&schema(), &prior(), &config("usd", "basic"));
        assert!(!plan
            .planned_state
            .get_bool(&AttributePath::new("livemode"))
            .unwrap());
    }

    #[test]
    fn provider_chosen_value_left_out_of_config_is_no_change() {
        let plan = plan_resource_change(&schema(), &prior(), &config("usd", "basic"));

        assert_eq!(plan.planned_state, prior());
        assert!(plan.requires_replace.is_empty());
    }

    #[test]
    fn provider_chosen_value_survives_an_update() {
        let plan = plan_resource_change(&schema(), &prior(), &config("usd", "premium"));

        let state = &plan.planned_state;
        assert_eq!(
            state.get_string(&AttributePath::new("lookup_key")).unwrap(),
            "basic_usd"
        );
        assert!(state.get(&AttributePath::new("livemode")).unwrap().is_unknown());
    }

    #[test]
    fn create_only_change_requires_replace() {
        let plan = plan_resource_change(&schema(), &prior(), &config("eur", "basic"));
        assert_eq!(plan.requires_replace, vec![AttributePath::new("currency")]);
    }

    #[test]
    fn null_proposal_plans_destroy() {
        let plan = plan_resource_change(&schema(), &prior(), &DynamicValue::null());
        assert!(plan.planned_state.is_null());
    }
}
