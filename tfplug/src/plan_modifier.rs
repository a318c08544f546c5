//! Built-in plan modifiers
//!
//! Plan modifiers run after defaults and unknown-marking, once per attribute,
//! and can rewrite the planned value or flag that the change needs a
//! replacement.

use crate::schema::{PlanModifier, PlanModifierRequest, PlanModifierResponse};
use crate::types::Dynamic;

/// Marks an attribute as requiring replacement when it changes
///
/// Creation (null prior state) and unknown planned values never force a
/// replacement.
pub struct RequiresReplace;

impl PlanModifier for RequiresReplace {
    fn description(&self) -> String {
        "changing this value forces a new resource".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let requires_replace = !request.state_value.is_null()
            && !request.plan_value.is_unknown()
            && request.state_value != request.plan_value;

        PlanModifierResponse {
            plan_value: request.plan_value,
            requires_replace,
            diagnostics: Vec::new(),
        }
    }
}

/// Keep the prior state value for a computed attribute that would otherwise
/// be planned as unknown
pub struct UseStateForUnknown;

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "once set, the value is carried over from prior state".to_string()
    }

    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse {
        let plan_value = match (&request.plan_value, &request.state_value) {
            (Dynamic::Unknown, state) if !state.is_null() => state.clone(),
            _ => request.plan_value,
        };

        PlanModifierResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Vec::new(),
        }
    }
}
