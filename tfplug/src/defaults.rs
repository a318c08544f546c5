//! Default value providers for attributes
//!
//! Defaults are evaluated during planning and again before create, for
//! optional attributes whose configured value is absent or null. An
//! explicitly configured value always wins.
//!
//! ```no_run
//! use tfplug::schema::{AttributeBuilder, AttributeType};
//! use tfplug::defaults::StaticDefault;
//!
//! let active = AttributeBuilder::new("active", AttributeType::Bool)
//!     .default(StaticDefault::bool(true))
//!     .build();
//! ```

use crate::schema::{Default, DefaultRequest, DefaultResponse, Schema};
use crate::types::{AttributePath, Dynamic, DynamicValue};
use std::collections::HashMap;

/// StaticDefault provides a static default value
pub struct StaticDefault {
    value: Dynamic,
}

impl StaticDefault {
    pub fn create(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn string(value: &str) -> Self {
        Self::create(Dynamic::String(value.to_string()))
    }

    pub fn number(value: f64) -> Self {
        Self::create(Dynamic::Number(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::create(Dynamic::Bool(value))
    }

    pub fn list(values: Vec<Dynamic>) -> Self {
        Self::create(Dynamic::List(values))
    }
}

impl Default for StaticDefault {
    fn description(&self) -> String {
        format!("static default value: {:?}", self.value)
    }

    fn default_value(&self, _request: DefaultRequest) -> DefaultResponse {
        DefaultResponse {
            value: self.value.clone(),
        }
    }
}

/// Fill every top-level attribute that declares a default and has no
/// configured value. Unknown values are left alone.
pub fn apply_defaults(schema: &Schema, value: &DynamicValue) -> DynamicValue {
    let mut fields = match &value.value {
        Dynamic::Map(m) => m.clone(),
        _ => HashMap::new(),
    };

    for attr in &schema.block.attributes {
        let Some(default) = &attr.default else {
            continue;
        };
        let missing = matches!(fields.get(&attr.name), None | Some(Dynamic::Null));
        if missing {
            let response = default.default_value(DefaultRequest {
                path: AttributePath::new(&attr.name),
            });
            fields.insert(attr.name.clone(), response.value);
        }
    }

    DynamicValue::new(Dynamic::Map(fields))
}
