//! Per-operation view over prior state, planned values and the state being
//! written back.
//!
//! `get` and the `extract_*` helpers read the working state, which starts
//! as the planned values (create, update) or the current state (read,
//! delete) and is overwritten by `set` as remote values are read back.
//! `has_change` compares prior state with the plan.

use crate::convert;
use std::collections::HashMap;
use tfplug::defaults::apply_defaults;
use tfplug::{AttributePath, Dynamic, DynamicValue, Schema};

#[derive(Debug, Clone)]
pub struct ResourceData {
    prior: DynamicValue,
    planned: DynamicValue,
    state: DynamicValue,
}

impl ResourceData {
    /// Planned values for a new object; absent attributes get their defaults
    pub fn for_create(schema: &Schema, planned: &DynamicValue) -> Self {
        let planned = apply_defaults(schema, planned);
        Self {
            prior: DynamicValue::null(),
            state: planned.clone(),
            planned,
        }
    }

    pub fn for_update(prior: &DynamicValue, planned: &DynamicValue) -> Self {
        Self {
            prior: prior.clone(),
            planned: planned.clone(),
            state: planned.clone(),
        }
    }

    /// Read, delete and import work from the stored state alone
    pub fn for_read(current: &DynamicValue) -> Self {
        Self {
            prior: current.clone(),
            planned: current.clone(),
            state: current.clone(),
        }
    }

    pub fn id(&self) -> String {
        self.extract_string("id")
    }

    /// An empty ID marks the object as gone
    pub fn set_id(&mut self, id: &str) {
        // the root is always an object once set_id runs, so this cannot fail
        let _ = self.state.set(&AttributePath::new("id"), id);
    }

    /// Attribute from the working state; unknown and missing read as null
    pub fn get(&self, name: &str) -> Dynamic {
        lookup(&self.state, name)
    }

    /// Like `get`, but `None` for zero values: null, `""`, `0`, `false`
    /// and empty collections
    pub fn get_ok(&self, name: &str) -> Option<Dynamic> {
        let value = self.get(name);
        if is_zero(&value) {
            None
        } else {
            Some(value)
        }
    }

    /// Whether the plan changes `name` relative to prior state. Null and
    /// empty collections compare equal.
    pub fn has_change(&self, name: &str) -> bool {
        let (old, new) = self.get_change(name);
        normalize(old) != normalize(new)
    }

    /// `(prior, planned)` values of `name`
    pub fn get_change(&self, name: &str) -> (Dynamic, Dynamic) {
        (lookup(&self.prior, name), lookup(&self.planned, name))
    }

    pub fn set(&mut self, name: &str, value: impl Into<Dynamic>) -> tfplug::Result<()> {
        self.state.set(&AttributePath::new(name), value)
    }

    pub fn extract_string(&self, name: &str) -> String {
        convert::to_string(&self.get(name))
    }

    pub fn extract_int64(&self, name: &str) -> i64 {
        convert::to_int64(&self.get(name))
    }

    pub fn extract_float64(&self, name: &str) -> f64 {
        convert::to_float64(&self.get(name))
    }

    pub fn extract_bool(&self, name: &str) -> bool {
        convert::to_bool(&self.get(name))
    }

    pub fn extract_string_list(&self, name: &str) -> Vec<String> {
        convert::to_string_list(&self.get(name))
    }

    pub fn extract_map(&self, name: &str) -> HashMap<String, Dynamic> {
        convert::to_map(&self.get(name))
    }

    pub fn extract_map_list(&self, name: &str) -> Vec<HashMap<String, Dynamic>> {
        convert::to_map_list(&self.get(name))
    }

    pub fn extract_string_map(&self, name: &str) -> HashMap<String, String> {
        convert::to_string_map(&self.get(name))
    }

    /// Non-empty string, `None` otherwise
    pub fn optional_string(&self, name: &str) -> Option<String> {
        self.get_ok(name)
            .map(|v| convert::to_string(&v))
            .filter(|s| !s.is_empty())
    }

    /// See [`convert::optional_int64`] for the `0` / `-1` convention
    pub fn optional_int64(&self, name: &str) -> Option<i64> {
        convert::optional_int64(&self.get(name))
    }

    pub fn optional_float64(&self, name: &str) -> Option<f64> {
        convert::optional_float64(&self.get(name))
    }

    /// `(prior, planned)` of a `map(string)` attribute
    pub fn string_map_change(&self, name: &str) -> (HashMap<String, String>, HashMap<String, String>) {
        let (old, new) = self.get_change(name);
        (convert::to_string_map(&old), convert::to_string_map(&new))
    }

    /// Final state, or `None` when the ID was cleared. Values still unknown
    /// after the operation become null.
    pub fn into_state(self) -> Option<DynamicValue> {
        if self.id().is_empty() {
            return None;
        }
        Some(DynamicValue::new(resolve_unknown(self.state.value)))
    }
}

fn lookup(value: &DynamicValue, name: &str) -> Dynamic {
    match value.get(&AttributePath::new(name)) {
        Ok(Dynamic::Unknown) | Err(_) => Dynamic::Null,
        Ok(v) => v.clone(),
    }
}

fn is_zero(value: &Dynamic) -> bool {
    match value {
        Dynamic::Null | Dynamic::Unknown => true,
        Dynamic::Bool(b) => !b,
        Dynamic::Number(n) => *n == 0.0,
        Dynamic::String(s) => s.is_empty(),
        Dynamic::List(l) => l.is_empty(),
        Dynamic::Map(m) => m.is_empty(),
    }
}

fn normalize(value: Dynamic) -> Dynamic {
    match value {
        Dynamic::List(l) if l.is_empty() => Dynamic::Null,
        Dynamic::Map(m) if m.is_empty() => Dynamic::Null,
        other => other,
    }
}

fn resolve_unknown(value: Dynamic) -> Dynamic {
    match value {
        Dynamic::Unknown => Dynamic::Null,
        Dynamic::List(items) => Dynamic::List(items.into_iter().map(resolve_unknown).collect()),
        Dynamic::Map(fields) => Dynamic::Map(
            fields
                .into_iter()
                .map(|(k, v)| (k, resolve_unknown(v)))
                .collect(),
        ),
        other => other,
    }
}
