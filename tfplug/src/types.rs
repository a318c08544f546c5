//! Value model
//!
//! Configuration, plans and state are all [`DynamicValue`]s: a [`Dynamic`]
//! tree addressed with [`AttributePath`]s. Problems travel back to Terraform
//! as [`Diagnostic`]s, never as Rust errors.

use crate::error::{Result, TfplugError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One Terraform value. Objects and maps share the `Map` variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Dynamic {
    Null,
    Bool(bool),
    /// Terraform numbers are arbitrary precision; f64 covers every Stripe amount
    /// below 2^53
    Number(f64),
    String(String),
    List(Vec<Dynamic>),
    Map(HashMap<String, Dynamic>),
    /// Known only after apply
    Unknown,
}

/// Serialized form of [`Dynamic::Unknown`] in snapshots
const UNKNOWN_MARKER: &str = "__unknown__";

impl Dynamic {
    pub fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Dynamic::Unknown)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Number(_) => "number",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Map(_) => "map",
            Dynamic::Unknown => "unknown",
        }
    }
}

impl Serialize for Dynamic {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Dynamic::Null => serializer.serialize_unit(),
            Dynamic::Bool(b) => serializer.serialize_bool(*b),
            Dynamic::Number(n) => serializer.serialize_f64(*n),
            Dynamic::String(s) => serializer.serialize_str(s),
            Dynamic::List(l) => l.serialize(serializer),
            Dynamic::Map(m) => m.serialize(serializer),
            Dynamic::Unknown => serializer.serialize_str(UNKNOWN_MARKER),
        }
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};
        use std::fmt;

        struct DynamicVisitor;

        impl<'de> Visitor<'de> for DynamicVisitor {
            type Value = Dynamic;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a Terraform value")
            }

            fn visit_unit<E>(self) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Null)
            }

            fn visit_none<E>(self) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Null)
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(Dynamic::Number(value))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Dynamic, E>
            where
                E: de::Error,
            {
                Ok(match value {
                    UNKNOWN_MARKER => Dynamic::Unknown,
                    other => Dynamic::String(other.to_string()),
                })
            }

            fn visit_seq<V>(self, mut seq: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Dynamic::List(items))
            }

            fn visit_map<V>(self, mut map: V) -> std::result::Result<Dynamic, V::Error>
            where
                V: de::MapAccess<'de>,
            {
                let mut entries = HashMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry()? {
                    entries.insert(key, value);
                }
                Ok(Dynamic::Map(entries))
            }
        }

        deserializer.deserialize_any(DynamicVisitor)
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<i64> for Dynamic {
    fn from(value: i64) -> Self {
        Dynamic::Number(value as f64)
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Self {
        Dynamic::Number(value)
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(value)
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.to_string())
    }
}

impl<T: Into<Dynamic>> From<Vec<T>> for Dynamic {
    fn from(values: Vec<T>) -> Self {
        Dynamic::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Dynamic>> From<Option<T>> for Dynamic {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Dynamic::Null)
    }
}

impl<T: Into<Dynamic>> From<HashMap<String, T>> for Dynamic {
    fn from(values: HashMap<String, T>) -> Self {
        Dynamic::Map(values.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Dynamic>> From<BTreeMap<String, T>> for Dynamic {
    fn from(values: BTreeMap<String, T>) -> Self {
        Dynamic::Map(values.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// A whole configuration, plan or state object
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue {
    pub value: Dynamic,
}

impl DynamicValue {
    pub fn new(value: Dynamic) -> Self {
        Self { value }
    }

    pub fn null() -> Self {
        Self {
            value: Dynamic::Null,
        }
    }

    /// Empty object, the usual starting point for a new state
    pub fn object() -> Self {
        Self {
            value: Dynamic::Map(HashMap::new()),
        }
    }

    /// Null encodes as an empty buffer
    pub fn encode_msgpack(&self) -> Result<Vec<u8>> {
        match &self.value {
            Dynamic::Null => Ok(vec![]),
            _ => rmp_serde::encode::to_vec(&self.value)
                .map_err(|e| TfplugError::EncodingError(format!("msgpack encoding failed: {}", e))),
        }
    }

    pub fn decode_msgpack(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::null());
        }

        let value = rmp_serde::decode::from_slice::<Dynamic>(data)
            .map_err(|e| TfplugError::DecodingError(format!("msgpack decoding failed: {}", e)))?;
        Ok(Self { value })
    }

    pub fn encode_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| TfplugError::EncodingError(format!("json encoding failed: {}", e)))
    }

    pub fn decode_json(data: &[u8]) -> Result<Self> {
        let value = serde_json::from_slice(data)
            .map_err(|e| TfplugError::DecodingError(format!("json decoding failed: {}", e)))?;
        Ok(Self { value })
    }

    /// Raw access to the value at `path`
    pub fn get(&self, path: &AttributePath) -> Result<&Dynamic> {
        self.navigate_path(path)
    }

    pub fn get_string(&self, path: &AttributePath) -> Result<String> {
        match self.navigate_path(path)? {
            Dynamic::String(s) => Ok(s.clone()),
            other => Err(Self::mismatch("string", other)),
        }
    }

    pub fn get_number(&self, path: &AttributePath) -> Result<f64> {
        match self.navigate_path(path)? {
            Dynamic::Number(n) => Ok(*n),
            other => Err(Self::mismatch("number", other)),
        }
    }

    pub fn get_bool(&self, path: &AttributePath) -> Result<bool> {
        match self.navigate_path(path)? {
            Dynamic::Bool(b) => Ok(*b),
            other => Err(Self::mismatch("bool", other)),
        }
    }

    pub fn get_list(&self, path: &AttributePath) -> Result<Vec<Dynamic>> {
        match self.navigate_path(path)? {
            Dynamic::List(l) => Ok(l.clone()),
            other => Err(Self::mismatch("list", other)),
        }
    }

    pub fn get_map(&self, path: &AttributePath) -> Result<HashMap<String, Dynamic>> {
        match self.navigate_path(path)? {
            Dynamic::Map(m) => Ok(m.clone()),
            other => Err(Self::mismatch("map", other)),
        }
    }

    pub fn set(&mut self, path: &AttributePath, value: impl Into<Dynamic>) -> Result<()> {
        self.set_value(path, value.into())
    }

    pub fn set_string(&mut self, path: &AttributePath, value: String) -> Result<()> {
        self.set_value(path, Dynamic::String(value))
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn is_unknown(&self) -> bool {
        self.value.is_unknown()
    }

    fn mismatch(expected: &str, actual: &Dynamic) -> TfplugError {
        TfplugError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
        }
    }

    fn navigate_path<'a>(&'a self, path: &AttributePath) -> Result<&'a Dynamic> {
        let mut current = &self.value;

        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => m
                    .get(name)
                    .ok_or_else(|| TfplugError::AttributeNotFound(name.clone()))?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    let idx = *idx as usize;
                    l.get(idx).ok_or_else(|| {
                        TfplugError::InvalidPath(format!("list index {} out of bounds", idx))
                    })?
                }
                (value, step) => {
                    return Err(TfplugError::InvalidPath(format!(
                        "cannot apply {:?} to {}",
                        step,
                        value.type_name()
                    )))
                }
            };
        }

        Ok(current)
    }

    fn set_value(&mut self, path: &AttributePath, new_value: Dynamic) -> Result<()> {
        let Some((last, parents)) = path.steps.split_last() else {
            self.value = new_value;
            return Ok(());
        };

        // For non-empty paths, ensure we have a map at the root
        if !matches!(self.value, Dynamic::Map(_)) {
            self.value = Dynamic::Map(HashMap::new());
        }

        let mut current = &mut self.value;
        for (idx, step) in parents.iter().enumerate() {
            let next_is_index = matches!(
                path.steps.get(idx + 1),
                Some(AttributePathStep::ElementKeyInt(_))
            );
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name))
                | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                    let entry = m.entry(name.clone()).or_insert(Dynamic::Null);
                    if entry.is_null() {
                        *entry = if next_is_index {
                            Dynamic::List(Vec::new())
                        } else {
                            Dynamic::Map(HashMap::new())
                        };
                    }
                    entry
                }
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    let idx = *idx as usize;
                    l.get_mut(idx).ok_or_else(|| {
                        TfplugError::InvalidPath(format!("list index {} out of bounds", idx))
                    })?
                }
                (value, step) => {
                    return Err(TfplugError::InvalidPath(format!(
                        "cannot apply {:?} to {}",
                        step,
                        value.type_name()
                    )))
                }
            };
        }

        match (current, last) {
            (Dynamic::Map(m), AttributePathStep::AttributeName(name))
            | (Dynamic::Map(m), AttributePathStep::ElementKeyString(name)) => {
                m.insert(name.clone(), new_value);
                Ok(())
            }
            (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                let idx = *idx as usize;
                match l.get_mut(idx) {
                    Some(slot) => {
                        *slot = new_value;
                        Ok(())
                    }
                    None => Err(TfplugError::InvalidPath(format!(
                        "list index {} out of bounds",
                        idx
                    ))),
                }
            }
            (value, step) => Err(TfplugError::InvalidPath(format!(
                "cannot apply {:?} to {}",
                step,
                value.type_name()
            ))),
        }
    }
}

impl From<Dynamic> for DynamicValue {
    fn from(value: Dynamic) -> Self {
        Self { value }
    }
}

/// Route from the root object to one value, rendered like `tiers[0].up_to`
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePath {
    pub steps: Vec<AttributePathStep>,
}

impl AttributePath {
    pub fn new(name: &str) -> Self {
        Self {
            steps: vec![AttributePathStep::AttributeName(name.to_string())],
        }
    }

    pub fn attribute(mut self, name: &str) -> Self {
        self.steps
            .push(AttributePathStep::AttributeName(name.to_string()));
        self
    }

    pub fn index(mut self, idx: i64) -> Self {
        self.steps.push(AttributePathStep::ElementKeyInt(idx));
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.steps
            .push(AttributePathStep::ElementKeyString(key.to_string()));
        self
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                AttributePathStep::AttributeName(name) if i == 0 => write!(f, "{}", name)?,
                AttributePathStep::AttributeName(name) => write!(f, ".{}", name)?,
                AttributePathStep::ElementKeyString(key) => write!(f, "[\"{}\"]", key)?,
                AttributePathStep::ElementKeyInt(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributePathStep {
    AttributeName(String),
    /// Map key
    ElementKeyString(String),
    /// List index
    ElementKeyInt(i64),
}

/// A warning or error shown to the Terraform user, optionally pinned to an
/// attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// What the calling Terraform version supports
#[derive(Debug, Clone, Default)]
pub struct ClientCapabilities {
    /// Whether the provider may defer an action to a later plan
    pub deferral_allowed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_value_string_access() {
        let mut dv = DynamicValue::object();
        dv.set_string(&AttributePath::new("name"), "test".to_string())
            .unwrap();

        let result = dv.get_string(&AttributePath::new("name")).unwrap();
        assert_eq!(result, "test");
    }

    #[test]
    fn dynamic_value_nested_access() {
        let mut dv = DynamicValue::object();
        let path = AttributePath::new("metadata").key("env");
        dv.set_string(&path, "prod".to_string()).unwrap();

        assert_eq!(dv.get_string(&path).unwrap(), "prod");
        assert_eq!(dv.get_map(&AttributePath::new("metadata")).unwrap().len(), 1);
    }

    #[test]
    fn set_into_list_element() {
        let mut dv = DynamicValue::object();
        dv.set(
            &AttributePath::new("tiers"),
            vec![Dynamic::Map(HashMap::new())],
        )
        .unwrap();
        dv.set(&AttributePath::new("tiers").index(0).attribute("up_to"), 10_i64)
            .unwrap();

        assert_eq!(
            dv.get_number(&AttributePath::new("tiers").index(0).attribute("up_to"))
                .unwrap(),
            10.0
        );
        assert!(dv
            .set(&AttributePath::new("tiers").index(3).attribute("up_to"), 1_i64)
            .is_err());
    }

    #[test]
    fn type_mismatch_reports_both_types() {
        let mut dv = DynamicValue::object();
        dv.set(&AttributePath::new("active"), true).unwrap();

        match dv.get_string(&AttributePath::new("active")) {
            Err(TfplugError::TypeMismatch { expected, actual }) => {
                assert_eq!(expected, "string");
                assert_eq!(actual, "bool");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(matches!(
            dv.get(&AttributePath::new("missing")),
            Err(TfplugError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn option_and_collections_convert() {
        assert_eq!(Dynamic::from(None::<String>), Dynamic::Null);
        assert_eq!(
            Dynamic::from(vec!["a", "b"]),
            Dynamic::List(vec![Dynamic::from("a"), Dynamic::from("b")])
        );
        let map = BTreeMap::from([("k".to_string(), "v".to_string())]);
        assert_eq!(
            Dynamic::from(map),
            Dynamic::Map(HashMap::from([("k".to_string(), Dynamic::from("v"))]))
        );
    }

    #[test]
    fn state_survives_msgpack_snapshot() {
        let mut state = DynamicValue::object();
        state
            .set_string(&AttributePath::new("id"), "prod_123".to_string())
            .unwrap();
        state.set(&AttributePath::new("active"), true).unwrap();

        let decoded = DynamicValue::decode_msgpack(&state.encode_msgpack().unwrap()).unwrap();
        assert_eq!(decoded, state);
        assert!(DynamicValue::decode_msgpack(&[]).unwrap().is_null());
    }

    #[test]
    fn unknown_survives_json_snapshot() {
        let mut plan = DynamicValue::object();
        plan.set(&AttributePath::new("id"), Dynamic::Unknown).unwrap();
        plan.set(&AttributePath::new("unit_amount"), 1500_i64).unwrap();

        let json = plan.encode_json().unwrap();
        assert!(String::from_utf8_lossy(&json).contains(UNKNOWN_MARKER));
        assert_eq!(DynamicValue::decode_json(&json).unwrap(), plan);
        assert!(DynamicValue::decode_json(b"{not json").is_err());
    }

    #[test]
    fn path_display() {
        let path = AttributePath::new("fixed_amount")
            .index(0)
            .attribute("currency_option")
            .key("eur");
        assert_eq!(path.to_string(), "fixed_amount[0].currency_option[\"eur\"]");
    }

    #[test]
    fn has_errors_ignores_warnings() {
        let diags = vec![Diagnostic::warning("careful", "")];
        assert!(!has_errors(&diags));
        let diags = vec![Diagnostic::warning("careful", ""), Diagnostic::error("bad", "")];
        assert!(has_errors(&diags));
    }
}
