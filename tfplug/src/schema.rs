//! Schemas
//!
//! A [`Schema`] is a flat list of attributes. Nested shapes (a price's
//! `recurring`, a meter's `default_aggregation`) are expressed as attribute
//! types rather than nested blocks. Attributes carry their own validators,
//! plan modifiers and default, which `validator`, `plan` and `defaults` run.

use crate::types::{AttributePath, Diagnostic, Dynamic};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Terraform value types. Numbers are f64 on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Number,
    Bool,
    List(Box<AttributeType>),
    Set(Box<AttributeType>),
    /// String keys
    Map(Box<AttributeType>),
    Object(HashMap<String, AttributeType>),
}

impl AttributeType {
    /// `map(string)`, the shape of every metadata attribute
    pub fn string_map() -> Self {
        AttributeType::Map(Box::new(AttributeType::String))
    }

    pub fn string_list() -> Self {
        AttributeType::List(Box::new(AttributeType::String))
    }

    /// `list(object({...}))`, used for repeated nested blocks
    pub fn object_list(fields: &[(&str, AttributeType)]) -> Self {
        AttributeType::List(Box::new(AttributeType::Object(
            fields
                .iter()
                .map(|(name, ty)| (name.to_string(), ty.clone()))
                .collect(),
        )))
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    /// Bumped when stored state needs migrating
    pub version: i64,
    pub block: Block,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
    pub attributes: Vec<Attribute>,
    pub description: String,
}

impl Block {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|attr| attr.name == name)
    }
}

#[derive(Clone)]
pub struct Attribute {
    pub name: String,
    pub r#type: AttributeType,
    pub description: String,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    /// Redacted from plan output
    pub sensitive: bool,
    pub validators: Vec<Arc<dyn Validator>>,
    pub plan_modifiers: Vec<Arc<dyn PlanModifier>>,
    pub default: Option<Arc<dyn Default>>,
}

impl Attribute {
    /// Whether the provider may fill the value in when the config leaves it out
    pub fn provider_sets_value(&self) -> bool {
        self.computed && !self.required
    }
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let validators: Vec<String> = self.validators.iter().map(|v| v.description()).collect();
        let modifiers: Vec<String> = self.plan_modifiers.iter().map(|m| m.description()).collect();
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("type", &self.r#type)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("sensitive", &self.sensitive)
            .field("validators", &validators)
            .field("plan_modifiers", &modifiers)
            .field("default", &self.default.as_ref().map(|d| d.description()))
            .finish()
    }
}

/// Checks a configured value. Never sees null or unknown values.
pub trait Validator: Send + Sync {
    fn description(&self) -> String;
    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse;
}

pub struct ValidatorRequest {
    pub config_value: Dynamic,
    pub path: AttributePath,
}

#[derive(Default)]
pub struct ValidatorResponse {
    pub diagnostics: Vec<Diagnostic>,
}

/// Adjusts one attribute of the proposed new state during planning
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;
    fn modify(&self, request: PlanModifierRequest) -> PlanModifierResponse;
}

pub struct PlanModifierRequest {
    pub config_value: Dynamic,
    /// Null on create
    pub state_value: Dynamic,
    pub plan_value: Dynamic,
    pub path: AttributePath,
}

pub struct PlanModifierResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Value used when the configuration leaves an optional attribute null
pub trait Default: Send + Sync {
    fn description(&self) -> String;
    fn default_value(&self, request: DefaultRequest) -> DefaultResponse;
}

pub struct DefaultRequest {
    pub path: AttributePath,
}

pub struct DefaultResponse {
    pub value: Dynamic,
}

pub struct AttributeBuilder {
    attribute: Attribute,
}

impl AttributeBuilder {
    pub fn new(name: &str, type_: AttributeType) -> Self {
        Self {
            attribute: Attribute {
                name: name.to_string(),
                r#type: type_,
                description: String::new(),
                required: false,
                optional: false,
                computed: false,
                sensitive: false,
                validators: Vec::new(),
                plan_modifiers: Vec::new(),
                default: None,
            },
        }
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.attribute.description = desc.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.attribute.required = true;
        self.attribute.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.attribute.optional = true;
        self.attribute.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.attribute.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.attribute.sensitive = true;
        self
    }

    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.attribute.validators.push(Arc::new(validator));
        self
    }

    pub fn plan_modifier(mut self, modifier: impl PlanModifier + 'static) -> Self {
        self.attribute.plan_modifiers.push(Arc::new(modifier));
        self
    }

    /// Implies optional and computed, so an unset value plans as the default
    pub fn default(mut self, default: impl Default + 'static) -> Self {
        self.attribute.default = Some(Arc::new(default));
        self.attribute.computed = true;
        if !self.attribute.required {
            self.attribute.optional = true;
        }
        self
    }

    /// Changing the value recreates the remote object
    pub fn requires_replace(self) -> Self {
        self.plan_modifier(crate::plan_modifier::RequiresReplace)
    }

    pub fn build(self) -> Attribute {
        self.attribute
    }
}

pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema {
                version: 0,
                block: Block::default(),
            },
        }
    }

    pub fn version(mut self, version: i64) -> Self {
        self.schema.version = version;
        self
    }

    pub fn attribute(mut self, attr: Attribute) -> Self {
        self.schema.block.attributes.push(attr);
        self
    }

    pub fn description(mut self, desc: &str) -> Self {
        self.schema.block.description = desc.to_string();
        self
    }

    pub fn build(self) -> Schema {
        self.schema
    }
}

impl std::default::Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
