//! Built-in attribute validators and config validation
//!
//! Validators only ever see known, non-null values; `validate_config`
//! filters nulls and unknowns before calling them.

use crate::schema::{Schema, Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};
use regex::Regex;

/// Accept only one of a fixed set of strings
pub struct StringOneOf {
    values: Vec<String>,
}

impl StringOneOf {
    pub fn new(values: &[&str]) -> Self {
        Self {
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

impl Validator for StringOneOf {
    fn description(&self) -> String {
        format!("value must be one of: {}", self.values.join(", "))
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::String(s) = &request.config_value {
            if !self.values.iter().any(|v| v == s) {
                response.diagnostics.push(
                    Diagnostic::error(
                        format!("Invalid value for {}", request.path),
                        format!("expected one of [{}], got '{}'", self.values.join(", "), s),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        response
    }
}

/// Require a string to match a regular expression
pub struct StringPattern {
    pattern: Regex,
    description: String,
}

impl StringPattern {
    /// Panics on an invalid pattern; patterns are compile-time literals
    pub fn new(pattern: &str, description: &str) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern {pattern}: {e}")),
            description: description.to_string(),
        }
    }
}

impl Validator for StringPattern {
    fn description(&self) -> String {
        format!("value must match {}", self.description)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::String(s) = &request.config_value {
            if !self.pattern.is_match(s) {
                response.diagnostics.push(
                    Diagnostic::error(
                        format!("{} must match {}", request.path, self.description),
                        format!("value '{}' does not match pattern", s),
                    )
                    .with_attribute(request.path),
                );
            }
        }
        response
    }
}

/// Inclusive numeric bounds
pub struct NumberRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberRange {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }
}

impl Validator for NumberRange {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::Number(n) = request.config_value {
            if let Some(min) = self.min {
                if n < min {
                    response.diagnostics.push(
                        Diagnostic::error(
                            format!("{} must be at least {}", request.path, min),
                            format!("got {}", n),
                        )
                        .with_attribute(request.path.clone()),
                    );
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    response.diagnostics.push(
                        Diagnostic::error(
                            format!("{} must be at most {}", request.path, max),
                            format!("got {}", n),
                        )
                        .with_attribute(request.path),
                    );
                }
            }
        }
        response
    }
}

/// Bounds on the number of list elements; `at_most(1)` models singleton blocks
pub struct ListLength {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl ListLength {
    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn at_least(min: usize) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }
}

impl Validator for ListLength {
    fn description(&self) -> String {
        format!(
            "list length must be within [{}, {}]",
            self.min.map_or("0".to_string(), |m| m.to_string()),
            self.max.map_or("inf".to_string(), |m| m.to_string())
        )
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut response = ValidatorResponse::default();
        if let Dynamic::List(items) = &request.config_value {
            if let Some(min) = self.min {
                if items.len() < min {
                    response.diagnostics.push(
                        Diagnostic::error(
                            format!("{} must have at least {} items", request.path, min),
                            format!("got {} items", items.len()),
                        )
                        .with_attribute(request.path.clone()),
                    );
                }
            }
            if let Some(max) = self.max {
                if items.len() > max {
                    response.diagnostics.push(
                        Diagnostic::error(
                            format!("{} must have at most {} items", request.path, max),
                            format!("got {} items", items.len()),
                        )
                        .with_attribute(request.path),
                    );
                }
            }
        }
        response
    }
}

/// Validate a configuration against a schema: required attributes must be
/// present, then every attribute validator runs on known non-null values.
pub fn validate_config(schema: &Schema, config: &DynamicValue) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for attr in &schema.block.attributes {
        let path = AttributePath::new(&attr.name);
        let value = config.get(&path).cloned().unwrap_or(Dynamic::Null);

        if value.is_unknown() {
            continue;
        }
        if value.is_null() {
            if attr.required {
                diagnostics.push(
                    Diagnostic::error(
                        "Missing required argument",
                        format!("The argument \"{}\" is required, but no definition was found.", attr.name),
                    )
                    .with_attribute(path),
                );
            }
            continue;
        }

        for validator in &attr.validators {
            let response = validator.validate(ValidatorRequest {
                config_value: value.clone(),
                path: path.clone(),
            });
            diagnostics.extend(response.diagnostics);
        }
    }

    diagnostics
}

/// Error diagnostic when two mutually exclusive attributes are both set
pub fn conflicting(config: &DynamicValue, first: &str, second: &str) -> Option<Diagnostic> {
    let is_set = |name: &str| {
        config
            .get(&AttributePath::new(name))
            .map(|v| !v.is_null())
            .unwrap_or(false)
    };

    if is_set(first) && is_set(second) {
        Some(
            Diagnostic::error(
                "Conflicting configuration arguments",
                format!("\"{}\": conflicts with {}", second, first),
            )
            .with_attribute(AttributePath::new(second)),
        )
    } else {
        None
    }
}
