//! Lenient coercion from Terraform values
//!
//! Every function accepts any `Dynamic` and falls back to the zero value of
//! its target type. Strings are never parsed into numbers, and nothing here
//! fails or panics.

use std::collections::HashMap;
use tfplug::Dynamic;

pub fn to_string(value: &Dynamic) -> String {
    match value {
        Dynamic::String(s) => s.clone(),
        _ => String::new(),
    }
}

/// Numbers are truncated toward zero
pub fn to_int(value: &Dynamic) -> i32 {
    match value {
        Dynamic::Number(n) => n.trunc() as i32,
        _ => 0,
    }
}

/// Numbers are truncated toward zero
pub fn to_int64(value: &Dynamic) -> i64 {
    match value {
        Dynamic::Number(n) => n.trunc() as i64,
        _ => 0,
    }
}

pub fn to_float64(value: &Dynamic) -> f64 {
    match value {
        Dynamic::Number(n) => *n,
        _ => 0.0,
    }
}

pub fn to_bool(value: &Dynamic) -> bool {
    matches!(value, Dynamic::Bool(true))
}

pub fn to_string_list(value: &Dynamic) -> Vec<String> {
    match value {
        Dynamic::List(items) => items.iter().map(to_string).collect(),
        _ => Vec::new(),
    }
}

/// A map, or the first element of a single-block list
pub fn to_map(value: &Dynamic) -> HashMap<String, Dynamic> {
    match value {
        Dynamic::Map(m) => m.clone(),
        Dynamic::List(items) => match items.first() {
            Some(Dynamic::Map(m)) => m.clone(),
            _ => HashMap::new(),
        },
        _ => HashMap::new(),
    }
}

pub fn to_map_list(value: &Dynamic) -> Vec<HashMap<String, Dynamic>> {
    match value {
        Dynamic::List(items) => items.iter().map(to_map).collect(),
        _ => Vec::new(),
    }
}

/// `map(string)` attributes such as metadata
pub fn to_string_map(value: &Dynamic) -> HashMap<String, String> {
    to_map(value)
        .iter()
        .map(|(k, v)| (k.clone(), to_string(v)))
        .collect()
}

/// `0` means unset and `-1` is how a configuration asks for an explicit zero
pub fn optional_int64(value: &Dynamic) -> Option<i64> {
    match to_int64(value) {
        0 => None,
        -1 => Some(0),
        n => Some(n),
    }
}

/// Same convention as [`optional_int64`]
pub fn optional_float64(value: &Dynamic) -> Option<f64> {
    let n = to_float64(value);
    if n == 0.0 {
        None
    } else if n == -1.0 {
        Some(0.0)
    } else {
        Some(n)
    }
}
