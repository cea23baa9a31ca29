use chrono::NaiveDate;
use protomock_models::PropertyNode;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::validator::{Frame, RuleFn, ValidationError};

pub(crate) fn build_registry() -> HashMap<&'static str, RuleFn> {
    let mut registry: HashMap<&'static str, RuleFn> = HashMap::new();
    registry.insert("string", validate_string);
    registry.insert("boolean", validate_boolean);
    registry.insert("number", validate_number);
    registry.insert("integer", validate_integer);
    registry.insert("object", validate_object);
    registry
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$")
            .expect("email regex compiles")
    })
}

fn is_yyyy_mm_dd(s: &str) -> bool {
    s.chars().count() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn validate_string<'a>(
    prop: &'a PropertyNode,
    value: &'a Value,
    path: &str,
    _parent_additional: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Frame<'a>> {
    let Value::String(s) = value else {
        errors.push(ValidationError::new(
            path,
            format!("expected string, got {}", json_kind(value)),
        ));
        return None;
    };

    // Lengths count Unicode scalar values; 0 means unbounded.
    let len = s.chars().count() as u32;
    if prop.min_length > 0 && len < prop.min_length {
        errors.push(ValidationError::new(
            path,
            format!("minimum length is {}", prop.min_length),
        ));
    }
    if prop.max_length > 0 && len > prop.max_length {
        errors.push(ValidationError::new(
            path,
            format!("maximum length is {}", prop.max_length),
        ));
    }

    if !prop.pattern.is_empty() {
        match Regex::new(&prop.pattern) {
            Ok(re) => {
                if !re.is_match(s) {
                    errors.push(ValidationError::new(
                        path,
                        "value does not match required pattern",
                    ));
                }
            }
            // A broken stored regex is a per-field error, never a crash.
            Err(err) => {
                errors.push(ValidationError::new(
                    path,
                    format!("invalid regex in schema: {}", err),
                ));
            }
        }
    }

    if !prop.format.is_empty() {
        match prop.format.to_lowercase().as_str() {
            "email" => {
                if !email_regex().is_match(s) {
                    errors.push(ValidationError::new(path, "invalid email format"));
                }
            }
            "date" => {
                if !is_yyyy_mm_dd(s) {
                    errors.push(ValidationError::new(
                        path,
                        "invalid date format (expected YYYY-MM-DD)",
                    ));
                }
            }
            // Unrecognized formats are accepted.
            _ => {}
        }
    }

    None
}

fn validate_boolean<'a>(
    _prop: &'a PropertyNode,
    value: &'a Value,
    path: &str,
    _parent_additional: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Frame<'a>> {
    if !value.is_boolean() {
        errors.push(ValidationError::new(
            path,
            format!("expected boolean, got {}", json_kind(value)),
        ));
    }
    None
}

fn validate_number<'a>(
    _prop: &'a PropertyNode,
    value: &'a Value,
    path: &str,
    _parent_additional: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Frame<'a>> {
    if !value.is_number() {
        errors.push(ValidationError::new(
            path,
            format!("expected number, got {}", json_kind(value)),
        ));
    }
    None
}

fn validate_integer<'a>(
    _prop: &'a PropertyNode,
    value: &'a Value,
    path: &str,
    _parent_additional: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Frame<'a>> {
    let Value::Number(n) = value else {
        errors.push(ValidationError::new(
            path,
            format!("expected integer, got {}", json_kind(value)),
        ));
        return None;
    };

    if n.as_i64().is_some() || n.as_u64().is_some() {
        return None;
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 => None,
        _ => {
            errors.push(ValidationError::new(path, "expected integer, got float"));
            None
        }
    }
}

fn validate_object<'a>(
    prop: &'a PropertyNode,
    value: &'a Value,
    path: &str,
    parent_additional: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Frame<'a>> {
    let Value::Object(map) = value else {
        errors.push(ValidationError::new(
            path,
            format!("expected object, got {}", json_kind(value)),
        ));
        return None;
    };

    // The child inherits the parent frame's additionalProperties policy; a
    // flag on the object node itself is never consulted.
    Some(Frame {
        path: path.to_string(),
        additional_properties: parent_additional,
        props: &prop.properties,
        value: map,
    })
}
