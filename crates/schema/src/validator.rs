use protomock_models::{BodySchema, PropertyNode};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use crate::rules;

/// One path-qualified validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// One unit of traversal state: the path walked so far, the declared
/// properties, the effective additionalProperties policy and the value map
/// under check.
pub struct Frame<'a> {
    pub path: String,
    pub additional_properties: bool,
    pub props: &'a [PropertyNode],
    pub value: &'a Map<String, Value>,
}

/// Per-type rule. Returns a child frame to push for nested objects.
pub type RuleFn = for<'a> fn(
    prop: &'a PropertyNode,
    value: &'a Value,
    path: &str,
    parent_additional: bool,
    errors: &mut Vec<ValidationError>,
) -> Option<Frame<'a>>;

pub(crate) fn join_path(base: &str, next: &str) -> String {
    if base.is_empty() {
        next.to_string()
    } else {
        format!("{}.{}", base, next)
    }
}

/// Stack-based structural validator with a pluggable per-type rule registry.
pub struct SchemaValidator {
    registry: HashMap<&'static str, RuleFn>,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            registry: rules::build_registry(),
        }
    }

    /// Validates `payload` against `schema`. An empty result means valid.
    pub fn validate(
        &self,
        schema: &BodySchema,
        payload: &Map<String, Value>,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if schema.root_type.to_lowercase() != "object" {
            errors.push(ValidationError::new(
                "",
                "root type_schema must be 'object'",
            ));
            return errors;
        }

        let mut stack = vec![Frame {
            path: String::new(),
            additional_properties: schema.additional_properties,
            props: &schema.properties,
            value: payload,
        }];

        while let Some(frame) = stack.pop() {
            // Required fields
            for prop in frame.props {
                if prop.is_required && !frame.value.contains_key(&prop.name) {
                    errors.push(ValidationError::new(
                        join_path(&frame.path, &prop.name),
                        "missing required field",
                    ));
                }
            }

            // Additional properties
            if !frame.additional_properties {
                for key in frame.value.keys() {
                    if !frame.props.iter().any(|p| p.name == *key) {
                        errors.push(ValidationError::new(
                            join_path(&frame.path, key),
                            "property not allowed",
                        ));
                    }
                }
            }

            // Per-property dispatch; absent non-required properties are
            // silently skipped.
            for prop in frame.props {
                let Some(raw) = frame.value.get(&prop.name) else {
                    continue;
                };
                let prop_path = join_path(&frame.path, &prop.name);

                match self.registry.get(prop.type_name.to_lowercase().as_str()) {
                    Some(rule) => {
                        if let Some(child) = rule(
                            prop,
                            raw,
                            &prop_path,
                            frame.additional_properties,
                            &mut errors,
                        ) {
                            stack.push(child);
                        }
                    }
                    None => {
                        errors.push(ValidationError::new(
                            prop_path,
                            format!("unsupported type in schema: {}", prop.type_name),
                        ));
                    }
                }
            }
        }

        errors
    }
}
