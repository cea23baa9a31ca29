use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A stored definition pairing a request-matching pattern with a templated
/// mock response. Timestamps are `None` until the store first writes the
/// entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Prototype {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub request: RequestDescriptor,
    pub response: ResponseDescriptor,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Prototype {
    pub fn to_summary(&self) -> PrototypeSummary {
        PrototypeSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            method: self.request.method.clone(),
            url_path: self.request.url_path.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestDescriptor {
    pub method: String,
    #[serde(rename = "urlPath")]
    pub url_path: String,
    #[serde(default)]
    pub headers: HashMap<String, Matcher>,
    #[serde(default)]
    pub path_params: HashMap<String, Matcher>,
    #[serde(rename = "bodySchema", default, skip_serializing_if = "Option::is_none")]
    pub body_schema: Option<BodySchema>,
    /// Milliseconds to wait before responding.
    #[serde(default)]
    pub delay: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseDescriptor {
    pub body: Value,
}

/// Header/path-param rule: `^`-prefixed means the remainder is a regular
/// expression the live value must match, anything else requires exact
/// equality. A regex that fails to compile never matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matcher(pub String);

impl Matcher {
    pub fn matches(&self, value: &str) -> bool {
        match self.0.strip_prefix('^') {
            Some(pattern) => match Regex::new(pattern) {
                Ok(re) => re.is_match(value),
                Err(_) => false,
            },
            None => self.0 == value,
        }
    }
}

impl From<&str> for Matcher {
    fn from(s: &str) -> Self {
        Matcher(s.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodySchema {
    #[serde(default)]
    pub name: String,
    /// Root type; must be "object" (case-insensitive) for the schema to be
    /// usable.
    #[serde(rename = "type_schema", default)]
    pub root_type: String,
    // Wire spelling kept as the original API shipped it.
    #[serde(rename = "aditional_properties", default)]
    pub additional_properties: bool,
    #[serde(default)]
    pub properties: Vec<PropertyNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyNode {
    pub name: String,
    #[serde(default)]
    pub is_required: bool,
    #[serde(rename = "type")]
    pub type_name: String,
    /// 0 means unbounded. Lengths count Unicode scalar values.
    #[serde(default)]
    pub min_length: u32,
    #[serde(default)]
    pub max_length: u32,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub pattern: String,
    /// Nested properties, meaningful only for type "object".
    #[serde(default)]
    pub properties: Vec<PropertyNode>,
}

/// List-model projection of a prototype.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrototypeSummary {
    pub id: String,
    pub name: String,
    pub method: String,
    #[serde(rename = "urlPath")]
    pub url_path: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Equality filters applied by `PrototypeStore::matching`. Method comparison
/// is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct MatchCriteria {
    pub url_path: Option<String>,
    pub method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePrototypeRequest {
    pub name: String,
    pub request: RequestDescriptor,
    pub response: ResponseDescriptor,
}

impl CreatePrototypeRequest {
    pub fn into_prototype(self) -> Prototype {
        Prototype {
            id: String::new(),
            name: self.name,
            request: self.request,
            response: self.response,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePrototypeResponse {
    pub success: bool,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListPrototypesResponse {
    pub prototypes: Vec<PrototypeSummary>,
}
