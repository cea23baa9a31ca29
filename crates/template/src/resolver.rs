use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::generators::GeneratorRegistry;
use crate::placeholder::{parse_func_call, placeholder_regex};

/// Chained `body.` placeholders resolve recursively; the depth cap keeps a
/// self-referencing body value from recursing forever.
const MAX_BODY_DEPTH: usize = 8;

/// Live request context a template is resolved against.
#[derive(Debug, Clone, Default)]
pub struct MockContext {
    pub path_params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub body: Map<String, Value>,
}

/// Walks a JSON-like tree substituting every `{{expr}}` placeholder found in
/// string leaves; maps and lists pass through structurally unchanged.
#[derive(Clone)]
pub struct TemplateResolver {
    registry: Arc<GeneratorRegistry>,
}

impl TemplateResolver {
    pub fn new(registry: Arc<GeneratorRegistry>) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, ctx: &MockContext, node: &Value) -> Value {
        self.resolve_at(ctx, node, 0)
    }

    fn resolve_at(&self, ctx: &MockContext, node: &Value, depth: usize) -> Value {
        match node {
            Value::String(s) => Value::String(self.replace_placeholders(s, ctx, depth)),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.resolve_at(ctx, v, depth)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(
                items.iter().map(|v| self.resolve_at(ctx, v, depth)).collect(),
            ),
            other => other.clone(),
        }
    }

    fn replace_placeholders(&self, input: &str, ctx: &MockContext, depth: usize) -> String {
        placeholder_regex()
            .replace_all(input, |caps: &regex::Captures<'_>| {
                self.resolve_expr(caps[1].trim(), &caps[0], ctx, depth)
            })
            .into_owned()
    }

    fn resolve_expr(&self, expr: &str, original: &str, ctx: &MockContext, depth: usize) -> String {
        let (name, args) = parse_func_call(expr);

        // Generator registry wins over context prefixes.
        if let Some(generator) = self.registry.get(&name) {
            return generator(&args);
        }

        if let Some(field) = name.strip_prefix("path.") {
            return ctx.path_params.get(field).cloned().unwrap_or_default();
        }
        if let Some(field) = name.strip_prefix("query.") {
            return ctx.query.get(field).cloned().unwrap_or_default();
        }
        if let Some(field) = name.strip_prefix("headers.") {
            // Header names reach the context lower-cased by the transport;
            // templates may spell them either way.
            return ctx
                .headers
                .get(field)
                .or_else(|| {
                    ctx.headers
                        .iter()
                        .find(|(k, _)| k.eq_ignore_ascii_case(field))
                        .map(|(_, v)| v)
                })
                .cloned()
                .unwrap_or_default();
        }

        if let Some(field) = name.strip_prefix("body.") {
            let keys: Vec<&str> = field.split('.').collect();
            return match get_nested(&ctx.body, &keys) {
                // A body value may itself carry placeholders; resolve in
                // cascade up to the depth cap.
                Some(Value::String(s)) => {
                    if depth < MAX_BODY_DEPTH {
                        self.replace_placeholders(s, ctx, depth + 1)
                    } else {
                        s.clone()
                    }
                }
                Some(Value::Null) | None => String::new(),
                Some(other) => serde_json::to_string(other).unwrap_or_default(),
            };
        }

        // Nothing matched; keep the placeholder text as-is.
        original.to_string()
    }
}

fn get_nested<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    let (first, rest) = keys.split_first()?;
    let value = map.get(*first)?;
    if rest.is_empty() {
        return Some(value);
    }
    match value {
        Value::Object(sub) => get_nested(sub, rest),
        _ => None,
    }
}
