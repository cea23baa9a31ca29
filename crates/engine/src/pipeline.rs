use bytes::Bytes;
use protomock_models::{Matcher, MockError, Prototype};
use protomock_schema::SchemaValidator;
use protomock_store::PrototypeStore;
use protomock_template::{MockContext, TemplateResolver};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

/// Transport-extracted view of one inbound request: normalized method, path
/// with the serving prefix already stripped, first-value-per-name headers and
/// query params, route-extracted path params, raw body bytes.
#[derive(Debug, Clone, Default)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub path_params: HashMap<String, String>,
    pub body: Bytes,
}

/// Per-request pipeline composing store lookup, shape verification, body
/// validation and template resolution. Each stage's failure short-circuits
/// the rest.
pub struct MockEngine {
    store: Arc<dyn PrototypeStore>,
    validator: SchemaValidator,
    resolver: TemplateResolver,
}

impl MockEngine {
    pub fn new(
        store: Arc<dyn PrototypeStore>,
        validator: SchemaValidator,
        resolver: TemplateResolver,
    ) -> Self {
        Self {
            store,
            validator,
            resolver,
        }
    }

    #[instrument(skip(self, cancel, request), fields(method = %request.method, path = %request.path))]
    pub async fn handle(
        &self,
        cancel: &CancellationToken,
        request: MockRequest,
    ) -> Result<Value, MockError> {
        info!("resolving mock request");

        let prototype = self
            .store
            .get_by_path(cancel, &request.path, &request.method)
            .await
            .map_err(|e| {
                error!("lookup failed: {}", e);
                e
            })?;

        // Header names are matched case-insensitively; path param names are
        // exact.
        verify_matchers(
            &prototype,
            "header",
            &prototype.request.headers,
            &request.headers,
            true,
        )?;
        verify_matchers(
            &prototype,
            "path param",
            &prototype.request.path_params,
            &request.path_params,
            false,
        )?;

        let body = parse_body(&request.body);

        if let Some(schema) = &prototype.request.body_schema {
            let violations = self.validator.validate(schema, &body);
            if !violations.is_empty() {
                for violation in &violations {
                    error!("body validation: {}", violation);
                }
                // The whole list is logged; the last entry is the surfaced
                // message.
                let message = violations
                    .last()
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                return Err(MockError::ValidationFailure { message });
            }
        }

        let ctx = MockContext {
            path_params: request.path_params,
            query: request.query,
            headers: request.headers,
            body,
        };
        let resolved = self.resolver.resolve(&ctx, &prototype.response.body);

        // The delay suspends only this request's task; no store lock is held
        // here.
        if prototype.request.delay > 0 {
            tokio::time::sleep(Duration::from_millis(prototype.request.delay)).await;
        }

        info!(prototype = %prototype.id, "mock resolved");
        Ok(resolved)
    }
}

fn verify_matchers(
    prototype: &Prototype,
    what: &str,
    matchers: &HashMap<String, Matcher>,
    received: &HashMap<String, String>,
    fold_name_case: bool,
) -> Result<(), MockError> {
    for (name, matcher) in matchers {
        let found = received.get(name).or_else(|| {
            if fold_name_case {
                received
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            } else {
                None
            }
        });
        let Some(value) = found.filter(|v| !v.is_empty()) else {
            let reason = format!("{} {} is required", what, name);
            error!("{}", reason);
            return Err(MockError::InvalidInput { reason });
        };
        if !matcher.matches(value) {
            let reason = format!(
                "{} {} does not match the expected pattern, check the prototype with ID: {}",
                what, name, prototype.id
            );
            error!("{}", reason);
            return Err(MockError::InvalidInput { reason });
        }
    }
    Ok(())
}

/// Best-effort parse of the raw body. An empty body becomes an empty map and
/// non-JSON content is wrapped as `{"raw": <text>}` rather than failing.
fn parse_body(raw: &Bytes) -> Map<String, Value> {
    if raw.is_empty() {
        return Map::new();
    }
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(raw) {
        return map;
    }
    let mut wrapped = Map::new();
    wrapped.insert(
        "raw".to_string(),
        Value::String(String::from_utf8_lossy(raw).to_string()),
    );
    wrapped
}
