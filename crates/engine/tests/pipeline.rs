use bytes::Bytes;
use protomock_engine::{MockEngine, MockRequest};
use protomock_models::{
    BodySchema, Matcher, MockError, PropertyNode, Prototype, RequestDescriptor,
    ResponseDescriptor,
};
use protomock_schema::SchemaValidator;
use protomock_store::{InMemoryPrototypeStore, PrototypeStore};
use protomock_template::{GeneratorRegistry, TemplateResolver};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn engine_with_store() -> (MockEngine, Arc<InMemoryPrototypeStore>) {
    let store = Arc::new(InMemoryPrototypeStore::new(Duration::from_secs(300)));
    let engine = MockEngine::new(
        store.clone(),
        SchemaValidator::new(),
        TemplateResolver::new(Arc::new(GeneratorRegistry::builtin())),
    );
    (engine, store)
}

fn prototype(method: &str, path: &str, body: Value) -> Prototype {
    Prototype {
        id: String::new(),
        name: format!("{method} {path}"),
        request: RequestDescriptor {
            method: method.to_string(),
            url_path: path.to_string(),
            headers: HashMap::new(),
            path_params: HashMap::new(),
            body_schema: None,
            delay: 0,
        },
        response: ResponseDescriptor { body },
        created_at: None,
        updated_at: None,
    }
}

fn request(method: &str, path: &str) -> MockRequest {
    MockRequest {
        method: method.to_string(),
        path: path.to_string(),
        ..MockRequest::default()
    }
}

#[tokio::test]
async fn resolves_template_against_live_request() {
    let (engine, store) = engine_with_store();
    store
        .save(prototype(
            "POST",
            "/users",
            json!({"greeting": "hello {{body.user.name}}", "page": "{{query.page}}"}),
        ))
        .await
        .unwrap();

    let mut req = request("POST", "/users");
    req.body = Bytes::from_static(br#"{"user": {"name": "Ana"}}"#);
    req.query.insert("page".into(), "7".into());

    let resolved = engine.handle(&CancellationToken::new(), req).await.unwrap();
    assert_eq!(resolved, json!({"greeting": "hello Ana", "page": "7"}));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (engine, _store) = engine_with_store();
    let err = engine
        .handle(&CancellationToken::new(), request("GET", "/nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, MockError::PrototypeNotFound { .. }));
}

#[tokio::test]
async fn header_matchers_are_enforced() {
    let (engine, store) = engine_with_store();
    let mut proto = prototype("GET", "/secure", json!({"ok": true}));
    proto
        .request
        .headers
        .insert("X-Api-Key".to_string(), Matcher::from("^[0-9]{4}$"));
    store.save(proto).await.unwrap();

    // Missing header
    let err = engine
        .handle(&CancellationToken::new(), request("GET", "/secure"))
        .await
        .unwrap_err();
    assert!(matches!(err, MockError::InvalidInput { .. }));
    assert!(err.to_string().contains("X-Api-Key"));

    // Mismatching header
    let mut req = request("GET", "/secure");
    req.headers.insert("X-Api-Key".into(), "abcd".into());
    let err = engine
        .handle(&CancellationToken::new(), req)
        .await
        .unwrap_err();
    assert!(matches!(err, MockError::InvalidInput { .. }));

    // Matching header
    let mut req = request("GET", "/secure");
    req.headers.insert("X-Api-Key".into(), "1234".into());
    assert!(engine.handle(&CancellationToken::new(), req).await.is_ok());
}

#[tokio::test]
async fn path_param_matchers_are_enforced() {
    let (engine, store) = engine_with_store();
    let mut proto = prototype("GET", "/items", json!({"ok": true}));
    proto
        .request
        .path_params
        .insert("id".to_string(), Matcher::from("^[0-9]+$"));
    store.save(proto).await.unwrap();

    let mut req = request("GET", "/items");
    req.path_params.insert("id".into(), "42".into());
    assert!(engine.handle(&CancellationToken::new(), req).await.is_ok());

    let mut req = request("GET", "/items");
    req.path_params.insert("id".into(), "x42".into());
    let err = engine
        .handle(&CancellationToken::new(), req)
        .await
        .unwrap_err();
    assert!(matches!(err, MockError::InvalidInput { .. }));
}

#[tokio::test]
async fn body_schema_violations_surface_the_last_error() {
    let (engine, store) = engine_with_store();
    let mut proto = prototype("POST", "/users", json!({"ok": true}));
    proto.request.body_schema = Some(BodySchema {
        name: "user".to_string(),
        root_type: "object".to_string(),
        additional_properties: true,
        properties: vec![
            PropertyNode {
                name: "name".to_string(),
                is_required: true,
                type_name: "string".to_string(),
                min_length: 0,
                max_length: 0,
                format: String::new(),
                pattern: String::new(),
                properties: Vec::new(),
            },
            PropertyNode {
                name: "age".to_string(),
                is_required: true,
                type_name: "integer".to_string(),
                min_length: 0,
                max_length: 0,
                format: String::new(),
                pattern: String::new(),
                properties: Vec::new(),
            },
        ],
    });
    store.save(proto).await.unwrap();

    // Two violations: the missing required name and the fractional age. The
    // last one in list order is the surfaced message.
    let mut req = request("POST", "/users");
    req.body = Bytes::from_static(br#"{"age": 3.5}"#);
    let err = engine
        .handle(&CancellationToken::new(), req)
        .await
        .unwrap_err();
    match err {
        MockError::ValidationFailure { message } => {
            assert_eq!(message, "age: expected integer, got float");
        }
        other => panic!("expected validation failure, got {other}"),
    }
}

#[tokio::test]
async fn non_json_body_is_wrapped_as_raw() {
    let (engine, store) = engine_with_store();
    store
        .save(prototype("POST", "/echo", json!({"got": "{{body.raw}}"})))
        .await
        .unwrap();

    let mut req = request("POST", "/echo");
    req.body = Bytes::from_static(b"plain text, not json");
    let resolved = engine.handle(&CancellationToken::new(), req).await.unwrap();
    assert_eq!(resolved, json!({"got": "plain text, not json"}));
}

#[tokio::test]
async fn empty_body_passes_schema_with_no_required_fields() {
    let (engine, store) = engine_with_store();
    let mut proto = prototype("POST", "/empty", json!({"ok": true}));
    proto.request.body_schema = Some(BodySchema {
        name: "empty".to_string(),
        root_type: "object".to_string(),
        additional_properties: false,
        properties: Vec::new(),
    });
    store.save(proto).await.unwrap();

    let resolved = engine
        .handle(&CancellationToken::new(), request("POST", "/empty"))
        .await
        .unwrap();
    assert_eq!(resolved, json!({"ok": true}));
}

#[tokio::test(start_paused = true)]
async fn declared_delay_suspends_before_responding() {
    let (engine, store) = engine_with_store();
    let mut proto = prototype("GET", "/slow", json!({"ok": true}));
    proto.request.delay = 2_000;
    store.save(proto).await.unwrap();

    let started = tokio::time::Instant::now();
    let resolved = engine
        .handle(&CancellationToken::new(), request("GET", "/slow"))
        .await
        .unwrap();
    assert_eq!(resolved, json!({"ok": true}));
    assert!(started.elapsed() >= Duration::from_millis(2_000));
}

#[tokio::test]
async fn cancelled_caller_short_circuits_the_pipeline() {
    let (engine, store) = engine_with_store();
    store
        .save(prototype("GET", "/c", json!({"ok": true})))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = engine
        .handle(&cancel, request("GET", "/c"))
        .await
        .unwrap_err();
    assert!(matches!(err, MockError::Canceled));
}
