use protomock_template::{GeneratorRegistry, MockContext, TemplateResolver};
use serde_json::{json, Value};
use std::sync::Arc;

fn resolver() -> TemplateResolver {
    TemplateResolver::new(Arc::new(GeneratorRegistry::builtin()))
}

fn context_with_body(body: Value) -> MockContext {
    let Value::Object(map) = body else {
        panic!("body must be an object");
    };
    MockContext {
        body: map,
        ..MockContext::default()
    }
}

#[test]
fn ranged_date_with_collapsed_bounds_is_deterministic() {
    let resolved = resolver().resolve(
        &MockContext::default(),
        &json!("{{random.Date(format:'2006-01-02', startDate:'2020-01-01', endDate:'2020-01-01')}}"),
    );
    assert_eq!(resolved, json!("2020-01-01"));
}

#[test]
fn body_lookups() {
    let ctx = context_with_body(json!({"user": {"name": "Ana", "age": 33}}));
    let r = resolver();

    assert_eq!(r.resolve(&ctx, &json!("{{body.user.name}}")), json!("Ana"));
    assert_eq!(r.resolve(&ctx, &json!("{{body.user.missing}}")), json!(""));
    // Non-string values serialize to their JSON text form.
    assert_eq!(r.resolve(&ctx, &json!("{{body.user.age}}")), json!("33"));
    assert_eq!(
        r.resolve(&ctx, &json!("{{body.user}}")),
        json!(r#"{"age":33,"name":"Ana"}"#)
    );
}

#[test]
fn null_body_value_resolves_empty() {
    let ctx = context_with_body(json!({"gone": null}));
    assert_eq!(resolver().resolve(&ctx, &json!("{{body.gone}}")), json!(""));
}

#[test]
fn unknown_expression_is_left_unchanged() {
    let resolved = resolver().resolve(
        &MockContext::default(),
        &json!("{{unknown.thing}} and {{alsoUnknown(a: 'b')}}"),
    );
    assert_eq!(
        resolved,
        json!("{{unknown.thing}} and {{alsoUnknown(a: 'b')}}")
    );
}

#[test]
fn context_prefix_lookups() {
    let mut ctx = MockContext::default();
    ctx.path_params.insert("id".into(), "42".into());
    ctx.query.insert("page".into(), "3".into());
    ctx.headers.insert("X-Tenant".into(), "acme".into());
    let r = resolver();

    assert_eq!(
        r.resolve(&ctx, &json!("id={{path.id}} page={{query.page}} t={{headers.X-Tenant}}")),
        json!("id=42 page=3 t=acme")
    );
    // Missing context fields become the empty string.
    assert_eq!(r.resolve(&ctx, &json!("[{{query.absent}}]")), json!("[]"));
}

#[test]
fn tree_walk_preserves_structure() {
    let mut ctx = MockContext::default();
    ctx.query.insert("q".into(), "hi".into());
    let template = json!({
        "echo": "{{query.q}}",
        "nested": {"list": ["{{query.q}}", 7, true]},
        "untouched": 12.5
    });
    let resolved = resolver().resolve(&ctx, &template);
    assert_eq!(
        resolved,
        json!({
            "echo": "hi",
            "nested": {"list": ["hi", 7, true]},
            "untouched": 12.5
        })
    );
}

#[test]
fn chained_body_placeholder_resolves_in_cascade() {
    let mut ctx = context_with_body(json!({"template": "hello {{query.who}}"}));
    ctx.query.insert("who".into(), "world".into());
    assert_eq!(
        resolver().resolve(&ctx, &json!("{{body.template}}")),
        json!("hello world")
    );
}

#[test]
fn self_referential_body_placeholder_terminates() {
    let ctx = context_with_body(json!({"loop": "{{body.loop}}"}));
    // The depth cap stops the cascade; the literal placeholder survives.
    assert_eq!(
        resolver().resolve(&ctx, &json!("{{body.loop}}")),
        json!("{{body.loop}}")
    );
}

#[test]
fn builtin_generators_produce_values() {
    let r = resolver();
    let ctx = MockContext::default();
    for name in [
        "random.UUID",
        "random.UUIDDigit",
        "random.JWT",
        "random.Name",
        "random.FirstName",
        "random.LastName",
        "random.Email",
        "random.Phone",
        "random.E164Phone",
        "random.Username",
        "random.URL",
        "random.DomainName",
        "random.IPv4",
        "random.IPv6",
        "random.MacAddress",
        "random.Word",
        "random.Sentence",
        "random.Paragraph",
        "random.Password",
        "random.Date",
    ] {
        let resolved = r.resolve(&ctx, &json!(format!("{{{{{name}}}}}")));
        let Value::String(s) = resolved else {
            panic!("{name} did not resolve to a string");
        };
        assert!(!s.is_empty(), "{name} resolved empty");
        assert!(!s.contains("{{"), "{name} left a placeholder: {s}");
    }
}

#[test]
fn uuid_shapes() {
    let r = resolver();
    let ctx = MockContext::default();
    let Value::String(hyphenated) = r.resolve(&ctx, &json!("{{random.UUID}}")) else {
        panic!("expected string");
    };
    assert_eq!(hyphenated.len(), 36);
    assert_eq!(hyphenated.matches('-').count(), 4);

    let Value::String(digits) = r.resolve(&ctx, &json!("{{random.UUIDDigit}}")) else {
        panic!("expected string");
    };
    assert_eq!(digits.len(), 32);
    assert!(!digits.contains('-'));
}

#[test]
fn password_length_argument() {
    let r = resolver();
    let ctx = MockContext::default();

    let Value::String(sized) = r.resolve(&ctx, &json!("{{random.Password(length: '20')}}")) else {
        panic!("expected string");
    };
    assert_eq!(sized.len(), 20);

    // Floor of 4.
    let Value::String(floored) = r.resolve(&ctx, &json!("{{random.Password(length: '1')}}")) else {
        panic!("expected string");
    };
    assert_eq!(floored.len(), 4);

    // Unparseable length falls back to the default of 12. The comma splits
    // the argument and breaks the quoting, which is the documented parser
    // limitation.
    let Value::String(defaulted) =
        r.resolve(&ctx, &json!("{{random.Password(length: '2,0')}}"))
    else {
        panic!("expected string");
    };
    assert_eq!(defaulted.len(), 12);
}

#[test]
fn explicit_registration_extends_the_registry() {
    let mut registry = GeneratorRegistry::builtin();
    registry.register("random.Answer", Box::new(|_| "42".to_string()));
    let r = TemplateResolver::new(Arc::new(registry));
    assert_eq!(
        r.resolve(&MockContext::default(), &json!("{{random.Answer}}")),
        json!("42")
    );
}
