use http_mutant::body::{BodyMutators, NodeKind};
use http_mutant::operator::Level;
use http_mutant::{Field, HttpMutatorEngine, Mode, MutantGroup, MutationContext, MutatorConfig};
use serde_json::{Value, json};

fn engine(config: &str) -> HttpMutatorEngine {
    let config = MutatorConfig::from_json_str(config).expect("config should parse");
    HttpMutatorEngine::new(&config).expect("config should be valid")
}

fn generate(engine: &HttpMutatorEngine, doc: &Value, mode: Mode, seed: u64) -> Vec<MutantGroup> {
    let mut ctx = MutationContext::seeded(seed);
    let mut groups = Vec::new();
    engine
        .generate(doc, mode, &mut ctx, |group| {
            groups.push(group);
            Ok(())
        })
        .expect("generation should succeed");
    groups
}

fn response(body: Value) -> Value {
    json!({
        "Status Code": 200,
        "Headers": {
            "Content-Type": "application/json; charset=UTF-8",
            "Location": "https://api.test/orders/7"
        },
        "Body": body
    })
}

fn sample_body() -> Value {
    json!({
        "data": {
            "id": 17,
            "price": 9.5,
            "name": "widget",
            "active": true,
            "parent": null,
            "tags": ["a", "b", {"k": "v"}],
            "a/b": {"~": 1}
        },
        "items": []
    })
}

/// Operators per node, mirroring the stock catalog.
fn operator_count(node: &Value, level: Level) -> usize {
    let kind = NodeKind::of(node);
    match (kind, level) {
        (NodeKind::String, Level::Element) => 6,
        (NodeKind::String, Level::Root) => 4,
        (NodeKind::Integer | NodeKind::Float | NodeKind::Boolean, Level::Element) => 3,
        (NodeKind::Integer | NodeKind::Float | NodeKind::Boolean, Level::Root) => 1,
        (NodeKind::Null, Level::Element) => 1,
        (NodeKind::Null, Level::Root) => 0,
        (NodeKind::Object, Level::Element) => 5,
        (NodeKind::Object, Level::Root) => 3,
        (NodeKind::Array, Level::Element) => 6,
        (NodeKind::Array, Level::Root) => 4,
    }
}

fn expected_body_mutants(node: &Value, level: Level) -> usize {
    let own = operator_count(node, level);
    let children: usize = match node {
        Value::Object(map) => map
            .values()
            .map(|v| expected_body_mutants(v, Level::Element))
            .sum(),
        Value::Array(items) => items
            .iter()
            .map(|v| expected_body_mutants(v, Level::Element))
            .sum(),
        _ => 0,
    };
    own + children
}

#[test]
fn input_is_never_modified() {
    let engine = engine("{}");
    let doc = response(sample_body());
    let snapshot = doc.clone();

    for mode in [Mode::Exhaustive, Mode::Single, Mode::Multiple] {
        for seed in 0..10 {
            generate(&engine, &doc, mode, seed);
            assert_eq!(doc, snapshot, "{mode:?} modified its input");
        }
    }
}

#[test]
fn exhaustive_count_is_sum_over_nodes() {
    let engine = engine(r#"{ "statusCode": { "enabled": false }, "headers": { "enabled": false } }"#);

    for body in [
        sample_body(),
        json!([]),
        json!({}),
        json!("text"),
        json!(null),
        json!([[1, 2.5], {"x": [false]}]),
    ] {
        let groups = generate(&engine, &response(body.clone()), Mode::Exhaustive, 3);
        let total: usize = groups.iter().map(MutantGroup::len).sum();
        assert_eq!(total, expected_body_mutants(&body, Level::Root), "body {body}");
    }
}

#[test]
fn exhaustive_groups_are_pre_order_and_share_origin() {
    let engine = engine(r#"{ "statusCode": { "enabled": false }, "headers": { "enabled": false } }"#);
    let groups = generate(
        &engine,
        &response(json!({"a": {"b": 1}, "c": [true]})),
        Mode::Exhaustive,
        0,
    );

    let origins: Vec<&str> = groups.iter().map(|g| g.origin_path.as_str()).collect();
    assert_eq!(origins, vec!["/Body", "/Body/a", "/Body/a/b", "/Body/c", "/Body/c/0"]);
    for group in &groups {
        assert!(group.mutants.iter().all(|m| m.origin_path == group.origin_path));
    }
}

#[test]
fn single_order_changes_only_the_origin_subtree() {
    let engine = engine("{}");
    let doc = response(sample_body());
    let mut seen_fields = std::collections::BTreeSet::new();

    for seed in 0..200 {
        for group in generate(&engine, &doc, Mode::Single, seed) {
            assert_eq!(group.len(), 1);
            let mutant = &group.mutants[0];
            seen_fields.insert(mutant.field);
            assert_ne!(mutant.document, doc, "seed {seed}: mutant equals the input");

            for field in Field::ALL {
                if field != mutant.field {
                    assert_eq!(mutant.document[field.key()], doc[field.key()]);
                }
            }

            if mutant.field == Field::Body {
                let mut restored = mutant.document.clone();
                let original = doc
                    .pointer(&mutant.origin_path)
                    .expect("origin should exist in the input")
                    .clone();
                *restored
                    .pointer_mut(&mutant.origin_path)
                    .expect("origin should exist in the mutant") = original;
                assert_eq!(restored, doc, "seed {seed}: change outside {}", mutant.origin_path);
            }
        }
    }

    assert!(seen_fields.contains(&Field::Body));
}

#[test]
fn single_order_on_empty_containers_always_changes_something() {
    let engine = engine(r#"{ "statusCode": { "enabled": false }, "headers": { "enabled": false } }"#);

    for body in [json!({"items": []}), json!({"one": [1]}), json!({"flat": {"id": 3}})] {
        let doc = response(body);
        for seed in 0..400 {
            for group in generate(&engine, &doc, Mode::Single, seed) {
                assert_ne!(group.mutants[0].document, doc, "seed {seed}");
            }
        }
    }
}

#[test]
fn integers_beyond_i64_are_mutated_like_any_integer() {
    let engine = engine(r#"{ "statusCode": { "enabled": false }, "headers": { "enabled": false } }"#);
    let body = json!({"big": u64::MAX, "small": 5});

    let groups = generate(&engine, &response(body.clone()), Mode::Exhaustive, 0);
    let total: usize = groups.iter().map(MutantGroup::len).sum();
    assert_eq!(total, expected_body_mutants(&body, Level::Root));

    let doc = response(json!([u64::MAX]));
    for seed in 0..200 {
        assert_eq!(generate(&engine, &doc, Mode::Single, seed).len(), 1, "seed {seed}");
    }
}

#[test]
fn status_code_mutants_never_equal_original() {
    let engine = engine(r#"{ "headers": { "enabled": false }, "body": { "enabled": false } }"#);

    for status in [200, 201, 204, 400, 404, 500, 503] {
        let mut doc = response(json!({}));
        doc["Status Code"] = json!(status);

        for seed in 0..25 {
            for group in generate(&engine, &doc, Mode::Exhaustive, seed) {
                assert_eq!(group.len(), 3);
                for mutant in &group.mutants {
                    assert_ne!(mutant.document["Status Code"], json!(status));
                }
            }
        }
    }
}

#[test]
fn weighted_choice_follows_configured_weights() {
    let config = MutatorConfig::default();
    let mutators = BodyMutators::from_config(&config.body).unwrap();
    let boolean = mutators.get(NodeKind::Boolean).unwrap();
    let mut ctx = MutationContext::seeded(99);

    let draws = 20_000;
    let mut mutate = 0usize;
    for _ in 0..draws {
        let (name, _) = boolean
            .apply_weighted(json!(true), Level::Element, &mut ctx)
            .unwrap()
            .unwrap();
        if name == "mutate" {
            mutate += 1;
        }
    }

    let observed = mutate as f64 / draws as f64;
    assert!((observed - 0.8).abs() < 0.02, "observed {observed}");
    assert_eq!(ctx.stats().total(), draws as u64);
}

#[test]
fn mutated_documents_survive_a_json_round_trip() {
    // Pinned float bounds keep every generated float exactly representable in text.
    let engine = engine(r#"{ "body": { "float": { "min": 0.5, "max": 0.5 } } }"#);
    let doc = response(sample_body());

    for group in generate(&engine, &doc, Mode::Exhaustive, 5) {
        for mutant in group.mutants {
            let text = serde_json::to_string(&mutant.document).unwrap();
            let back: Value = serde_json::from_str(&text).unwrap();
            assert_eq!(back, mutant.document);
        }
    }
}

#[test]
fn removing_one_of_three_keys_keeps_two() {
    let engine = engine(
        r#"{ "statusCode": { "enabled": false }, "headers": { "enabled": false },
             "body": { "object": { "removed": { "min": 1, "max": 1 } } } }"#,
    );
    let doc = response(json!({"a": 1, "b": 2, "c": 3}));

    for seed in 0..20 {
        for group in generate(&engine, &doc, Mode::Exhaustive, seed) {
            for mutant in group
                .mutants
                .iter()
                .filter(|m| m.operator.name == "removeElement")
            {
                let body = mutant.document["Body"].as_object().unwrap();
                assert_eq!(body.len(), 2);
                assert!(body.keys().all(|k| ["a", "b", "c"].contains(&k.as_str())));
            }
        }
    }
}

#[test]
fn boundary_on_empty_string_stays_within_branches() {
    let engine = engine(
        r#"{ "statusCode": { "enabled": false }, "headers": { "enabled": false },
             "body": { "string": { "minLength": 3, "maxLength": 10 } } }"#,
    );
    let doc = response(json!({"s": ""}));

    for seed in 0..50 {
        for group in generate(&engine, &doc, Mode::Exhaustive, seed) {
            for mutant in group
                .mutants
                .iter()
                .filter(|m| m.operator.name == "boundary")
            {
                let s = mutant.document["Body"]["s"].as_str().unwrap();
                assert!(
                    s.is_empty()
                        || s == "lowercase"
                        || s == "UPPERCASE"
                        || s.len() == 3
                        || s.len() == 10,
                    "unexpected boundary value {s:?}"
                );
            }
        }
    }
}

#[test]
fn empty_on_empty_array_yields_empty_array() {
    let engine = engine(r#"{ "statusCode": { "enabled": false }, "headers": { "enabled": false } }"#);
    let groups = generate(&engine, &response(json!({"list": []})), Mode::Exhaustive, 0);

    let empty: Vec<&Value> = groups
        .iter()
        .flat_map(|g| &g.mutants)
        .filter(|m| m.operator.name == "empty")
        .map(|m| &m.document["Body"]["list"])
        .collect();
    assert_eq!(empty, vec![&json!([])]);
}

#[test]
fn header_null_requires_component_presence() {
    let engine = engine(r#"{ "statusCode": { "enabled": false }, "body": { "enabled": false } }"#);
    let doc = json!({
        "Status Code": 302,
        "Headers": {"content-type": "text/html", "Location": "/next"},
        "Body": null
    });

    let groups = generate(&engine, &doc, Mode::Exhaustive, 0);
    let labels: Vec<(String, &str, &str)> = groups
        .iter()
        .flat_map(|g| &g.mutants)
        .map(|m| (m.origin_path.clone(), m.operator.mutator, m.operator.name))
        .collect();

    assert_eq!(
        labels,
        vec![
            ("/Headers/content-type".to_string(), "mediaType", "replace"),
            ("/Headers/content-type".to_string(), "mediaType", "null"),
            ("/Headers/content-type".to_string(), "charset", "replace"),
            ("/Headers/Location".to_string(), "location", "mutate"),
            ("/Headers/Location".to_string(), "location", "null"),
        ]
    );

    let removed = &groups[0].mutants[1].document["Headers"];
    assert_eq!(removed, &json!({"Location": "/next"}));
}
