// tests/specification_tests.rs

use std::sync::Arc;
use std::thread;

use predicate_spec::ast::build::*;
use predicate_spec::schema::{Relation, TableSchema};
use predicate_spec::{
    BindError, Error, EvalError, Params, SchemaRegistry, Specification, SqlCompiler, Templates,
    Value,
};
use serde_json::json;

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_rebinding_a_parsed_template() {
    let spec = Specification::parse("$[?(@.age > %d)]").unwrap();
    let doc = json!({"age": 30});

    assert!(spec.matches(&doc, &Params::new().arg(25)).unwrap());
    assert!(!spec.matches(&doc, &Params::new().arg(35)).unwrap());
}

#[test]
fn test_binding_leaves_the_cached_tree_untouched() {
    let spec = Specification::parse("$[?(@.age >= %d)]").unwrap();
    let before = spec.tree().clone();

    spec.bind(&Params::new().arg(25)).unwrap();
    assert_eq!(spec.tree(), &before);
    assert!(spec.tree().has_placeholders());
}

#[test]
fn test_named_parameters() {
    let spec =
        Specification::parse("$.Items[*][?(@.Price >= %(min)f && @.Price <= %(max)f)]").unwrap();
    let doc = json!({"Items": [{"Price": 12.5}, {"Price": 99}]});

    let params = Params::new().named("min", 10).named("max", 20);
    assert!(spec.matches(&doc, &params).unwrap());

    let params = Params::new().named("min", 50).named("max", 60);
    assert!(!spec.matches(&doc, &params).unwrap());
}

#[test]
fn test_params_from_vec() {
    let spec = Specification::parse("$[?(@.a == %s || @.b == %s)]").unwrap();
    let doc = json!({"a": "x", "b": "y"});
    assert!(spec.matches(&doc, &Params::from(vec!["no", "y"])).unwrap());
}

#[test]
fn test_evaluation_errors_surface() {
    let spec = Specification::parse("$[?(@.missing == 1)]").unwrap();
    assert_eq!(
        spec.matches(&json!({}), &Params::new()),
        Err(Error::Eval(EvalError::KeyNotFound("$.missing".to_string())))
    );
}

// ============================================================================
// Binding errors
// ============================================================================

#[test]
fn test_missing_positional() {
    let spec = Specification::parse("$[?(@.a == %d && @.b == %d)]").unwrap();
    assert_eq!(
        spec.bind(&Params::new().arg(1)),
        Err(BindError::MissingPositional(1))
    );
}

#[test]
fn test_missing_named() {
    let spec = Specification::parse("$[?(@.a == %(a)s)]").unwrap();
    assert_eq!(
        spec.bind(&Params::new()),
        Err(BindError::MissingNamed("a".to_string()))
    );
}

#[test]
fn test_conversion() {
    let spec = Specification::parse("$[?(@.a == %d)]").unwrap();
    assert_eq!(
        spec.matches(&json!({"a": 1}), &Params::new().arg("one")),
        Err(Error::Bind(BindError::Conversion {
            placeholder: "%d".to_string(),
            expected: "integer",
            actual: "string",
        }))
    );
}

#[test]
fn test_integer_placeholder_accepts_whole_float() {
    let spec = Specification::parse("$[?(@.a == %d)]").unwrap();
    let bound = spec.bind(&Params::new().arg(3.0)).unwrap();
    assert_eq!(bound, equal(field(global_scope(), "a"), value(3)));
}

#[test]
fn test_integer_placeholder_rejects_out_of_range_float() {
    let spec = Specification::parse("$[?(@.n == %d)]").unwrap();
    assert_eq!(
        spec.matches(&json!({"n": i64::MAX}), &Params::new().arg(1e20)),
        Err(Error::Bind(BindError::Conversion {
            placeholder: "%d".to_string(),
            expected: "integer",
            actual: "float",
        }))
    );
    assert!(spec.bind(&Params::new().arg(i64::MAX as f64)).is_err());

    let bound = spec.bind(&Params::new().arg(i64::MIN as f64)).unwrap();
    assert_eq!(bound, equal(field(global_scope(), "n"), value(i64::MIN)));
}

// ============================================================================
// SQL
// ============================================================================

#[test]
fn test_compile_bound_template() {
    let schema = SchemaRegistry::new().with(
        TableSchema::new("stores")
            .alias("s")
            .relational("Items", Relation::new("items").join("store_id", "id")),
    );
    let spec = Specification::parse("$.Items[*][?(@.Price > %d)]").unwrap();

    let compiled = spec
        .compile(
            &Params::new().arg(1000),
            SqlCompiler::with_schema(&schema, "stores"),
        )
        .unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM items AS item_1 WHERE item_1.store_id = s.id AND item_1.Price > $1)"
    );
    assert_eq!(compiled.params, vec![Value::Integer(1000)]);
}

#[test]
fn test_compile_and_match_agree() {
    let spec = Specification::parse(
        "$[?(@.status == %s && (@.total > %d || @.vip == true))]",
    )
    .unwrap();
    let params = Params::new().arg("open").arg(100);

    let compiled = spec.compile(&params, SqlCompiler::new()).unwrap();
    assert_eq!(
        compiled.sql,
        "status = $1 AND (total > $2 OR vip = $3)"
    );
    assert_eq!(
        compiled.params,
        vec![Value::from("open"), Value::Integer(100), Value::Boolean(true)]
    );

    let doc = json!({"status": "open", "total": 50, "vip": true});
    assert!(spec.matches(&doc, &params).unwrap());
}

#[test]
fn test_from_tree() {
    let spec = Specification::from_tree(greater_than(field(global_scope(), "a"), value(1)));
    assert_eq!(spec.template(), "$[?($.a > 1)]");
    assert!(spec.matches(&json!({"a": 2}), &Params::new()).unwrap());

    let reparsed = Specification::parse(spec.template()).unwrap();
    assert_eq!(reparsed.tree(), spec.tree());
}

#[test]
fn test_compile_and_match_agree_on_collections() {
    let spec =
        Specification::parse("$.Items[*][?(@.Price > %d && @.Stock > %d)]").unwrap();
    let doc = json!({
        "Items": [
            {"Price": 150, "Stock": 0},
            {"Price": 50, "Stock": 3},
        ],
    });

    let in_stock = Params::new().arg(100).arg(0);
    let compiled = spec.compile(&in_stock, SqlCompiler::new()).unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM unnest(Items) AS item_1 \
         WHERE item_1.Price > $1 AND item_1.Stock > $2)"
    );
    assert_eq!(compiled.params, vec![Value::Integer(100), Value::Integer(0)]);
    // No single item is both expensive and in stock
    assert!(!spec.matches(&doc, &in_stock).unwrap());

    let any_stock = Params::new().arg(100).arg(-1);
    assert!(spec.matches(&doc, &any_stock).unwrap());
    assert!(!spec.matches(&json!({"Items": []}), &any_stock).unwrap());
}

#[test]
fn test_from_tree_literals_reparse() {
    let tree = and(
        equal(field(global_scope(), "note"), value("say \"hi\"\n\\ done")),
        [
            greater_than(field(global_scope(), "ratio"), value(1.0)),
            less_than(field(global_scope(), "delta"), value(-2.5)),
            equal(field(global_scope(), "huge"), value(1e30)),
        ],
    );
    let spec = Specification::from_tree(tree);
    assert!(spec.template().contains("1.0"));
    assert!(!spec.template().contains("e30"));

    let reparsed = Specification::parse(spec.template()).unwrap();
    assert_eq!(reparsed.tree(), spec.tree());
}

// ============================================================================
// Template cache
// ============================================================================

#[test]
fn test_templates_parse_once() {
    let templates = Templates::new();
    let first = templates.get_or_parse("$[?(@.a == %d)]").unwrap();
    let second = templates.get_or_parse("$[?(@.a == %d)]").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(templates.len(), 1);
}

#[test]
fn test_invalid_templates_are_not_cached() {
    let templates = Templates::new();
    assert!(templates.get_or_parse("$[?(@.a ==").is_err());
    assert!(templates.is_empty());
}

#[test]
fn test_templates_are_shared_across_threads() {
    let templates = Arc::new(Templates::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let templates = Arc::clone(&templates);
            thread::spawn(move || {
                let spec = templates.get_or_parse("$[?(@.n >= %d)]").unwrap();
                spec.matches(&json!({"n": 4}), &Params::new().arg(i)).unwrap()
            })
        })
        .collect();

    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![true, true, true, true, true, false, false, false]);
    assert_eq!(templates.len(), 1);
}

#[test]
fn test_global_cache() {
    let spec = Templates::global()
        .get_or_parse("$[?(@.global_cache_probe == true)]")
        .unwrap();
    let again = Templates::global()
        .get_or_parse("$[?(@.global_cache_probe == true)]")
        .unwrap();
    assert!(Arc::ptr_eq(&spec, &again));
}
