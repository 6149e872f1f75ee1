// tests/compiler_tests.rs

use predicate_spec::ast::build::*;
use predicate_spec::ast::{Placeholder, PlaceholderKind};
use predicate_spec::schema::{Relation, TableSchema};
use predicate_spec::{CompileError, Node, SchemaRegistry, SqlCompiler, Value, compile_to_sql};

fn sql(node: &Node) -> String {
    compile_to_sql(node).unwrap().sql
}

fn global(name: &str) -> Node {
    field(global_scope(), name)
}

fn items() -> Node {
    object(global_scope(), "Items")
}

fn stores_schema() -> SchemaRegistry {
    SchemaRegistry::new()
        .with(
            TableSchema::new("stores")
                .alias("s")
                .relational("Items", Relation::new("items").join("store_id", "id")),
        )
        .with(
            TableSchema::new("items")
                .relational("Variants", Relation::new("variants").join("item_id", "id")),
        )
}

// ============================================================================
// Values and placeholders
// ============================================================================

#[test]
fn test_comparison_with_parameter() {
    let compiled = compile_to_sql(&greater_than_equal(global("age"), value(18))).unwrap();
    assert_eq!(compiled.sql, "age >= $1");
    assert_eq!(compiled.params, vec![Value::Integer(18)]);
}

#[test]
fn test_values_are_never_inlined() {
    let node = and(
        equal(global("name"), value("O'Brien")),
        [not_equal(global("status"), value("closed"))],
    );
    let compiled = compile_to_sql(&node).unwrap();
    assert_eq!(compiled.sql, "name = $1 AND status <> $2");
    assert_eq!(
        compiled.params,
        vec![Value::from("O'Brien"), Value::from("closed")]
    );
}

#[test]
fn test_parameters_follow_placeholder_order() {
    let node = or(
        less_than(value(1), global("a")),
        [greater_than(global("b"), value(2))],
    );
    let compiled = compile_to_sql(&node).unwrap();
    assert_eq!(compiled.sql, "$1 < a OR b > $2");
    assert_eq!(compiled.params, vec![Value::Integer(1), Value::Integer(2)]);
}

#[test]
fn test_nested_path_is_dotted() {
    let city = field(object(global_scope(), "address"), "city");
    assert_eq!(sql(&equal(city, value("Oslo"))), "address.city = $1");
}

#[test]
fn test_unbound_placeholder() {
    let node = equal(
        global("a"),
        placeholder(Placeholder::named("a", PlaceholderKind::Integer)),
    );
    assert_eq!(
        compile_to_sql(&node),
        Err(CompileError::UnboundPlaceholder("%(a)d".to_string()))
    );
}

// ============================================================================
// Parentheses
// ============================================================================

#[test]
fn test_or_inside_and_is_parenthesized() {
    let node = and(
        or(equal(global("a"), value(1)), [equal(global("b"), value(2))]),
        [equal(global("c"), value(3))],
    );
    assert_eq!(sql(&node), "(a = $1 OR b = $2) AND c = $3");
}

#[test]
fn test_and_inside_or_is_not_parenthesized() {
    let node = or(
        and(equal(global("a"), value(1)), [equal(global("b"), value(2))]),
        [equal(global("c"), value(3))],
    );
    assert_eq!(sql(&node), "a = $1 AND b = $2 OR c = $3");
}

#[test]
fn test_left_associative_chains() {
    let a = global("a");
    let b = global("b");
    let c = global("c");

    assert_eq!(
        sql(&equal(subtract(subtract(a.clone(), b.clone()), c.clone()), value(0))),
        "a - b - c = $1"
    );
    assert_eq!(
        sql(&equal(subtract(a.clone(), subtract(b.clone(), c.clone())), value(0))),
        "a - (b - c) = $1"
    );
    assert_eq!(
        sql(&infix(
            equal(a.clone(), value(1)),
            predicate_spec::Operator::And,
            and(equal(b, value(2)), [equal(c, value(3))]),
        )),
        "a = $1 AND (b = $2 AND c = $3)"
    );
}

#[test]
fn test_arithmetic_precedence() {
    let node = greater_than(
        multiply(add(global("price"), global("tax")), value(2)),
        add(value(10), multiply(global("qty"), value(3))),
    );
    assert_eq!(sql(&node), "(price + tax) * $1 > $2 + qty * $3");
}

#[test]
fn test_comparisons_are_not_associative() {
    let node = equal(equal(global("a"), global("b")), value(true));
    assert_eq!(sql(&node), "(a = b) = $1");
}

#[test]
fn test_not() {
    assert_eq!(sql(&not(equal(global("a"), value(1)))), "NOT a = $1");
    assert_eq!(
        sql(&not(or(global("a"), [global("b")]))),
        "NOT (a OR b)"
    );
    assert_eq!(sql(&not(not(global("a")))), "NOT NOT a");
}

#[test]
fn test_signs() {
    assert_eq!(sql(&equal(negative(global("a")), value(1))), "-a = $1");
    assert_eq!(
        sql(&equal(negative(negative(global("a"))), value(1))),
        "-(-a) = $1"
    );
}

#[test]
fn test_null_checks() {
    assert_eq!(sql(&is_null(global("deleted_at"))), "deleted_at IS NULL");
    assert_eq!(
        sql(&and(is_not_null(global("a")), [global("b")])),
        "a IS NOT NULL AND b"
    );
}

// ============================================================================
// Embedded collections
// ============================================================================

#[test]
fn test_embedded_wildcard() {
    let node = collection(items(), greater_than(field(item(), "Price"), value(1000)));
    let compiled = compile_to_sql(&node).unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM unnest(Items) AS item_1 WHERE item_1.Price > $1)"
    );
    assert_eq!(compiled.params, vec![Value::Integer(1000)]);
}

#[test]
fn test_aliases_are_unique_per_compilation() {
    let node = and(
        collection(items(), greater_than(field(item(), "Price"), value(1))),
        [collection(
            object(global_scope(), "Categories"),
            equal(field(item(), "Name"), value("tech")),
        )],
    );
    assert_eq!(
        sql(&node),
        "EXISTS (SELECT 1 FROM unnest(Items) AS item_1 WHERE item_1.Price > $1) \
         AND EXISTS (SELECT 1 FROM unnest(Categories) AS category_2 WHERE category_2.Name = $2)"
    );
}

#[test]
fn test_nested_embedded_wildcards() {
    let node = collection(
        items(),
        collection(
            object(item(), "Tags"),
            equal(field(item(), "Label"), value("sale")),
        ),
    );
    assert_eq!(
        sql(&node),
        "EXISTS (SELECT 1 FROM unnest(Items) AS item_1 WHERE \
         EXISTS (SELECT 1 FROM unnest(item_1.Tags) AS tag_2 WHERE tag_2.Label = $1))"
    );
}

#[test]
fn test_root_fields_inside_wildcard_are_unqualified() {
    let node = collection(items(), greater_than(field(item(), "Price"), global("limit")));
    assert_eq!(
        sql(&node),
        "EXISTS (SELECT 1 FROM unnest(Items) AS item_1 WHERE item_1.Price > limit)"
    );
}

// ============================================================================
// Relational collections
// ============================================================================

#[test]
fn test_relational_wildcard() {
    let schema = stores_schema();
    let node = collection(items(), greater_than(field(item(), "Price"), value(1000)));
    let compiled = SqlCompiler::with_schema(&schema, "stores").compile(&node).unwrap();

    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM items AS item_1 WHERE item_1.store_id = s.id AND item_1.Price > $1)"
    );
    assert_eq!(compiled.params, vec![Value::Integer(1000)]);
}

#[test]
fn test_relational_predicate_is_grouped_after_join() {
    let schema = stores_schema();
    let node = collection(
        items(),
        or(
            less_than(field(item(), "Price"), value(10)),
            [greater_than(field(item(), "Price"), value(1000))],
        ),
    );
    let compiled = SqlCompiler::with_schema(&schema, "stores").compile(&node).unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM items AS item_1 WHERE item_1.store_id = s.id \
         AND (item_1.Price < $1 OR item_1.Price > $2))"
    );
}

#[test]
fn test_nested_relational_joins_to_outer_alias() {
    let schema = stores_schema();
    let node = collection(
        items(),
        collection(
            object(item(), "Variants"),
            greater_than(field(item(), "Stock"), value(0)),
        ),
    );
    let compiled = SqlCompiler::with_schema(&schema, "stores").compile(&node).unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM items AS item_1 WHERE item_1.store_id = s.id AND \
         EXISTS (SELECT 1 FROM variants AS variant_2 WHERE variant_2.item_id = item_1.id \
         AND variant_2.Stock > $1))"
    );
}

#[test]
fn test_unmapped_collection_inside_relational_is_embedded() {
    let schema = stores_schema();
    let node = collection(
        items(),
        collection(
            object(item(), "Tags"),
            equal(field(item(), "Label"), value("sale")),
        ),
    );
    let compiled = SqlCompiler::with_schema(&schema, "stores").compile(&node).unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM items AS item_1 WHERE item_1.store_id = s.id AND \
         EXISTS (SELECT 1 FROM unnest(item_1.Tags) AS tag_2 WHERE tag_2.Label = $1))"
    );
}

#[test]
fn test_composite_keys_and_custom_alias() {
    let schema = SchemaRegistry::new().with(TableSchema::new("orders").relational(
        "Lines",
        Relation::new("order_lines")
            .join("order_id", "id")
            .join("region", "region")
            .alias("ol"),
    ));
    let node = collection(
        object(global_scope(), "Lines"),
        greater_than(field(item(), "Qty"), value(1)),
    );
    let compiled = SqlCompiler::with_schema(&schema, "orders").compile(&node).unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM order_lines AS ol_1 WHERE ol_1.order_id = orders.id \
         AND ol_1.region = orders.region AND ol_1.Qty > $1)"
    );
}

#[test]
fn test_unknown_table_falls_back_to_embedded() {
    let schema = stores_schema();
    let node = collection(items(), greater_than(field(item(), "Price"), value(1)));
    let compiled = SqlCompiler::with_schema(&schema, "warehouses").compile(&node).unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM unnest(Items) AS item_1 WHERE item_1.Price > $1)"
    );
}

#[test]
fn test_root_collection_inside_wildcard_joins_the_root_row() {
    let schema = SchemaRegistry::new().with(
        TableSchema::new("stores")
            .alias("s")
            .relational("Items", Relation::new("items").join("store_id", "id"))
            .relational("Staff", Relation::new("staff").join("store_id", "id")),
    );
    let node = collection(
        items(),
        and(
            greater_than(field(item(), "Price"), value(100)),
            [collection(
                object(global_scope(), "Staff"),
                equal(field(item(), "Role"), value("manager")),
            )],
        ),
    );
    let compiled = SqlCompiler::with_schema(&schema, "stores").compile(&node).unwrap();
    assert_eq!(
        compiled.sql,
        "EXISTS (SELECT 1 FROM items AS item_1 WHERE item_1.store_id = s.id \
         AND item_1.Price > $1 AND \
         EXISTS (SELECT 1 FROM staff AS staff_2 WHERE staff_2.store_id = s.id \
         AND staff_2.Role = $2))"
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_item_outside_wildcard() {
    let node = equal(field(item(), "a"), value(1));
    assert_eq!(compile_to_sql(&node), Err(CompileError::ItemOutsideWildcard));
}

#[test]
fn test_scope_used_as_value() {
    let node = equal(object(global_scope(), "user"), value(1));
    assert_eq!(
        compile_to_sql(&node),
        Err(CompileError::ScopeAsValue("$.user".to_string()))
    );
}

#[test]
fn test_collection_needs_named_parent() {
    let node = collection(global_scope(), value(true));
    assert_eq!(compile_to_sql(&node), Err(CompileError::InvalidCollection));
}

#[test]
fn test_invalid_identifier() {
    let node = equal(global("name; DROP TABLE users"), value(1));
    assert_eq!(
        compile_to_sql(&node),
        Err(CompileError::InvalidIdentifier("name; DROP TABLE users".to_string()))
    );
}

fn injected_schema(relation: Relation, parent_alias: &str) -> SchemaRegistry {
    SchemaRegistry::new().with(
        TableSchema::new("stores")
            .alias(parent_alias)
            .relational("Items", relation),
    )
}

fn compile_items(schema: &SchemaRegistry) -> Result<String, CompileError> {
    let node = collection(items(), greater_than(field(item(), "Price"), value(1)));
    SqlCompiler::with_schema(schema, "stores")
        .compile(&node)
        .map(|compiled| compiled.sql)
}

#[test]
fn test_schema_identifiers_are_validated() {
    let bad_key = injected_schema(
        Relation::new("items").join("store_id = 0 OR true --", "id"),
        "s",
    );
    assert_eq!(
        compile_items(&bad_key),
        Err(CompileError::InvalidIdentifier("store_id = 0 OR true --".to_string()))
    );

    let bad_parent_key = injected_schema(Relation::new("items").join("store_id", "id;"), "s");
    assert_eq!(
        compile_items(&bad_parent_key),
        Err(CompileError::InvalidIdentifier("id;".to_string()))
    );

    let bad_alias = injected_schema(
        Relation::new("items").join("store_id", "id").alias("x y"),
        "s",
    );
    assert_eq!(
        compile_items(&bad_alias),
        Err(CompileError::InvalidIdentifier("x y".to_string()))
    );

    let bad_parent_alias = injected_schema(
        Relation::new("items").join("store_id", "id"),
        "s) OR 1=1 --",
    );
    assert_eq!(
        compile_items(&bad_parent_alias),
        Err(CompileError::InvalidIdentifier("s) OR 1=1 --".to_string()))
    );

    let bad_table = injected_schema(Relation::new("items i").join("store_id", "id"), "s");
    assert_eq!(
        compile_items(&bad_table),
        Err(CompileError::InvalidIdentifier("items i".to_string()))
    );
}
