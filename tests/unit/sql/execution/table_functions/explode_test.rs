//! Tests for EXPLODE and LATERAL VIEW

use crate::common::{column, create_test_record, string};
use std::collections::BTreeMap;
use velocore::velocore::sql::ast::Expr;
use velocore::velocore::sql::execution::table_functions::{
    ExplodeFunctor, LateralViewFunctor, TableFunction, TableFunctionType, expand,
};
use velocore::velocore::sql::execution::types::{FieldValue, StreamRecord};

fn order() -> StreamRecord {
    let mut prices = BTreeMap::new();
    prices.insert("apple".to_string(), FieldValue::Double(1.5));
    prices.insert("pear".to_string(), FieldValue::Double(2.0));
    create_test_record(vec![
        ("id", FieldValue::Long(7)),
        ("items", FieldValue::List(vec![string("apple"), string("pear"), string("fig")])),
        ("prices", FieldValue::Map(prices)),
        ("empty", FieldValue::List(vec![])),
        ("nothing", FieldValue::Null),
        ("scalar", FieldValue::Integer(3)),
    ])
}

fn run(function: TableFunction, record: &StreamRecord) -> Vec<StreamRecord> {
    let functor = function.to_functor().unwrap();
    functor.apply(record).collect()
}

#[test]
fn test_explode_list() {
    let rows = run(TableFunction::explode(Expr::column("items"), "item", false), &order());
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get_field("item"), Some(&string("apple")));
    assert_eq!(rows[2].get_field("item"), Some(&string("fig")));
    // Plain EXPLODE rows carry only the generated column.
    assert!(rows.iter().all(|r| r.field_count() == 1));
}

#[test]
fn test_explode_map_with_value_alias() {
    let rows = run(
        TableFunction::explode_map(Expr::column("prices"), "fruit", "price", false),
        &order(),
    );
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get_field("fruit"), Some(&string("apple")));
    assert_eq!(rows[0].get_field("price"), Some(&FieldValue::Double(1.5)));
    assert_eq!(rows[1].get_field("fruit"), Some(&string("pear")));
}

#[test]
fn test_explode_map_without_value_alias_keeps_keys() {
    let rows = run(TableFunction::explode(Expr::column("prices"), "fruit", false), &order());
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.field_count() == 1));
}

#[test]
fn test_empty_inputs_with_and_without_outer() {
    for field in ["empty", "nothing", "scalar", "missing"] {
        let inner = run(TableFunction::explode(Expr::column(field), "v", false), &order());
        assert!(inner.is_empty(), "{} produced rows", field);

        let outer = run(TableFunction::explode(Expr::column(field), "v", true), &order());
        assert_eq!(outer, vec![StreamRecord::empty()], "{} with OUTER", field);
    }
}

#[test]
fn test_lateral_view_joins_input() {
    let view = TableFunction::lateral_view(
        TableFunction::explode(Expr::column("items"), "item", false),
        false,
    );
    assert!(view.is_lateral_view());
    assert_eq!(view.function_type(), TableFunctionType::Explode);

    let rows = run(view, &order());
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.get_field("id"), Some(&FieldValue::Long(7)));
        assert!(row.has_field("items"));
    }
    assert_eq!(rows[1].get_field("item"), Some(&string("pear")));
}

#[test]
fn test_lateral_view_outer_keeps_record() {
    let record = order();
    let dropped = run(
        TableFunction::lateral_view(TableFunction::explode(Expr::column("empty"), "v", false), false),
        &record,
    );
    assert!(dropped.is_empty());

    let kept = run(
        TableFunction::lateral_view(TableFunction::explode(Expr::column("empty"), "v", false), true),
        &record,
    );
    assert_eq!(kept, vec![record]);
}

#[test]
fn test_generated_fields_overwrite_on_clash() {
    let rows = run(
        TableFunction::lateral_view(TableFunction::explode(Expr::column("items"), "id", false), false),
        &order(),
    );
    assert_eq!(rows[0].get_field("id"), Some(&string("apple")));
}

#[test]
fn test_invalid_declarations() {
    let nested = TableFunction::lateral_view(
        TableFunction::lateral_view(TableFunction::explode(Expr::column("items"), "i", false), false),
        false,
    );
    assert!(nested.to_functor().err().is_some_and(|e| e.is_configuration_error()));

    assert!(TableFunction::explode(Expr::column("items"), " ", false).to_functor().is_err());
    assert!(
        TableFunction::explode_map(Expr::column("prices"), "k", "k", false)
            .to_functor()
            .is_err()
    );
    assert!(
        TableFunction::explode_map(Expr::column("prices"), "k", "", false)
            .to_functor()
            .is_err()
    );
}

#[test]
fn test_expand_chains_functors() {
    let nested = create_test_record(vec![
        ("id", FieldValue::Long(1)),
        (
            "matrix",
            FieldValue::List(vec![
                FieldValue::List(vec![FieldValue::Long(1), FieldValue::Long(2)]),
                FieldValue::List(vec![FieldValue::Long(3)]),
            ]),
        ),
    ]);
    let functors = vec![
        TableFunction::lateral_view(TableFunction::explode(Expr::column("matrix"), "row", false), false)
            .to_functor()
            .unwrap(),
        TableFunction::lateral_view(TableFunction::explode(Expr::column("row"), "cell", false), false)
            .to_functor()
            .unwrap(),
    ];
    let rows = expand(vec![nested], &functors);
    let clip = velocore::velocore::sql::execution::types::Clip::from_records(rows);
    assert_eq!(
        column(&clip, "cell"),
        vec![FieldValue::Long(1), FieldValue::Long(2), FieldValue::Long(3)]
    );
}

#[test]
fn test_declarations_deserialize() {
    let json = r#"{
        "type": "LATERAL_VIEW",
        "spec": {
            "outer": true,
            "inner": {
                "type": "EXPLODE",
                "spec": { "field": {"Column": "items"}, "key_alias": "item" }
            }
        }
    }"#;
    let function: TableFunction = serde_json::from_str(json).unwrap();
    assert_eq!(
        function,
        TableFunction::lateral_view(TableFunction::explode(Expr::column("items"), "item", false), true)
    );
}

#[test]
fn test_declarations_survive_yaml_round_trip() {
    let declared = vec![
        TableFunction::lateral_view(
            TableFunction::explode_map(Expr::column("prices"), "fruit", "price", false),
            true,
        ),
        TableFunction::explode(Expr::size_of("items"), "n", true),
    ];
    let yaml = serde_yaml::to_string(&declared).unwrap();
    let restored: Vec<TableFunction> = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(restored, declared);

    let functors = vec![restored[0].to_functor().unwrap()];
    let rows = expand(vec![order()], &functors);
    let clip = velocore::velocore::sql::execution::types::Clip::from_records(rows);
    assert_eq!(column(&clip, "fruit"), vec![string("apple"), string("pear")]);
    assert_eq!(
        column(&clip, "price"),
        vec![FieldValue::Double(1.5), FieldValue::Double(2.0)]
    );
    assert_eq!(column(&clip, "id"), vec![FieldValue::Long(7), FieldValue::Long(7)]);
}

#[test]
fn test_native_yaml_expression_syntax() {
    let yaml = r#"
type: LATERAL_VIEW
spec:
  inner:
    type: EXPLODE
    spec:
      field: !Column items
      key_alias: item
"#;
    let function: TableFunction = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        function,
        TableFunction::lateral_view(TableFunction::explode(Expr::column("items"), "item", false), false)
    );
}

#[test]
fn test_functor_constructors_validate() {
    let err = ExplodeFunctor::new(Expr::column("items"), "".into(), None, true)
        .err()
        .unwrap();
    assert!(err.is_configuration_error());

    let nested = TableFunction::lateral_view(TableFunction::explode(Expr::column("items"), "item", false), false)
        .to_functor()
        .unwrap();
    let err = LateralViewFunctor::new(nested, true).err().unwrap();
    assert!(err.is_configuration_error());
}
