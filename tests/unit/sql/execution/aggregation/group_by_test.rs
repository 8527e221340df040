//! Tests for GROUP BY aggregation

use crate::common::{create_test_record, find_record, init_logging, op, string};
use velocore::velocore::config::{EngineConfig, NullPolicy};
use velocore::velocore::sql::ast::Expr;
use velocore::velocore::sql::execution::aggregation::{
    Aggregation, GroupByAggregation, GroupOperationType,
};
use velocore::velocore::sql::execution::types::{
    FieldKind, FieldValue, META_ESTIMATED, StreamRecord,
};
use velocore::velocore::sql::execution::expression::SchemaLookup;

fn by_symbol(operations: Vec<(GroupOperationType, Option<&str>, &str)>, config: &EngineConfig) -> GroupByAggregation {
    GroupByAggregation::new(
        vec![("symbol".to_string(), Expr::column("symbol"))],
        operations
            .into_iter()
            .map(|(t, f, n)| op(t, f, n))
            .collect(),
        config,
    )
    .unwrap()
}

fn trade(symbol: &str, price: FieldValue) -> StreamRecord {
    create_test_record(vec![("symbol", string(symbol)), ("price", price)])
}

#[test]
fn test_sum_skips_nulls_by_default() {
    init_logging();
    let mut agg = by_symbol(
        vec![(GroupOperationType::Sum, Some("price"), "total")],
        &EngineConfig::default(),
    );
    agg.consume(&trade("AAPL", FieldValue::Long(10))).unwrap();
    agg.consume(&trade("AAPL", FieldValue::Long(20))).unwrap();
    agg.consume(&trade("AAPL", FieldValue::Null)).unwrap();

    let clip = agg.result().unwrap();
    assert_eq!(clip.len(), 1);
    assert_eq!(
        clip.records()[0].get_field("total"),
        Some(&FieldValue::Long(30))
    );
}

#[test]
fn test_sum_fails_fast_on_null() {
    let config = EngineConfig {
        null_policy: NullPolicy::FailFast,
        ..EngineConfig::default()
    };
    let mut agg = by_symbol(vec![(GroupOperationType::Sum, Some("price"), "total")], &config);
    agg.consume(&trade("AAPL", FieldValue::Long(10))).unwrap();
    agg.consume(&trade("AAPL", FieldValue::Long(20))).unwrap();
    assert!(agg.consume(&trade("AAPL", FieldValue::Null)).is_err());

    // The rejected record left no trace.
    let clip = agg.result().unwrap();
    assert_eq!(
        clip.records()[0].get_field("total"),
        Some(&FieldValue::Long(30))
    );
}

#[test]
fn test_all_operations_per_group() {
    let mut agg = by_symbol(
        vec![
            (GroupOperationType::Count, None, "trades"),
            (GroupOperationType::Sum, Some("price"), "total"),
            (GroupOperationType::Min, Some("price"), "low"),
            (GroupOperationType::Max, Some("price"), "high"),
            (GroupOperationType::Avg, Some("price"), "mean"),
        ],
        &EngineConfig::default(),
    );
    for (symbol, price) in [("AAPL", 10), ("AAPL", 30), ("MSFT", 7)] {
        agg.consume(&trade(symbol, FieldValue::Integer(price))).unwrap();
    }
    agg.consume(&trade("MSFT", FieldValue::Null)).unwrap();

    let clip = agg.result().unwrap();
    assert_eq!(clip.len(), 2);

    let aapl = find_record(&clip, "symbol", &string("AAPL"));
    assert_eq!(aapl.get_field("trades"), Some(&FieldValue::Long(2)));
    assert_eq!(aapl.get_field("total"), Some(&FieldValue::Long(40)));
    assert_eq!(aapl.get_field("low"), Some(&FieldValue::Integer(10)));
    assert_eq!(aapl.get_field("high"), Some(&FieldValue::Integer(30)));
    assert_eq!(aapl.get_field("mean"), Some(&FieldValue::Double(20.0)));

    let msft = find_record(&clip, "symbol", &string("MSFT"));
    assert_eq!(msft.get_field("trades"), Some(&FieldValue::Long(2)));
    assert_eq!(msft.get_field("mean"), Some(&FieldValue::Double(7.0)));
    // Only the key and the five requested outputs; no COUNT_FIELD companion.
    assert_eq!(msft.field_count(), 6);
}

#[test]
fn test_same_metric_under_two_names() {
    let mut agg = by_symbol(
        vec![
            (GroupOperationType::Sum, Some("price"), "a"),
            (GroupOperationType::Sum, Some("price"), "b"),
        ],
        &EngineConfig::default(),
    );
    agg.consume(&trade("X", FieldValue::Long(5))).unwrap();
    let clip = agg.result().unwrap();
    let record = &clip.records()[0];
    assert_eq!(record.get_field("a"), Some(&FieldValue::Long(5)));
    assert_eq!(record.get_field("b"), Some(&FieldValue::Long(5)));
}

#[test]
fn test_failing_key_groups_as_null() {
    let mut agg = by_symbol(
        vec![(GroupOperationType::Count, None, "n")],
        &EngineConfig::default(),
    );
    agg.consume(&create_test_record(vec![("price", FieldValue::Long(1))]))
        .unwrap();
    agg.consume(&trade("AAPL", FieldValue::Long(1))).unwrap();

    let clip = agg.result().unwrap();
    assert_eq!(clip.len(), 2);
    let null_group = find_record(&clip, "symbol", &FieldValue::Null);
    assert_eq!(null_group.get_field("n"), Some(&FieldValue::Long(1)));
}

#[test]
fn test_non_numeric_sum_is_rejected() {
    let mut agg = by_symbol(
        vec![(GroupOperationType::Sum, Some("price"), "total")],
        &EngineConfig::default(),
    );
    let err = agg.consume(&trade("AAPL", string("ten"))).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_partial_aggregations_combine() {
    let config = EngineConfig::default();
    let operations = vec![
        (GroupOperationType::Sum, Some("price"), "total"),
        (GroupOperationType::Avg, Some("price"), "mean"),
    ];
    let mut left = by_symbol(operations.clone(), &config);
    let mut right = by_symbol(operations, &config);

    left.consume(&trade("AAPL", FieldValue::Long(10))).unwrap();
    right.consume(&trade("AAPL", FieldValue::Long(20))).unwrap();
    right.consume(&trade("AAPL", FieldValue::Long(30))).unwrap();
    right.consume(&trade("MSFT", FieldValue::Long(1))).unwrap();

    left.combine(&right.data().unwrap()).unwrap();
    let clip = left.result().unwrap();
    assert_eq!(clip.len(), 2);
    let aapl = find_record(&clip, "symbol", &string("AAPL"));
    assert_eq!(aapl.get_field("total"), Some(&FieldValue::Long(60)));
    assert_eq!(aapl.get_field("mean"), Some(&FieldValue::Double(20.0)));
}

#[test]
fn test_group_sampling_reports_estimation() {
    let config = EngineConfig {
        group_entries: 16,
        ..EngineConfig::default()
    };
    let mut agg = by_symbol(vec![(GroupOperationType::Count, None, "n")], &config);
    for i in 0..200 {
        agg.consume(&trade(&format!("S{}", i), FieldValue::Long(i))).unwrap();
    }
    let clip = agg.result().unwrap();
    assert_eq!(clip.len(), 16);
    assert_eq!(
        clip.metadata().get(META_ESTIMATED),
        Some(&FieldValue::Boolean(true))
    );
}

#[test]
fn test_exact_result_metadata() {
    let mut agg = by_symbol(
        vec![(GroupOperationType::Count, None, "n")],
        &EngineConfig::default(),
    );
    agg.consume(&trade("A", FieldValue::Long(1))).unwrap();
    let clip = agg.result().unwrap();
    assert_eq!(
        clip.metadata().get(META_ESTIMATED),
        Some(&FieldValue::Boolean(false))
    );
}

#[test]
fn test_reset_clears_groups() {
    let mut agg = by_symbol(
        vec![(GroupOperationType::Count, None, "n")],
        &EngineConfig::default(),
    );
    agg.consume(&trade("A", FieldValue::Long(1))).unwrap();
    agg.reset();
    assert!(agg.result().unwrap().is_empty());
}

#[test]
fn test_result_is_stable_without_new_data() {
    let mut agg = by_symbol(
        vec![(GroupOperationType::Count, None, "n")],
        &EngineConfig::default(),
    );
    agg.consume(&trade("A", FieldValue::Long(1))).unwrap();
    let first = agg.result().unwrap();
    let second = agg.result().unwrap();
    assert_eq!(first, second);
    assert_eq!(agg.merge_count(), 1);
}

#[test]
fn test_configuration_errors() {
    let config = EngineConfig::default();
    assert!(
        GroupByAggregation::new(vec![], vec![], &config)
            .err()
            .is_some_and(|e| e.is_configuration_error())
    );
    let duplicate = GroupByAggregation::new(
        vec![("n".to_string(), Expr::column("symbol"))],
        vec![op(GroupOperationType::Count, None, "n")],
        &config,
    );
    assert!(duplicate.err().is_some_and(|e| e.is_configuration_error()));
}

#[test]
fn test_schema_lookup_skips_mistyped_values() {
    let mut agg = by_symbol(
        vec![(GroupOperationType::Sum, Some("price"), "total")],
        &EngineConfig::default(),
    )
    .with_lookup(Box::new(
        SchemaLookup::default().with_field("price", FieldKind::Long),
    ));
    agg.consume(&trade("A", FieldValue::Long(5))).unwrap();
    agg.consume(&trade("A", FieldValue::Double(2.5))).unwrap();
    let clip = agg.result().unwrap();
    assert_eq!(
        clip.records()[0].get_field("total"),
        Some(&FieldValue::Long(5))
    );
}

#[test]
fn test_numerically_equal_keys_share_a_group() {
    let mut agg = GroupByAggregation::new(
        vec![("k".to_string(), Expr::column("k"))],
        vec![op(GroupOperationType::Count, None, "n")],
        &EngineConfig::default(),
    )
    .unwrap();
    for k in [
        FieldValue::Integer(5),
        FieldValue::Long(5),
        FieldValue::Double(5.0),
        FieldValue::Double(0.0),
        FieldValue::Double(-0.0),
        FieldValue::Integer(0),
        FieldValue::Float(2.5),
        FieldValue::Double(2.5),
    ] {
        agg.consume(&create_test_record(vec![("k", k)])).unwrap();
    }

    let clip = agg.result().unwrap();
    assert_eq!(clip.len(), 3);
    // The first key seen names the group.
    let five = find_record(&clip, "k", &FieldValue::Integer(5));
    assert_eq!(five.get_field("n"), Some(&FieldValue::Long(3)));
    let zero = find_record(&clip, "k", &FieldValue::Double(0.0));
    assert_eq!(zero.get_field("n"), Some(&FieldValue::Long(3)));
    let half = find_record(&clip, "k", &FieldValue::Float(2.5));
    assert_eq!(half.get_field("n"), Some(&FieldValue::Long(2)));
}
