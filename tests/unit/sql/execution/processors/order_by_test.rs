//! Tests for ORDER BY processing

use crate::common::{column, create_test_record, string};
use velocore::velocore::sql::ast::{Expr, OrderDirection};
use velocore::velocore::sql::execution::processors::{
    OrderProcessor, PostAggregationType, PostProcessor, SortItem,
};
use velocore::velocore::sql::execution::types::{Clip, FieldValue};

fn row(id: i64, group: FieldValue, score: FieldValue) -> velocore::velocore::sql::execution::types::StreamRecord {
    create_test_record(vec![
        ("id", FieldValue::Long(id)),
        ("group", group),
        ("score", score),
    ])
}

fn ids(clip: &Clip) -> Vec<FieldValue> {
    column(clip, "id")
}

fn longs(values: &[i64]) -> Vec<FieldValue> {
    values.iter().map(|v| FieldValue::Long(*v)).collect()
}

#[test]
fn test_multi_key_ascending_then_descending() {
    let clip = Clip::from_records(vec![
        row(1, string("b"), FieldValue::Integer(5)),
        row(2, string("a"), FieldValue::Integer(1)),
        row(3, string("a"), FieldValue::Integer(9)),
        row(4, FieldValue::Null, FieldValue::Integer(3)),
        row(5, string("b"), FieldValue::Null),
    ]);
    let processor = OrderProcessor::new(vec![
        SortItem::new(Expr::column("group"), OrderDirection::Asc),
        SortItem::new(Expr::column("score"), OrderDirection::Desc),
    ])
    .unwrap();
    let sorted = processor.process(clip).unwrap();
    assert_eq!(ids(&sorted), longs(&[4, 3, 2, 5, 1]));
    assert_eq!(processor.post_type(), PostAggregationType::OrderBy);
}

#[test]
fn test_nulls_first_in_both_directions() {
    let records = vec![
        row(1, string("x"), FieldValue::Double(2.0)),
        row(2, string("x"), FieldValue::Null),
        row(3, string("x"), FieldValue::Long(7)),
    ];
    let asc = OrderProcessor::new(vec![SortItem::new(Expr::column("score"), OrderDirection::Asc)])
        .unwrap()
        .process(Clip::from_records(records.clone()))
        .unwrap();
    assert_eq!(ids(&asc), longs(&[2, 1, 3]));

    let desc =
        OrderProcessor::new(vec![SortItem::new(Expr::column("score"), OrderDirection::Desc)])
            .unwrap()
            .process(Clip::from_records(records))
            .unwrap();
    assert_eq!(ids(&desc), longs(&[2, 3, 1]));
}

#[test]
fn test_sort_is_stable() {
    let clip = Clip::from_records(
        (1..=6)
            .map(|i| row(i, string(if i % 2 == 0 { "even" } else { "odd" }), FieldValue::Null))
            .collect(),
    );
    let sorted = OrderProcessor::new(vec![SortItem::new(Expr::column("group"), OrderDirection::Asc)])
        .unwrap()
        .process(clip)
        .unwrap();
    assert_eq!(ids(&sorted), longs(&[2, 4, 6, 1, 3, 5]));
}

#[test]
fn test_unevaluable_key_sorts_as_null() {
    let clip = Clip::from_records(vec![
        row(1, string("x"), FieldValue::Long(1)),
        create_test_record(vec![("id", FieldValue::Long(2))]),
        row(3, string("x"), FieldValue::Long(0)),
    ]);
    let sorted = OrderProcessor::new(vec![SortItem::new(Expr::column("score"), OrderDirection::Asc)])
        .unwrap()
        .process(clip)
        .unwrap();
    assert_eq!(ids(&sorted), longs(&[2, 3, 1]));
}

#[test]
fn test_metadata_survives_sort() {
    let mut clip = Clip::from_records(vec![
        row(2, string("x"), FieldValue::Long(2)),
        row(1, string("x"), FieldValue::Long(1)),
    ]);
    clip.set_metadata("estimated", FieldValue::Boolean(false));
    let sorted = OrderProcessor::new(vec![SortItem::new(Expr::column("id"), OrderDirection::Asc)])
        .unwrap()
        .process(clip)
        .unwrap();
    assert_eq!(ids(&sorted), longs(&[1, 2]));
    assert_eq!(
        sorted.metadata().get("estimated"),
        Some(&FieldValue::Boolean(false))
    );
}

#[test]
fn test_empty_sort_key_list_is_rejected() {
    let err = OrderProcessor::new(vec![]).err().unwrap();
    assert!(err.is_configuration_error());
}
