//! End-to-end tests for aggregation queries

use crate::common::{column, create_test_record, init_logging, op, string};
use velocore::velocore::config::EngineConfig;
use velocore::velocore::sql::ast::{BinaryOperator, Expr, OrderDirection};
use velocore::velocore::sql::execution::AggregationQuery;
use velocore::velocore::sql::execution::aggregation::{
    CountDistinctAggregation, GroupByAggregation, GroupOperationType,
};
use velocore::velocore::sql::execution::processors::{
    ComputedField, PostAggregation, PostAggregationType, SortItem,
};
use velocore::velocore::sql::execution::table_functions::TableFunction;
use velocore::velocore::sql::execution::types::{FieldKind, FieldValue, StreamRecord};

fn tags(values: &[&str]) -> FieldValue {
    FieldValue::List(values.iter().map(|v| string(v)).collect())
}

fn trade(symbol: &str, sectors: FieldValue, price: i64) -> StreamRecord {
    create_test_record(vec![
        ("symbol", string(symbol)),
        ("sectors", sectors),
        ("price", FieldValue::Long(price)),
    ])
}

fn group_by_symbol(config: &EngineConfig) -> GroupByAggregation {
    GroupByAggregation::new(
        vec![
            ("symbol".to_string(), Expr::column("symbol")),
            ("sectors".to_string(), Expr::column("sectors")),
        ],
        vec![
            op(GroupOperationType::Count, None, "trades"),
            op(GroupOperationType::Sum, Some("price"), "volume"),
            op(GroupOperationType::Avg, Some("price"), "mean"),
        ],
        config,
    )
    .unwrap()
}

fn post_aggregations() -> Vec<PostAggregation> {
    vec![
        PostAggregation::Culling {
            fields: vec!["trades".to_string()],
        },
        PostAggregation::OrderBy {
            fields: vec![SortItem::new(Expr::column("volume"), OrderDirection::Desc)],
        },
        PostAggregation::Having {
            expression: Expr::binary(
                Expr::column("trades"),
                BinaryOperator::GreaterThanOrEqual,
                Expr::literal("2", FieldKind::Long),
            ),
        },
        PostAggregation::Computation {
            fields: vec![ComputedField::new(
                "spread",
                Expr::binary(
                    Expr::column("volume"),
                    BinaryOperator::Subtract,
                    Expr::column("mean"),
                ),
            )],
        },
    ]
}

fn explode_sectors() -> Vec<TableFunction> {
    vec![TableFunction::lateral_view(
        TableFunction::explode(Expr::column("sectors"), "sector", false),
        false,
    )]
}

fn feed(query: &mut AggregationQuery) {
    for (symbol, sectors, price) in [
        ("AAPL", &["tech", "hardware"][..], 10),
        ("AAPL", &["tech", "hardware"][..], 30),
        ("MSFT", &["tech"][..], 50),
        ("MSFT", &["tech"][..], 70),
        ("XOM", &["energy"][..], 1000),
    ] {
        query.consume(&trade(symbol, tags(sectors), price)).unwrap();
    }
}

#[test]
fn test_group_by_with_full_pipeline() {
    init_logging();
    let config = EngineConfig::default();
    let mut query = AggregationQuery::new(
        Box::new(group_by_symbol(&config)),
        post_aggregations(),
        explode_sectors(),
        config,
    )
    .unwrap();
    assert_eq!(
        query.pipeline().stages(),
        vec![
            PostAggregationType::Having,
            PostAggregationType::Computation,
            PostAggregationType::OrderBy,
            PostAggregationType::Culling,
        ]
    );

    feed(&mut query);
    assert_eq!(query.consumed(), 5);

    let clip = query.finish().unwrap();
    // XOM fails HAVING; MSFT sorts first by volume; AAPL explodes into two sectors.
    assert_eq!(
        column(&clip, "symbol"),
        vec![string("MSFT"), string("AAPL"), string("AAPL")]
    );
    assert_eq!(
        column(&clip, "sector"),
        vec![string("tech"), string("tech"), string("hardware")]
    );
    assert_eq!(
        column(&clip, "spread"),
        vec![
            FieldValue::Double(60.0),
            FieldValue::Double(20.0),
            FieldValue::Double(20.0)
        ]
    );
    assert!(clip.records().iter().all(|r| !r.has_field("trades")));
    assert!(clip.records().iter().all(|r| r.has_field("sectors")));
}

#[test]
fn test_result_cap_applies_after_table_functions() {
    let config = EngineConfig {
        max_result_records: 2,
        ..EngineConfig::default()
    };
    let mut query = AggregationQuery::new(
        Box::new(group_by_symbol(&config)),
        post_aggregations(),
        explode_sectors(),
        config,
    )
    .unwrap();
    feed(&mut query);
    let clip = query.finish().unwrap();
    assert_eq!(clip.len(), 2);
    assert_eq!(column(&clip, "symbol"), vec![string("MSFT"), string("AAPL")]);
}

#[test]
fn test_partial_queries_combine() {
    let config = EngineConfig::default();
    let build = || {
        AggregationQuery::new(
            Box::new(group_by_symbol(&config)),
            vec![PostAggregation::OrderBy {
                fields: vec![SortItem::new(Expr::column("symbol"), OrderDirection::Asc)],
            }],
            vec![],
            config.clone(),
        )
        .unwrap()
    };
    let mut left = build();
    let mut right = build();
    left.consume(&trade("AAPL", tags(&["tech"]), 10)).unwrap();
    right.consume(&trade("AAPL", tags(&["tech"]), 20)).unwrap();
    right.consume(&trade("BABA", tags(&["retail"]), 5)).unwrap();

    left.combine(&right.data().unwrap()).unwrap();
    let clip = left.finish().unwrap();
    assert_eq!(column(&clip, "symbol"), vec![string("AAPL"), string("BABA")]);
    assert_eq!(
        column(&clip, "volume"),
        vec![FieldValue::Long(30), FieldValue::Long(5)]
    );
    assert_eq!(column(&clip, "trades"), vec![FieldValue::Long(2), FieldValue::Long(1)]);
}

#[test]
fn test_reset_starts_over() {
    let config = EngineConfig::default();
    let mut query =
        AggregationQuery::new(Box::new(group_by_symbol(&config)), vec![], vec![], config).unwrap();
    feed(&mut query);
    query.reset();
    assert_eq!(query.consumed(), 0);
    assert!(query.finish().unwrap().is_empty());

    query.consume(&trade("IBM", tags(&[]), 1)).unwrap();
    assert_eq!(query.finish().unwrap().len(), 1);
}

#[test]
fn test_count_distinct_query() {
    let config = EngineConfig::default();
    let aggregation = CountDistinctAggregation::new(
        vec![Expr::column("symbol")],
        Some("symbols".to_string()),
        &config,
    )
    .unwrap();
    let mut query = AggregationQuery::new(
        Box::new(aggregation),
        vec![PostAggregation::Computation {
            fields: vec![ComputedField::new(
                "doubled",
                Expr::binary(
                    Expr::column("symbols"),
                    BinaryOperator::Multiply,
                    Expr::literal("2", FieldKind::Long),
                ),
            )],
        }],
        vec![],
        config,
    )
    .unwrap();
    feed(&mut query);
    let clip = query.finish().unwrap();
    assert_eq!(column(&clip, "symbols"), vec![FieldValue::Long(3)]);
    assert_eq!(column(&clip, "doubled"), vec![FieldValue::Long(6)]);
}

#[test]
fn test_invalid_setup_rejected() {
    let config = EngineConfig::default();
    let bad_config = EngineConfig {
        count_distinct_entries: 100,
        ..EngineConfig::default()
    };
    assert!(
        AggregationQuery::new(Box::new(group_by_symbol(&config)), vec![], vec![], bad_config)
            .err()
            .is_some_and(|e| e.is_configuration_error())
    );
    assert!(
        AggregationQuery::new(
            Box::new(group_by_symbol(&config)),
            vec![PostAggregation::OrderBy { fields: vec![] }],
            vec![],
            config.clone(),
        )
        .is_err()
    );
    assert!(
        AggregationQuery::new(
            Box::new(group_by_symbol(&config)),
            vec![],
            vec![TableFunction::explode(Expr::column("sectors"), "", false)],
            config,
        )
        .is_err()
    );
}
