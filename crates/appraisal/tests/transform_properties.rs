//! Property tests for the transformer over generated record sets.
//!
//! Rows mix numeric columns, two categorical columns, true nulls and the
//! `Null` sentinel.

use appraisal::{Transformer, Validator};
use appraisal_protocol::{DataType, RecordSet, Value};
use proptest::prelude::*;
use std::collections::BTreeSet;

const COLUMNS: [&str; 4] = ["rooms", "price", "region", "kind"];
const NUMERIC: [&str; 2] = ["rooms", "price"];
const REGION: usize = 2;
const KIND: usize = 3;

fn category(choices: &'static [&'static str]) -> impl Strategy<Value = Value> {
    prop_oneof![
        6 => prop::sample::select(choices).prop_map(|c: &str| Value::from(c)),
        1 => Just(Value::from("Null")),
        1 => Just(Value::Null),
    ]
}

fn row() -> impl Strategy<Value = Vec<Value>> {
    (
        prop::option::weighted(0.9, 0i64..5_000),
        0.0f64..1e6,
        category(&["NEAR BAY", "INLAND", "ISLAND", "<1H OCEAN"]),
        category(&["house", "condo"]),
    )
        .prop_map(|(rooms, price, region, kind)| {
            vec![
                rooms.map(Value::Int).unwrap_or(Value::Null),
                Value::Float(price),
                region,
                kind,
            ]
        })
}

fn record_set(rows: Vec<Vec<Value>>) -> RecordSet {
    RecordSet::from_rows(COLUMNS.iter().map(|c| c.to_string()).collect(), rows).unwrap()
}

fn transformer() -> Transformer {
    Transformer::new(Validator::new(
        COLUMNS.iter().map(|c| c.to_string()).collect(),
    ))
}

fn is_complete(row: &[Value]) -> bool {
    !row.iter().any(|v| v.is_null() || v.is_sentinel_null())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Exactly the rows without nulls or sentinels survive.
    #[test]
    fn test_no_incomplete_rows_survive(rows in prop::collection::vec(row(), 0..40)) {
        let input = record_set(rows);
        let out = transformer().transform(&input).unwrap();

        let complete = input.rows().iter().filter(|r| is_complete(r)).count();
        prop_assert_eq!(out.len(), complete);
        for row in out.rows() {
            prop_assert!(is_complete(row));
        }
    }

    /// Width is the numeric columns plus one indicator per distinct category
    /// of every categorical column.
    #[test]
    fn test_width_counts_distinct_categories(rows in prop::collection::vec(row(), 1..40)) {
        let input = record_set(rows);
        let out = transformer().transform(&input).unwrap();

        let survivors: Vec<&Vec<Value>> = input.rows().iter().filter(|r| is_complete(r)).collect();
        prop_assume!(!survivors.is_empty());

        let distinct = |col: usize| {
            survivors
                .iter()
                .map(|r| r[col].to_string())
                .collect::<BTreeSet<_>>()
                .len()
        };
        prop_assert_eq!(out.width(), NUMERIC.len() + distinct(REGION) + distinct(KIND));
    }

    /// Indicator columns are boolean and each row sets one per categorical column.
    #[test]
    fn test_indicators_are_boolean_one_hot(rows in prop::collection::vec(row(), 1..40)) {
        let out = transformer().transform(&record_set(rows)).unwrap();
        prop_assume!(!out.is_empty());

        for field in out.fields() {
            if NUMERIC.contains(&field.name.as_str()) {
                prop_assert!(field.data_type.is_numeric());
            } else {
                prop_assert_eq!(field.data_type, DataType::Boolean);
            }
        }
        for row in out.rows() {
            let hot = row.iter().filter(|v| **v == Value::Boolean(true)).count();
            prop_assert_eq!(hot, 2);
        }
    }
}
