// Copyright © 2024 Pathway

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::Arc;

use group_router::connectors::{QualityEvaluator, QUALITY_VERDICT_COLUMN};
use group_router::engine::error::DynResult;
use group_router::engine::{
    ColumnDefinition, Dataset, Error, Key, Record, ReportError, Schema, Type, Value,
};

pub const FAILED_RECORD_IDS: [i64; 2] = [3, 7];

#[derive(Debug, Default)]
pub struct PanicErrorReporter {}

impl ReportError for PanicErrorReporter {
    fn report(&self, error: Error) {
        panic!("Error: {error:?}");
    }
}

pub fn status_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        ColumnDefinition::new("id", Type::Int),
        ColumnDefinition::new("status", Type::String),
    ]))
}

pub fn record_key(id: i64) -> Key {
    Key::for_values(&[Value::Int(id)])
}

/// Ten records keyed by their `id`; records 3 and 7 have status `"Failed"`.
pub fn status_dataset() -> Dataset {
    let records = (0..10)
        .map(|id| {
            let status = if FAILED_RECORD_IDS.contains(&id) {
                "Failed"
            } else if id % 2 == 0 {
                "Passed"
            } else {
                "Skipped"
            };
            Record::new(
                record_key(id),
                vec![Value::Int(id), Value::from(status)],
            )
        })
        .collect();
    Dataset::new(status_schema(), records).expect("dataset should be valid")
}

/// `n` records with a single integer column `x` holding `0..n`.
pub fn numbers_dataset(n: i64) -> Dataset {
    Dataset::from_rows(
        Schema::new(vec![ColumnDefinition::new("x", Type::Int)]),
        (0..n).map(|x| vec![Value::Int(x)]),
    )
    .expect("dataset should be valid")
}

pub fn ids(dataset: &Dataset) -> BTreeSet<i64> {
    dataset
        .column("id")
        .expect("id column should exist")
        .into_iter()
        .map(|value| value.as_int().expect("id should be an integer"))
        .collect()
}

pub fn xs(dataset: &Dataset) -> BTreeSet<i64> {
    dataset
        .column("x")
        .expect("x column should exist")
        .into_iter()
        .map(|value| value.as_int().expect("x should be an integer"))
        .collect()
}

/// Fails every record whose `rating` is missing or outside `1.0..=10.0`.
pub struct RatingEvaluator;

impl QualityEvaluator for RatingEvaluator {
    fn evaluate(&self, data: &Dataset) -> DynResult<Dataset> {
        data.with_column(
            ColumnDefinition::new(QUALITY_VERDICT_COLUMN, Type::String),
            |row| {
                let verdict = match row.get("rating")? {
                    Value::Float(rating) if (1.0..=10.0).contains(&rating.into_inner()) => {
                        "Passed"
                    }
                    _ => "Failed",
                };
                Ok(Value::from(verdict))
            },
        )
    }
}
