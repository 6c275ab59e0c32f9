// Copyright © 2024 Pathway

#![allow(clippy::module_name_repetitions)]

use std::any::type_name;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::dataset::Row;
use super::error::{DynResult, Error, Result};
use super::Value;

/// Membership test applied to every record of a dataset.
///
/// Implementations must be pure with respect to the dataset: the router
/// evaluates many predicates over the same source concurrently and in no
/// particular order.
pub trait Predicate: Send + Sync {
    fn evaluate(&self, row: &Row) -> DynResult<bool>;

    fn describe(&self) -> String {
        type_name::<Self>().to_string()
    }
}

impl<F> Predicate for F
where
    F: Fn(&Row) -> DynResult<bool> + Send + Sync,
{
    fn evaluate(&self, row: &Row) -> DynResult<bool> {
        self(row)
    }

    fn describe(&self) -> String {
        "<closure>".to_string()
    }
}

/// Pins the closure signature so it is general over the row lifetime.
pub fn from_fn<F>(f: F) -> impl Predicate
where
    F: Fn(&Row) -> DynResult<bool> + Send + Sync,
{
    f
}

/// Declarative predicate over named columns.
#[derive(Debug, Clone)]
pub enum Condition {
    Const(bool),
    Equals(String, Value),
    NotEquals(String, Value),
    /// The string column matches the pattern at its start.
    Matches(String, Regex),
    IsNone(String),
    Not(Box<Condition>),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl Condition {
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals(column.into(), value.into())
    }

    pub fn not_equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::NotEquals(column.into(), value.into())
    }

    /// Anchors `pattern` at the beginning of the value, so `"Failed"` matches
    /// `"Failed"` and `"Failed: 2 rules"` but not `"NotFailed"`.
    pub fn matches(column: impl Into<String>, pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})"))
            .map_err(|e| Error::Configuration(format!("invalid pattern {pattern:?}: {e}")))?;
        Ok(Self::Matches(column.into(), regex))
    }

    pub fn is_none(column: impl Into<String>) -> Self {
        Self::IsNone(column.into())
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn into_predicate(self) -> Arc<dyn Predicate> {
        Arc::new(self)
    }
}

impl Predicate for Condition {
    fn evaluate(&self, row: &Row) -> DynResult<bool> {
        match self {
            Self::Const(value) => Ok(*value),
            Self::Equals(column, value) => Ok(row.get(column)? == value),
            Self::NotEquals(column, value) => Ok(row.get(column)? != value),
            Self::Matches(column, regex) => {
                let value = row.get(column)?;
                Ok(regex.is_match(value.as_string()?))
            }
            Self::IsNone(column) => Ok(*row.get(column)? == Value::None),
            Self::Not(inner) => Ok(!inner.evaluate(row)?),
            Self::All(conditions) => {
                for condition in conditions {
                    if !condition.evaluate(row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(conditions) => {
                for condition in conditions {
                    if condition.evaluate(row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{}", Value::Bool(*value)),
            Self::Equals(column, value) => write!(f, "{column} == {value}"),
            Self::NotEquals(column, value) => write!(f, "{column} != {value}"),
            Self::Matches(column, regex) => write!(f, "{column} ~ /{}/", regex.as_str()),
            Self::IsNone(column) => write!(f, "{column} is None"),
            Self::Not(inner) => write!(f, "not ({inner})"),
            Self::All(conditions) => write_joined(f, conditions, " and ", "True"),
            Self::Any(conditions) => write_joined(f, conditions, " or ", "False"),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    conditions: &[Condition],
    separator: &str,
    empty: &str,
) -> fmt::Result {
    if conditions.is_empty() {
        return write!(f, "{empty}");
    }
    for (index, condition) in conditions.iter().enumerate() {
        if index > 0 {
            write!(f, "{separator}")?;
        }
        write!(f, "({condition})")?;
    }
    Ok(())
}

/// A named predicate: one unit of routing work.
#[derive(Clone)]
pub struct GroupFilter {
    pub name: String,
    pub predicate: Arc<dyn Predicate>,
}

impl GroupFilter {
    pub fn new(name: impl Into<String>, predicate: impl Predicate + 'static) -> Self {
        Self {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }
}

impl fmt::Debug for GroupFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupFilter")
            .field("name", &self.name)
            .field("predicate", &self.predicate.describe())
            .finish()
    }
}
