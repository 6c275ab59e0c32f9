// Copyright © 2024 Pathway

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use itertools::Itertools as _;

use super::error::{DynError, DynResult, Error, Result};
use super::predicate::Predicate;
use super::value::Type;
use super::{Key, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    pub type_: Type,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, type_: Type) -> Self {
        Self {
            name: name.into(),
            type_,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnDefinition>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self { columns }
    }

    /// Schema where every column accepts any value.
    pub fn untyped<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            names
                .into_iter()
                .map(|name| ColumnDefinition::new(name, Type::Any))
                .collect(),
        )
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.index_of(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    #[must_use]
    pub fn with_column(&self, column: ColumnDefinition) -> Self {
        let mut columns = self.columns.clone();
        columns.push(column);
        Self { columns }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.columns
                .iter()
                .format_with(", ", |c, f| f(&format_args!("{}: {:?}", c.name, c.type_)))
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    pub key: Key,
    pub values: Arc<[Value]>,
}

impl Record {
    pub fn new(key: Key, values: impl Into<Arc<[Value]>>) -> Self {
        Self {
            key,
            values: values.into(),
        }
    }

    /// Record keyed by the hash of its values.
    pub fn from_values(values: impl Into<Arc<[Value]>>) -> Self {
        let values = values.into();
        Self {
            key: Key::for_values(&values),
            values,
        }
    }
}

/// A record seen through its schema, as handed to predicates.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    schema: &'a Schema,
    record: &'a Record,
}

impl<'a> Row<'a> {
    pub fn new(schema: &'a Schema, record: &'a Record) -> Self {
        Self { schema, record }
    }

    pub fn key(&self) -> Key {
        self.record.key
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn values(&self) -> &'a [Value] {
        &self.record.values
    }

    pub fn get(&self, column: &str) -> Result<&'a Value> {
        let index = self.schema.column_index(column)?;
        self.record
            .values
            .get(index)
            .ok_or(Error::ArityMismatch {
                expected: self.schema.len(),
                actual: self.record.values.len(),
            })
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.schema
                    .columns()
                    .iter()
                    .map(|c| &c.name)
                    .zip(self.record.values.iter()),
            )
            .finish()
    }
}

/// Immutable, cheaply clonable collection of records sharing one schema.
///
/// Clones share the underlying storage, so a dataset can be handed to any
/// number of concurrent readers. Filtering always produces a new dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<Schema>,
    records: Arc<[Record]>,
}

impl Dataset {
    pub fn new(schema: impl Into<Arc<Schema>>, records: Vec<Record>) -> Result<Self> {
        let schema = schema.into();
        if let Some(record) = records.iter().find(|r| r.values.len() != schema.len()) {
            return Err(Error::ArityMismatch {
                expected: schema.len(),
                actual: record.values.len(),
            });
        }
        Ok(Self {
            schema,
            records: records.into(),
        })
    }

    pub fn from_rows(
        schema: impl Into<Arc<Schema>>,
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Result<Self> {
        Self::new(schema, rows.into_iter().map(Record::from_values).collect())
    }

    pub fn empty(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            records: Arc::new([]),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.records
            .iter()
            .map(|record| Row::new(&self.schema, record))
    }

    pub fn keys(&self) -> impl Iterator<Item = Key> + '_ {
        self.records.iter().map(|record| record.key)
    }

    /// Values of one column, in record order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let index = self.schema.column_index(name)?;
        Ok(self
            .records
            .iter()
            .map(|record| &record.values[index])
            .collect())
    }

    /// Keeps the records for which `predicate` holds. The first evaluation
    /// error aborts the filter.
    pub fn filter(&self, predicate: &(impl Predicate + ?Sized)) -> DynResult<Self> {
        self.filter_until(predicate, &AtomicBool::new(false))
    }

    /// Like [`filter`](Self::filter), but gives up with `Error::Cancelled`
    /// as soon as `cancelled` is set. The flag is checked before every record.
    pub fn filter_until(
        &self,
        predicate: &(impl Predicate + ?Sized),
        cancelled: &AtomicBool,
    ) -> DynResult<Self> {
        let mut kept = Vec::new();
        for record in self.records.iter() {
            if cancelled.load(Ordering::Acquire) {
                return Err(Error::Cancelled.into());
            }
            if predicate.evaluate(&Row::new(&self.schema, record))? {
                kept.push(record.clone());
            }
        }
        Ok(Self {
            schema: self.schema.clone(),
            records: kept.into(),
        })
    }

    /// Appends a column computed from each row. Keys are preserved.
    pub fn with_column(
        &self,
        column: ColumnDefinition,
        mut compute: impl FnMut(&Row) -> DynResult<Value>,
    ) -> DynResult<Self> {
        let schema = Arc::new(self.schema.with_column(column));
        let records: Vec<Record> = self
            .rows()
            .map(|row| {
                let mut values = row.values().to_vec();
                values.push(compute(&row)?);
                Ok::<_, DynError>(Record::new(row.key(), values))
            })
            .try_collect()?;
        Ok(Self {
            schema,
            records: records.into(),
        })
    }
}
