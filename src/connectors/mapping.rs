// Copyright © 2024 Pathway

use std::sync::Arc;

use itertools::Itertools as _;

use crate::engine::error::{DynError, DynResult};
use crate::engine::value::{CompoundType, Type};
use crate::engine::{ColumnDefinition, Dataset, Record, Schema};

/// Reshapes a partition before it reaches a sink.
pub trait SchemaMapping: Send {
    fn apply(&self, data: &Dataset) -> DynResult<Dataset>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedColumn {
    pub source: String,
    pub target: String,
    pub target_type: Type,
}

impl MappedColumn {
    pub fn new(source: impl Into<String>, target: impl Into<String>, target_type: Type) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            target_type,
        }
    }
}

/// Keeps the listed columns, in the listed order, renaming and casting each.
/// Columns not listed are dropped. `None` passes through every cast.
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    columns: Vec<MappedColumn>,
}

impl ColumnMapping {
    pub fn new(columns: Vec<MappedColumn>) -> Self {
        Self { columns }
    }

    fn target_schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|column| ColumnDefinition::new(column.target.clone(), column.target_type))
                .collect(),
        )
    }
}

impl SchemaMapping for ColumnMapping {
    fn apply(&self, data: &Dataset) -> DynResult<Dataset> {
        let source_indices: Vec<usize> = self
            .columns
            .iter()
            .map(|column| data.schema().column_index(&column.source))
            .try_collect()?;
        let records: Vec<Record> = data
            .records()
            .iter()
            .map(|record| {
                let values: Vec<_> = self
                    .columns
                    .iter()
                    .zip(&source_indices)
                    .map(|(column, index)| {
                        CompoundType::new(column.target_type, true)
                            .convert_value(record.values[*index].clone())
                    })
                    .try_collect()?;
                Ok::<_, DynError>(Record::new(record.key, values))
            })
            .try_collect()?;
        Ok(Dataset::new(Arc::new(self.target_schema()), records)?)
    }
}
