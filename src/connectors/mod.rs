// Copyright © 2024 Pathway

pub mod data_storage;
pub mod dispatch;
pub mod mapping;

pub use data_storage::{
    DatasetSource, JsonLinesReader, JsonLinesWriter, MemorySource, NullWriter, ReadError,
    WriteError, Writer,
};
pub use dispatch::{dispatch_partitions, DispatchSummary, SinkBinding};
pub use mapping::{ColumnMapping, MappedColumn, SchemaMapping};

use crate::engine::error::DynResult;
use crate::engine::Dataset;

/// Column an upstream quality evaluator adds to every record, holding its
/// verdict (e.g. `"Passed"` or `"Failed"`).
pub const QUALITY_VERDICT_COLUMN: &str = "DataQualityEvaluationResult";

/// Upstream stage that annotates records with a quality verdict before they
/// are routed. How the verdict is computed is up to the implementation.
pub trait QualityEvaluator {
    fn evaluate(&self, data: &Dataset) -> DynResult<Dataset>;
}
