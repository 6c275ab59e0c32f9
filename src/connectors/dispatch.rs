// Copyright © 2024 Pathway

use log::{info, warn};

use super::data_storage::{WriteError, Writer};
use super::mapping::SchemaMapping;
use crate::engine::report_error::ReportError;
use crate::engine::{Dataset, Error, PartitionCollection};
use crate::retry::{execute_with_retries, RetryConfig};

/// Connects one named partition to the sink that persists it.
pub struct SinkBinding {
    pub partition: String,
    pub mapping: Option<Box<dyn SchemaMapping>>,
    pub writer: Box<dyn Writer>,
}

impl SinkBinding {
    pub fn new(partition: impl Into<String>, writer: Box<dyn Writer>) -> Self {
        Self {
            partition: partition.into(),
            mapping: None,
            writer,
        }
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: Box<dyn SchemaMapping>) -> Self {
        self.mapping = Some(mapping);
        self
    }

    fn deliver(&mut self, data: &Dataset, retry_config: &RetryConfig) -> Result<(), WriteError> {
        let mapped;
        let data = match &self.mapping {
            Some(mapping) => {
                mapped = mapping.apply(data).map_err(|source| WriteError::Mapping {
                    partition: self.partition.clone(),
                    source,
                })?;
                &mapped
            }
            None => data,
        };
        let retry_config = if self.writer.retriable() {
            retry_config.clone()
        } else {
            RetryConfig::never()
        };
        let partition = self.partition.as_str();
        let writer = &mut self.writer;
        execute_with_retries(
            || {
                writer.write(partition, data)?;
                writer.flush()
            },
            retry_config,
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchSummary {
    pub written: Vec<String>,
    pub failed: Vec<String>,
}

/// Hands every bound partition to its sink, once each, after routing has
/// finished. Missing partitions and sink errors are reported and skipped
/// so the remaining bindings still run.
pub fn dispatch_partitions(
    partitions: &PartitionCollection,
    bindings: &mut [SinkBinding],
    retry_config: &RetryConfig,
    reporter: &impl ReportError,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    for binding in bindings.iter_mut() {
        let data = match partitions.get(&binding.partition) {
            Ok(data) => data,
            Err(error) => {
                warn!(
                    "{}: no partition {:?} to write",
                    binding.writer.name(),
                    binding.partition
                );
                reporter.report(error);
                summary.failed.push(binding.partition.clone());
                continue;
            }
        };
        match binding.deliver(data, retry_config) {
            Ok(()) => {
                info!(
                    "{}: {} record(s) of partition {:?} written",
                    binding.writer.name(),
                    data.len(),
                    binding.partition
                );
                summary.written.push(binding.partition.clone());
            }
            Err(error) => {
                reporter.report(Error::Other(error.into()));
                summary.failed.push(binding.partition.clone());
            }
        }
    }
    summary
}
