// Copyright © 2024 Pathway

use std::fs;
use std::time::Duration;

use assert_matches::assert_matches;
use mockall::{mock, Sequence};
use tempfile::tempdir;

use group_router::connectors::{
    dispatch_partitions, ColumnMapping, JsonLinesWriter, MappedColumn, NullWriter, SinkBinding,
    WriteError, Writer,
};
use group_router::engine::{
    route, ChannelReporter, Condition, Dataset, Error, GroupFilter, PartitionCollection,
    RouterConfig, Type,
};
use group_router::RetryConfig;

use super::helpers::{status_dataset, PanicErrorReporter};

mock! {
    pub Sink {}

    impl Writer for Sink {
        fn write(&mut self, partition: &str, data: &Dataset) -> Result<(), WriteError>;
        fn flush(&mut self) -> Result<(), WriteError>;
        fn retriable(&self) -> bool;
        fn name(&self) -> String;
    }
}

fn routed_statuses() -> eyre::Result<PartitionCollection> {
    let filters = vec![
        GroupFilter::new("failed", Condition::equals("status", "Failed")),
        GroupFilter::new("passed", Condition::equals("status", "Passed")),
    ];
    Ok(route(&status_dataset(), &filters, &RouterConfig::new(2))?)
}

fn fast_retries() -> RetryConfig {
    RetryConfig::new(Duration::from_millis(1), 1.0, Duration::ZERO, 2)
}

fn rejection(partition: &str) -> WriteError {
    WriteError::Rejected {
        partition: partition.to_string(),
        message: "sink is busy".to_string(),
    }
}

#[test]
fn test_each_partition_written_once() -> eyre::Result<()> {
    let partitions = routed_statuses()?;

    let mut failed_sink = MockSink::new();
    failed_sink.expect_name().return_const("failed-sink".to_string());
    failed_sink.expect_retriable().return_const(false);
    failed_sink
        .expect_write()
        .withf(|partition, data| partition == "failed" && data.len() == 2)
        .times(1)
        .returning(|_, _| Ok(()));
    failed_sink.expect_flush().times(1).returning(|| Ok(()));

    let mut passed_sink = MockSink::new();
    passed_sink.expect_name().return_const("passed-sink".to_string());
    passed_sink.expect_retriable().return_const(false);
    passed_sink
        .expect_write()
        .withf(|partition, data| partition == "passed" && data.len() == 5)
        .times(1)
        .returning(|_, _| Ok(()));
    passed_sink.expect_flush().times(1).returning(|| Ok(()));

    let mut bindings = vec![
        SinkBinding::new("failed", Box::new(failed_sink)),
        SinkBinding::new("passed", Box::new(passed_sink)),
    ];
    let summary = dispatch_partitions(
        &partitions,
        &mut bindings,
        &fast_retries(),
        &PanicErrorReporter {},
    );

    assert_eq!(summary.written, vec!["failed", "passed"]);
    assert!(summary.failed.is_empty());
    Ok(())
}

#[test]
fn test_missing_partition_is_reported() -> eyre::Result<()> {
    let partitions = routed_statuses()?;

    let mut sink = MockSink::new();
    sink.expect_name().return_const("unused".to_string());
    sink.expect_retriable().return_const(false);
    sink.expect_write().never();

    let mut bindings = vec![
        SinkBinding::new("skipped", Box::new(sink)),
        SinkBinding::new("passed", Box::new(NullWriter::new())),
    ];
    let (reporter, errors) = ChannelReporter::unbounded();
    let summary = dispatch_partitions(&partitions, &mut bindings, &fast_retries(), &reporter);

    assert_eq!(summary.written, vec!["passed"]);
    assert_eq!(summary.failed, vec!["skipped"]);
    assert_matches!(
        errors.try_recv(),
        Ok(Error::PartitionNotFound(name)) if name == "skipped"
    );
    assert!(errors.try_recv().is_err());
    Ok(())
}

#[test]
fn test_retriable_writer_is_retried() -> eyre::Result<()> {
    let partitions = routed_statuses()?;

    let mut sequence = Sequence::new();
    let mut sink = MockSink::new();
    sink.expect_name().return_const("flaky".to_string());
    sink.expect_retriable().return_const(true);
    sink.expect_write()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|partition, _| Err(rejection(partition)));
    sink.expect_write()
        .times(1)
        .in_sequence(&mut sequence)
        .returning(|_, _| Ok(()));
    sink.expect_flush().times(1).returning(|| Ok(()));

    let mut bindings = vec![SinkBinding::new("failed", Box::new(sink))];
    let summary = dispatch_partitions(
        &partitions,
        &mut bindings,
        &fast_retries(),
        &PanicErrorReporter {},
    );

    assert_eq!(summary.written, vec!["failed"]);
    Ok(())
}

#[test]
fn test_non_retriable_writer_fails_once() -> eyre::Result<()> {
    let partitions = routed_statuses()?;

    let mut sink = MockSink::new();
    sink.expect_name().return_const("strict".to_string());
    sink.expect_retriable().return_const(false);
    sink.expect_write()
        .times(1)
        .returning(|partition, _| Err(rejection(partition)));
    sink.expect_flush().never();

    let mut bindings = vec![
        SinkBinding::new("failed", Box::new(sink)),
        SinkBinding::new("passed", Box::new(NullWriter::new())),
    ];
    let (reporter, errors) = ChannelReporter::unbounded();
    let summary = dispatch_partitions(&partitions, &mut bindings, &fast_retries(), &reporter);

    assert_eq!(summary.written, vec!["passed"]);
    assert_eq!(summary.failed, vec!["failed"]);
    let error = errors.try_recv()?;
    assert_eq!(
        error.to_string(),
        "sink rejected partition \"failed\": sink is busy"
    );
    assert_matches!(error.downcast::<WriteError>(), Ok(WriteError::Rejected { .. }));
    Ok(())
}

#[test]
fn test_mapped_partition_written_to_file() -> eyre::Result<()> {
    let partitions = routed_statuses()?;
    let dir = tempdir()?;
    let path = dir.path().join("failed.jsonl");

    let mapping = ColumnMapping::new(vec![MappedColumn::new("id", "record_id", Type::String)]);
    let mut bindings = vec![
        SinkBinding::new("failed", Box::new(JsonLinesWriter::create(&path)?))
            .with_mapping(Box::new(mapping)),
    ];
    let summary = dispatch_partitions(
        &partitions,
        &mut bindings,
        &RetryConfig::never(),
        &PanicErrorReporter {},
    );

    assert_eq!(summary.written, vec!["failed"]);
    assert_eq!(
        fs::read_to_string(&path)?,
        "{\"record_id\":\"3\"}\n{\"record_id\":\"7\"}\n"
    );
    Ok(())
}

#[test]
fn test_failed_mapping_is_reported() -> eyre::Result<()> {
    let partitions = routed_statuses()?;

    let mapping = ColumnMapping::new(vec![MappedColumn::new("rating", "rating", Type::Float)]);
    let mut bindings =
        vec![SinkBinding::new("passed", Box::new(NullWriter::new())).with_mapping(Box::new(mapping))];
    let (reporter, errors) = ChannelReporter::unbounded();
    let summary = dispatch_partitions(&partitions, &mut bindings, &fast_retries(), &reporter);

    assert_eq!(summary.failed, vec!["passed"]);
    assert_matches!(
        errors.try_recv()?.downcast::<WriteError>(),
        Ok(WriteError::Mapping { partition, .. }) if partition == "passed"
    );
    Ok(())
}
