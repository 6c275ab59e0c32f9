// Copyright © 2024 Pathway

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::{debug, info};

use super::config::RouterConfig;
use super::dataset::Dataset;
use super::error::{Error, Result};
use super::partition::{PartitionCollection, TaskFailure};
use super::pool::{TaskHandle, WorkerPool};
use super::predicate::GroupFilter;
use super::report_error::{LogReporter, ReportError};

enum Pending {
    Submitted(TaskHandle<Dataset>),
    Rejected(Error),
}

/// Splits a dataset into named partitions, one concurrent task per group
/// filter.
///
/// A routing call is a barrier: it returns only after every task has either
/// produced its partition or failed. Failed group filters are reported and
/// left out of the result; they never fail the call or affect their
/// siblings. Tasks still running when the deadline passes are cancelled
/// before their next record, and the next call waits for them to return.
pub struct Router {
    pool: Arc<WorkerPool>,
    deadline: Option<Duration>,
    reporter: Box<dyn ReportError>,
}

impl Router {
    pub fn new(config: &RouterConfig) -> Result<Self> {
        let pool = Arc::new(WorkerPool::from_config(config)?);
        Ok(Self::with_pool(pool, config))
    }

    /// Router sharing an existing pool, e.g. between several pipelines.
    pub fn with_pool(pool: Arc<WorkerPool>, config: &RouterConfig) -> Self {
        Self {
            pool,
            deadline: config.deadline,
            reporter: Box::new(LogReporter),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: impl ReportError + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }

    pub fn route(&self, source: &Dataset, group_filters: &[GroupFilter]) -> PartitionCollection {
        self.pool.settle();
        let started_at = Instant::now();
        let cancelled = Arc::new(AtomicBool::new(false));
        debug!(
            "routing {} record(s) into {} group(s): dispatching",
            source.len(),
            group_filters.len()
        );

        let mut seen_names = HashSet::with_capacity(group_filters.len());
        let pending: Vec<(&str, Pending)> = group_filters
            .iter()
            .map(|group| {
                let task = match validate(group, &mut seen_names) {
                    Ok(()) => Pending::Submitted(self.submit(source, group, &cancelled)),
                    Err(error) => Pending::Rejected(error),
                };
                (group.name.as_str(), task)
            })
            .collect();

        debug!("awaiting {} task(s)", pending.len());
        let deadline = self.deadline.map(|budget| started_at + budget);
        let mut partitions = IndexMap::with_capacity(pending.len());
        let mut failures = Vec::new();
        for (name, task) in pending {
            let outcome = match task {
                Pending::Submitted(handle) => match deadline {
                    Some(deadline) => handle.join_deadline(deadline),
                    None => handle.join(),
                },
                Pending::Rejected(error) => Err(error),
            };
            match outcome {
                Ok(partition) => {
                    debug!("group {name:?}: {} record(s)", partition.len());
                    partitions.insert(name.to_string(), partition);
                }
                Err(error) => {
                    failures.push(TaskFailure {
                        group: name.to_string(),
                        reason: error.to_string(),
                    });
                    self.reporter.report(Error::task_failed(name, error));
                }
            }
        }

        cancelled.store(true, Ordering::Release);

        info!(
            "routed {} record(s): {} partition(s) assembled, {} group(s) failed in {:?}",
            source.len(),
            partitions.len(),
            failures.len(),
            started_at.elapsed()
        );
        PartitionCollection::new(partitions, failures)
    }

    fn submit(
        &self,
        source: &Dataset,
        group: &GroupFilter,
        cancelled: &Arc<AtomicBool>,
    ) -> TaskHandle<Dataset> {
        let source = source.clone();
        let predicate = group.predicate.clone();
        let cancelled = cancelled.clone();
        self.pool
            .submit(move || source.filter_until(predicate.as_ref(), &cancelled))
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("pool", &self.pool)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

fn validate<'a>(group: &'a GroupFilter, seen_names: &mut HashSet<&'a str>) -> Result<()> {
    if group.name.is_empty() {
        return Err(Error::Configuration(
            "group filter name must not be empty".to_string(),
        ));
    }
    if !seen_names.insert(group.name.as_str()) {
        return Err(Error::Configuration(format!(
            "duplicate group filter name {:?}",
            group.name
        )));
    }
    Ok(())
}

/// Routes with a pool scoped to this call. The pool is dropped before
/// returning; its threads exit in the background once idle.
pub fn route(
    source: &Dataset,
    group_filters: &[GroupFilter],
    config: &RouterConfig,
) -> Result<PartitionCollection> {
    let router = Router::new(config)?;
    Ok(router.route(source, group_filters))
}
