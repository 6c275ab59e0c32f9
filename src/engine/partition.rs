// Copyright © 2024 Pathway

#![allow(clippy::module_name_repetitions)]

use indexmap::IndexMap;

use super::dataset::Dataset;
use super::error::{Error, Result};

/// A group filter that did not produce a partition, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub group: String,
    pub reason: String,
}

/// Read-only, name-indexed result of one routing call.
///
/// Holds exactly the partitions whose group filter succeeded, in the order
/// the group filters were given. Looking up any other name is an error.
#[derive(Debug, Clone, Default)]
pub struct PartitionCollection {
    partitions: IndexMap<String, Dataset>,
    failures: Vec<TaskFailure>,
}

impl PartitionCollection {
    pub(crate) fn new(partitions: IndexMap<String, Dataset>, failures: Vec<TaskFailure>) -> Self {
        Self {
            partitions,
            failures,
        }
    }

    pub fn get(&self, name: &str) -> Result<&Dataset> {
        self.partitions
            .get(name)
            .ok_or_else(|| Error::PartitionNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.partitions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.partitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.partitions
            .iter()
            .map(|(name, dataset)| (name.as_str(), dataset))
    }

    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }

    pub fn into_inner(self) -> IndexMap<String, Dataset> {
        self.partitions
    }
}

impl<'a> IntoIterator for &'a PartitionCollection {
    type Item = (&'a String, &'a Dataset);
    type IntoIter = indexmap::map::Iter<'a, String, Dataset>;

    fn into_iter(self) -> Self::IntoIter {
        self.partitions.iter()
    }
}
