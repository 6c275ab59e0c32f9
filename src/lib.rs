#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::must_use_candidate)] // too noisy

// FIXME:
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Concurrent predicate-based routing of a dataset into named partitions.
//!
//! A [`Router`](engine::Router) evaluates every [`GroupFilter`](engine::GroupFilter)
//! against the same source [`Dataset`](engine::Dataset) on a bounded
//! [`WorkerPool`](engine::WorkerPool) and collects the surviving partitions
//! into a [`PartitionCollection`](engine::PartitionCollection). Sources and
//! sinks around the router live in [`connectors`].

pub mod connectors;
pub mod engine;

mod retry;
pub use retry::RetryConfig;
