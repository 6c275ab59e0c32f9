// Copyright © 2024 Pathway

pub mod error;
pub use self::error::{DataError, DynError, DynResult, Error, Result};

pub mod value;
pub use self::value::{Key, Type, Value};

pub mod dataset;
pub use dataset::{ColumnDefinition, Dataset, Record, Row, Schema};

pub mod predicate;
pub use predicate::{Condition, GroupFilter, Predicate};

pub mod config;
pub use config::RouterConfig;

pub mod pool;
pub use pool::{TaskHandle, WorkerPool};

pub mod partition;
pub use partition::{PartitionCollection, TaskFailure};

pub mod report_error;
pub use report_error::{ChannelReporter, LogReporter, ReportError};

pub mod router;
pub use router::{route, Router};
