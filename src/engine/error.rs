// Copyright © 2024 Pathway

use std::any::Any;
use std::error;
use std::result;
use std::time::Duration;

use super::value::CompoundType;
use super::Value;

#[allow(clippy::module_name_repetitions)]
pub type DynError = Box<dyn error::Error + Send + Sync>;
pub type DynResult<T> = result::Result<T, DynError>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("group filter {group:?} failed: {source}")]
    TaskFailed {
        group: String,
        #[source]
        source: DynError,
    },

    #[error("worker panic: {0}")]
    WorkerPanic(String),

    #[error("deadline of {0:?} exceeded before the task finished")]
    DeadlineExceeded(Duration),

    #[error("task was dropped by the worker pool before reporting a result")]
    TaskLost,

    #[error("task was cancelled after its deadline passed")]
    Cancelled,

    #[error("partition {0:?} not found")]
    PartitionNotFound(String),

    #[error("invalid group filter configuration: {0}")]
    Configuration(String),

    #[error("worker pool size must be positive, got {0}")]
    InvalidPoolSize(usize),

    #[error("failed to create worker pool: {0}")]
    PoolCreation(#[source] rayon::ThreadPoolBuildError),

    #[error("column {0:?} not found in schema")]
    ColumnNotFound(String),

    #[error("record has {actual} values, but the schema has {expected} columns")]
    ArityMismatch { expected: usize, actual: usize },

    #[error(transparent)]
    Other(DynError),
}

impl Error {
    pub fn from_panic_payload(panic_payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = match panic_payload.downcast::<&'static str>() {
            Ok(message) => message.to_string(),
            Err(panic_payload) => match panic_payload.downcast::<String>() {
                Ok(message) => *message,
                Err(panic_payload) => format!("{panic_payload:?}"),
            },
        };
        Self::WorkerPanic(message)
    }

    pub fn task_failed(group: impl Into<String>, cause: impl Into<DynError>) -> Self {
        Self::TaskFailed {
            group: group.into(),
            source: cause.into(),
        }
    }

    pub fn downcast<E: error::Error + 'static>(self) -> Result<E, Self> {
        match self {
            Self::Other(inner) => match inner.downcast::<E>() {
                Ok(error) => Ok(*error),
                Err(other) => Err(Self::Other(other)),
            },
            other => Err(other),
        }
    }
}

impl From<DynError> for Error {
    fn from(value: DynError) -> Self {
        match value.downcast::<Self>() {
            Ok(this) => *this,
            Err(other) => Self::Other(other),
        }
    }
}

pub type Result<T, E = Error> = result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DataError {
    #[error("type mismatch: expected {expected}, got {value:?}")]
    TypeMismatch {
        expected: &'static str,
        value: Value,
    },

    #[error("value {value} does not match type {type_}")]
    IncorrectType { value: Value, type_: CompoundType },

    #[error("Error value in column")]
    ErrorInValue,
}
