// Copyright © 2024 Pathway

use std::env;
use std::error;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_POOL_SIZE: usize = 5;
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "group-router:worker";

pub const POOL_SIZE_ENV_VAR: &str = "GROUP_ROUTER_POOL_SIZE";
pub const DEADLINE_MS_ENV_VAR: &str = "GROUP_ROUTER_DEADLINE_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// Upper bound on group filters evaluated at the same time.
    pub pool_size: usize,
    /// When set, tasks still running this long after dispatch are reported
    /// as failed and left out of the result.
    pub deadline: Option<Duration>,
    pub thread_name_prefix: String,
}

impl RouterConfig {
    pub fn new(pool_size: usize) -> Self {
        Self {
            pool_size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Defaults overridden by `GROUP_ROUTER_POOL_SIZE` and
    /// `GROUP_ROUTER_DEADLINE_MS` when they are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(pool_size) = parse_env_var::<usize>(POOL_SIZE_ENV_VAR)? {
            config.pool_size = pool_size;
        }
        if let Some(deadline_ms) = parse_env_var::<u64>(DEADLINE_MS_ENV_VAR)? {
            config.deadline = Some(Duration::from_millis(deadline_ms));
        }
        Ok(config)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            deadline: None,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("couldn't parse the value of {0:?} environment variable as UTF-8 string")]
    NotUtf8(String),

    #[error("couldn't parse the value of {0:?} environment variable: {1}")]
    ParsingFailed(String, #[source] Box<dyn error::Error + Send + Sync>),
}

fn parse_env_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: error::Error + Send + Sync + 'static,
{
    let Some(value) = env::var_os(name) else {
        return Ok(None);
    };
    let value = value
        .into_string()
        .map_err(|_| ConfigError::NotUtf8(name.to_string()))?;
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|err| ConfigError::ParsingFailed(name.to_string(), Box::new(err)))
}
