// Copyright © 2024 Pathway

use std::env;
use std::time::Duration;

use assert_matches::assert_matches;

use group_router::engine::config::{
    ConfigError, DEADLINE_MS_ENV_VAR, DEFAULT_POOL_SIZE, DEFAULT_THREAD_NAME_PREFIX,
    POOL_SIZE_ENV_VAR,
};
use group_router::engine::{Error, Router, RouterConfig};
use group_router::RetryConfig;

#[test]
fn test_defaults() {
    let config = RouterConfig::default();
    assert_eq!(config.pool_size, DEFAULT_POOL_SIZE);
    assert_eq!(config.pool_size, 5);
    assert_eq!(config.deadline, None);
    assert_eq!(config.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);

    assert_eq!(RetryConfig::default().max_retries(), 2);
    assert_eq!(RetryConfig::never().max_retries(), 0);
}

#[test]
fn test_builders() -> eyre::Result<()> {
    let config = RouterConfig::new(3)
        .with_deadline(Duration::from_secs(2))
        .with_thread_name_prefix("custom");
    assert_eq!(config.pool_size, 3);
    assert_eq!(config.deadline, Some(Duration::from_secs(2)));
    assert_eq!(config.thread_name_prefix, "custom");
    assert_eq!(config.clone().with_pool_size(8).pool_size, 8);

    let router = Router::new(&config)?;
    assert_eq!(router.pool().size(), 3);
    assert_matches!(
        Router::new(&config.with_pool_size(0)),
        Err(Error::InvalidPoolSize(0))
    );
    Ok(())
}

// Environment variables are process-wide, so every case lives in one test.
#[test]
fn test_from_env() -> eyre::Result<()> {
    env::remove_var(POOL_SIZE_ENV_VAR);
    env::remove_var(DEADLINE_MS_ENV_VAR);
    assert_eq!(RouterConfig::from_env()?, RouterConfig::default());

    env::set_var(POOL_SIZE_ENV_VAR, " 7 ");
    env::set_var(DEADLINE_MS_ENV_VAR, "250");
    let config = RouterConfig::from_env()?;
    assert_eq!(config.pool_size, 7);
    assert_eq!(config.deadline, Some(Duration::from_millis(250)));

    env::set_var(POOL_SIZE_ENV_VAR, "many");
    let error = RouterConfig::from_env().unwrap_err();
    assert_matches!(&error, ConfigError::ParsingFailed(name, _) if name == POOL_SIZE_ENV_VAR);
    assert!(error.to_string().contains(POOL_SIZE_ENV_VAR));

    env::set_var(POOL_SIZE_ENV_VAR, "4");
    env::set_var(DEADLINE_MS_ENV_VAR, "-1");
    assert_matches!(
        RouterConfig::from_env(),
        Err(ConfigError::ParsingFailed(name, _)) if name == DEADLINE_MS_ENV_VAR
    );

    env::remove_var(POOL_SIZE_ENV_VAR);
    env::remove_var(DEADLINE_MS_ENV_VAR);
    Ok(())
}
