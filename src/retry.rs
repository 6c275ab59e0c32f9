use std::time::Duration;

use log::warn;
use rand::Rng;

const DEFAULT_SLEEP_INITIAL_DURATION: Duration = Duration::from_secs(1);
const DEFAULT_SLEEP_BACKOFF_FACTOR: f64 = 1.2;
const DEFAULT_JITTER: Duration = Duration::from_millis(800);
const DEFAULT_MAX_RETRIES: usize = 2;

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone)]
pub struct RetryConfig {
    sleep_duration: Duration,
    backoff_factor: f64,
    jitter: Duration,
    max_retries: usize,
}

impl RetryConfig {
    pub fn new(
        sleep_duration: Duration,
        backoff_factor: f64,
        jitter: Duration,
        max_retries: usize,
    ) -> Self {
        Self {
            sleep_duration,
            backoff_factor,
            jitter,
            max_retries,
        }
    }

    /// No retries at all: the first error is final.
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn sleep_after_error(&mut self) {
        std::thread::sleep(self.sleep_duration);
        let jitter = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            rand::rng().random_range(Duration::ZERO..self.jitter)
        };
        self.sleep_duration = self.sleep_duration.mul_f64(self.backoff_factor) + jitter;
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_SLEEP_INITIAL_DURATION,
            DEFAULT_SLEEP_BACKOFF_FACTOR,
            DEFAULT_JITTER,
            DEFAULT_MAX_RETRIES,
        )
    }
}

pub fn execute_with_retries<T, E: std::fmt::Display>(
    mut func: impl FnMut() -> Result<T, E>,
    mut retry_config: RetryConfig,
) -> Result<T, E> {
    let mut exec_result = func();
    for attempt_idx in 0..retry_config.max_retries {
        match &exec_result {
            Ok(_) => break,
            Err(error) => {
                warn!("Attempt {attempt_idx}: retrying operation after an error: {error}");
            }
        }
        retry_config.sleep_after_error();
        exec_result = func();
    }

    exec_result
}
