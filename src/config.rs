use crate::error::{Error, Result};
use std::time::Duration;

/// Upper bound on the worker count a pool accepts.
const MAX_THREADS: usize = 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub num_threads: Option<usize>,
    pub thread_name_prefix: String,
    pub stack_size: Option<usize>,
    pub pin_workers: bool,

    /// How long an idle worker sleeps before re-scanning the queues even
    /// without a wakeup.
    pub idle_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: None,
            thread_name_prefix: "skein-worker".to_string(),
            stack_size: Some(2 * 1024 * 1024),
            pin_workers: false,
            idle_timeout: Duration::from_millis(10),
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(n) = self.num_threads {
            if n == 0 {
                return Err(Error::config("num_threads must be > 0"));
            }
            if n > MAX_THREADS {
                return Err(Error::config(format!(
                    "num_threads too large (max {})",
                    MAX_THREADS
                )));
            }
        }

        if self.idle_timeout.is_zero() {
            return Err(Error::config("idle_timeout must be non-zero"));
        }

        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.num_threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    pub fn stack_size(mut self, size: usize) -> Self {
        self.config.stack_size = Some(size);
        self
    }

    pub fn pin_workers(mut self, pin: bool) -> Self {
        self.config.pin_workers = pin;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.idle_timeout, Duration::from_millis(10));
        assert!(config.worker_threads() >= 1);
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .num_threads(3)
            .thread_name_prefix("io")
            .idle_timeout(Duration::from_millis(2))
            .build()
            .unwrap();

        assert_eq!(config.worker_threads(), 3);
        assert_eq!(config.thread_name_prefix, "io");
        assert_eq!(config.idle_timeout, Duration::from_millis(2));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Config::builder().num_threads(0).build(),
            Err(Error::Config(_))
        ));
        assert!(Config::builder().num_threads(MAX_THREADS + 1).build().is_err());
        assert!(Config::builder().idle_timeout(Duration::ZERO).build().is_err());
    }
}
