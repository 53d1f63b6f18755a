//! Engine configuration.
//!
//! Defaults size everything from the machine and the inputs. The reference
//! setup (six workers, 500x500 element scratch buffers) is available through
//! [`EngineConfig::reference`].

use std::env;

use log::warn;

use crate::error::{invalid_config, Result};

/// Environment variable overriding the worker count.
pub const WORKERS_ENV: &str = "DOTPRODUCT_WORKERS";
/// Environment variable bounding each scratch buffer, in elements.
pub const MAX_ELEMENTS_ENV: &str = "DOTPRODUCT_MAX_ELEMENTS";

/// Worker count of the reference configuration.
pub const REFERENCE_WORKERS: usize = 6;
/// Scratch capacity of the reference configuration.
pub const REFERENCE_MAX_ELEMENTS: usize = 500 * 500;

/// Configuration for [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Number of worker threads. Defaults to the number of available CPUs.
    pub workers: usize,
    /// Upper bound on each operand, in elements. `None` sizes scratch
    /// buffers from the inputs with no limit.
    pub max_elements: Option<usize>,
    /// Prefix for worker thread names.
    pub thread_name_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            max_elements: None,
            thread_name_prefix: "dotproduct".to_string(),
        }
    }
}

impl EngineConfig {
    /// Six workers over fixed 500x500 element buffers.
    pub fn reference() -> Self {
        Self {
            workers: REFERENCE_WORKERS,
            max_elements: Some(REFERENCE_MAX_ELEMENTS),
            ..Self::default()
        }
    }

    /// Defaults, overridden by `DOTPRODUCT_WORKERS` and
    /// `DOTPRODUCT_MAX_ELEMENTS` when they hold valid numbers.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(workers) = read_env(WORKERS_ENV) {
            config.workers = workers;
        }
        if let Some(max_elements) = read_env(MAX_ELEMENTS_ENV) {
            config.max_elements = Some(max_elements);
        }
        config
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_elements(mut self, max_elements: Option<usize>) -> Self {
        self.max_elements = max_elements;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(invalid_config("workers must be at least 1"));
        }
        if self.max_elements == Some(0) {
            return Err(invalid_config("max_elements must be at least 1"));
        }
        Ok(())
    }
}

fn read_env(key: &str) -> Option<usize> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Some(value),
        _ => {
            warn!("ignoring {}={:?}: expected a positive integer", key, raw);
            None
        }
    }
}
