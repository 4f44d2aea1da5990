use crate::{Error, Result};

/// Environment variable overriding [`EngineConfig::num_threads`].
pub const NUM_THREADS_ENV: &str = "STREAMFORK_NUM_THREADS";
/// Environment variable overriding [`EngineConfig::thread_name_prefix`].
pub const THREAD_PREFIX_ENV: &str = "STREAMFORK_THREAD_PREFIX";

const DEFAULT_THREAD_PREFIX: &str = "streamfork-worker";

/// Worker pool settings for a [`crate::ReduceEngine`].
///
/// The defaults size the pool to the number of logical CPUs. Every field can
/// also be supplied through the environment with [`Self::from_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Number of worker threads in the pool. Must be at least 1.
    ///
    /// Environment variable: `STREAMFORK_NUM_THREADS`
    pub num_threads: usize,

    /// Worker threads are named `{thread_name_prefix}-{index}`.
    ///
    /// Environment variable: `STREAMFORK_THREAD_PREFIX`
    pub thread_name_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            thread_name_prefix: String::from(DEFAULT_THREAD_PREFIX),
        }
    }
}

impl EngineConfig {
    /// Default settings with an explicit thread count.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads,
            ..Self::default()
        }
    }

    /// Reads overrides from the process environment on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a variable is set but malformed, or
    /// if the resulting configuration fails [`Self::validate`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(NUM_THREADS_ENV) {
            config.num_threads = raw.trim().parse().map_err(|_| {
                Error::invalid_config(format!("{NUM_THREADS_ENV} must be an integer, got {raw:?}"))
            })?;
        }
        if let Some(prefix) = lookup(THREAD_PREFIX_ENV) {
            config.thread_name_prefix = prefix;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration before a pool is built from it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if `num_threads` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(Error::invalid_config("num_threads must be greater than 0"));
        }
        Ok(())
    }
}
