use std::env;
use std::str::FromStr;
use std::time::Duration;

use relstore_error::{construction, Result};

pub const NUM_THREADS_ENV: &str = "RELSTORE_NUM_THREADS";
pub const PARTITIONS_ENV: &str = "RELSTORE_PARTITIONS";
pub const JOIN_TIMEOUT_MS_ENV: &str = "RELSTORE_JOIN_TIMEOUT_MS";

/// Settings for operators that run on the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Number of worker threads in the join pool.
    pub num_threads: usize,
    /// Number of partitions the partitioned join splits its input into.
    pub partitions: usize,
    /// How long to wait for all partitions before failing the join. `None`
    /// waits indefinitely.
    pub join_timeout: Option<Duration>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        let num_threads = num_cpus::get();
        ExecutionConfig {
            num_threads,
            partitions: num_threads,
            join_timeout: None,
        }
    }
}

impl ExecutionConfig {
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions;
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = Some(timeout);
        self
    }

    /// Defaults overridden by any `RELSTORE_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        let threads_set = if let Some(n) = parse_env::<usize>(NUM_THREADS_ENV)? {
            config.num_threads = n;
            true
        } else {
            false
        };
        match parse_env::<usize>(PARTITIONS_ENV)? {
            Some(n) => config.partitions = n,
            None if threads_set => config.partitions = config.num_threads,
            None => (),
        }
        if let Some(ms) = parse_env::<u64>(JOIN_TIMEOUT_MS_ENV)? {
            config.join_timeout = Some(Duration::from_millis(ms));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(construction!("num_threads must be at least 1"));
        }
        if self.partitions == 0 {
            return Err(construction!("partitions must be at least 1"));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| construction!("invalid value for {key}: '{raw}'")),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(construction!("{key} is not valid unicode")),
    }
}
