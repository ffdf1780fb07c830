//! Executor Pool Policy
//!
//! An `ExecutorConfig` describes how one class of operations is scheduled: how many
//! workers, how long idle elastic workers live, how much backlog is accepted and which
//! discipline routes work to workers. Values are validated when the config is built,
//! so an `ExecutorConfig` that exists is always usable.

use crate::error::{ClusterError, Result};
use crate::serialization::{ObjectDataInput, ObjectDataOutput};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_NAME: &str = "default";
pub const DEFAULT_CORE_POOL_SIZE: i32 = 40;
pub const DEFAULT_MAX_POOL_SIZE: i32 = 40;
pub const DEFAULT_CAPACITY: i32 = i32::MAX;
pub const DEFAULT_KEEP_ALIVE_SECONDS: i32 = 300;

/// Scheduling discipline of a pool.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ExecutorType {
    /// Partition-routed workers running non-blocking operations.
    #[default]
    Parallel,
    /// Partition-routed workers whose operations may block.
    BlockingParallel,
    /// A single worker draining one capacity-bounded FIFO.
    Queued,
}

impl ExecutorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorType::Parallel => "Parallel",
            ExecutorType::BlockingParallel => "BlockingParallel",
            ExecutorType::Queued => "Queued",
        }
    }
}

impl fmt::Display for ExecutorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutorType {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Parallel" => Ok(ExecutorType::Parallel),
            "BlockingParallel" => Ok(ExecutorType::BlockingParallel),
            "Queued" => Ok(ExecutorType::Queued),
            other => Err(ClusterError::decode(format!("unknown executor type '{}'", other))),
        }
    }
}

/// Immutable, validated pool policy. Build one with [`ExecutorConfig::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawExecutorConfig", into = "RawExecutorConfig")]
pub struct ExecutorConfig {
    name: String,
    core_pool_size: i32,
    max_pool_size: i32,
    capacity: i32,
    keep_alive_seconds: i32,
    executor_type: ExecutorType,
}

impl ExecutorConfig {
    pub fn builder(name: impl Into<String>) -> ExecutorConfigBuilder {
        ExecutorConfigBuilder::new(name)
    }

    /// Shorthand for the common sizing-only construction.
    pub fn new(
        name: impl Into<String>,
        core_pool_size: i32,
        max_pool_size: i32,
        keep_alive_seconds: i32,
    ) -> Result<Self> {
        Self::builder(name)
            .core_pool_size(core_pool_size)
            .max_pool_size(max_pool_size)
            .keep_alive_seconds(keep_alive_seconds)
            .build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn core_pool_size(&self) -> i32 {
        self.core_pool_size
    }

    pub fn max_pool_size(&self) -> i32 {
        self.max_pool_size
    }

    pub fn capacity(&self) -> i32 {
        self.capacity
    }

    pub fn keep_alive_seconds(&self) -> i32 {
        self.keep_alive_seconds
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_seconds as u64)
    }

    pub fn executor_type(&self) -> ExecutorType {
        self.executor_type
    }

    /// Same policy under another name, e.g. when a default is registered for a
    /// specific class of operations.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    pub fn write_to(&self, out: &mut ObjectDataOutput) {
        out.write_utf(&self.name);
        out.write_i32(self.core_pool_size);
        out.write_i32(self.max_pool_size);
        out.write_i32(self.keep_alive_seconds);
        out.write_i32(self.capacity);
        out.write_utf(self.executor_type.as_str());
    }

    /// Reads the external form and re-validates it; a peer cannot hand us a config
    /// we would have refused to build locally.
    pub fn read_from(input: &mut ObjectDataInput) -> Result<Self> {
        let name = input.read_utf()?;
        let core_pool_size = input.read_i32()?;
        let max_pool_size = input.read_i32()?;
        let keep_alive_seconds = input.read_i32()?;
        let capacity = input.read_i32()?;
        let executor_type = input.read_utf()?.parse()?;

        Self::builder(name)
            .core_pool_size(core_pool_size)
            .max_pool_size(max_pool_size)
            .keep_alive_seconds(keep_alive_seconds)
            .capacity(capacity)
            .executor_type(executor_type)
            .build()
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            core_pool_size: DEFAULT_CORE_POOL_SIZE,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
            capacity: DEFAULT_CAPACITY,
            keep_alive_seconds: DEFAULT_KEEP_ALIVE_SECONDS,
            executor_type: ExecutorType::Parallel,
        }
    }
}

impl fmt::Display for ExecutorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutorConfig{{name='{}', type={}, core={}, max={}, capacity={}, keepAlive={}s}}",
            self.name,
            self.executor_type,
            self.core_pool_size,
            self.max_pool_size,
            self.capacity,
            self.keep_alive_seconds
        )
    }
}

/// Collects policy values; nothing is checked until [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ExecutorConfigBuilder {
    config: ExecutorConfig,
}

impl ExecutorConfigBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: ExecutorConfig {
                name: name.into(),
                ..ExecutorConfig::default()
            },
        }
    }

    pub fn core_pool_size(mut self, value: i32) -> Self {
        self.config.core_pool_size = value;
        self
    }

    pub fn max_pool_size(mut self, value: i32) -> Self {
        self.config.max_pool_size = value;
        self
    }

    pub fn capacity(mut self, value: i32) -> Self {
        self.config.capacity = value;
        self
    }

    pub fn keep_alive_seconds(mut self, value: i32) -> Self {
        self.config.keep_alive_seconds = value;
        self
    }

    pub fn executor_type(mut self, value: ExecutorType) -> Self {
        self.config.executor_type = value;
        self
    }

    pub fn build(self) -> Result<ExecutorConfig> {
        let config = self.config;
        let name = config.name.as_str();

        if name.is_empty() {
            return Err(ClusterError::config(name, "name must not be empty"));
        }
        if config.core_pool_size < 0 {
            return Err(ClusterError::config(
                name,
                format!("corePoolSize must be >= 0, got {}", config.core_pool_size),
            ));
        }
        if config.max_pool_size <= 0 {
            return Err(ClusterError::config(
                name,
                format!("maxPoolSize must be positive, got {}", config.max_pool_size),
            ));
        }
        if config.keep_alive_seconds <= 0 {
            return Err(ClusterError::config(
                name,
                format!("keepAliveSeconds must be positive, got {}", config.keep_alive_seconds),
            ));
        }
        if config.capacity <= 0 {
            return Err(ClusterError::config(
                name,
                format!("capacity must be positive, got {}", config.capacity),
            ));
        }

        Ok(config)
    }
}

/// Serde form of [`ExecutorConfig`]. Missing fields take the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RawExecutorConfig {
    name: String,
    core_pool_size: i32,
    max_pool_size: i32,
    capacity: i32,
    keep_alive_seconds: i32,
    executor_type: ExecutorType,
}

impl Default for RawExecutorConfig {
    fn default() -> Self {
        ExecutorConfig::default().into()
    }
}

impl From<ExecutorConfig> for RawExecutorConfig {
    fn from(config: ExecutorConfig) -> Self {
        Self {
            name: config.name,
            core_pool_size: config.core_pool_size,
            max_pool_size: config.max_pool_size,
            capacity: config.capacity,
            keep_alive_seconds: config.keep_alive_seconds,
            executor_type: config.executor_type,
        }
    }
}

impl TryFrom<RawExecutorConfig> for ExecutorConfig {
    type Error = ClusterError;

    fn try_from(raw: RawExecutorConfig) -> Result<Self> {
        ExecutorConfig::builder(raw.name)
            .core_pool_size(raw.core_pool_size)
            .max_pool_size(raw.max_pool_size)
            .capacity(raw.capacity)
            .keep_alive_seconds(raw.keep_alive_seconds)
            .executor_type(raw.executor_type)
            .build()
    }
}
