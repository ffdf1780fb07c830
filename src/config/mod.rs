//! Configuration Module
//!
//! Holds the executor pool policies a node runs with. Policies are looked up by name;
//! a name nobody configured resolves to the `"default"` policy, so callers can always
//! pick a pool without checking first.
//!
//! ## Sources
//! - **Builder**: `ExecutorConfig::builder(..)` in code.
//! - **Wire**: `ExecutorConfig::read_from` for configs shipped between members.
//! - **File**: `NodeConfigFile` (JSON) loaded by the node binary.

pub mod executor;

pub use executor::{ExecutorConfig, ExecutorConfigBuilder, ExecutorType};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Named pool policies with fallback to the default policy.
#[derive(Debug, Clone, Default)]
pub struct ExecutorConfigs {
    configs: HashMap<String, ExecutorConfig>,
}

impl ExecutorConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a policy under its own name.
    pub fn insert(&mut self, config: ExecutorConfig) -> Option<ExecutorConfig> {
        tracing::debug!("Registered executor policy {}", config);
        self.configs.insert(config.name().to_string(), config)
    }

    pub fn with(mut self, config: ExecutorConfig) -> Self {
        self.insert(config);
        self
    }

    /// Resolves a policy: the exact name, else a configured `"default"` entry, else
    /// the built-in default. The result always carries the requested name so pools
    /// created from a fallback are still distinct per name.
    pub fn resolve(&self, name: &str) -> ExecutorConfig {
        if let Some(config) = self.configs.get(name) {
            return config.clone();
        }
        let fallback = self
            .configs
            .get(executor::DEFAULT_NAME)
            .cloned()
            .unwrap_or_default();
        tracing::debug!("No executor policy named '{}', using defaults", name);
        fallback.renamed(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }
}

/// JSON file form read by the node binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfigFile {
    #[serde(default)]
    pub executors: Vec<ExecutorConfig>,
    /// Optional per-queue size bounds, keyed by queue name.
    #[serde(default)]
    pub queues: HashMap<String, QueueSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueSettings {
    pub max_size: Option<usize>,
}

impl NodeConfigFile {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid node config JSON")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("in {}", path.display()))
    }

    pub fn executor_configs(&self) -> ExecutorConfigs {
        self.executors
            .iter()
            .cloned()
            .fold(ExecutorConfigs::new(), ExecutorConfigs::with)
    }
}

#[cfg(test)]
mod tests;
