//! Configuration for LineKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::format::Format;

/// Configuration for opening a [`Store`](crate::Store)
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the data file (created if absent)
    pub path: PathBuf,

    /// Delimiter bytes used for every row in the data file
    pub format: Format,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: when to fsync the append handle
    pub sync_strategy: SyncStrategy,

    /// What to do with an unterminated row at the end of the file
    pub tail_policy: TailPolicy,
}

/// Sync strategy for appended rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// Never fsync implicitly; call `Store::sync` when needed
    Manual,
}

/// Policy for a partial final row left by a crash mid-append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailPolicy {
    /// Refuse to open with `CorruptLog`
    Fail,

    /// Cut the partial row off the file and open
    Truncate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./linekv.db"),
            format: Format::default(),
            sync_strategy: SyncStrategy::Manual,
            tail_policy: TailPolicy::Fail,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the row format
    pub fn format(mut self, format: Format) -> Self {
        self.config.format = format;
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the partial-tail policy
    pub fn tail_policy(mut self, policy: TailPolicy) -> Self {
        self.config.tail_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
