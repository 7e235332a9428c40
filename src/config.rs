//! Configuration for a pathcask container
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a pathcask container instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// The single backing file holding the full append-only log.
    /// Compaction uses two siblings during its rename swap:
    ///   {storage_path}_tmp   (freshly written compacted log)
    ///   {storage_path}_bkp   (previous log, deleted on success)
    pub storage_path: PathBuf,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the backing file
    pub sync_strategy: SyncStrategy,
}

/// Backing-file sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every appended record (safest, slowest)
    EveryWrite,

    /// Never fsync explicitly; leave flushing to the OS
    Never,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./storage"),
            sync_strategy: SyncStrategy::Never,
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
    /// Set the backing file path
    pub fn storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
