//! # querywatch
//!
//! Runs a SQL query against DuckDB, compares the result with the snapshot
//! stored by the previous run, and mails the rows that were added or changed.

pub mod change_detection;
pub mod cli;
pub mod commands;
pub mod config;
pub mod data;
pub mod error;
pub mod fingerprint;
pub mod hash;
pub mod notify;
pub mod output;
pub mod progress;
pub mod render;
pub mod run_log;
pub mod snapshot;
pub mod sql;
pub mod value;
pub mod watcher;

pub use error::{QuerywatchError, Result};
pub use watcher::{ChangeWatcher, RunOutcome, RunReport};

/// Current format version for snapshot files
pub const FORMAT_VERSION: &str = "1.0.0";

/// Settings file used when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "querywatch.json";

/// Snapshot file name, relative to the settings file
pub const DEFAULT_CACHE_FILE: &str = "query_cache.json";

pub const DEFAULT_SMTP_PORT: u16 = 25;
