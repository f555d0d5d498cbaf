//! Error types for querywatch operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuerywatchError>;

#[derive(Error, Debug)]
pub enum QuerywatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Query error: {message}")]
    Query { message: String },

    #[error("Primary key column '{column}' is missing from the query result")]
    PrimaryKey { column: String },

    #[error("Snapshot error: {message}")]
    Snapshot { message: String },

    #[error("Notification error: {message}")]
    Notification { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

impl QuerywatchError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query {
            message: msg.into(),
        }
    }

    pub fn primary_key(column: impl Into<String>) -> Self {
        Self::PrimaryKey {
            column: column.into(),
        }
    }

    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot {
            message: msg.into(),
        }
    }

    pub fn notification(msg: impl Into<String>) -> Self {
        Self::Notification {
            message: msg.into(),
        }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: msg.into(),
        }
    }
}
