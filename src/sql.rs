//! Connection string handling for the DuckDB query executor

use crate::error::{QuerywatchError, Result};
use duckdb::Connection;
use std::env;
use std::path::Path;

/// How a connection string is turned into a DuckDB connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionTarget {
    /// Blank or `:memory:`
    InMemory,
    /// One or more `ATTACH ...` statements run against an in-memory database
    Attach(String),
    /// Path of a DuckDB database file
    File(String),
}

impl ConnectionTarget {
    pub fn parse(connection_string: &str) -> Self {
        let trimmed = connection_string.trim();
        if trimmed.is_empty() || trimmed == ":memory:" {
            Self::InMemory
        } else if trimmed.to_uppercase().starts_with("ATTACH") {
            Self::Attach(trimmed.to_string())
        } else {
            Self::File(trimmed.to_string())
        }
    }
}

/// Open a DuckDB connection for a connection string
pub fn open_connection(connection_string: &str) -> Result<Connection> {
    match ConnectionTarget::parse(connection_string) {
        ConnectionTarget::InMemory => Ok(Connection::open_in_memory()?),
        ConnectionTarget::Attach(statements) => {
            let connection = Connection::open_in_memory()?;
            connection.execute_batch(&statements).map_err(|e| {
                QuerywatchError::query(format!("Failed to attach database: {}", e))
            })?;
            Ok(connection)
        }
        ConnectionTarget::File(path) => {
            if !Path::new(&path).exists() {
                return Err(QuerywatchError::query(format!(
                    "Database file not found: {}",
                    path
                )));
            }
            Connection::open(&path).map_err(|e| {
                QuerywatchError::query(format!("Failed to open database '{}': {}", path, e))
            })
        }
    }
}

/// Substitute `{VAR_NAME}` placeholders with environment variables.
///
/// Only letters, digits and underscores (not starting with a digit) form a
/// placeholder; any other braced text is left as written.
pub fn substitute_env_vars(input: &str) -> Result<String> {
    let mut result = input.to_string();

    let mut start = 0;
    while let Some(open_pos) = result[start..].find('{') {
        let open_pos = start + open_pos;
        if let Some(close_pos) = result[open_pos..].find('}') {
            let close_pos = open_pos + close_pos;
            let var_name = &result[open_pos + 1..close_pos];
            if !is_placeholder_name(var_name) {
                start = open_pos + 1;
                continue;
            }

            let var_value = env::var(var_name).map_err(|_| {
                QuerywatchError::config(format!(
                    "Environment variable '{}' not found. Make sure it's set in your .env file or environment.",
                    var_name
                ))
            })?;

            result.replace_range(open_pos..=close_pos, &var_value);
            start = open_pos + var_value.len();
        } else {
            start = open_pos + 1;
        }
    }

    Ok(result)
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Load environment variables from a .env file if one exists
pub fn load_env_file() -> Result<()> {
    if Path::new(".env").exists() {
        dotenvy::dotenv().map_err(|e| {
            QuerywatchError::config(format!("Failed to load .env file: {}", e))
        })?;
    }

    Ok(())
}
