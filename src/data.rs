//! Query execution using DuckDB

use crate::error::{QuerywatchError, Result};
use crate::sql::open_connection;
use crate::value::{Row, Value};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use duckdb::types::{TimeUnit, Value as DuckValue};
use duckdb::Connection;

/// Rows returned by one query execution
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Name of the database the query ran against
    pub database: String,
    /// Column names in query order
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Runs the configured query and returns its rows in order
pub trait QueryExecutor {
    fn execute(&self, connection_string: &str, query: &str) -> Result<QueryResult>;
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &E {
    fn execute(&self, connection_string: &str, query: &str) -> Result<QueryResult> {
        (**self).execute(connection_string, query)
    }
}

/// Executes queries through DuckDB
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbExecutor;

impl DuckDbExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Wrap the query in a temporary view so its columns can be described
    fn create_view(connection: &Connection, query: &str) -> Result<()> {
        let query = query.trim().trim_end_matches(';');
        let create_view_sql = format!("CREATE OR REPLACE TEMP VIEW query_view AS {}", query);

        connection
            .execute_batch(&create_view_sql)
            .map_err(|e| QuerywatchError::query(format!("Failed to prepare query: {}", e)))
    }

    fn column_names(connection: &Connection) -> Result<Vec<String>> {
        let mut stmt = connection.prepare("DESCRIBE query_view").map_err(|e| {
            QuerywatchError::query(format!("Failed to prepare describe query: {}", e))
        })?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| QuerywatchError::query(format!("Failed to query column info: {}", e)))?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.map_err(|e| {
                QuerywatchError::query(format!("Failed to process column info row: {}", e))
            })?);
        }
        Ok(columns)
    }

    fn database_name(connection: &Connection) -> String {
        connection
            .query_row("SELECT current_database()", [], |row| row.get::<_, String>(0))
            .unwrap_or_else(|e| {
                log::debug!("Could not determine database name: {}", e);
                String::from("database")
            })
    }

    fn fetch_rows(connection: &Connection, columns: &[String]) -> Result<Vec<Row>> {
        let mut stmt = connection.prepare("SELECT * FROM query_view").map_err(|e| {
            QuerywatchError::query(format!("Failed to prepare data extraction query: {}", e))
        })?;

        let rows = stmt
            .query_map([], |row| {
                let mut values = Row::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    let value: DuckValue = row.get(i)?;
                    values.insert(name.clone(), convert_value(value));
                }
                Ok(values)
            })
            .map_err(|e| QuerywatchError::query(format!("Failed to execute query: {}", e)))?;

        let mut data = Vec::new();
        for row in rows {
            data.push(row.map_err(|e| {
                QuerywatchError::query(format!("Failed to read result row: {}", e))
            })?);
        }
        Ok(data)
    }
}

impl QueryExecutor for DuckDbExecutor {
    fn execute(&self, connection_string: &str, query: &str) -> Result<QueryResult> {
        let connection = open_connection(connection_string)?;

        Self::create_view(&connection, query)?;
        let columns = Self::column_names(&connection)?;
        let database = Self::database_name(&connection);
        let rows = Self::fetch_rows(&connection, &columns)?;

        log::debug!(
            "Fetched {} rows with {} columns from {}",
            rows.len(),
            columns.len(),
            database
        );

        Ok(QueryResult {
            database,
            columns,
            rows,
        })
    }
}

/// Map a DuckDB value onto the row value model.
///
/// Integers that fit become `Int`, binary floats become `Float`; exact or
/// temporal types are rendered as strings inside `Raw` so they keep their
/// precision and stay distinct from plain text.
pub fn convert_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(b) => Value::Bool(b),
        DuckValue::TinyInt(i) => Value::Int(i64::from(i)),
        DuckValue::SmallInt(i) => Value::Int(i64::from(i)),
        DuckValue::Int(i) => Value::Int(i64::from(i)),
        DuckValue::BigInt(i) => Value::Int(i),
        DuckValue::UTinyInt(i) => Value::Int(i64::from(i)),
        DuckValue::USmallInt(i) => Value::Int(i64::from(i)),
        DuckValue::UInt(i) => Value::Int(i64::from(i)),
        DuckValue::UBigInt(i) => match i64::try_from(i) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Raw(serde_json::Value::from(i)),
        },
        DuckValue::HugeInt(i) => match i64::try_from(i) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Raw(serde_json::Value::String(i.to_string())),
        },
        DuckValue::Float(f) => Value::Float(f64::from(f)),
        DuckValue::Double(f) => Value::Float(f),
        DuckValue::Decimal(d) => Value::Raw(serde_json::Value::String(d.to_string())),
        DuckValue::Text(s) => Value::Text(s),
        DuckValue::Enum(s) => Value::Text(s),
        DuckValue::Blob(bytes) => Value::Raw(serde_json::Value::String(format!(
            "\\x{}",
            bytes.iter().map(|b| format!("{:02x}", b)).collect::<String>()
        ))),
        DuckValue::Date32(days) => Value::Raw(serde_json::Value::String(format_date(days))),
        DuckValue::Time64(unit, t) => Value::Raw(serde_json::Value::String(format_time(unit, t))),
        DuckValue::Timestamp(unit, ts) => {
            Value::Raw(serde_json::Value::String(format_timestamp(unit, ts)))
        }
        DuckValue::List(items) | DuckValue::Array(items) => Value::Raw(serde_json::Value::Array(
            items.into_iter().map(|v| to_json(convert_value(v))).collect(),
        )),
        other => Value::Raw(serde_json::Value::String(format!("{:?}", other))),
    }
}

fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Int(i) => serde_json::Value::from(i),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Raw(json) => json,
    }
}

fn format_date(days: i32) -> String {
    // 719_163 days separate 0001-01-01 from the Unix epoch
    days.checked_add(719_163)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("date({})", days))
}

fn to_micros(unit: TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn format_time(unit: TimeUnit, value: i64) -> String {
    let micros = to_micros(unit, value);
    let secs = micros.div_euclid(1_000_000);
    let nanos = micros.rem_euclid(1_000_000) * 1_000;
    u32::try_from(secs)
        .ok()
        .zip(u32::try_from(nanos).ok())
        .and_then(|(s, n)| NaiveTime::from_num_seconds_from_midnight_opt(s, n))
        .map(|t| t.format("%H:%M:%S%.f").to_string())
        .unwrap_or_else(|| format!("time({})", micros))
}

fn format_timestamp(unit: TimeUnit, value: i64) -> String {
    let micros = to_micros(unit, value);
    DateTime::<Utc>::from_timestamp_micros(micros)
        .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string())
        .unwrap_or_else(|| format!("timestamp({})", micros))
}
