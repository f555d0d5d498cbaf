//! Primary-key based change detection between two snapshots

use crate::error::{QuerywatchError, Result};
use crate::snapshot::DataItem;
use crate::value::Row;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Classification of a changed row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeStatus {
    Added,
    Updated,
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeStatus::Added => f.write_str("Added"),
            ChangeStatus::Updated => f.write_str("Updated"),
        }
    }
}

/// A row that is new or differs from its previous version. Borrows both
/// sides from the snapshots being compared.
#[derive(Debug, Clone, Copy)]
pub struct ChangeRecord<'a> {
    pub old: Option<&'a DataItem>,
    pub new: &'a DataItem,
}

impl<'a> ChangeRecord<'a> {
    pub fn status(&self) -> ChangeStatus {
        if self.old.is_some() {
            ChangeStatus::Updated
        } else {
            ChangeStatus::Added
        }
    }
}

/// Primary-key values in string form; `None` stands for SQL NULL
type KeyValues = Vec<Option<String>>;

/// Change detector
pub struct ChangeDetector;

impl ChangeDetector {
    /// Compare the current rows against the previous snapshot.
    ///
    /// Rows are matched on the string form of their primary-key columns;
    /// when several previous rows share a key the first one wins. Without
    /// history nothing is reported. The result follows the order of
    /// `current`. Rows that disappeared are not reported.
    pub fn detect_changes<'a>(
        prior: Option<&'a [DataItem]>,
        current: &'a [DataItem],
        primary_key: &[String],
    ) -> Result<Vec<ChangeRecord<'a>>> {
        if primary_key.is_empty() {
            return Err(QuerywatchError::invalid_input(
                "Primary key must contain at least one column",
            ));
        }

        let prior = match prior {
            Some(prior) => prior,
            None => return Ok(Vec::new()),
        };

        let mut index: HashMap<KeyValues, &'a DataItem> = HashMap::with_capacity(prior.len());
        for item in prior {
            // Old rows lacking a key column can never match
            if let Some(key) = Self::key_values(&item.value, primary_key) {
                index.entry(key).or_insert(item);
            }
        }

        let mut changes = Vec::new();
        for item in current {
            let key = Self::key_values(&item.value, primary_key)
                .ok_or_else(|| Self::missing_column(&item.value, primary_key))?;

            match index.get(&key) {
                None => changes.push(ChangeRecord { old: None, new: item }),
                Some(old) if old.hash != item.hash => changes.push(ChangeRecord {
                    old: Some(*old),
                    new: item,
                }),
                Some(_) => {}
            }
        }

        Ok(changes)
    }

    /// Check that every primary-key column is present in every row
    pub fn validate_primary_key(items: &[DataItem], primary_key: &[String]) -> Result<()> {
        if primary_key.is_empty() {
            return Err(QuerywatchError::invalid_input(
                "Primary key must contain at least one column",
            ));
        }

        for item in items {
            if let Some(column) = primary_key.iter().find(|c| !item.value.contains_key(*c)) {
                return Err(QuerywatchError::primary_key(column.clone()));
            }
        }

        Ok(())
    }

    /// Human-readable `key: value` list for logs
    pub fn describe_key(row: &Row, primary_key: &[String]) -> String {
        primary_key
            .iter()
            .map(|key| {
                let value = row.get(key).map(|v| v.to_string()).unwrap_or_default();
                format!("{}: {}", key, value)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn key_values(row: &Row, primary_key: &[String]) -> Option<KeyValues> {
        primary_key
            .iter()
            .map(|column| row.get(column).map(|value| value.key_string()))
            .collect()
    }

    fn missing_column(row: &Row, primary_key: &[String]) -> QuerywatchError {
        let column = primary_key
            .iter()
            .find(|c| !row.contains_key(*c))
            .cloned()
            .unwrap_or_default();
        QuerywatchError::primary_key(column)
    }
}
