//! Hashing utilities for querywatch operations

use crate::value::{Row, Value};
use blake3::Hasher;

/// A hash value represented as a hex string
pub type HashValue = String;

const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_TEXT: u8 = 4;
const TAG_RAW: u8 = 5;

/// Hash computer for rows and identity strings
#[derive(Debug, Default, Clone, Copy)]
pub struct HashComputer;

impl HashComputer {
    pub fn new() -> Self {
        Self
    }

    /// Compute hash for a single value
    pub fn hash_value(&self, value: &str) -> HashValue {
        let mut hasher = Hasher::new();
        hasher.update(value.as_bytes());
        hasher.finalize().to_hex().to_string()
    }

    /// Compute hash for multiple values, order-sensitive
    pub fn hash_values(&self, values: &[&str]) -> HashValue {
        let mut hasher = Hasher::new();
        for value in values {
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Compute the content hash of a row.
    ///
    /// Columns are visited in name order, so two rows with the same columns
    /// and values hash equal whatever order the query produced them in.
    pub fn hash_row(&self, row: &Row) -> HashValue {
        let mut columns: Vec<(&String, &Value)> = row.iter().collect();
        columns.sort_by(|a, b| a.0.cmp(b.0));

        let mut hasher = Hasher::new();
        hasher.update(&(columns.len() as u64).to_le_bytes());
        for (name, value) in columns {
            write_bytes(&mut hasher, name.as_bytes());
            write_value(&mut hasher, value);
        }
        hasher.finalize().to_hex().to_string()
    }

    /// Hash raw bytes, e.g. an executable image
    pub fn hash_bytes(&self, bytes: &[u8]) -> HashValue {
        blake3::hash(bytes).to_hex().to_string()
    }
}

fn write_bytes(hasher: &mut Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn write_value(hasher: &mut Hasher, value: &Value) {
    match value {
        Value::Null => {
            hasher.update(&[TAG_NULL]);
        }
        Value::Bool(b) => {
            hasher.update(&[TAG_BOOL, u8::from(*b)]);
        }
        Value::Int(i) => {
            hasher.update(&[TAG_INT]);
            hasher.update(&i.to_le_bytes());
        }
        Value::Float(f) => {
            hasher.update(&[TAG_FLOAT]);
            hasher.update(&Value::canonical_float_bits(*f).to_le_bytes());
        }
        Value::Text(s) => {
            hasher.update(&[TAG_TEXT]);
            write_bytes(hasher, s.as_bytes());
        }
        Value::Raw(json) => {
            hasher.update(&[TAG_RAW]);
            write_json(hasher, json);
        }
    }
}

/// Object keys are written sorted, independent of the map's own ordering
fn write_json(hasher: &mut Hasher, json: &serde_json::Value) {
    match json {
        serde_json::Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            hasher.update(b"{");
            hasher.update(&(entries.len() as u64).to_le_bytes());
            for (key, item) in entries {
                write_bytes(hasher, key.as_bytes());
                write_json(hasher, item);
            }
        }
        serde_json::Value::Array(items) => {
            hasher.update(b"[");
            hasher.update(&(items.len() as u64).to_le_bytes());
            for item in items {
                write_json(hasher, item);
            }
        }
        scalar => {
            hasher.update(b"=");
            write_bytes(hasher, scalar.to_string().as_bytes());
        }
    }
}
