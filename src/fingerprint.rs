//! Fingerprints deciding whether a cached snapshot can be trusted

use crate::config::Settings;
use crate::hash::{HashComputer, HashValue};

/// The two identities a snapshot is stamped with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprints {
    pub config: HashValue,
    pub executable: HashValue,
}

impl Fingerprints {
    pub fn new(settings: &Settings, executable: HashValue) -> Self {
        Self {
            config: config_fingerprint(settings),
            executable,
        }
    }
}

/// Digest of everything that defines row identity and comparison:
/// connection string (before environment substitution), query text and
/// primary-key columns, in order.
pub fn config_fingerprint(settings: &Settings) -> HashValue {
    let mut parts: Vec<&str> = Vec::with_capacity(settings.primary_key.len() + 2);
    parts.push(settings.connection_identity());
    parts.push(&settings.query);
    parts.extend(settings.primary_key.iter().map(String::as_str));
    HashComputer::new().hash_values(&parts)
}

/// Digest of the running binary, so snapshots written by another build are
/// not trusted. Falls back to the package name and version when the binary
/// cannot be read.
pub fn executable_fingerprint() -> HashValue {
    let computer = HashComputer::new();
    match std::env::current_exe().and_then(std::fs::read) {
        Ok(bytes) => computer.hash_bytes(&bytes),
        Err(e) => {
            log::warn!(
                "Could not read executable for fingerprinting ({}), using package version",
                e
            );
            computer.hash_value(&format!(
                "{}@{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
        }
    }
}
