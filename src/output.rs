//! Output formatting utilities

use crate::config::Settings;
use crate::render::RenderMode;
use crate::watcher::{RunOutcome, RunReport};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// What `show` reports about the cached snapshot
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub path: PathBuf,
    pub exists: bool,
    /// False when the file exists but cannot be parsed
    pub readable: bool,
    /// Whether the next run would compare against this snapshot
    pub valid: bool,
    pub format_version: Option<String>,
    pub rows: Option<usize>,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Local>>,
    pub age_hours: Option<f64>,
}

/// Pretty printer for querywatch output
pub struct PrettyPrinter;

impl PrettyPrinter {
    /// Print the settings summary shown by `validate`
    pub fn print_settings_summary(settings: &Settings) {
        println!("✅ Settings are valid");
        println!("├─ Connection: {}", settings.connection_string);
        println!("├─ Query: {}", settings.query.trim());
        println!("├─ Primary key: {}", settings.primary_key.join(", "));
        println!("├─ Cache: {}", settings.cache_path.display());
        println!("├─ Render mode: {}", render_mode_name(settings.render_mode));
        println!(
            "├─ SMTP: {}:{}{}",
            settings.smtp.server,
            settings.smtp.port,
            if settings.smtp.ssl { " (STARTTLS)" } else { "" }
        );
        println!("└─ Recipients: {}", settings.smtp.to_addresses.join(", "));
    }

    /// Print cached snapshot information
    pub fn print_cache_info(info: &CacheInfo) {
        println!("📸 Cache: {}", info.path.display());

        if !info.exists {
            println!("└─ No cached results yet. The next run will store a baseline.");
            return;
        }

        if !info.readable {
            println!("└─ ❌ Unreadable. The next run will replace it.");
            return;
        }

        if let Some(rows) = info.rows {
            println!("├─ Rows: {}", rows);
        }
        if let Some(version) = &info.format_version {
            println!("├─ Format version: {}", version);
        }
        if let Some(created) = &info.created {
            println!("├─ Created: {}", created.to_rfc3339());
        }
        if let (Some(modified), Some(age)) = (&info.modified, info.age_hours) {
            println!(
                "├─ Modified: {} ({} hours ago)",
                modified.format("%Y-%m-%d %H:%M:%S"),
                age
            );
        }

        if info.valid {
            println!("└─ ✅ Valid for the current settings and executable");
        } else {
            println!("└─ ⚠️  Written by other settings or another build; the next run will reseed");
        }
    }

    /// Print the result of a watch run
    pub fn print_run_report(report: &RunReport) {
        match &report.outcome {
            RunOutcome::Seeded => {
                println!("📥 Stored {} rows as the new baseline", report.rows)
            }
            RunOutcome::Unchanged => {
                println!("✅ No changes detected ({} rows)", report.rows)
            }
            RunOutcome::Notified { changes } => {
                println!("📧 Notified about {} changed rows ({} rows)", changes, report.rows)
            }
            RunOutcome::NotifyFailed { changes, reason } => {
                println!("❌ Found {} changed rows but notification failed", changes);
                println!("   {}", reason);
            }
        }
    }
}

fn render_mode_name(mode: RenderMode) -> &'static str {
    match mode {
        RenderMode::Table => "table",
        RenderMode::LogDigest => "log_digest",
    }
}

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn format_cache_info(info: &CacheInfo) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(info)?)
    }
}
