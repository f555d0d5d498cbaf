//! Command implementations for querywatch CLI

use crate::cli::{Commands, OutputFormat};
use crate::config::Settings;
use crate::data::DuckDbExecutor;
use crate::error::{QuerywatchError, Result};
use crate::fingerprint::{executable_fingerprint, Fingerprints};
use crate::notify::{SmtpNotifier, WriterNotifier};
use crate::output::{CacheInfo, JsonFormatter, PrettyPrinter};
use crate::snapshot::{hours_between, SnapshotStore};
use crate::sql::load_env_file;
use crate::watcher::{ChangeWatcher, RunReport};
use chrono::Local;
use std::fs;
use std::io::IsTerminal;
use std::path::Path;

/// How a successful command should end the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    /// The run finished but its notification could not be delivered
    NotificationFailed,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::NotificationFailed => 2,
        }
    }
}

/// Execute a command
pub fn execute_command(command: Commands, config_path: &Path, verbose: bool) -> Result<ExitStatus> {
    match command {
        Commands::Init { force } => init_command(config_path, force),
        Commands::Validate => validate_command(config_path),
        Commands::Run { dry_run, quiet } => run_command(config_path, dry_run, quiet, verbose),
        Commands::Show { format } => show_command(config_path, &format),
    }
}

/// Write a sample settings file
fn init_command(config_path: &Path, force: bool) -> Result<ExitStatus> {
    if config_path.exists() && !force {
        return Err(QuerywatchError::config(format!(
            "Settings file '{}' already exists. Use --force to overwrite it.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(&Settings::sample())?;
    fs::write(config_path, content + "\n")?;

    println!("✅ Wrote sample settings to: {}", config_path.display());
    println!("📝 Edit the connection string, query and SMTP settings, then run 'querywatch validate'");

    Ok(ExitStatus::Success)
}

/// Load and validate settings
fn validate_command(config_path: &Path) -> Result<ExitStatus> {
    load_env_file()?;
    let settings = Settings::load_validated(config_path)?;
    PrettyPrinter::print_settings_summary(&settings);
    Ok(ExitStatus::Success)
}

/// Run the query once
fn run_command(config_path: &Path, dry_run: bool, quiet: bool, verbose: bool) -> Result<ExitStatus> {
    load_env_file()?;
    let settings = Settings::load_validated(config_path)?;
    let executable = executable_fingerprint();
    let show_progress = !quiet && std::io::stderr().is_terminal();

    let report = if dry_run {
        ChangeWatcher::new(settings, DuckDbExecutor::new(), WriterNotifier::stdout(), executable)
            .with_progress(show_progress)
            .with_debug_log(verbose)
            .with_dry_run(true)
            .run()?
    } else {
        let notifier = SmtpNotifier::new(settings.smtp.clone());
        ChangeWatcher::new(settings, DuckDbExecutor::new(), notifier, executable)
            .with_progress(show_progress)
            .with_debug_log(verbose)
            .run()?
    };

    finish_run(&report, quiet)
}

fn finish_run(report: &RunReport, quiet: bool) -> Result<ExitStatus> {
    if !quiet {
        PrettyPrinter::print_run_report(report);
    }

    if report.outcome.notification_failed() {
        Ok(ExitStatus::NotificationFailed)
    } else {
        Ok(ExitStatus::Success)
    }
}

/// Describe the cached snapshot
fn show_command(config_path: &Path, format: &str) -> Result<ExitStatus> {
    let output_format = OutputFormat::parse(format).map_err(QuerywatchError::invalid_input)?;

    load_env_file()?;
    let settings = Settings::load(config_path)?;
    let info = cache_info(&settings, &executable_fingerprint());

    match output_format {
        OutputFormat::Pretty => PrettyPrinter::print_cache_info(&info),
        OutputFormat::Json => println!("{}", JsonFormatter::format_cache_info(&info)?),
    }

    Ok(ExitStatus::Success)
}

/// Inspect the snapshot the next run would compare against
pub fn cache_info(settings: &Settings, executable: &str) -> CacheInfo {
    let store = SnapshotStore::new(settings.cache_path.clone());
    let fingerprints = Fingerprints::new(settings, executable.to_string());
    let exists = store.exists();

    match store.load() {
        Some(stored) => CacheInfo {
            path: store.path().to_path_buf(),
            exists,
            readable: true,
            valid: stored.snapshot.matches(&fingerprints),
            format_version: Some(stored.snapshot.format_version.clone()),
            rows: Some(stored.snapshot.row_count()),
            created: Some(stored.snapshot.created),
            modified: stored.modified,
            age_hours: stored.modified.map(|m| hours_between(m, Local::now())),
        },
        None => CacheInfo {
            path: store.path().to_path_buf(),
            exists,
            readable: false,
            valid: false,
            format_version: None,
            rows: None,
            created: None,
            modified: None,
            age_hours: None,
        },
    }
}
