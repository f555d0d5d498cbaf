//! Common test utilities and helpers

use duckdb::Connection;
use querywatch::commands::ExitStatus;
use querywatch::config::Settings;
use querywatch::notify::Notifier;
use querywatch::{QuerywatchError, Result};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test fixture manager for creating temporary test environments
pub struct TestFixture {
    pub temp_dir: TempDir,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the root path of the test fixture
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.root().join(querywatch::DEFAULT_CONFIG_FILE)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root().join(querywatch::DEFAULT_CACHE_FILE)
    }

    /// Create a DuckDB database file and run setup SQL against it
    pub fn create_database(&self, name: &str, sql: &str) -> Result<PathBuf> {
        let path = self.root().join(name);
        let conn = Connection::open(&path)?;
        conn.execute_batch(sql)?;
        Ok(path)
    }

    /// Run more SQL against an existing database file
    pub fn execute_sql(&self, db_path: &Path, sql: &str) -> Result<()> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    /// The standard orders database used by most tests
    pub fn create_orders_database(&self) -> Result<PathBuf> {
        self.create_database("shop.duckdb", sample_data::ORDERS_SQL)
    }

    /// Sample settings pointed at a database inside the fixture
    pub fn settings_for(&self, db_path: &Path, query: &str, primary_key: &[&str]) -> Settings {
        let mut settings = Settings::sample();
        settings.connection_string = db_path.display().to_string();
        settings.query = query.to_string();
        settings.primary_key = primary_key.iter().map(|c| c.to_string()).collect();
        settings.cache_path = self.cache_path();
        settings
    }

    /// Write settings as the fixture's settings file
    pub fn write_settings(&self, settings: &Settings) -> Result<PathBuf> {
        let path = self.settings_path();
        fs::write(&path, serde_json::to_string_pretty(settings)?)?;
        Ok(path)
    }

    /// Create a corrupted file for testing error handling
    pub fn create_corrupted_file(&self, path: &Path) -> Result<()> {
        fs::write(path, b"\x00\x01\x02\x03invalid_data\xff\xfe")?;
        Ok(())
    }
}

/// Helper for running CLI commands in tests
pub struct CliTestRunner {
    fixture: TestFixture,
}

impl CliTestRunner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: TestFixture::new()?,
        })
    }

    pub fn fixture(&self) -> &TestFixture {
        &self.fixture
    }

    /// Run a querywatch command against the fixture's settings file
    pub fn run_command(&self, args: &[&str]) -> Result<ExitStatus> {
        use clap::Parser;
        use querywatch::cli::Cli;
        use querywatch::commands::execute_command;

        let settings_path = self.fixture.settings_path();
        let settings_arg = settings_path.display().to_string();

        let mut cmd_args = vec!["querywatch"];
        cmd_args.extend(args);
        if !args.contains(&"--config") {
            cmd_args.push("--config");
            cmd_args.push(&settings_arg);
        }

        let cli = Cli::try_parse_from(cmd_args)
            .map_err(|e| QuerywatchError::invalid_input(e.to_string()))?;

        execute_command(cli.command, &cli.config, cli.verbose)
    }

    /// Run a command and expect it to succeed
    pub fn expect_success(&self, args: &[&str]) -> ExitStatus {
        self.run_command(args).expect("Command should succeed")
    }

    /// Run a command and expect it to fail
    pub fn expect_failure(&self, args: &[&str]) -> QuerywatchError {
        self.run_command(args).expect_err("Command should fail")
    }
}

/// A sent notification
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Notifier that keeps every message it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<SentMessage>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, to: &[String], subject: &str, html_body: &str) -> Result<()> {
        self.sent.borrow_mut().push(SentMessage {
            to: to.to_vec(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

/// Notifier whose server is always down
pub struct FailingNotifier;

impl Notifier for FailingNotifier {
    fn send(&self, _to: &[String], _subject: &str, _html_body: &str) -> Result<()> {
        Err(QuerywatchError::notification("550 mailbox unavailable"))
    }
}

/// Sample data generators for testing
pub mod sample_data {
    pub const ORDERS_SQL: &str = "
        CREATE TABLE orders (id INTEGER, customer VARCHAR, status VARCHAR, total DECIMAL(10, 2));
        INSERT INTO orders VALUES
            (1, 'Alice', 'new', 19.99),
            (2, 'Bob', 'new', 5.50),
            (3, 'Carol', 'shipped', 42.00);
    ";

    pub const ORDERS_QUERY: &str = "select id, customer, status, total from orders order by id";
}

/// Assertion helpers for test validation
pub mod assertions {
    use std::path::Path;

    /// Assert that a file exists and is not empty
    pub fn assert_file_exists_and_not_empty(path: &Path) {
        assert!(path.exists(), "File should exist: {}", path.display());
        let metadata = std::fs::metadata(path).expect("Should be able to read file metadata");
        assert!(metadata.len() > 0, "File should not be empty: {}", path.display());
    }
}
