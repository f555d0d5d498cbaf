//! Log level selection of the querywatch binary

use crate::common::{sample_data::ORDERS_QUERY, TestFixture};
use std::process::{Command, Output};

fn run_binary(fixture: &TestFixture, verbose: bool, rust_log: Option<&str>) -> Output {
    let db = fixture.create_orders_database().unwrap();
    let settings = fixture.settings_for(&db, ORDERS_QUERY, &["id"]);
    let settings_path = fixture.write_settings(&settings).unwrap();

    let mut command = Command::new(env!("CARGO_BIN_EXE_querywatch"));
    command
        .current_dir(fixture.root())
        .arg("--config")
        .arg(&settings_path)
        .args(["run", "--dry-run", "--quiet"])
        .env_remove("RUST_LOG");
    if verbose {
        command.arg("--verbose");
    }
    if let Some(filter) = rust_log {
        command.env("RUST_LOG", filter);
    }

    let output = command.output().expect("querywatch binary should start");
    assert!(output.status.success(), "run failed: {:?}", output);
    output
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_default_level_is_info() {
    let fixture = TestFixture::new().unwrap();
    let log = stderr(&run_binary(&fixture, false, None));

    assert!(log.contains("INFO"));
    assert!(log.contains("Query found 3 rows."));
    assert!(!log.contains("DEBUG"));
}

#[test]
fn test_verbose_emits_debug_lines() {
    let fixture = TestFixture::new().unwrap();
    let log = stderr(&run_binary(&fixture, true, None));

    assert!(log.contains("DEBUG"));
    assert!(log.contains("Fetched 3 rows"));
}

#[test]
fn test_rust_log_raises_level_without_verbose() {
    let fixture = TestFixture::new().unwrap();
    let log = stderr(&run_binary(&fixture, false, Some("debug")));

    assert!(log.contains("DEBUG"));
}

#[test]
fn test_rust_log_overrides_verbose() {
    let fixture = TestFixture::new().unwrap();
    let log = stderr(&run_binary(&fixture, true, Some("warn")));

    assert!(!log.contains("DEBUG"));
    assert!(!log.contains("INFO"));
}
