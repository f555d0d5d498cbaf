//! Integration tests for init, validate and show

use crate::common::{assertions::*, CliTestRunner};
use querywatch::config::Settings;
use querywatch::QuerywatchError;
use std::fs;

#[test]
fn test_init_writes_valid_settings() {
    let runner = CliTestRunner::new().unwrap();
    runner.expect_success(&["init"]);

    let path = runner.fixture().settings_path();
    assert_file_exists_and_not_empty(&path);
    let settings = Settings::load_validated(&path).unwrap();
    assert_eq!(settings.primary_key, vec!["id"]);
}

#[test]
fn test_init_refuses_existing_file() {
    let runner = CliTestRunner::new().unwrap();
    fs::write(runner.fixture().settings_path(), "{}").unwrap();

    let error = runner.expect_failure(&["init"]);
    assert!(matches!(error, QuerywatchError::Config { .. }));
    assert_eq!(fs::read_to_string(runner.fixture().settings_path()).unwrap(), "{}");

    runner.expect_success(&["init", "--force"]);
    assert!(Settings::load(&runner.fixture().settings_path()).is_ok());
}

#[test]
fn test_validate_accepts_sample() {
    let runner = CliTestRunner::new().unwrap();
    runner.expect_success(&["init"]);
    runner.expect_success(&["validate"]);
}

#[test]
fn test_validate_reports_every_problem() {
    let runner = CliTestRunner::new().unwrap();
    let mut settings = Settings::sample();
    settings.query = "update orders set status = 'x'".to_string();
    settings.smtp.to_addresses.clear();
    runner.fixture().write_settings(&settings).unwrap();

    let message = runner.expect_failure(&["validate"]).to_string();
    assert!(message.contains("Query must start"));
    assert!(message.contains("to addresses"));
}

#[test]
fn test_validate_missing_settings_file() {
    let runner = CliTestRunner::new().unwrap();
    let error = runner.expect_failure(&["validate"]);
    assert!(matches!(error, QuerywatchError::Config { .. }));
}

#[test]
fn test_show_without_cache() {
    let runner = CliTestRunner::new().unwrap();
    runner.expect_success(&["init"]);
    runner.expect_success(&["show"]);
    runner.expect_success(&["show", "--format", "json"]);
}

#[test]
fn test_show_rejects_unknown_format() {
    let runner = CliTestRunner::new().unwrap();
    runner.expect_success(&["init"]);
    let error = runner.expect_failure(&["show", "--format", "xml"]);
    assert!(matches!(error, QuerywatchError::InvalidInput { .. }));
}
