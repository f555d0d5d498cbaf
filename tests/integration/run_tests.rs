//! Integration tests for the run command against real DuckDB files

use crate::common::{sample_data::ORDERS_QUERY, CliTestRunner};
use querywatch::commands::{cache_info, ExitStatus};
use querywatch::config::Settings;
use querywatch::fingerprint::executable_fingerprint;
use querywatch::snapshot::SnapshotStore;
use querywatch::value::Value;
use querywatch::QuerywatchError;

fn runner_with_orders() -> CliTestRunner {
    let runner = CliTestRunner::new().unwrap();
    let db = runner.fixture().create_orders_database().unwrap();
    let settings = runner.fixture().settings_for(&db, ORDERS_QUERY, &["id"]);
    runner.fixture().write_settings(&settings).unwrap();
    runner
}

#[test]
fn test_first_run_stores_baseline() {
    let runner = runner_with_orders();
    // Seeding never sends mail
    let status = runner.expect_success(&["run", "--quiet"]);
    assert_eq!(status, ExitStatus::Success);

    let stored = SnapshotStore::new(runner.fixture().cache_path()).load().unwrap();
    assert_eq!(stored.snapshot.row_count(), 3);

    let first = &stored.snapshot.items[0].value;
    assert_eq!(first["id"], Value::Int(1));
    assert_eq!(first["customer"], Value::from("Alice"));
    assert_eq!(first["total"], Value::Raw(serde_json::json!("19.99")));
}

#[test]
fn test_dry_run_leaves_cache_untouched() {
    let runner = runner_with_orders();
    runner.expect_success(&["run", "-q"]);

    let db = runner.fixture().root().join("shop.duckdb");
    runner
        .fixture()
        .execute_sql(
            &db,
            "UPDATE orders SET status = 'shipped' WHERE id = 1;
             INSERT INTO orders VALUES (4, 'Dan', 'new', 1.00);",
        )
        .unwrap();

    assert_eq!(
        runner.expect_success(&["run", "--dry-run", "-q"]),
        ExitStatus::Success
    );

    let stored = SnapshotStore::new(runner.fixture().cache_path()).load().unwrap();
    assert_eq!(stored.snapshot.row_count(), 3);
    assert_eq!(stored.snapshot.items[0].value["status"], Value::from("new"));
}

#[test]
fn test_dry_run_before_any_run_writes_nothing() {
    let runner = runner_with_orders();
    runner.expect_success(&["run", "--dry-run", "-q"]);
    assert!(!runner.fixture().cache_path().exists());
}

#[test]
fn test_unreachable_mail_server_exits_with_notification_failure() {
    let runner = runner_with_orders();
    let mut settings = Settings::load(&runner.fixture().settings_path()).unwrap();
    settings.smtp.server = "127.0.0.1".to_string();
    settings.smtp.port = 1;
    runner.fixture().write_settings(&settings).unwrap();

    // Seeding never sends mail
    assert_eq!(runner.expect_success(&["run", "-q"]), ExitStatus::Success);

    let db = runner.fixture().root().join("shop.duckdb");
    runner
        .fixture()
        .execute_sql(&db, "UPDATE orders SET customer = 'Bobby' WHERE id = 2;")
        .unwrap();

    let status = runner.expect_success(&["run", "-q"]);
    assert_eq!(status, ExitStatus::NotificationFailed);
    assert_eq!(status.code(), 2);

    // The new rows were still stored
    let stored = SnapshotStore::new(runner.fixture().cache_path()).load().unwrap();
    assert_eq!(stored.snapshot.items[1].value["customer"], Value::from("Bobby"));
}

#[test]
fn test_bad_query_leaves_cache_untouched() {
    let runner = CliTestRunner::new().unwrap();
    let db = runner.fixture().create_orders_database().unwrap();
    let settings = runner
        .fixture()
        .settings_for(&db, "select * from no_such_table", &["id"]);
    runner.fixture().write_settings(&settings).unwrap();

    let error = runner.expect_failure(&["run", "--dry-run", "-q"]);
    assert!(matches!(error, QuerywatchError::Query { .. }));
    assert!(!runner.fixture().cache_path().exists());
}

#[test]
fn test_missing_primary_key_column_fails() {
    let runner = CliTestRunner::new().unwrap();
    let db = runner.fixture().create_orders_database().unwrap();
    let settings = runner
        .fixture()
        .settings_for(&db, "select customer, status from orders", &["id"]);
    runner.fixture().write_settings(&settings).unwrap();

    let error = runner.expect_failure(&["run", "--dry-run", "-q"]);
    assert!(matches!(error, QuerywatchError::PrimaryKey { .. }));
    assert!(!runner.fixture().cache_path().exists());
}

#[test]
fn test_show_after_run_reports_valid_cache() {
    let runner = runner_with_orders();
    runner.expect_success(&["run", "-q"]);
    runner.expect_success(&["show"]);

    let settings = Settings::load(&runner.fixture().settings_path()).unwrap();
    let info = cache_info(&settings, &executable_fingerprint());
    assert!(info.valid);
    assert_eq!(info.rows, Some(3));
}

#[test]
fn test_changed_query_reseeds() {
    let runner = runner_with_orders();
    runner.expect_success(&["run", "-q"]);

    let mut settings = Settings::load(&runner.fixture().settings_path()).unwrap();
    settings.query = "select id, status from orders order by id".to_string();
    runner.fixture().write_settings(&settings).unwrap();

    let info = cache_info(&settings, &executable_fingerprint());
    assert!(info.exists);
    assert!(!info.valid);

    runner.expect_success(&["run", "-q"]);
    let info = cache_info(&settings, &executable_fingerprint());
    assert!(info.valid);
}
