//! One watch run: query, compare with the last snapshot, notify, persist

use crate::change_detection::ChangeDetector;
use crate::config::Settings;
use crate::data::QueryExecutor;
use crate::error::Result;
use crate::fingerprint::Fingerprints;
use crate::hash::{HashComputer, HashValue};
use crate::notify::Notifier;
use crate::progress::ProgressReporter;
use crate::render::{render_notification, RenderContext};
use crate::run_log::RunLog;
use crate::snapshot::{DataItem, Snapshot, SnapshotStore, StoredSnapshot};
use crate::value::Row;
use chrono::Local;
use serde::Serialize;
use std::fmt;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// No usable history; the results were stored for the next run
    Seeded,
    Unchanged,
    Notified { changes: usize },
    /// Changes were found but could not be delivered
    NotifyFailed { changes: usize, reason: String },
}

impl RunOutcome {
    pub fn notification_failed(&self) -> bool {
        matches!(self, RunOutcome::NotifyFailed { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::Seeded => f.write_str("seeded"),
            RunOutcome::Unchanged => f.write_str("unchanged"),
            RunOutcome::Notified { changes } => write!(f, "notified ({} changes)", changes),
            RunOutcome::NotifyFailed { changes, reason } => {
                write!(f, "notification failed ({} changes): {}", changes, reason)
            }
        }
    }
}

/// Summary of a finished run
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Rows returned by the query
    pub rows: usize,
    pub changes: usize,
    pub log: RunLog,
}

/// Runs the configured query once and reports what changed since last time
pub struct ChangeWatcher<E: QueryExecutor, N: Notifier> {
    settings: Settings,
    executor: E,
    notifier: N,
    store: SnapshotStore,
    executable_fingerprint: HashValue,
    show_progress: bool,
    keep_debug: bool,
    dry_run: bool,
}

impl<E: QueryExecutor, N: Notifier> ChangeWatcher<E, N> {
    pub fn new(
        settings: Settings,
        executor: E,
        notifier: N,
        executable_fingerprint: HashValue,
    ) -> Self {
        let store = SnapshotStore::new(settings.cache_path.clone());
        Self {
            settings,
            executor,
            notifier,
            store,
            executable_fingerprint,
            show_progress: false,
            keep_debug: false,
            dry_run: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Keep debug lines in the run log (they show up in log digests)
    pub fn with_debug_log(mut self, keep_debug: bool) -> Self {
        self.keep_debug = keep_debug;
        self
    }

    /// Leave the stored snapshot untouched, so the next real run sees the
    /// same changes again
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn run(&self) -> Result<RunReport> {
        let mut log = RunLog::with_debug(self.keep_debug);
        log.info(format!(
            "Looking for changes for query: {}",
            self.settings.query.trim()
        ));

        let fingerprints = Fingerprints::new(&self.settings, self.executable_fingerprint.clone());
        let history = self.load_history(&fingerprints, &mut log);

        let mut progress = if self.show_progress {
            ProgressReporter::new_for_run()
        } else {
            ProgressReporter::new_minimal()
        };

        progress.start_query();
        let result = self
            .executor
            .execute(&self.settings.connection_string, &self.settings.query)?;
        progress.finish_query(&format!("Query returned {} rows", result.row_count()));
        log.info(format!("Query found {} rows.", result.row_count()));

        let database = result.database;
        let items = Self::hash_rows(result.rows, &mut progress);
        let primary_key = &self.settings.primary_key;
        ChangeDetector::validate_primary_key(&items, primary_key)?;

        let prior = history.as_ref().map(|h| h.snapshot.items.as_slice());
        if let Some(prior) = prior {
            if prior.len() != items.len() {
                log.warn(format!(
                    "Row count has changed from {} to {}.",
                    prior.len(),
                    items.len()
                ));
            }
        }

        let changes = ChangeDetector::detect_changes(prior, &items, primary_key)?;
        for change in &changes {
            log.debug(format!(
                "{} row {}",
                change.status(),
                ChangeDetector::describe_key(&change.new.value, primary_key)
            ));
        }

        let outcome = match &history {
            None => {
                log.info("No usable cached results. Storing results for the next run.");
                RunOutcome::Seeded
            }
            Some(_) if changes.is_empty() => {
                log.info("No changes detected.");
                RunOutcome::Unchanged
            }
            Some(stored) => {
                log.info("Changes detected. Sending notification.");

                let since = stored.since_text(Local::now());
                let context = RenderContext {
                    database: &database,
                    subject: self.settings.smtp.subject.as_deref(),
                    query: &self.settings.query,
                    since: &since,
                };
                let notification =
                    render_notification(self.settings.render_mode, &context, &changes, &log);

                match self.notifier.send(
                    &self.settings.smtp.to_addresses,
                    &notification.subject,
                    &notification.body,
                ) {
                    Ok(()) => {
                        log.info("Notification sent.");
                        RunOutcome::Notified {
                            changes: changes.len(),
                        }
                    }
                    Err(e) => {
                        log.error(format!(
                            "Changes detected but failed to send notification: {}",
                            e
                        ));
                        RunOutcome::NotifyFailed {
                            changes: changes.len(),
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };
        let change_count = changes.len();

        let rows = items.len();
        if self.dry_run {
            log.info("Dry run. Cached results left unchanged.");
        } else {
            self.store.save(&Snapshot::new(&fingerprints, items))?;
            log.debug(format!(
                "Stored {} rows in {}",
                rows,
                self.store.path().display()
            ));
        }

        Ok(RunReport {
            outcome,
            rows,
            changes: change_count,
            log,
        })
    }

    /// The stored snapshot, when it was written for these settings by this build
    fn load_history(&self, fingerprints: &Fingerprints, log: &mut RunLog) -> Option<StoredSnapshot> {
        let stored = self.store.load()?;

        if !stored.snapshot.matches(fingerprints) {
            log.warn(
                "Cached results found but the settings or executable changed. Ignoring cached results.",
            );
            return None;
        }

        let since = stored.since_text(Local::now());
        if since.is_empty() {
            log.info(format!(
                "Cached results found with {} rows.",
                stored.snapshot.row_count()
            ));
        } else {
            log.info(format!(
                "Cached results found with {} rows {}.",
                stored.snapshot.row_count(),
                since
            ));
        }

        Some(stored)
    }

    fn hash_rows(rows: Vec<Row>, progress: &mut ProgressReporter) -> Vec<DataItem> {
        let computer = HashComputer::new();
        progress.start_rows(rows.len() as u64);

        let items: Vec<DataItem> = rows
            .into_iter()
            .map(|row| {
                let item = DataItem::new(&computer, row);
                progress.inc_rows();
                item
            })
            .collect();

        progress.finish_rows(&format!("Hashed {} rows", items.len()));
        items
    }
}
