//! Notification rendering for detected changes

use crate::change_detection::ChangeRecord;
use crate::run_log::RunLog;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Which renderer builds the notification body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// HTML table of changed rows
    #[default]
    Table,
    /// The run's own log lines
    LogDigest,
}

/// A rendered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Facts about the run shown around the change list
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub database: &'a str,
    pub subject: Option<&'a str>,
    pub query: &'a str,
    /// e.g. "since 2024-05-01 08:00:00 (3.5 hours ago)", empty without history
    pub since: &'a str,
}

impl<'a> RenderContext<'a> {
    /// `[db] Subject - N changes`
    pub fn subject_line(&self, change_count: usize) -> String {
        let summary = if change_count == 1 {
            "1 change".to_string()
        } else {
            format!("{} changes", change_count)
        };

        match self.subject.map(str::trim).filter(|s| !s.is_empty()) {
            Some(subject) => format!("[{}] {} - {}", self.database, subject, summary),
            None => format!("[{}] {}", self.database, summary),
        }
    }

    fn heading(&self, subject_line: &str) -> String {
        if self.since.is_empty() {
            format!("<h3>{}</h3>", escape_html(subject_line))
        } else {
            format!(
                "<h3>{} {}</h3>",
                escape_html(subject_line),
                escape_html(self.since)
            )
        }
    }

    fn preamble(&self) -> String {
        format!(
            "<p>You are receiving this email because you subscribed to changes of the following SQL query on the <b>{}</b> database:</p>\n\
             <pre style='color: orange; margin-bottom: 16px;'>{}</pre>",
            escape_html(self.database),
            escape_html(self.query)
        )
    }
}

/// Turns a change list into a notification
pub trait ChangeRenderer {
    fn render(&self, context: &RenderContext<'_>, changes: &[ChangeRecord<'_>]) -> Notification;
}

const TABLE_STYLE: &str = "<style>
    table { font-family: arial, sans-serif; border-collapse: collapse; }
    table * { font-size: 10px; }
    td, th { border: 1px solid #dddddd; text-align: left; padding: 8px; }
    tr:nth-child(even) { background-color: #dddddd; }
</style>";

static NULL_VALUE: Value = Value::Null;

/// Shown inside a strike-through when the old value renders as nothing
const EMPTY_OLD_VALUE: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";

/// Renders changes as an HTML table, striking through replaced values
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlTableRenderer;

impl HtmlTableRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Columns of the first record; all records come from one query
    fn columns<'c>(changes: &'c [ChangeRecord<'_>]) -> Vec<&'c str> {
        changes
            .first()
            .map(|c| c.new.value.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn render_cell(record: &ChangeRecord<'_>, column: &str) -> String {
        let new_value = record.new.value.get(column).unwrap_or(&NULL_VALUE);
        let mut cell = String::from("<td>");

        if let Some(old) = record.old {
            let old_value = old.value.get(column).unwrap_or(&NULL_VALUE);
            if old_value != new_value {
                let shown = escape_html(&old_value.to_string());
                let shown = if shown.is_empty() {
                    EMPTY_OLD_VALUE.to_string()
                } else {
                    shown
                };
                cell.push_str(&format!("<del style='color: red;'>{}</del> ", shown));
            }
        }

        cell.push_str(&escape_html(&new_value.to_string()));
        cell.push_str("</td>");
        cell
    }

    fn render_table(changes: &[ChangeRecord<'_>]) -> String {
        let columns = Self::columns(changes);
        let mut lines = vec![TABLE_STYLE.to_string(), "<table>".to_string()];

        let mut header = String::from("<tr><th>&nbsp;</th>");
        for column in &columns {
            header.push_str(&format!("<th>{}</th>", escape_html(column)));
        }
        header.push_str("</tr>");
        lines.push(header);

        for record in changes {
            let mut row = format!("<tr><th>{}</th>", record.status());
            for column in &columns {
                row.push_str(&Self::render_cell(record, column));
            }
            row.push_str("</tr>");
            lines.push(row);
        }

        lines.push("</table>".to_string());
        lines.join("\n")
    }
}

impl ChangeRenderer for HtmlTableRenderer {
    fn render(&self, context: &RenderContext<'_>, changes: &[ChangeRecord<'_>]) -> Notification {
        let subject = context.subject_line(changes.len());
        let body = format!(
            "{}\n{}\n{}",
            context.heading(&subject),
            context.preamble(),
            Self::render_table(changes)
        );
        Notification { subject, body }
    }
}

/// Mails the run's captured log instead of a table
pub struct LogDigestRenderer<'l> {
    log: &'l RunLog,
}

impl<'l> LogDigestRenderer<'l> {
    pub fn new(log: &'l RunLog) -> Self {
        Self { log }
    }
}

impl<'l> ChangeRenderer for LogDigestRenderer<'l> {
    fn render(&self, context: &RenderContext<'_>, changes: &[ChangeRecord<'_>]) -> Notification {
        let subject = context.subject_line(changes.len());
        let lines = self
            .log
            .lines()
            .iter()
            .map(|line| escape_html(line))
            .collect::<Vec<_>>()
            .join("\n");
        let body = format!(
            "{}\n{}\n<pre>{}</pre>",
            context.heading(&subject),
            context.preamble(),
            lines
        );
        Notification { subject, body }
    }
}

/// Render with the configured mode
pub fn render_notification(
    mode: RenderMode,
    context: &RenderContext<'_>,
    changes: &[ChangeRecord<'_>],
    log: &RunLog,
) -> Notification {
    match mode {
        RenderMode::Table => HtmlTableRenderer::new().render(context, changes),
        RenderMode::LogDigest => LogDigestRenderer::new(log).render(context, changes),
    }
}

/// Escape text for HTML element content and single-quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
