//! Settings file loading and validation

use crate::error::{QuerywatchError, Result};
use crate::render::RenderMode;
use crate::sql::substitute_env_vars;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything one watch run needs to know
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub connection_string: String,
    pub query: String,
    pub primary_key: Vec<String>,
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
    #[serde(default)]
    pub render_mode: RenderMode,
    pub smtp: SmtpSettings,
    /// Connection string as written in the file, before `{VAR}` substitution
    #[serde(skip)]
    pub connection_template: Option<String>,
}

/// Mail delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub from_address: String,
    #[serde(default)]
    pub to_addresses: Vec<String>,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Text placed between the database tag and the change count
    #[serde(default)]
    pub subject: Option<String>,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(crate::DEFAULT_CACHE_FILE)
}

fn default_smtp_port() -> u16 {
    crate::DEFAULT_SMTP_PORT
}

impl Settings {
    /// Load settings from a JSON file.
    ///
    /// A relative `cache_path` is resolved against the settings file's
    /// directory, and `{VAR}` placeholders in the connection string and
    /// SMTP password are filled from the environment.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            QuerywatchError::config(format!(
                "Failed to read settings file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut settings: Settings = serde_json::from_str(&content).map_err(|e| {
            QuerywatchError::config(format!(
                "Failed to parse settings file '{}': {}",
                path.display(),
                e
            ))
        })?;

        if settings.cache_path.is_relative() {
            if let Some(parent) = path.parent() {
                settings.cache_path = parent.join(&settings.cache_path);
            }
        }

        let template = settings.connection_string.clone();
        settings.connection_string = substitute_env_vars(&template)?;
        settings.connection_template = Some(template);
        if let Some(password) = &settings.smtp.password {
            settings.smtp.password = Some(substitute_env_vars(password)?);
        }

        Ok(settings)
    }

    /// Load and validate in one step
    pub fn load_validated(path: &Path) -> Result<Self> {
        let settings = Self::load(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every rule and report all violations together
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();

        if self.smtp.server.trim().is_empty() {
            problems.push("SMTP server must not be empty.".to_string());
        }

        if self.smtp.port == 0 {
            problems.push("SMTP port must not be 0.".to_string());
        }

        if !is_valid_address(&self.smtp.from_address) {
            problems.push("SMTP from address must be a valid email address.".to_string());
        }

        if self.smtp.to_addresses.is_empty()
            || !self.smtp.to_addresses.iter().all(|a| is_valid_address(a))
        {
            problems.push(
                "SMTP to addresses must contain at least one address and all must be valid."
                    .to_string(),
            );
        }

        if self.smtp.username.is_some() != self.smtp.password.is_some() {
            problems.push("SMTP username and password must be given together.".to_string());
        }

        let query = self.query.trim_start().to_lowercase();
        if !(query.starts_with("select ") || query.starts_with("with ")) {
            problems.push("Query must start with 'select ' or 'with '.".to_string());
        }

        if self.primary_key.is_empty() {
            problems.push("Primary key must contain at least one column name.".to_string());
        } else if self.primary_key.iter().any(|c| c.trim().is_empty()) {
            problems.push("Primary key column names must not be blank.".to_string());
        }

        if self.connection_string.trim().len() < 8 {
            problems.push("Connection string must be a valid connection string.".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(QuerywatchError::config(problems.join(" ")))
        }
    }

    /// Connection string identifying the data source; secrets filled in from
    /// the environment are not part of it
    pub fn connection_identity(&self) -> &str {
        self.connection_template
            .as_deref()
            .unwrap_or(&self.connection_string)
    }

    /// Settings written by `querywatch init`
    pub fn sample() -> Self {
        Self {
            connection_string: "data/app.duckdb".to_string(),
            query: "select id, name, status from orders order by id".to_string(),
            primary_key: vec!["id".to_string()],
            cache_path: default_cache_path(),
            render_mode: RenderMode::Table,
            smtp: SmtpSettings {
                server: "localhost".to_string(),
                port: default_smtp_port(),
                from_address: "querywatch@example.com".to_string(),
                to_addresses: vec!["ops@example.com".to_string()],
                ssl: false,
                username: None,
                password: None,
                subject: Some("Order changes".to_string()),
            },
            connection_template: None,
        }
    }
}

fn is_valid_address(address: &str) -> bool {
    address.trim().parse::<lettre::Address>().is_ok()
}
