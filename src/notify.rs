//! Notification delivery

use crate::config::SmtpSettings;
use crate::error::{QuerywatchError, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::io::Write;

/// Delivers a rendered notification to a list of recipients
pub trait Notifier {
    fn send(&self, to: &[String], subject: &str, html_body: &str) -> Result<()>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn send(&self, to: &[String], subject: &str, html_body: &str) -> Result<()> {
        (**self).send(to, subject, html_body)
    }
}

/// Sends HTML mail over SMTP
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    settings: SmtpSettings,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings) -> Self {
        Self { settings }
    }

    fn build_message(&self, to: &[String], subject: &str, html_body: &str) -> Result<Message> {
        let from: Mailbox = self.settings.from_address.trim().parse().map_err(|e| {
            QuerywatchError::notification(format!(
                "Invalid from address '{}': {}",
                self.settings.from_address, e
            ))
        })?;

        let mut builder = Message::builder().from(from).subject(subject);
        for address in to {
            let mailbox: Mailbox = address.trim().parse().map_err(|e| {
                QuerywatchError::notification(format!("Invalid to address '{}': {}", address, e))
            })?;
            builder = builder.to(mailbox);
        }

        builder
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| QuerywatchError::notification(format!("Failed to build message: {}", e)))
    }

    fn transport(&self) -> Result<SmtpTransport> {
        let builder = if self.settings.ssl {
            SmtpTransport::starttls_relay(&self.settings.server).map_err(|e| {
                QuerywatchError::notification(format!(
                    "Failed to set up TLS for {}: {}",
                    self.settings.server, e
                ))
            })?
        } else {
            SmtpTransport::builder_dangerous(&self.settings.server)
        };

        let builder = builder.port(self.settings.port);
        let builder = match (&self.settings.username, &self.settings.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, to: &[String], subject: &str, html_body: &str) -> Result<()> {
        if to.is_empty() {
            return Err(QuerywatchError::notification("No recipients configured"));
        }

        log::info!("Sending email with subject '{}' to {}", subject, to.join(", "));

        let message = self.build_message(to, subject, html_body)?;
        self.transport()?.send(&message).map_err(|e| {
            QuerywatchError::notification(format!(
                "Error sending email to {}: {}",
                to.join(", "),
                e
            ))
        })?;

        Ok(())
    }
}

/// Writes notifications to a writer instead of sending them
pub struct WriterNotifier<W: Write> {
    writer: std::cell::RefCell<W>,
}

impl<W: Write> WriterNotifier<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: std::cell::RefCell::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl WriterNotifier<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> Notifier for WriterNotifier<W> {
    fn send(&self, to: &[String], subject: &str, html_body: &str) -> Result<()> {
        let mut writer = self.writer.borrow_mut();
        writeln!(writer, "To: {}", to.join(", "))?;
        writeln!(writer, "Subject: {}", subject)?;
        writeln!(writer)?;
        writeln!(writer, "{}", html_body)?;
        writer.flush()?;
        Ok(())
    }
}
