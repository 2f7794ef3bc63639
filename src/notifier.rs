//! Report delivery.
//!
//! A [`ReportMessage`] carries the subject, body and attachment paths of a
//! daily report. [`SmtpNotifier`] mails it as a multipart message;
//! [`WebhookNotifier`] and [`OutboxNotifier`] turn it into a JSON envelope
//! with base64-encoded attachments.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::NaiveDate;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::SmtpSettings;
use crate::error::{AnalyticsError, Result};
use crate::report::write_atomic;

const BODY: &str = "\
Hello,

Please find attached the daily bakery sales report.

Key highlights:
- Revenue and profit analysis
- Top performing products and cities
- Detailed transaction data

Best regards,
Bakery Analytics System
";

// ---------------------------------------------------------------------------
// ReportMessage
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ReportMessage {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

impl ReportMessage {
    /// The standard daily report message.
    pub fn daily(date: NaiveDate, from: &str, to: &str, attachments: Vec<PathBuf>) -> Self {
        Self {
            subject: format!("Daily Bakery Sales Report - {}", date.format("%Y-%m-%d")),
            from: from.to_string(),
            to: to.to_string(),
            body: BODY.to_string(),
            attachments,
        }
    }

    /// Build the wire envelope, reading each attachment from disk.
    ///
    /// Attachments that no longer exist are skipped with a warning.
    pub fn envelope(&self) -> Result<Envelope> {
        let mut attachments = Vec::with_capacity(self.attachments.len());
        for path in &self.attachments {
            if !path.exists() {
                log::warn!("Attachment {} is missing; skipping", path.display());
                continue;
            }
            let bytes = fs::read(path)?;
            attachments.push(Attachment {
                filename: file_name(path),
                content_type: content_type(path).to_string(),
                content_base64: BASE64.encode(bytes),
            });
        }
        Ok(Envelope {
            subject: self.subject.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            body: self.body.clone(),
            attachments,
        })
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("attachment")
        .to_string()
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content_base64: String,
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

pub trait Notifier {
    fn name(&self) -> &str;

    fn send(&self, message: &ReportMessage) -> Result<()>;
}

/// Mails the report through an SMTP relay with STARTTLS and login.
pub struct SmtpNotifier {
    settings: SmtpSettings,
    timeout: Duration,
}

impl SmtpNotifier {
    pub fn new(settings: SmtpSettings, timeout: Duration) -> Self {
        Self { settings, timeout }
    }

    /// Build the MIME message: sender is the SMTP login, recipient is the
    /// configured `to` address, attachments that no longer exist are skipped.
    pub fn email(&self, message: &ReportMessage) -> Result<Message> {
        let from: Mailbox = self.settings.user.parse()?;
        let to: Mailbox = self.settings.to.parse()?;

        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));
        for path in &message.attachments {
            if !path.exists() {
                log::warn!("Attachment {} is missing; skipping", path.display());
                continue;
            }
            let mime = ContentType::parse(content_type(path))
                .map_err(|e| AnalyticsError::InvalidArgument(e.to_string()))?;
            parts = parts.singlepart(MailAttachment::new(file_name(path)).body(fs::read(path)?, mime));
        }

        Ok(Message::builder()
            .from(from)
            .to(to)
            .subject(message.subject.clone())
            .date_now()
            .multipart(parts)?)
    }

    fn transport(&self) -> Result<SmtpTransport> {
        Ok(SmtpTransport::starttls_relay(&self.settings.server)?
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.user.clone(),
                self.settings.password.clone(),
            ))
            .timeout(Some(self.timeout))
            .build())
    }
}

impl Notifier for SmtpNotifier {
    fn name(&self) -> &str {
        "email"
    }

    fn send(&self, message: &ReportMessage) -> Result<()> {
        let email = self.email(message)?;
        self.transport()?.send(&email)?;
        log::info!("Report '{}' emailed to {}", message.subject, self.settings.to);
        Ok(())
    }
}

/// POSTs the envelope as JSON to an HTTP endpoint (mail relay, chat hook).
pub struct WebhookNotifier {
    url: String,
    timeout: Duration,
    client: Option<Client>,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.to_string(),
            timeout,
            client: None,
        }
    }

    fn client(&self) -> Result<Client> {
        if let Some(client) = &self.client {
            return Ok(client.clone());
        }
        Ok(Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?)
    }

    /// Build the HTTP client up front instead of on first send.
    pub fn connect(mut self) -> Result<Self> {
        self.client = Some(self.client()?);
        Ok(self)
    }
}

impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    fn send(&self, message: &ReportMessage) -> Result<()> {
        let envelope = message.envelope()?;
        self.client()?
            .post(&self.url)
            .json(&envelope)
            .send()?
            .error_for_status()?;
        log::info!("Report '{}' delivered to {}", message.subject, self.url);
        Ok(())
    }
}

/// Writes each envelope as a JSON file into a directory, for setups without
/// a transport or for later pickup by another process.
pub struct OutboxNotifier {
    dir: PathBuf,
}

impl OutboxNotifier {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Notifier for OutboxNotifier {
    fn name(&self) -> &str {
        "outbox"
    }

    fn send(&self, message: &ReportMessage) -> Result<()> {
        let envelope = message.envelope()?;
        let stem: String = message
            .subject
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let path = self.dir.join(format!("{}.json", stem));
        write_atomic(&path, &serde_json::to_vec_pretty(&envelope)?)?;
        log::info!("Report '{}' written to {}", message.subject, path.display());
        Ok(())
    }
}
