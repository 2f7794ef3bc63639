//! Runtime configuration, read from environment variables.
//!
//! Binaries call `dotenv::dotenv()` first so a local `.env` file can supply
//! any of the variables below.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::{AnalyticsError, Result};

pub const DEFAULT_TABLE: &str = "sales";
pub const DEFAULT_CSV_BACKUP_PATH: &str = "bakery_sales.csv";
pub const DEFAULT_REPORTS_DIR: &str = "reports";
pub const DEFAULT_OUTBOX_DIR: &str = "outbox";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REPORT_TIME: &str = "09:00";
pub const DEFAULT_REPORT_FROM: &str = "analytics@bakery.local";
pub const DEFAULT_REPORT_TO: &str = "owner@bakery.local";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// Columns every transaction source must provide.
pub const TRANSACTION_COLUMNS: [&str; 5] =
    ["city", "product", "units_sold", "unit_price", "cost_per_unit"];

pub fn default_store_path() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("bakery-analytics").join("bakery_sales.duckdb")
    } else {
        PathBuf::from(".bakery-analytics").join("bakery_sales.duckdb")
    }
}

/// SMTP relay used to email reports. Connections are upgraded with STARTTLS
/// and authenticated with `user`, which is also the sender address.
#[derive(Clone, PartialEq)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub to: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("to", &self.to)
            .finish()
    }
}

/// Resolved settings for the loader, the report job and the notifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub store_path: PathBuf,
    pub table: String,
    pub csv_backup_path: PathBuf,
    pub reports_dir: PathBuf,
    pub outbox_dir: PathBuf,
    pub cache_ttl: Duration,
    pub report_time: NaiveTime,
    pub webhook_url: Option<String>,
    pub smtp: Option<SmtpSettings>,
    pub report_from: String,
    pub report_to: String,
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            table: DEFAULT_TABLE.to_string(),
            csv_backup_path: PathBuf::from(DEFAULT_CSV_BACKUP_PATH),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            outbox_dir: PathBuf::from(DEFAULT_OUTBOX_DIR),
            cache_ttl: DEFAULT_CACHE_TTL,
            report_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            webhook_url: None,
            smtp: None,
            report_from: DEFAULT_REPORT_FROM.to_string(),
            report_to: DEFAULT_REPORT_TO.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// Unset or blank keys keep their defaults; malformed values are
    /// rejected with [`AnalyticsError::InvalidArgument`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut settings = Settings::default();

        if let Some(v) = get("SALES_DB_PATH") {
            settings.store_path = PathBuf::from(v);
        }
        if let Some(v) = get("SALES_TABLE") {
            validate_identifier(&v)?;
            settings.table = v;
        }
        if let Some(v) = get("CSV_BACKUP_PATH") {
            settings.csv_backup_path = PathBuf::from(v);
        }
        if let Some(v) = get("REPORTS_DIR") {
            settings.reports_dir = PathBuf::from(v);
        }
        if let Some(v) = get("OUTBOX_DIR") {
            settings.outbox_dir = PathBuf::from(v);
        }
        if let Some(v) = get("CACHE_TTL_SECS") {
            settings.cache_ttl = Duration::from_secs(parse_u64("CACHE_TTL_SECS", &v)?);
        }
        if let Some(v) = get("HTTP_TIMEOUT_SECS") {
            settings.http_timeout = Duration::from_secs(parse_u64("HTTP_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("REPORT_TIME") {
            settings.report_time = parse_report_time(&v)?;
        }
        settings.webhook_url = get("NOTIFY_WEBHOOK_URL");
        if let Some(v) = get("REPORT_FROM") {
            settings.report_from = v;
        }
        if let Some(v) = get("REPORT_TO") {
            settings.report_to = v;
        }

        if let Some(server) = get("SMTP_SERVER") {
            let port = match get("SMTP_PORT") {
                Some(v) => v.parse().map_err(|_| {
                    AnalyticsError::InvalidArgument(format!("SMTP_PORT must be a port number, got '{}'", v))
                })?,
                None => DEFAULT_SMTP_PORT,
            };
            let required = |key: &str| {
                get(key).ok_or_else(|| {
                    AnalyticsError::InvalidArgument(format!("{} is required when SMTP_SERVER is set", key))
                })
            };
            let user = required("EMAIL_USER")?;
            settings.smtp = Some(SmtpSettings {
                server,
                port,
                password: required("EMAIL_PASSWORD")?,
                to: get("TO_EMAIL").unwrap_or_else(|| settings.report_to.clone()),
                user,
            });
        }

        Ok(settings)
    }
}

/// Parse an `HH:MM` (or `HH:MM:SS`) wall-clock time.
pub fn parse_report_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| {
            AnalyticsError::InvalidArgument(format!(
                "REPORT_TIME must be HH:MM, got '{}'",
                value
            ))
        })
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AnalyticsError::InvalidArgument(format!(
            "'{}' is not a valid table name",
            name
        )))
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        AnalyticsError::InvalidArgument(format!("{} must be a whole number, got '{}'", key, value))
    })
}
