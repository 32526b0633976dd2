//! Outgoing mail.
//!
//! With an SMTP relay configured, mail goes out through lettre's async
//! STARTTLS transport. Otherwise it is queued in `<data_dir>/outbox.json`
//! for an external relay to pick up:
//! ```json
//! {
//!   "messages": [
//!     {
//!       "id": "mail-<hex12>",
//!       "to": ["john@example.com"],
//!       "subject": "...",
//!       "body": "...",
//!       "timestamp": "2026-01-01 12:00:00",
//!       "status": "pending"
//!     }
//!   ]
//! }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::store::{load_json, now_timestamp, save_json};
use crate::classifier::{spoken_number, tokenize};
use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

pub type SendFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;

/// Delivers one message and returns its id.
pub trait MailTransport: Send + Sync {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> SendFuture<'a>;
    fn name(&self) -> &'static str;
}

fn new_mail_id() -> String {
    format!("mail-{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboxData {
    #[serde(default)]
    pub messages: Vec<OutboxEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEntry {
    pub id: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub timestamp: String,
    pub status: String,
}

pub struct OutboxTransport {
    path: PathBuf,
    lock: Mutex<()>,
}

impl OutboxTransport {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("outbox.json"),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, mail: &OutgoingMail) -> anyhow::Result<String> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("Outbox lock poisoned"))?;
        let mut data: OutboxData = load_json(&self.path);
        let id = new_mail_id();
        data.messages.push(OutboxEntry {
            id: id.clone(),
            to: mail.to.clone(),
            subject: mail.subject.clone(),
            body: mail.body.clone(),
            timestamp: now_timestamp(),
            status: "pending".to_string(),
        });
        save_json(&self.path, &data)?;
        info!(id = %id, recipients = mail.to.len(), "Mail queued in outbox");
        Ok(id)
    }
}

impl MailTransport for OutboxTransport {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> SendFuture<'a> {
        Box::pin(async move { self.append(mail) })
    }

    fn name(&self) -> &'static str {
        "outbox"
    }
}

// ---------------------------------------------------------------------------
// SMTP
// ---------------------------------------------------------------------------

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let (Some(host), Some(username), Some(password)) = (
            config.smtp_host.as_deref(),
            config.username.as_deref(),
            config.password.as_deref(),
        ) else {
            anyhow::bail!("SMTP needs smtpHost, username and password");
        };
        let from_email = config.from_email.as_deref().unwrap_or(username);
        let from: Mailbox = format!("{} <{}>", config.from_name, from_email)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid from address: {}", e))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| anyhow::anyhow!("Failed to create SMTP transport: {}", e))?
            .port(config.smtp_port)
            .credentials(Credentials::new(username.to_string(), password.to_string()))
            .build();
        info!(host, port = config.smtp_port, "SMTP mailer configured");
        Ok(Self { transport, from })
    }

    fn build(&self, mail: &OutgoingMail) -> anyhow::Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for to in &mail.to {
            let mailbox: Mailbox = to
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid recipient {}: {}", to, e))?;
            builder = builder.to(mailbox);
        }
        builder
            .body(mail.body.clone())
            .map_err(|e| anyhow::anyhow!("Failed to build message: {}", e))
    }
}

impl MailTransport for SmtpMailer {
    fn send<'a>(&'a self, mail: &'a OutgoingMail) -> SendFuture<'a> {
        Box::pin(async move {
            let message = self.build(mail)?;
            self.transport
                .send(message)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to send email: {}", e))?;
            let id = new_mail_id();
            info!(id = %id, recipients = mail.to.len(), "Mail sent over SMTP");
            Ok(id)
        })
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

/// SMTP when a relay and credentials are configured, the outbox otherwise.
pub fn create_mail_transport(config: &MailConfig, data_dir: &Path) -> Arc<dyn MailTransport> {
    if config.smtp_host.is_some() {
        match SmtpMailer::new(config) {
            Ok(mailer) => return Arc::new(mailer),
            Err(e) => tracing::warn!("SMTP unavailable, using outbox: {}", e),
        }
    }
    Arc::new(OutboxTransport::new(data_dir))
}

/// Parse a spoken delay: "30 seconds", "five minutes", "2 hours", "1:30".
/// A bare number is seconds.
pub fn parse_delay(text: &str) -> Option<Duration> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if let Some((m, s)) = compact.split_once(':') {
        if let (Ok(m), Ok(s)) = (m.parse::<u64>(), s.parse::<u64>()) {
            return Some(Duration::from_secs(m * 60 + s));
        }
    }

    let tokens = tokenize(text);
    let (i, amount) = tokens
        .iter()
        .enumerate()
        .find_map(|(i, t)| spoken_number(t).map(|n| (i, u64::from(n))))?;
    let unit = tokens.get(i + 1).map(String::as_str).unwrap_or("seconds");
    let multiplier = match unit.trim_end_matches('s') {
        "hour" | "hr" => 3600,
        "minute" | "min" => 60,
        _ => 1,
    };
    Some(Duration::from_secs(amount * multiplier))
}
