// backupper/src/report/mailer.rs
use super::{Report, body, subject};
use crate::config::MailerConfig;
use crate::errors::{BackupError, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{Message, SmtpTransport, Transport};

const DEFAULT_ADDRESS: &str = "smtp.gmail.com";
const DEFAULT_PORT: u16 = 587;

/// Best-effort report delivery. Skipped entirely when the report is empty or
/// the mailer section lacks from/to/password; a rejected send is logged and
/// swallowed so the backup run still counts as complete.
pub fn deliver(report: &Report, mailer: &MailerConfig) {
    if report.is_empty() || !mailer.is_complete() {
        return;
    }
    if let Err(e) = send(report, mailer) {
        eprintln!("❌ Failed to send report email: {}", e);
    }
}

fn send(report: &Report, mailer: &MailerConfig) -> Result<()> {
    // is_complete() guarantees these three.
    let from = mailer.from.as_deref().unwrap_or_default();
    let to = mailer.to.as_deref().unwrap_or_default();
    let password = mailer.password.as_deref().unwrap_or_default();

    let address = mailer.address.as_deref().unwrap_or(DEFAULT_ADDRESS);
    let port = mailer.port.unwrap_or(DEFAULT_PORT);
    let mechanism = match mailer.authentication.as_deref().unwrap_or("plain") {
        "login" => Mechanism::Login,
        _ => Mechanism::Plain,
    };

    let message = Message::builder()
        .from(parse_mailbox(from)?)
        .to(parse_mailbox(to)?)
        .subject(subject(report))
        .body(body(report))
        .map_err(|e| BackupError::Delivery(e.to_string()))?;

    let transport = SmtpTransport::starttls_relay(address)
        .map_err(|e| BackupError::Delivery(e.to_string()))?
        .port(port)
        .credentials(Credentials::new(from.to_string(), password.to_string()))
        .authentication(vec![mechanism])
        .build();

    transport
        .send(&message)
        .map_err(|e| BackupError::Delivery(e.to_string()))?;
    Ok(())
}

fn parse_mailbox(addr: &str) -> Result<Mailbox> {
    addr.parse()
        .map_err(|e| BackupError::Delivery(format!("invalid address '{}': {}", addr, e)))
}
