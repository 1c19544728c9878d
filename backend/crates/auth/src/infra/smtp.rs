//! SMTP Mail Notifier

use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use crate::domain::notifier::MailNotifier;
use crate::domain::value_object::email::Email;
use crate::error::{AuthError, AuthResult};

/// SMTP connection settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from_name: String,
    pub from_address: String,
}

/// Mail notifier backed by an SMTP relay over STARTTLS
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> AuthResult<Self> {
        let from: Mailbox = format!("{} <{}>", config.from_name, config.from_address)
            .parse()
            .map_err(|e| AuthError::Internal(format!("Invalid sender mailbox: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| AuthError::Internal(format!("SMTP relay setup failed: {}", e)))?
            .port(config.port)
            .credentials(Credentials::new(config.username, config.password))
            .build();

        Ok(Self { transport, from })
    }
}

impl MailNotifier for SmtpMailer {
    async fn send(&self, to: &Email, subject: &str, html_body: &str) -> AuthResult<()> {
        let to: Mailbox = to
            .as_str()
            .parse()
            .map_err(|e| AuthError::Delivery(format!("Invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AuthError::Delivery(format!("Failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AuthError::Delivery(format!("SMTP send failed: {}", e)))?;

        debug!(subject, "email dispatched");
        Ok(())
    }
}
