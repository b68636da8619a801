//! Notification dispatch.
//!
//! Receipts and bills go out as templated emails. The engine talks to a
//! [`Notifier`] trait; production uses the SMTP implementation, tests use
//! recording or failing stand-ins. Receipt sending is best-effort: the
//! engine logs and discards failures after a successful persist.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use paygate_types::{MailerConfig, TransactionStatus};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail message: {0}")]
    InvalidMessage(String),

    #[error("SMTP transport error: {0}")]
    Transport(String),

    #[error("mailer configuration error: {0}")]
    Configuration(String),
}

/// Template plus context for an outgoing email.
#[derive(Debug, Clone)]
pub enum MailTemplate {
    /// Receipt confirming a newly registered transaction
    TransactionReceipt {
        email: String,
        store: String,
        status: TransactionStatus,
    },
    /// Bill for an open payment
    PaymentBill {
        email: String,
        bill_url: String,
        store: String,
        comment: Option<String>,
        amount: Decimal,
    },
}

impl MailTemplate {
    pub fn template_id(&self) -> &'static str {
        match self {
            MailTemplate::TransactionReceipt { .. } => "create-transaction",
            MailTemplate::PaymentBill { .. } => "send-mail-bill",
        }
    }

    fn render(&self) -> String {
        match self {
            MailTemplate::TransactionReceipt {
                email,
                store,
                status,
            } => format!(
                "Hello {},\n\nYour transaction to {} has been registered and is now {}.\n",
                email, store, status
            ),
            MailTemplate::PaymentBill {
                email,
                bill_url,
                store,
                comment,
                amount,
            } => {
                let mut body = format!(
                    "Hello {},\n\nA bill from {} for {} is ready:\n{}\n",
                    email, store, amount, bill_url
                );
                if let Some(comment) = comment {
                    body.push_str(&format!("\n{}\n", comment));
                }
                body
            }
        }
    }
}

/// A fully addressed outgoing email.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub template: MailTemplate,
}

/// Outgoing notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: MailMessage) -> Result<(), NotifyError>;
}

/// SMTP-backed notifier.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &MailerConfig) -> Result<Self, NotifyError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.relay)
            .map_err(|e| NotifyError::Configuration(e.to_string()))?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| NotifyError::Configuration(format!("invalid from address: {}", config.from)))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, mail: MailMessage) -> Result<(), NotifyError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|_| NotifyError::InvalidMessage(format!("invalid recipient: {}", mail.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(mail.template.render())
            .map_err(|e| NotifyError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Notifier that drops every message. Used when no SMTP relay is
/// configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, mail: MailMessage) -> Result<(), NotifyError> {
        debug!(
            "Mailer disabled, dropping '{}' notification to {}",
            mail.template.template_id(),
            mail.to
        );
        Ok(())
    }
}
