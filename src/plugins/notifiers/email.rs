use crate::config::SmtpConfig;
use crate::plugins::traits::{Notification, NotificationResult, NotifierPlugin};
use crate::utils::error::NotifyError;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{debug, warn};

/// SMTP notifier over a STARTTLS relay. With incomplete settings it stays
/// disabled and every call is a silent no-op.
pub struct EmailNotifier {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        let transport = if config.is_complete() {
            match Self::build_transport(&config) {
                Ok(transport) => Some(transport),
                Err(e) => {
                    warn!("Email notifications disabled, invalid SMTP relay {}: {}", config.host, e);
                    None
                }
            }
        } else {
            debug!("Email notifications disabled, SMTP settings incomplete");
            None
        };

        Self { config, transport }
    }

    fn build_transport(config: &SmtpConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, NotifyError> {
        let credentials = Credentials::new(
            config.sender.clone().unwrap_or_default(),
            config.password.clone().unwrap_or_default(),
        );

        Ok(AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build())
    }

    fn sender(&self) -> Result<Mailbox, NotifyError> {
        let address = self.config.sender.as_deref().unwrap_or_default();
        parse_mailbox(address)
    }

    fn build_message(&self, from: &Mailbox, recipient: &str, notification: &Notification) -> Result<Message, NotifyError> {
        Ok(Message::builder()
            .from(from.clone())
            .to(parse_mailbox(recipient)?)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.body.clone())?)
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.trim().parse::<Mailbox>().map_err(|e| NotifyError::Address {
        address: address.to_string(),
        message: e.to_string(),
    })
}

#[async_trait]
impl NotifierPlugin for EmailNotifier {
    fn name(&self) -> &str {
        "Email Notifier"
    }

    fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    async fn notify(&self, notification: &Notification) -> Result<NotificationResult, NotifyError> {
        let Some(transport) = self.transport.as_ref() else {
            return Ok(NotificationResult::skipped());
        };
        if notification.recipients.is_empty() {
            return Ok(NotificationResult::skipped());
        }

        let from = self.sender()?;
        let mut result = NotificationResult::default();

        // One message per recipient, in the order they were registered
        for recipient in &notification.recipients {
            let sent = match self.build_message(&from, recipient, notification) {
                Ok(message) => transport.send(message).await.map(|_| ()).map_err(NotifyError::from),
                Err(e) => Err(e),
            };

            match sent {
                Ok(()) => {
                    debug!("Sent '{}' to {}", notification.subject, recipient);
                    result.delivered += 1;
                }
                Err(e) => {
                    warn!("Could not email {}: {}", recipient, e);
                    result.failed.push((recipient.clone(), e.to_string()));
                }
            }
        }

        Ok(result)
    }
}
