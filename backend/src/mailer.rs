use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::compose::Notification;
use crate::config::MailSettings;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("invalid address {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("smtp error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("smtp server did not accept the connection check")]
    Unverified,
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Outbound mail. Implementations must be safe to call concurrently.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Checks the transport is reachable and accepts our credentials.
    async fn verify(&self) -> Result<(), DeliveryError>;
    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError>;
}

/// STARTTLS relay with username/password auth.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(settings: &MailSettings) -> Result<Self, DeliveryError> {
        let credentials = Credentials::new(settings.address.clone(), settings.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            .port(settings.port)
            .credentials(credentials)
            .build();
        Ok(Self { transport })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn verify(&self) -> Result<(), DeliveryError> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(DeliveryError::Unverified)
        }
    }

    async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let message = build_message(notification)?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn parse_address(raw: &str) -> Result<Address, DeliveryError> {
    raw.parse().map_err(|source| DeliveryError::Address {
        address: raw.to_string(),
        source,
    })
}

pub(crate) fn build_message(notification: &Notification) -> Result<Message, DeliveryError> {
    let from = Mailbox::new(None, parse_address(&notification.from)?);
    let to = Mailbox::new(
        Some(notification.to_name.clone()),
        parse_address(&notification.to)?,
    );

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(notification.subject.clone())
        .multipart(MultiPart::alternative_plain_html(
            notification.text.clone(),
            notification.html.clone(),
        ))?;
    Ok(message)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Keeps every notification instead of sending it.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<Notification>>,
        pub refuse: HashSet<String>,
        pub unreachable: bool,
    }

    impl RecordingMailer {
        pub fn refusing(addresses: &[&str]) -> Self {
            Self {
                refuse: addresses.iter().map(|a| a.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn unreachable() -> Self {
            Self {
                unreachable: true,
                ..Self::default()
            }
        }

        pub fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn verify(&self) -> Result<(), DeliveryError> {
            if self.unreachable {
                return Err(DeliveryError::Unverified);
            }
            Ok(())
        }

        async fn send(&self, notification: &Notification) -> Result<(), DeliveryError> {
            if self.refuse.contains(&notification.to) {
                return Err(DeliveryError::Rejected(format!(
                    "mailbox {} unavailable",
                    notification.to
                )));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }
}
