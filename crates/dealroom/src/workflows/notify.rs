use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ids::PartyId;

/// Delivery channel for an outbound notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    InApp,
}

/// Payload handed to the external notification collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: PartyId,
    pub channel: NotificationChannel,
    pub template: String,
    pub details: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(recipient: PartyId, channel: NotificationChannel, template: &str) -> Self {
        Self {
            recipient,
            channel,
            template: template.to_string(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl ToString) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }
}

/// Outbound notification port (e-mail, push, in-app inbox).
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Deliver after the core write has committed. Failures are logged and swallowed.
pub(crate) fn dispatch<N>(notifier: &N, notification: Notification)
where
    N: Notifier + ?Sized,
{
    let template = notification.template.clone();
    let recipient = notification.recipient.clone();
    if let Err(err) = notifier.notify(notification) {
        warn!(%template, %recipient, error = %err, "notification delivery failed");
    }
}
