//! Notification seam.
//!
//! Notifications are best-effort side effects: a delivery failure must
//! never roll back a state transition that already committed. Callers
//! log [`NotifyError`] at `warn!` and carry on.

use async_trait::async_trait;

/// A templated message addressed to every actor holding a capability.
#[derive(Debug, Clone)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    /// Recipients are resolved as the actors holding this capability.
    pub recipient_capability: String,
}

impl Notification {
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        recipient_capability: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipient_capability: recipient_capability.into(),
        }
    }
}

/// Delivery failure. Advisory only — never part of the atomic unit.
#[derive(Debug, thiserror::Error)]
#[error("Notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// External collaborator: delivers a [`Notification`].
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}
