use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::compose::Notification;
use crate::mailer::Mailer;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub success: bool,
    pub sent: usize,
    pub failed_count: usize,
    pub failures: Vec<DeliveryFailure>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeliveryFailure {
    /// Position of the notification in the batch.
    pub index: usize,
    pub reason: String,
}

/// Sends every notification concurrently. A failed recipient is recorded and
/// does not affect the others; nothing is retried.
pub async fn deliver_all(mailer: &dyn Mailer, notifications: &[Notification]) -> DeliveryReport {
    let results = join_all(notifications.iter().map(|n| mailer.send(n))).await;

    let mut sent = 0;
    let mut failures = Vec::new();
    for (index, (result, notification)) in results.into_iter().zip(notifications).enumerate() {
        match result {
            Ok(()) => {
                sent += 1;
                debug!(index, to = %notification.to, "notification sent");
            }
            Err(err) => {
                warn!(index, to = %notification.to, error = %err, "notification failed");
                failures.push(DeliveryFailure {
                    index,
                    reason: err.to_string(),
                });
            }
        }
    }

    if !failures.is_empty() {
        error!(failed = failures.len(), sent, "some notifications failed to send");
    }

    DeliveryReport {
        success: failures.is_empty(),
        sent,
        failed_count: failures.len(),
        failures,
    }
}
