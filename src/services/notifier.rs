use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);
/// Path the central application exposes for payment confirmations (the
/// spelling is part of its contract).
const NOTIFY_PATH: &str = "/telar/server/weebhook/payments";

/// Terminal-state summary posted to the central business system.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentNotification {
    pub gateway_code: String,
    pub transaction_id: Uuid,
    pub cart_id: Uuid,
    pub status: String,
}

/// Fire-and-forget outbound notifier. Runs on a detached task with its own
/// timeout so it can never block or fail a webhook response.
#[derive(Clone)]
pub struct Notifier {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl Notifier {
    pub fn new(central_app_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(NOTIFY_TIMEOUT)
                .build()
                .unwrap_or_default(),
            endpoint: central_app_url
                .map(|url| format!("{}{}", url.trim_end_matches('/'), NOTIFY_PATH)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Post the notification in the background. No retries; a failure or a
    /// >= 400 response is logged as a warning and dropped.
    pub fn notify_detached(&self, notification: PaymentNotification) {
        let Some(endpoint) = self.endpoint.clone() else {
            debug!(
                transaction_id = %notification.transaction_id,
                "central app url not configured, skipping notification"
            );
            return;
        };
        let client = self.client.clone();

        tokio::spawn(async move {
            match client.post(&endpoint).json(&notification).send().await {
                Ok(response) if response.status().as_u16() >= 400 => {
                    warn!(
                        status = response.status().as_u16(),
                        transaction_id = %notification.transaction_id,
                        "payment notification rejected"
                    );
                }
                Ok(_) => {
                    debug!(
                        transaction_id = %notification.transaction_id,
                        status = %notification.status,
                        "payment notification delivered"
                    );
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        transaction_id = %notification.transaction_id,
                        "payment notification failed"
                    );
                }
            }
        });
    }
}
