use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the payment orchestration flows. Consumed by the
/// in-process event loop for structured audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CheckoutCreated {
        checkout_id: Uuid,
        cart_id: Uuid,
    },
    PaymentIntentCreated {
        payment_intent_id: Uuid,
        checkout_id: Uuid,
        provider_code: String,
    },
    PaymentSucceeded {
        payment_intent_id: Uuid,
        checkout_id: Uuid,
    },
    PaymentFailed {
        payment_intent_id: Uuid,
        checkout_id: Uuid,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Event dropped: {}", e);
        }
    }
}

/// Background loop draining the event channel.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::CheckoutCreated {
                checkout_id,
                cart_id,
            } => {
                info!(checkout_id = %checkout_id, cart_id = %cart_id, "checkout created");
            }
            Event::PaymentIntentCreated {
                payment_intent_id,
                checkout_id,
                provider_code,
            } => {
                info!(
                    payment_intent_id = %payment_intent_id,
                    checkout_id = %checkout_id,
                    provider = %provider_code,
                    "payment intent created"
                );
            }
            Event::PaymentSucceeded {
                payment_intent_id,
                checkout_id,
            } => {
                info!(
                    payment_intent_id = %payment_intent_id,
                    checkout_id = %checkout_id,
                    "payment succeeded"
                );
            }
            Event::PaymentFailed {
                payment_intent_id,
                checkout_id,
            } => {
                info!(
                    payment_intent_id = %payment_intent_id,
                    checkout_id = %checkout_id,
                    "payment failed"
                );
            }
        }
    }
    info!("Event channel closed, stopping event processor");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let checkout_id = Uuid::new_v4();
        let cart_id = Uuid::new_v4();
        sender
            .send(Event::CheckoutCreated {
                checkout_id,
                cart_id,
            })
            .await
            .expect("send should succeed");

        match rx.recv().await {
            Some(Event::CheckoutCreated { checkout_id: c, .. }) => assert_eq!(c, checkout_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        sender
            .send_or_log(Event::PaymentFailed {
                payment_intent_id: Uuid::new_v4(),
                checkout_id: Uuid::new_v4(),
            })
            .await;
    }
}
