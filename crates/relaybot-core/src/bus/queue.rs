//! Async message bus: bounded tokio channels between channels and the router.

use super::types::{InboundMessage, OutboundMessage};
use tokio::sync::mpsc;

/// The message bus connecting channels ↔ router.
///
/// - Channels publish to `inbound` (user events arriving)
/// - The router consumes `inbound`, handles each event, publishes to `outbound`
/// - The channel manager consumes `outbound` and routes to the correct channel
pub struct MessageBus {
    inbound_tx: mpsc::Sender<InboundMessage>,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: tokio::sync::Mutex<mpsc::Receiver<OutboundMessage>>,
}

impl MessageBus {
    /// Create a new message bus with the given buffer capacity.
    pub fn new(buffer_size: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer_size);
        let (outbound_tx, outbound_rx) = mpsc::channel(buffer_size);

        MessageBus {
            inbound_tx,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            outbound_tx,
            outbound_rx: tokio::sync::Mutex::new(outbound_rx),
        }
    }

    /// Publish an event from a channel to the router (inbound).
    pub async fn publish_inbound(
        &self,
        msg: InboundMessage,
    ) -> Result<(), mpsc::error::SendError<InboundMessage>> {
        self.inbound_tx.send(msg).await
    }

    /// Consume the next inbound event (blocks until available).
    /// Returns None if all senders are dropped.
    pub async fn consume_inbound(&self) -> Option<InboundMessage> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await
    }

    /// Publish a reply from the router to a channel (outbound).
    pub async fn publish_outbound(
        &self,
        msg: OutboundMessage,
    ) -> Result<(), mpsc::error::SendError<OutboundMessage>> {
        self.outbound_tx.send(msg).await
    }

    /// Consume the next outbound message (blocks until available).
    /// Returns None if all senders are dropped.
    pub async fn consume_outbound(&self) -> Option<OutboundMessage> {
        let mut rx = self.outbound_rx.lock().await;
        rx.recv().await
    }

    /// Get a clone of the outbound sender (for router lanes to use).
    pub fn outbound_sender(&self) -> mpsc::Sender<OutboundMessage> {
        self.outbound_tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::types::{InboundKind, OutboundKind};

    #[tokio::test]
    async fn test_inbound_message_flow() {
        let bus = MessageBus::new(10);

        let msg = InboundMessage::text("telegram", "user_1", "chat_1", "Hello!");
        bus.publish_inbound(msg).await.unwrap();

        let received = bus.consume_inbound().await.unwrap();
        assert_eq!(received.channel, "telegram");
        assert_eq!(received.content, "Hello!");
        assert_eq!(received.kind, InboundKind::Text);
    }

    #[tokio::test]
    async fn test_outbound_message_flow() {
        let bus = MessageBus::new(10);

        bus.publish_outbound(OutboundMessage::typing("telegram", "chat_42"))
            .await
            .unwrap();

        let received = bus.consume_outbound().await.unwrap();
        assert_eq!(received.chat_id, "chat_42");
        assert_eq!(received.kind, OutboundKind::Typing);
    }

    #[tokio::test]
    async fn test_message_ordering() {
        let bus = MessageBus::new(10);

        for i in 1..=3 {
            let msg = InboundMessage::text("cli", "local", "local", format!("msg-{}", i));
            bus.publish_inbound(msg).await.unwrap();
        }

        let m1 = bus.consume_inbound().await.unwrap();
        let m2 = bus.consume_inbound().await.unwrap();
        let m3 = bus.consume_inbound().await.unwrap();

        assert_eq!(m1.content, "msg-1");
        assert_eq!(m2.content, "msg-2");
        assert_eq!(m3.content, "msg-3");
    }

    #[tokio::test]
    async fn test_sender_clone_works() {
        let bus = MessageBus::new(10);
        let sender = bus.outbound_sender();

        sender
            .send(OutboundMessage::new("cli", "local", "From clone"))
            .await
            .unwrap();

        let received = bus.consume_outbound().await.unwrap();
        assert_eq!(received.content, "From clone");
    }

    #[tokio::test]
    async fn test_dropping_cloned_sender_keeps_bus_open() {
        let bus = MessageBus::new(1);
        let sender = bus.outbound_sender();
        drop(sender);
        bus.publish_outbound(OutboundMessage::new("cli", "local", "x"))
            .await
            .unwrap();
        assert!(bus.consume_outbound().await.is_some());
    }
}
