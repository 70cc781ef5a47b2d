//! Channel trait: the interface every chat transport implements.
//!
//! A channel turns platform updates into `InboundMessage`s on the bus and
//! performs the transport action each `OutboundMessage` asks for:
//! send text (with an optional menu), edit a message in place, remove the
//! reply keyboard, or show a typing indicator.

use async_trait::async_trait;
use relaybot_core::bus::OutboundMessage;

/// Every chat channel implements this trait.
///
/// The `ChannelManager` holds `Arc<dyn Channel>` and orchestrates
/// start/stop/send across all enabled channels.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Unique channel name (e.g. "telegram").
    ///
    /// Must match `InboundMessage.channel` / `OutboundMessage.channel`.
    fn name(&self) -> &str;

    /// Start listening for incoming updates. Long-running; returns when
    /// `stop()` is called or the transport gives up.
    async fn start(&self) -> anyhow::Result<()>;

    /// Graceful shutdown.
    async fn stop(&self) -> anyhow::Result<()>;

    /// Perform one outbound action.
    async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybot_core::bus::{Menu, OutboundKind};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// A channel that records every outbound action.
    struct RecordingChannel {
        started: Arc<AtomicBool>,
        sent: Arc<tokio::sync::Mutex<Vec<OutboundKind>>>,
    }

    #[async_trait]
    impl Channel for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn start(&self) -> anyhow::Result<()> {
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn send(&self, msg: &OutboundMessage) -> anyhow::Result<()> {
            self.sent.lock().await.push(msg.kind.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_channel_object_safety_and_actions() {
        let started = Arc::new(AtomicBool::new(false));
        let sent = Arc::new(tokio::sync::Mutex::new(Vec::new()));
        let ch: Arc<dyn Channel> = Arc::new(RecordingChannel {
            started: started.clone(),
            sent: sent.clone(),
        });

        ch.start().await.unwrap();
        assert!(started.load(Ordering::SeqCst));

        let menu = Menu::Keyboard(vec!["DeepSeek".into()]);
        ch.send(&OutboundMessage::typing("recording", "c")).await.unwrap();
        ch.send(&OutboundMessage::with_menu("recording", "c", "Pick", menu.clone()))
            .await
            .unwrap();
        ch.send(&OutboundMessage::remove_menu("recording", "c", "Done"))
            .await
            .unwrap();

        assert_eq!(
            *sent.lock().await,
            vec![
                OutboundKind::Typing,
                OutboundKind::Text { menu: Some(menu) },
                OutboundKind::RemoveMenu,
            ]
        );
        assert_eq!(ch.name(), "recording");
    }
}
