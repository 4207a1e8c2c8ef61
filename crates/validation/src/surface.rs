//! Presentation and event surfaces the engine reports to.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tutorkit_core::TutorialEvent;

/// Overlay that shows step messages.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Show a validation error.
    async fn show_error(&self, message: &str) -> anyhow::Result<()>;

    /// Show a step timeout message.
    async fn show_timeout(&self, message: &str) -> anyhow::Result<()>;
}

/// Host event bus.
pub trait EventSink: Send + Sync {
    /// Emit one event.
    fn emit(&self, event: TutorialEvent) -> anyhow::Result<()>;
}

/// Presenter that writes messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

#[async_trait]
impl Presenter for LogPresenter {
    async fn show_error(&self, message: &str) -> anyhow::Result<()> {
        tracing::info!("validation error: {}", message);
        Ok(())
    }

    async fn show_timeout(&self, message: &str) -> anyhow::Result<()> {
        tracing::info!("step timeout: {}", message);
        Ok(())
    }
}

/// Event sink that writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: TutorialEvent) -> anyhow::Result<()> {
        tracing::debug!(event = event.name(), tutorial = %event.tutorial_id(), "event");
        Ok(())
    }
}

/// Event sink that forwards events over a channel.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<TutorialEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver its events arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TutorialEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: TutorialEvent) -> anyhow::Result<()> {
        self.tx
            .send(event)
            .map_err(|e| anyhow::anyhow!("event receiver dropped: {}", e.0.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorkit_core::TutorialId;

    #[tokio::test]
    async fn test_channel_sink() {
        let (sink, mut rx) = ChannelEventSink::new();
        let event = TutorialEvent::TutorialStarted {
            tutorial_id: TutorialId::new("t1"),
        };
        sink.emit(event.clone()).unwrap();
        assert_eq!(rx.recv().await, Some(event.clone()));

        drop(rx);
        assert!(sink.emit(event).is_err());
    }
}
