//! Event Publisher Implementation
//!
//! 基于 broadcast channel 的流水线事件发布

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{EventSinkPort, PipelineEvent};

/// 默认通道容量
const DEFAULT_CAPACITY: usize = 1024;

/// 事件发布器
///
/// send 从不阻塞；没有订阅者时事件直接丢弃
pub struct EventPublisher {
    channel: broadcast::Sender<PipelineEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅流水线事件
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.channel.subscribe()
    }
}

impl EventSinkPort for EventPublisher {
    fn publish(&self, event: PipelineEvent) {
        let name = event.name();
        if let Err(e) = self.channel.send(event) {
            tracing::trace!(
                event = name,
                error = %e,
                "Failed to publish event (no receivers)"
            );
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_fine() {
        let publisher = EventPublisher::new();
        publisher.publish(PipelineEvent::ChapterParsed {
            chapter: 1,
            lines: vec![0],
        });
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish(PipelineEvent::ChapterParsed {
            chapter: 1,
            lines: vec![0],
        });
        publisher.publish(PipelineEvent::ChapterParsed {
            chapter: 1,
            lines: vec![2],
        });

        assert_eq!(
            rx.recv().await.unwrap(),
            PipelineEvent::ChapterParsed {
                chapter: 1,
                lines: vec![0],
            }
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            PipelineEvent::ChapterParsed {
                chapter: 1,
                lines: vec![2],
            }
        );
    }
}
