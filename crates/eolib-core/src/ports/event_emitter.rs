//! Download event emitter port.
//!
//! This port is the single "dispatch to the UI" seam: the download
//! manager and its workers run on arbitrary pool threads and hand every
//! UI-visible effect to the emitter, which marshals it onto whatever the
//! host's event thread is. Nothing else in the pipeline may touch shared
//! UI state.

use tokio::sync::mpsc;

use crate::download::DownloadEvent;

/// Port for emitting download events.
///
/// Implementations handle the actual event delivery (channels, UI event
/// queues). `emit` must not block: workers call it from hot paths.
pub trait DownloadEventEmitterPort: Send + Sync {
    /// Emit a download event.
    fn emit(&self, event: DownloadEvent);

    /// Clone this emitter into a boxed trait object.
    ///
    /// This enables cloning of `Arc<dyn DownloadEventEmitterPort>` without
    /// requiring the underlying type to implement Clone.
    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort>;
}

/// A no-op download event emitter for tests and headless contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopDownloadEmitter;

impl NoopDownloadEmitter {
    /// Create a new no-op download emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DownloadEventEmitterPort for NoopDownloadEmitter {
    fn emit(&self, _event: DownloadEvent) {
        // Intentionally do nothing
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

/// Channel-backed emitter: events are queued onto an unbounded channel
/// that the host's event loop drains on its own thread.
///
/// This is the default implementation for GUI adapters; the receiver side
/// is the single writer of UI state.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<DownloadEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiver the event loop drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DownloadEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DownloadEventEmitterPort for ChannelEmitter {
    fn emit(&self, event: DownloadEvent) {
        // A closed receiver means the UI is shutting down; events are
        // droppable at that point.
        let _ = self.tx.send(event);
    }

    fn clone_box(&self) -> Box<dyn DownloadEventEmitterPort> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_noop_emitter() {
        let emitter = NoopDownloadEmitter::new();

        // Should not panic
        emitter.emit(DownloadEvent::task_started("scihub/scene-1"));
    }

    #[test]
    fn test_arc_emitter() {
        let emitter: Arc<dyn DownloadEventEmitterPort> = Arc::new(NoopDownloadEmitter::new());
        emitter.emit(DownloadEvent::task_started("scihub/scene-1"));
    }

    #[tokio::test]
    async fn test_channel_emitter_delivers_in_order() {
        let (emitter, mut rx) = ChannelEmitter::new();

        emitter.emit(DownloadEvent::task_started("scihub/a"));
        emitter.emit(DownloadEvent::task_progress("scihub/a", 50));

        match rx.recv().await.unwrap() {
            DownloadEvent::TaskStarted { product } => assert_eq!(product, "scihub/a"),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            DownloadEvent::TaskProgress { percent, .. } => assert_eq!(percent, 50),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_channel_emitter_survives_dropped_receiver() {
        let (emitter, rx) = ChannelEmitter::new();
        drop(rx);

        // Must not panic or block
        emitter.emit(DownloadEvent::task_started("scihub/scene-1"));
    }
}
