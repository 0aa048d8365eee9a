//! In-memory readable stage.

use std::sync::{Arc, Mutex};

use flowpipe::{Chunk, EventHub, LifecycleEvent, Stage, StageKind};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

use crate::error::AdapterError;

/// A readable stage that replays a fixed set of in-memory chunks.
///
/// Linking spawns a background task that forwards the chunks into the
/// downstream stage's input port in order, then emits `End` once the last
/// chunk has been accepted. If the downstream stage disappears mid-stream
/// the reader stops quietly; whatever killed the downstream stage is
/// reported by that stage's own tracker.
pub struct ChunkReader {
    name: String,
    chunks: Mutex<Vec<Chunk>>,
    hub: EventHub,
}

impl ChunkReader {
    /// Creates a reader that produces `data` as a single chunk.
    pub fn new(name: impl Into<String>, data: impl Into<Chunk>) -> Self {
        Self::from_chunks(name, vec![data.into()])
    }

    /// Creates a reader that produces the given chunks in order.
    pub fn from_chunks(name: impl Into<String>, chunks: Vec<Chunk>) -> Self {
        Self {
            name: name.into(),
            chunks: Mutex::new(chunks),
            hub: EventHub::new(),
        }
    }
}

impl Stage for ChunkReader {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Readable
    }

    fn subscribe(&self) -> Receiver<LifecycleEvent> {
        self.hub.subscribe()
    }

    fn link(&self, next: Arc<dyn Stage>) {
        let Some(port) = next.intake() else {
            self.hub
                .emit_error(AdapterError::NoIntake(next.name().to_string()));
            return;
        };
        let chunks = std::mem::take(&mut *self.chunks.lock().unwrap());
        let hub = self.hub.clone();
        let name = self.name.clone();
        tokio::spawn(async move {
            for chunk in chunks {
                if port.send_async(chunk).await.is_err() {
                    warn!(stage = %name, "downstream input closed before all chunks were sent");
                    return;
                }
            }
            debug!(stage = %name, "all chunks delivered");
            hub.emit(LifecycleEvent::End);
        });
    }

    fn intake(&self) -> Option<flume::Sender<Chunk>> {
        None
    }
}
