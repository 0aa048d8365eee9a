//! In-memory writable stage.

use std::sync::{Arc, Mutex};

use flowpipe::{Chunk, EventHub, LifecycleEvent, Stage, StageKind};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

use crate::error::AdapterError;

/// A writable stage that appends every chunk to an in-memory buffer.
///
/// Claiming the input port starts a drain task. `Finish` is emitted once
/// the upstream sender is dropped and every pending chunk has been
/// appended, so a resolved pipeline guarantees [`contents`] is complete.
///
/// [`contents`]: BufferWriter::contents
pub struct BufferWriter {
    name: String,
    buffer: Arc<Mutex<Vec<u8>>>,
    port: Mutex<Option<flume::Sender<Chunk>>>,
    input: Mutex<Option<flume::Receiver<Chunk>>>,
    hub: EventHub,
}

impl BufferWriter {
    /// Creates an empty writer.
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            name: name.into(),
            buffer: Arc::new(Mutex::new(Vec::new())),
            port: Mutex::new(Some(tx)),
            input: Mutex::new(Some(rx)),
            hub: EventHub::new(),
        }
    }

    /// Returns a copy of everything written so far.
    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.buffer.lock().unwrap().clone()
    }
}

impl Stage for BufferWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Writable
    }

    fn subscribe(&self) -> Receiver<LifecycleEvent> {
        self.hub.subscribe()
    }

    fn link(&self, _next: Arc<dyn Stage>) {
        warn!(stage = %self.name, "write-only stage cannot be piped from");
        self.hub
            .emit_error(AdapterError::NotReadable(self.name.clone()));
    }

    fn intake(&self) -> Option<flume::Sender<Chunk>> {
        let port = self.port.lock().unwrap().take()?;
        let input = self.input.lock().unwrap().take()?;
        let buffer = Arc::clone(&self.buffer);
        let hub = self.hub.clone();
        let name = self.name.clone();
        tokio::spawn(async move {
            while let Ok(chunk) = input.recv_async().await {
                buffer.lock().unwrap().extend_from_slice(&chunk);
            }
            debug!(stage = %name, "input closed, buffer flushed");
            hub.emit(LifecycleEvent::Finish);
        });
        Some(port)
    }
}
