//! Chunk-mapping duplex stage.

use std::sync::{Arc, Mutex};

use flowpipe::{Chunk, EventHub, Fault, LifecycleEvent, Stage, StageKind};
use tokio::sync::broadcast::Receiver;
use tracing::{debug, warn};

use crate::error::AdapterError;

/// Fallible chunk transformation applied between two stages.
pub type TransformFn = dyn Fn(Chunk) -> Result<Chunk, Fault> + Send + Sync;

/// A duplex stage that maps every chunk through a fallible function.
///
/// The first chunk the function rejects settles the stage with an `Error`
/// event carrying the reported fault, and the rest of the input is
/// discarded. On exhausted input the stage emits `End`, closes its
/// downstream port, and emits `Finish`.
pub struct MapTransform {
    name: String,
    op: Arc<TransformFn>,
    port: Mutex<Option<flume::Sender<Chunk>>>,
    input: Mutex<Option<flume::Receiver<Chunk>>>,
    hub: EventHub,
}

impl MapTransform {
    /// Creates a transform applying `op` to each chunk.
    pub fn new(
        name: impl Into<String>,
        op: impl Fn(Chunk) -> Result<Chunk, Fault> + Send + Sync + 'static,
    ) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            name: name.into(),
            op: Arc::new(op),
            port: Mutex::new(Some(tx)),
            input: Mutex::new(Some(rx)),
            hub: EventHub::new(),
        }
    }
}

impl Stage for MapTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Duplex
    }

    fn subscribe(&self) -> Receiver<LifecycleEvent> {
        self.hub.subscribe()
    }

    fn link(&self, next: Arc<dyn Stage>) {
        let Some(input) = self.input.lock().unwrap().take() else {
            self.hub
                .emit_error(AdapterError::AlreadyLinked(self.name.clone()));
            return;
        };
        let Some(port) = next.intake() else {
            self.hub
                .emit_error(AdapterError::NoIntake(next.name().to_string()));
            return;
        };
        let op = Arc::clone(&self.op);
        let hub = self.hub.clone();
        let name = self.name.clone();
        tokio::spawn(async move {
            while let Ok(chunk) = input.recv_async().await {
                match op(chunk) {
                    Ok(mapped) => {
                        if port.send_async(mapped).await.is_err() {
                            warn!(stage = %name, "downstream input closed mid-stream");
                            return;
                        }
                    }
                    Err(fault) => {
                        debug!(stage = %name, %fault, "transform rejected a chunk");
                        hub.emit(LifecycleEvent::Error(fault));
                        return;
                    }
                }
            }
            hub.emit(LifecycleEvent::End);
            drop(port);
            hub.emit(LifecycleEvent::Finish);
        });
    }

    fn intake(&self) -> Option<flume::Sender<Chunk>> {
        self.port.lock().unwrap().take()
    }
}
