//! Process console sinks.

use std::sync::{Arc, Mutex};

use flowpipe::{Chunk, EventHub, LifecycleEvent, Stage, StageKind};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::Receiver;
use tracing::warn;

use crate::error::AdapterError;

/// Which process output channel a [`Console`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleTarget {
    /// The process's standard output.
    Stdout,
    /// The process's standard error.
    Stderr,
}

/// A terminal sink writing chunks to the process's standard output or
/// standard error.
///
/// Console channels never reliably report termination, so this stage
/// classifies itself as a terminal sink and the pipeline treats it as
/// pre-completed instead of waiting on events that may never come.
pub struct Console {
    name: &'static str,
    target: ConsoleTarget,
    port: Mutex<Option<flume::Sender<Chunk>>>,
    input: Mutex<Option<flume::Receiver<Chunk>>>,
    hub: EventHub,
}

impl Console {
    /// A sink for the process's standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new("stdout", ConsoleTarget::Stdout)
    }

    /// A sink for the process's standard error.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new("stderr", ConsoleTarget::Stderr)
    }

    fn new(name: &'static str, target: ConsoleTarget) -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            name,
            target,
            port: Mutex::new(Some(tx)),
            input: Mutex::new(Some(rx)),
            hub: EventHub::new(),
        }
    }
}

async fn pump<W>(mut out: W, input: flume::Receiver<Chunk>, name: &str)
where
    W: AsyncWrite + Unpin,
{
    while let Ok(chunk) = input.recv_async().await {
        if let Err(error) = out.write_all(&chunk).await {
            warn!(stage = %name, %error, "console write failed");
            return;
        }
    }
    if let Err(error) = out.flush().await {
        warn!(stage = %name, %error, "console flush failed");
    }
}

impl Stage for Console {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> StageKind {
        StageKind::Writable
    }

    fn subscribe(&self) -> Receiver<LifecycleEvent> {
        self.hub.subscribe()
    }

    fn link(&self, _next: Arc<dyn Stage>) {
        warn!(stage = %self.name, "console sink cannot be piped from");
        self.hub
            .emit_error(AdapterError::NotReadable(self.name.to_string()));
    }

    fn intake(&self) -> Option<flume::Sender<Chunk>> {
        let port = self.port.lock().unwrap().take()?;
        let input = self.input.lock().unwrap().take()?;
        let target = self.target;
        let name = self.name;
        tokio::spawn(async move {
            match target {
                ConsoleTarget::Stdout => pump(tokio::io::stdout(), input, name).await,
                ConsoleTarget::Stderr => pump(tokio::io::stderr(), input, name).await,
            }
        });
        Some(port)
    }

    fn is_terminal_sink(&self) -> bool {
        true
    }
}
