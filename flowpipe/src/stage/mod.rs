pub mod events;

use std::sync::Arc;

use flume::Sender;
use tokio::sync::broadcast::Receiver;

use self::events::LifecycleEvent;

/// The unit of data carried between stages. The pipeline never inspects
/// chunk contents; it only coordinates the stages moving them.
pub type Chunk = Vec<u8>;

/// The direction a stage moves data in.
///
/// The capability decides which lifecycle events count as successful
/// completion: a readable stage is done once no more data will be produced
/// (`End`), a writable stage once everything handed to it has been flushed
/// (`Finish`), and a duplex stage on whichever side completes first.
/// `Close` and `Error` apply to every capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Readable,
    Writable,
    Duplex,
}

impl StageKind {
    /// Returns whether `event` is a terminal signal for a stage of this
    /// kind. `Error` is terminal for every kind.
    #[must_use]
    pub fn observes(self, event: &LifecycleEvent) -> bool {
        match event {
            LifecycleEvent::Error(_) | LifecycleEvent::Close => true,
            LifecycleEvent::End => matches!(self, Self::Readable | Self::Duplex),
            LifecycleEvent::Finish => matches!(self, Self::Writable | Self::Duplex),
        }
    }
}

/// One link in a processing pipeline.
///
/// Stages are external collaborators: the pipeline does not own their data
/// and does not drive their I/O. It wires them together, watches the
/// lifecycle events they emit, and reconciles those into a single
/// completion contract.
pub trait Stage: Send + Sync {
    /// Identity used in logs and error reports.
    fn name(&self) -> &str;

    /// The stage's data direction.
    fn kind(&self) -> StageKind;

    /// Subscribes to this stage's lifecycle events.
    ///
    /// Only events emitted after the subscription is opened are delivered.
    /// Dropping the receiver unsubscribes; a settled tracker relies on
    /// this to stop observing redundant emissions.
    fn subscribe(&self) -> Receiver<LifecycleEvent>;

    /// Directs this stage's output into `next`'s input.
    fn link(&self, next: Arc<dyn Stage>);

    /// Claims this stage's input port, if it has one.
    ///
    /// Returns `None` for readable-only stages and for stages whose port
    /// was already claimed; a port is handed out at most once.
    fn intake(&self) -> Option<Sender<Chunk>>;

    /// Whether this stage is a sink that never reliably reports
    /// termination, such as a process's standard output channel.
    ///
    /// Terminal sinks are treated as pre-completed: nothing subscribes to
    /// them and nothing ever waits on them.
    fn is_terminal_sink(&self) -> bool {
        false
    }
}
