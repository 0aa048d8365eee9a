use std::error::Error;
use std::sync::Arc;

use tokio::sync::broadcast;

/// A stage's native error, carried by an [`LifecycleEvent::Error`] event.
pub type Fault = Arc<dyn Error + Send + Sync>;

/// Lifecycle signals a stage may emit while a pipeline runs.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// The stage failed. Some stages emit this more than once; only the
    /// first emission settles the stage's tracker.
    Error(Fault),
    /// No more data will be provided.
    End,
    /// The underlying resource has been released. Not all stages emit this.
    Close,
    /// All data has been flushed to the underlying system.
    Finish,
}

const EVENT_CAPACITY: usize = 64;

/// Broadcast hub for one stage's lifecycle events.
///
/// Emissions with no live subscribers are dropped silently, so a stage can
/// keep signalling after every tracker has settled and moved on.
///
/// The hub buffers up to 64 events per subscriber; a subscriber that falls
/// further behind loses the oldest emissions. Lifecycle stages emit a
/// handful of events over their whole life, so the budget only matters for
/// stages that signal far outside that contract.
#[derive(Debug, Clone)]
pub struct EventHub {
    sender: broadcast::Sender<LifecycleEvent>,
}

impl EventHub {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Opens a new subscription. Only events emitted afterwards are seen.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.sender.subscribe()
    }

    /// Emits `event` to every current subscriber.
    pub fn emit(&self, event: LifecycleEvent) {
        let _ = self.sender.send(event);
    }

    /// Emits an `Error` event carrying `fault`.
    pub fn emit_error(&self, fault: impl Error + Send + Sync + 'static) {
        self.emit(LifecycleEvent::Error(Arc::new(fault)));
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
