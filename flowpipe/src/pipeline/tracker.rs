//! Per-stage completion tracking.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, trace};

use crate::error::StageError;
use crate::stage::events::LifecycleEvent;
use crate::stage::Stage;

/// Returns a future that settles exactly once with `stage`'s outcome.
///
/// The subscription is opened synchronously, before the returned future is
/// first polled, so the caller can link stages afterwards without racing a
/// fast completion. Terminal sinks are never subscribed to at all.
///
/// Settlement drops the subscription, so redundant emissions after the
/// first terminal event are absorbed without re-settling or leaking.
pub(crate) fn settle(
    stage: Arc<dyn Stage>,
) -> impl Future<Output = Result<Arc<dyn Stage>, StageError>> {
    let events = if stage.is_terminal_sink() {
        debug!(stage = stage.name(), "terminal sink, treated as completed");
        None
    } else {
        Some(stage.subscribe())
    };

    async move {
        let Some(mut events) = events else {
            return Ok(stage);
        };
        let kind = stage.kind();
        loop {
            match events.recv().await {
                Ok(LifecycleEvent::Error(fault)) => {
                    debug!(stage = stage.name(), %fault, "stage reported an error");
                    return Err(StageError::new(stage, fault));
                }
                Ok(event) if kind.observes(&event) => {
                    trace!(stage = stage.name(), ?event, "stage completed");
                    return Ok(stage);
                }
                Ok(event) => {
                    trace!(stage = stage.name(), ?event, "event outside watch set, skipped");
                }
                // The stage dropped its event hub: the underlying resource
                // is gone and nothing further can be reported.
                Err(RecvError::Closed) => return Ok(stage),
                Err(RecvError::Lagged(_)) => {}
            }
        }
    }
}
