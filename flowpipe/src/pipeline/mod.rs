pub mod linker;
mod tracker;

use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, instrument};

use self::linker::{flatten, link_chain, ChainItem};
use crate::error::PipelineError;
use crate::stage::Stage;

/// Links `chain` in order and waits for every stage to complete.
///
/// The chain is flattened depth-first, each adjacent pair is linked left
/// to right, and one completion tracker is installed per stage. The
/// returned future fulfills with the stages in their original encounter
/// order once all of them have completed, or rejects with the first
/// failure any stage reports; signals arriving after that are ignored.
/// When two stages fail within the same scheduler tick, the tie resolves
/// to the stage that comes earlier in the chain.
///
/// Trackers subscribe to their stages before any linking happens, so a
/// stage that completes the moment data starts flowing cannot be missed.
///
/// Fewer than two effective stages is a caller error and rejects with
/// [`PipelineError::TooFewStages`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use flowpipe::{pipe, ChainItem, Chunk, EventHub, LifecycleEvent, Stage, StageKind};
/// use tokio::sync::broadcast::Receiver;
///
/// // A reader that announces `End` as soon as it is linked.
/// struct Ping {
///     hub: EventHub,
/// }
///
/// impl Stage for Ping {
///     fn name(&self) -> &str {
///         "ping"
///     }
///     fn kind(&self) -> StageKind {
///         StageKind::Readable
///     }
///     fn subscribe(&self) -> Receiver<LifecycleEvent> {
///         self.hub.subscribe()
///     }
///     fn link(&self, next: Arc<dyn Stage>) {
///         let _port = next.intake();
///         self.hub.emit(LifecycleEvent::End);
///     }
///     fn intake(&self) -> Option<flume::Sender<Chunk>> {
///         None
///     }
/// }
///
/// // A sink that completes out of band, like a console channel.
/// struct Quiet {
///     hub: EventHub,
/// }
///
/// impl Stage for Quiet {
///     fn name(&self) -> &str {
///         "quiet"
///     }
///     fn kind(&self) -> StageKind {
///         StageKind::Writable
///     }
///     fn subscribe(&self) -> Receiver<LifecycleEvent> {
///         self.hub.subscribe()
///     }
///     fn link(&self, _next: Arc<dyn Stage>) {}
///     fn intake(&self) -> Option<flume::Sender<Chunk>> {
///         None
///     }
///     fn is_terminal_sink(&self) -> bool {
///         true
///     }
/// }
///
/// tokio_test::block_on(async {
///     let chain = vec![
///         ChainItem::stage(Ping { hub: EventHub::new() }),
///         ChainItem::stage(Quiet { hub: EventHub::new() }),
///     ];
///     let stages = pipe(chain).await.unwrap();
///     assert_eq!(stages.len(), 2);
/// });
/// ```
#[instrument(skip_all)]
pub async fn pipe(
    chain: impl IntoIterator<Item = ChainItem>,
) -> Result<Vec<Arc<dyn Stage>>, PipelineError> {
    let stages = flatten(chain);
    if stages.len() < 2 {
        return Err(PipelineError::TooFewStages(stages.len()));
    }

    let trackers: Vec<_> = stages
        .iter()
        .map(|stage| tracker::settle(Arc::clone(stage)))
        .collect();
    link_chain(&stages);
    debug!(stages = stages.len(), "pipeline linked, waiting for completion");

    let settled = try_join_all(trackers).await?;
    Ok(settled)
}

/// Waits for every stage to complete without linking anything.
///
/// For callers that have already wired their stages together and only want
/// the completion future. Subscriptions are opened synchronously, when
/// this function is called rather than when the returned future is first
/// polled, so the future can be obtained before wiring starts and no
/// completion can slip past it. Any number of stages is accepted; an
/// empty sequence resolves immediately.
pub fn just_promise(
    stages: impl IntoIterator<Item = Arc<dyn Stage>>,
) -> impl Future<Output = Result<Vec<Arc<dyn Stage>>, PipelineError>> {
    let stages: Vec<_> = stages.into_iter().collect();
    let trackers: Vec<_> = stages
        .iter()
        .map(|stage| tracker::settle(Arc::clone(stage)))
        .collect();

    async move {
        let settled = try_join_all(trackers).await?;
        Ok(settled)
    }
}
