//! Flattening and wiring of the caller-supplied stage chain.

use std::sync::Arc;

use tracing::debug;

use crate::stage::Stage;

/// One entry in the chain handed to [`pipe`](crate::pipe): a single stage,
/// or a pre-grouped pipeline segment spliced in where it appears.
pub enum ChainItem {
    Stage(Arc<dyn Stage>),
    Group(Vec<ChainItem>),
}

impl ChainItem {
    /// Wraps a concrete stage.
    pub fn stage(stage: impl Stage + 'static) -> Self {
        Self::Stage(Arc::new(stage))
    }

    /// Wraps a pre-grouped pipeline segment.
    #[must_use]
    pub fn group(items: Vec<ChainItem>) -> Self {
        Self::Group(items)
    }
}

impl From<Arc<dyn Stage>> for ChainItem {
    fn from(stage: Arc<dyn Stage>) -> Self {
        Self::Stage(stage)
    }
}

/// Flattens nested groups into one ordered sequence, depth-first.
///
/// Encounter order is preserved: `[a, [b, c], d]` flattens to
/// `[a, b, c, d]`.
pub fn flatten(chain: impl IntoIterator<Item = ChainItem>) -> Vec<Arc<dyn Stage>> {
    let mut stages = Vec::new();
    for item in chain {
        match item {
            ChainItem::Stage(stage) => stages.push(stage),
            ChainItem::Group(items) => stages.extend(flatten(items)),
        }
    }
    stages
}

/// Links each adjacent pair left to right, exactly once per pair.
pub(crate) fn link_chain(stages: &[Arc<dyn Stage>]) {
    for pair in stages.windows(2) {
        debug!(from = pair[0].name(), to = pair[1].name(), "linking stages");
        pair[0].link(Arc::clone(&pair[1]));
    }
}
