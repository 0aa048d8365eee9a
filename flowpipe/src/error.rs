//! Error types surfaced by the pipeline entry points.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::stage::events::Fault;
use crate::stage::Stage;

/// Normalized failure for one stage: who failed and what it reported.
///
/// `message` is a best-effort description taken from the underlying fault;
/// `original_error` is the unmodified error the stage emitted, so callers
/// can distinguish failure origin within a multi-stage pipeline.
pub struct StageError {
    message: String,
    stage: Arc<dyn Stage>,
    original: Fault,
}

impl StageError {
    pub(crate) fn new(stage: Arc<dyn Stage>, original: Fault) -> Self {
        Self {
            message: original.to_string(),
            stage,
            original,
        }
    }

    /// Best-effort description of the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The stage that reported the failure.
    #[must_use]
    pub fn stage(&self) -> &Arc<dyn Stage> {
        &self.stage
    }

    /// The unmodified error the stage emitted.
    #[must_use]
    pub fn original_error(&self) -> &Fault {
        &self.original
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "stage '{}' failed: {}", self.stage.name(), self.message)
    }
}

impl fmt::Debug for StageError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StageError")
            .field("stage", &self.stage.name())
            .field("message", &self.message)
            .field("original", &self.original)
            .finish()
    }
}

impl Error for StageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.original.as_ref())
    }
}

/// Errors surfaced by [`pipe`](crate::pipe) and
/// [`just_promise`](crate::just_promise).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A meaningful pipeline links at least two stages.
    #[error("a pipeline needs at least two stages, got {0}")]
    TooFewStages(usize),

    /// A stage reported a failure.
    #[error(transparent)]
    Stage(#[from] StageError),
}
