pub mod error;
pub mod pipeline;
pub mod stage;

// Re-export main types for easier access
pub use error::{PipelineError, StageError};
pub use pipeline::linker::{flatten, ChainItem};
pub use pipeline::{just_promise, pipe};
pub use stage::events::{EventHub, Fault, LifecycleEvent};
pub use stage::{Chunk, Stage, StageKind};
