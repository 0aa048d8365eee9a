//! Error types for flowpipe-stages

use thiserror::Error;

/// Errors the adapters report through their event hubs when a pipeline is
/// wired in a way the stage cannot honor.
#[derive(Error, Debug, Clone)]
pub enum AdapterError {
    /// The downstream stage has no free input port to pipe into.
    #[error("stage '{0}' has no free input port")]
    NoIntake(String),

    /// A write-only stage was linked as if it could produce output.
    #[error("stage '{0}' is write-only and cannot be piped from")]
    NotReadable(String),

    /// The stage was linked a second time.
    #[error("stage '{0}' is already linked")]
    AlreadyLinked(String),
}
