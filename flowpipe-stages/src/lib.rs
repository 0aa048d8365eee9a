//! Flowpipe Stages
//!
//! This crate provides ready-made stage implementations for moving bytes
//! through a flowpipe pipeline: in-memory readers and writers, chunk
//! transforms, and process console sinks.

#![warn(missing_docs)]

pub mod console;
pub mod error;
pub mod reader;
pub mod transform;
pub mod writer;

pub use console::Console;
pub use error::AdapterError;
pub use reader::ChunkReader;
pub use transform::MapTransform;
pub use writer::BufferWriter;
