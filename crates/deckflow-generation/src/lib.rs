//! Parallel content generation.
//!
//! # Module Structure
//!
//! - `orchestrator`: Bounded fan-out over an outline (`ContentOrchestrator`)
//! - `progress`: Progress event types and sinks (`ProgressSink`)

pub mod orchestrator;
pub mod progress;

pub use orchestrator::{ContentOrchestrator, GenerationBatch};
pub use progress::{ChannelProgressSink, NullProgressSink, ProgressEvent, ProgressSink};
