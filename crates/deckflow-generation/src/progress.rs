//! Progress events for streaming generation status to clients.
//!
//! The orchestrator reports through the [`ProgressSink`] trait so transports
//! can forward events however they like (push channel, SSE, log line)
//! without the orchestrator knowing or waiting.

use serde::Serialize;
use tokio::sync::mpsc;

use deckflow_core::content::GenerationStatus;

/// A progress event emitted while a generation batch runs.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// One item finished, successfully or not. Emitted in completion
    /// order, which under concurrency is not outline order.
    ItemCompleted {
        sequence_number: u32,
        status: GenerationStatus,
        /// Human-readable stage description for client display.
        message: String,
    },
    /// The whole batch finished; always the final event of a run.
    BatchCompleted {
        succeeded: usize,
        failed: usize,
        total: usize,
    },
}

/// Receives progress events from a running batch.
///
/// `emit` must not block and must not fail the batch: progress is
/// best-effort telemetry, never control flow.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink that forwards events into a tokio channel.
pub struct ChannelProgressSink {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    /// Create a new sink with the given channel sender
    pub fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { sender }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        // Non-blocking send - if the receiver is dropped, we just skip
        let _ = self.sender.send(event);
    }
}

/// Sink that discards every event.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: ProgressEvent) {}
}
