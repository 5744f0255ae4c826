//! Content orchestrator: bounded parallel generation of an outline.
//!
//! One `run` call turns an accepted outline into a complete set of
//! per-item results. Items run concurrently up to the configured width;
//! every item produces exactly one result no matter what happens to it,
//! including a panic inside the generator.

use std::sync::Arc;

use tokio::sync::Semaphore;

use deckflow_core::content::{ContentGenerator, GenerationResult, OutlineSpec};
use deckflow_core::variant::{VariantClassifier, VariantRegistry};
use deckflow_core::DeckflowError;

use crate::progress::{NullProgressSink, ProgressEvent, ProgressSink};

/// The collected outcome of one generation batch.
#[derive(Debug, Clone)]
pub struct GenerationBatch {
    /// One result per outline item, sorted by sequence number.
    pub results: Vec<GenerationResult>,
    pub succeeded: usize,
    pub failed: usize,
}

impl GenerationBatch {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// True when the batch ran and not a single item succeeded. The caller
    /// treats this as a stage-level failure rather than a partial delivery.
    pub fn is_total_failure(&self) -> bool {
        self.succeeded == 0 && self.failed > 0
    }
}

/// Fans an outline out over the content generator with bounded concurrency.
pub struct ContentOrchestrator {
    registry: Arc<VariantRegistry>,
    generator: Arc<dyn ContentGenerator>,
    sink: Arc<dyn ProgressSink>,
    max_concurrency: usize,
}

impl ContentOrchestrator {
    pub fn new(
        registry: Arc<VariantRegistry>,
        generator: Arc<dyn ContentGenerator>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            registry,
            generator,
            sink: Arc::new(NullProgressSink),
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Attaches a progress sink for streaming per-item status.
    pub fn with_progress_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Runs the full batch for `outline`.
    ///
    /// Classification is deterministic and failures are contained inside
    /// each item's task, so the returned batch always carries exactly one
    /// result per outline item, sorted by sequence number regardless of
    /// completion order.
    pub async fn run(&self, outline: &OutlineSpec) -> GenerationBatch {
        tracing::info!(
            target: "orchestrator",
            "Starting generation batch for '{}' ({} items, width {})",
            outline.topic,
            outline.len(),
            self.max_concurrency
        );

        // Bounded concurrency: items beyond the width queue on the semaphore
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(outline.len());

        for item in &outline.items {
            let sem = semaphore.clone();
            let registry = self.registry.clone();
            let generator = self.generator.clone();
            let sink = self.sink.clone();
            let item = item.clone();

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await.unwrap();
                let classification = VariantClassifier::classify(&item, &registry);
                let result = generator.generate(&item, &classification).await;
                sink.emit(ProgressEvent::ItemCompleted {
                    sequence_number: result.sequence_number,
                    status: result.status,
                    message: describe(&result),
                });
                result
            });

            handles.push(handle);
        }

        let mut results = Vec::with_capacity(handles.len());
        for (handle, item) in handles.into_iter().zip(&outline.items) {
            match handle.await {
                Ok(result) => results.push(result),
                Err(join_error) => {
                    // A panic inside the generator must cost exactly one
                    // item, not the batch.
                    let error =
                        DeckflowError::internal(format!("generation task panicked: {join_error}"));
                    tracing::error!(
                        target: "orchestrator",
                        "Item {} lost to a panic: {}",
                        item.sequence_number,
                        join_error
                    );
                    let result = GenerationResult::failed(item.sequence_number, &error, 0);
                    self.sink.emit(ProgressEvent::ItemCompleted {
                        sequence_number: result.sequence_number,
                        status: result.status,
                        message: describe(&result),
                    });
                    results.push(result);
                }
            }
        }

        results.sort_by_key(|r| r.sequence_number);
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - succeeded;

        tracing::info!(
            target: "orchestrator",
            "Generation batch for '{}' finished: {} succeeded, {} failed",
            outline.topic,
            succeeded,
            failed
        );
        self.sink.emit(ProgressEvent::BatchCompleted {
            succeeded,
            failed,
            total: results.len(),
        });

        GenerationBatch {
            results,
            succeeded,
            failed,
        }
    }
}

fn describe(result: &GenerationResult) -> String {
    if result.is_success() {
        format!(
            "item {} rendered after {} attempt(s)",
            result.sequence_number, result.attempts
        )
    } else {
        format!(
            "item {} failed: {}",
            result.sequence_number,
            result.error_message.as_deref().unwrap_or("unknown error")
        )
    }
}
