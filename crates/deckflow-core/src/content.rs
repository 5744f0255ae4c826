//! Content planning and generation types.
//!
//! This module contains the outline structures produced during planning,
//! the per-item generation results, and the manifest stored on the session
//! once a generation batch completes. The [`ContentGenerator`] trait is the
//! seam between the session workflow and whatever actually renders content.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{DeckflowError, Result};
use crate::rollout::PipelineRevision;
use crate::variant::ClassificationResult;

/// One planned slide (or comparable content unit) within an outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItemSpec {
    /// Position of the item within the deck. Unique within an outline.
    pub sequence_number: u32,
    /// Slide title.
    pub title: String,
    /// Key points the slide should cover.
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Free-form description of the desired content.
    #[serde(default)]
    pub description: String,
    /// Explicit visual variant, when the planner already knows it.
    /// `None` means the variant classifier decides.
    #[serde(default)]
    pub variant_id: Option<String>,
    /// Service-specific parameters forwarded verbatim to the backend,
    /// e.g. the data series for a chart.
    #[serde(default)]
    pub service_params: BTreeMap<String, serde_json::Value>,
}

impl ContentItemSpec {
    pub fn new(sequence_number: u32, title: impl Into<String>) -> Self {
        Self {
            sequence_number,
            title: title.into(),
            key_points: Vec::new(),
            description: String::new(),
            variant_id: None,
            service_params: BTreeMap::new(),
        }
    }

    /// All searchable text of the item, lowercased and joined, for keyword
    /// matching by the variant classifier.
    pub fn keyword_blob(&self) -> String {
        let mut blob = String::new();
        blob.push_str(&self.title);
        for point in &self.key_points {
            blob.push(' ');
            blob.push_str(point);
        }
        blob.push(' ');
        blob.push_str(&self.description);
        blob.to_lowercase()
    }
}

/// The structured outline a session converges on before generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineSpec {
    /// Deck-level topic, used for titles and logging.
    pub topic: String,
    /// Planned items in deck order.
    pub items: Vec<ContentItemSpec>,
}

impl OutlineSpec {
    /// Builds an outline, rejecting empty outlines and duplicate sequence
    /// numbers.
    pub fn new(topic: impl Into<String>, items: Vec<ContentItemSpec>) -> Result<Self> {
        let outline = Self {
            topic: topic.into(),
            items,
        };
        outline.validate()?;
        Ok(outline)
    }

    pub fn validate(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(DeckflowError::configuration("outline has no items"));
        }
        let mut seen = std::collections::BTreeSet::new();
        for item in &self.items {
            if !seen.insert(item.sequence_number) {
                return Err(DeckflowError::configuration(format!(
                    "duplicate sequence number {} in outline",
                    item.sequence_number
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Outcome class of a single item generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Success,
    Failed,
    /// Reserved for items deliberately not attempted, e.g. when a client
    /// cancels the remainder of a batch.
    Skipped,
}

/// Neutral content payload returned by every backend adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    /// The rendered content body, shape owned by the producing service.
    pub body: serde_json::Value,
    /// Producer metadata (renderer version, timing, cache hints).
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl GeneratedContent {
    pub fn new(body: serde_json::Value) -> Self {
        Self {
            body,
            metadata: BTreeMap::new(),
        }
    }
}

/// Failure class recorded on a failed generation result.
///
/// A flattened, storable projection of [`DeckflowError`]; the manifest must
/// stay serializable long after the originating error is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationErrorKind {
    Configuration,
    RateLimited,
    TransientNetwork,
    PermanentService,
    Internal,
}

impl From<&DeckflowError> for GenerationErrorKind {
    fn from(err: &DeckflowError) -> Self {
        match err {
            DeckflowError::Configuration(_) | DeckflowError::NotFound { .. } => {
                Self::Configuration
            }
            DeckflowError::RateLimited { .. } => Self::RateLimited,
            DeckflowError::TransientNetwork { .. } => Self::TransientNetwork,
            DeckflowError::PermanentService { .. } => Self::PermanentService,
            _ => Self::Internal,
        }
    }
}

/// Outcome of generating one content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Sequence number of the item this result belongs to.
    pub sequence_number: u32,
    pub status: GenerationStatus,
    /// Present only on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<GeneratedContent>,
    /// Present only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<GenerationErrorKind>,
    /// Human-readable failure marker for client display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Calls issued against the backend for this item, across retries.
    pub attempts: u32,
}

impl GenerationResult {
    pub fn success(sequence_number: u32, content: GeneratedContent, attempts: u32) -> Self {
        Self {
            sequence_number,
            status: GenerationStatus::Success,
            content: Some(content),
            error_kind: None,
            error_message: None,
            attempts,
        }
    }

    pub fn failed(sequence_number: u32, error: &DeckflowError, attempts: u32) -> Self {
        Self {
            sequence_number,
            status: GenerationStatus::Failed,
            content: None,
            error_kind: Some(GenerationErrorKind::from(error)),
            error_message: Some(error.to_string()),
            attempts,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == GenerationStatus::Success
    }
}

/// Everything a finished generation batch produced, stored on the session
/// as the terminal artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentManifest {
    /// Unique id of the batch run that produced this manifest (UUID format).
    pub batch_id: String,
    /// Which pipeline revision served the batch.
    pub pipeline: PipelineRevision,
    /// Per-item results in outline order, one per planned item.
    pub results: Vec<GenerationResult>,
    pub succeeded: usize,
    pub failed: usize,
    /// Timestamp when the batch completed (ISO 8601 format).
    pub completed_at: String,
}

impl ContentManifest {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// A manifest with failures is still delivered; callers use this to
    /// decide whether to show partial-failure messaging.
    pub fn is_partial(&self) -> bool {
        self.failed > 0 && self.succeeded > 0
    }
}

/// Generates content for a single planned item.
///
/// Implemented by the service router in production and by scripted fakes in
/// tests. Failures are contained: the returned [`GenerationResult`] carries
/// the failure class instead of an `Err`, so one bad item can never poison
/// a batch.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        item: &ContentItemSpec,
        classification: &ClassificationResult,
    ) -> GenerationResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_rejects_duplicate_sequence_numbers() {
        let items = vec![
            ContentItemSpec::new(1, "Opening"),
            ContentItemSpec::new(2, "Market"),
            ContentItemSpec::new(1, "Closing"),
        ];
        let err = OutlineSpec::new("Pitch", items).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn outline_rejects_empty_item_list() {
        assert!(OutlineSpec::new("Pitch", Vec::new()).is_err());
    }

    #[test]
    fn keyword_blob_lowercases_all_text_fields() {
        let mut item = ContentItemSpec::new(3, "Quarterly REVENUE");
        item.key_points = vec!["Growth Trend".to_string()];
        item.description = "Year over Year".to_string();

        let blob = item.keyword_blob();
        assert!(blob.contains("quarterly revenue"));
        assert!(blob.contains("growth trend"));
        assert!(blob.contains("year over year"));
    }

    #[test]
    fn error_kind_projection_matches_error_taxonomy() {
        let cases = [
            (
                DeckflowError::configuration("x"),
                GenerationErrorKind::Configuration,
            ),
            (
                DeckflowError::rate_limited("chart", "x", None),
                GenerationErrorKind::RateLimited,
            ),
            (
                DeckflowError::transient_network("chart", "x"),
                GenerationErrorKind::TransientNetwork,
            ),
            (
                DeckflowError::permanent_service("chart", Some(500), "x"),
                GenerationErrorKind::PermanentService,
            ),
            (DeckflowError::internal("x"), GenerationErrorKind::Internal),
        ];
        for (error, expected) in cases {
            assert_eq!(GenerationErrorKind::from(&error), expected);
        }
    }

    #[test]
    fn failed_result_keeps_kind_and_message() {
        let error = DeckflowError::rate_limited("chart", "too many requests", Some(2000));
        let result = GenerationResult::failed(7, &error, 4);
        assert_eq!(result.sequence_number, 7);
        assert_eq!(result.status, GenerationStatus::Failed);
        assert_eq!(result.error_kind, Some(GenerationErrorKind::RateLimited));
        assert!(result.error_message.as_deref().unwrap().contains("chart"));
        assert_eq!(result.attempts, 4);
        assert!(result.content.is_none());
    }
}
