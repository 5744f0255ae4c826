//! Session domain model.
//!
//! This module contains the core Session entity that represents one
//! conversational deck-building workflow in the application's domain layer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::stage::Stage;
use crate::content::{ContentManifest, OutlineSpec};

/// An artifact produced by completing a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageArtifact {
    /// The outline produced by the planning stages.
    Outline(OutlineSpec),
    /// The manifest produced by a successful generation batch.
    Manifest(ContentManifest),
}

/// Represents one deck-building session in the application's domain layer.
///
/// A session contains:
/// - The current workflow stage
/// - The accumulated brief (substantive user messages, in arrival order)
/// - Artifacts keyed by the stage that produced them
/// - Completion flags used for idempotent replay of duplicate requests
/// - A version counter for optimistic concurrency on writes
/// - Timestamps for creation and last update
///
/// This is the "pure" domain model that business logic operates on,
/// independent of any specific storage format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// Identifier of the user who owns this session
    pub owner_id: String,
    /// Current workflow stage
    pub stage: Stage,
    /// Substantive user messages, in arrival order
    #[serde(default)]
    pub brief: Vec<String>,
    /// Artifacts keyed by producing stage
    #[serde(default)]
    pub artifacts: BTreeMap<Stage, StageArtifact>,
    /// Stages whose expensive work already ran to completion
    #[serde(default)]
    pub completed: BTreeSet<Stage>,
    /// Optimistic concurrency version, bumped by the store on every write
    #[serde(default)]
    pub version: u64,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
}

impl Session {
    /// Creates a fresh session in the greeting stage.
    pub fn new(id: impl Into<String>, owner_id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            stage: Stage::Greeting,
            brief: Vec::new(),
            artifacts: BTreeMap::new(),
            completed: BTreeSet::new(),
            version: 0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Whether the expensive work of `stage` already completed.
    pub fn is_complete(&self, stage: Stage) -> bool {
        self.completed.contains(&stage)
    }

    /// Stores `artifact` under `stage` and marks the stage complete.
    ///
    /// The two writes belong together: a completion flag without its
    /// artifact (or the reverse) would break idempotent replay, so this is
    /// the only way to record either.
    pub fn record_artifact(&mut self, stage: Stage, artifact: StageArtifact) {
        self.artifacts.insert(stage, artifact);
        self.completed.insert(stage);
    }

    pub fn artifact(&self, stage: Stage) -> Option<&StageArtifact> {
        self.artifacts.get(&stage)
    }

    /// The current outline, however many refinement rounds it has been
    /// through.
    pub fn outline(&self) -> Option<&OutlineSpec> {
        match self.artifacts.get(&Stage::Outline) {
            Some(StageArtifact::Outline(outline)) => Some(outline),
            _ => None,
        }
    }

    /// The generation manifest, once the session reached the terminal stage.
    pub fn manifest(&self) -> Option<&ContentManifest> {
        match self.artifacts.get(&Stage::Generate) {
            Some(StageArtifact::Manifest(manifest)) => Some(manifest),
            _ => None,
        }
    }

    /// Appends a substantive user message to the brief.
    pub fn push_brief(&mut self, text: impl Into<String>) {
        let text = text.into();
        if !text.trim().is_empty() {
            self.brief.push(text);
        }
    }

    /// Refreshes the update timestamp. Called before every persist.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentItemSpec;

    fn outline() -> OutlineSpec {
        OutlineSpec::new("Roadmap", vec![ContentItemSpec::new(1, "Where we are")]).unwrap()
    }

    #[test]
    fn new_session_starts_in_greeting_with_version_zero() {
        let session = Session::new("s-1", "u-1");
        assert_eq!(session.stage, Stage::Greeting);
        assert_eq!(session.version, 0);
        assert!(session.brief.is_empty());
        assert!(session.artifacts.is_empty());
        assert!(!session.is_complete(Stage::Outline));
    }

    #[test]
    fn record_artifact_sets_the_completion_flag_atomically() {
        let mut session = Session::new("s-1", "u-1");
        session.record_artifact(Stage::Outline, StageArtifact::Outline(outline()));

        assert!(session.is_complete(Stage::Outline));
        assert_eq!(session.outline().unwrap().topic, "Roadmap");
        assert!(session.manifest().is_none());
    }

    #[test]
    fn push_brief_ignores_blank_messages() {
        let mut session = Session::new("s-1", "u-1");
        session.push_brief("make it about rust");
        session.push_brief("   ");
        session.push_brief("");
        assert_eq!(session.brief, vec!["make it about rust".to_string()]);
    }

    #[test]
    fn session_roundtrips_through_json() {
        let mut session = Session::new("s-1", "u-1");
        session.stage = Stage::Outline;
        session.push_brief("pitch deck for a bakery");
        session.record_artifact(Stage::Outline, StageArtifact::Outline(outline()));
        session.version = 3;

        let rendered = serde_json::to_string(&session).unwrap();
        let parsed: Session = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed, session);
    }
}
