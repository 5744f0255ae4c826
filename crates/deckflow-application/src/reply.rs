//! Replies returned to the transport after handling a frame.

use serde::Serialize;

use deckflow_core::content::{ContentManifest, OutlineSpec};
use deckflow_core::session::Stage;

/// Conversational prompts the transport renders to the user.
///
/// The engine decides *what* to ask; the wording belongs to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Ask for audience, tone and scope.
    AskClarifications,
    /// Present the proposed approach for acceptance.
    ProposePlan,
}

/// What the engine produced for one inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionReply {
    /// The frame was machine chatter or an unknown token; nothing ran.
    Ignored,
    /// The intent had no transition from the current stage.
    NoOp { stage: Stage },
    /// A conversational prompt to show the user.
    Prompt { stage: Stage, kind: PromptKind },
    /// The current outline. `reused` is true when a duplicate request was
    /// answered from the stored artifact.
    Outline {
        stage: Stage,
        outline: OutlineSpec,
        reused: bool,
    },
    /// The generation manifest, possibly with per-item failure markers.
    Manifest {
        stage: Stage,
        manifest: ContentManifest,
        reused: bool,
    },
}

impl SessionReply {
    /// Whether this reply came from stored state rather than fresh work.
    pub fn is_reused(&self) -> bool {
        matches!(
            self,
            SessionReply::Outline { reused: true, .. } | SessionReply::Manifest { reused: true, .. }
        )
    }
}
