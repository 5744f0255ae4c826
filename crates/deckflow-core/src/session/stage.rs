//! Conversation stage for the presentation workflow.

use serde::{Deserialize, Serialize};

/// The stages a session moves through, from first contact to a finished deck.
///
/// The ordering of the variants matches the forward direction of the
/// workflow; `Refine` is the only stage a session can loop in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Initial contact, no deck has been requested yet.
    Greeting,
    /// Collecting audience, tone and scope details from the user.
    Clarify,
    /// A high-level approach has been proposed and awaits acceptance.
    Plan,
    /// A structured outline exists and awaits acceptance or refinement.
    Outline,
    /// The outline is being revised against user instructions.
    Refine,
    /// Content generation ran and produced a manifest. Terminal.
    Generate,
}

impl Stage {
    /// Terminal stages accept no further forward transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Generate)
    }

    /// Whether completing this stage stores an artifact on the session.
    pub fn bears_artifact(&self) -> bool {
        matches!(self, Stage::Outline | Stage::Generate)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Greeting => "greeting",
            Stage::Clarify => "clarify",
            Stage::Plan => "plan",
            Stage::Outline => "outline",
            Stage::Refine => "refine",
            Stage::Generate => "generate",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
