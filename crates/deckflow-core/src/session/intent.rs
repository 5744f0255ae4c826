//! User intents driving stage transitions.

use serde::{Deserialize, Serialize};

/// What the user is asking for, as seen by the state machine.
///
/// Intents come from two sources: structured action tokens (buttons in the
/// client UI) map directly via [`Intent::from_action_token`], and free-form
/// text goes through the probabilistic intent classifier. The state machine
/// does not care which path produced the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The user wants a presentation made.
    DeckRequested,
    /// The user answered the clarifying questions.
    ClarificationsProvided,
    /// The user accepted the proposed approach.
    PlanAccepted,
    /// The user asked to see the outline.
    OutlineRequested,
    /// The user asked for outline changes.
    RefinementRequested,
    /// The user accepted the outline as-is.
    OutlineAccepted,
    /// The user asked to start content generation.
    GenerationRequested,
    /// The user asked to re-run a failed generation.
    RetryRequested,
    /// The classifier could not map the input to any intent.
    Unknown,
}

/// Action tokens the client may send instead of free-form text.
///
/// Each token bypasses the intent classifier entirely. Unlisted tokens are
/// dropped by the gate, never guessed at.
const ACTION_TOKENS: &[(&str, Intent)] = &[
    ("accept-plan", Intent::PlanAccepted),
    ("request-outline", Intent::OutlineRequested),
    ("accept-outline", Intent::OutlineAccepted),
    ("start-generation", Intent::GenerationRequested),
    ("retry-generation", Intent::RetryRequested),
];

impl Intent {
    /// Resolves a structured action token to its intent, if the token is known.
    pub fn from_action_token(token: &str) -> Option<Intent> {
        ACTION_TOKENS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, intent)| *intent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::DeckRequested => "deck_requested",
            Intent::ClarificationsProvided => "clarifications_provided",
            Intent::PlanAccepted => "plan_accepted",
            Intent::OutlineRequested => "outline_requested",
            Intent::RefinementRequested => "refinement_requested",
            Intent::OutlineAccepted => "outline_accepted",
            Intent::GenerationRequested => "generation_requested",
            Intent::RetryRequested => "retry_requested",
            Intent::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
