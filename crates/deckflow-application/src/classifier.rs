//! Intent classifier trait.
//!
//! Free-form user text is mapped to an [`Intent`] by a probabilistic
//! classifier (an NLU model in production, a phrase table in tests). Only
//! text reaches it: structured action tokens and control frames are
//! resolved or dropped by the gate long before this seam.

use async_trait::async_trait;

use deckflow_core::Result;
use deckflow_core::session::{Intent, Stage};

/// Maps one user utterance to an intent.
///
/// The current stage is provided as context: "yes, go ahead" means
/// something different while a plan is pending than while an outline is.
/// Implementations return [`Intent::Unknown`] for text they cannot map;
/// errors are treated the same way by the caller and never fail a turn.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify_intent(&self, stage: Stage, text: &str) -> Result<Intent>;
}
