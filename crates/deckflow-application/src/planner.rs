//! Outline planner trait.
//!
//! The planner turns the accumulated conversation brief into a structured
//! outline, and revises an existing outline against user instructions. In
//! production this is backed by a language model; the workflow only
//! depends on this seam.

use async_trait::async_trait;

use deckflow_core::Result;
use deckflow_core::content::OutlineSpec;

/// Drafts and revises presentation outlines.
#[async_trait]
pub trait OutlinePlanner: Send + Sync {
    /// Drafts an outline from the brief collected so far, in arrival order.
    async fn draft(&self, brief: &[String]) -> Result<OutlineSpec>;

    /// Revises `current` according to the user's instructions.
    ///
    /// The result replaces the stored outline wholesale; sequence numbers
    /// must stay unique but items may be added, removed or reordered.
    async fn revise(&self, current: &OutlineSpec, instructions: &str) -> Result<OutlineSpec>;
}
