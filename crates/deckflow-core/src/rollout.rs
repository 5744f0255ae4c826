//! Deterministic pipeline rollout selection.
//!
//! Sessions are pinned to a generation pipeline revision by hashing the
//! session id, so a session never flaps between pipelines mid-conversation
//! and no assignment state has to be stored anywhere.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Which generation pipeline a session is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineRevision {
    /// The stable, fully rolled out pipeline.
    Established,
    /// The pipeline currently being rolled out.
    New,
}

impl PipelineRevision {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineRevision::Established => "established",
            PipelineRevision::New => "new",
        }
    }
}

impl std::fmt::Display for PipelineRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash-based percentage rollout.
pub struct RolloutSelector;

impl RolloutSelector {
    /// The session's bucket in `0..100`, derived solely from its id.
    ///
    /// SHA-256 keeps the bucket stable across processes and platforms; the
    /// first eight digest bytes are folded into a `u64` before the modulo.
    pub fn bucket(session_id: &str) -> u8 {
        let digest = Sha256::digest(session_id.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(prefix) % 100) as u8
    }

    /// Picks the pipeline revision for a session at the given rollout
    /// percentage.
    ///
    /// Raising the percentage only ever moves sessions from `Established`
    /// to `New`, never the other way: a session selected at percentage `p`
    /// stays selected at every percentage above `p`.
    pub fn select(session_id: &str, percentage: u8) -> PipelineRevision {
        if Self::bucket(session_id) < percentage.min(100) {
            PipelineRevision::New
        } else {
            PipelineRevision::Established
        }
    }
}
