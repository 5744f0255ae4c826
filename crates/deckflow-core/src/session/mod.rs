//! Session domain module.
//!
//! This module contains all session-related domain models, the stage/intent
//! state machine, and the repository interface.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `StageArtifact`)
//! - `stage`: Workflow stages (`Stage`)
//! - `intent`: User intents and action-token mapping (`Intent`)
//! - `machine`: The transition table (`SessionStateMachine`)
//! - `repository`: Repository trait for session persistence
//!
//! # Usage
//!
//! ```ignore
//! use deckflow_core::session::{Session, SessionRepository, SessionStateMachine};
//! use deckflow_core::session::{Decision, Intent, Stage, StageAction};
//! ```

mod intent;
mod machine;
mod model;
mod repository;
mod stage;

// Re-export public API
pub use intent::Intent;
pub use machine::{Decision, SessionStateMachine, StageAction};
pub use model::{Session, StageArtifact};
pub use repository::SessionRepository;
pub use stage::Stage;
