//! Application layer for Deckflow.
//!
//! This crate coordinates the conversational deck-building workflow: frames
//! enter through [`ConversationService`], pass the message gate and the
//! session state machine, and the work each transition needs is carried out
//! against the planner, repository and generation pipelines plugged in at
//! construction.

pub mod classifier;
pub mod locks;
pub mod planner;
pub mod reply;
pub mod service;

pub use classifier::IntentClassifier;
pub use locks::SessionLocks;
pub use planner::OutlinePlanner;
pub use reply::{PromptKind, SessionReply};
pub use service::ConversationService;
