pub mod config;
pub mod content;
pub mod error;
pub mod gate;
pub mod rollout;
pub mod session;
pub mod variant;

// Re-export common error type
pub use error::{DeckflowError, Result};
