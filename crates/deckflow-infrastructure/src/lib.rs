//! Infrastructure layer for Deckflow.
//!
//! File-backed and in-memory implementations of the storage seams the
//! engine defines: session repositories, the variant catalog loader and
//! the engine configuration service.

pub mod config_service;
pub mod json_session_repository;
pub mod memory_repository;
pub mod registry_loader;
pub mod storage;

pub use crate::config_service::EngineConfigService;
pub use crate::json_session_repository::JsonSessionRepository;
pub use crate::memory_repository::MemorySessionRepository;
pub use crate::registry_loader::RegistryLoader;
