//! Variant catalog and classification.
//!
//! # Module Structure
//!
//! - `model`: Catalog entry model (`VariantDefinition`)
//! - `registry`: Validated catalog (`VariantRegistry`) and the builtin set
//! - `classifier`: Deterministic keyword classification (`VariantClassifier`)

mod classifier;
mod model;
mod registry;

// Re-export public API
pub use classifier::{ClassificationResult, VariantClassifier};
pub use model::VariantDefinition;
pub use registry::{MIN_KEYWORDS, VariantRegistry};
