//! Variant catalog loading.
//!
//! The catalog is a TOML file describing every content variant the engine
//! can classify and route to. Adding a variant is a configuration change,
//! not a code change. When no catalog exists yet, the built-in one is
//! written out so operators have a complete file to edit.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use deckflow_core::Result;
use deckflow_core::variant::{VariantDefinition, VariantRegistry};

use crate::storage::write_atomic;

/// On-disk shape of the variant catalog.
///
/// ```toml
/// fallback_variant = "bullets"
///
/// [[variant]]
/// variant_id = "bar-chart"
/// service_name = "chart"
/// endpoint = "/v1/charts/bar"
/// priority = 1
/// keywords = ["bar chart", "per category", "compare amounts", "ranking", "totals by"]
/// required_params = ["series"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegistryFile {
    fallback_variant: String,
    #[serde(rename = "variant")]
    variants: Vec<VariantDefinition>,
}

/// Loads and validates the variant catalog.
pub struct RegistryLoader;

impl RegistryLoader {
    /// Loads the catalog at `path`, or writes the built-in catalog there
    /// first if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the catalog fails validation
    /// (too few keywords, duplicate ids, unknown fallback).
    pub fn load(path: &Path) -> Result<VariantRegistry> {
        if !path.exists() {
            let registry = VariantRegistry::builtin();
            Self::write_catalog(path, &registry)?;
            tracing::info!(
                target: "registry",
                "No variant catalog at {:?}, wrote the built-in one",
                path
            );
            return Ok(registry);
        }

        let content = fs::read_to_string(path)?;
        let file: RegistryFile = toml::from_str(&content)?;
        let registry = VariantRegistry::new(file.variants, &file.fallback_variant)?;
        tracing::debug!(
            target: "registry",
            "Loaded {} variants from {:?}",
            registry.len(),
            path
        );
        Ok(registry)
    }

    fn write_catalog(path: &Path, registry: &VariantRegistry) -> Result<()> {
        let file = RegistryFile {
            fallback_variant: registry.fallback().variant_id.clone(),
            variants: registry.definitions().to_vec(),
        };
        let rendered = toml::to_string_pretty(&file)?;
        write_atomic(path, &rendered)
    }
}
