//! Variant registry: the validated catalog of renderable variants.

use std::collections::{BTreeSet, HashMap};

use super::model::VariantDefinition;
use crate::error::{DeckflowError, Result};

/// Minimum number of distinct keywords a variant must carry.
pub const MIN_KEYWORDS: usize = 5;

/// The validated, immutable variant catalog.
///
/// Definition order is preserved because the classifier breaks full ties by
/// registry insertion order. Built once at startup and shared behind an
/// `Arc`; classification never mutates it.
#[derive(Debug, Clone)]
pub struct VariantRegistry {
    definitions: Vec<VariantDefinition>,
    by_id: HashMap<String, usize>,
    fallback: usize,
}

impl VariantRegistry {
    /// Validates and builds a registry.
    ///
    /// Rejects empty catalogs, duplicate variant ids, priorities below 1,
    /// variants with fewer than [`MIN_KEYWORDS`] distinct keywords, and a
    /// fallback id that names no variant. Keywords are lowercased so that
    /// matching against an item's lowercased text is exact.
    pub fn new(definitions: Vec<VariantDefinition>, fallback_id: &str) -> Result<Self> {
        if definitions.is_empty() {
            return Err(DeckflowError::configuration("variant registry is empty"));
        }

        let mut normalized = Vec::with_capacity(definitions.len());
        let mut by_id = HashMap::with_capacity(definitions.len());
        for (index, mut def) in definitions.into_iter().enumerate() {
            if def.priority == 0 {
                return Err(DeckflowError::configuration(format!(
                    "variant '{}' has priority 0; priorities start at 1",
                    def.variant_id
                )));
            }

            let mut seen = BTreeSet::new();
            for keyword in &mut def.keywords {
                *keyword = keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(DeckflowError::configuration(format!(
                        "variant '{}' has an empty keyword",
                        def.variant_id
                    )));
                }
                if !seen.insert(keyword.clone()) {
                    return Err(DeckflowError::configuration(format!(
                        "variant '{}' lists keyword '{}' twice",
                        def.variant_id, keyword
                    )));
                }
            }
            if def.keywords.len() < MIN_KEYWORDS {
                return Err(DeckflowError::configuration(format!(
                    "variant '{}' has {} keywords, needs at least {}",
                    def.variant_id,
                    def.keywords.len(),
                    MIN_KEYWORDS
                )));
            }

            if by_id.insert(def.variant_id.clone(), index).is_some() {
                return Err(DeckflowError::configuration(format!(
                    "duplicate variant id '{}'",
                    def.variant_id
                )));
            }
            normalized.push(def);
        }

        let fallback = *by_id.get(fallback_id).ok_or_else(|| {
            DeckflowError::configuration(format!(
                "fallback variant '{}' is not in the registry",
                fallback_id
            ))
        })?;

        Ok(Self {
            definitions: normalized,
            by_id,
            fallback,
        })
    }

    /// The built-in catalog used when no registry file is configured.
    ///
    /// Two layout variants, two diagram variants and two chart variants;
    /// "bullets" is the fallback because any content can be rendered as a
    /// bulleted slide.
    pub fn builtin() -> Self {
        let definitions = vec![
            VariantDefinition::new(
                "bar-chart",
                "chart",
                "/v1/charts/bar",
                1,
                &[
                    "bar chart",
                    "revenue",
                    "sales figures",
                    "quarterly",
                    "by region",
                    "distribution",
                ],
            )
            .with_required_params(&["series"])
            .with_optional_params(&["axis_labels", "stacked"]),
            VariantDefinition::new(
                "line-chart",
                "chart",
                "/v1/charts/line",
                1,
                &[
                    "line chart",
                    "trend",
                    "over time",
                    "growth curve",
                    "time series",
                    "forecast",
                ],
            )
            .with_required_params(&["series"])
            .with_optional_params(&["axis_labels", "smoothing"]),
            VariantDefinition::new(
                "comparison",
                "layout",
                "/v1/render/comparison",
                2,
                &[
                    "versus",
                    "compare",
                    "comparison",
                    "side by side",
                    "pros and cons",
                    "tradeoffs",
                ],
            )
            .with_optional_params(&["columns"]),
            VariantDefinition::new(
                "pyramid",
                "diagram",
                "/v1/figures/pyramid",
                3,
                &["pyramid", "hierarchy", "layered", "tiers", "foundation"],
            ),
            VariantDefinition::new(
                "funnel",
                "diagram",
                "/v1/figures/funnel",
                3,
                &[
                    "funnel",
                    "conversion",
                    "pipeline stages",
                    "drop-off",
                    "acquisition",
                ],
            ),
            VariantDefinition::new(
                "bullets",
                "layout",
                "/v1/render/bullets",
                9,
                &[
                    "summary",
                    "overview",
                    "key points",
                    "takeaways",
                    "agenda",
                    "recap",
                ],
            )
            .with_optional_params(&["max_bullets"]),
        ];

        // The builtin catalog is code, not user input.
        match Self::new(definitions, "bullets") {
            Ok(registry) => registry,
            Err(err) => unreachable!("builtin variant catalog is invalid: {err}"),
        }
    }

    pub fn get(&self, variant_id: &str) -> Option<&VariantDefinition> {
        self.by_id.get(variant_id).map(|&i| &self.definitions[i])
    }

    pub fn fallback(&self) -> &VariantDefinition {
        &self.definitions[self.fallback]
    }

    /// Definitions in insertion order.
    pub fn definitions(&self) -> &[VariantDefinition] {
        &self.definitions
    }

    /// Names of every service referenced by the catalog.
    pub fn service_names(&self) -> BTreeSet<&str> {
        self.definitions
            .iter()
            .map(|d| d.service_name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(id: &str, keywords: &[&str]) -> VariantDefinition {
        VariantDefinition::new(id, "layout", "/v1/render/x", 1, keywords)
    }

    #[test]
    fn builtin_catalog_is_valid() {
        let registry = VariantRegistry::builtin();
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.fallback().variant_id, "bullets");
        let services = registry.service_names();
        assert!(services.contains("layout"));
        assert!(services.contains("diagram"));
        assert!(services.contains("chart"));
    }

    #[test]
    fn rejects_too_few_keywords() {
        let defs = vec![definition("sparse", &["one", "two", "three", "four"])];
        let err = VariantRegistry::new(defs, "sparse").unwrap_err();
        assert!(err.to_string().contains("at least 5"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let defs = vec![
            definition("dup", &["a1", "b2", "c3", "d4", "e5"]),
            definition("dup", &["f6", "g7", "h8", "i9", "j10"]),
        ];
        let err = VariantRegistry::new(defs, "dup").unwrap_err();
        assert!(err.to_string().contains("duplicate variant id"));
    }

    #[test]
    fn rejects_priority_zero() {
        let mut def = definition("zero", &["a1", "b2", "c3", "d4", "e5"]);
        def.priority = 0;
        assert!(VariantRegistry::new(vec![def], "zero").is_err());
    }

    #[test]
    fn rejects_unknown_fallback() {
        let defs = vec![definition("real", &["a1", "b2", "c3", "d4", "e5"])];
        let err = VariantRegistry::new(defs, "ghost").unwrap_err();
        assert!(err.to_string().contains("fallback"));
    }

    #[test]
    fn lowercases_keywords_on_construction() {
        let defs = vec![definition(
            "shouty",
            &["ALPHA", "Beta", "GAMMA ", "delta", "Epsilon"],
        )];
        let registry = VariantRegistry::new(defs, "shouty").unwrap();
        let stored = &registry.get("shouty").unwrap().keywords;
        assert_eq!(stored, &["alpha", "beta", "gamma", "delta", "epsilon"]);
    }

    #[test]
    fn rejects_duplicate_keywords_within_a_variant() {
        let defs = vec![definition("echo", &["same", "SAME", "c3", "d4", "e5"])];
        assert!(VariantRegistry::new(defs, "echo").is_err());
    }
}
