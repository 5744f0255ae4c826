//! Keyword-driven variant classification.

use serde::{Deserialize, Serialize};

use super::registry::VariantRegistry;
use crate::content::ContentItemSpec;

/// The classifier's verdict for one content item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The chosen variant id. Always resolvable against the registry that
    /// produced this result.
    pub variant_id: String,
    /// Matched-keyword share in `0.0..=1.0`. 1.0 for planner-pinned
    /// variants, 0.0 when the fallback was chosen without evidence.
    pub confidence: f64,
    /// The keywords that voted for the chosen variant, in catalog order.
    pub matched_keywords: Vec<String>,
}

/// Deterministic, registry-driven variant selection.
///
/// A pure function of the item and the registry: same inputs, same verdict,
/// no model calls. Candidates are every variant with at least one keyword
/// hit in the item's text; they are ranked by priority ascending, then hit
/// count descending, then registry insertion order.
pub struct VariantClassifier;

impl VariantClassifier {
    pub fn classify(item: &ContentItemSpec, registry: &VariantRegistry) -> ClassificationResult {
        // A planner-pinned variant is taken verbatim. If it names nothing
        // in the registry the router will fail the item with a
        // configuration error rather than silently rendering something else.
        if let Some(pinned) = &item.variant_id {
            return ClassificationResult {
                variant_id: pinned.clone(),
                confidence: 1.0,
                matched_keywords: Vec::new(),
            };
        }

        let blob = item.keyword_blob();

        let mut candidates: Vec<(&super::model::VariantDefinition, Vec<String>)> = registry
            .definitions()
            .iter()
            .filter_map(|def| {
                let matched: Vec<String> = def
                    .keywords
                    .iter()
                    .filter(|keyword| blob.contains(keyword.as_str()))
                    .cloned()
                    .collect();
                if matched.is_empty() {
                    None
                } else {
                    Some((def, matched))
                }
            })
            .collect();

        // Stable sort: ties on (priority, hits) keep registry order.
        candidates.sort_by(|(a, a_hits), (b, b_hits)| {
            a.priority
                .cmp(&b.priority)
                .then(b_hits.len().cmp(&a_hits.len()))
        });

        match candidates.into_iter().next() {
            Some((winner, matched)) => {
                let confidence =
                    (matched.len() as f64 / winner.keywords.len() as f64).clamp(0.0, 1.0);
                ClassificationResult {
                    variant_id: winner.variant_id.clone(),
                    confidence,
                    matched_keywords: matched,
                }
            }
            None => ClassificationResult {
                variant_id: registry.fallback().variant_id.clone(),
                confidence: 0.0,
                matched_keywords: Vec::new(),
            },
        }
    }
}
