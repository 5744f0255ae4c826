//! Service adapter trait.
//!
//! One adapter per downstream content service. An adapter knows its
//! service's request and response shapes and nothing about retries,
//! timeouts or pacing - that is all the router's job.

use async_trait::async_trait;

use deckflow_core::content::{ContentItemSpec, GeneratedContent};
use deckflow_core::variant::VariantDefinition;
use deckflow_core::{DeckflowError, Result};

/// A client for one downstream content service.
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    /// The service name this adapter serves, matching
    /// `VariantDefinition::service_name` in the registry.
    fn service_name(&self) -> &str;

    /// Builds the service-specific request payload for an item.
    ///
    /// Fails with a configuration error when the item is missing a
    /// parameter the variant requires. No call is attempted for an item
    /// that fails here.
    fn build_request(
        &self,
        item: &ContentItemSpec,
        variant: &VariantDefinition,
    ) -> Result<serde_json::Value>;

    /// Executes one call against the service.
    ///
    /// `endpoint` is the variant's endpoint path; the adapter owns the
    /// base URL. Implementations map HTTP failures onto the error
    /// taxonomy and parse the service-specific response shape into
    /// neutral [`GeneratedContent`].
    async fn execute(
        &self,
        endpoint: &str,
        request: &serde_json::Value,
    ) -> Result<GeneratedContent>;
}

/// Checks that every parameter the variant requires is present on the item.
pub fn require_params(item: &ContentItemSpec, variant: &VariantDefinition) -> Result<()> {
    for param in &variant.required_params {
        if !item.service_params.contains_key(param) {
            return Err(DeckflowError::configuration(format!(
                "item {} is missing required parameter '{}' for variant '{}'",
                item.sequence_number, param, variant.variant_id
            )));
        }
    }
    Ok(())
}
