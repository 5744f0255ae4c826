//! Variant catalog entry model.

use serde::{Deserialize, Serialize};

/// One visual variant a content item can be rendered as.
///
/// A variant belongs to exactly one downstream service and carries the
/// keyword evidence the classifier matches against, plus the parameter
/// contract the owning service enforces before a call goes out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDefinition {
    /// Stable identifier, e.g. "bar-chart". Unique within the registry.
    pub variant_id: String,
    /// Name of the service that renders this variant.
    pub service_name: String,
    /// Endpoint path on the owning service, e.g. "/v1/charts/bar".
    pub endpoint: String,
    /// Classification priority. 1 is highest; lower numbers win over
    /// higher hit counts.
    pub priority: u32,
    /// Keywords whose presence in an item's text votes for this variant.
    /// At least five per variant.
    pub keywords: Vec<String>,
    /// Parameters that must be present in an item's `service_params`
    /// before a call is attempted.
    #[serde(default)]
    pub required_params: Vec<String>,
    /// Parameters the service understands but does not require.
    #[serde(default)]
    pub optional_params: Vec<String>,
}

impl VariantDefinition {
    pub fn new(
        variant_id: impl Into<String>,
        service_name: impl Into<String>,
        endpoint: impl Into<String>,
        priority: u32,
        keywords: &[&str],
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            service_name: service_name.into(),
            endpoint: endpoint.into(),
            priority,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            required_params: Vec::new(),
            optional_params: Vec::new(),
        }
    }

    pub fn with_required_params(mut self, params: &[&str]) -> Self {
        self.required_params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_optional_params(mut self, params: &[&str]) -> Self {
        self.optional_params = params.iter().map(|p| p.to_string()).collect();
        self
    }
}
