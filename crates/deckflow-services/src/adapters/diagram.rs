//! DiagramServiceAdapter - client for the diagram figure service.
//!
//! The diagram service draws structural figures (pyramids, funnels) from a
//! set of ordered labels.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use deckflow_core::Result;
use deckflow_core::content::{ContentItemSpec, GeneratedContent};
use deckflow_core::variant::VariantDefinition;

use crate::adapter::{ServiceAdapter, require_params};
use crate::http::{build_client, post_json};

pub const DIAGRAM_SERVICE_NAME: &str = "diagram";
const DEFAULT_BASE_URL: &str = "http://localhost:8102";

/// Adapter implementation that talks to the diagram HTTP API.
#[derive(Clone)]
pub struct DiagramServiceAdapter {
    client: Client,
    base_url: String,
}

impl DiagramServiceAdapter {
    /// Creates a new adapter against the default local endpoint.
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL after construction.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ServiceAdapter for DiagramServiceAdapter {
    fn service_name(&self) -> &str {
        DIAGRAM_SERVICE_NAME
    }

    fn build_request(
        &self,
        item: &ContentItemSpec,
        variant: &VariantDefinition,
    ) -> Result<serde_json::Value> {
        require_params(item, variant)?;

        // Each key point becomes one labelled element of the figure, in
        // order: pyramid tiers top-down, funnel stages wide-to-narrow.
        let request = FigureRequest {
            figure: variant.variant_id.clone(),
            title: item.title.clone(),
            labels: item.key_points.clone(),
            caption: if item.description.is_empty() {
                None
            } else {
                Some(item.description.clone())
            },
            params: item.service_params.clone(),
        };
        Ok(serde_json::to_value(request)?)
    }

    async fn execute(
        &self,
        endpoint: &str,
        request: &serde_json::Value,
    ) -> Result<GeneratedContent> {
        let url = format!("{}{}", self.base_url, endpoint);
        let raw = post_json(&self.client, DIAGRAM_SERVICE_NAME, &url, request).await?;
        let parsed: FigureResponse = serde_json::from_value(raw)?;

        let mut content = GeneratedContent::new(parsed.figure);
        if let Some(canvas) = parsed.canvas {
            content.metadata.insert("canvas".to_string(), canvas);
        }
        Ok(content)
    }
}

#[derive(Serialize)]
struct FigureRequest {
    figure: String,
    title: String,
    labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct FigureResponse {
    figure: serde_json::Value,
    /// Canvas dimensions chosen by the renderer.
    #[serde(default)]
    canvas: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn funnel_variant() -> VariantDefinition {
        VariantDefinition::new(
            "funnel",
            DIAGRAM_SERVICE_NAME,
            "/v1/figures/funnel",
            3,
            &["funnel", "conversion", "pipeline stages", "drop-off", "acquisition"],
        )
    }

    #[test]
    fn key_points_become_ordered_labels() {
        let adapter = DiagramServiceAdapter::new().unwrap();
        let mut item = ContentItemSpec::new(5, "Signup funnel");
        item.key_points = vec![
            "Visitors".to_string(),
            "Trials".to_string(),
            "Paying".to_string(),
        ];

        let request = adapter.build_request(&item, &funnel_variant()).unwrap();
        assert_eq!(request["figure"], "funnel");
        assert_eq!(
            request["labels"],
            serde_json::json!(["Visitors", "Trials", "Paying"])
        );
        assert!(request.get("caption").is_none());
    }

    #[test]
    fn description_rides_along_as_caption() {
        let adapter = DiagramServiceAdapter::new().unwrap();
        let mut item = ContentItemSpec::new(5, "Signup funnel");
        item.description = "Q2 numbers".to_string();

        let request = adapter.build_request(&item, &funnel_variant()).unwrap();
        assert_eq!(request["caption"], "Q2 numbers");
    }
}
