//! LayoutServiceAdapter - client for the slide layout rendering service.
//!
//! The layout service renders structured slide layouts (bulleted slides,
//! comparison tables) from a title and a list of sections.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use deckflow_core::Result;
use deckflow_core::content::{ContentItemSpec, GeneratedContent};
use deckflow_core::variant::VariantDefinition;

use crate::adapter::{ServiceAdapter, require_params};
use crate::http::{build_client, post_json};

pub const LAYOUT_SERVICE_NAME: &str = "layout";
const DEFAULT_BASE_URL: &str = "http://localhost:8101";

/// Adapter implementation that talks to the layout rendering HTTP API.
#[derive(Clone)]
pub struct LayoutServiceAdapter {
    client: Client,
    base_url: String,
}

impl LayoutServiceAdapter {
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
impl ServiceAdapter for LayoutServiceAdapter {
    fn service_name(&self) -> &str {
        LAYOUT_SERVICE_NAME
    }

    fn build_request(
        &self,
        item: &ContentItemSpec,
        variant: &VariantDefinition,
    ) -> Result<serde_json::Value> {
        require_params(item, variant)?;

        let mut sections: Vec<RenderSection> = item
            .key_points
            .iter()
            .map(|point| RenderSection {
                text: point.clone(),
            })
            .collect();
        if sections.is_empty() && !item.description.is_empty() {
            sections.push(RenderSection {
                text: item.description.clone(),
            });
        }

        let request = RenderRequest {
            layout: variant.variant_id.clone(),
            title: item.title.clone(),
            sections,
            options: item.service_params.clone(),
        };
        Ok(serde_json::to_value(request)?)
    }

    async fn execute(
        &self,
        endpoint: &str,
        request: &serde_json::Value,
    ) -> Result<GeneratedContent> {
        let url = format!("{}{}", self.base_url, endpoint);
        let raw = post_json(&self.client, LAYOUT_SERVICE_NAME, &url, request).await?;
        let parsed: RenderResponse = serde_json::from_value(raw)?;

        let mut content = GeneratedContent::new(parsed.document);
        if let Some(renderer) = parsed.renderer {
            content
                .metadata
                .insert("renderer".to_string(), serde_json::Value::String(renderer));
        }
        Ok(content)
    }
}

#[derive(Serialize)]
struct RenderRequest {
    layout: String,
    title: String,
    sections: Vec<RenderSection>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, serde_json::Value>,
}

#[derive(Serialize)]
struct RenderSection {
    text: String,
}

#[derive(Deserialize)]
struct RenderResponse {
    document: serde_json::Value,
    #[serde(default)]
    renderer: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bullets_variant() -> VariantDefinition {
        VariantDefinition::new(
            "bullets",
            LAYOUT_SERVICE_NAME,
            "/v1/render/bullets",
            9,
            &["summary", "overview", "key points", "takeaways", "agenda"],
        )
    }

    #[test]
    fn request_carries_title_and_key_points_as_sections() {
        let adapter = LayoutServiceAdapter::new().unwrap();
        let mut item = ContentItemSpec::new(2, "Team");
        item.key_points = vec!["Founded 2021".to_string(), "12 engineers".to_string()];

        let request = adapter.build_request(&item, &bullets_variant()).unwrap();
        assert_eq!(request["layout"], "bullets");
        assert_eq!(request["title"], "Team");
        assert_eq!(request["sections"][0]["text"], "Founded 2021");
        assert_eq!(request["sections"][1]["text"], "12 engineers");
    }

    #[test]
    fn description_becomes_a_section_when_no_key_points_exist() {
        let adapter = LayoutServiceAdapter::new().unwrap();
        let mut item = ContentItemSpec::new(3, "Vision");
        item.description = "Where the company is going".to_string();

        let request = adapter.build_request(&item, &bullets_variant()).unwrap();
        assert_eq!(request["sections"][0]["text"], "Where the company is going");
    }

    #[test]
    fn empty_service_params_are_omitted_from_the_wire() {
        let adapter = LayoutServiceAdapter::new().unwrap();
        let item = ContentItemSpec::new(1, "Agenda");

        let request = adapter.build_request(&item, &bullets_variant()).unwrap();
        assert!(request.get("options").is_none());
    }
}
