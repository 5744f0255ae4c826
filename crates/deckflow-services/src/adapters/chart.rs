//! ChartServiceAdapter - client for the data chart service.
//!
//! The chart service plots numeric series. Unlike the other services it
//! cannot invent its input: a chart item must carry its data in the
//! `series` service parameter, which the variant catalog marks required.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use deckflow_core::content::{ContentItemSpec, GeneratedContent};
use deckflow_core::variant::VariantDefinition;
use deckflow_core::{DeckflowError, Result};

use crate::adapter::{ServiceAdapter, require_params};
use crate::http::{build_client, post_json};

pub const CHART_SERVICE_NAME: &str = "chart";
const DEFAULT_BASE_URL: &str = "http://localhost:8103";

/// Adapter implementation that talks to the chart HTTP API.
#[derive(Clone)]
pub struct ChartServiceAdapter {
    client: Client,
    base_url: String,
}

impl ChartServiceAdapter {
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
impl ServiceAdapter for ChartServiceAdapter {
    fn service_name(&self) -> &str {
        CHART_SERVICE_NAME
    }

    fn build_request(
        &self,
        item: &ContentItemSpec,
        variant: &VariantDefinition,
    ) -> Result<serde_json::Value> {
        require_params(item, variant)?;

        // require_params guarantees presence; the shape check is ours.
        let series = item
            .service_params
            .get("series")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        if !series.is_array() && !series.is_object() {
            return Err(DeckflowError::configuration(format!(
                "item {} has a non-tabular 'series' parameter for variant '{}'",
                item.sequence_number, variant.variant_id
            )));
        }

        let mut options = item.service_params.clone();
        options.remove("series");
        let axis_labels = options.remove("axis_labels");

        let request = ChartRequest {
            chart: variant.variant_id.clone(),
            title: item.title.clone(),
            series,
            axis_labels,
            options,
        };
        Ok(serde_json::to_value(request)?)
    }

    async fn execute(
        &self,
        endpoint: &str,
        request: &serde_json::Value,
    ) -> Result<GeneratedContent> {
        let url = format!("{}{}", self.base_url, endpoint);
        let raw = post_json(&self.client, CHART_SERVICE_NAME, &url, request).await?;
        let parsed: ChartResponse = serde_json::from_value(raw)?;

        let mut content = GeneratedContent::new(parsed.chart);
        if let Some(legend) = parsed.legend {
            content.metadata.insert("legend".to_string(), legend);
        }
        Ok(content)
    }
}

#[derive(Serialize)]
struct ChartRequest {
    chart: String,
    title: String,
    series: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    axis_labels: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    options: BTreeMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct ChartResponse {
    chart: serde_json::Value,
    #[serde(default)]
    legend: Option<serde_json::Value>,
}
