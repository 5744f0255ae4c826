//! Concrete adapters for the downstream content services.

use std::sync::Arc;

use deckflow_core::Result;
use deckflow_core::config::EngineConfig;

use crate::adapter::ServiceAdapter;

mod chart;
mod diagram;
mod layout;

pub use chart::{CHART_SERVICE_NAME, ChartServiceAdapter};
pub use diagram::{DIAGRAM_SERVICE_NAME, DiagramServiceAdapter};
pub use layout::{LAYOUT_SERVICE_NAME, LayoutServiceAdapter};

/// Builds the standard adapter fleet.
///
/// Each adapter starts on its default local endpoint; an entry in
/// `service_base_urls` keyed by the service name overrides it.
pub fn standard_adapters(config: &EngineConfig) -> Result<Vec<Arc<dyn ServiceAdapter>>> {
    let mut layout = LayoutServiceAdapter::new()?;
    if let Some(url) = config.service_base_urls.get(LAYOUT_SERVICE_NAME) {
        layout = layout.with_base_url(url.clone());
    }
    let mut diagram = DiagramServiceAdapter::new()?;
    if let Some(url) = config.service_base_urls.get(DIAGRAM_SERVICE_NAME) {
        diagram = diagram.with_base_url(url.clone());
    }
    let mut chart = ChartServiceAdapter::new()?;
    if let Some(url) = config.service_base_urls.get(CHART_SERVICE_NAME) {
        chart = chart.with_base_url(url.clone());
    }
    Ok(vec![Arc::new(layout), Arc::new(diagram), Arc::new(chart)])
}
