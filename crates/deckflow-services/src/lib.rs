//! Downstream service clients and the routing layer.
//!
//! # Module Structure
//!
//! - `adapter`: The per-service client trait (`ServiceAdapter`)
//! - `adapters`: Concrete clients for the layout, diagram and chart services
//! - `router`: Variant-to-backend dispatch with retry policy (`ServiceRouter`)

pub mod adapter;
pub mod adapters;
mod http;
pub mod router;

pub use adapter::ServiceAdapter;
pub use adapters::{
    CHART_SERVICE_NAME, ChartServiceAdapter, DIAGRAM_SERVICE_NAME, DiagramServiceAdapter,
    LAYOUT_SERVICE_NAME, LayoutServiceAdapter, standard_adapters,
};
pub use router::ServiceRouter;
