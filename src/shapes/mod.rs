//! Data shapes for resolved endpoints.
//!
//! Providers run after resolution and only ever add [`DataShape`]s; they
//! never change an endpoint's identity or description.

pub mod inferred;
pub mod live;

pub use inferred::InferredShapes;
pub use live::LiveInspector;

use crate::routes::{DataShape, EndpointRecord};

/// Source of request/response shapes for an endpoint.
pub trait DataShapeProvider {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Shapes for one endpoint; empty when the provider knows nothing.
    fn shapes_for(&self, endpoint: &EndpointRecord) -> Vec<DataShape>;
}
