//! Geo Resolver Port
//!
//! Defines the interface for turning a free-text location into coordinates.

use crate::domain::value_objects::{Coordinate, LocationQuery};
use async_trait::async_trait;

/// Resolver for location text to geographic coordinates.
///
/// This is the capability the order lifecycle depends on. Implementations
/// never fail: every problem collapses into `None`.
#[async_trait]
pub trait GeoResolver: Send + Sync {
    /// Resolve a location to a coordinate.
    ///
    /// Returns None when the city is empty or nothing could be resolved.
    async fn resolve(&self, query: &LocationQuery) -> Option<Coordinate>;
}
