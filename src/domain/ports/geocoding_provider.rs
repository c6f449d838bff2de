//! Geocoding Provider Port
//!
//! One external geocoding service behind a common contract.

use crate::domain::error::GeocodeError;
use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;

/// A single forward-geocoding service.
///
/// Providers differ in transport details (parameter names, envelope shape,
/// authentication) but all map an address string to at most one coordinate.
/// `Ok(None)` means the service answered but found nothing.
#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Stable name used for logging and circuit breaker bookkeeping.
    fn name(&self) -> &'static str;

    /// Geocode a composed address string, taking only the first candidate.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError>;
}
