//! Geocoding Resolver - fallback chain over geocoding providers
//!
//! Tries each provider in priority order and returns the first coordinate
//! found. Provider failures are logged and never reach the caller.

use crate::domain::ports::{GeoResolver, GeocodingProvider};
use crate::domain::value_objects::{Coordinate, LocationQuery};
use crate::infrastructure::CircuitBreaker;
use async_trait::async_trait;
use std::sync::Arc;

/// Sequential fallback over a prioritized provider list.
///
/// Providers whose circuit is open are skipped, except the last one in the
/// chain, which is always tried. A provider answering with no result counts
/// as healthy; transport, status and decoding errors count as failures.
pub struct GeocodingResolver {
    providers: Vec<Arc<dyn GeocodingProvider>>,
    breaker: Arc<CircuitBreaker>,
}

impl GeocodingResolver {
    pub fn new(providers: Vec<Arc<dyn GeocodingProvider>>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { providers, breaker }
    }

    /// Names of the configured providers, in the order they are tried.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl GeoResolver for GeocodingResolver {
    async fn resolve(&self, query: &LocationQuery) -> Option<Coordinate> {
        if query.is_empty() {
            return None;
        }

        let address = query.address();

        let last = self.providers.len().saturating_sub(1);

        for (i, provider) in self.providers.iter().enumerate() {
            let name = provider.name();

            if !self.breaker.allow_request(name) {
                if i < last {
                    tracing::debug!("skipping {}: circuit open", name);
                    continue;
                }
                tracing::debug!("{} circuit open, trying it as the last provider", name);
            }

            match provider.geocode(&address).await {
                Ok(Some(coordinate)) => {
                    self.breaker.record_success(name);
                    tracing::debug!(
                        "{} resolved '{}' to {}",
                        name,
                        address,
                        coordinate.key()
                    );
                    return Some(coordinate);
                }
                Ok(None) => {
                    self.breaker.record_success(name);
                    tracing::debug!("{} found no match for '{}'", name, address);
                }
                Err(e) => {
                    self.breaker.record_failure(name);
                    tracing::warn!("{} geocoding error for '{}': {}", name, address, e);
                }
            }
        }

        tracing::info!("could not geocode '{}'", address);
        None
    }
}
