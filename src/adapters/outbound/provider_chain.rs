//! Provider Chain Assembly
//!
//! Builds the prioritized list of geocoding providers from configuration.

use crate::adapters::outbound::{NominatimProvider, OpenCageProvider, PositionstackProvider};
use crate::domain::ports::GeocodingProvider;
use crate::infrastructure::RateLimiter;
use std::sync::Arc;

/// Keys and endpoints for the provider chain.
#[derive(Debug, Clone)]
pub struct ProviderChainSettings {
    pub opencage_key: Option<String>,
    pub positionstack_key: Option<String>,
    pub opencage_url: String,
    pub positionstack_url: String,
    pub nominatim_url: String,
}

fn usable_key(key: &Option<String>) -> Option<&str> {
    key.as_deref().map(str::trim).filter(|k| !k.is_empty())
}

/// Build the chain in priority order.
///
/// OpenCage and Positionstack join only when their key is set; Nominatim is
/// always last.
pub fn build_provider_chain(
    client: &reqwest::Client,
    settings: &ProviderChainSettings,
    nominatim_limiter: Arc<RateLimiter>,
) -> Vec<Arc<dyn GeocodingProvider>> {
    let mut chain: Vec<Arc<dyn GeocodingProvider>> = Vec::with_capacity(3);

    if let Some(key) = usable_key(&settings.opencage_key) {
        chain.push(Arc::new(OpenCageProvider::new(
            client.clone(),
            settings.opencage_url.clone(),
            key,
        )));
    }

    if let Some(key) = usable_key(&settings.positionstack_key) {
        chain.push(Arc::new(PositionstackProvider::new(
            client.clone(),
            settings.positionstack_url.clone(),
            key,
        )));
    }

    chain.push(Arc::new(NominatimProvider::new(
        client.clone(),
        settings.nominatim_url.clone(),
        nominatim_limiter,
    )));

    chain
}
