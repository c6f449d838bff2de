//! Nominatim Geocoding Provider
//!
//! Keyless OpenStreetMap geocoder. Always tried last. The public instance
//! allows one request per second, so every call goes through a shared
//! rate limiter before it is sent.

use crate::adapters::outbound::http_client::{coordinate_from, fetch_json, first_entry};
use crate::domain::error::GeocodeError;
use crate::domain::ports::GeocodingProvider;
use crate::domain::value_objects::Coordinate;
use crate::infrastructure::RateLimiter;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub const NOMINATIM_DEFAULT_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim forward geocoder.
///
/// Response shape: `[ { "lat": "..", "lon": ".." } ]`.
pub struct NominatimProvider {
    client: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl NominatimProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            limiter,
        }
    }

    fn parse(body: &Value) -> Result<Option<Coordinate>, GeocodeError> {
        match first_entry(Some(body))? {
            Some(entry) => coordinate_from(entry, "lat", "lon").map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl GeocodingProvider for NominatimProvider {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        self.limiter.acquire().await;

        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        let request = self.client.get(&url).query(&[
            ("q", address),
            ("format", "json"),
            ("limit", "1"),
            ("addressdetails", "1"),
        ]);

        let body = fetch_json(request).await?;
        Self::parse(&body)
    }
}
