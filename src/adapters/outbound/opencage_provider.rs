//! OpenCage Geocoding Provider
//!
//! Keyed provider, tried first when `OPENCAGE_API_KEY` is configured.

use crate::adapters::outbound::http_client::{coordinate_from, fetch_json, first_entry};
use crate::domain::error::GeocodeError;
use crate::domain::ports::GeocodingProvider;
use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;
use serde_json::Value;

pub const OPENCAGE_DEFAULT_URL: &str = "https://api.opencagedata.com";

/// OpenCage forward geocoder.
///
/// Response shape: `{ "results": [ { "geometry": { "lat": .., "lng": .. } } ] }`.
pub struct OpenCageProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenCageProvider {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn parse(body: &Value) -> Result<Option<Coordinate>, GeocodeError> {
        if !body.is_object() {
            return Err(GeocodeError::Decode("expected a JSON object".to_string()));
        }
        let Some(entry) = first_entry(body.get("results"))? else {
            return Ok(None);
        };
        let geometry = entry
            .get("geometry")
            .ok_or(GeocodeError::MissingField("geometry"))?;
        coordinate_from(geometry, "lat", "lng").map(Some)
    }
}

#[async_trait]
impl GeocodingProvider for OpenCageProvider {
    fn name(&self) -> &'static str {
        "opencage"
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let url = format!("{}/geocode/v1/json", self.base_url.trim_end_matches('/'));
        let request = self.client.get(&url).query(&[
            ("q", address),
            ("key", self.api_key.as_str()),
            ("limit", "1"),
            ("no_annotations", "1"),
        ]);

        let body = fetch_json(request).await?;
        Self::parse(&body)
    }
}
