//! Positionstack Geocoding Provider
//!
//! Keyed provider, tried second when `POSITIONSTACK_API_KEY` is configured.

use crate::adapters::outbound::http_client::{coordinate_from, fetch_json, first_entry};
use crate::domain::error::GeocodeError;
use crate::domain::ports::GeocodingProvider;
use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;
use serde_json::Value;

pub const POSITIONSTACK_DEFAULT_URL: &str = "http://api.positionstack.com";

/// Positionstack forward geocoder.
///
/// Response shape: `{ "data": [ { "latitude": .., "longitude": .. } ] }`.
pub struct PositionstackProvider {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl PositionstackProvider {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            access_key: access_key.into(),
        }
    }

    fn parse(body: &Value) -> Result<Option<Coordinate>, GeocodeError> {
        if !body.is_object() {
            return Err(GeocodeError::Decode("expected a JSON object".to_string()));
        }
        match first_entry(body.get("data"))? {
            Some(entry) => coordinate_from(entry, "latitude", "longitude").map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl GeocodingProvider for PositionstackProvider {
    fn name(&self) -> &'static str {
        "positionstack"
    }

    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let url = format!("{}/v1/forward", self.base_url.trim_end_matches('/'));
        let request = self.client.get(&url).query(&[
            ("access_key", self.access_key.as_str()),
            ("query", address),
            ("limit", "1"),
        ]);

        let body = fetch_json(request).await?;
        Self::parse(&body)
    }
}
