//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// A (latitude, longitude) pair in degrees.
///
/// No range validation is performed; consumers assume WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate only when both sides are present.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Self::new(lat, lon)),
            _ => None,
        }
    }

    /// Bucket key used to group purchases at the same place.
    pub fn key(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

/// Free-text location to be geocoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationQuery {
    pub city: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl LocationQuery {
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            state: None,
            country: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// True when there is no city to resolve.
    pub fn is_empty(&self) -> bool {
        self.city.trim().is_empty()
    }

    /// Compose the address string sent to providers.
    ///
    /// Non-empty parts joined with ", " in the order city, state, country.
    pub fn address(&self) -> String {
        [
            Some(self.city.as_str()),
            self.state.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// When order coordinates get resolved relative to the order write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeocodeMode {
    /// Resolve before the row is written (checkout waits for geocoding).
    #[default]
    Inline,
    /// Write first, resolve later on a background worker.
    Deferred,
}

impl GeocodeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Deferred => "deferred",
        }
    }
}

/// Unknown names parse as `Inline`.
impl FromStr for GeocodeMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "deferred" | "async" | "background" => Self::Deferred,
            _ => Self::Inline,
        })
    }
}

impl std::fmt::Display for GeocodeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
