//! Shared HTTP plumbing for geocoding providers.
//!
//! One `reqwest::Client` is built at startup and cloned into every provider,
//! so all providers share the same connection pool and identification header.

use crate::domain::error::GeocodeError;
use crate::domain::value_objects::Coordinate;
use serde_json::Value;
use std::time::Duration;

/// Identification header sent to every provider.
pub const DEFAULT_USER_AGENT: &str = "MovieStore/1.0";

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared client with a fixed user agent and a bounded timeout.
pub fn build_http_client(user_agent: &str, timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(user_agent.to_string())
        .timeout(timeout)
        .build()
}

/// Send a request and decode the body as JSON.
///
/// Transport failures, timeouts, non-success statuses and undecodable bodies
/// are mapped onto `GeocodeError`.
pub async fn fetch_json(request: reqwest::RequestBuilder) -> Result<Value, GeocodeError> {
    let response = request.send().await.map_err(map_reqwest_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(GeocodeError::Status(status.as_u16()));
    }

    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|e| GeocodeError::Decode(e.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> GeocodeError {
    if err.is_timeout() {
        GeocodeError::Timeout
    } else {
        GeocodeError::Transport(err.to_string())
    }
}

/// Read a float from a JSON number or a numeric string.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract a coordinate from `entry[lat_key]` / `entry[lon_key]`.
pub fn coordinate_from(
    entry: &Value,
    lat_key: &'static str,
    lon_key: &'static str,
) -> Result<Coordinate, GeocodeError> {
    let lat = entry.get(lat_key).ok_or(GeocodeError::MissingField(lat_key))?;
    let lon = entry.get(lon_key).ok_or(GeocodeError::MissingField(lon_key))?;

    let latitude = coerce_f64(lat)
        .ok_or_else(|| GeocodeError::Decode(format!("`{}` is not a number: {}", lat_key, lat)))?;
    let longitude = coerce_f64(lon)
        .ok_or_else(|| GeocodeError::Decode(format!("`{}` is not a number: {}", lon_key, lon)))?;

    Ok(Coordinate::new(latitude, longitude))
}

/// First element of a JSON array, treating null/missing/empty as no result.
///
/// Anything other than an array is a malformed response.
pub fn first_entry<'a>(list: Option<&'a Value>) -> Result<Option<&'a Value>, GeocodeError> {
    match list {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(items.first()),
        Some(other) => Err(GeocodeError::Decode(format!("expected a list, got {}", other))),
    }
}
