//! Domain errors.

use thiserror::Error;

/// Why a single geocoding provider produced no coordinate.
///
/// These never leave the resolver; they are logged and treated as "no result".
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GeocodeError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
}

/// Errors raised by repositories and application services.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("not allowed: {0}")]
    Forbidden(&'static str),
    #[error("invalid input: {0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
