//! Adapters Layer
//!
//! Inbound adapters drive the application (HTTP API); outbound adapters
//! implement the domain ports (SQLite, cart store, geocoding providers).

pub mod inbound;
pub mod outbound;
