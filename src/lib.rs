//! movie-store Library
//!
//! This module exposes the storefront components for use in integration
//! tests and as a library.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{CatalogService, GeocodingResolver, OrderService, PetitionService};
pub use config::load_config;
pub use domain::entities::{Movie, NewOrder, Order, PurchaseLocation};
pub use domain::ports::{GeoResolver, GeocodingProvider, OrderRepository};
pub use domain::services::{RatingMap, RatingMapBuilder};
pub use domain::value_objects::{Coordinate, GeocodeMode, LocationQuery};
