//! Application Layer
//!
//! Use cases orchestrating the domain ports.

pub mod catalog_service;
pub mod geocoding_resolver;
pub mod order_service;
pub mod petition_service;

pub use catalog_service::{CartLine, CartView, CatalogService, MovieDetail};
pub use geocoding_resolver::GeocodingResolver;
pub use order_service::{LocationForm, OrderService};
pub use petition_service::PetitionService;
