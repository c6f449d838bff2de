mod dashmap_cart_store;
mod http_client;
mod nominatim_provider;
mod opencage_provider;
mod positionstack_provider;
mod provider_chain;
mod sqlite_catalog_repo;
mod sqlite_order_repo;
mod sqlite_petition_repo;
mod sqlite_store;

pub use dashmap_cart_store::DashMapCartStore;
pub use http_client::{build_http_client, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use nominatim_provider::{NominatimProvider, NOMINATIM_DEFAULT_URL};
pub use opencage_provider::{OpenCageProvider, OPENCAGE_DEFAULT_URL};
pub use positionstack_provider::{PositionstackProvider, POSITIONSTACK_DEFAULT_URL};
pub use provider_chain::{build_provider_chain, ProviderChainSettings};
pub use sqlite_store::SqliteStore;
