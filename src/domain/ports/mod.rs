mod cart_store;
mod catalog_repository;
mod geo_resolver;
mod geocoding_provider;
mod order_repository;
mod petition_repository;
mod user_repository;

pub use cart_store::CartStore;
pub use catalog_repository::CatalogRepository;
pub use geo_resolver::GeoResolver;
pub use geocoding_provider::GeocodingProvider;
pub use order_repository::OrderRepository;
pub use petition_repository::PetitionRepository;
pub use user_repository::UserRepository;
