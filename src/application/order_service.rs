//! Order Service - checkout and the order persistence hook
//!
//! Every order write goes through `save_order` / `update_order`, which fill in
//! missing coordinates either inline or through the enrichment queue.

use crate::domain::entities::{
    NewItem, NewOrder, Order, OrderDetail, OrderId, PurchaseLocation, UserId,
};
use crate::domain::error::{StoreError, StoreResult};
use crate::domain::ports::{CartStore, CatalogRepository, GeoResolver, OrderRepository};
use crate::domain::services::{RatingMap, RatingMapBuilder};
use crate::domain::value_objects::GeocodeMode;
use crate::infrastructure::EnrichmentQueue;
use serde::Deserialize;
use std::sync::Arc;

/// Location fields submitted with a purchase or a location edit.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationForm {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

enum Geocoding {
    Inline,
    Deferred(EnrichmentQueue),
}

/// Order use cases.
pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn CatalogRepository>,
    carts: Arc<dyn CartStore>,
    resolver: Arc<dyn GeoResolver>,
    geocoding: Geocoding,
    default_country: String,
}

impl OrderService {
    /// Create a service that geocodes inline with every write.
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogRepository>,
        carts: Arc<dyn CartStore>,
        resolver: Arc<dyn GeoResolver>,
        default_country: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            catalog,
            carts,
            resolver,
            geocoding: Geocoding::Inline,
            default_country: default_country.into(),
        }
    }

    /// Hand geocoding to a background worker instead of blocking the write.
    pub fn with_enrichment(mut self, queue: EnrichmentQueue) -> Self {
        self.geocoding = Geocoding::Deferred(queue);
        self
    }

    pub fn mode(&self) -> GeocodeMode {
        match self.geocoding {
            Geocoding::Inline => GeocodeMode::Inline,
            Geocoding::Deferred(_) => GeocodeMode::Deferred,
        }
    }

    fn location_from(&self, form: LocationForm) -> PurchaseLocation {
        PurchaseLocation::new(
            non_blank(form.city),
            non_blank(form.state),
            non_blank(form.country).unwrap_or_else(|| self.default_country.clone()),
        )
    }

    async fn fill_coordinate(&self, location: &mut PurchaseLocation) {
        if !location.needs_geocoding() {
            return;
        }
        if let Some(coordinate) = self.resolver.resolve(&location.query()).await {
            location.set_coordinate(coordinate);
        }
    }

    /// Hook run after a write in deferred mode.
    fn schedule_enrichment(&self, order: &Order) {
        if let Geocoding::Deferred(queue) = &self.geocoding {
            if order.location.needs_geocoding() {
                queue.enqueue(order.id);
            }
        }
    }

    /// Write a new order, resolving its coordinate when one side is missing
    /// and a city is known. Geocoding never rejects the order.
    pub async fn save_order(&self, mut order: NewOrder) -> StoreResult<Order> {
        if let Geocoding::Inline = self.geocoding {
            self.fill_coordinate(&mut order.location).await;
        }

        let saved = self.orders.insert_order(order).await?;
        tracing::info!(
            "order {} saved for user {} (total {}, located: {})",
            saved.id,
            saved.user_id,
            saved.total,
            saved.location.coordinate().is_some()
        );

        self.schedule_enrichment(&saved);
        Ok(saved)
    }

    /// Rewrite an existing order through the same hook as `save_order`.
    pub async fn update_order(&self, mut order: Order) -> StoreResult<Order> {
        if let Geocoding::Inline = self.geocoding {
            self.fill_coordinate(&mut order.location).await;
        }

        self.orders.update_order(&order).await?;
        tracing::info!("order {} updated", order.id);

        self.schedule_enrichment(&order);
        Ok(order)
    }

    /// Turn the session cart into an order with items, then empty the cart.
    pub async fn checkout(
        &self,
        user_id: UserId,
        session: &str,
        form: LocationForm,
    ) -> StoreResult<OrderDetail> {
        let cart = self
            .carts
            .get(session)
            .await
            .filter(|c| !c.is_empty())
            .ok_or_else(|| StoreError::Invalid("cart is empty".to_string()))?;

        let movies = self.catalog.movies_by_ids(&cart.movie_ids()).await?;
        if movies.is_empty() {
            return Err(StoreError::Invalid("cart is empty".to_string()));
        }

        let order = self
            .save_order(NewOrder {
                total: cart.total(&movies),
                user_id,
                location: self.location_from(form),
            })
            .await?;

        let lines = movies
            .iter()
            .map(|m| NewItem {
                price: m.price,
                quantity: cart.quantity(m.id),
                movie_id: m.id,
            })
            .collect();
        let items = self.orders.insert_items(order.id, lines).await?;

        self.carts.clear(session).await;

        Ok(OrderDetail { order, items })
    }

    /// Change where an order was placed.
    ///
    /// A changed city, state or country drops the stored coordinate so the
    /// write re-resolves it.
    pub async fn update_location(
        &self,
        user_id: UserId,
        order_id: OrderId,
        form: LocationForm,
    ) -> StoreResult<Order> {
        let mut order = self
            .orders
            .get_order(order_id)
            .await?
            .filter(|o| o.user_id == user_id)
            .ok_or(StoreError::NotFound("order"))?;

        let location = self.location_from(form);
        if !order.location.place_differs(&location) {
            return Ok(order);
        }

        order.location = location;
        self.update_order(order).await
    }

    /// Queue every stored order still missing a coordinate.
    ///
    /// Picks up work left in the queue by an earlier process. Returns the
    /// number queued; always 0 in inline mode.
    pub async fn requeue_pending(&self) -> StoreResult<usize> {
        let Geocoding::Deferred(queue) = &self.geocoding else {
            return Ok(0);
        };

        let pending = self.orders.pending_geocoding().await?;
        let queued = pending.into_iter().filter(|id| queue.enqueue(*id)).count();
        if queued > 0 {
            tracing::info!("requeued {} orders for geocoding", queued);
        }
        Ok(queued)
    }

    pub async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderDetail>> {
        self.orders.orders_for_user(user_id).await
    }

    /// Purchase counts aggregated per coordinate and per movie.
    pub async fn rating_map(&self) -> StoreResult<RatingMap> {
        let rows = self.orders.purchase_rows().await?;
        Ok(RatingMapBuilder::build(&rows))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::adapters::outbound::DashMapCartStore;
    use crate::domain::entities::{Item, Movie, MovieId, PurchaseRow, Review, ReviewId};
    use crate::domain::value_objects::{Coordinate, LocationQuery};
    use crate::infrastructure::EnrichmentWorker;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    // ===== Mock Implementations =====

    #[derive(Default)]
    struct MockOrders {
        orders: Mutex<HashMap<OrderId, Order>>,
        items: Mutex<Vec<Item>>,
    }

    #[async_trait]
    impl OrderRepository for MockOrders {
        async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
            let mut orders = self.orders.lock().unwrap();
            let saved = Order {
                id: orders.len() as OrderId + 1,
                total: order.total,
                date: Utc::now(),
                user_id: order.user_id,
                location: order.location,
            };
            orders.insert(saved.id, saved.clone());
            Ok(saved)
        }

        async fn update_order(&self, order: &Order) -> StoreResult<()> {
            self.orders.lock().unwrap().insert(order.id, order.clone());
            Ok(())
        }

        async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
            Ok(self.orders.lock().unwrap().get(&id).cloned())
        }

        async fn set_coordinate(
            &self,
            id: OrderId,
            resolved: &PurchaseLocation,
            coordinate: Coordinate,
        ) -> StoreResult<bool> {
            let mut orders = self.orders.lock().unwrap();
            match orders.get_mut(&id) {
                Some(o)
                    if o.location.needs_geocoding() && !o.location.place_differs(resolved) =>
                {
                    o.location.set_coordinate(coordinate);
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn pending_geocoding(&self) -> StoreResult<Vec<OrderId>> {
            let mut ids: Vec<_> = self
                .orders
                .lock()
                .unwrap()
                .values()
                .filter(|o| o.location.needs_geocoding())
                .map(|o| o.id)
                .collect();
            ids.sort();
            Ok(ids)
        }

        async fn insert_items(&self, order_id: OrderId, items: Vec<NewItem>) -> StoreResult<Vec<Item>> {
            let mut stored = self.items.lock().unwrap();
            let saved: Vec<Item> = items
                .into_iter()
                .map(|i| Item {
                    id: stored.len() as i64 + 1,
                    price: i.price,
                    quantity: i.quantity,
                    order_id,
                    movie_id: i.movie_id,
                })
                .collect();
            stored.extend(saved.iter().cloned());
            Ok(saved)
        }

        async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderDetail>> {
            let items = self.items.lock().unwrap();
            Ok(self
                .orders
                .lock()
                .unwrap()
                .values()
                .filter(|o| o.user_id == user_id)
                .map(|o| OrderDetail {
                    order: o.clone(),
                    items: items.iter().filter(|i| i.order_id == o.id).cloned().collect(),
                })
                .collect())
        }

        async fn purchase_rows(&self) -> StoreResult<Vec<PurchaseRow>> {
            Ok(Vec::new())
        }
    }

    struct MockCatalog {
        movies: Vec<Movie>,
    }

    #[async_trait]
    impl CatalogRepository for MockCatalog {
        async fn list_movies(&self, _search: Option<&str>) -> StoreResult<Vec<Movie>> {
            Ok(self.movies.clone())
        }

        async fn get_movie(&self, id: MovieId) -> StoreResult<Option<Movie>> {
            Ok(self.movies.iter().find(|m| m.id == id).cloned())
        }

        async fn movies_by_ids(&self, ids: &[MovieId]) -> StoreResult<Vec<Movie>> {
            Ok(self
                .movies
                .iter()
                .filter(|m| ids.contains(&m.id))
                .cloned()
                .collect())
        }

        async fn reviews_for_movie(&self, _movie_id: MovieId) -> StoreResult<Vec<Review>> {
            Ok(Vec::new())
        }

        async fn get_review(&self, _id: ReviewId) -> StoreResult<Option<Review>> {
            Ok(None)
        }

        async fn insert_review(
            &self,
            _movie_id: MovieId,
            _user_id: UserId,
            _comment: &str,
        ) -> StoreResult<Review> {
            unimplemented!()
        }

        async fn update_review(&self, _id: ReviewId, _comment: &str) -> StoreResult<()> {
            Ok(())
        }

        async fn delete_review(&self, _id: ReviewId) -> StoreResult<bool> {
            Ok(false)
        }
    }

    struct RecordingResolver {
        answer: Option<Coordinate>,
        queries: Mutex<Vec<LocationQuery>>,
    }

    impl RecordingResolver {
        fn new(answer: Option<Coordinate>) -> Arc<Self> {
            Arc::new(Self {
                answer,
                queries: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl GeoResolver for RecordingResolver {
        async fn resolve(&self, query: &LocationQuery) -> Option<Coordinate> {
            self.queries.lock().unwrap().push(query.clone());
            if query.is_empty() {
                return None;
            }
            self.answer
        }
    }

    fn movie(id: MovieId, price: i64) -> Movie {
        Movie {
            id,
            name: format!("movie-{}", id),
            price,
            description: String::new(),
            image: String::new(),
        }
    }

    struct Fixture {
        service: OrderService,
        orders: Arc<MockOrders>,
        carts: Arc<DashMapCartStore>,
        resolver: Arc<RecordingResolver>,
    }

    fn fixture(answer: Option<Coordinate>) -> Fixture {
        let orders = Arc::new(MockOrders::default());
        let carts = Arc::new(DashMapCartStore::new());
        let resolver = RecordingResolver::new(answer);
        let catalog = Arc::new(MockCatalog {
            movies: vec![movie(1, 10), movie(2, 4)],
        });
        let service = OrderService::new(
            orders.clone(),
            catalog,
            carts.clone(),
            resolver.clone(),
            "USA",
        );
        Fixture {
            service,
            orders,
            carts,
            resolver,
        }
    }

    fn new_order(city: Option<&str>) -> NewOrder {
        NewOrder {
            total: 10,
            user_id: 1,
            location: PurchaseLocation::new(city.map(String::from), None, "USA".into()),
        }
    }

    // ===== Persistence Hook =====

    #[tokio::test]
    async fn test_save_with_coordinates_skips_resolver() {
        let f = fixture(Some(Coordinate::new(1.0, 1.0)));
        let mut order = new_order(Some("Atlanta"));
        order.location.set_coordinate(Coordinate::new(33.7, -84.4));

        let saved = f.service.save_order(order).await.unwrap();

        assert_eq!(f.resolver.calls(), 0);
        assert_eq!(saved.location.coordinate(), Some(Coordinate::new(33.7, -84.4)));
    }

    #[tokio::test]
    async fn test_save_persists_resolved_coordinate() {
        let f = fixture(Some(Coordinate::new(12.34, 56.78)));

        let saved = f.service.save_order(new_order(Some("Atlanta"))).await.unwrap();

        let stored = f.orders.get_order(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.location.latitude, Some(12.34));
        assert_eq!(stored.location.longitude, Some(56.78));
    }

    #[tokio::test]
    async fn test_save_succeeds_when_unresolved() {
        let f = fixture(None);

        let saved = f.service.save_order(new_order(Some("Atlantis"))).await.unwrap();

        assert_eq!(f.resolver.calls(), 1);
        let stored = f.orders.get_order(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.location.latitude, None);
        assert_eq!(stored.location.longitude, None);
    }

    #[tokio::test]
    async fn test_save_half_coordinate_is_resolved() {
        let f = fixture(Some(Coordinate::new(5.0, 6.0)));
        let mut order = new_order(Some("Atlanta"));
        order.location.latitude = Some(99.0);

        let saved = f.service.save_order(order).await.unwrap();

        assert_eq!(f.resolver.calls(), 1);
        assert_eq!(saved.location.coordinate(), Some(Coordinate::new(5.0, 6.0)));
    }

    #[tokio::test]
    async fn test_save_without_city_skips_resolver() {
        let f = fixture(Some(Coordinate::new(1.0, 1.0)));

        f.service.save_order(new_order(None)).await.unwrap();
        f.service.save_order(new_order(Some("  "))).await.unwrap();

        assert_eq!(f.resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolver_receives_full_location() {
        let f = fixture(None);
        let mut order = new_order(Some("Atlanta"));
        order.location.state = Some("GA".into());

        f.service.save_order(order).await.unwrap();

        let queries = f.resolver.queries.lock().unwrap();
        assert_eq!(queries[0].address(), "Atlanta, GA, USA");
    }

    #[tokio::test]
    async fn test_deferred_mode_writes_first() {
        let f = fixture(Some(Coordinate::new(12.34, 56.78)));
        let (worker, queue) = EnrichmentWorker::new(f.orders.clone(), f.resolver.clone());
        let service = OrderService::new(
            f.orders.clone(),
            Arc::new(MockCatalog { movies: Vec::new() }),
            f.carts.clone(),
            f.resolver.clone(),
            "USA",
        )
        .with_enrichment(queue);
        assert_eq!(service.mode(), GeocodeMode::Deferred);

        let saved = service.save_order(new_order(Some("Atlanta"))).await.unwrap();
        assert_eq!(saved.location.coordinate(), None);
        assert_eq!(f.resolver.calls(), 0);

        let handle = worker.spawn();
        drop(service);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        let stored = f.orders.get_order(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.location.coordinate(), Some(Coordinate::new(12.34, 56.78)));
    }

    /// Answers per city after a delay, like a slow provider.
    struct SlowResolver;

    #[async_trait]
    impl GeoResolver for SlowResolver {
        async fn resolve(&self, query: &LocationQuery) -> Option<Coordinate> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            match query.city.as_str() {
                "Atlanta" => Some(Coordinate::new(1.0, 1.0)),
                "Boston" => Some(Coordinate::new(2.0, 2.0)),
                _ => None,
            }
        }
    }

    #[tokio::test]
    async fn test_deferred_edit_during_enrichment_keeps_new_place() {
        let orders = Arc::new(MockOrders::default());
        let resolver: Arc<dyn GeoResolver> = Arc::new(SlowResolver);
        let (worker, queue) = EnrichmentWorker::new(orders.clone(), resolver.clone());
        let handle = worker.spawn();
        let service = OrderService::new(
            orders.clone(),
            Arc::new(MockCatalog { movies: Vec::new() }),
            Arc::new(DashMapCartStore::new()),
            resolver,
            "USA",
        )
        .with_enrichment(queue);

        let saved = service.save_order(new_order(Some("Atlanta"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        service
            .update_location(
                1,
                saved.id,
                LocationForm {
                    city: Some("Boston".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        drop(service);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        let stored = orders.get_order(saved.id).await.unwrap().unwrap();
        assert_eq!(stored.location.city.as_deref(), Some("Boston"));
        assert_eq!(stored.location.coordinate(), Some(Coordinate::new(2.0, 2.0)));
    }

    #[tokio::test]
    async fn test_requeue_pending_after_restart() {
        let f = fixture(Some(Coordinate::new(5.0, 6.0)));
        // written by an earlier process that never got to geocode them
        let first = f.orders.insert_order(new_order(Some("Atlanta"))).await.unwrap();
        let second = f.orders.insert_order(new_order(Some("Boston"))).await.unwrap();
        f.orders.insert_order(new_order(None)).await.unwrap();

        assert_eq!(f.service.requeue_pending().await.unwrap(), 0);

        let (worker, queue) = EnrichmentWorker::new(f.orders.clone(), f.resolver.clone());
        let service = OrderService::new(
            f.orders.clone(),
            Arc::new(MockCatalog { movies: Vec::new() }),
            f.carts.clone(),
            f.resolver.clone(),
            "USA",
        )
        .with_enrichment(queue);

        assert_eq!(service.requeue_pending().await.unwrap(), 2);

        let handle = worker.spawn();
        drop(service);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();

        for id in [first.id, second.id] {
            let stored = f.orders.get_order(id).await.unwrap().unwrap();
            assert_eq!(stored.location.coordinate(), Some(Coordinate::new(5.0, 6.0)));
        }
    }

    // ===== Checkout =====

    #[tokio::test]
    async fn test_checkout_creates_order_and_items() {
        let f = fixture(Some(Coordinate::new(1.0, 2.0)));
        f.carts.set_quantity("s", 1, 2).await;
        f.carts.set_quantity("s", 2, 3).await;

        let detail = f
            .service
            .checkout(
                1,
                "s",
                LocationForm {
                    city: Some(" Atlanta ".into()),
                    state: Some("".into()),
                    country: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(detail.order.total, 2 * 10 + 3 * 4);
        assert_eq!(detail.order.location.city.as_deref(), Some("Atlanta"));
        assert_eq!(detail.order.location.state, None);
        assert_eq!(detail.order.location.country, "USA");
        assert_eq!(detail.items.len(), 2);
        assert!(f.carts.get("s").await.is_none());
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let f = fixture(None);

        let result = f.service.checkout(1, "s", LocationForm::default()).await;
        assert!(matches!(result, Err(StoreError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_checkout_ignores_vanished_movies() {
        let f = fixture(None);
        f.carts.set_quantity("s", 1, 1).await;
        f.carts.set_quantity("s", 99, 5).await;

        let detail = f
            .service
            .checkout(1, "s", LocationForm::default())
            .await
            .unwrap();
        assert_eq!(detail.order.total, 10);
        assert_eq!(detail.items.len(), 1);
    }

    // ===== Location Edits =====

    #[tokio::test]
    async fn test_update_location_reresolves_on_change() {
        let f = fixture(Some(Coordinate::new(42.36, -71.06)));
        let mut order = new_order(Some("Atlanta"));
        order.location.set_coordinate(Coordinate::new(33.7, -84.4));
        let saved = f.service.save_order(order).await.unwrap();

        let updated = f
            .service
            .update_location(
                1,
                saved.id,
                LocationForm {
                    city: Some("Boston".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.location.coordinate(), Some(Coordinate::new(42.36, -71.06)));
        assert_eq!(f.resolver.calls(), 1);
    }

    #[tokio::test]
    async fn test_update_location_unchanged_keeps_coordinate() {
        let f = fixture(Some(Coordinate::new(0.0, 0.0)));
        let mut order = new_order(Some("Atlanta"));
        order.location.set_coordinate(Coordinate::new(33.7, -84.4));
        let saved = f.service.save_order(order).await.unwrap();

        let same = f
            .service
            .update_location(
                1,
                saved.id,
                LocationForm {
                    city: Some("Atlanta".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(same.location.coordinate(), Some(Coordinate::new(33.7, -84.4)));
        assert_eq!(f.resolver.calls(), 0);
    }

    #[tokio::test]
    async fn test_update_location_of_other_user() {
        let f = fixture(None);
        let saved = f.service.save_order(new_order(Some("Atlanta"))).await.unwrap();

        let result = f
            .service
            .update_location(2, saved.id, LocationForm::default())
            .await;
        assert!(matches!(result, Err(StoreError::NotFound("order"))));
    }
}
