//! Order Repository Port
//!
//! Storage for orders, their items and the purchase aggregates built on them.

use crate::domain::entities::{
    Item, NewItem, NewOrder, Order, OrderDetail, OrderId, PurchaseLocation, PurchaseRow, UserId,
};
use crate::domain::error::StoreResult;
use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;

/// Repository for purchase records.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Write a new order and return it with its id and date.
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;

    /// Overwrite the mutable fields (total and location) of an order.
    async fn update_order(&self, order: &Order) -> StoreResult<()>;

    /// Get an order by id.
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    /// Set both coordinate columns of an order, but only while its city,
    /// state and country still equal `resolved` and a coordinate side is
    /// missing. Returns false when the row no longer matches.
    async fn set_coordinate(
        &self,
        id: OrderId,
        resolved: &PurchaseLocation,
        coordinate: Coordinate,
    ) -> StoreResult<bool>;

    /// Ids of orders with a city but no complete coordinate, oldest first.
    async fn pending_geocoding(&self) -> StoreResult<Vec<OrderId>>;

    /// Write the lines of an order in one batch.
    async fn insert_items(&self, order_id: OrderId, items: Vec<NewItem>) -> StoreResult<Vec<Item>>;

    /// All orders of a user with their items, newest first.
    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderDetail>>;

    /// Item counts grouped per movie and order location.
    async fn purchase_rows(&self) -> StoreResult<Vec<PurchaseRow>>;
}
