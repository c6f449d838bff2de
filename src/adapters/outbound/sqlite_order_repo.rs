//! SQLite Order Repository
//!
//! Orders, their items, and the grouped purchase rows behind the rating map.

use crate::adapters::outbound::sqlite_store::SqliteStore;
use crate::domain::entities::{
    Item, NewItem, NewOrder, Order, OrderDetail, OrderId, PurchaseLocation, PurchaseRow, UserId,
};
use crate::domain::error::StoreResult;
use crate::domain::ports::OrderRepository;
use crate::domain::value_objects::Coordinate;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const ORDER_SELECT: &str = "SELECT id, total, date, user_id, city, state, country, latitude, longitude
     FROM orders";

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    Ok(Order {
        id: row.get(0)?,
        total: row.get(1)?,
        date: row.get(2)?,
        user_id: row.get(3)?,
        location: PurchaseLocation {
            city: row.get(4)?,
            state: row.get(5)?,
            country: row.get(6)?,
            latitude: row.get(7)?,
            longitude: row.get(8)?,
        },
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        price: row.get(1)?,
        quantity: row.get(2)?,
        order_id: row.get(3)?,
        movie_id: row.get(4)?,
    })
}

fn items_for_order(conn: &Connection, order_id: OrderId) -> rusqlite::Result<Vec<Item>> {
    let mut stmt = conn.prepare(
        "SELECT id, price, quantity, order_id, movie_id FROM items WHERE order_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![order_id], item_from_row)?;
    rows.collect()
}

#[async_trait]
impl OrderRepository for SqliteStore {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        self.call(move |conn| {
            let date = Utc::now();
            let loc = &order.location;
            conn.execute(
                "INSERT INTO orders (total, date, user_id, city, state, country, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    order.total,
                    date,
                    order.user_id,
                    loc.city,
                    loc.state,
                    loc.country,
                    loc.latitude,
                    loc.longitude
                ],
            )?;
            Ok(Order {
                id: conn.last_insert_rowid(),
                total: order.total,
                date,
                user_id: order.user_id,
                location: order.location,
            })
        })
        .await
    }

    async fn update_order(&self, order: &Order) -> StoreResult<()> {
        let order = order.clone();
        self.call(move |conn| {
            let loc = &order.location;
            conn.execute(
                "UPDATE orders SET total = ?1, city = ?2, state = ?3, country = ?4,
                     latitude = ?5, longitude = ?6
                 WHERE id = ?7",
                params![
                    order.total,
                    loc.city,
                    loc.state,
                    loc.country,
                    loc.latitude,
                    loc.longitude,
                    order.id
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        self.call(move |conn| {
            conn.query_row(
                &format!("{} WHERE id = ?1", ORDER_SELECT),
                params![id],
                order_from_row,
            )
            .optional()
        })
        .await
    }

    async fn set_coordinate(
        &self,
        id: OrderId,
        resolved: &PurchaseLocation,
        coordinate: Coordinate,
    ) -> StoreResult<bool> {
        let city = resolved.city.clone();
        let state = resolved.state.clone();
        let country = resolved.country.clone();
        self.call(move |conn| {
            let changed = conn.execute(
                "UPDATE orders SET latitude = ?1, longitude = ?2
                 WHERE id = ?3 AND city IS ?4 AND state IS ?5 AND country = ?6
                   AND (latitude IS NULL OR longitude IS NULL)",
                params![coordinate.latitude, coordinate.longitude, id, city, state, country],
            )?;
            Ok(changed == 1)
        })
        .await
    }

    async fn pending_geocoding(&self) -> StoreResult<Vec<OrderId>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM orders
                 WHERE TRIM(COALESCE(city, '')) <> ''
                   AND (latitude IS NULL OR longitude IS NULL)
                 ORDER BY id",
            )?;
            let ids = stmt.query_map([], |row| row.get(0))?;
            ids.collect()
        })
        .await
    }

    async fn insert_items(&self, order_id: OrderId, items: Vec<NewItem>) -> StoreResult<Vec<Item>> {
        self.call(move |conn| {
            let tx = conn.transaction()?;
            let mut saved = Vec::with_capacity(items.len());
            {
                let mut stmt = tx.prepare(
                    "INSERT INTO items (price, quantity, order_id, movie_id) VALUES (?1, ?2, ?3, ?4)",
                )?;
                for item in items {
                    stmt.execute(params![item.price, item.quantity, order_id, item.movie_id])?;
                    saved.push(Item {
                        id: tx.last_insert_rowid(),
                        price: item.price,
                        quantity: item.quantity,
                        order_id,
                        movie_id: item.movie_id,
                    });
                }
            }
            tx.commit()?;
            Ok(saved)
        })
        .await
    }

    async fn orders_for_user(&self, user_id: UserId) -> StoreResult<Vec<OrderDetail>> {
        self.call(move |conn| {
            let orders: Vec<Order> = {
                let mut stmt = conn.prepare(&format!(
                    "{} WHERE user_id = ?1 ORDER BY date DESC, id DESC",
                    ORDER_SELECT
                ))?;
                let rows = stmt.query_map(params![user_id], order_from_row)?;
                rows.collect::<rusqlite::Result<_>>()?
            };

            orders
                .into_iter()
                .map(|order| {
                    let items = items_for_order(conn, order.id)?;
                    Ok(OrderDetail { order, items })
                })
                .collect()
        })
        .await
    }

    async fn purchase_rows(&self) -> StoreResult<Vec<PurchaseRow>> {
        self.call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.name, o.city, o.state, o.country, o.latitude, o.longitude,
                        COUNT(i.id)
                 FROM items i
                 JOIN movies m ON m.id = i.movie_id
                 JOIN orders o ON o.id = i.order_id
                 GROUP BY m.id, m.name, o.city, o.state, o.country, o.latitude, o.longitude
                 ORDER BY MIN(i.id)",
            )?;
            let rows = stmt.query_map([], |row| {
                let count: i64 = row.get(7)?;
                Ok(PurchaseRow {
                    movie_id: row.get(0)?,
                    movie_name: row.get(1)?,
                    city: row.get(2)?,
                    state: row.get(3)?,
                    country: row.get(4)?,
                    latitude: row.get(5)?,
                    longitude: row.get(6)?,
                    count: count.max(0) as u64,
                })
            })?;
            rows.collect()
        })
        .await
    }
}
