//! DashMap Cart Store
//!
//! Implements CartStore using DashMap for lock-free concurrent access.

use crate::domain::entities::{Cart, MovieId};
use crate::domain::ports::CartStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// DashMap-backed session carts.
///
/// Carts are keyed by session id and expire after a period of inactivity.
pub struct DashMapCartStore {
    carts: DashMap<String, Cart>,
}

impl DashMapCartStore {
    pub fn new() -> Self {
        Self {
            carts: DashMap::new(),
        }
    }

    /// Start the background garbage collection task.
    ///
    /// Removes carts that have not been touched within the TTL.
    pub fn start_gc(self: &Arc<Self>, ttl: Duration, interval: Duration) {
        let store = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let removed = store.cleanup_expired(ttl).await;
                if removed > 0 {
                    tracing::debug!(
                        "cart GC removed {} idle carts, {} left",
                        removed,
                        store.count().await
                    );
                }
            }
        });
    }
}

impl Default for DashMapCartStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CartStore for DashMapCartStore {
    async fn get(&self, session: &str) -> Option<Cart> {
        self.carts.get_mut(session).map(|mut entry| {
            entry.touch();
            entry.value().clone()
        })
    }

    async fn set_quantity(&self, session: &str, movie_id: MovieId, quantity: u32) {
        self.carts
            .entry(session.to_string())
            .or_default()
            .set_quantity(movie_id, quantity);
    }

    async fn clear(&self, session: &str) {
        self.carts.remove(session);
    }

    async fn cleanup_expired(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let before = self.carts.len();
        self.carts
            .retain(|_, cart| now.duration_since(cart.last_seen) <= ttl);
        before.saturating_sub(self.carts.len())
    }

    async fn count(&self) -> usize {
        self.carts.len()
    }
}
