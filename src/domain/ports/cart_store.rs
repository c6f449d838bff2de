//! Cart Store Port
//!
//! Defines the interface for per-session shopping carts.

use crate::domain::entities::{Cart, MovieId};
use async_trait::async_trait;
use std::time::Duration;

/// Session-scoped cart storage.
///
/// Carts live only as long as the session; idle carts are expired.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Get the cart for a session, if one exists.
    async fn get(&self, session: &str) -> Option<Cart>;

    /// Set the quantity of a movie, creating the cart if needed.
    async fn set_quantity(&self, session: &str, movie_id: MovieId, quantity: u32);

    /// Empty the cart of a session.
    async fn clear(&self, session: &str);

    /// Remove all carts that have not been used within the TTL.
    async fn cleanup_expired(&self, ttl: Duration) -> usize;

    /// Get the number of live carts.
    async fn count(&self) -> usize;
}
