//! User Repository Port

use crate::domain::entities::{User, UserId};
use crate::domain::error::StoreResult;
use async_trait::async_trait;

/// Repository for users.
///
/// Deleting a user cascades to their orders, items, reviews and petitions.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user if absent; an existing username is kept.
    async fn ensure_user(&self, user: &User) -> StoreResult<()>;

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;

    /// Returns false when the user did not exist.
    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;
}
