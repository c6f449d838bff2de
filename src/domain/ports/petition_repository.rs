//! Petition Repository Port

use crate::domain::entities::{Petition, PetitionId, Stance, UserId};
use crate::domain::error::StoreResult;
use async_trait::async_trait;

/// Repository for movie petitions and the votes cast on them.
///
/// A user holds at most one stance per petition.
#[async_trait]
pub trait PetitionRepository: Send + Sync {
    /// All petitions, newest first.
    async fn list_petitions(&self) -> StoreResult<Vec<Petition>>;

    async fn get_petition(&self, id: PetitionId) -> StoreResult<Option<Petition>>;

    async fn insert_petition(&self, movie_name: &str, created_by: UserId) -> StoreResult<Petition>;

    async fn stance(&self, id: PetitionId, user_id: UserId) -> StoreResult<Option<Stance>>;

    /// Replace the user's stance; `None` withdraws it.
    async fn set_stance(
        &self,
        id: PetitionId,
        user_id: UserId,
        stance: Option<Stance>,
    ) -> StoreResult<()>;
}
