//! Catalog Repository Port
//!
//! Movies and the reviews written about them.

use crate::domain::entities::{Movie, MovieId, Review, ReviewId, UserId};
use crate::domain::error::StoreResult;
use async_trait::async_trait;

/// Repository for the movie catalog and reviews.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// All movies, or those whose name contains `search` (case-insensitive).
    async fn list_movies(&self, search: Option<&str>) -> StoreResult<Vec<Movie>>;

    async fn get_movie(&self, id: MovieId) -> StoreResult<Option<Movie>>;

    /// Movies with the given ids; unknown ids are skipped.
    async fn movies_by_ids(&self, ids: &[MovieId]) -> StoreResult<Vec<Movie>>;

    async fn reviews_for_movie(&self, movie_id: MovieId) -> StoreResult<Vec<Review>>;

    async fn get_review(&self, id: ReviewId) -> StoreResult<Option<Review>>;

    async fn insert_review(
        &self,
        movie_id: MovieId,
        user_id: UserId,
        comment: &str,
    ) -> StoreResult<Review>;

    async fn update_review(&self, id: ReviewId, comment: &str) -> StoreResult<()>;

    /// Returns false when nothing was deleted.
    async fn delete_review(&self, id: ReviewId) -> StoreResult<bool>;
}
