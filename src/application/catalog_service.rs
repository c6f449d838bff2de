//! Catalog Service - movies, reviews and the session cart

use crate::domain::entities::{Movie, MovieId, Review, ReviewId, UserId};
use crate::domain::error::{StoreError, StoreResult};
use crate::domain::ports::{CartStore, CatalogRepository};
use serde::Serialize;
use std::sync::Arc;

/// A movie page: the movie and what people wrote about it.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    pub movie: Movie,
    pub reviews: Vec<Review>,
}

/// One cart line priced against the current catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub movie: Movie,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: i64,
}

pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
    carts: Arc<dyn CartStore>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepository>, carts: Arc<dyn CartStore>) -> Self {
        Self { catalog, carts }
    }

    pub async fn list_movies(&self, search: Option<&str>) -> StoreResult<Vec<Movie>> {
        self.catalog.list_movies(search).await
    }

    pub async fn movie_detail(&self, id: MovieId) -> StoreResult<MovieDetail> {
        let movie = self
            .catalog
            .get_movie(id)
            .await?
            .ok_or(StoreError::NotFound("movie"))?;
        let reviews = self.catalog.reviews_for_movie(id).await?;
        Ok(MovieDetail { movie, reviews })
    }

    // ===== Reviews =====

    /// Post a review. A blank comment is ignored and yields `None`.
    pub async fn add_review(
        &self,
        movie_id: MovieId,
        user_id: UserId,
        comment: &str,
    ) -> StoreResult<Option<Review>> {
        if self.catalog.get_movie(movie_id).await?.is_none() {
            return Err(StoreError::NotFound("movie"));
        }
        let comment = comment.trim();
        if comment.is_empty() {
            return Ok(None);
        }
        let review = self.catalog.insert_review(movie_id, user_id, comment).await?;
        tracing::debug!("review {} added to movie {} by user {}", review.id, movie_id, user_id);
        Ok(Some(review))
    }

    async fn review_of(&self, movie_id: MovieId, review_id: ReviewId) -> StoreResult<Review> {
        self.catalog
            .get_review(review_id)
            .await?
            .filter(|r| r.movie_id == movie_id)
            .ok_or(StoreError::NotFound("review"))
    }

    /// Edit a review. Only its author may; a blank comment leaves it as is.
    pub async fn edit_review(
        &self,
        movie_id: MovieId,
        review_id: ReviewId,
        user_id: UserId,
        comment: &str,
    ) -> StoreResult<Review> {
        let mut review = self.review_of(movie_id, review_id).await?;
        if review.user_id != user_id {
            return Err(StoreError::Forbidden("only the author can edit a review"));
        }

        let comment = comment.trim();
        if comment.is_empty() {
            return Ok(review);
        }

        self.catalog.update_review(review_id, comment).await?;
        review.comment = comment.to_string();
        Ok(review)
    }

    /// Delete a review written by `user_id`.
    ///
    /// Reviews of other users are reported as missing.
    pub async fn delete_review(
        &self,
        movie_id: MovieId,
        review_id: ReviewId,
        user_id: UserId,
    ) -> StoreResult<()> {
        let review = self.review_of(movie_id, review_id).await?;
        if review.user_id != user_id || !self.catalog.delete_review(review_id).await? {
            return Err(StoreError::NotFound("review"));
        }
        Ok(())
    }

    // ===== Cart =====

    pub async fn cart(&self, session: &str) -> StoreResult<CartView> {
        let Some(cart) = self.carts.get(session).await else {
            return Ok(CartView::default());
        };

        let movies = self.catalog.movies_by_ids(&cart.movie_ids()).await?;
        let total = cart.total(&movies);
        let lines = movies
            .into_iter()
            .map(|movie| CartLine {
                quantity: cart.quantity(movie.id),
                movie,
            })
            .collect();

        Ok(CartView { lines, total })
    }

    /// Put `quantity` copies of a movie in the cart, replacing any previous count.
    pub async fn add_to_cart(
        &self,
        session: &str,
        movie_id: MovieId,
        quantity: u32,
    ) -> StoreResult<CartView> {
        if self.catalog.get_movie(movie_id).await?.is_none() {
            return Err(StoreError::NotFound("movie"));
        }
        self.carts.set_quantity(session, movie_id, quantity).await;
        self.cart(session).await
    }

    pub async fn clear_cart(&self, session: &str) {
        self.carts.clear(session).await;
    }
}
