//! SQLite Catalog and User Repositories
//!
//! Implements `CatalogRepository` and `UserRepository` on top of `SqliteStore`.

use crate::adapters::outbound::sqlite_store::SqliteStore;
use crate::domain::entities::{Movie, MovieId, Review, ReviewId, User, UserId};
use crate::domain::error::StoreResult;
use crate::domain::ports::{CatalogRepository, UserRepository};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

const MOVIE_COLUMNS: &str = "id, name, price, description, image";

const REVIEW_SELECT: &str = "SELECT r.id, r.comment, r.date, r.movie_id, r.user_id, u.username
     FROM reviews r JOIN users u ON u.id = r.user_id";

fn movie_from_row(row: &Row<'_>) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
        description: row.get(3)?,
        image: row.get(4)?,
    })
}

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    Ok(Review {
        id: row.get(0)?,
        comment: row.get(1)?,
        date: row.get(2)?,
        movie_id: row.get(3)?,
        user_id: row.get(4)?,
        username: row.get(5)?,
    })
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn ensure_user(&self, user: &User) -> StoreResult<()> {
        let user = user.clone();
        self.call(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO users (id, username) VALUES (?1, ?2)",
                params![user.id, user.username],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.call(move |conn| {
            conn.query_row(
                "SELECT id, username FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        self.call(move |conn| {
            let deleted = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl CatalogRepository for SqliteStore {
    async fn list_movies(&self, search: Option<&str>) -> StoreResult<Vec<Movie>> {
        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        self.call(move |conn| match search {
            // LIKE is case-insensitive for ASCII in SQLite
            Some(term) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM movies WHERE name LIKE '%' || ?1 || '%' ORDER BY id",
                    MOVIE_COLUMNS
                ))?;
                let rows = stmt.query_map(params![term], movie_from_row)?;
                rows.collect()
            }
            None => {
                let mut stmt =
                    conn.prepare(&format!("SELECT {} FROM movies ORDER BY id", MOVIE_COLUMNS))?;
                let rows = stmt.query_map([], movie_from_row)?;
                rows.collect()
            }
        })
        .await
    }

    async fn get_movie(&self, id: MovieId) -> StoreResult<Option<Movie>> {
        self.call(move |conn| {
            conn.query_row(
                &format!("SELECT {} FROM movies WHERE id = ?1", MOVIE_COLUMNS),
                params![id],
                movie_from_row,
            )
            .optional()
        })
        .await
    }

    async fn movies_by_ids(&self, ids: &[MovieId]) -> StoreResult<Vec<Movie>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();

        self.call(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM movies WHERE id IN ({}) ORDER BY id",
                MOVIE_COLUMNS, placeholders
            ))?;
            let rows = stmt.query_map(params_from_iter(ids.iter()), movie_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn reviews_for_movie(&self, movie_id: MovieId) -> StoreResult<Vec<Review>> {
        self.call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "{} WHERE r.movie_id = ?1 ORDER BY r.date DESC, r.id DESC",
                REVIEW_SELECT
            ))?;
            let rows = stmt.query_map(params![movie_id], review_from_row)?;
            rows.collect()
        })
        .await
    }

    async fn get_review(&self, id: ReviewId) -> StoreResult<Option<Review>> {
        self.call(move |conn| {
            conn.query_row(
                &format!("{} WHERE r.id = ?1", REVIEW_SELECT),
                params![id],
                review_from_row,
            )
            .optional()
        })
        .await
    }

    async fn insert_review(
        &self,
        movie_id: MovieId,
        user_id: UserId,
        comment: &str,
    ) -> StoreResult<Review> {
        let comment = comment.to_string();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO reviews (comment, date, movie_id, user_id) VALUES (?1, ?2, ?3, ?4)",
                params![comment, Utc::now(), movie_id, user_id],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("{} WHERE r.id = ?1", REVIEW_SELECT),
                params![id],
                review_from_row,
            )
        })
        .await
    }

    async fn update_review(&self, id: ReviewId, comment: &str) -> StoreResult<()> {
        let comment = comment.to_string();
        self.call(move |conn| {
            conn.execute(
                "UPDATE reviews SET comment = ?1 WHERE id = ?2",
                params![comment, id],
            )?;
            Ok(())
        })
        .await
    }

    async fn delete_review(&self, id: ReviewId) -> StoreResult<bool> {
        self.call(move |conn| {
            let deleted = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
        .await
    }
}
