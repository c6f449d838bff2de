//! SQLite Store
//!
//! One SQLite connection shared by all repositories. Every statement runs on
//! the blocking pool so request handlers never block the runtime.
//!
//! The repository trait implementations live in the `sqlite_*_repo` modules.

use crate::domain::entities::{Movie, MovieId};
use crate::domain::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id       INTEGER PRIMARY KEY,
    username TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS movies (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    price       INTEGER NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    image       TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS reviews (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    comment  TEXT NOT NULL,
    date     TEXT NOT NULL,
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE,
    user_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS orders (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    total     INTEGER NOT NULL,
    date      TEXT NOT NULL,
    user_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    city      TEXT,
    state     TEXT,
    country   TEXT NOT NULL DEFAULT 'USA',
    latitude  REAL,
    longitude REAL
);

CREATE TABLE IF NOT EXISTS items (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    price    INTEGER NOT NULL,
    quantity INTEGER NOT NULL,
    order_id INTEGER NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
    movie_id INTEGER NOT NULL REFERENCES movies(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS petitions (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    movie_name TEXT NOT NULL,
    created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS petition_stances (
    petition_id INTEGER NOT NULL REFERENCES petitions(id) ON DELETE CASCADE,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    stance      TEXT NOT NULL CHECK (stance IN ('vote', 'dislike')),
    PRIMARY KEY (petition_id, user_id)
);

CREATE INDEX IF NOT EXISTS idx_reviews_movie ON reviews(movie_id);
CREATE INDEX IF NOT EXISTS idx_orders_user ON orders(user_id);
CREATE INDEX IF NOT EXISTS idx_items_order ON items(order_id);
";

/// Catalog inserted into an empty database.
const SEED_MOVIES: &[(&str, i64, &str)] = &[
    ("Inception", 12, "A thief who steals corporate secrets through dream-sharing technology."),
    ("Avatar", 13, "A paraplegic marine dispatched to the moon Pandora."),
    ("The Dark Knight", 11, "Batman faces the Joker in Gotham City."),
    ("Titanic", 9, "A romance aboard the ill-fated maiden voyage of the Titanic."),
    ("Spirited Away", 10, "A girl wanders into a world ruled by gods and spirits."),
];

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

/// SQLite-backed store for users, movies, reviews, orders and petitions.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    pub(crate) async fn call<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Storage(format!("blocking task failed: {}", e)))?
        .map_err(StoreError::from)
    }

    /// Add a movie to the catalog.
    pub async fn insert_movie(
        &self,
        name: &str,
        price: i64,
        description: &str,
    ) -> StoreResult<Movie> {
        let name = name.to_string();
        let description = description.to_string();
        self.call(move |conn| {
            conn.execute(
                "INSERT INTO movies (name, price, description) VALUES (?1, ?2, ?3)",
                params![name, price, description],
            )?;
            Ok(Movie {
                id: conn.last_insert_rowid(),
                name,
                price,
                description,
                image: String::new(),
            })
        })
        .await
    }

    /// Insert the default catalog when no movie exists yet.
    ///
    /// Returns the number of movies inserted.
    pub async fn seed_movies(&self) -> StoreResult<usize> {
        self.call(|conn| {
            let existing: Option<MovieId> = conn
                .query_row("SELECT id FROM movies LIMIT 1", [], |row| row.get(0))
                .optional()?;
            if existing.is_some() {
                return Ok(0);
            }

            let tx = conn.transaction()?;
            for (name, price, description) in SEED_MOVIES {
                tx.execute(
                    "INSERT INTO movies (name, price, description) VALUES (?1, ?2, ?3)",
                    params![name, price, description],
                )?;
            }
            tx.commit()?;
            Ok(SEED_MOVIES.len())
        })
        .await
    }
}
