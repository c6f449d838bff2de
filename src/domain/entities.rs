//! Domain Entities - Core business objects
//!
//! These entities represent the core concepts of the storefront domain.
//! They have no external dependencies and contain only business logic.

use crate::domain::value_objects::{Coordinate, LocationQuery};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

pub type UserId = i64;
pub type MovieId = i64;
pub type OrderId = i64;
pub type ReviewId = i64;
pub type PetitionId = i64;

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// A movie offered in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub name: String,
    /// Price in whole currency units
    pub price: i64,
    pub description: String,
    pub image: String,
}

/// A user's comment on a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub comment: String,
    pub date: DateTime<Utc>,
    pub movie_id: MovieId,
    pub user_id: UserId,
    pub username: String,
}

/// Where a purchase was made.
///
/// Latitude and longitude are kept as separate options because the
/// persistence hook has to tell "one side missing" apart from "both set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PurchaseLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PurchaseLocation {
    pub fn new(city: Option<String>, state: Option<String>, country: String) -> Self {
        Self {
            city,
            state,
            country,
            latitude: None,
            longitude: None,
        }
    }

    fn has_city(&self) -> bool {
        self.city
            .as_deref()
            .map(|c| !c.trim().is_empty())
            .unwrap_or(false)
    }

    /// Geocoding runs only when a coordinate side is missing and a city is known.
    pub fn needs_geocoding(&self) -> bool {
        (self.latitude.is_none() || self.longitude.is_none()) && self.has_city()
    }

    /// The query handed to the resolver.
    pub fn query(&self) -> LocationQuery {
        LocationQuery {
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone(),
            country: Some(self.country.clone()),
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }

    /// Overwrite both sides at once.
    pub fn set_coordinate(&mut self, coordinate: Coordinate) {
        self.latitude = Some(coordinate.latitude);
        self.longitude = Some(coordinate.longitude);
    }

    /// True when city, state or country differ from `other`.
    pub fn place_differs(&self, other: &PurchaseLocation) -> bool {
        self.city != other.city || self.state != other.state || self.country != other.country
    }
}

/// An order that has not been written yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub total: i64,
    pub user_id: UserId,
    pub location: PurchaseLocation,
}

/// A persisted purchase record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub total: i64,
    pub date: DateTime<Utc>,
    pub user_id: UserId,
    pub location: PurchaseLocation,
}

/// One cart line about to be written for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub price: i64,
    pub quantity: u32,
    pub movie_id: MovieId,
}

/// A persisted order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub price: i64,
    pub quantity: u32,
    pub order_id: OrderId,
    pub movie_id: MovieId,
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<Item>,
}

/// A request for the store to carry a movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Petition {
    pub id: PetitionId,
    pub movie_name: String,
    pub created_by: UserId,
    pub created_by_name: String,
    pub created_at: DateTime<Utc>,
    pub vote_count: usize,
    pub dislike_count: usize,
}

/// A user's stance on a petition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Vote,
    Dislike,
}

/// Purchases of one movie at one order location.
///
/// Produced by the order repository as input to the rating map.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRow {
    pub movie_id: MovieId,
    pub movie_name: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Number of order lines
    pub count: u64,
}

/// Per-session shopping cart.
#[derive(Debug, Clone)]
pub struct Cart {
    /// movie id -> quantity
    pub lines: BTreeMap<MovieId, u32>,
    /// Last time the cart was read or written
    pub last_seen: Instant,
}

impl Cart {
    pub fn new() -> Self {
        Self {
            lines: BTreeMap::new(),
            last_seen: Instant::now(),
        }
    }

    pub fn set_quantity(&mut self, movie_id: MovieId, quantity: u32) {
        self.lines.insert(movie_id, quantity);
        self.touch();
    }

    pub fn movie_ids(&self) -> Vec<MovieId> {
        self.lines.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn quantity(&self, movie_id: MovieId) -> u32 {
        self.lines.get(&movie_id).copied().unwrap_or(0)
    }

    /// Sum of price * quantity over the given movies.
    ///
    /// Movies that are not in the cart contribute nothing.
    pub fn total(&self, movies: &[Movie]) -> i64 {
        movies
            .iter()
            .map(|m| m.price * i64::from(self.quantity(m.id)))
            .sum()
    }

    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}
