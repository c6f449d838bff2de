//! Rating Map Service
//!
//! Pure domain logic for folding purchase rows into map buckets.
//! This service has NO external dependencies - it's pure Rust.

use crate::domain::entities::{MovieId, PurchaseRow};
use crate::domain::value_objects::Coordinate;
use serde::Serialize;
use std::collections::HashMap;

/// Purchases of one movie inside a location bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieCount {
    pub id: MovieId,
    pub name: String,
    pub count: u64,
}

/// All purchases made at one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationBucket {
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub movies: Vec<MovieCount>,
    pub total_purchases: u64,
}

/// Where one movie was bought.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieLocation {
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: u64,
}

/// Purchase totals for one movie across all locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: MovieId,
    pub name: String,
    pub total_purchases: u64,
    pub locations: Vec<MovieLocation>,
}

/// Data behind the purchase map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingMap {
    pub locations: Vec<LocationBucket>,
    pub movies: Vec<MovieSummary>,
}

/// Aggregates purchase rows by coordinate and by movie.
pub struct RatingMapBuilder;

impl RatingMapBuilder {
    /// Build the map from grouped purchase rows.
    ///
    /// Rows without a full coordinate are skipped. Locations keep first-seen
    /// order; movies are sorted by total purchases, highest first.
    pub fn build(rows: &[PurchaseRow]) -> RatingMap {
        let mut locations: Vec<LocationBucket> = Vec::new();
        let mut location_index: HashMap<String, usize> = HashMap::new();
        let mut movies: Vec<MovieSummary> = Vec::new();
        let mut movie_index: HashMap<MovieId, usize> = HashMap::new();

        for row in rows {
            let Some(coordinate) = Coordinate::from_parts(row.latitude, row.longitude) else {
                continue;
            };

            let idx = *location_index.entry(coordinate.key()).or_insert_with(|| {
                locations.push(LocationBucket {
                    latitude: coordinate.latitude,
                    longitude: coordinate.longitude,
                    city: row.city.clone(),
                    state: row.state.clone(),
                    country: row.country.clone(),
                    movies: Vec::new(),
                    total_purchases: 0,
                });
                locations.len() - 1
            });
            let bucket = &mut locations[idx];
            bucket.movies.push(MovieCount {
                id: row.movie_id,
                name: row.movie_name.clone(),
                count: row.count,
            });
            bucket.total_purchases += row.count;

            let idx = *movie_index.entry(row.movie_id).or_insert_with(|| {
                movies.push(MovieSummary {
                    id: row.movie_id,
                    name: row.movie_name.clone(),
                    total_purchases: 0,
                    locations: Vec::new(),
                });
                movies.len() - 1
            });
            let summary = &mut movies[idx];
            summary.total_purchases += row.count;
            summary.locations.push(MovieLocation {
                city: row.city.clone(),
                state: row.state.clone(),
                country: row.country.clone(),
                latitude: coordinate.latitude,
                longitude: coordinate.longitude,
                count: row.count,
            });
        }

        // stable sort keeps first-seen order among ties
        movies.sort_by(|a, b| b.total_purchases.cmp(&a.total_purchases));

        RatingMap { locations, movies }
    }
}
