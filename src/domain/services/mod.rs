mod rating_map;

pub use rating_map::{
    LocationBucket, MovieCount, MovieLocation, MovieSummary, RatingMap, RatingMapBuilder,
};
