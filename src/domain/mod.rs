//! Domain Layer
//!
//! Entities, value objects, ports and pure domain services.

pub mod entities;
pub mod error;
pub mod ports;
pub mod services;
pub mod value_objects;
