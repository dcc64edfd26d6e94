//! Address to coordinate lookups for `add_building`.

mod client;
mod models;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppResult;

pub use client::NominatimClient;
pub use models::NominatimPlace;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Stored when an address cannot be resolved.
    pub const SENTINEL: Self = Self { lat: 0.0, lng: 0.0 };
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a free-form postal address.
    ///
    /// `Ok(None)` means the provider answered but knows no such address;
    /// `Err(AppError::GeocodeUnavailable)` means it could not be asked.
    async fn geocode(&self, address: &str) -> AppResult<Option<Coordinate>>;
}
