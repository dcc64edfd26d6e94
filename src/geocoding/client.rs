use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::geocoding::models::NominatimPlace;
use crate::geocoding::{Coordinate, Geocoder};

pub struct NominatimClient {
    http_client: Client,
    base_url: String,
}

impl NominatimClient {
    /// Build a client for the configured Nominatim-compatible provider.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .user_agent(config.geocoder_user_agent.clone())
            .timeout(Duration::from_secs(config.geocoder_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.geocoder_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn search(&self, address: &str) -> AppResult<Vec<NominatimPlace>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::GeocodeUnavailable(format!("Request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::GeocodeUnavailable("Rate limited (429)".to_string()));
        }

        if !response.status().is_success() {
            return Err(AppError::GeocodeUnavailable(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::GeocodeUnavailable(format!("Failed to parse response: {e}")))
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, address: &str) -> AppResult<Option<Coordinate>> {
        let places = self.search(address).await?;

        let Some(place) = places.into_iter().next() else {
            tracing::debug!(address, "Geocoder returned no match");
            return Ok(None);
        };

        let lat = place.lat.parse::<f64>();
        let lng = place.lon.parse::<f64>();
        match (lat, lng) {
            (Ok(lat), Ok(lng)) => Ok(Some(Coordinate { lat, lng })),
            _ => Err(AppError::GeocodeUnavailable(format!(
                "Unparseable coordinate ({}, {})",
                place.lat, place.lon
            ))),
        }
    }
}
