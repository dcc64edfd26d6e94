use moka::future::Cache;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::geocoding::Geocoder;
use crate::operations::Dispatcher;

/// Serialized JSON bodies of full-log reads, keyed by endpoint.
/// Weighted by byte size to enforce memory limit.
pub type ResponseCache = Cache<String, Arc<Vec<u8>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
    pub response_cache: ResponseCache,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config, geocoder: Arc<dyn Geocoder>) -> Self {
        let cache: ResponseCache = Cache::builder()
            .weigher(|_key: &String, value: &Arc<Vec<u8>>| -> u32 {
                value.len().try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(config.cache_max_bytes)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
            .build();

        let dispatcher = Dispatcher::new(db.clone(), geocoder, config.removal_policy)
            .with_geocode_timeout(Duration::from_secs(config.geocoder_timeout_seconds));

        Self {
            db,
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            response_cache: cache,
        }
    }
}
