//! GreenBuilding - building, cluster and sensor hierarchy management
//!
//! This library exposes the core modules for testing and reuse.

pub mod access;
pub mod common;
pub mod config;
pub mod entity;
pub mod error;
pub mod geocoding;
pub mod integrity;
pub mod operations;
pub mod query;
pub mod routes;
pub mod store;
