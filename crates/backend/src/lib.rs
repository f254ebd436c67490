//! Client for the hosted backend-as-a-service.
//!
//! Covers the REST data API (tables and row filters), the auth API with a
//! retrying session manager, object storage, typed repositories over each
//! table, and the two-phase generation history loader.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod models;
pub mod repositories;
pub mod session;
pub mod storage;
pub mod store;

pub use client::BackendClient;
pub use config::BackendConfig;
pub use error::BackendError;
