//! Library exports for authclient, shared between the binary and tests.

pub mod auth;
pub mod classifier;
pub mod config;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod transport;
pub mod utils;

pub use pipeline::ApiClient;
