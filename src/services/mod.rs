//! External service interactions
//!
//! This module contains services for interacting with external systems:
//! - The ingestion service contracts and their HTTP client
//! - Background execution of service requests
//! - Local flat file loading

pub mod api;
pub mod flat_file;
pub mod http;
pub mod runner;

pub use http::HttpIngestApi;
pub use runner::{Settlement, TransferRunner};
