//! Provider and plan search
//!
//! Validated request models and the service that compiles them into
//! pipelines, runs them against a document store and maps the results.

mod models;
mod service;

pub use models::*;
pub use service::{SearchService, ServiceConfig};
