//! provider-search: ranked healthcare provider search
//!
//! Search requests compile into typed pipelines that blend full-text
//! relevance, geographic proximity and procedure-code (CPT) coverage into a
//! single ordering. Stored documents of varying shape are normalized into a
//! stable domain model.

pub mod config;
pub mod error;
pub mod geo;
pub mod mapper;
pub mod normalize;
pub mod pipeline;
pub mod results;
pub mod scoring;
pub mod search;
pub mod store;

pub use config::Settings;
pub use error::{MappingError, SearchError, StoreError, ValidationError};
pub use mapper::DocumentMapper;
pub use pipeline::{Pipeline, QueryCompiler};
pub use results::{FindByKeyResult, Provider, ProviderSummary, SearchPlansResult, SearchResult};
pub use scoring::ScoreBlender;
pub use search::{SearchService, ServiceConfig};
pub use store::{DocumentStore, MemoryStore};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
