//! Error types shared across the search pipeline

use thiserror::Error;

/// Rejected search input, raised before any compilation or store access
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Maximum number of CPT codes allowed is {max}, got {actual}")]
    TooManyCptCodes { max: usize, actual: usize },
    #[error("limit must be between 1 and {max}, got {actual}")]
    LimitOutOfRange { max: u32, actual: u32 },
    #[error("radius_in_meters must be a positive number, got {0}")]
    InvalidRadius(f64),
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("provider key must not be blank")]
    BlankKey,
}

/// A store document that could not be turned into a domain entity
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("document is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("document has an unexpected shape: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failure reported by the document store
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(feature = "mongodb")]
impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::with_source(format!("mongodb: {}", err), err)
    }
}

/// Top-level error returned by [`crate::SearchService`]
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("mapping failed: {0}")]
    Mapping(#[from] MappingError),
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}
