//! Document store boundary
//!
//! The search service only talks to a [`DocumentStore`]. [`MemoryStore`]
//! evaluates pipelines in-process; [`MongoStore`] (feature `mongodb`) sends
//! them to MongoDB Atlas Search.

mod memory;
#[cfg(feature = "mongodb")]
mod mongo;

pub use memory::MemoryStore;
#[cfg(feature = "mongodb")]
pub use mongo::MongoStore;

use crate::error::StoreError;
use crate::pipeline::Pipeline;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A raw stored document
pub type Document = serde_json::Value;

/// Documents of one result page, pulled lazily
pub type DocumentStream = BoxStream<'static, Result<Document, StoreError>>;

/// One page of aggregation output
pub struct QueryPage {
    /// Matches before skip/limit were applied
    pub total_count: u64,
    pub documents: DocumentStream,
}

impl std::fmt::Debug for QueryPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPage")
            .field("total_count", &self.total_count)
            .finish_non_exhaustive()
    }
}

/// Backend executing compiled pipelines
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name, used in log events
    fn name(&self) -> &str;

    /// Run `pipeline` over `collection` in a single round trip
    async fn aggregate(&self, collection: &str, pipeline: &Pipeline)
        -> Result<QueryPage, StoreError>;

    /// Fetch one provider by key
    async fn find_by_key(&self, collection: &str, key: &str)
        -> Result<Option<Document>, StoreError>;
}
