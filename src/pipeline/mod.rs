//! Declarative query pipelines
//!
//! A search request compiles into an ordered list of typed [`Stage`]s.
//! Stages stay store-agnostic until [`Pipeline::to_native`] renders them
//! in the document store's aggregation syntax.

mod compiler;
mod native;
mod stage;

pub use compiler::QueryCompiler;
pub use stage::*;

/// Document field paths the compiled pipelines refer to
pub mod fields {
    /// Provider key, also the sort tie-breaker
    pub const PROVIDER_KEY: &str = "ues_enterprise_provider_id";
    /// Document id, the provider key on records without an enterprise id
    pub const DOCUMENT_ID: &str = "_id";
    /// Accepted CPT entries (`{code, weight}`)
    pub const ACCEPTED_CPTS: &str = "associated_cpts";
    pub const CPT_CODE: &str = "code";
    pub const CPT_WEIGHT: &str = "weight";
    /// GeoJSON point of each practice address
    pub const ADDRESS_GEO: &str = "addresses.geoCode";
    pub const NETWORK_ID: &str = "networkID";
    pub const PLAN_NAME: &str = "plan_name";

    /// Computed: normalized full-text relevance
    pub const SEARCH_SCORE: &str = "search_score";
    /// Computed: weighted CPT overlap
    pub const CPT_OVERLAP: &str = "cpt_overlap";
    /// Computed: blended ranking score
    pub const RELEVANCE_SCORE: &str = "relevance_score";
    /// Computed: provider key used as the ranking tie-break
    pub const SORT_KEY: &str = "provider_key";

    /// Dotted path to the code of an accepted CPT entry
    pub fn cpt_code_path() -> String {
        format!("{}.{}", ACCEPTED_CPTS, CPT_CODE)
    }
}
