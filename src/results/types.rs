//! Entity type definitions

use crate::geo::GeoCode;
use crate::search::FindDetailInput;
use serde::{Deserialize, Serialize};

/// A coded value with an optional human-readable description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    pub code: String,
    pub description: Option<String>,
}

impl Code {
    pub fn new(code: impl Into<String>, description: Option<String>) -> Self {
        Self {
            code: code.into(),
            description,
        }
    }
}

/// A phone number attached to an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    /// Free text kind, e.g. "phone" or "fax"
    #[serde(rename = "type")]
    pub phone_type: Option<String>,
    pub number: Option<String>,
    /// Accuracy confidence in `0.0..=1.0`
    pub confidence: f64,
}

impl Phone {
    /// Whether this is a voice line rather than fax or other
    pub fn is_voice(&self) -> bool {
        self.phone_type
            .as_deref()
            .map(|t| t.trim().eq_ignore_ascii_case("phone"))
            .unwrap_or(false)
    }
}

/// A practice location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub display_address: String,
    pub geo_code: Option<GeoCode>,
    pub phone: Vec<Phone>,
    /// Distance from the request origin
    pub distance_in_miles: Option<f64>,
}

/// A state license held by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    pub number: Option<String>,
    pub state: Option<String>,
    /// Effective date, YYYY-MM-DD
    pub eff_dt: Option<String>,
    /// Expiration date, YYYY-MM-DD
    pub exp_dt: Option<String>,
    pub voided: bool,
}

/// A procedure code a provider has billed, with its relevance weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CptInfo {
    pub code: String,
    pub weight: f64,
    /// First claim date, YYYYMMDD
    pub claim_service_start_date: Option<i64>,
}

/// Full provider record, returned by key lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub key: String,
    pub npi: String,
    pub full_name: String,
    pub gender: Option<String>,
    pub addresses: Vec<Address>,
    pub primary_specialty: Option<Code>,
    pub taxonomy_code: Vec<Code>,
    pub languages: Vec<Code>,
    pub license: Vec<License>,
    pub accept_new_patients: bool,
    pub accepted_cpts: Vec<CptInfo>,
}

/// Condensed provider record, returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub key: String,
    pub name: String,
    pub npi: String,
    pub closest_address: Option<Address>,
    pub accept_new_patients: bool,
    /// Deep link back into the detail lookup for this provider
    pub web_url: String,
    pub distance_in_miles: Option<f64>,
    pub primary_specialty: Option<Code>,
}

/// An insurance plan and the networks it covers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub plan_name: String,
    pub pes_network_ids: Vec<String>,
    /// Effective date as YYYYMMDD, e.g. 20251110
    pub eff_dt: Option<u32>,
    /// Expiration date as YYYYMMDD
    pub exp_dt: Option<u32>,
}

/// A page of provider search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub paginated_data: Vec<ProviderSummary>,
    /// Matches before pagination
    pub total_count: u64,
}

impl SearchResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.paginated_data.is_empty()
    }
}

/// A page of plan search results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPlansResult {
    pub paginated_data: Vec<Plan>,
    pub total_count: u64,
}

/// Outcome of a key lookup, with the context it was resolved in
#[derive(Debug, Clone, Serialize)]
pub struct FindByKeyResult {
    pub data: Option<Provider>,
    pub input_param: FindDetailInput,
}

impl FindByKeyResult {
    pub fn is_found(&self) -> bool {
        self.data.is_some()
    }
}
