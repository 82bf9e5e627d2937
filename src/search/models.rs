//! Search request models
//!
//! `*Params` types carry raw caller input (flat values, comma-joined
//! lists). Converting them into the matching `*Input` type normalizes and
//! then validates, so a constructed input always satisfies its bounds.

use crate::error::ValidationError;
use crate::geo::GeoCode;
use crate::normalize::codes::{expand_comma_list, normalize_cpt_codes};
use serde::{Deserialize, Serialize};

/// Default search radius: 30 miles in meters
pub const DEFAULT_RADIUS_METERS: f64 = 48_280.3;

/// Maximum number of normalized CPT codes per request
pub const MAX_CPT_CODES: usize = 30;

/// Default page size
pub const DEFAULT_LIMIT: u32 = 10;

/// Maximum page size
pub const MAX_LIMIT: u32 = 20;

/// Search origin and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    origin: Option<GeoCode>,
    radius_in_meters: f64,
}

impl Location {
    fn new(
        lat: Option<f64>,
        lng: Option<f64>,
        radius_in_meters: Option<f64>,
    ) -> Result<Self, ValidationError> {
        let radius_in_meters = radius_in_meters.unwrap_or(DEFAULT_RADIUS_METERS);
        if !radius_in_meters.is_finite() || radius_in_meters <= 0.0 {
            return Err(ValidationError::InvalidRadius(radius_in_meters));
        }

        // An origin needs both halves of the pair
        let origin = match (lat, lng) {
            (Some(lat), Some(lng)) => {
                let point = GeoCode::new(lat, lng);
                if !point.is_valid() {
                    return Err(ValidationError::InvalidCoordinate(format!(
                        "lat={}, lng={}",
                        lat, lng
                    )));
                }
                Some(point)
            }
            _ => None,
        };

        Ok(Self {
            origin,
            radius_in_meters,
        })
    }

    pub fn origin(&self) -> Option<&GeoCode> {
        self.origin.as_ref()
    }

    pub fn radius_in_meters(&self) -> f64 {
        self.radius_in_meters
    }
}

fn validate_cpt_codes(raw: &[String]) -> Result<Vec<String>, ValidationError> {
    let codes = normalize_cpt_codes(raw);
    if codes.len() > MAX_CPT_CODES {
        return Err(ValidationError::TooManyCptCodes {
            max: MAX_CPT_CODES,
            actual: codes.len(),
        });
    }
    Ok(codes)
}

fn validate_limit(limit: Option<u32>) -> Result<u32, ValidationError> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ValidationError::LimitOutOfRange {
            max: MAX_LIMIT,
            actual: limit,
        });
    }
    Ok(limit)
}

/// Raw provider search parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_in_meters: Option<f64>,
    pub cpt_codes: Vec<String>,
    pub network_ids: Vec<String>,
    pub skip: u64,
    pub limit: Option<u32>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set search origin
    pub fn with_origin(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    /// Set radius in meters
    pub fn with_radius(mut self, meters: f64) -> Self {
        self.radius_in_meters = Some(meters);
        self
    }

    /// Add CPT code entries (each may be comma-joined)
    pub fn with_cpt_codes<S: Into<String>>(mut self, codes: impl IntoIterator<Item = S>) -> Self {
        self.cpt_codes.extend(codes.into_iter().map(Into::into));
        self
    }

    /// Add network id entries (each may be comma-joined)
    pub fn with_network_ids<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.network_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Set pagination
    pub fn with_page(mut self, skip: u64, limit: u32) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }
}

/// Validated provider search input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchInput {
    #[serde(flatten)]
    location: Location,
    cpt_codes: Vec<String>,
    network_ids: Vec<String>,
    skip: u64,
    limit: u32,
}

impl SearchInput {
    pub fn new(params: SearchParams) -> Result<Self, ValidationError> {
        let cpt_codes = validate_cpt_codes(&params.cpt_codes)?;
        let network_ids = expand_comma_list(&params.network_ids);
        let limit = validate_limit(params.limit)?;
        let location = Location::new(params.lat, params.lng, params.radius_in_meters)?;

        Ok(Self {
            location,
            cpt_codes,
            network_ids,
            skip: params.skip,
            limit,
        })
    }

    pub fn origin(&self) -> Option<&GeoCode> {
        self.location.origin()
    }

    pub fn radius_in_meters(&self) -> f64 {
        self.location.radius_in_meters()
    }

    /// Normalized, upper-cased CPT codes
    pub fn cpt_codes(&self) -> &[String] {
        &self.cpt_codes
    }

    /// Normalized network ids
    pub fn network_ids(&self) -> &[String] {
        &self.network_ids
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl TryFrom<SearchParams> for SearchInput {
    type Error = ValidationError;

    fn try_from(params: SearchParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

/// Raw provider detail parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FindDetailParams {
    pub key: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_in_meters: Option<f64>,
    pub cpt_codes: Vec<String>,
    pub network_ids: Vec<String>,
}

impl FindDetailParams {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn with_origin(mut self, lat: f64, lng: f64) -> Self {
        self.lat = Some(lat);
        self.lng = Some(lng);
        self
    }

    pub fn with_cpt_codes<S: Into<String>>(mut self, codes: impl IntoIterator<Item = S>) -> Self {
        self.cpt_codes.extend(codes.into_iter().map(Into::into));
        self
    }

    pub fn with_network_ids<S: Into<String>>(mut self, ids: impl IntoIterator<Item = S>) -> Self {
        self.network_ids.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Validated provider detail input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindDetailInput {
    key: String,
    #[serde(flatten)]
    location: Location,
    cpt_codes: Vec<String>,
    network_ids: Vec<String>,
}

impl FindDetailInput {
    pub fn new(params: FindDetailParams) -> Result<Self, ValidationError> {
        let key = params.key.trim().to_string();
        if key.is_empty() {
            return Err(ValidationError::BlankKey);
        }

        Ok(Self {
            key,
            cpt_codes: validate_cpt_codes(&params.cpt_codes)?,
            network_ids: expand_comma_list(&params.network_ids),
            location: Location::new(params.lat, params.lng, params.radius_in_meters)?,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn origin(&self) -> Option<&GeoCode> {
        self.location.origin()
    }

    pub fn radius_in_meters(&self) -> f64 {
        self.location.radius_in_meters()
    }

    pub fn cpt_codes(&self) -> &[String] {
        &self.cpt_codes
    }

    pub fn network_ids(&self) -> &[String] {
        &self.network_ids
    }
}

impl TryFrom<FindDetailParams> for FindDetailInput {
    type Error = ValidationError;

    fn try_from(params: FindDetailParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}

/// Raw plan search parameters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SearchPlansParams {
    pub query: Option<String>,
    pub skip: u64,
    pub limit: Option<u32>,
}

/// Validated plan search input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPlansInput {
    query: Option<String>,
    skip: u64,
    limit: u32,
}

impl SearchPlansInput {
    pub fn new(params: SearchPlansParams) -> Result<Self, ValidationError> {
        Ok(Self {
            query: params
                .query
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty()),
            skip: params.skip,
            limit: validate_limit(params.limit)?,
        })
    }

    /// Free-text query, present only when non-blank
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn is_query_provided(&self) -> bool {
        self.query.is_some()
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

impl TryFrom<SearchPlansParams> for SearchPlansInput {
    type Error = ValidationError;

    fn try_from(params: SearchPlansParams) -> Result<Self, Self::Error> {
        Self::new(params)
    }
}
