//! Store document to domain entity mapping

use crate::error::MappingError;
use crate::geo::{self, GeoCode};
use crate::normalize::address::RawAddress;
use crate::normalize::plan::RawPlan;
use crate::normalize::provider::RawProvider;
use crate::results::{Plan, Provider, ProviderSummary};
use crate::search::SearchInput;
use crate::store::Document;
use url::Url;

/// Maps raw store documents to [`Provider`], [`ProviderSummary`] and [`Plan`]
#[derive(Debug, Clone)]
pub struct DocumentMapper {
    base_url: Url,
}

impl DocumentMapper {
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
        })
    }

    /// Full provider record; distances are measured from `origin` when given
    pub fn to_provider(
        &self,
        doc: &Document,
        origin: Option<&GeoCode>,
    ) -> Result<Provider, MappingError> {
        let mut raw = RawProvider::decode(doc)?;

        Ok(Provider {
            key: raw.key()?,
            npi: raw.npi()?,
            full_name: raw.display_name()?,
            gender: raw.gender(),
            primary_specialty: raw.primary_specialty(),
            taxonomy_code: raw.taxonomy_codes(),
            languages: raw.languages(),
            license: raw.licenses(),
            accept_new_patients: raw.accept_new_patients(),
            accepted_cpts: raw.accepted_cpts(),
            addresses: raw
                .take_addresses()
                .into_iter()
                .map(|a| a.into_address(origin, false))
                .collect(),
        })
    }

    /// Search result card for a provider
    pub fn to_provider_summary(
        &self,
        doc: &Document,
        input: &SearchInput,
    ) -> Result<ProviderSummary, MappingError> {
        let mut raw = RawProvider::decode(doc)?;
        let key = raw.key()?;
        let origin = input.origin();

        let closest = match raw.take_closest_address() {
            Some(stored) => Some(stored),
            None => nearest_address(raw.take_addresses(), origin),
        }
        .map(|a| a.into_address(origin, true));

        Ok(ProviderSummary {
            name: raw.display_name()?,
            npi: raw.npi()?,
            web_url: self.web_url(&key, input),
            distance_in_miles: closest.as_ref().and_then(|a| a.distance_in_miles),
            closest_address: closest,
            accept_new_patients: raw.accept_new_patients(),
            primary_specialty: raw.primary_specialty(),
            key,
        })
    }

    pub fn to_plan(&self, doc: &Document) -> Result<Plan, MappingError> {
        RawPlan::decode(doc)?.into_plan()
    }

    /// Deep link to the provider detail lookup, echoing the search context
    pub fn web_url(&self, key: &str, input: &SearchInput) -> String {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", key);
            query.append_pair("radius_in_meters", &input.radius_in_meters().to_string());
            if let Some(origin) = input.origin() {
                query.append_pair("lat", &origin.lat.to_string());
                query.append_pair("lng", &origin.lng.to_string());
            }
            for id in input.network_ids() {
                query.append_pair("network_ids", id);
            }
            for code in input.cpt_codes() {
                query.append_pair("cpt_codes", code);
            }
        }
        url.into()
    }
}

/// The address closest to `origin`, or the first one when distance is unknown
fn nearest_address(addresses: Vec<RawAddress>, origin: Option<&GeoCode>) -> Option<RawAddress> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, address) in addresses.iter().enumerate() {
        let Some(miles) = geo::distance_miles(origin, address.geo_code().as_ref()) else {
            continue;
        };
        if best.map_or(true, |(_, d)| miles < d) {
            best = Some((idx, miles));
        }
    }

    let idx = best.map_or(0, |(idx, _)| idx);
    addresses.into_iter().nth(idx)
}
