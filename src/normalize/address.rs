//! Address and phone normalization

use super::{OneOrMany, Scalar};
use crate::geo::{self, GeoCode};
use crate::results::{Address, Phone};
use serde::de::IgnoredAny;
use serde::Deserialize;

/// Stored address shape
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawAddress {
    #[serde(rename = "displayAddress", alias = "display_address")]
    display_address: Option<Scalar>,
    #[serde(rename = "geoCode", alias = "geo_code")]
    geo_code: Option<RawGeoCode>,
    #[serde(alias = "phone")]
    phones: Option<OneOrMany<RawPhone>>,
}

/// Stored geodata: a GeoJSON point, a plain lat/lng pair, or something unusable
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawGeoCode {
    Point { coordinates: Vec<f64> },
    LatLng { lat: f64, lng: f64 },
    Unrecognized(IgnoredAny),
}

impl RawGeoCode {
    fn into_geo_code(self) -> Option<GeoCode> {
        match self {
            Self::Point { coordinates } => GeoCode::from_lng_lat(&coordinates),
            Self::LatLng { lat, lng } => Some(GeoCode::new(lat, lng)),
            Self::Unrecognized(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPhone {
    #[serde(rename = "type")]
    phone_type: Option<Scalar>,
    number: Option<Scalar>,
    confidence: Option<Scalar>,
}

impl From<RawPhone> for Phone {
    fn from(raw: RawPhone) -> Self {
        Self {
            phone_type: raw.phone_type.and_then(Scalar::into_text),
            number: raw.number.and_then(Scalar::into_text),
            confidence: raw
                .confidence
                .as_ref()
                .and_then(Scalar::as_f64)
                .unwrap_or(0.0),
        }
    }
}

impl RawAddress {
    /// Stored geodata, if usable
    pub(crate) fn geo_code(&self) -> Option<GeoCode> {
        self.geo_code.clone().and_then(RawGeoCode::into_geo_code)
    }

    /// Convert to an [`Address`], measuring distance from `origin`.
    ///
    /// With `summarize` set, the phone list is reduced to its single best entry.
    pub(crate) fn into_address(self, origin: Option<&GeoCode>, summarize: bool) -> Address {
        let geo_code = self.geo_code.and_then(RawGeoCode::into_geo_code);
        let phones: Vec<Phone> = self
            .phones
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(Phone::from)
            .collect();

        let phone = if summarize {
            summarize_phones(phones).into_iter().collect()
        } else {
            phones
        };

        Address {
            display_address: self
                .display_address
                .and_then(Scalar::into_text)
                .unwrap_or_default(),
            distance_in_miles: geo::distance_miles(origin, geo_code.as_ref()),
            geo_code,
            phone,
        }
    }
}

/// Pick the phone to show on a summary card.
///
/// The highest-confidence voice line wins, the earliest listed one on ties.
/// Without any voice line the first listed phone is used.
pub fn summarize_phones(phones: Vec<Phone>) -> Option<Phone> {
    let mut best: Option<usize> = None;
    for (idx, phone) in phones.iter().enumerate() {
        if !phone.is_voice() {
            continue;
        }
        match best {
            Some(b) if phones[b].confidence >= phone.confidence => {}
            _ => best = Some(idx),
        }
    }

    let idx = best.unwrap_or(0);
    phones.into_iter().nth(idx)
}
