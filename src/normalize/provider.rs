//! Provider document normalization

use super::address::RawAddress;
use super::{OneOrMany, Scalar};
use crate::error::MappingError;
use crate::results::{Code, CptInfo, License};
use crate::store::Document;
use serde::Deserialize;

/// Stored provider shape
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawProvider {
    ues_enterprise_provider_id: Option<Scalar>,
    #[serde(rename = "_id")]
    id: Option<Scalar>,
    npi: Option<Scalar>,
    display_name: Option<Scalar>,
    gender: Option<Scalar>,
    addresses: Option<OneOrMany<RawAddress>>,
    closest_address: Option<RawAddress>,
    taxonomies: Option<OneOrMany<RawTaxonomy>>,
    primary_taxonomy_code: Option<RawPrimaryTaxonomy>,
    languages: Option<RawLanguages>,
    licenses: Option<OneOrMany<RawLicense>>,
    #[serde(rename = "acceptNewPatients", alias = "accept_new_patients")]
    accept_new_patients: Option<Scalar>,
    associated_cpts: Option<OneOrMany<RawCpt>>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTaxonomy {
    #[serde(rename = "taxonomyCode", alias = "taxonomycodeDesc")]
    code: Option<Scalar>,
    #[serde(rename = "taxonomyDesc")]
    description: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawPrimaryTaxonomy {
    #[serde(rename = "taxonomyCodes", alias = "taxonomyCode")]
    codes: Option<OneOrMany<Scalar>>,
    #[serde(rename = "taxonomyDescription", alias = "taxonomyDesc")]
    description: Option<Scalar>,
}

/// Languages are a bare code on legacy records, a list elsewhere
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawLanguages {
    Entries(Vec<RawLanguage>),
    Legacy(Scalar),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawLanguage {
    Entry {
        code: Option<Scalar>,
        description: Option<Scalar>,
    },
    Plain(Scalar),
}

#[derive(Debug, Clone, Deserialize)]
struct RawLicense {
    #[serde(rename = "licenseNumber")]
    number: Option<Scalar>,
    #[serde(rename = "stateCode")]
    state: Option<Scalar>,
    #[serde(rename = "effectiveDate")]
    effective_date: Option<Scalar>,
    #[serde(rename = "expirationDate")]
    expiration_date: Option<Scalar>,
    #[serde(rename = "voidedIndicator")]
    voided: Option<Scalar>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCpt {
    code: Option<Scalar>,
    weight: Option<Scalar>,
    #[serde(rename = "claimServiceStartDate")]
    claim_service_start_date: Option<Scalar>,
}

impl RawProvider {
    /// Decode a store document
    pub(crate) fn decode(doc: &Document) -> Result<Self, MappingError> {
        Ok(Self::deserialize(doc)?)
    }

    /// Provider key; the enterprise id, else the document id
    pub(crate) fn key(&self) -> Result<String, MappingError> {
        self.ues_enterprise_provider_id
            .clone()
            .and_then(Scalar::into_text)
            .or_else(|| self.id.clone().and_then(Scalar::into_text))
            .ok_or(MappingError::MissingField("ues_enterprise_provider_id"))
    }

    pub(crate) fn npi(&self) -> Result<String, MappingError> {
        self.npi
            .clone()
            .and_then(Scalar::into_text)
            .ok_or(MappingError::MissingField("npi"))
    }

    pub(crate) fn display_name(&self) -> Result<String, MappingError> {
        self.display_name
            .as_ref()
            .and_then(Scalar::to_text)
            .ok_or(MappingError::MissingField("display_name"))
    }

    pub(crate) fn gender(&self) -> Option<String> {
        self.gender.as_ref().and_then(Scalar::to_text)
    }

    pub(crate) fn accept_new_patients(&self) -> bool {
        self.accept_new_patients
            .as_ref()
            .map(Scalar::is_truthy)
            .unwrap_or(false)
    }

    pub(crate) fn take_addresses(&mut self) -> Vec<RawAddress> {
        self.addresses
            .take()
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
    }

    pub(crate) fn take_closest_address(&mut self) -> Option<RawAddress> {
        self.closest_address.take()
    }

    /// Primary specialty, present only when the taxonomy carries a code
    pub(crate) fn primary_specialty(&self) -> Option<Code> {
        let taxonomy = self.primary_taxonomy_code.as_ref()?;
        let code = taxonomy
            .codes
            .clone()?
            .into_vec()
            .into_iter()
            .find_map(Scalar::into_text)?;
        Some(Code::new(
            code,
            taxonomy.description.as_ref().and_then(Scalar::to_text),
        ))
    }

    pub(crate) fn taxonomy_codes(&self) -> Vec<Code> {
        self.taxonomies
            .clone()
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|t| {
                let code = t.code.and_then(Scalar::into_text)?;
                Some(Code::new(code, t.description.and_then(Scalar::into_text)))
            })
            .collect()
    }

    pub(crate) fn languages(&self) -> Vec<Code> {
        fn plain(value: Scalar) -> Option<Code> {
            let value = value.into_text()?;
            Some(Code::new(value.clone(), Some(value)))
        }

        match self.languages.clone() {
            Some(RawLanguages::Legacy(value)) => plain(value).into_iter().collect(),
            Some(RawLanguages::Entries(entries)) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    RawLanguage::Plain(value) => plain(value),
                    RawLanguage::Entry { code, description } => Some(Code::new(
                        code.and_then(Scalar::into_text)?,
                        description.and_then(Scalar::into_text),
                    )),
                })
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn licenses(&self) -> Vec<License> {
        self.licenses
            .clone()
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .map(|l| License {
                number: l.number.and_then(Scalar::into_text),
                state: l.state.and_then(Scalar::into_text),
                eff_dt: l.effective_date.and_then(Scalar::into_text),
                exp_dt: l.expiration_date.and_then(Scalar::into_text),
                voided: l.voided.as_ref().map(Scalar::is_truthy).unwrap_or(false),
            })
            .collect()
    }

    pub(crate) fn accepted_cpts(&self) -> Vec<CptInfo> {
        self.associated_cpts
            .clone()
            .map(OneOrMany::into_vec)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| {
                let code = c.code.and_then(Scalar::into_text)?;
                Some(CptInfo {
                    code,
                    weight: c.weight.as_ref().and_then(Scalar::as_f64).unwrap_or(0.0),
                    claim_service_start_date: c
                        .claim_service_start_date
                        .and_then(Scalar::into_text)
                        .and_then(|d| d.parse().ok()),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(doc: serde_json::Value) -> RawProvider {
        RawProvider::decode(&doc).unwrap()
    }

    #[test]
    fn test_key_falls_back_to_document_id() {
        let raw = decode(json!({"_id": "prov-1", "npi": "1"}));
        assert_eq!(raw.key().unwrap(), "prov-1");

        let raw = decode(json!({"_id": "doc", "ues_enterprise_provider_id": "prov-2"}));
        assert_eq!(raw.key().unwrap(), "prov-2");
    }

    #[test]
    fn test_missing_identity() {
        let raw = decode(json!({"display_name": "  "}));
        assert!(matches!(raw.key(), Err(MappingError::MissingField(_))));
        assert!(matches!(raw.npi(), Err(MappingError::MissingField("npi"))));
        assert!(matches!(
            raw.display_name(),
            Err(MappingError::MissingField("display_name"))
        ));
    }

    #[test]
    fn test_numeric_npi() {
        let raw = decode(json!({"npi": 1234567890}));
        assert_eq!(raw.npi().unwrap(), "1234567890");
    }

    #[test]
    fn test_legacy_scalar_language() {
        let raw = decode(json!({"languages": "SPA"}));
        assert_eq!(raw.languages(), vec![Code::new("SPA", Some("SPA".to_string()))]);
    }

    #[test]
    fn test_language_entries() {
        let raw = decode(json!({"languages": [
            {"code": "ENG", "description": "English"},
            {"code": "", "description": "Blank"},
            "FRE"
        ]}));
        assert_eq!(
            raw.languages(),
            vec![
                Code::new("ENG", Some("English".to_string())),
                Code::new("FRE", Some("FRE".to_string())),
            ]
        );
    }

    #[test]
    fn test_unrecognized_languages_are_dropped() {
        let raw = decode(json!({"languages": {"primary": "ENG"}}));
        assert!(raw.languages().is_empty());

        let raw = decode(json!({"languages": [null, {"description": "No code"}]}));
        assert!(raw.languages().is_empty());
    }

    #[test]
    fn test_loosely_typed_text_fields() {
        let raw = decode(json!({
            "display_name": 1001,
            "taxonomies": [{"taxonomyCode": 122300000, "taxonomyDesc": 7}],
            "licenses": [{"stateCode": 17, "effectiveDate": 20200101}],
            "associated_cpts": [{"code": 2750, "weight": "1.5"}]
        }));

        assert_eq!(raw.display_name().unwrap(), "1001");
        assert_eq!(
            raw.taxonomy_codes(),
            vec![Code::new("122300000", Some("7".to_string()))]
        );
        assert_eq!(raw.licenses()[0].state.as_deref(), Some("17"));
        assert_eq!(raw.licenses()[0].eff_dt.as_deref(), Some("20200101"));
        let cpts = raw.accepted_cpts();
        assert_eq!(cpts[0].code, "2750");
        assert_eq!(cpts[0].weight, 1.5);
    }

    #[test]
    fn test_primary_specialty_requires_code() {
        let raw = decode(json!({"primary_taxonomy_code": {"taxonomyDescription": "Dentist"}}));
        assert_eq!(raw.primary_specialty(), None);

        let raw = decode(json!({"primary_taxonomy_code": {
            "taxonomyCodes": [],
            "taxonomyDescription": "Dentist"
        }}));
        assert_eq!(raw.primary_specialty(), None);

        let raw = decode(json!({"primary_taxonomy_code": {
            "taxonomyCodes": ["1223G0001X"],
            "taxonomyDescription": "General Practice Dentistry"
        }}));
        assert_eq!(
            raw.primary_specialty(),
            Some(Code::new(
                "1223G0001X",
                Some("General Practice Dentistry".to_string())
            ))
        );

        let raw = decode(json!({"primary_taxonomy_code": {"taxonomyCodes": "122300000X"}}));
        assert_eq!(raw.primary_specialty().unwrap().code, "122300000X");
    }

    #[test]
    fn test_taxonomy_legacy_field_name() {
        let raw = decode(json!({"taxonomies": [
            {"taxonomycodeDesc": "1223G0001X", "taxonomyDesc": "General"},
            {"taxonomyCode": "1223P0221X", "taxonomyDesc": "Pediatric"},
            {"taxonomyDesc": "No code"}
        ]}));
        let codes: Vec<_> = raw.taxonomy_codes().into_iter().map(|c| c.code).collect();
        assert_eq!(codes, vec!["1223G0001X", "1223P0221X"]);
    }

    #[test]
    fn test_licenses() {
        let raw = decode(json!({"licenses": [{
            "licenseNumber": 12345,
            "stateCode": "IL",
            "effectiveDate": "2020-01-01",
            "expirationDate": "2026-01-01",
            "voidedIndicator": "y"
        }]}));
        let licenses = raw.licenses();
        assert_eq!(licenses.len(), 1);
        assert_eq!(licenses[0].number.as_deref(), Some("12345"));
        assert_eq!(licenses[0].state.as_deref(), Some("IL"));
        assert!(licenses[0].voided);
    }

    #[test]
    fn test_accepted_cpts() {
        let raw = decode(json!({"associated_cpts": [
            {"code": "D2750", "weight": 2.0, "claimServiceStartDate": 20240115},
            {"code": "D4000"},
            {"weight": 9.0}
        ]}));
        let cpts = raw.accepted_cpts();
        assert_eq!(cpts.len(), 2);
        assert_eq!(cpts[0].weight, 2.0);
        assert_eq!(cpts[0].claim_service_start_date, Some(20240115));
        assert_eq!(cpts[1].weight, 0.0);
        assert_eq!(cpts[1].claim_service_start_date, None);
    }

    #[test]
    fn test_accept_new_patients_flag() {
        assert!(decode(json!({"acceptNewPatients": true})).accept_new_patients());
        assert!(decode(json!({"acceptNewPatients": "Y"})).accept_new_patients());
        assert!(!decode(json!({})).accept_new_patients());
    }
}
