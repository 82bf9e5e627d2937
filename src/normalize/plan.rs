//! Plan document normalization

use super::{OneOrMany, Scalar};
use crate::error::MappingError;
use crate::results::Plan;
use crate::store::Document;
use chrono::NaiveDate;
use serde::Deserialize;

/// Stored plan shape
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPlan {
    #[serde(alias = "plaln_name", alias = "planName")]
    plan_name: Option<Scalar>,
    #[serde(alias = "networkIds")]
    pes_network_ids: Option<OneOrMany<Scalar>>,
    eff_dt: Option<Scalar>,
    exp_dt: Option<Scalar>,
}

impl RawPlan {
    pub(crate) fn decode(doc: &Document) -> Result<Self, MappingError> {
        Ok(Self::deserialize(doc)?)
    }

    pub(crate) fn into_plan(self) -> Result<Plan, MappingError> {
        let plan_name = self
            .plan_name
            .and_then(Scalar::into_text)
            .ok_or(MappingError::MissingField("plan_name"))?;

        Ok(Plan {
            plan_name,
            pes_network_ids: self
                .pes_network_ids
                .map(OneOrMany::into_vec)
                .unwrap_or_default()
                .into_iter()
                .filter_map(Scalar::into_text)
                .collect(),
            eff_dt: self.eff_dt.and_then(yyyymmdd),
            exp_dt: self.exp_dt.and_then(yyyymmdd),
        })
    }
}

/// Normalize a stored date to a YYYYMMDD integer.
///
/// Accepts `20251110`, `"20251110"` and `"2025-11-10"`; anything that is not
/// a real calendar date yields `None`.
fn yyyymmdd(value: Scalar) -> Option<u32> {
    let text = value.into_text()?;
    let date = NaiveDate::parse_from_str(&text, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(&text, "%Y-%m-%d"))
        .ok()?;
    date.format("%Y%m%d").to_string().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan(doc: serde_json::Value) -> Result<Plan, MappingError> {
        RawPlan::decode(&doc)?.into_plan()
    }

    #[test]
    fn test_plan_mapping() {
        let plan = plan(json!({
            "plan_name": "Dental Gold",
            "pes_network_ids": ["N1", "N2"],
            "eff_dt": 20250101,
            "exp_dt": "20251231"
        }))
        .unwrap();

        assert_eq!(plan.plan_name, "Dental Gold");
        assert_eq!(plan.pes_network_ids, vec!["N1", "N2"]);
        assert_eq!(plan.eff_dt, Some(20250101));
        assert_eq!(plan.exp_dt, Some(20251231));
    }

    #[test]
    fn test_drifted_plan_shape() {
        let plan = plan(json!({
            "plaln_name": "Dental Silver",
            "pes_network_ids": 77,
            "eff_dt": "2025-11-10",
            "exp_dt": 20251340
        }))
        .unwrap();

        assert_eq!(plan.plan_name, "Dental Silver");
        assert_eq!(plan.pes_network_ids, vec!["77"]);
        assert_eq!(plan.eff_dt, Some(20251110));
        assert_eq!(plan.exp_dt, None);
    }

    #[test]
    fn test_plan_name_required() {
        let err = plan(json!({"pes_network_ids": ["N1"]})).unwrap_err();
        assert!(matches!(err, MappingError::MissingField("plan_name")));
    }
}
