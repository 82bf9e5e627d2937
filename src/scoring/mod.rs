//! Relevance blending
//!
//! The blended score is `text_relevance * W_search + cpt_overlap * W_cpt`.
//! [`ScoreBlender`] computes it in-process and also emits the equivalent
//! store expressions, so both sides share one set of weights.

use crate::config::ScoringSettings;
use crate::pipeline::{fields, Expr, WeightedTerm};
use crate::results::CptInfo;
use std::cmp::Ordering;

/// A candidate scored in-process
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub key: String,
    pub text_relevance: f64,
    pub cpt_overlap: f64,
}

impl ScoredCandidate {
    pub fn new(key: impl Into<String>, text_relevance: f64, cpt_overlap: f64) -> Self {
        Self {
            key: key.into(),
            text_relevance,
            cpt_overlap,
        }
    }
}

/// Blends relevance signals with fixed weights
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBlender {
    settings: ScoringSettings,
}

impl ScoreBlender {
    pub fn new(settings: ScoringSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    /// Distance in meters at which the proximity boost halves
    pub fn proximity_pivot(&self) -> f64 {
        self.settings.proximity_pivot
    }

    /// Sum of weights of accepted CPTs whose code was requested
    pub fn cpt_overlap(&self, accepted: &[CptInfo], requested: &[String]) -> f64 {
        if requested.is_empty() {
            return 0.0;
        }
        accepted
            .iter()
            .filter(|cpt| requested.iter().any(|code| code == &cpt.code))
            .map(|cpt| cpt.weight)
            .sum()
    }

    pub fn blend(&self, text_relevance: f64, cpt_overlap: f64) -> f64 {
        text_relevance * self.settings.search_score_weight
            + cpt_overlap * self.settings.cpt_score_weight
    }

    /// Store expression computing [`Self::cpt_overlap`] per document
    pub fn overlap_expr(&self, requested: &[String]) -> Expr {
        if requested.is_empty() {
            return Expr::Constant(0.0);
        }
        Expr::SumMatching {
            input: fields::ACCEPTED_CPTS.to_string(),
            key: fields::CPT_CODE.to_string(),
            value: fields::CPT_WEIGHT.to_string(),
            keys: requested.to_vec(),
        }
    }

    /// Store expression computing [`Self::blend`] from the computed fields
    pub fn blend_expr(&self) -> Expr {
        Expr::WeightedSum(vec![
            WeightedTerm::new(fields::SEARCH_SCORE, self.settings.search_score_weight),
            WeightedTerm::new(fields::CPT_OVERLAP, self.settings.cpt_score_weight),
        ])
    }

    /// Order candidates by blended score descending, key ascending on ties
    pub fn rank(&self, candidates: &mut [ScoredCandidate]) {
        candidates.sort_by(|a, b| {
            let (sa, sb) = (
                self.blend(a.text_relevance, a.cpt_overlap),
                self.blend(b.text_relevance, b.cpt_overlap),
            );
            sb.partial_cmp(&sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.key.cmp(&b.key))
        });
    }
}

impl Default for ScoreBlender {
    fn default() -> Self {
        Self::new(ScoringSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpt(code: &str, weight: f64) -> CptInfo {
        CptInfo {
            code: code.to_string(),
            weight,
            claim_service_start_date: None,
        }
    }

    fn blender(search: f64, cpt: f64) -> ScoreBlender {
        ScoreBlender::new(ScoringSettings {
            search_score_weight: search,
            cpt_score_weight: cpt,
            ..Default::default()
        })
    }

    #[test]
    fn test_cpt_overlap() {
        let accepted = vec![cpt("D2750", 2.0), cpt("D4000", 1.0)];
        let blender = ScoreBlender::default();

        assert_eq!(blender.cpt_overlap(&accepted, &["D2750".to_string()]), 2.0);
        assert_eq!(blender.cpt_overlap(&accepted, &["D9999".to_string()]), 0.0);
        assert_eq!(
            blender.cpt_overlap(&accepted, &["D2750".to_string(), "D4000".to_string()]),
            3.0
        );
        assert_eq!(blender.cpt_overlap(&accepted, &[]), 0.0);
    }

    #[test]
    fn test_blend() {
        assert_eq!(blender(1.0, 1.0).blend(1.5, 2.0), 3.5);
        assert_eq!(blender(0.5, 2.0).blend(2.0, 1.0), 3.0);
    }

    #[test]
    fn test_cpt_weight_reorders_only_when_overlaps_differ() {
        // a: stronger text match, b: better CPT coverage
        let candidates = vec![
            ScoredCandidate::new("a", 3.0, 1.0),
            ScoredCandidate::new("b", 1.0, 2.0),
        ];

        let mut ranked = candidates.clone();
        blender(1.0, 1.0).rank(&mut ranked);
        assert_eq!(ranked[0].key, "a");

        let mut ranked = candidates;
        blender(1.0, 5.0).rank(&mut ranked);
        assert_eq!(ranked[0].key, "b");

        // equal overlaps: the CPT weight cannot change the order
        let equal = vec![
            ScoredCandidate::new("x", 1.0, 2.0),
            ScoredCandidate::new("y", 3.0, 2.0),
        ];
        for weight in [0.0, 1.0, 10.0] {
            let mut ranked = equal.clone();
            blender(1.0, weight).rank(&mut ranked);
            assert_eq!(ranked[0].key, "y");
        }
    }

    #[test]
    fn test_rank_ties_by_key() {
        let mut ranked = vec![
            ScoredCandidate::new("c", 1.0, 0.0),
            ScoredCandidate::new("a", 1.0, 0.0),
            ScoredCandidate::new("b", 1.0, 0.0),
        ];
        ScoreBlender::default().rank(&mut ranked);
        let keys: Vec<_> = ranked.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[test]
    fn test_expressions() {
        let blender = blender(1.0, 2.0);
        assert_eq!(blender.overlap_expr(&[]), Expr::Constant(0.0));

        match blender.overlap_expr(&["D2750".to_string()]) {
            Expr::SumMatching { input, keys, .. } => {
                assert_eq!(input, "associated_cpts");
                assert_eq!(keys, vec!["D2750"]);
            }
            other => panic!("unexpected expression: {:?}", other),
        }

        assert_eq!(
            blender.blend_expr(),
            Expr::WeightedSum(vec![
                WeightedTerm::new("search_score", 1.0),
                WeightedTerm::new("cpt_overlap", 2.0),
            ])
        );
    }
}
