//! Compiles validated search inputs into stage pipelines

use super::fields;
use super::stage::*;
use crate::scoring::ScoreBlender;
use crate::search::{SearchInput, SearchPlansInput};

/// Builds provider and plan search pipelines
#[derive(Debug, Clone)]
pub struct QueryCompiler {
    blender: ScoreBlender,
    search_index: String,
    plans_index: String,
}

impl QueryCompiler {
    pub fn new(
        blender: ScoreBlender,
        search_index: impl Into<String>,
        plans_index: impl Into<String>,
    ) -> Self {
        Self {
            blender,
            search_index: search_index.into(),
            plans_index: plans_index.into(),
        }
    }

    pub fn blender(&self) -> &ScoreBlender {
        &self.blender
    }

    /// Compile a provider search.
    ///
    /// Returns an empty pipeline when the input carries no CPT, geo or
    /// network filter.
    pub fn compile(&self, input: &SearchInput) -> Pipeline {
        let must = self.filter_clauses(input);
        if must.is_empty() {
            return Pipeline::empty();
        }

        Pipeline::new(vec![
            Stage::TextMatch {
                index: self.search_index.clone(),
                must,
            },
            Stage::add_field(fields::SEARCH_SCORE, Expr::TextRelevance),
            Stage::add_field(
                fields::CPT_OVERLAP,
                self.blender.overlap_expr(input.cpt_codes()),
            ),
            Stage::add_field(fields::RELEVANCE_SCORE, self.blender.blend_expr()),
            Stage::add_field(
                fields::SORT_KEY,
                Expr::FirstPresent(vec![
                    fields::PROVIDER_KEY.to_string(),
                    fields::DOCUMENT_ID.to_string(),
                ]),
            ),
            Stage::Sort(vec![
                SortKey::desc(fields::RELEVANCE_SCORE),
                SortKey::asc(fields::SORT_KEY),
            ]),
            Stage::Skip(input.skip()),
            Stage::Limit(u64::from(input.limit())),
        ])
    }

    fn filter_clauses(&self, input: &SearchInput) -> Vec<Clause> {
        let mut must = Vec::new();

        if !input.cpt_codes().is_empty() {
            must.push(Clause::Terms {
                path: fields::cpt_code_path(),
                values: input.cpt_codes().to_vec(),
            });
        }

        if let Some(origin) = input.origin() {
            must.push(Clause::GeoWithin {
                path: fields::ADDRESS_GEO.to_string(),
                center: *origin,
                radius_meters: input.radius_in_meters(),
            });
            must.push(Clause::GeoNear {
                path: fields::ADDRESS_GEO.to_string(),
                origin: *origin,
                pivot: self.blender.proximity_pivot(),
            });
        }

        if !input.network_ids().is_empty() {
            must.push(Clause::Terms {
                path: fields::NETWORK_ID.to_string(),
                values: input.network_ids().to_vec(),
            });
        }

        must
    }

    /// Compile a plan listing; never empty
    pub fn compile_plans(&self, input: &SearchPlansInput) -> Pipeline {
        let mut stages = Vec::with_capacity(5);

        match input.query() {
            Some(query) => {
                stages.push(Stage::TextMatch {
                    index: self.plans_index.clone(),
                    must: vec![Clause::Text {
                        path: fields::PLAN_NAME.to_string(),
                        query: query.to_string(),
                    }],
                });
                stages.push(Stage::add_field(fields::SEARCH_SCORE, Expr::TextRelevance));
                stages.push(Stage::Sort(vec![
                    SortKey::desc(fields::SEARCH_SCORE),
                    SortKey::asc(fields::PLAN_NAME),
                ]));
            }
            None => stages.push(Stage::Sort(vec![SortKey::asc(fields::PLAN_NAME)])),
        }

        stages.push(Stage::Skip(input.skip()));
        stages.push(Stage::Limit(u64::from(input.limit())));
        Pipeline::new(stages)
    }
}
