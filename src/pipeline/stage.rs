//! Stage descriptor types

use crate::geo::GeoCode;

/// One step of a query pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Full-text index search; every clause must match
    TextMatch { index: String, must: Vec<Clause> },
    /// Compute a field on every document
    AddField { name: String, expr: Expr },
    /// Order by the keys, in priority order
    Sort(Vec<SortKey>),
    Skip(u64),
    Limit(u64),
}

impl Stage {
    pub fn add_field(name: impl Into<String>, expr: Expr) -> Self {
        Self::AddField {
            name: name.into(),
            expr,
        }
    }

    /// Whether this stage pages through results rather than shaping them
    pub fn is_paging(&self) -> bool {
        matches!(self, Self::Skip(_) | Self::Limit(_))
    }
}

/// A filter clause inside a [`Stage::TextMatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Field (or array element field) equals one of the values
    Terms { path: String, values: Vec<String> },
    /// Analyzed free-text match
    Text { path: String, query: String },
    /// Point lies within `radius_meters` of `center`
    GeoWithin {
        path: String,
        center: GeoCode,
        radius_meters: f64,
    },
    /// Proximity boost, halving at `pivot` meters from `origin`
    GeoNear {
        path: String,
        origin: GeoCode,
        pivot: f64,
    },
}

/// A computed-field expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Relevance score assigned by the text-match stage.
    ///
    /// This is the backend's own score, not rescaled to a fixed range: Atlas
    /// `searchScore` in MongoDB, matched clauses plus proximity in memory.
    /// Blending weights are tuned against that scale.
    TextRelevance,
    Constant(f64),
    /// Value of the first listed field that is present and not null
    FirstPresent(Vec<String>),
    /// Sum `value` over elements of array `input` whose `key` is in `keys`
    SumMatching {
        input: String,
        key: String,
        value: String,
        keys: Vec<String>,
    },
    /// Sum of `field * weight` terms
    WeightedSum(Vec<WeightedTerm>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTerm {
    pub field: String,
    pub weight: f64,
}

impl WeightedTerm {
    pub fn new(field: impl Into<String>, weight: f64) -> Self {
        Self {
            field: field.into(),
            weight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// An ordered stage sequence.
///
/// An empty pipeline means no searchable filter was supplied; callers must
/// not send it to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Split into the shaping stages and the trailing skip/limit stages.
    ///
    /// Counting the documents produced by the first half gives the total
    /// number of matches before pagination.
    pub fn split_paging(&self) -> (&[Stage], &[Stage]) {
        let at = self
            .stages
            .iter()
            .position(Stage::is_paging)
            .unwrap_or(self.stages.len());
        self.stages.split_at(at)
    }
}

impl From<Vec<Stage>> for Pipeline {
    fn from(stages: Vec<Stage>) -> Self {
        Self::new(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_paging() {
        let pipeline = Pipeline::new(vec![
            Stage::add_field("a", Expr::Constant(1.0)),
            Stage::Sort(vec![SortKey::desc("a")]),
            Stage::Skip(10),
            Stage::Limit(5),
        ]);

        let (shape, paging) = pipeline.split_paging();
        assert_eq!(shape.len(), 2);
        assert_eq!(paging, [Stage::Skip(10), Stage::Limit(5)]);
    }

    #[test]
    fn test_split_without_paging() {
        let pipeline = Pipeline::new(vec![Stage::Sort(vec![SortKey::asc("a")])]);
        let (shape, paging) = pipeline.split_paging();
        assert_eq!(shape.len(), 1);
        assert!(paging.is_empty());
    }

    #[test]
    fn test_empty_pipeline() {
        assert!(Pipeline::empty().is_empty());
        assert_eq!(Pipeline::empty().len(), 0);
    }
}
