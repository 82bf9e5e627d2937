//! In-process pipeline evaluator over JSON documents

use super::{Document, DocumentStore, QueryPage};
use crate::error::StoreError;
use crate::geo::{self, GeoCode};
use crate::pipeline::{fields, Clause, Expr, Pipeline, SortDirection, SortKey, Stage};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A document with the relevance assigned by its text-match stage
#[derive(Debug, Clone)]
struct Hit {
    doc: Document,
    relevance: f64,
}

/// Store holding named collections in memory.
///
/// Text relevance of a match is the number of matched clauses, plus
/// `pivot / (pivot + meters)` for proximity clauses.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: impl Into<String>, docs: Vec<Document>) -> Self {
        self.collections.insert(name.into(), docs);
        self
    }

    pub fn insert(&mut self, collection: &str, doc: Document) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, Vec::len)
    }

    /// Evaluate a pipeline, returning the total before paging and the page
    fn evaluate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<(u64, Vec<Document>), StoreError> {
        let mut hits: Vec<Hit> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|doc| Hit {
                        doc: doc.clone(),
                        relevance: 0.0,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (shape, paging) = pipeline.split_paging();
        for stage in shape {
            hits = apply(stage, hits)?;
        }
        let total = hits.len() as u64;
        for stage in paging {
            hits = apply(stage, hits)?;
        }

        Ok((total, hits.into_iter().map(|h| h.doc).collect()))
    }
}

fn apply(stage: &Stage, hits: Vec<Hit>) -> Result<Vec<Hit>, StoreError> {
    Ok(match stage {
        Stage::TextMatch { must, .. } => hits
            .into_iter()
            .filter_map(|hit| {
                let score = must
                    .iter()
                    .map(|clause| clause_score(clause, &hit.doc))
                    .sum::<Option<f64>>()?;
                Some(Hit {
                    relevance: score,
                    ..hit
                })
            })
            .collect(),
        Stage::AddField { name, expr } => hits
            .into_iter()
            .map(|mut hit| {
                let value = eval(expr, &hit);
                match hit.doc.as_object_mut() {
                    Some(map) => {
                        map.insert(name.clone(), value);
                        Ok(hit)
                    }
                    None => Err(StoreError::new(format!(
                        "cannot add field `{}` to a non-object document",
                        name
                    ))),
                }
            })
            .collect::<Result<Vec<_>, StoreError>>()?,
        Stage::Sort(keys) => {
            let mut hits = hits;
            hits.sort_by(|a, b| compare_docs(keys, &a.doc, &b.doc));
            hits
        }
        Stage::Skip(n) => hits.into_iter().skip(to_usize(*n)).collect(),
        Stage::Limit(n) => hits.into_iter().take(to_usize(*n)).collect(),
    })
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Score of one clause against a document; `None` when it does not match
fn clause_score(clause: &Clause, doc: &Document) -> Option<f64> {
    match clause {
        Clause::Terms { path, values } => resolve(doc, path)
            .into_iter()
            .filter_map(text_of)
            .any(|v| values.iter().any(|wanted| wanted == &v))
            .then_some(1.0),
        Clause::Text { path, query } => {
            let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
            let best = resolve(doc, path)
                .into_iter()
                .filter_map(text_of)
                .map(|text| {
                    let text = text.to_lowercase();
                    let matched = terms.iter().filter(|t| text.contains(t.as_str())).count();
                    matched as f64 / terms.len().max(1) as f64
                })
                .fold(0.0, f64::max);
            (best > 0.0).then_some(best)
        }
        Clause::GeoWithin {
            path,
            center,
            radius_meters,
        } => points(doc, path)
            .iter()
            .any(|p| geo::haversine_meters(center, p) <= *radius_meters)
            .then_some(1.0),
        Clause::GeoNear {
            path,
            origin,
            pivot,
        } => points(doc, path)
            .iter()
            .map(|p| pivot / (pivot + geo::haversine_meters(origin, p)))
            .reduce(f64::max),
    }
}

fn eval(expr: &Expr, hit: &Hit) -> Value {
    match expr {
        Expr::TextRelevance => json!(hit.relevance),
        Expr::Constant(v) => json!(v),
        Expr::FirstPresent(paths) => paths
            .iter()
            .find_map(|path| hit.doc.get(path).filter(|v| !v.is_null()))
            .cloned()
            .unwrap_or(Value::Null),
        Expr::SumMatching {
            input,
            key,
            value,
            keys,
        } => resolve(&hit.doc, input)
            .into_iter()
            .filter(|elem| {
                elem.get(key)
                    .and_then(text_of)
                    .map_or(false, |k| keys.contains(&k))
            })
            .filter_map(|elem| elem.get(value).and_then(Value::as_f64))
            .sum::<f64>()
            .into(),
        Expr::WeightedSum(terms) => terms
            .iter()
            .map(|t| {
                let v = resolve(&hit.doc, &t.field)
                    .first()
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0);
                v * t.weight
            })
            .sum::<f64>()
            .into(),
    }
}

/// Values at a dotted path, descending into arrays along the way
fn resolve<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for part in path.split('.') {
        current = current
            .into_iter()
            .flat_map(|v| match v {
                Value::Array(items) => items.iter().filter_map(|i| i.get(part)).collect(),
                other => other.get(part).into_iter().collect::<Vec<_>>(),
            })
            .collect();
    }
    current
        .into_iter()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        })
        .collect()
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Stored points at `path`: GeoJSON `{coordinates: [lng, lat]}` or `{lat, lng}`
fn points(doc: &Value, path: &str) -> Vec<GeoCode> {
    resolve(doc, path)
        .into_iter()
        .filter_map(|value| match value.get("coordinates").and_then(Value::as_array) {
            Some(coords) => {
                let coords: Vec<f64> = coords.iter().filter_map(Value::as_f64).collect();
                GeoCode::from_lng_lat(&coords)
            }
            None => match (
                value.get("lat").and_then(Value::as_f64),
                value.get("lng").and_then(Value::as_f64),
            ) {
                (Some(lat), Some(lng)) => Some(GeoCode::new(lat, lng)),
                _ => None,
            },
        })
        .collect()
}

fn compare_docs(keys: &[SortKey], a: &Value, b: &Value) -> Ordering {
    keys.iter()
        .map(|key| {
            let ord = compare_values(
                resolve(a, &key.field).first().copied(),
                resolve(b, &key.field).first().copied(),
            );
            match key.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Missing and null sort first, then numbers, then strings
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Number(_)) => 1,
            Some(Value::String(_)) => 2,
            Some(_) => 3,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn matches_key(doc: &Document, key: &str) -> bool {
    [fields::PROVIDER_KEY, fields::DOCUMENT_ID]
        .iter()
        .any(|field| doc.get(*field).and_then(text_of).as_deref() == Some(key))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
    ) -> Result<QueryPage, StoreError> {
        let (total_count, docs) = self.evaluate(collection, pipeline)?;
        Ok(QueryPage {
            total_count,
            documents: stream::iter(docs.into_iter().map(Ok)).boxed(),
        })
    }

    async fn find_by_key(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches_key(doc, key)))
            .cloned())
    }
}
