//! Rendering of stages into MongoDB Atlas Search aggregation syntax

use super::stage::*;
use serde_json::{json, Map, Value};

impl Pipeline {
    /// Render as an aggregation pipeline array
    pub fn to_native(&self) -> Value {
        Value::Array(self.stages().iter().map(Stage::to_native).collect())
    }

    /// Render with pagination moved into a `$facet`, so one round trip
    /// returns both the page (`data`) and the match count (`total`).
    pub fn to_native_faceted(&self) -> Value {
        let (shape, paging) = self.split_paging();
        let mut stages: Vec<Value> = shape.iter().map(Stage::to_native).collect();
        let data: Vec<Value> = paging.iter().map(Stage::to_native).collect();
        stages.push(json!({
            "$facet": {
                "data": data,
                "total": [{"$count": "count"}]
            }
        }));
        Value::Array(stages)
    }
}

impl Stage {
    pub fn to_native(&self) -> Value {
        match self {
            Self::TextMatch { index, must } => json!({
                "$search": {
                    "index": index,
                    "compound": {
                        "must": must.iter().map(Clause::to_native).collect::<Vec<_>>()
                    }
                }
            }),
            Self::AddField { name, expr } => {
                let mut fields = Map::new();
                fields.insert(name.clone(), expr.to_native());
                json!({ "$addFields": fields })
            }
            Self::Sort(keys) => {
                let mut order = Map::new();
                for key in keys {
                    let dir = match key.direction {
                        SortDirection::Ascending => 1,
                        SortDirection::Descending => -1,
                    };
                    order.insert(key.field.clone(), json!(dir));
                }
                json!({ "$sort": order })
            }
            Self::Skip(n) => json!({ "$skip": n }),
            Self::Limit(n) => json!({ "$limit": n }),
        }
    }
}

impl Clause {
    fn to_native(&self) -> Value {
        match self {
            Self::Terms { path, values } => json!({
                "in": { "path": path, "value": values }
            }),
            Self::Text { path, query } => json!({
                "text": { "path": path, "query": query }
            }),
            Self::GeoWithin {
                path,
                center,
                radius_meters,
            } => json!({
                "geoWithin": {
                    "path": path,
                    "circle": {
                        "center": { "type": "Point", "coordinates": center.lng_lat() },
                        "radius": radius_meters
                    }
                }
            }),
            Self::GeoNear {
                path,
                origin,
                pivot,
            } => json!({
                "near": {
                    "path": path,
                    "origin": { "type": "Point", "coordinates": origin.lng_lat() },
                    "pivot": pivot
                }
            }),
        }
    }
}

impl Expr {
    fn to_native(&self) -> Value {
        match self {
            Self::TextRelevance => json!({ "$meta": "searchScore" }),
            Self::Constant(v) => json!(v),
            Self::FirstPresent(paths) => json!({
                "$ifNull": paths.iter().map(|p| format!("${}", p)).collect::<Vec<_>>()
            }),
            Self::SumMatching {
                input,
                key,
                value,
                keys,
            } => json!({
                "$reduce": {
                    "input": { "$ifNull": [format!("${}", input), []] },
                    "initialValue": 0,
                    "in": {
                        "$add": [
                            "$$value",
                            {
                                "$cond": [
                                    { "$in": [format!("$$this.{}", key), keys] },
                                    { "$ifNull": [format!("$$this.{}", value), 0] },
                                    0
                                ]
                            }
                        ]
                    }
                }
            }),
            Self::WeightedSum(terms) => json!({
                "$add": terms
                    .iter()
                    .map(|t| json!({ "$multiply": [format!("${}", t.field), t.weight] }))
                    .collect::<Vec<_>>()
            }),
        }
    }
}
