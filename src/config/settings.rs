//! Settings structures for provider-search configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "PROVIDER_SEARCH_";

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub scoring: ScoringSettings,
    pub store: StoreSettings,
    pub provider: ProviderSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (PROVIDER_SEARCH_* prefix)
    pub fn merge_env(&mut self) {
        self.merge_vars(|name| std::env::var(name).ok());
    }

    /// Merge overrides from any variable source, keyed by full variable name
    pub fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));
        let float = |suffix: &str| var(suffix).and_then(|v| v.trim().parse::<f64>().ok());

        if let Some(weight) = float("SEARCH_SCORE_WEIGHT") {
            self.scoring.search_score_weight = weight;
        }
        if let Some(weight) = float("CPT_SCORE_WEIGHT") {
            self.scoring.cpt_score_weight = weight;
        }
        if let Some(pivot) = float("PROXIMITY_PIVOT") {
            self.scoring.proximity_pivot = pivot;
        }
        if let Some(uri) = var("MONGO_URI") {
            self.store.uri = Some(uri);
        }
        if let Some(name) = var("DB_NAME") {
            self.store.db_name = name;
        }
        if let Some(name) = var("COLLECTION") {
            self.store.collection = name;
        }
        if let Some(name) = var("PLANS_COLLECTION") {
            self.store.plans_collection = name;
        }
        if let Some(name) = var("SEARCH_INDEX") {
            self.store.search_index = name;
        }
        if let Some(name) = var("PLANS_INDEX") {
            self.store.plans_index = name;
        }
        if let Some(url) = var("PROVIDER_BASE_URL") {
            self.provider.base_url = url;
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        let scoring = &self.scoring;
        for (name, weight) in [
            ("search_score_weight", scoring.search_score_weight),
            ("cpt_score_weight", scoring.cpt_score_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                bail!("scoring.{} must be a non-negative number, got {}", name, weight);
            }
        }
        if !scoring.proximity_pivot.is_finite() || scoring.proximity_pivot <= 0.0 {
            bail!(
                "scoring.proximity_pivot must be positive, got {}",
                scoring.proximity_pivot
            );
        }

        for (name, value) in [
            ("store.db_name", &self.store.db_name),
            ("store.collection", &self.store.collection),
            ("store.plans_collection", &self.store.plans_collection),
            ("store.search_index", &self.store.search_index),
            ("store.plans_index", &self.store.plans_index),
        ] {
            if value.trim().is_empty() {
                bail!("{} must not be empty", name);
            }
        }

        url::Url::parse(&self.provider.base_url).map_err(|e| {
            anyhow::anyhow!("provider.base_url `{}` is invalid: {}", self.provider.base_url, e)
        })?;

        Ok(())
    }
}

/// Ranking weights and proximity scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    /// Weight applied to full-text relevance
    pub search_score_weight: f64,
    /// Weight applied to CPT overlap
    pub cpt_score_weight: f64,
    /// Distance in meters at which proximity scoring has decayed to half
    pub proximity_pivot: f64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            search_score_weight: 1.0,
            cpt_score_weight: 1.0,
            proximity_pivot: 1000.0,
        }
    }
}

/// Document store identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Connection string, when a remote store is used
    pub uri: Option<String>,
    pub db_name: String,
    /// Provider collection
    pub collection: String,
    pub plans_collection: String,
    /// Full-text index over the provider collection
    pub search_index: String,
    /// Full-text index over the plans collection
    pub plans_index: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: None,
            db_name: "provider_search".to_string(),
            collection: "providers".to_string(),
            plans_collection: "plans".to_string(),
            search_index: "provider_search_index".to_string(),
            plans_index: "plan_search_index".to_string(),
        }
    }
}

/// Provider deep-link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL of the provider detail page
    pub base_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/providers".to_string(),
        }
    }
}
