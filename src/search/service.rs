//! Provider and plan search service

use super::models::{FindDetailInput, SearchInput, SearchPlansInput};
use crate::config::{ScoringSettings, Settings};
use crate::error::SearchError;
use crate::mapper::DocumentMapper;
use crate::pipeline::{Pipeline, QueryCompiler};
use crate::results::{FindByKeyResult, Plan, Provider, ProviderSummary, SearchPlansResult, SearchResult};
use crate::scoring::ScoreBlender;
use crate::store::DocumentStore;
use anyhow::Context;
use futures::TryStreamExt;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Immutable service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub scoring: ScoringSettings,
    /// Provider collection
    pub collection: String,
    pub plans_collection: String,
    pub search_index: String,
    pub plans_index: String,
    /// Base of the provider deep links placed on search results
    pub provider_base_url: String,
}

impl From<&Settings> for ServiceConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            scoring: settings.scoring,
            collection: settings.store.collection.clone(),
            plans_collection: settings.store.plans_collection.clone(),
            search_index: settings.store.search_index.clone(),
            plans_index: settings.store.plans_index.clone(),
            provider_base_url: settings.provider.base_url.clone(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// Searches providers and plans in a document store
pub struct SearchService {
    store: Arc<dyn DocumentStore>,
    config: ServiceConfig,
    compiler: QueryCompiler,
    mapper: DocumentMapper,
}

impl SearchService {
    pub fn new(store: Arc<dyn DocumentStore>, config: ServiceConfig) -> anyhow::Result<Self> {
        let mapper = DocumentMapper::new(&config.provider_base_url).with_context(|| {
            format!("invalid provider base URL `{}`", config.provider_base_url)
        })?;
        let compiler = QueryCompiler::new(
            ScoreBlender::new(config.scoring),
            config.search_index.clone(),
            config.plans_index.clone(),
        );

        Ok(Self {
            store,
            config,
            compiler,
            mapper,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Search providers, ranked by blended relevance
    pub async fn search(&self, input: &SearchInput) -> Result<SearchResult, SearchError> {
        let start = Instant::now();
        let pipeline = self.compiler.compile(input);

        if pipeline.is_empty() {
            info!(
                input = %to_log(input),
                "No searchable filter supplied, returning an empty result"
            );
            return Ok(SearchResult::empty());
        }

        let query = pipeline.to_native();
        let outcome = self.run_search(input, &pipeline).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            Ok(result) => info!(
                elapsed_ms,
                store = self.store.name(),
                collection = %self.config.collection,
                input = %to_log(input),
                query = %query,
                "Provider search returned {} of {} matches",
                result.paginated_data.len(),
                result.total_count
            ),
            Err(e) => error!(
                elapsed_ms,
                store = self.store.name(),
                collection = %self.config.collection,
                input = %to_log(input),
                query = %query,
                "Provider search failed: {}",
                e
            ),
        }

        outcome
    }

    async fn run_search(
        &self,
        input: &SearchInput,
        pipeline: &Pipeline,
    ) -> Result<SearchResult, SearchError> {
        let page = self.store.aggregate(&self.config.collection, pipeline).await?;
        let mut documents = page.documents;

        let mut paginated_data: Vec<ProviderSummary> = Vec::new();
        while let Some(doc) = documents.try_next().await? {
            paginated_data.push(self.mapper.to_provider_summary(&doc, input)?);
        }

        Ok(SearchResult {
            paginated_data,
            total_count: page.total_count,
        })
    }

    /// Look up a single provider by key
    pub async fn find_by_key(&self, input: &FindDetailInput) -> Result<FindByKeyResult, SearchError> {
        let start = Instant::now();
        let outcome = self.lookup(input).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            Ok(Some(_)) => info!(elapsed_ms, key = input.key(), "Provider found"),
            Ok(None) => info!(elapsed_ms, key = input.key(), "Provider not found"),
            Err(e) => error!(
                elapsed_ms,
                key = input.key(),
                store = self.store.name(),
                input = %to_log(input),
                "Provider lookup failed: {}",
                e
            ),
        }

        Ok(FindByKeyResult {
            data: outcome?,
            input_param: input.clone(),
        })
    }

    async fn lookup(&self, input: &FindDetailInput) -> Result<Option<Provider>, SearchError> {
        let doc = self
            .store
            .find_by_key(&self.config.collection, input.key())
            .await?;

        match doc {
            Some(doc) => Ok(Some(self.mapper.to_provider(&doc, input.origin())?)),
            None => Ok(None),
        }
    }

    /// List plans, optionally filtered by a free-text name query
    pub async fn search_plans(
        &self,
        input: &SearchPlansInput,
    ) -> Result<SearchPlansResult, SearchError> {
        let start = Instant::now();
        let pipeline = self.compiler.compile_plans(input);
        let query = pipeline.to_native();
        let outcome = self.run_plans(&pipeline).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &outcome {
            Ok(result) => info!(
                elapsed_ms,
                collection = %self.config.plans_collection,
                input = %to_log(input),
                query = %query,
                "Plan search returned {} of {} matches",
                result.paginated_data.len(),
                result.total_count
            ),
            Err(e) => error!(
                elapsed_ms,
                collection = %self.config.plans_collection,
                input = %to_log(input),
                query = %query,
                "Plan search failed: {}",
                e
            ),
        }

        outcome
    }

    async fn run_plans(&self, pipeline: &Pipeline) -> Result<SearchPlansResult, SearchError> {
        let page = self
            .store
            .aggregate(&self.config.plans_collection, pipeline)
            .await?;
        let mut documents = page.documents;

        let mut paginated_data: Vec<Plan> = Vec::new();
        while let Some(doc) = documents.try_next().await? {
            paginated_data.push(self.mapper.to_plan(&doc)?);
        }

        Ok(SearchPlansResult {
            paginated_data,
            total_count: page.total_count,
        })
    }
}

fn to_log<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::search::{FindDetailParams, SearchParams, SearchPlansParams};
    use crate::store::{Document, MemoryStore, QueryPage};
    use async_trait::async_trait;
    use serde_json::json;
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Records every event as its message followed by `name=value` fields
    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<String>>>);

    impl LogCapture {
        fn contains(&self, needle: &str) -> bool {
            self.0.lock().unwrap().iter().any(|m| m.contains(needle))
        }
    }

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0.insert_str(0, &format!("{:?}", value));
            } else {
                self.0.push_str(&format!(" {}={:?}", field.name(), value));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for LogCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0.lock().unwrap().push(visitor.0);
        }
    }

    /// Memory store that counts round trips
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        fn name(&self) -> &str {
            "counting"
        }

        async fn aggregate(
            &self,
            collection: &str,
            pipeline: &Pipeline,
        ) -> Result<QueryPage, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.aggregate(collection, pipeline).await
        }

        async fn find_by_key(
            &self,
            collection: &str,
            key: &str,
        ) -> Result<Option<Document>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_key(collection, key).await
        }
    }

    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        async fn aggregate(&self, _: &str, _: &Pipeline) -> Result<QueryPage, StoreError> {
            Err(StoreError::new("connection reset"))
        }

        async fn find_by_key(&self, _: &str, _: &str) -> Result<Option<Document>, StoreError> {
            Err(StoreError::new("connection reset"))
        }
    }

    fn provider(i: usize) -> Document {
        json!({
            "ues_enterprise_provider_id": format!("p{:02}", i),
            "npi": format!("{}", 1_000_000_000 + i),
            "display_name": format!("Provider {}", i),
            "networkID": ["N1"],
            "associated_cpts": [{"code": "D2750", "weight": (i % 4) as f64}],
            "addresses": [{
                "displayAddress": format!("{} Main St", i),
                "geoCode": {"type": "Point", "coordinates": [-87.0, 41.0]}
            }]
        })
    }

    fn fixture() -> MemoryStore {
        MemoryStore::new()
            .with_collection("providers", (0..20).map(provider).collect())
            .with_collection(
                "plans",
                vec![
                    json!({"plan_name": "Vision Basic", "pes_network_ids": ["V1"]}),
                    json!({"plan_name": "Dental PPO", "pes_network_ids": ["N1", "N2"]}),
                    json!({"plan_name": "Dental HMO", "pes_network_ids": "N3"}),
                ],
            )
    }

    fn service(store: Arc<dyn DocumentStore>) -> SearchService {
        SearchService::new(store, ServiceConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_empty_input_skips_store() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(logs.clone()));

        let store = Arc::new(CountingStore::new(fixture()));
        let service = service(store.clone());

        let input = SearchInput::new(SearchParams::new()).unwrap();
        let result = service.search(&input).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(result.total_count, 0);
        assert_eq!(store.calls(), 0);
        assert!(logs.contains("No searchable filter"));
    }

    #[tokio::test]
    async fn test_search_pages_ranked_results() {
        let store = Arc::new(CountingStore::new(fixture()));
        let service = service(store.clone());

        let input = SearchInput::new(
            SearchParams::new()
                .with_cpt_codes(["d2750"])
                .with_network_ids(["N1"])
                .with_page(10, 5),
        )
        .unwrap();
        let result = service.search(&input).await.unwrap();

        // weights cycle 0..4, so ranks 11-15 are the weight-1 providers by key
        let keys: Vec<_> = result.paginated_data.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["p01", "p05", "p09", "p13", "p17"]);
        assert_eq!(result.total_count, 20);
        assert_eq!(store.calls(), 1);
        assert!(result.paginated_data[0].web_url.contains("cpt_codes=D2750"));
    }

    #[tokio::test]
    async fn test_ties_ordered_by_document_id_without_enterprise_id() {
        let docs = ["c", "b", "a"]
            .into_iter()
            .map(|id| {
                json!({
                    "_id": id,
                    "npi": "1000000000",
                    "display_name": format!("Provider {}", id),
                    "networkID": ["N1"]
                })
            })
            .collect();
        let store = MemoryStore::new().with_collection("providers", docs);
        let service = service(Arc::new(store));

        let input = SearchInput::new(SearchParams::new().with_network_ids(["N1"])).unwrap();
        let result = service.search(&input).await.unwrap();

        let keys: Vec<_> = result.paginated_data.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_numeric_phone_number_is_searchable() {
        let mut doc = provider(1);
        doc["addresses"][0]["phones"] = json!([
            {"type": "phone", "number": 3125550100u64, "confidence": 0.9}
        ]);
        let store = MemoryStore::new().with_collection("providers", vec![doc]);
        let service = service(Arc::new(store));

        let input = SearchInput::new(SearchParams::new().with_network_ids(["N1"])).unwrap();
        let result = service.search(&input).await.unwrap();

        let address = result.paginated_data[0].closest_address.as_ref().unwrap();
        assert_eq!(address.phone[0].number.as_deref(), Some("3125550100"));
    }

    #[tokio::test]
    async fn test_search_with_origin_reports_distance() {
        let service = service(Arc::new(fixture()));
        let input = SearchInput::new(
            SearchParams::new()
                .with_origin(41.0, -87.0)
                .with_page(0, 3),
        )
        .unwrap();

        let result = service.search(&input).await.unwrap();
        assert_eq!(result.paginated_data.len(), 3);
        assert_eq!(result.paginated_data[0].distance_in_miles, Some(0.0));
    }

    #[tokio::test]
    async fn test_store_failure_is_logged_and_returned() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(logs.clone()));

        let service = service(Arc::new(FailingStore));
        let input = SearchInput::new(SearchParams::new().with_network_ids(["N1"])).unwrap();

        let err = service.search(&input).await.unwrap_err();
        assert!(matches!(err, SearchError::Store(_)));
        assert!(err.to_string().contains("connection reset"));
        assert!(logs.contains("Provider search failed"));
        assert!(logs.contains(r#"input={"origin":null"#));
        assert!(logs.contains(r#""network_ids":["N1"]"#));
    }

    #[tokio::test]
    async fn test_lookup_failure_logs_input() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(logs.clone()));

        let service = service(Arc::new(FailingStore));
        let input = FindDetailInput::new(FindDetailParams::new("p01")).unwrap();

        assert!(service.find_by_key(&input).await.is_err());
        assert!(logs.contains("Provider lookup failed"));
        assert!(logs.contains(r#"input={"key":"p01""#));
    }

    #[tokio::test]
    async fn test_mapping_error_aborts_search() {
        let mut store = fixture();
        store.insert(
            "providers",
            json!({"ues_enterprise_provider_id": "broken", "networkID": ["N1"]}),
        );
        let service = service(Arc::new(store));
        let input = SearchInput::new(SearchParams::new().with_network_ids(["N1"]).with_page(0, 20))
            .unwrap();

        let err = service.search(&input).await.unwrap_err();
        assert!(matches!(err, SearchError::Mapping(_)));
    }

    #[tokio::test]
    async fn test_find_by_key() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(logs.clone()));

        let service = service(Arc::new(fixture()));
        let input = FindDetailInput::new(
            FindDetailParams::new("p03")
                .with_origin(41.0, -87.0)
                .with_cpt_codes(["d2750"]),
        )
        .unwrap();

        let result = service.find_by_key(&input).await.unwrap();
        assert!(result.is_found());
        let provider = result.data.as_ref().unwrap();
        assert_eq!(provider.full_name, "Provider 3");
        assert_eq!(provider.addresses[0].distance_in_miles, Some(0.0));
        assert_eq!(result.input_param.cpt_codes(), ["D2750"]);
        assert!(logs.contains("Provider found"));
    }

    #[tokio::test]
    async fn test_find_missing_key() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(logs.clone()));

        let service = service(Arc::new(fixture()));
        let input = FindDetailInput::new(FindDetailParams::new("nope")).unwrap();

        let result = service.find_by_key(&input).await.unwrap();
        assert!(result.data.is_none());
        assert_eq!(result.input_param.key(), "nope");
        assert!(logs.contains("Provider not found"));
    }

    #[tokio::test]
    async fn test_find_store_failure() {
        let service = service(Arc::new(FailingStore));
        let input = FindDetailInput::new(FindDetailParams::new("p01")).unwrap();
        assert!(matches!(
            service.find_by_key(&input).await,
            Err(SearchError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_search_plans() {
        let service = service(Arc::new(fixture()));

        let all = SearchPlansInput::new(SearchPlansParams::default()).unwrap();
        let result = service.search_plans(&all).await.unwrap();
        let names: Vec<_> = result.paginated_data.iter().map(|p| p.plan_name.as_str()).collect();
        assert_eq!(names, ["Dental HMO", "Dental PPO", "Vision Basic"]);
        assert_eq!(result.total_count, 3);

        let dental = SearchPlansInput::new(SearchPlansParams {
            query: Some("dental".to_string()),
            skip: 0,
            limit: Some(1),
        })
        .unwrap();
        let result = service.search_plans(&dental).await.unwrap();
        assert_eq!(result.total_count, 2);
        assert_eq!(result.paginated_data.len(), 1);
        assert_eq!(result.paginated_data[0].plan_name, "Dental HMO");
    }

    #[test]
    fn test_config_from_settings() {
        let mut settings = Settings::default();
        settings.store.collection = "dental".to_string();
        settings.scoring.cpt_score_weight = 2.0;

        let config = ServiceConfig::from(&settings);
        assert_eq!(config.collection, "dental");
        assert_eq!(config.scoring.cpt_score_weight, 2.0);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let config = ServiceConfig {
            provider_base_url: "::".to_string(),
            ..Default::default()
        };
        assert!(SearchService::new(Arc::new(MemoryStore::new()), config).is_err());
    }
}
