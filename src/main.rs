//! provider-search command-line front end
//!
//! Runs provider and plan searches against a JSON fixture file held in
//! memory, or against MongoDB when built with the `mongodb` feature.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use provider_search::{
    config::{self, Settings},
    search::{
        FindDetailInput, FindDetailParams, SearchInput, SearchParams, SearchPlansInput,
        SearchPlansParams,
    },
    store::{Document, DocumentStore, MemoryStore},
    SearchService, ServiceConfig,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(
    name = "provider-search",
    about = "Search healthcare providers by procedure, location and network",
    version
)]
struct Cli {
    /// Path to settings.yml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// JSON file with `providers` and `plans` arrays to search in memory
    #[arg(short, long, global = true, env = "PROVIDER_SEARCH_DATA")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search providers
    Search {
        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Search radius in meters (default: 30 miles)
        #[arg(long)]
        radius: Option<f64>,

        /// CPT codes; repeatable or comma separated
        #[arg(long = "cpt")]
        cpt_codes: Vec<String>,

        /// Network ids; repeatable or comma separated
        #[arg(long = "network")]
        network_ids: Vec<String>,

        #[arg(long, default_value = "0")]
        skip: u64,

        /// Page size, 1 to 20
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Look up one provider by key
    Find {
        key: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lng: Option<f64>,

        #[arg(long = "cpt")]
        cpt_codes: Vec<String>,

        #[arg(long = "network")]
        network_ids: Vec<String>,
    },

    /// List plans, optionally matching a name query
    Plans {
        query: Option<String>,

        #[arg(long, default_value = "0")]
        skip: u64,

        #[arg(long)]
        limit: Option<u32>,
    },
}

/// Fixture file layout
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Fixture {
    providers: Vec<Document>,
    plans: Vec<Document>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the JSON result
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!("Starting provider-search v{}", provider_search::VERSION);

    let settings = config::load(cli.config.as_deref())?;
    let store = open_store(&settings, cli.data.as_deref()).await?;
    let service = SearchService::new(store, ServiceConfig::from(&settings))?;

    match cli.command {
        Commands::Search {
            lat,
            lng,
            radius,
            cpt_codes,
            network_ids,
            skip,
            limit,
        } => {
            let input = SearchInput::new(SearchParams {
                lat,
                lng,
                radius_in_meters: radius,
                cpt_codes,
                network_ids,
                skip,
                limit,
            })?;
            print_json(&service.search(&input).await?)
        }
        Commands::Find {
            key,
            lat,
            lng,
            cpt_codes,
            network_ids,
        } => {
            let input = FindDetailInput::new(FindDetailParams {
                key,
                lat,
                lng,
                radius_in_meters: None,
                cpt_codes,
                network_ids,
            })?;
            print_json(&service.find_by_key(&input).await?)
        }
        Commands::Plans { query, skip, limit } => {
            let input = SearchPlansInput::new(SearchPlansParams { query, skip, limit })?;
            print_json(&service.search_plans(&input).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_store(settings: &Settings, data: Option<&Path>) -> Result<Arc<dyn DocumentStore>> {
    if let Some(path) = data {
        return Ok(Arc::new(load_fixture(path, settings)?));
    }

    match connect_remote(settings).await? {
        Some(store) => Ok(store),
        None => bail!(
            "no document store configured: pass --data <FILE>, or set store.uri \
             in a build with the `mongodb` feature"
        ),
    }
}

fn load_fixture(path: &Path, settings: &Settings) -> Result<MemoryStore> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let fixture: Fixture = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse fixture {}", path.display()))?;

    info!(
        "Loaded {} providers and {} plans from {}",
        fixture.providers.len(),
        fixture.plans.len(),
        path.display()
    );

    Ok(MemoryStore::new()
        .with_collection(settings.store.collection.clone(), fixture.providers)
        .with_collection(settings.store.plans_collection.clone(), fixture.plans))
}

#[cfg(feature = "mongodb")]
async fn connect_remote(settings: &Settings) -> Result<Option<Arc<dyn DocumentStore>>> {
    use provider_search::store::MongoStore;

    let Some(uri) = settings.store.uri.as_deref() else {
        return Ok(None);
    };
    let store = MongoStore::connect(uri, &settings.store.db_name).await?;
    Ok(Some(Arc::new(store)))
}

#[cfg(not(feature = "mongodb"))]
async fn connect_remote(settings: &Settings) -> Result<Option<Arc<dyn DocumentStore>>> {
    if settings.store.uri.is_some() {
        tracing::warn!("store.uri is set but this build has no MongoDB support");
    }
    Ok(None)
}
