//! Application state.

use clipcast_pipeline::{Pipeline, PipelineConfig};
use clipcast_publish::YoutubeClient;
use clipcast_store::{Database, JobStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: JobStore,
    pub pipeline: Pipeline,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let store = JobStore::new(Database::open(&config.database_path)?);
        let publisher = YoutubeClient::from_env()?;
        let pipeline = Pipeline::new(store.clone(), publisher, PipelineConfig::from_env())?;

        Ok(Self {
            config,
            store,
            pipeline,
        })
    }
}
