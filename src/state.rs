use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::config::{AppPaths, Settings};
use crate::docstore::DocStore;
use crate::llm::client::{GenerationBackend, OpenAiCompatClient};
use crate::rag::{ChunkerConfig, HttpEmbedder, RagEngine, RuleSet, VectorIndex};
use crate::translate::{HttpTranslator, NoopTranslator, Translator};

#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub engine: Arc<RagEngine>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Compose all services. The embedding backend probe is the only step
    /// allowed to abort startup; everything downstream degrades at runtime.
    pub async fn initialize(paths: AppPaths) -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(paths);
        let settings = Settings::load(&paths)?;

        let docs = DocStore::new(paths.docs_dir.clone());

        let embedder = HttpEmbedder::connect(&settings.embedding)
            .await
            .context("embedding backend unavailable at startup")?;
        let mut index = VectorIndex::new(Arc::new(embedder), paths.index_path.clone());
        index.load();

        let translator: Arc<dyn Translator> = if settings.translation.enabled {
            Arc::new(HttpTranslator::new(&settings.translation.base_url))
        } else {
            Arc::new(NoopTranslator)
        };
        let generator: Arc<dyn GenerationBackend> =
            Arc::new(OpenAiCompatClient::new(&settings.generation)?);

        let engine = Arc::new(RagEngine::new(
            index,
            RuleSet::builtin(),
            translator,
            generator,
            docs,
            ChunkerConfig::default(),
            settings.retrieval.clone(),
        ));

        if let Err(err) = engine.ingest_all().await {
            tracing::warn!("Initial document indexing failed: {}", err);
        }

        Ok(Arc::new(AppState {
            paths,
            settings,
            engine,
            started_at: Utc::now(),
        }))
    }
}
