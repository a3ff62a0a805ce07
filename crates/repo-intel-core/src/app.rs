//! Collaborator wiring.
//!
//! Every client is built once here and shared by `Arc`; nothing is global.

use std::sync::Arc;

use rag_analysis::{AnalysisService, ChatConfig, LanguageModel, OpenAiChatModel};
use tracing::info;
use vector_state::{
    EmbeddingConfig, Embedder, OpenAiEmbedder, SupabaseConfig, SupabaseVectorStore,
    SurrealConfig, SurrealVectorStore, VectorStore,
};

use crate::error::SettingsError;
use crate::indexing::RepositoryService;
use crate::settings::{Settings, VectorBackend};

/// Shared handles for the analysis and indexing services.
#[derive(Clone)]
pub struct RepoIntel {
    pub settings: Settings,
    pub store: Arc<dyn VectorStore>,
    pub analysis: Arc<AnalysisService>,
    pub repository: Arc<RepositoryService>,
}

impl RepoIntel {
    /// Build the OpenAI clients and the configured vector store.
    pub async fn from_settings(settings: Settings) -> Result<Self, SettingsError> {
        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAiEmbedder::new(EmbeddingConfig::from_env()?)?);

        let store: Arc<dyn VectorStore> = match settings.vector_backend {
            VectorBackend::Supabase => Arc::new(SupabaseVectorStore::new(
                SupabaseConfig::from_env()?,
                embedder,
            )?),
            VectorBackend::Surreal => {
                Arc::new(SurrealVectorStore::connect(SurrealConfig::from_env(), embedder).await?)
            }
        };
        info!("Vector backend: {:?}", settings.vector_backend);

        let model: Arc<dyn LanguageModel> = Arc::new(OpenAiChatModel::new(ChatConfig::from_env()?)?);
        Ok(Self::with_components(settings, store, model))
    }

    /// Wire services over caller-supplied collaborators.
    pub fn with_components(
        settings: Settings,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let analysis = Arc::new(AnalysisService::new(Arc::clone(&store), model));
        let repository = Arc::new(RepositoryService::new(
            Arc::clone(&store),
            settings.chunk_size,
            settings.chunk_overlap,
        ));
        RepoIntel {
            settings,
            store,
            analysis,
            repository,
        }
    }
}
