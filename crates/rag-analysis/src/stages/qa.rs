//! Question answering over retrieved evidence.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{info, instrument};
use vector_state::Metadata;

use crate::error::StageResult;
use crate::llm::LanguageModel;
use crate::model::{AnalysisResult, Confidence, QuestionRequest, QuestionResponse, RepositoryEvidence};
use crate::retriever::{join_context, EvidenceRetriever};
use crate::signals::{dependency_lines, related_modules, KeywordMatch, QA_DEPENDENCY_KEYWORDS};
use crate::{obs, prompts};

/// Fragments fed to the model as answer context
pub const CONTEXT_K: usize = 5;

/// Confidence reported for every answer
pub const QA_CONFIDENCE: f64 = 0.85;

const STAGE: &str = "qa";

pub struct QaStage {
    retriever: EvidenceRetriever,
    model: Arc<dyn LanguageModel>,
}

impl QaStage {
    pub fn new(retriever: EvidenceRetriever, model: Arc<dyn LanguageModel>) -> Self {
        QaStage { retriever, model }
    }

    /// Answer `request.question` from the indexed repository.
    ///
    /// Evidence is the top `max_results` fragments; the model sees the top
    /// [`CONTEXT_K`] as context.
    #[instrument(skip(self, request), fields(max_results = request.max_results))]
    pub async fn answer(&self, request: &QuestionRequest) -> StageResult<QuestionResponse> {
        request.validate()?;
        let started = Instant::now();
        info!("Processing question: {}", request.question);

        let documents = self
            .retriever
            .retrieve(&request.question, request.max_results, None)
            .await?;
        obs::emit_evidence_retrieved(STAGE, request.max_results, documents.len());

        let context_documents = self
            .retriever
            .retrieve(&request.question, CONTEXT_K, None)
            .await?;
        let prompt = prompts::question(&join_context(&context_documents), &request.question);
        let answer = self.model.complete(&prompt).await?;

        let mut metadata = Metadata::new();
        metadata.insert("num_results".to_string(), json!(documents.len()));
        metadata.insert("query".to_string(), json!(request.question));
        let evidence = RepositoryEvidence::from_documents(&documents, metadata);

        let analysis = AnalysisResult {
            reasoning: answer.clone(),
            confidence: Confidence::new(QA_CONFIDENCE),
            related_modules: related_modules(&evidence.file_paths),
            dependencies: dependency_lines(
                &evidence.chunks,
                QA_DEPENDENCY_KEYWORDS,
                KeywordMatch::CaseInsensitive,
            ),
        };

        obs::emit_stage_finished(STAGE, started.elapsed().as_millis() as u64);
        Ok(QuestionResponse {
            summary: format!("Answer to: {}", request.question),
            repository_evidence: evidence,
            analysis,
            answer,
        })
    }
}
