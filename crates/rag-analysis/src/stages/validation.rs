//! Change validation: validity, conflicts, duplicates, contradictions.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{info, instrument};
use vector_state::Metadata;

use crate::error::StageResult;
use crate::extract::{extract, FieldKind, FieldSpec};
use crate::llm::LanguageModel;
use crate::model::{
    AnalysisResult, ChangeRequest, ChangeValidationResponse, Confidence, RepositoryEvidence,
};
use crate::retriever::{join_context, EvidenceRetriever};
use crate::signals::{dependency_lines, related_modules, KeywordMatch, IMPORT_KEYWORDS};
use crate::{obs, prompts};

/// Fragments retrieved for validation
pub const VALIDATION_K: usize = 10;

/// Confidence when the change is judged valid
pub const VALID_CONFIDENCE: f64 = 0.8;

/// Confidence when the change is judged invalid
pub const INVALID_CONFIDENCE: f64 = 0.9;

const STAGE: &str = "validation";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("is_valid", FieldKind::Flag),
    FieldSpec::new("reasoning", FieldKind::Narrative),
    FieldSpec::new("conflicts", FieldKind::List),
    FieldSpec::new("duplicates", FieldKind::List),
    FieldSpec::new("contradictions", FieldKind::List),
];

pub struct ValidationStage {
    retriever: EvidenceRetriever,
    model: Arc<dyn LanguageModel>,
}

impl ValidationStage {
    pub fn new(retriever: EvidenceRetriever, model: Arc<dyn LanguageModel>) -> Self {
        ValidationStage { retriever, model }
    }

    #[instrument(skip(self, request), fields(feature_type = %request.feature_type))]
    pub async fn validate(&self, request: &ChangeRequest) -> StageResult<ChangeValidationResponse> {
        request.validate()?;
        let started = Instant::now();
        info!("Validating change request: {}", request.description);

        let documents = self
            .retriever
            .retrieve(&request.search_query(), VALIDATION_K, None)
            .await?;
        obs::emit_evidence_retrieved(STAGE, VALIDATION_K, documents.len());

        let prompt = prompts::validation(
            &prompts::change_request_block(request, true),
            &join_context(&documents),
        );
        let raw = self.model.complete(&prompt).await?;
        let extraction = extract(&raw, FIELDS);
        obs::emit_output_extracted(STAGE, extraction.tier);

        let mut metadata = Metadata::new();
        metadata.insert("change_type".to_string(), json!(request.feature_type));
        metadata.insert("num_results".to_string(), json!(documents.len()));
        let evidence = RepositoryEvidence::from_documents(&documents, metadata);

        let is_valid = extraction.flag("is_valid");
        let mut modules = related_modules(&evidence.file_paths);
        modules.extend(request.target_modules().iter().cloned());

        let analysis = AnalysisResult {
            reasoning: extraction.text("reasoning").unwrap_or_default(),
            confidence: Confidence::new(if is_valid {
                VALID_CONFIDENCE
            } else {
                INVALID_CONFIDENCE
            }),
            related_modules: modules,
            dependencies: dependency_lines(
                &evidence.chunks,
                IMPORT_KEYWORDS,
                KeywordMatch::CaseSensitive,
            ),
        };

        obs::emit_stage_finished(STAGE, started.elapsed().as_millis() as u64);
        Ok(ChangeValidationResponse {
            summary: format!("Validation of {} change request", request.feature_type),
            repository_evidence: evidence,
            analysis,
            is_valid,
            conflicts: extraction.list("conflicts"),
            duplicates: extraction.list("duplicates"),
            contradictions: extraction.list("contradictions"),
        })
    }
}
