//! Impact analysis: severity and affected surface area of a change.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tracing::{info, instrument};
use vector_state::Metadata;

use crate::error::StageResult;
use crate::extract::{extract, FieldKind, FieldSpec};
use crate::llm::LanguageModel;
use crate::model::{ChangeRequest, ImpactAnalysis, ImpactAssessment, ImpactLevel, RepositoryEvidence};
use crate::retriever::{join_context, EvidenceRetriever};
use crate::{obs, prompts};

/// Fragments retrieved for impact analysis
pub const IMPACT_K: usize = 15;

const STAGE: &str = "impact";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("has_impact", FieldKind::Flag),
    FieldSpec::new("impact_level", FieldKind::Severity),
    FieldSpec::new("affected_modules", FieldKind::List),
    FieldSpec::new("affected_endpoints", FieldKind::List),
    FieldSpec::new("affected_flows", FieldKind::List),
    FieldSpec::new("breaking_changes", FieldKind::List),
    FieldSpec::new("client_impact", FieldKind::Text),
    FieldSpec::new("details", FieldKind::Narrative),
];

pub struct ImpactStage {
    retriever: EvidenceRetriever,
    model: Arc<dyn LanguageModel>,
}

impl ImpactStage {
    pub fn new(retriever: EvidenceRetriever, model: Arc<dyn LanguageModel>) -> Self {
        ImpactStage { retriever, model }
    }

    #[instrument(skip(self, request), fields(feature_type = %request.feature_type))]
    pub async fn analyze(&self, request: &ChangeRequest) -> StageResult<ImpactAnalysis> {
        request.validate()?;
        let started = Instant::now();
        info!("Analyzing impact for: {}", request.description);

        let documents = self
            .retriever
            .retrieve(&request.search_query(), IMPACT_K, None)
            .await?;
        obs::emit_evidence_retrieved(STAGE, IMPACT_K, documents.len());

        let prompt = prompts::impact(
            &prompts::change_request_block(request, true),
            &join_context(&documents),
        );
        let raw = self.model.complete(&prompt).await?;
        let extraction = extract(&raw, FIELDS);
        obs::emit_output_extracted(STAGE, extraction.tier);

        let level = extraction
            .text("impact_level")
            .map(|label| ImpactLevel::from_keyword(&label))
            .unwrap_or(ImpactLevel::None);

        let assessment = ImpactAssessment {
            impact: extraction.flag("has_impact"),
            level,
            details: extraction.text("details").unwrap_or_default(),
            affected_modules: extraction.list("affected_modules"),
            affected_endpoints: extraction.list("affected_endpoints"),
            affected_flows: extraction.list("affected_flows"),
            client_impact: extraction.text("client_impact").unwrap_or_default(),
            breaking_changes: extraction.list("breaking_changes"),
        };

        let mut metadata = Metadata::new();
        metadata.insert("change_type".to_string(), json!(request.feature_type));
        metadata.insert("num_results".to_string(), json!(documents.len()));
        let evidence = RepositoryEvidence::from_documents(&documents, metadata);

        obs::emit_stage_finished(STAGE, started.elapsed().as_millis() as u64);
        Ok(ImpactAnalysis {
            assessment,
            evidence,
        })
    }
}
