//! Decision synthesis: merge validation and impact, ask for a verdict.
//!
//! No retrieval happens here. Evidence and analysis are merged from the two
//! upstream stages.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use crate::error::StageResult;
use crate::extract::{extract, FieldKind, FieldSpec};
use crate::llm::LanguageModel;
use crate::model::{
    AnalysisResult, ChangeRequest, ChangeValidationResponse, DecisionResponse, DecisionType,
    ImpactAnalysis,
};
use crate::{obs, prompts};

/// Ceiling on the merged confidence
pub const DECISION_CONFIDENCE_CEILING: f64 = 0.9;

/// Summary used when the model gives none
pub const DEFAULT_SUMMARY: &str = "Decision on change request";

const STAGE: &str = "decision";

const FIELDS: &[FieldSpec] = &[
    FieldSpec::new("decision", FieldKind::Verdict),
    FieldSpec::new("summary", FieldKind::Summary),
    FieldSpec::new("recommended_steps", FieldKind::List),
    FieldSpec::new("mitigation_steps", FieldKind::List),
];

pub struct DecisionStage {
    model: Arc<dyn LanguageModel>,
}

impl DecisionStage {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        DecisionStage { model }
    }

    #[instrument(skip_all, fields(is_valid = validation.is_valid, level = %impact.assessment.level))]
    pub async fn decide(
        &self,
        request: &ChangeRequest,
        validation: &ChangeValidationResponse,
        impact: &ImpactAnalysis,
    ) -> StageResult<DecisionResponse> {
        let started = Instant::now();
        info!("Making final decision on change request");

        let prompt = prompts::decision(
            &prompts::change_request_block(request, false),
            &prompts::validation_block(validation),
            &prompts::impact_block(&impact.assessment),
        );
        let raw = self.model.complete(&prompt).await?;
        let extraction = extract(&raw, FIELDS);
        obs::emit_output_extracted(STAGE, extraction.tier);

        let decision = DecisionType::classify(&extraction.text("decision").unwrap_or_default());
        let summary = extraction
            .text("summary")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUMMARY.to_string());

        let mut related_modules = validation.analysis.related_modules.clone();
        related_modules.extend(impact.assessment.affected_modules.iter().cloned());

        let analysis = AnalysisResult {
            reasoning: format!(
                "{}\n\nImpact: {}",
                validation.analysis.reasoning, impact.assessment.details
            ),
            confidence: validation
                .analysis
                .confidence
                .capped_at(DECISION_CONFIDENCE_CEILING),
            related_modules,
            dependencies: validation.analysis.dependencies.clone(),
        };

        let evidence = validation
            .repository_evidence
            .clone()
            .merge(impact.evidence.clone());

        obs::emit_stage_finished(STAGE, started.elapsed().as_millis() as u64);
        Ok(DecisionResponse::new(
            summary,
            evidence,
            analysis,
            impact.assessment.clone(),
            decision,
            extraction.list("recommended_steps"),
            extraction.list("mitigation_steps"),
        ))
    }
}
