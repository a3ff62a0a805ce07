//! Analysis orchestrator.
//!
//! Owns one instance of each stage over a shared store and model.
//! `full_analysis` runs validation, impact and decision in that order; the
//! decision runs whatever validation concluded, and any stage failure fails
//! the whole request.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};
use vector_state::VectorStore;

use crate::error::StageResult;
use crate::llm::LanguageModel;
use crate::model::{
    ChangeRequest, ChangeValidationResponse, DecisionResponse, ImpactAssessment, QuestionRequest,
    QuestionResponse,
};
use crate::obs;
use crate::retriever::EvidenceRetriever;
use crate::stages::{DecisionStage, ImpactStage, QaStage, ValidationStage};

pub struct AnalysisService {
    qa: QaStage,
    validation: ValidationStage,
    impact: ImpactStage,
    decision: DecisionStage,
}

impl AnalysisService {
    pub fn new(store: Arc<dyn VectorStore>, model: Arc<dyn LanguageModel>) -> Self {
        let retriever = EvidenceRetriever::new(store);
        AnalysisService {
            qa: QaStage::new(retriever.clone(), Arc::clone(&model)),
            validation: ValidationStage::new(retriever.clone(), Arc::clone(&model)),
            impact: ImpactStage::new(retriever, Arc::clone(&model)),
            decision: DecisionStage::new(model),
        }
    }

    pub async fn answer_question(&self, request: &QuestionRequest) -> StageResult<QuestionResponse> {
        self.qa
            .answer(request)
            .await
            .inspect_err(|e| obs::emit_pipeline_failed("qa", e))
    }

    pub async fn validate_change(
        &self,
        request: &ChangeRequest,
    ) -> StageResult<ChangeValidationResponse> {
        self.validation
            .validate(request)
            .await
            .inspect_err(|e| obs::emit_pipeline_failed("validation", e))
    }

    /// Impact assessment alone; the evidence gathered for it is dropped.
    pub async fn analyze_impact(&self, request: &ChangeRequest) -> StageResult<ImpactAssessment> {
        self.impact
            .analyze(request)
            .await
            .map(|analysis| analysis.assessment)
            .inspect_err(|e| obs::emit_pipeline_failed("impact", e))
    }

    /// Validation, then impact, then a decision over both.
    #[instrument(skip(self, request), fields(feature_type = %request.feature_type))]
    pub async fn full_analysis(&self, request: &ChangeRequest) -> StageResult<DecisionResponse> {
        request.validate()?;
        let started = Instant::now();
        info!("Starting full analysis for: {}", request.description);

        let validation = self.validate_change(request).await?;
        let impact = self
            .impact
            .analyze(request)
            .await
            .inspect_err(|e| obs::emit_pipeline_failed("impact", e))?;
        let decision = self
            .decision
            .decide(request, &validation, &impact)
            .await
            .inspect_err(|e| obs::emit_pipeline_failed("decision", e))?;

        obs::emit_stage_finished("full_analysis", started.elapsed().as_millis() as u64);
        Ok(decision)
    }
}
