//! Structured events for analysis stage lifecycle.
//!
//! Events are emitted at `info!` level with an `event` field so JSON log
//! pipelines can filter on them. Stage methods carry their own
//! `#[instrument]` spans; these events ride inside them.

use tracing::{info, warn};

use crate::extract::ExtractionTier;

/// Emit event: stage retrieved its evidence.
pub fn emit_evidence_retrieved(stage: &str, k: usize, returned: usize) {
    info!(
        event = "analysis.evidence_retrieved",
        stage = %stage,
        k = k,
        returned = returned,
    );
}

/// Emit event: model output parsed.
pub fn emit_output_extracted(stage: &str, tier: ExtractionTier) {
    info!(event = "analysis.output_extracted", stage = %stage, tier = ?tier);
}

/// Emit event: stage finished.
pub fn emit_stage_finished(stage: &str, duration_ms: u64) {
    info!(event = "analysis.stage_finished", stage = %stage, duration_ms = duration_ms);
}

/// Emit event: pipeline aborted on a stage failure (warning level).
pub fn emit_pipeline_failed(stage: &str, error: &dyn std::fmt::Display) {
    warn!(event = "analysis.pipeline_failed", stage = %stage, error = %error);
}
