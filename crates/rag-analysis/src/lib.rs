//! RAG-Analysis: retrieval-augmented reasoning over an indexed repository
//!
//! Every stage retrieves evidence from a `VectorStore`, prompts a
//! `LanguageModel`, and turns the reply into a typed response. Model output
//! is parsed JSON-first with a heuristic fallback, so a chatty model never
//! fails a request on formatting alone.
//!
//! ## Layer 3 - Analysis
//!
//! Focus: typed responses, bounded confidence, evidence-backed claims.
//!
//! ## Key Components
//!
//! - `AnalysisService`: orchestrates the stages
//! - `stages`: question answering, validation, impact, decision
//! - `extract`: two-tier result extraction
//! - `OpenAiChatModel`: chat completion client
//! - `fakes::ScriptedModel`: deterministic model for tests

mod error;
pub mod extract;
pub mod fakes;
mod llm;
mod model;
pub mod obs;
pub mod prompts;
mod retriever;
mod service;
pub mod signals;
pub mod stages;

pub use error::{AnalysisError, LlmError, StageResult};
pub use extract::{extract, Extraction, ExtractionTier, FieldKind, FieldSpec};
pub use llm::{ChatConfig, LanguageModel, OpenAiChatModel, DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL};
pub use model::{
    AnalysisResult, ChangeRequest, ChangeValidationResponse, Confidence, DecisionResponse,
    DecisionType, ImpactAnalysis, ImpactAssessment, ImpactLevel, QuestionRequest,
    QuestionResponse, RepositoryEvidence, DEFAULT_MAX_RESULTS, MAX_RESULTS_LIMIT,
};
pub use retriever::{join_context, EvidenceRetriever};
pub use service::AnalysisService;
