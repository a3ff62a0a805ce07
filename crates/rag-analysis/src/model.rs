//! Request and response types for repository analysis.
//!
//! Every value here is built fresh per request. Wire names and labels match
//! the JSON contract of the HTTP API.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use vector_state::{Document, Metadata};

use crate::error::{AnalysisError, StageResult};

/// Default number of evidence fragments for a question
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Upper bound on `QuestionRequest::max_results`
pub const MAX_RESULTS_LIMIT: usize = 20;

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// A score in `[0.0, 1.0]`. Out-of-range and NaN inputs are clamped.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Confidence(0.0);
        }
        Confidence(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// The lower of this score and `ceiling`
    pub fn capped_at(self, ceiling: f64) -> Self {
        Confidence::new(self.0.min(ceiling))
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Confidence::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

// ---------------------------------------------------------------------------
// Evidence and analysis
// ---------------------------------------------------------------------------

/// Retrieved fragments plus the files they came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryEvidence {
    /// Fragment texts in rank order (duplicates kept)
    pub chunks: Vec<String>,
    /// Unique source identifiers in first-seen order
    pub file_paths: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl RepositoryEvidence {
    pub fn from_documents(documents: &[Document], metadata: Metadata) -> Self {
        let chunks = documents.iter().map(|d| d.text.clone()).collect();
        let file_paths = unique_in_order(documents.iter().map(|d| d.source_path().to_string()));
        RepositoryEvidence {
            chunks,
            file_paths,
            metadata,
        }
    }

    /// Concatenate chunks, union sources, and sum `num_results`.
    ///
    /// Other metadata keys keep this evidence's value when both sides set them.
    pub fn merge(mut self, other: RepositoryEvidence) -> Self {
        let total = self.num_results() + other.num_results();
        self.chunks.extend(other.chunks);
        self.file_paths = unique_in_order(self.file_paths.into_iter().chain(other.file_paths));
        for (key, value) in other.metadata {
            self.metadata.entry(key).or_insert(value);
        }
        self.metadata
            .insert("num_results".to_string(), serde_json::Value::from(total));
        self
    }

    pub fn num_results(&self) -> u64 {
        self.metadata
            .get("num_results")
            .and_then(|v| v.as_u64())
            .unwrap_or(self.chunks.len() as u64)
    }
}

fn unique_in_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Reasoning produced by a stage, with a confidence and derived signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub reasoning: String,
    pub confidence: Confidence,
    #[serde(default)]
    pub related_modules: BTreeSet<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

// ---------------------------------------------------------------------------
// Impact
// ---------------------------------------------------------------------------

/// Ordinal impact severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImpactLevel {
    #[serde(rename = "No Impact")]
    None,
    #[serde(rename = "Low Impact")]
    Low,
    #[serde(rename = "Medium Impact")]
    Medium,
    #[serde(rename = "High Impact")]
    High,
    #[serde(rename = "Critical Impact")]
    Critical,
}

impl ImpactLevel {
    /// Highest first, the order the severity scan checks keywords in
    pub const DESCENDING: [ImpactLevel; 5] = [
        ImpactLevel::Critical,
        ImpactLevel::High,
        ImpactLevel::Medium,
        ImpactLevel::Low,
        ImpactLevel::None,
    ];

    /// Keyword the model is asked to answer with
    pub fn keyword(&self) -> &'static str {
        match self {
            ImpactLevel::None => "none",
            ImpactLevel::Low => "low",
            ImpactLevel::Medium => "medium",
            ImpactLevel::High => "high",
            ImpactLevel::Critical => "critical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactLevel::None => "No Impact",
            ImpactLevel::Low => "Low Impact",
            ImpactLevel::Medium => "Medium Impact",
            ImpactLevel::High => "High Impact",
            ImpactLevel::Critical => "Critical Impact",
        }
    }

    /// Parse a keyword ("High") or wire label ("High Impact"),
    /// case-insensitively. Anything else is `None`.
    pub fn from_keyword(value: &str) -> Self {
        let value = value.trim();
        Self::DESCENDING
            .into_iter()
            .find(|level| {
                value.eq_ignore_ascii_case(level.keyword()) || value.eq_ignore_ascii_case(level.label())
            })
            .unwrap_or(ImpactLevel::None)
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity and surface area of a proposed change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAssessment {
    /// Whether any impact was detected
    pub impact: bool,
    pub level: ImpactLevel,
    pub details: String,
    #[serde(default)]
    pub affected_modules: Vec<String>,
    #[serde(default)]
    pub affected_endpoints: Vec<String>,
    #[serde(default)]
    pub affected_flows: Vec<String>,
    pub client_impact: String,
    #[serde(default)]
    pub breaking_changes: Vec<String>,
}

/// Impact stage output: the assessment and the evidence it was based on.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactAnalysis {
    pub assessment: ImpactAssessment,
    pub evidence: RepositoryEvidence,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

/// A free-form question about the indexed repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl QuestionRequest {
    pub fn new(question: impl Into<String>) -> Self {
        QuestionRequest {
            question: question.into(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Only `max_results` is bounded; the question is taken as given.
    pub fn validate(&self) -> StageResult<()> {
        if !(1..=MAX_RESULTS_LIMIT).contains(&self.max_results) {
            return Err(AnalysisError::InvalidRequest(format!(
                "max_results must be between 1 and {MAX_RESULTS_LIMIT}, got {}",
                self.max_results
            )));
        }
        Ok(())
    }
}

/// A proposed change or feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub description: String,
    /// Free-form tag: new_feature, modification, extension, deprecation, ...
    pub feature_type: String,
    #[serde(default)]
    pub target_modules: Option<Vec<String>>,
    #[serde(default)]
    pub business_rules: Option<Vec<String>>,
}

impl ChangeRequest {
    pub fn new(description: impl Into<String>, feature_type: impl Into<String>) -> Self {
        ChangeRequest {
            description: description.into(),
            feature_type: feature_type.into(),
            target_modules: None,
            business_rules: None,
        }
    }

    pub fn with_target_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_modules = Some(modules.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_business_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.business_rules = Some(rules.into_iter().map(Into::into).collect());
        self
    }

    /// A blank description is rejected; the feature tag is free-form and may
    /// be empty.
    pub fn validate(&self) -> StageResult<()> {
        if self.description.trim().is_empty() {
            return Err(AnalysisError::InvalidRequest(
                "description must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn target_modules(&self) -> &[String] {
        self.target_modules.as_deref().unwrap_or(&[])
    }

    pub fn business_rules(&self) -> &[String] {
        self.business_rules.as_deref().unwrap_or(&[])
    }

    /// Description, feature tag, then target modules, space-joined.
    pub fn search_query(&self) -> String {
        let mut terms = vec![self.description.as_str(), self.feature_type.as_str()];
        terms.extend(self.target_modules().iter().map(String::as_str));
        terms.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub summary: String,
    pub repository_evidence: RepositoryEvidence,
    pub analysis: AnalysisResult,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeValidationResponse {
    pub summary: String,
    pub repository_evidence: RepositoryEvidence,
    pub analysis: AnalysisResult,
    pub is_valid: bool,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub duplicates: Vec<String>,
    #[serde(default)]
    pub contradictions: Vec<String>,
}

/// Final go/no-go outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecisionType {
    #[serde(rename = "SAFE TO IMPLEMENT")]
    SafeToImplement,
    #[serde(rename = "CHANGE REQUEST WARNING")]
    ChangeRequestWarning,
}

impl DecisionType {
    /// "SAFE" or "IMPLEMENT" anywhere (any case) means safe.
    pub fn classify(verdict: &str) -> Self {
        let upper = verdict.to_uppercase();
        if upper.contains("SAFE") || upper.contains("IMPLEMENT") {
            DecisionType::SafeToImplement
        } else {
            DecisionType::ChangeRequestWarning
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DecisionType::SafeToImplement => "SAFE TO IMPLEMENT",
            DecisionType::ChangeRequestWarning => "CHANGE REQUEST WARNING",
        }
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub summary: String,
    pub repository_evidence: RepositoryEvidence,
    pub analysis: AnalysisResult,
    pub impact_assessment: ImpactAssessment,
    pub decision: DecisionType,
    pub recommended_next_steps: Vec<String>,
    /// Present exactly when `decision` is a warning
    pub mitigation_steps: Option<Vec<String>>,
}

impl DecisionResponse {
    /// Build a decision, keeping `mitigation_steps` only for warnings.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        summary: String,
        repository_evidence: RepositoryEvidence,
        analysis: AnalysisResult,
        impact_assessment: ImpactAssessment,
        decision: DecisionType,
        recommended_next_steps: Vec<String>,
        mitigation_steps: Vec<String>,
    ) -> Self {
        let mitigation_steps = match decision {
            DecisionType::ChangeRequestWarning => Some(mitigation_steps),
            DecisionType::SafeToImplement => None,
        };
        DecisionResponse {
            summary,
            repository_evidence,
            analysis,
            impact_assessment,
            decision,
            recommended_next_steps,
            mitigation_steps,
        }
    }
}
