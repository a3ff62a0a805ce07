//! Prompt templates for each stage.

use crate::model::{ChangeRequest, ChangeValidationResponse, ImpactAssessment};

fn or_not_specified(items: &[String]) -> String {
    if items.is_empty() {
        "Not specified".to_string()
    } else {
        items.join(", ")
    }
}

fn bracketed(items: &[String]) -> String {
    format!("[{}]", items.join(", "))
}

/// Change request block; business rules are left out of the decision prompt.
pub fn change_request_block(request: &ChangeRequest, include_rules: bool) -> String {
    let mut block = format!(
        "Type: {}\nDescription: {}\nTarget Modules: {}\n",
        request.feature_type,
        request.description,
        or_not_specified(request.target_modules())
    );
    if include_rules {
        block.push_str(&format!(
            "Business Rules: {}\n",
            or_not_specified(request.business_rules())
        ));
    }
    block
}

pub fn validation_block(validation: &ChangeValidationResponse) -> String {
    format!(
        "Is Valid: {}\nConflicts: {}\nDuplicates: {}\nContradictions: {}\nReasoning: {}\n",
        validation.is_valid,
        bracketed(&validation.conflicts),
        bracketed(&validation.duplicates),
        bracketed(&validation.contradictions),
        validation.analysis.reasoning
    )
}

pub fn impact_block(impact: &ImpactAssessment) -> String {
    format!(
        "Has Impact: {}\nLevel: {}\nAffected Modules: {}\nAffected Endpoints: {}\n\
         Affected Flows: {}\nBreaking Changes: {}\nClient Impact: {}\nDetails: {}\n",
        impact.impact,
        impact.level,
        bracketed(&impact.affected_modules),
        bracketed(&impact.affected_endpoints),
        bracketed(&impact.affected_flows),
        bracketed(&impact.breaking_changes),
        impact.client_impact,
        impact.details
    )
}

pub fn question(context: &str, question: &str) -> String {
    format!(
        r#"You are an expert software architect analyzing a software repository.

Use the following pieces of context from the repository to answer the question.
If you don't know the answer based on the provided context, say so explicitly.

Context from repository:
{context}

Question: {question}

Provide a detailed, technically accurate answer based ONLY on the retrieved evidence.
Use terminology suitable for software engineers and architects.
If the context is insufficient, state what additional information would be needed.

Answer:"#
    )
}

pub fn validation(change_request: &str, context: &str) -> String {
    format!(
        r#"You are a software architect validating a change request against a software repository.

Analyze the change request and compare it with the retrieved repository context.

Change Request:
{change_request}

Repository Context:
{context}

Your task:
1. Determine if the request is logically valid
2. Check for conflicts with existing code, business rules, or API definitions
3. Identify if this duplicates an existing feature
4. Check for contradictions with documented behavior

Respond in JSON format:
{{
    "is_valid": true/false,
    "reasoning": "detailed explanation",
    "conflicts": ["list of conflicts"],
    "duplicates": ["list of duplicate features"],
    "contradictions": ["list of contradictions"]
}}

Response:"#
    )
}

pub fn impact(change_request: &str, context: &str) -> String {
    format!(
        r#"You are a software architect performing impact analysis on a software repository.

Analyze the proposed change and determine its impact on the existing codebase.

Change Request:
{change_request}

Repository Context:
{context}

Your task:
1. Identify all affected modules, endpoints, and business flows
2. Determine impact severity (None, Low, Medium, High, Critical)
3. List any breaking changes
4. Describe client-facing impact

Respond in JSON format:
{{
    "has_impact": true/false,
    "impact_level": "None|Low|Medium|High|Critical",
    "affected_modules": ["module1", "module2"],
    "affected_endpoints": ["/api/endpoint1", "/api/endpoint2"],
    "affected_flows": ["flow1", "flow2"],
    "breaking_changes": ["change1", "change2"],
    "client_impact": "description of client-facing impact",
    "details": "detailed impact analysis"
}}

Response:"#
    )
}

pub fn decision(change_request: &str, validation: &str, impact: &str) -> String {
    format!(
        r#"You are a software architect making a final decision on a change request.

Based on the validation and impact analysis, determine if the change is safe to implement.

Change Request:
{change_request}

Validation Results:
{validation}

Impact Assessment:
{impact}

Your task:
1. Review all evidence
2. Make a final decision: SAFE TO IMPLEMENT or CHANGE REQUEST WARNING
3. Provide recommended next steps
4. If warning, suggest mitigation steps

Respond in JSON format:
{{
    "decision": "SAFE TO IMPLEMENT" or "CHANGE REQUEST WARNING",
    "summary": "executive summary",
    "recommended_steps": ["step1", "step2"],
    "mitigation_steps": ["mitigation1", "mitigation2"] (only if warning)
}}

Response:"#
    )
}
