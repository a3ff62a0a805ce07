//! Structured-field recovery from free-form model output.
//!
//! Two tiers, first success wins:
//!
//! 1. **Structured**: the span from the first `{` to the last `}` parses as a
//!    JSON object. The object is returned as-is; field names are not checked.
//! 2. **Heuristic**: each expected field is recovered from the raw text
//!    according to its [`FieldKind`].
//!
//! Extraction never fails. An unparseable response still yields an
//! [`Extraction`] whose accessors return empty values.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::ImpactLevel;

/// Characters kept for a heuristic summary
pub const SUMMARY_CHARS: usize = 200;

/// How a field is recovered when the output is not JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Key name and "true" both present, case-insensitive
    Flag,
    /// `"field": [a, "b", ...]`
    List,
    /// `"field": "value"`
    Text,
    /// The whole raw response
    Narrative,
    /// The first [`SUMMARY_CHARS`] characters of the response
    Summary,
    /// Highest severity keyword contained in the response
    Severity,
    /// "SAFE TO IMPLEMENT" or "CHANGE REQUEST WARNING"
    Verdict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        FieldSpec { name, kind }
    }
}

/// Which tier produced an extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    Structured,
    Heuristic,
}

/// Recovered fields plus the tier that recovered them.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub tier: ExtractionTier,
    fields: Map<String, Value>,
}

impl Extraction {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// `true` or `"true"` (any case); everything else is false.
    pub fn flag(&self, name: &str) -> bool {
        match self.fields.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// List items as strings. Non-string items are rendered as JSON, a bare
    /// string becomes a one-item list, anything else is empty.
    pub fn list(&self, name: &str) -> Vec<String> {
        match self.fields.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Field as text; `None` when absent or null.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Recover `fields` from `raw`.
pub fn extract(raw: &str, fields: &[FieldSpec]) -> Extraction {
    if let Some(object) = structured(raw) {
        return Extraction {
            tier: ExtractionTier::Structured,
            fields: object,
        };
    }

    let lower = raw.to_lowercase();
    let mut recovered = Map::new();
    for field in fields {
        let value = match field.kind {
            FieldKind::Flag => {
                Value::Bool(lower.contains(&field.name.to_lowercase()) && lower.contains("true"))
            }
            FieldKind::List => Value::Array(
                heuristic_list(raw, field.name)
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            ),
            FieldKind::Text => Value::String(heuristic_text(raw, field.name).unwrap_or_default()),
            FieldKind::Narrative => Value::String(raw.to_string()),
            FieldKind::Summary => Value::String(raw.chars().take(SUMMARY_CHARS).collect()),
            FieldKind::Severity => Value::String(scan_severity(raw).keyword().to_string()),
            FieldKind::Verdict => Value::String(
                crate::model::DecisionType::classify(raw)
                    .label()
                    .to_string(),
            ),
        };
        recovered.insert(field.name.to_string(), value);
    }

    Extraction {
        tier: ExtractionTier::Heuristic,
        fields: recovered,
    }
}

fn structured(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn heuristic_list(raw: &str, name: &str) -> Vec<String> {
    let pattern = format!(r#""{}":[ \t]*\[([^\]\n]+)\]"#, regex::escape(name));
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };
    let Some(captures) = re.captures(raw) else {
        return Vec::new();
    };
    captures[1]
        .split(',')
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn heuristic_text(raw: &str, name: &str) -> Option<String> {
    let pattern = format!(r#""{}":\s*"([^"]+)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(raw).map(|c| c[1].to_string())
}

static SEVERITY_KEYWORDS: Lazy<Vec<(ImpactLevel, Regex)>> = Lazy::new(|| {
    ImpactLevel::DESCENDING
        .into_iter()
        .filter_map(|level| {
            Regex::new(&format!("(?i){}", level.keyword()))
                .ok()
                .map(|re| (level, re))
        })
        .collect()
});

/// Highest severity keyword contained anywhere in the text, else `None`.
///
/// This is a substring test, so "critically" reads as critical and "flows"
/// as low.
pub fn scan_severity(raw: &str) -> ImpactLevel {
    SEVERITY_KEYWORDS
        .iter()
        .find(|(_, re)| re.is_match(raw))
        .map(|(level, _)| *level)
        .unwrap_or(ImpactLevel::None)
}
