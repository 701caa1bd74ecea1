//! Canonical analysis result types shared by the client and the CLI.

use serde::Serialize;
use serde_json::Value;

/// One titled justification for a verdict.
///
/// `title` is never empty; `description` may be.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceItem {
    pub title: String,
    pub description: String,
}

impl EvidenceItem {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Normalized outcome of one classification attempt.
///
/// Built once per attempt (by [`crate::normalize`] or [`AnalysisResult::unknown`])
/// and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evidence: Option<Vec<EvidenceItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    evidence_raw: Option<Value>,
    raw: Value,
}

/// Label carried by a result whose classification could not be obtained.
pub const UNKNOWN_LABEL: &str = "unknown";

impl AnalysisResult {
    pub(crate) fn new(
        label: Option<String>,
        confidence: Option<f64>,
        evidence: Option<(Vec<EvidenceItem>, Value)>,
        raw: Value,
    ) -> Self {
        let (evidence, evidence_raw) = match evidence {
            Some((items, source)) => (Some(items), Some(source)),
            None => (None, None),
        };
        Self {
            label,
            confidence,
            evidence,
            evidence_raw,
            raw,
        }
    }

    /// Degraded result for an attempt that never produced a usable response.
    ///
    /// `diagnostic` is kept as `raw` so the failure can be shown to the user.
    pub fn unknown(diagnostic: Value) -> Self {
        Self {
            label: Some(UNKNOWN_LABEL.to_string()),
            confidence: None,
            evidence: None,
            evidence_raw: None,
            raw: diagnostic,
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    /// Extracted evidence in display order, or `None` if no source was found.
    pub fn evidence(&self) -> Option<&[EvidenceItem]> {
        self.evidence.as_deref()
    }

    /// The candidate value the evidence was parsed from, unmodified.
    pub fn evidence_raw(&self) -> Option<&Value> {
        self.evidence_raw.as_ref()
    }

    /// The original response payload, or the failure diagnostic.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Render [`evidence_raw`](Self::evidence_raw) as display text.
    ///
    /// Strings are returned as-is, arrays become one line per element, and
    /// anything else is pretty-printed JSON.
    pub fn evidence_raw_text(&self) -> Option<String> {
        let raw = self.evidence_raw.as_ref()?;
        let text = match raw {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n"),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        Some(text)
    }
}
