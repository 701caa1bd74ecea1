//! Binary verdicts and the result views they route to.

use serde::Serialize;

use crate::evidence::AnalysisResult;

/// Smishing-category tokens, matched case-insensitively as substrings.
const SMISHING_TOKENS: &[&str] = &["smish", "스미싱"];

/// Native-language risk marker ("danger"), matched as a substring.
const RISK_TOKEN: &str = "위험";

/// Dangerous/safe classification derived from a result's label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Dangerous,
    Safe,
}

impl Verdict {
    /// Derive the verdict from a normalized result. An absent label is safe.
    pub fn from_result(result: &AnalysisResult) -> Self {
        Self::from_label(result.label())
    }

    pub fn from_label(label: Option<&str>) -> Self {
        let Some(label) = label else {
            return Self::Safe;
        };
        let lower = label.to_lowercase();
        if SMISHING_TOKENS.iter().any(|t| lower.contains(t)) || label.contains(RISK_TOKEN) {
            Self::Dangerous
        } else {
            Self::Safe
        }
    }

    pub fn is_dangerous(&self) -> bool {
        matches!(self, Self::Dangerous)
    }

    /// The result view a completed classification routes to.
    pub fn view(&self) -> View {
        match self {
            Self::Dangerous => View::Dangerous,
            Self::Safe => View::Safe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dangerous => "dangerous",
            Self::Safe => "safe",
        }
    }
}

/// Page the presentation layer should show.
///
/// `Dangerous` doubles as the inspection view for failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    #[default]
    Home,
    Loading,
    Dangerous,
    Safe,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Loading => "loading",
            Self::Dangerous => "dangerous",
            Self::Safe => "safe",
        }
    }
}
