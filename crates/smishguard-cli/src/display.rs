//! Terminal rendering of classification outcomes.
//!
//! Renders an [`Outcome`] as a vertical card: verdict banner, the submitted
//! message, classification fields, and the evidence list.

use std::fmt::Write;

use serde_json::{Value, json};
use smishguard_client::Outcome;
use smishguard_core::{AnalysisResult, View};

const MAX_EVIDENCE_ITEMS: usize = 10;
const MAX_MESSAGE_CHARS: usize = 280;

// ── Public API ──

/// Render an outcome as a human-readable card.
///
/// With `show_raw`, the raw evidence source and the full response payload
/// are appended. Failed attempts always include their diagnostic.
pub fn render_card(message: &str, outcome: &Outcome, show_raw: bool) -> String {
    let mut out = String::new();
    let result = outcome.result();

    let banner = match (outcome, outcome.view()) {
        (Outcome::Failed { .. }, _) => "CHECK FAILED: treat this message as suspicious",
        (_, View::Dangerous) => "DANGEROUS: likely smishing",
        _ => "SAFE: no smishing detected",
    };
    let _ = writeln!(out, "=== {banner} ===");
    let _ = writeln!(out);

    write_section_header(&mut out, "Message");
    let _ = writeln!(out, "  {}", truncate_chars(message, MAX_MESSAGE_CHARS));
    let _ = writeln!(out);

    write_section_header(&mut out, "Classification");
    write_field(&mut out, "label", result.label().unwrap_or("-"));
    if let Some(confidence) = result.confidence() {
        write_field(&mut out, "confidence", &format!("{confidence:.2}"));
    }
    write_field(
        &mut out,
        "verdict",
        outcome.verdict().map(|v| v.as_str()).unwrap_or("unavailable"),
    );
    write_field(&mut out, "view", outcome.view().as_str());
    if let Outcome::Failed { error, .. } = outcome {
        write_field(&mut out, "error", error);
    }
    let _ = writeln!(out);

    write_evidence(&mut out, result);

    if show_raw {
        if let Some(text) = result.evidence_raw_text() {
            let _ = writeln!(out);
            write_section_header(&mut out, "Raw evidence");
            write_indented(&mut out, &text);
        }
    }
    if show_raw || matches!(outcome, Outcome::Failed { .. }) {
        let _ = writeln!(out);
        write_section_header(&mut out, "Raw response");
        write_indented(&mut out, &pretty(result.raw()));
    }

    out
}

/// Machine-readable form of an outcome for `--json`.
pub fn outcome_json(outcome: &Outcome) -> Value {
    json!({
        "status": outcome.state().as_str(),
        "verdict": outcome.verdict().map(|v| v.as_str()),
        "view": outcome.view().as_str(),
        "result": outcome.result(),
    })
}

// ── Section rendering ──

fn write_section_header(out: &mut String, header: &str) {
    let _ = writeln!(out, "{header}");
}

fn write_field(out: &mut String, name: &str, value: &str) {
    let _ = writeln!(out, "  {:<14} {}", name, value);
}

fn write_evidence(out: &mut String, result: &AnalysisResult) {
    let items = result.evidence().unwrap_or_default();
    if items.is_empty() {
        write_section_header(out, "Evidence");
        let _ = writeln!(out, "  no evidence available");
        return;
    }

    let _ = writeln!(out, "Evidence ({}):", items.len());
    for (i, item) in items.iter().take(MAX_EVIDENCE_ITEMS).enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, item.title);
        if !item.description.is_empty() {
            let _ = writeln!(out, "     {}", item.description);
        }
    }
    if items.len() > MAX_EVIDENCE_ITEMS {
        let _ = writeln!(out, "  ... and {} more", items.len() - MAX_EVIDENCE_ITEMS);
    }
}

// ── Helpers ──

fn write_indented(out: &mut String, text: &str) {
    for line in text.lines() {
        let _ = writeln!(out, "  {line}");
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{head}...")
}
