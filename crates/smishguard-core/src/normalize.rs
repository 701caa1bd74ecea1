//! Response normalization for classification payloads.
//!
//! The classification service does not commit to a schema: fields may sit
//! under a `result` wrapper or at the top level, and evidence may live under
//! any of several keys in one of three shapes. [`normalize`] folds all of
//! these into a single [`AnalysisResult`] without ever failing.
//!
//! # Evidence shapes
//!
//! - Titled objects: `[{"title": "...", "description": "..."}, ...]`
//! - One multi-line string, read as alternating title/description lines
//! - An array of strings, split into lines and read the same way
//!
//! Candidates are tried in [`EVIDENCE_CANDIDATES`] order and the first one
//! that yields an item wins. Evidence from different keys is never merged.

use serde_json::Value;
use tracing::debug;

use crate::evidence::{AnalysisResult, EvidenceItem};

/// Evidence locations relative to the selected scope, highest priority first.
///
/// The `raw` sub-object holds the upstream model response when the service
/// forwards it verbatim, so it is preferred over the service's own fields.
pub const EVIDENCE_CANDIDATES: &[&[&str]] = &[
    &["raw", "evidence"],
    &["raw", "reasons"],
    &["raw", "reason"],
    &["raw", "rationale"],
    &["raw", "justification"],
    &["raw", "explanation"],
    &["raw", "supporting_facts"],
    &["raw", "result", "evidence"],
    &["raw", "result", "reasons"],
    &["evidence"],
    &["reasons"],
    &["reason"],
    &["rationale"],
    &["justification"],
    &["explanation"],
    &["supporting_facts"],
    &["llm", "evidence"],
    &["llm", "reasons"],
];

/// Normalize an arbitrary response payload into an [`AnalysisResult`].
///
/// Total over all JSON input: anything unrecognised leaves the matching
/// field absent. The payload itself is kept as `raw`.
pub fn normalize(payload: &Value) -> AnalysisResult {
    let scope = select_scope(payload);
    let label = extract_label(scope, payload);
    let confidence = extract_confidence(scope, payload);
    let evidence = extract_evidence(scope);

    AnalysisResult::new(label, confidence, evidence, payload.clone())
}

/// The `result` wrapper when present and non-null, otherwise the payload.
fn select_scope(payload: &Value) -> &Value {
    match payload.get("result") {
        Some(wrapper) if !wrapper.is_null() => wrapper,
        _ => payload,
    }
}

fn extract_label(scope: &Value, payload: &Value) -> Option<String> {
    let value = [
        scope.get("label"),
        scope.get("prediction"),
        payload.get("label"),
    ]
    .into_iter()
    .flatten()
    .find(|v| !v.is_null())?;

    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Only genuine JSON numbers count; `"0.9"` is not a confidence.
fn extract_confidence(scope: &Value, payload: &Value) -> Option<f64> {
    scope
        .get("confidence")
        .and_then(Value::as_f64)
        .or_else(|| payload.get("confidence").and_then(Value::as_f64))
}

/// Walk the candidate list and commit to the first one that yields items.
///
/// Returns the items together with the untouched candidate value.
fn extract_evidence(scope: &Value) -> Option<(Vec<EvidenceItem>, Value)> {
    EVIDENCE_CANDIDATES.iter().find_map(|path| {
        let candidate = lookup(scope, path)?;
        let items = evidence_from_candidate(candidate)?;
        debug!(
            candidate = %path.join("."),
            items = items.len(),
            "evidence extracted"
        );
        Some((items, candidate.clone()))
    })
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}

/// Apply the shape rules in order to a single candidate value.
///
/// `None` means the candidate is skipped.
pub fn evidence_from_candidate(candidate: &Value) -> Option<Vec<EvidenceItem>> {
    titled_items(candidate)
        .or_else(|| string_items(candidate))
        .or_else(|| string_list_items(candidate))
}

/// Rule 1: an array of `{title, description}` objects.
///
/// The shape is recognised from the first element; elements without a
/// usable title are dropped.
pub fn titled_items(candidate: &Value) -> Option<Vec<EvidenceItem>> {
    let items = candidate.as_array()?;
    let first = items.first()?.as_object()?;
    if !first.contains_key("title") {
        return None;
    }

    let evidence: Vec<EvidenceItem> = items
        .iter()
        .map(|item| EvidenceItem {
            title: stringify_field(item.get("title")),
            description: stringify_field(item.get("description")),
        })
        .filter(|item| !item.title.is_empty())
        .collect();

    non_empty(evidence)
}

/// Rule 2: one multi-line string.
pub fn string_items(candidate: &Value) -> Option<Vec<EvidenceItem>> {
    let text = candidate.as_str()?;
    non_empty(pair_lines(text.lines()))
}

/// Rule 3: an array of strings, each possibly spanning several lines.
pub fn string_list_items(candidate: &Value) -> Option<Vec<EvidenceItem>> {
    let items = candidate.as_array()?;
    let texts: Vec<&str> = items.iter().map(Value::as_str).collect::<Option<_>>()?;
    non_empty(pair_lines(texts.into_iter().flat_map(str::lines)))
}

/// Pair cleaned lines as title/description; a trailing title keeps an empty
/// description.
pub fn pair_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<EvidenceItem> {
    let cleaned: Vec<&str> = lines
        .into_iter()
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .collect();

    cleaned
        .chunks(2)
        .map(|pair| EvidenceItem {
            title: pair[0].to_string(),
            description: pair.get(1).map(|d| d.to_string()).unwrap_or_default(),
        })
        .collect()
}

/// Strip leading bullet markers (`-`, `•`, `*`) and surrounding whitespace.
fn strip_marker(line: &str) -> &str {
    line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '•' | '*'))
        .trim()
}

fn stringify_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn non_empty(items: Vec<EvidenceItem>) -> Option<Vec<EvidenceItem>> {
    if items.is_empty() { None } else { Some(items) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(title: &str, description: &str) -> EvidenceItem {
        EvidenceItem::new(title, description)
    }

    // ── Scope, label, confidence ──

    #[test]
    fn empty_object_yields_only_raw() {
        let result = normalize(&json!({}));
        assert!(result.label().is_none());
        assert!(result.confidence().is_none());
        assert!(result.evidence().is_none());
        assert!(result.evidence_raw().is_none());
        assert_eq!(result.raw(), &json!({}));
    }

    #[test]
    fn non_object_payloads_are_tolerated() {
        for payload in [json!(null), json!(42), json!("text"), json!([1, 2, 3]), json!(true)] {
            let result = normalize(&payload);
            assert!(result.label().is_none());
            assert!(result.evidence().is_none());
            assert_eq!(result.raw(), &payload);
        }
    }

    #[test]
    fn wrapped_fields_take_precedence() {
        let payload = json!({
            "label": "safe",
            "confidence": 0.1,
            "result": {"label": "smishing", "confidence": 0.93}
        });
        let result = normalize(&payload);
        assert_eq!(result.label(), Some("smishing"));
        assert_eq!(result.confidence(), Some(0.93));
    }

    #[test]
    fn flat_shape_is_read_from_top_level() {
        let result = normalize(&json!({"label": "safe", "confidence": 0.8}));
        assert_eq!(result.label(), Some("safe"));
        assert_eq!(result.confidence(), Some(0.8));
    }

    #[test]
    fn null_wrapper_falls_back_to_flat() {
        let result = normalize(&json!({"result": null, "label": "safe"}));
        assert_eq!(result.label(), Some("safe"));
    }

    #[test]
    fn prediction_is_a_label_alias() {
        let result = normalize(&json!({"result": {"prediction": "smishing"}}));
        assert_eq!(result.label(), Some("smishing"));
    }

    #[test]
    fn label_falls_back_to_top_level_when_wrapper_lacks_it() {
        let result = normalize(&json!({"label": "스미싱", "result": {"confidence": 0.5}}));
        assert_eq!(result.label(), Some("스미싱"));
        assert_eq!(result.confidence(), Some(0.5));
    }

    #[test]
    fn object_label_is_dropped() {
        let result = normalize(&json!({"label": {"name": "smishing"}}));
        assert!(result.label().is_none());
    }

    #[test]
    fn numeric_label_is_stringified() {
        let result = normalize(&json!({"label": 1}));
        assert_eq!(result.label(), Some("1"));
    }

    #[test]
    fn string_confidence_is_not_coerced() {
        let result = normalize(&json!({"confidence": "0.9"}));
        assert!(result.confidence().is_none());
    }

    #[test]
    fn numeric_confidence_is_kept() {
        let result = normalize(&json!({"confidence": 0.9}));
        assert_eq!(result.confidence(), Some(0.9));
    }

    #[test]
    fn integer_confidence_is_numeric() {
        let result = normalize(&json!({"confidence": 1}));
        assert_eq!(result.confidence(), Some(1.0));
    }

    #[test]
    fn malformed_wrapper_confidence_uses_top_level_number() {
        let payload = json!({"confidence": 0.4, "result": {"confidence": null}});
        assert_eq!(normalize(&payload).confidence(), Some(0.4));
    }

    #[test]
    fn null_and_object_confidence_are_absent() {
        assert!(normalize(&json!({"confidence": null})).confidence().is_none());
        assert!(normalize(&json!({"confidence": {"v": 1}})).confidence().is_none());
    }

    // ── Shape rules ──

    #[test]
    fn titled_objects_map_directly() {
        let candidate = json!([
            {"title": "Suspicious link", "description": "Not an official domain"},
            {"title": "", "description": "dropped"},
            {"title": "Urgency", "description": null},
            {"title": 7}
        ]);
        assert_eq!(
            titled_items(&candidate),
            Some(vec![
                item("Suspicious link", "Not an official domain"),
                item("Urgency", ""),
                item("7", ""),
            ])
        );
    }

    #[test]
    fn titled_objects_without_titles_are_skipped() {
        let candidate = json!([{"title": ""}, {"title": null}]);
        assert_eq!(titled_items(&candidate), None);
    }

    #[test]
    fn objects_without_title_key_are_not_titled() {
        assert_eq!(titled_items(&json!([{"text": "x"}])), None);
        assert_eq!(titled_items(&json!([])), None);
    }

    #[test]
    fn string_pairs_lines() {
        let candidate = json!("Title1\nDesc1\nTitle2\nDesc2");
        assert_eq!(
            string_items(&candidate),
            Some(vec![item("Title1", "Desc1"), item("Title2", "Desc2")])
        );
    }

    #[test]
    fn string_trailing_title_gets_empty_description() {
        assert_eq!(string_items(&json!("TitleOnly")), Some(vec![item("TitleOnly", "")]));
    }

    #[test]
    fn string_handles_crlf_bullets_and_blank_lines() {
        let candidate = json!("- Link included\r\n\r\n  • Points to a lookalike domain\r\n* Urgency\r\n");
        assert_eq!(
            string_items(&candidate),
            Some(vec![
                item("Link included", "Points to a lookalike domain"),
                item("Urgency", ""),
            ])
        );
    }

    #[test]
    fn blank_string_is_skipped() {
        assert_eq!(string_items(&json!("  \n - \n")), None);
    }

    #[test]
    fn string_list_flattens_lines_before_pairing() {
        let candidate = json!(["A\nA desc", "B", "B desc"]);
        assert_eq!(
            string_list_items(&candidate),
            Some(vec![item("A", "A desc"), item("B", "B desc")])
        );
    }

    #[test]
    fn mixed_array_is_not_a_string_list() {
        assert_eq!(string_list_items(&json!(["A", 1])), None);
        assert_eq!(evidence_from_candidate(&json!(["A", 1])), None);
    }

    #[test]
    fn other_shapes_are_skipped() {
        for candidate in [json!(1), json!(null), json!({"title": "x"}), json!(true)] {
            assert_eq!(evidence_from_candidate(&candidate), None);
        }
    }

    // ── Candidate priority ──

    #[test]
    fn first_successful_candidate_wins_without_merging() {
        let payload = json!({
            "result": {
                "raw": {"reasons": "Raw reason\nfrom the model"},
                "evidence": [{"title": "Service evidence", "description": ""}],
                "llm": {"evidence": "LLM\nevidence"}
            }
        });
        let result = normalize(&payload);
        assert_eq!(result.evidence(), Some(&[item("Raw reason", "from the model")][..]));
        assert_eq!(result.evidence_raw(), Some(&json!("Raw reason\nfrom the model")));
    }

    #[test]
    fn unusable_candidates_are_passed_over() {
        let payload = json!({
            "raw": {"evidence": "   "},
            "reasons": 3,
            "rationale": ["Rationale", "explained"]
        });
        let result = normalize(&payload);
        assert_eq!(result.evidence(), Some(&[item("Rationale", "explained")][..]));
        assert_eq!(result.evidence_raw(), Some(&json!(["Rationale", "explained"])));
    }

    #[test]
    fn nested_raw_result_candidates_are_read() {
        let payload = json!({"raw": {"result": {"reasons": ["Deep", "reason"]}}});
        assert_eq!(normalize(&payload).evidence(), Some(&[item("Deep", "reason")][..]));
    }

    #[test]
    fn llm_candidates_are_last_resort() {
        let payload = json!({"result": {"llm": {"reasons": "Only\nhere"}}});
        assert_eq!(normalize(&payload).evidence(), Some(&[item("Only", "here")][..]));
    }

    #[test]
    fn every_candidate_is_reachable() {
        for path in EVIDENCE_CANDIDATES {
            let mut payload = json!("Found\nit");
            for key in path.iter().rev() {
                let mut wrapper = serde_json::Map::new();
                wrapper.insert(key.to_string(), payload);
                payload = Value::Object(wrapper);
            }
            let result = normalize(&payload);
            assert_eq!(
                result.evidence(),
                Some(&[item("Found", "it")][..]),
                "candidate {}",
                path.join(".")
            );
        }
    }

    #[test]
    fn evidence_is_absent_when_no_candidate_matches() {
        let result = normalize(&json!({"result": {"label": "safe", "notes": "nothing"}}));
        assert!(result.evidence().is_none());
        assert!(result.evidence_raw().is_none());
    }

    #[test]
    fn raw_keeps_the_whole_payload() {
        let payload = json!({"request_id": "r1", "result": {"label": "safe"}});
        assert_eq!(normalize(&payload).raw(), &payload);
    }

    #[test]
    fn normalization_is_idempotent() {
        let payload = json!({
            "result": {
                "label": "smishing",
                "confidence": 0.99,
                "reasons": ["Link\nShortened URL", "Urgency"]
            }
        });
        assert_eq!(normalize(&payload), normalize(&payload));
    }
}
