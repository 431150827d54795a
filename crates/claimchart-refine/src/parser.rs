//! Tolerant parsing of AI replies
//!
//! Replies arrive as free text that usually, but not always, contains one
//! JSON value. Strategies are tried in a fixed order and the first one that
//! yields a value of the expected shape wins:
//!
//! 1. direct parse when the trimmed reply starts with the opening bracket
//! 2. the quote-aware balanced span starting at the first opening bracket
//! 3. the same two steps after stripping markdown code fences
//! 4. opening/closing bracket pairs, longest first, up to a candidate cap

use crate::error::RefineError;
use crate::types::{Assessment, NoChangeReason, RefinementOutcome};
use claimchart_domain::{Confidence, ElementSeed, FlagSet};
use serde_json::{Map, Value};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, warn};

/// Top-level JSON value a caller expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
}

impl JsonShape {
    fn open(self) -> char {
        match self {
            JsonShape::Object => '{',
            JsonShape::Array => '[',
        }
    }

    fn close(self) -> char {
        match self {
            JsonShape::Object => '}',
            JsonShape::Array => ']',
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            JsonShape::Object => value.is_object(),
            JsonShape::Array => value.is_array(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Direct,
    BalancedSpan,
    StrippedFences,
    LongestBlock,
}

/// Pull the first readable JSON value of `shape` out of `text`
pub fn extract_json(text: &str, shape: JsonShape, max_candidates: usize) -> Option<Value> {
    let trimmed = text.trim();

    if let Some(value) = direct_or_span(trimmed, shape) {
        return Some(value);
    }

    let stripped = strip_fences(trimmed);
    if stripped != trimmed {
        if let Some(value) = direct_or_span(&stripped, shape) {
            debug!(strategy = ?Strategy::StrippedFences, "Parsed reply");
            return Some(value);
        }
    }

    for candidate in longest_blocks(trimmed, shape, max_candidates) {
        if let Some(value) = try_parse(candidate, shape) {
            debug!(strategy = ?Strategy::LongestBlock, "Parsed reply");
            return Some(value);
        }
    }

    None
}

fn direct_or_span(text: &str, shape: JsonShape) -> Option<Value> {
    if text.starts_with(shape.open()) {
        if let Some(value) = try_parse(text, shape) {
            debug!(strategy = ?Strategy::Direct, "Parsed reply");
            return Some(value);
        }
    }

    let span = balanced_span(text, shape)?;
    let value = try_parse(span, shape)?;
    debug!(strategy = ?Strategy::BalancedSpan, "Parsed reply");
    Some(value)
}

fn try_parse(candidate: &str, shape: JsonShape) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(|value| shape.matches(value))
}

/// Span from the first opening bracket to its matching close
///
/// Brackets inside JSON string literals are ignored.
fn balanced_span(text: &str, shape: JsonShape) -> Option<&str> {
    let start = text.find(shape.open())?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            c if c == shape.open() => depth += 1,
            c if c == shape.close() => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

fn strip_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Open/close pairs, longest first, capped at `max_candidates`
///
/// A heap holds each opening bracket's longest unvisited span; popping one
/// pushes the same opening bracket paired with the previous close. Work is
/// bounded by the cap, not by the number of pairs.
fn longest_blocks(text: &str, shape: JsonShape, max_candidates: usize) -> Vec<&str> {
    let closes: Vec<usize> = text.match_indices(shape.close()).map(|(i, _)| i).collect();
    let Some(last) = closes.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut heap: BinaryHeap<(usize, Reverse<usize>, usize)> = text
        .match_indices(shape.open())
        .map(|(open, _)| open)
        .filter(|&open| closes[last] > open)
        .map(|open| (closes[last] - open, Reverse(open), last))
        .collect();

    let mut blocks = Vec::with_capacity(max_candidates.min(heap.len()));
    while blocks.len() < max_candidates {
        let Some((_, Reverse(open), close)) = heap.pop() else {
            break;
        };
        blocks.push(&text[open..=closes[close]]);

        if let Some(prev) = close.checked_sub(1).filter(|&prev| closes[prev] > open) {
            heap.push((closes[prev] - open, Reverse(open), prev));
        }
    }
    blocks
}

/// Read an AI refinement reply
///
/// Never fails: a reply without a readable object becomes
/// [`RefinementOutcome::ParseFailure`].
pub fn parse_refinement_response(text: &str, max_candidates: usize) -> RefinementOutcome {
    let Some(Value::Object(obj)) = extract_json(text, JsonShape::Object, max_candidates) else {
        warn!("No JSON object found in refinement reply");
        return RefinementOutcome::ParseFailure {
            reason: "no JSON object found in reply".to_string(),
        };
    };

    let reasoning = text_field(&obj, &["refinedReasoning", "refined_reasoning"]);
    let evidence = text_field(&obj, &["refinedEvidence", "refined_evidence"]);
    let assessment = Assessment {
        confidence: confidence_field(&obj),
        flags: flags_field(&obj),
        explanation: text_field(&obj, &["explanation"]).unwrap_or_default(),
    };
    let no_change_needed = bool_field(&obj, &["noChangeNeeded", "no_change_needed"]);
    let proposed_change = bool_field(&obj, &["proposedChange", "proposed_change"]);

    if no_change_needed {
        return RefinementOutcome::NoChange {
            reason: NoChangeReason::AlreadyStrong,
            assessment,
        };
    }

    if reasoning.is_none() && evidence.is_none() {
        return RefinementOutcome::NoChange {
            reason: NoChangeReason::CommentaryOnly,
            assessment,
        };
    }

    if !proposed_change {
        debug!("Reply carries a rewrite but proposedChange is false; treating it as a proposal");
    }

    RefinementOutcome::Rewrite {
        reasoning,
        evidence,
        assessment,
    }
}

/// Read an AI extraction reply into element seeds
///
/// Items that are not objects are skipped. Missing ids fall back to the
/// 1-based position; repeated ids get a `#n` suffix.
pub fn parse_extraction_response(
    text: &str,
    max_candidates: usize,
) -> Result<Vec<ElementSeed>, RefineError> {
    let Some(Value::Array(items)) = extract_json(text, JsonShape::Array, max_candidates) else {
        return Err(RefineError::Extraction(
            "no JSON array found in reply".to_string(),
        ));
    };

    let mut seen = HashSet::new();
    let mut seeds = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let Some(obj) = item.as_object() else {
            warn!("Skipping extraction item {}: not a JSON object", idx);
            continue;
        };

        let base_id = match obj.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => (idx + 1).to_string(),
        };
        let mut id = base_id.clone();
        let mut suffix = 2;
        while !seen.insert(id.clone()) {
            id = format!("{}#{}", base_id, suffix);
            suffix += 1;
        }
        if id != base_id {
            warn!("Duplicate element id {:?} renamed to {:?}", base_id, id);
        }

        seeds.push(ElementSeed {
            id,
            element_text: seed_text(obj, &["element", "elementText", "element_text"]),
            evidence_text: seed_text(obj, &["evidence", "evidenceText", "evidence_text"]),
            reasoning_text: seed_text(obj, &["reasoning", "reasoningText", "reasoning_text"]),
        });
    }

    if seeds.is_empty() {
        return Err(RefineError::Extraction(
            "reply contained no claim elements".to_string(),
        ));
    }

    Ok(seeds)
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| obj.get(*key))
}

/// Trimmed, non-empty string value
fn text_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    field(obj, keys)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extraction text; placeholders such as `[NO EVIDENCE MAPPED]` read as empty
fn seed_text(obj: &Map<String, Value>, keys: &[&str]) -> String {
    let text = text_field(obj, keys).unwrap_or_default();
    let upper = text.to_ascii_uppercase();
    if upper.starts_with("[NO ") && upper.ends_with(']') {
        String::new()
    } else {
        text
    }
}

fn confidence_field(obj: &Map<String, Value>) -> Confidence {
    let raw = match obj.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    raw.map(Confidence::clamped).unwrap_or_default()
}

fn flags_field(obj: &Map<String, Value>) -> FlagSet {
    match obj.get("flags") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(s)) => FlagSet::from_iter([s.as_str()]),
        _ => FlagSet::new(),
    }
}

fn bool_field(obj: &Map<String, Value>, keys: &[&str]) -> bool {
    match field(obj, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
