//! Oracle response parsing.
//!
//! Oracle text is only *claimed* to be JSON. It may be wrapped in a
//! Markdown fence, surrounded by prose, truncated, or use field names
//! different from the ones requested. The parser never fails: it returns
//! [`ParseOutcome::Degraded`] when nothing usable can be recovered, and the
//! orchestrator treats that as a signal to take the fallback path.

use serde_json::{Map, Value};

use reelcut_models::timestamp::seconds_from_value;
use reelcut_models::RawCandidate;

/// Container keys searched for candidates, in priority order.
const CONTAINER_KEYS: &[&str] = &["key_moments", "ad_segment", "segments", "highlights", "candidates"];

const START_KEYS: &[&str] = &["start_time", "start", "begin"];
const END_KEYS: &[&str] = &["end_time", "end", "finish"];
const IMPORTANCE_KEYS: &[&str] = &["importance_score", "importance", "score"];
const DESCRIPTION_KEYS: &[&str] = &["description", "headline", "title", "text", "highlight"];

/// Result of parsing one oracle response.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Candidates in the order the oracle listed them. May be empty.
    Ok(Vec<RawCandidate>),
    /// Nothing could be recovered.
    Degraded(String),
}

impl ParseOutcome {
    /// Candidates, empty when degraded.
    pub fn candidates(&self) -> &[RawCandidate] {
        match self {
            ParseOutcome::Ok(candidates) => candidates,
            ParseOutcome::Degraded(_) => &[],
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ParseOutcome::Degraded(_))
    }
}

/// Parse oracle text into raw candidates.
pub fn parse_candidates(raw: &str) -> ParseOutcome {
    let Some(value) = extract_json(raw) else {
        return ParseOutcome::Degraded("no JSON object found in response".to_string());
    };
    match locate_candidates(&value) {
        Some(items) => ParseOutcome::Ok(items.iter().filter_map(candidate_from_value).collect()),
        None => ParseOutcome::Degraded("no candidate list in response".to_string()),
    }
}

/// Recover a JSON value from oracle text.
///
/// Tries the whole text (minus any code fence) first, then the substring
/// between the first `{` and the last `}`.
pub fn extract_json(raw: &str) -> Option<Value> {
    let text = strip_code_fence(raw);
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Strip a surrounding Markdown code fence (` ```json ... ``` `).
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the opening line.
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches("json"),
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Find the list of candidate objects inside a parsed response.
fn locate_candidates(value: &Value) -> Option<Vec<&Value>> {
    match value {
        Value::Array(items) => Some(items.iter().collect()),
        Value::Object(map) => {
            for key in CONTAINER_KEYS {
                match map.get(*key) {
                    Some(Value::Array(items)) => return Some(items.iter().collect()),
                    Some(item @ Value::Object(_)) => return Some(vec![item]),
                    _ => {}
                }
            }
            if has_any(map, START_KEYS) || has_any(map, END_KEYS) {
                return Some(vec![value]);
            }
            None
        }
        _ => None,
    }
}

fn has_any(map: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|k| map.get(*k).is_some_and(|v| !v.is_null()))
}

/// Build a candidate from one JSON object. Non-objects are skipped.
fn candidate_from_value(value: &&Value) -> Option<RawCandidate> {
    let map = value.as_object()?;

    let start = first_value(map, START_KEYS).and_then(seconds_from_value);
    let end = first_value(map, END_KEYS).and_then(seconds_from_value);
    let importance = first_value(map, IMPORTANCE_KEYS).and_then(number_from_value);
    let description = first_value(map, DESCRIPTION_KEYS)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    let numeric_keys = [START_KEYS, END_KEYS, IMPORTANCE_KEYS];
    let extra = map
        .iter()
        .filter(|(k, _)| !numeric_keys.iter().any(|keys| keys.contains(&k.as_str())))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Some(RawCandidate {
        description,
        start,
        end,
        importance,
        extra,
    })
}

/// First non-null value among `keys`.
fn first_value<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}
