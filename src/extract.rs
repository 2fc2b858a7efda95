//! Recovery of a JSON object from free-form model output.
//!
//! Models asked for "only JSON" still wrap it in prose or markdown fences.
//! Recovery tries, in order: the whole text, the span from the first `{` to
//! the last `}`, and that same span again after fence markers are removed.
//!
//! The span is the outermost brace pair, not a balanced scan. Stray braces
//! in surrounding prose widen the span and usually make the parse fail, in
//! which case the caller shows the raw text instead.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Opening fence with an optional language tag at line start, or a closing
/// fence at line end.
static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_+-]*|```[ \t\r]*$").expect("fence pattern")
});

/// A value recovered from model text, both as the typed record and as the
/// untouched JSON (which may carry keys the record does not know).
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered<T> {
    pub record: T,
    pub value: Value,
}

pub fn recover_json(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return Some(value);
    }
    if let Some(value) = parse_outermost(text) {
        return Some(value);
    }
    parse_outermost(&strip_fences(text))
}

/// Recovers a JSON object and reads it as `T`. Anything that is not an
/// object (a bare string, an array, a number) counts as a failed recovery.
pub fn recover_as<T: DeserializeOwned>(text: &str) -> Option<Recovered<T>> {
    let value = recover_json(text).filter(Value::is_object)?;
    let record = serde_json::from_value(value.clone()).ok()?;
    Some(Recovered { record, value })
}

fn parse_outermost(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

pub fn strip_fences(text: &str) -> String {
    FENCE.replace_all(text, "").trim().to_string()
}
