//! Salvaging a JSON value from untrusted model output.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Attempt to recover a JSON structure from raw model text.
///
/// The text is supposed to be a JSON array of
/// `[[start, end], ["kw1", "kw2", "kw3"]]` tuples but may carry markdown
/// fences, single-quoted or smart-quoted literals, a wrapping object, or
/// arbitrary surrounding prose. Attempts, first success wins:
///
/// 1. strip code fences, collapse whitespace, parse directly;
/// 2. straighten quotes (curly to straight, single to double) and retry;
/// 3. regex-scan for the tuple shape and collect every match.
///
/// Returns `None` when nothing structured can be recovered. Never panics,
/// whatever the input.
pub fn parse(raw: &str) -> Option<Value> {
    let cleaned = strip_fences(raw);

    if let Some(value) = try_json(&cleaned) {
        return Some(value);
    }

    let repaired = straighten_quotes(&cleaned);
    if let Some(value) = try_json(&repaired) {
        return Some(value);
    }

    let scanned = scan_tuples(&repaired);
    if !scanned.is_empty() {
        debug!(count = scanned.len(), "recovered segments via regex scan");
        return Some(Value::Array(scanned));
    }

    None
}

/// Remove markdown code-block markers and collapse whitespace runs.
fn strip_fences(raw: &str) -> String {
    let without_fences = raw.replace("```json", " ").replace("```", " ");
    let ws = Regex::new(r"\s+").unwrap();
    ws.replace_all(without_fences.trim(), " ").into_owned()
}

/// Bounded character substitutions for common LLM quoting mistakes.
fn straighten_quotes(text: &str) -> String {
    text.replace('\u{2019}', "'")
        .replace('\u{2018}', "'")
        .replace('\u{201c}', "\"")
        .replace('\u{201d}', "\"")
        .replace('\'', "\"")
}

/// Parse and keep only container values; scalars mean the model replied
/// with prose, which the normalizer cannot use.
fn try_json(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Array(_)) | Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Collect every `[[num, num], ["s", "s", "s"]]` literal in the text,
/// tolerating a missing outer array and trailing commas.
fn scan_tuples(text: &str) -> Vec<Value> {
    let tuple = Regex::new(
        r#"\[\s*\[\s*(\d+(?:\.\d+)?)\s*,\s*(\d+(?:\.\d+)?)\s*\]\s*,\s*\[\s*"([^"]*)"\s*,\s*"([^"]*)"\s*,\s*"([^"]*)"\s*,?\s*\]\s*\]"#,
    )
    .unwrap();

    tuple
        .captures_iter(text)
        .filter_map(|cap| {
            let start: f64 = cap[1].parse().ok()?;
            let end: f64 = cap[2].parse().ok()?;
            Some(serde_json::json!([
                [start, end],
                [&cap[3], &cap[4], &cap[5]]
            ]))
        })
        .collect()
}
