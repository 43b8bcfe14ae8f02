//! Free-text operation adapter.
//!
//! Agents hand the engine loosely formatted text: operation arrays
//! inside fenced code blocks, inside `<operations>` delimiter tags, or
//! bare, with relaxed quoting and trailing commas. This adapter
//! extracts and validates Operation objects; malformed input surfaces
//! a `ParseError` before reaching the core.

use regex::Regex;
use serde::Deserialize;

use crate::error::{ResymError, Result};
use crate::model::Operation;

#[derive(Deserialize)]
struct OperationsWrapper {
    operations: Vec<Operation>,
}

/// Extract a validated operation list from loosely structured text.
pub fn extract_operations(text: &str) -> Result<Vec<Operation>> {
    for candidate in candidates(text) {
        if let Some(ops) = parse_candidate(&candidate) {
            if ops.is_empty() {
                continue;
            }
            return Ok(ops);
        }
    }
    Err(ResymError::ParseError {
        detail: "no operation array found in text".into(),
    })
}

/// Candidate JSON payloads, most specific first: fenced code blocks,
/// delimiter tags, then the text itself.
fn candidates(text: &str) -> Vec<String> {
    let mut out = Vec::new();

    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence pattern must compile");
    for cap in fence.captures_iter(text) {
        out.push(cap[1].to_string());
    }

    let tags = Regex::new(r"(?s)<operations>(.*?)</operations>")
        .expect("tag pattern must compile");
    for cap in tags.captures_iter(text) {
        out.push(cap[1].to_string());
    }

    out.push(text.to_string());
    out
}

fn parse_candidate(raw: &str) -> Option<Vec<Operation>> {
    let json = slice_json(raw)?;
    try_parse(json).or_else(|| try_parse(&relax(json)))
}

/// Narrow to the outermost JSON value inside surrounding prose.
fn slice_json(raw: &str) -> Option<&str> {
    let start = raw.find(['[', '{'])?;
    let end = raw.rfind([']', '}'])?;
    if end < start {
        return None;
    }
    Some(raw[start..=end].trim())
}

fn try_parse(s: &str) -> Option<Vec<Operation>> {
    if let Ok(ops) = serde_json::from_str::<Vec<Operation>>(s) {
        return Some(ops);
    }
    if let Ok(op) = serde_json::from_str::<Operation>(s) {
        return Some(vec![op]);
    }
    if let Ok(wrapper) = serde_json::from_str::<OperationsWrapper>(s) {
        return Some(wrapper.operations);
    }
    None
}

/// Relaxed-JSON repairs: trailing commas dropped, single-quoted
/// strings converted.
fn relax(s: &str) -> String {
    let trailing = Regex::new(r",\s*([\]}])").expect("trailing-comma pattern must compile");
    let relaxed = trailing.replace_all(s, "$1").to_string();
    let single = Regex::new(r"'([^'\\]*)'").expect("single-quote pattern must compile");
    single.replace_all(&relaxed, "\"$1\"").to_string()
}
