//! Link-text to record-id resolution.
//!
//! A reference value is either a string holding one or more wiki links
//! (`[[Target]]`, `[[Target|alias]]`, `[[Target#heading]]`), a plain note
//! name, or a list of those.

use crate::filesystem::NOTE_EXTENSION;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn wiki_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("wiki link pattern is valid"))
}

/// Raw link targets in `value`, with aliases and headings stripped.
pub fn link_targets(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => string_targets(s),
        Value::Array(items) => items.iter().flat_map(link_targets).collect(),
        _ => Vec::new(),
    }
}

fn string_targets(s: &str) -> Vec<String> {
    let links: Vec<&str> = wiki_link_regex()
        .captures_iter(s)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    let raw = if links.is_empty() { vec![s] } else { links };

    raw.into_iter()
        .filter_map(|link| {
            let target = link.split('|').next().unwrap_or(link);
            let target = target.split('#').next().unwrap_or(target).trim();
            (!target.is_empty()).then(|| target.to_string())
        })
        .collect()
}

/// Resolve one link target against the known record ids.
///
/// Exact vault-relative paths win, then the shortest record whose file name
/// matches. Unknown targets resolve to `<target>.md`.
pub fn resolve_target(target: &str, known: &[String]) -> String {
    let normalized = target.trim_start_matches("./").trim_start_matches('/');
    let suffix = format!(".{NOTE_EXTENSION}");
    let candidate = if normalized.ends_with(&suffix) {
        normalized.to_string()
    } else {
        format!("{normalized}{suffix}")
    };

    if known.iter().any(|k| *k == candidate) {
        return candidate;
    }

    if !candidate.contains('/') {
        let by_name = known
            .iter()
            .filter(|k| k.rsplit('/').next() == Some(candidate.as_str()))
            .min_by_key(|k| (k.len(), (*k).clone()));
        if let Some(found) = by_name {
            return found.clone();
        }
    }

    candidate
}

/// Resolve every target in `value`, de-duplicated in first-seen order.
pub fn resolve_reference(value: &Value, known: &[String]) -> Vec<String> {
    let mut resolved: Vec<String> = Vec::new();
    for target in link_targets(value) {
        let id = resolve_target(&target, known);
        if !resolved.contains(&id) {
            resolved.push(id);
        }
    }
    resolved
}
