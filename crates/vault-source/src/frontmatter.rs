//! Front matter and tag extraction for markdown notes.

use crate::Fields;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::OnceLock;

/// Parsed view of a note.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedNote {
    pub fields: Option<Fields>,
    /// Front matter and inline tags without `#`.
    pub tags: HashSet<String>,
}

fn inline_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[\s(\[,])#([\p{L}\p{N}_/\-]+)").expect("inline tag pattern is valid")
    })
}

/// Parse a note's front matter and collect its tags.
pub fn parse_note(content: &str) -> ParsedNote {
    let (yaml, body) = split_front_matter(content);
    let fields = yaml.and_then(parse_yaml_fields);

    let mut tags: HashSet<String> = fields
        .as_ref()
        .map(front_matter_tags)
        .unwrap_or_default()
        .into_iter()
        .collect();
    tags.extend(inline_tags(body));

    ParsedNote { fields, tags }
}

/// Split `content` into the front matter block (without delimiters) and the
/// body. Notes without a closed `---` block have no front matter.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = content.strip_prefix("---") else {
        return (None, content);
    };
    let Some(rest) = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')) else {
        return (None, content);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return (Some(&rest[..offset]), &rest[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, content)
}

fn parse_yaml_fields(yaml: &str) -> Option<Fields> {
    let parsed: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!("Ignoring unparseable front matter: {e}");
            return None;
        }
    };
    match serde_json::to_value(&parsed) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Ignoring front matter that is not JSON-representable: {e}");
            None
        }
    }
}

/// Tags declared in the `tags` (or `tag`) front matter field.
pub fn front_matter_tags(fields: &Fields) -> Vec<String> {
    let raw = fields.get("tags").or_else(|| fields.get("tag"));
    let mut tags = Vec::new();
    match raw {
        Some(Value::String(s)) => {
            tags.extend(s.split(|c: char| c == ',' || c.is_whitespace()).map(str::to_string))
        }
        Some(Value::Array(items)) => tags.extend(items.iter().filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })),
        _ => {}
    }
    tags.into_iter()
        .map(|t| t.trim().trim_start_matches('#').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// `#tags` in the note body. Fenced code blocks and purely numeric tags are
/// skipped.
pub fn inline_tags(body: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut in_fence = false;
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for capture in inline_tag_regex().captures_iter(line) {
            let tag = &capture[1];
            if !tag.chars().all(|c| c.is_ascii_digit()) {
                tags.push(tag.to_string());
            }
        }
    }
    tags
}
