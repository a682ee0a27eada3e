use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(\w*)?\s*\n?(.*?)\n?\s*```$").expect("fence pattern is valid")
});

/// Remove a surrounding Markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(2))
        .map(|body| body.as_str().trim())
        .filter(|body| !body.is_empty())
        .unwrap_or(trimmed)
}

/// Parse model output as a JSON array of strings. `None` when the output is
/// not valid JSON or not an array made only of strings.
pub fn parse_tag_array(raw: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(strip_code_fence(raw)).ok()?;
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

/// Canonical form of a single tag: trimmed and lowercased. `None` when
/// nothing is left.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim().to_lowercase();
    (!tag.is_empty()).then_some(tag)
}

/// Append `tag` in canonical form unless it is blank or already present.
pub fn push_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    match normalize_tag(tag) {
        Some(tag) if !tags.contains(&tag) => {
            tags.push(tag);
            true
        }
        _ => false,
    }
}

/// Trim, lowercase and dedupe, keeping first occurrences. Empty tags drop out.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        push_tag(&mut out, tag.as_ref());
    }
    out
}

/// Deterministic tag for a filename: the part before the first `.`,
/// lowercased, with `_` turned into spaces.
pub fn fallback_tag(filename: &str) -> String {
    let name = filename.trim();
    let stem = name.split('.').next().unwrap_or_default();
    let stem = if stem.trim().is_empty() { name } else { stem };
    let tag = stem.replace('_', " ").trim().to_lowercase();
    if tag.is_empty() {
        "untitled".to_string()
    } else {
        tag
    }
}
