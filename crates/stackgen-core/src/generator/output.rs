//! Parsing of free-form model replies into structured values.

use anyhow::{Context, Result, bail};

/// Extract the JSON object from a model reply.
///
/// Models frequently wrap JSON in a markdown fence or add a sentence before
/// it. The outermost `{ ... }` span is taken; anything around it is
/// discarded.
pub fn extract_json(reply: &str) -> Result<serde_json::Value> {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        bail!("reply contains no JSON object: {:?}", truncate(reply, 200));
    };
    if end < start {
        bail!("reply contains no JSON object: {:?}", truncate(reply, 200));
    }
    serde_json::from_str(&reply[start..=end]).context("reply is not valid JSON")
}

/// Read the `tech_stacks` string array out of a stack identification reply.
pub fn parse_tech_stacks(value: &serde_json::Value) -> Result<Vec<String>> {
    let stacks = value
        .get("tech_stacks")
        .and_then(|v| v.as_array())
        .context("reply has no `tech_stacks` array")?;

    stacks
        .iter()
        .map(|s| {
            s.as_str()
                .map(|s| s.trim().to_string())
                .with_context(|| format!("tech stack entry is not a string: {s}"))
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
