const FENCE: &str = "```";

/// Isolates the JSON object embedded in a raw model completion.
///
/// Surrounding whitespace and a markdown code fence (with an optional language
/// tag) are removed first, then the span from the first `{` to the last `}` is
/// returned. The span is not checked for JSON validity. `None` means the text
/// holds no brace-delimited span at all.
pub fn extract_json(raw: &str) -> Option<&str> {
    let text = strip_code_fence(raw);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Removes a surrounding markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let text = raw.trim();
    let Some(body) = text.strip_prefix(FENCE) else {
        return text;
    };

    let body = body.trim_start_matches(|ch: char| ch.is_ascii_alphanumeric());
    let body = body.strip_suffix(FENCE).unwrap_or(body);
    body.trim()
}
