//! Strip Markdown code fences the model wraps around its JSON payload.
//!
//! Purely textual: nothing here tries to repair the JSON itself.

const FENCE: &str = "```";

/// Trim `text` and remove surrounding code fences.
///
/// Handles `` ```json `` (any case), other single-word info strings, and bare
/// `` ``` `` fences. Fences are peeled until the text no longer starts with
/// one, so `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(text: &str) -> String {
    let mut clean = text.trim();

    while let Some(rest) = clean.strip_prefix(FENCE) {
        let rest = strip_info_string(rest);
        let rest = rest.trim_end();
        let rest = rest.strip_suffix(FENCE).unwrap_or(rest);
        clean = rest.trim();
    }

    clean.to_string()
}

/// Drop a fence info string (`json`, `JSON`, `javascript`) and the newline
/// after it. Text that does not look like an info string is left alone, so
/// `` ```{"a":1}``` `` keeps its payload.
fn strip_info_string(rest: &str) -> &str {
    let line_end = rest.find('\n').unwrap_or(rest.len());
    let (first_line, remainder) = rest.split_at(line_end);
    let tag = first_line.trim();

    let is_info_string = tag
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+');

    if is_info_string && (line_end < rest.len() || tag.is_empty()) {
        return remainder.strip_prefix('\n').unwrap_or(remainder);
    }

    // `json` on the same line as the payload: ```json {"a":1}```
    let lead = rest.trim_start();
    if let Some(head) = lead.get(..4) {
        let after = &lead[4..];
        if head.eq_ignore_ascii_case("json")
            && (after.is_empty() || after.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '['))
        {
            return after;
        }
    }

    rest
}
