//! Best-effort JSON extraction from free-form model output.
//!
//! Deterministic precedence: a fenced ```json block wins; otherwise the
//! substring from the first `{` to the last `}`; otherwise nothing.

/// Extract the JSON payload from raw model output, if any.
pub fn extract_json(raw: &str) -> Option<&str> {
    if let Some(fenced) = extract_fenced(raw) {
        return Some(fenced);
    }

    extract_braced(raw)
}

/// Contents of the first ```json fenced block, if present and closed.
fn extract_fenced(raw: &str) -> Option<&str> {
    let start = raw.find("```json")? + "```json".len();
    let rest = &raw[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Substring from the first `{` to the last `}`, if both exist in order.
fn extract_braced(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Remove fenced-code markers from raw output used as a plain-text answer.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_block() {
        let raw = "Here you go:\n```json\n{\"answer\": \"x\"}\n```\nthanks";
        assert_eq!(extract_json(raw), Some("{\"answer\": \"x\"}"));
    }

    #[test]
    fn test_bare_braces() {
        let raw = "Sure: {\"answer\": \"x\", \"confidence\": 0.9} hope that helps";
        assert_eq!(
            extract_json(raw),
            Some("{\"answer\": \"x\", \"confidence\": 0.9}")
        );
    }

    #[test]
    fn test_fenced_wins_over_braces() {
        // Braces appear before the fence; the fenced block still wins
        let raw = "{not json} then ```json\n{\"answer\": \"fenced\"}\n``` {also not}";
        assert_eq!(extract_json(raw), Some("{\"answer\": \"fenced\"}"));
    }

    #[test]
    fn test_unclosed_fence_falls_back_to_braces() {
        let raw = "```json\n{\"answer\": \"x\"}";
        assert_eq!(extract_json(raw), Some("{\"answer\": \"x\"}"));
    }

    #[test]
    fn test_no_json_at_all() {
        assert_eq!(extract_json("plain prose, no structure"), None);
        assert_eq!(extract_json(""), None);
    }

    #[test]
    fn test_reversed_braces_rejected() {
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_strip_code_fences() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");

        assert_eq!(strip_code_fences("no fences"), "no fences");
    }
}
