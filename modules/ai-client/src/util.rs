/// Strip a surrounding markdown code fence (```` ``` ```` or ```` ```json ````) from a response.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json", "JSON", "text", ...) on the opening fence line.
    let body = match rest.find('\n') {
        Some(newline) if rest[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
            &rest[newline + 1..]
        }
        _ => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```JSON\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("  {}  "), "{}");
    }

    #[test]
    fn test_strip_code_blocks_keeps_unfenced_text() {
        let text = "ON-SCREEN TITLE: ship it\nHOOK: now";
        assert_eq!(strip_code_blocks(text), text);
    }
}
