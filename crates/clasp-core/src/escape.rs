//! String escaping for script injection.

/// Escape `s` for use inside a single-quoted JavaScript string literal.
///
/// Escapes `'`, `\`, line feed and carriage return. Everything else passes
/// through unchanged.
pub fn escape_js(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape `s` for use inside a double-quoted JSON string.
///
/// Escapes `"`, `\`, line feed and carriage return.
pub fn escape_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn js_escapes_quotes_and_newlines() {
        assert_eq!(escape_js("it's"), "it\\'s");
        assert_eq!(escape_js("a\\b"), "a\\\\b");
        assert_eq!(escape_js("l1\nl2\r"), "l1\\nl2\\r");
        assert_eq!(escape_js(r#"{"t":"x"}"#), r#"{"t":"x"}"#);
    }

    #[test]
    fn json_escapes_double_quotes() {
        assert_eq!(escape_json(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_json("it's"), "it's");
        assert_eq!(escape_json("tab\tstays"), "tab\tstays");
    }
}
