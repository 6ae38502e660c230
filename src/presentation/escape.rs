//! Escaping for HTML carried inside a JavaScript string literal.
//!
//! The feedback document is written into its iframe from an inline script, so
//! the escaped text must survive both the HTML tokenizer of the host page and
//! the JavaScript parser: no markup delimiters, no quotes, no line terminators.

/// Escape `input` for a single- or double-quoted script string literal.
///
/// Applied exactly once; escaping already escaped text doubles backslashes.
pub fn encode_for_script_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + input.len() / 8);
    for ch in input.chars() {
        match ch {
            '\\' => out.push_str("\\u005c"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '"' => out.push_str("\\u0022"),
            '\'' => out.push_str("\\u0027"),
            '&' => out.push_str("\\u0026"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            other => out.push(other),
        }
    }
    out
}

/// Make serialized JSON safe inside a `<script>` element. Only characters that
/// can appear inside JSON strings are touched, so the result is still the
/// same JSON value.
pub fn script_safe_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}
