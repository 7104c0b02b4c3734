//! String checks and small text transformations.

/// True when any character is a CJK unified ideograph.
pub fn is_contain_zh(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// True when every character is a CJK unified ideograph.
pub fn is_zh(text: &str) -> bool {
    text.chars().all(is_cjk)
}

/// True when every character is an ASCII letter.
pub fn is_en(text: &str) -> bool {
    text.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

pub fn contains_all(text: &str, needles: &[&str]) -> bool {
    needles.iter().all(|n| text.contains(n))
}

pub fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

/// True when any of the values is empty or whitespace only.
pub fn any_blank(values: &[&str]) -> bool {
    let blank = values.iter().any(|v| v.trim().is_empty());
    if blank {
        tracing::warn!(?values, "blank value found");
    }
    blank
}

/// Rewrite `'` quotes and `True`/`False`/`None` into JSON syntax.
/// Text without any of them is returned unchanged.
pub fn normalize_json_literals(text: &str) -> String {
    if !contains_any(text, &["True", "False", "'"]) {
        return text.to_string();
    }
    text.replace('\'', "\"")
        .replace("True", "true")
        .replace("False", "false")
        .replace("None", "null")
}

/// Replace characters that are not allowed in file names.
pub fn sanitize_file_name(name: &str, replacement: &str) -> String {
    const INVALID: [char; 8] = ['|', '"', '：', '?', '*', '<', '>', ':'];
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if INVALID.contains(&c) {
            out.push_str(replacement);
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a character index (0-based) to a byte index in the given string.
/// If `n` exceeds the number of characters, returns `s.len()`.
pub fn char_to_byte_index(s: &str, n: usize) -> usize {
    match s.char_indices().nth(n) {
        Some((i, _)) => i,
        None => s.len(),
    }
}

/// At most `max_chars` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    &s[..char_to_byte_index(s, max_chars)]
}
