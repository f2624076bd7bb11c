//! String transformation utilities for code generation

/// Uppercase the first character of an identifier.
///
/// Only ASCII letters are folded; identifiers are validated at parse time to
/// start with an ASCII letter or underscore, so non-ASCII leading characters
/// never reach this function through the normal pipeline.
pub fn title(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
    }
}

/// Lowercase the first character of an identifier.
pub fn camel(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
    }
}

/// Trim surrounding ASCII single and double quotes.
pub fn trim_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}

/// Append `name` to `acc` unless it is already present, preserving first-seen
/// order.
pub fn push_unique(acc: &mut Vec<String>, name: &str) {
    if !acc.iter().any(|existing| existing == name) {
        acc.push(name.to_string());
    }
}
