//! Canonical text forms shared by the matcher and the folder layout.

/// Lowercase, map every character outside `[a-z0-9]` to a space, collapse
/// runs of whitespace and trim.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`. Absent name
/// fields are passed as `""` by callers.
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let spaced: String = lowered
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { ' ' })
        .collect();
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Non-empty tokens of the normalized string, in order.
pub fn tokenize(s: &str) -> Vec<String> {
    normalize(s).split(' ').filter(|t| !t.is_empty()).map(String::from).collect()
}

/// Turn a name field into a single filesystem-safe folder token.
pub fn sanitize_folder_part(s: Option<&str>) -> String {
    let sanitized: String = s
        .unwrap_or_default()
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}
