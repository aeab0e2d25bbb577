/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Trim, replace every `/` with ` & `, then title-case the whole string as a
/// single unit: first character upper, everything after it lower.
///
/// `"EAGLE/PITKIN"` becomes `"Eagle & pitkin"`, not `"Eagle & Pitkin"`.
pub fn normalize_county(raw: &str) -> String {
    let replaced = raw.trim().replace('/', " & ");
    let mut chars = replaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
