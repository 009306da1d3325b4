/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// True when `path` has the given extension, ignoring ASCII case.
pub fn has_extension(path: &std::path::Path, extension: &str) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn clean_str_strips_whitespace_and_quotes() {
        assert_eq!(clean_str("  \"Crime ID\" "), "Crime ID");
        assert_eq!(clean_str("\""), "\"");
        assert_eq!(clean_str(" plain "), "plain");
    }

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_extension(Path::new("2024-01/street.CSV"), "csv"));
        assert!(!has_extension(Path::new("2024-01/readme.txt"), "csv"));
        assert!(!has_extension(Path::new("2024-01/noext"), "csv"));
    }
}
