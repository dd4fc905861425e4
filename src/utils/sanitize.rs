//! Filename sanitization utilities

/// Longest file or folder name we produce, in characters
pub const MAX_FILENAME_CHARS: usize = 200;

/// Characters rejected by at least one major filesystem
const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitize a filename for safe filesystem usage
///
/// Strips characters that are illegal in file or directory names on common
/// operating systems (plus control characters), truncates to
/// [`MAX_FILENAME_CHARS`] characters and trims surrounding whitespace.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(sanitize_filename("AC/DC: Live?"), "ACDC Live");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .take(MAX_FILENAME_CHARS)
        .collect();

    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_slashes() {
        assert_eq!(sanitize_filename("BOTHERED / UNBOTHERED"), "BOTHERED  UNBOTHERED");
        assert_eq!(sanitize_filename("AC/DC"), "ACDC");
    }

    #[test]
    fn test_sanitize_all_forbidden() {
        let out = sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#);
        assert_eq!(out, "abcdefghij");
    }

    #[test]
    fn test_sanitize_control_characters() {
        assert_eq!(sanitize_filename("Null\0Byte\tTab"), "NullByteTab");
    }

    #[test]
    fn test_trim_whitespace() {
        assert_eq!(sanitize_filename("  Album Name  "), "Album Name");
        assert_eq!(sanitize_filename(" ? Leading"), "Leading");
    }

    #[test]
    fn test_truncates_by_characters() {
        let long = "é".repeat(300);
        let out = sanitize_filename(&long);
        assert_eq!(out.chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn test_truncate_then_trim_stays_within_limit() {
        let name = format!("{} tail", "x".repeat(199));
        let out = sanitize_filename(&name);
        assert_eq!(out, "x".repeat(199));
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Normal Track - Artist",
            "  What? Is: This / That  ",
            "<<<>>>",
            "",
            "x  *  ",
        ];
        let long = format!("{}  *y", "z".repeat(198));

        for input in inputs.iter().copied().chain(std::iter::once(long.as_str())) {
            let once = sanitize_filename(input);
            let twice = sanitize_filename(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
            assert!(once.chars().count() <= MAX_FILENAME_CHARS);
            assert!(!once.chars().any(|c| FORBIDDEN.contains(&c)));
        }
    }

    #[test]
    fn test_no_changes_needed() {
        assert_eq!(sanitize_filename("Normal Album Name"), "Normal Album Name");
    }
}
