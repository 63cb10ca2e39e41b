//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

/// Largest `--max-depth` accepted on the command line.
pub const MAX_DEPTH_LIMIT: u32 = 64;

/// Largest `--concurrency` accepted on the command line.
pub const MAX_CONCURRENCY: usize = 256;

/// Validate an issue key.
///
/// Keys are either internal ids (`2-17`) or readable ids (`PROJ-17`). The
/// source decides which one it is; here we only reject input no tracker
/// would accept.
pub fn validate_issue_key(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Issue ID cannot be empty".to_string());
    }

    if s.chars().any(char::is_whitespace) {
        return Err(format!("Issue ID cannot contain whitespace: '{s}'"));
    }

    if let Some(pos) = s.chars().position(char::is_control) {
        return Err(format!(
            "Issue ID contains invalid control character at position {pos}"
        ));
    }

    Ok(s.to_string())
}

/// Validate the traversal depth bound.
pub fn validate_max_depth(s: &str) -> Result<u32, String> {
    let depth: u32 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid depth '{s}': expected a non-negative integer"))?;

    if depth > MAX_DEPTH_LIMIT {
        return Err(format!(
            "Depth cannot exceed {MAX_DEPTH_LIMIT}, got {depth}"
        ));
    }

    Ok(depth)
}

/// Validate the in-flight fetch limit.
pub fn validate_concurrency(s: &str) -> Result<usize, String> {
    let limit: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid concurrency '{s}': expected a positive integer"))?;

    if limit == 0 {
        return Err("Concurrency must be at least 1".to_string());
    }

    if limit > MAX_CONCURRENCY {
        return Err(format!(
            "Concurrency cannot exceed {MAX_CONCURRENCY}, got {limit}"
        ));
    }

    Ok(limit)
}

/// Validate a state or type value used as a filter.
pub fn validate_field_value(s: &str) -> Result<String, String> {
    let s = s.trim();

    if s.is_empty() {
        return Err("Field value cannot be empty".to_string());
    }

    if s.contains('\n') || s.contains('\r') {
        return Err("Field value cannot contain newline characters".to_string());
    }

    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("2-17", "2-17")]
    #[case("PROJ-17", "PROJ-17")]
    #[case("  PROJ-17  ", "PROJ-17")]
    fn test_validate_issue_key_valid(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(validate_issue_key(input).unwrap(), expected);
    }

    #[rstest]
    #[case("", "empty")]
    #[case("   ", "empty")]
    #[case("PROJ 17", "whitespace")]
    #[case("PROJ-\u{7}", "control")]
    fn test_validate_issue_key_invalid(#[case] input: &str, #[case] reason: &str) {
        let err = validate_issue_key(input).unwrap_err();
        assert!(err.contains(reason), "unexpected error: {err}");
    }

    #[rstest]
    #[case("0", 0)]
    #[case("6", 6)]
    #[case(" 64 ", 64)]
    fn test_validate_max_depth_valid(#[case] input: &str, #[case] expected: u32) {
        assert_eq!(validate_max_depth(input).unwrap(), expected);
    }

    #[rstest]
    #[case("-1")]
    #[case("abc")]
    #[case("65")]
    fn test_validate_max_depth_invalid(#[case] input: &str) {
        assert!(validate_max_depth(input).is_err());
    }

    #[test]
    fn test_validate_concurrency() {
        assert_eq!(validate_concurrency("4").unwrap(), 4);
        assert!(validate_concurrency("0").unwrap_err().contains("at least 1"));
        assert!(validate_concurrency("1000").unwrap_err().contains("exceed"));
        assert!(validate_concurrency("many").is_err());
    }

    #[test]
    fn test_validate_field_value() {
        assert_eq!(validate_field_value(" In Progress ").unwrap(), "In Progress");
        assert!(validate_field_value("").is_err());
        assert!(validate_field_value("Open\nDone").is_err());
    }
}
