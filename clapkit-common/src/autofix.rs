//! Best-effort repair of common malformed-JSON patterns
//!
//! Four independent textual passes, each applied wherever its pattern
//! matches: trailing commas, single-quoted keys, `"null"` string values,
//! repeated commas. This is deliberately not a parser — brace balance and
//! nesting are out of scope, and a pass that fires does not guarantee the
//! result parses. The caller re-parses and decides.

use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_COMMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));
static SINGLE_QUOTED_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"'([^']+)'(\s*:)").expect("valid regex"));
static NULL_STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#":\s*"null""#).expect("valid regex"));
static REPEATED_COMMA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*,").expect("valid regex"));

/// Result of an auto-fix pass
#[derive(Debug, Clone)]
pub struct AutoFix {
    /// True when at least one fix fired
    pub fixed: bool,
    /// The (possibly) transformed text
    pub json: String,
    /// Names of the fixes that fired, in application order
    pub fixes: Vec<String>,
}

/// Apply every repair pass to `input`.
pub fn auto_fix_json(input: &str) -> AutoFix {
    let mut json = input.to_string();
    let mut fixes = Vec::new();

    if TRAILING_COMMA_RE.is_match(&json) {
        json = TRAILING_COMMA_RE.replace_all(&json, "$1").into_owned();
        fixes.push("trailing comma removed".to_string());
    }

    if SINGLE_QUOTED_KEY_RE.is_match(&json) {
        json = SINGLE_QUOTED_KEY_RE
            .replace_all(&json, "\"$1\"$2")
            .into_owned();
        fixes.push("single-quoted keys converted to double quotes".to_string());
    }

    if NULL_STRING_RE.is_match(&json) {
        json = NULL_STRING_RE.replace_all(&json, ": null").into_owned();
        fixes.push("\"null\" string converted to null".to_string());
    }

    if REPEATED_COMMA_RE.is_match(&json) {
        json = REPEATED_COMMA_RE.replace_all(&json, ",").into_owned();
        fixes.push("repeated commas collapsed".to_string());
    }

    AutoFix {
        fixed: !fixes.is_empty(),
        json,
        fixes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_comma() {
        let result = auto_fix_json("{\"a\":1,}");
        assert!(result.fixed);
        assert_eq!(result.json, "{\"a\":1}");
        assert!(result.fixes.iter().any(|f| f.contains("trailing comma")));
        assert!(serde_json::from_str::<serde_json::Value>(&result.json).is_ok());
    }

    #[test]
    fn test_trailing_comma_before_bracket() {
        let result = auto_fix_json("[1, 2, 3, ]");
        assert_eq!(result.json, "[1, 2, 3 ]");
    }

    #[test]
    fn test_single_quoted_keys() {
        let result = auto_fix_json("{'film_id': \"FILM_000001\"}");
        assert_eq!(result.json, "{\"film_id\": \"FILM_000001\"}");
        assert_eq!(result.fixes.len(), 1);
    }

    #[test]
    fn test_single_quoted_values_left_alone() {
        // Only keys are converted; a single-quoted value has no trailing colon
        let result = auto_fix_json("{\"a\": 'b'}");
        assert!(!result.fixed);
        assert_eq!(result.json, "{\"a\": 'b'}");
    }

    #[test]
    fn test_null_string() {
        let result = auto_fix_json("{\"artist\": \"null\"}");
        assert_eq!(result.json, "{\"artist\": null}");
    }

    #[test]
    fn test_repeated_commas_single_pass() {
        assert_eq!(auto_fix_json("[1,,2]").json, "[1,2]");
        // One non-overlapping pass only: three commas shrink to two
        assert_eq!(auto_fix_json("[1,,,2]").json, "[1,,2]");
    }

    #[test]
    fn test_clean_input_untouched() {
        let input = "{\"a\": [1, 2], \"b\": null}";
        let result = auto_fix_json(input);
        assert!(!result.fixed);
        assert!(result.fixes.is_empty());
        assert_eq!(result.json, input);
    }

    #[test]
    fn test_multiple_fixes_in_order() {
        let result = auto_fix_json("{'a': \"null\",}");
        assert_eq!(result.json, "{\"a\": null}");
        assert_eq!(
            result.fixes,
            vec![
                "trailing comma removed".to_string(),
                "single-quoted keys converted to double quotes".to_string(),
                "\"null\" string converted to null".to_string(),
            ]
        );
    }
}
