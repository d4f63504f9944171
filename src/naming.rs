//! Naming Rules Module
//! Product-code patterns: group prefixes, preform ids and file-safe names.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static SAFE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-.]+$").unwrap());
static W_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]{3}\d{5}[A-Z]\d{2}W\d{2}[^0-9])").unwrap());
// Greedy `.+` lands on the rightmost letter that is followed by a digit.
static GENERIC_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+[A-Z])\d").unwrap());
static FILENAME_TO_PREFORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z0-9]{3}\d{5}).*?([A-Z])$").unwrap());
static ZERO_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+\-]?\s*0+(?:[.,]0+)?\s*$").unwrap());
static UNSAFE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").unwrap());

pub fn is_safe_name(s: &str) -> bool {
    SAFE_NAME.is_match(s)
}

/// Prefix up to the rightmost uppercase letter followed by a digit, or the whole code.
pub fn extract_prefix_generic(s: &str) -> String {
    let t = s.trim().to_uppercase();
    match GENERIC_PREFIX.captures(&t) {
        Some(caps) => caps[1].to_string(),
        None => t,
    }
}

/// Prefix of a W-series code (`XXX#####L##W##?`), empty when the code does not match.
pub fn extract_prefix_wpattern(s: &str) -> String {
    let t = s.trim().to_uppercase();
    W_PREFIX
        .captures(&t)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

pub fn extract_group_prefix(s: &str, use_w_first: bool) -> String {
    let (first, second): (fn(&str) -> String, fn(&str) -> String) = if use_w_first {
        (extract_prefix_wpattern, extract_prefix_generic)
    } else {
        (extract_prefix_generic, extract_prefix_wpattern)
    };
    let p = first(s);
    if p.is_empty() {
        second(s)
    } else {
        p
    }
}

/// Directory bucket for a group key: its first three characters.
pub fn prefix3(key: &str) -> String {
    if key.chars().count() >= 3 {
        key.chars().take(3).collect()
    } else {
        "UNK".to_string()
    }
}

pub fn second_last_is_zero(s: &str) -> bool {
    s.trim().chars().rev().nth(1) == Some('0')
}

pub fn is_zero_like(s: &str) -> bool {
    if ZERO_LIKE.is_match(s) {
        return true;
    }
    matches!(s.trim().replace(',', ".").parse::<f64>(), Ok(n) if n == 0.0)
}

pub fn safe_filename(name: &str) -> String {
    let s = name.trim();
    let s = if s.is_empty() { "EMPTY" } else { s };
    UNSAFE_RUN.replace_all(s, "_").into_owned()
}

/// Preform id (`base8 + trailing letter`) from a workbook's file stem.
pub fn preform_from_filename(path: &Path, fallback: Option<String>) -> Option<String> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();
    match FILENAME_TO_PREFORM.captures(&stem) {
        Some(caps) => Some(format!("{}{}", &caps[1], &caps[2])),
        None => fallback,
    }
}

/// Lock files and hidden entries left behind by spreadsheet editors.
pub fn is_temp_or_hidden(name: &str) -> bool {
    name.starts_with("~$") || name.starts_with('.') || name.ends_with(".tmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("W0012345A01B05", "W0012345A01B")]
    #[case(" l0e22222c01d01 ", "L0E22222C01D")]
    #[case("ABC", "ABC")]
    #[case("12345", "12345")]
    fn generic_prefix(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(extract_prefix_generic(input), expected);
    }

    #[rstest]
    #[case("ABC12345D01W02X9", "ABC12345D01W02X")]
    #[case("ABC12345D01W021", "")]
    #[case("short", "")]
    fn w_prefix(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(extract_prefix_wpattern(input), expected);
    }

    #[test]
    fn group_prefix_order() {
        let code = "ABC12345D01W02X9";
        assert_eq!(extract_group_prefix(code, true), "ABC12345D01W02X");
        assert_eq!(extract_group_prefix(code, false), "ABC12345D01W02X");
        assert_eq!(extract_group_prefix("ABC12345D01W02Y10", true), "ABC12345D01W02Y");
        assert_eq!(extract_group_prefix("", false), "");
    }

    #[rstest]
    #[case("W0012345A01B05", true)]
    #[case("W0012345A01B15", false)]
    #[case("05 ", true)]
    #[case("0", false)]
    fn second_last_zero(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(second_last_is_zero(input), expected);
    }

    #[rstest]
    #[case("0", true)]
    #[case(" -00.000 ", true)]
    #[case("0,0", true)]
    #[case("0e3", true)]
    #[case("0.5", false)]
    #[case("O", false)]
    #[case("", false)]
    fn zero_like(#[case] input: &str, #[case] expected: bool) {
        assert_eq!(is_zero_like(input), expected);
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(safe_filename("AB C/D"), "AB_C_D");
        assert_eq!(safe_filename("  "), "EMPTY");
        assert_eq!(safe_filename("ok-1.2_x"), "ok-1.2_x");
    }

    #[test]
    fn preform_from_stem() {
        assert_eq!(
            preform_from_filename(Path::new("dir/W0012345A01B.xlsx"), None).as_deref(),
            Some("W0012345B")
        );
        assert_eq!(
            preform_from_filename(Path::new("odd-name.xlsx"), Some("P1".into())).as_deref(),
            Some("P1")
        );
    }

    #[test]
    fn prefix_buckets() {
        assert_eq!(prefix3("W0012345A01B"), "W00");
        assert_eq!(prefix3("AB"), "UNK");
    }
}
