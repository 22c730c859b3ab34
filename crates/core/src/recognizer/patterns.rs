use once_cell::sync::Lazy;
use regex::Regex;

/// Free-text patterns used by the recognizer's second pass. Each one only
/// contributes values not already produced by the structured-field pass
/// (SPEC_FULL.md §4.1).
pub static IP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("valid regex"));

pub static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9]([a-z0-9\-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9\-]{0,61}[a-z0-9])?)*\.[a-z]{2,}\b")
        .expect("valid regex")
});

pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}\b").expect("valid regex")
});

pub static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("valid regex"));

pub static HASH_MD5_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[a-f0-9]{32}\b").expect("valid regex"));

pub static HASH_SHA1_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[a-f0-9]{40}\b").expect("valid regex"));

pub static HASH_SHA256_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b[a-f0-9]{64}\b").expect("valid regex"));
