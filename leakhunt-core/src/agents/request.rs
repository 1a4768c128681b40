//! Classification of the free-text investigation request

use once_cell::sync::Lazy;
use regex::Regex;

/// What the user asked to investigate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestKind {
    /// A GitHub repository, normalized to `https://github.com/owner/repo`
    Repository(String),
    /// A domain name for reconnaissance
    Domain(String),
    /// A brand or keyword to search code for
    Brand(String),
    /// Empty, conversational or otherwise unusable input
    Unclear,
}

#[allow(clippy::expect_used)]
static REPOSITORY_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:www\.)?github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?(?:/.*)?$")
        .expect("repository pattern should compile")
});

#[allow(clippy::expect_used)]
static DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}$")
        .expect("domain pattern should compile")
});

const SMALL_TALK: &[&str] = &[
    "hi", "hello", "hey", "help", "thanks", "thank you", "test", "yo", "?",
];

/// Longest brand phrase taken literally as a search term
const MAX_BRAND_WORDS: usize = 4;

/// Classify a request
///
/// A leading `query:` label is ignored.
pub fn classify(input: &str) -> RequestKind {
    let trimmed = input.trim();
    let text = trimmed
        .strip_prefix("query:")
        .map(str::trim)
        .unwrap_or(trimmed);

    if text.is_empty() || !text.chars().any(char::is_alphanumeric) {
        return RequestKind::Unclear;
    }
    if SMALL_TALK.contains(&text.to_lowercase().as_str()) {
        return RequestKind::Unclear;
    }

    if let Some(caps) = REPOSITORY_URL.captures(text) {
        if let (Some(owner), Some(repo)) = (caps.get(1), caps.get(2)) {
            return RequestKind::Repository(format!(
                "https://github.com/{}/{}",
                owner.as_str(),
                repo.as_str()
            ));
        }
    }

    let host = text
        .strip_prefix("https://")
        .or_else(|| text.strip_prefix("http://"))
        .unwrap_or(text)
        .trim_end_matches('/');
    if DOMAIN.is_match(host) {
        return RequestKind::Domain(host.to_lowercase());
    }

    if text.split_whitespace().count() > MAX_BRAND_WORDS || text.contains("://") {
        return RequestKind::Unclear;
    }
    RequestKind::Brand(text.to_string())
}
