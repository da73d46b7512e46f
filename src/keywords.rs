//! Alert keyword set
//!
//! Lines are classified as alert-worthy by case-insensitive substring
//! containment. Keywords are stored lowercase and never change after
//! construction, so a single `Arc<KeywordSet>` is shared by every watcher.

/// Keywords used by the default monitor configuration
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "error",
    "fail",
    "denied",
    "invalid",
    "sql",
    "union select",
    "drop table",
    "xss",
    "<script>",
    "csrf",
    "upload",
    "nmap",
    "masscan",
    "sqlmap",
    "injection",
    "brute",
    "password",
    "sudo",
    "permission denied",
];

/// Immutable set of lowercase trigger substrings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Build a keyword set, lowercasing every entry and dropping empty ones
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Whether the line contains any keyword, ignoring case
    pub fn matches(&self, line: &str) -> bool {
        self.first_match(line).is_some()
    }

    /// The first keyword (in set order) contained in the line
    pub fn first_match(&self, line: &str) -> Option<&str> {
        let lowered = line.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}
