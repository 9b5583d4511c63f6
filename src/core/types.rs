//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Slug`] - Validated game identifier (or the legacy root)
//! - [`Channel`] - Draft or published variant of a game's content
//! - [`Document`] - One of the two top-level content documents of a game
//!
//! # Validation
//!
//! A [`Slug`] is normalized (trimmed, lowercased) and validated at
//! construction time, so a value that reaches the path resolver or the
//! content store can never contain path separators or parent references.
//!
//! # Examples
//!
//! ```
//! use trailhead::core::types::{Channel, Slug};
//!
//! let slug = Slug::new("Pirate-Cove ").unwrap();
//! assert_eq!(slug.as_str(), "pirate-cove");
//! assert!(!slug.is_legacy());
//!
//! assert!(Slug::new("root").unwrap().is_legacy());
//! assert!(Slug::new("../etc").is_err());
//!
//! assert_eq!(Channel::parse("published"), Some(Channel::Published));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::paths;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    #[error("invalid channel '{0}', must be one of: draft, published")]
    InvalidChannel(String),
}

/// A validated game slug.
///
/// Legacy slugs (empty or one of the reserved legacy tokens) are accepted
/// and normalized to the empty string. Every other slug must:
/// - start with an ASCII lowercase letter or digit
/// - contain only ASCII lowercase letters, digits, `-`, `_` and `.`
/// - not contain `..`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Create a new validated slug.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidSlug` if the normalized value is not URL-safe.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TypeError> {
        let raw = raw.as_ref();
        if paths::is_legacy(raw) {
            return Ok(Self::legacy());
        }

        let normalized = raw.trim().to_lowercase();
        Self::validate(&normalized)?;
        Ok(Self(normalized))
    }

    /// The legacy (unslugged) root game.
    pub fn legacy() -> Self {
        Self(String::new())
    }

    fn validate(slug: &str) -> Result<(), TypeError> {
        let mut chars = slug.chars();
        match chars.next() {
            Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {}
            _ => {
                return Err(TypeError::InvalidSlug(format!(
                    "'{}' must start with a lowercase letter or digit",
                    slug
                )))
            }
        }

        if let Some(bad) = chars.find(|c| {
            !(c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'))
        }) {
            return Err(TypeError::InvalidSlug(format!(
                "'{}' contains invalid character {:?}",
                slug, bad
            )));
        }

        if slug.contains("..") {
            return Err(TypeError::InvalidSlug(format!(
                "'{}' cannot contain '..'",
                slug
            )));
        }

        Ok(())
    }

    /// Get the normalized slug. Empty for the legacy root.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this slug denotes the legacy root game.
    pub fn is_legacy(&self) -> bool {
        self.0.is_empty()
    }

    /// Human-readable label used in commit messages and logs.
    pub fn label(&self) -> &str {
        if self.is_legacy() {
            "legacy root"
        } else {
            &self.0
        }
    }
}

impl TryFrom<String> for Slug {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Content channel of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Work-in-progress content edited in the console
    #[default]
    Draft,
    /// Live content read by the player-facing site
    Published,
}

impl Channel {
    /// Parse a channel name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Some(Channel::Draft),
            "published" => Some(Channel::Published),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Draft => "draft",
            Channel::Published => "published",
        }
    }
}

impl std::str::FromStr for Channel {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| TypeError::InvalidChannel(s.to_string()))
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Top-level content document of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Document {
    /// Game settings (`config.json`)
    Config,
    /// Ordered mission definitions (`missions.json`)
    Missions,
}

impl Document {
    /// Both documents, in write order.
    pub const ALL: [Document; 2] = [Document::Config, Document::Missions];

    pub fn as_str(&self) -> &'static str {
        match self {
            Document::Config => "config",
            Document::Missions => "missions",
        }
    }

    /// File name of this document within a base path.
    pub fn file_name(&self) -> &'static str {
        match self {
            Document::Config => "config.json",
            Document::Missions => "missions.json",
        }
    }
}

impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod slug {
        use super::*;

        #[test]
        fn normalizes_case_and_whitespace() {
            let slug = Slug::new("  Pirate-Cove\t").unwrap();
            assert_eq!(slug.as_str(), "pirate-cove");
        }

        #[test]
        fn legacy_tokens_normalize_to_empty() {
            for raw in ["", "   ", "root", "ROOT", "legacy-root", "(legacy root)", " (Legacy Root) "] {
                let slug = Slug::new(raw).unwrap();
                assert!(slug.is_legacy(), "{:?} should be legacy", raw);
                assert_eq!(slug.as_str(), "");
            }
        }

        #[test]
        fn rejects_path_separators() {
            assert!(Slug::new("a/b").is_err());
            assert!(Slug::new("a\\b").is_err());
        }

        #[test]
        fn rejects_parent_references() {
            assert!(Slug::new("..").is_err());
            assert!(Slug::new("a..b").is_err());
        }

        #[test]
        fn rejects_leading_punctuation() {
            assert!(Slug::new("-game").is_err());
            assert!(Slug::new(".game").is_err());
            assert!(Slug::new("_game").is_err());
        }

        #[test]
        fn accepts_url_safe_names() {
            for raw in ["game", "game-2", "v1.2", "a_b", "9lives"] {
                assert!(Slug::new(raw).is_ok(), "{:?} should be valid", raw);
            }
        }

        #[test]
        fn label_for_legacy() {
            assert_eq!(Slug::legacy().label(), "legacy root");
            assert_eq!(Slug::new("foo").unwrap().label(), "foo");
        }

        #[test]
        fn deserializes_with_validation() {
            let slug: Slug = serde_json::from_str("\"Foo\"").unwrap();
            assert_eq!(slug.as_str(), "foo");
            assert!(serde_json::from_str::<Slug>("\"a/b\"").is_err());
        }
    }

    mod channel {
        use super::*;

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!(Channel::parse("Draft"), Some(Channel::Draft));
            assert_eq!(Channel::parse("PUBLISHED"), Some(Channel::Published));
            assert_eq!(Channel::parse("live"), None);
        }

        #[test]
        fn default_is_draft() {
            assert_eq!(Channel::default(), Channel::Draft);
        }

        #[test]
        fn serde_uses_lowercase() {
            assert_eq!(
                serde_json::to_string(&Channel::Published).unwrap(),
                "\"published\""
            );
        }
    }

    #[test]
    fn document_file_names() {
        assert_eq!(Document::Config.file_name(), "config.json");
        assert_eq!(Document::Missions.file_name(), "missions.json");
    }
}
