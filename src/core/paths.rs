//! core::paths
//!
//! Centralized path routing for game content in the content store.
//!
//! # Storage Layout
//!
//! ```text
//! public/config.json                      legacy published
//! public/missions.json
//! public/draft/config.json                legacy draft
//! public/games/<slug>/config.json         published
//! public/games/<slug>/draft/config.json   draft
//! game/public/games/<slug>/config.json    mirror of published (player site)
//! ```
//!
//! **Hard rule:** no code outside this module builds a `public/...` path by
//! hand. Everything here is pure and total: no I/O, no failure.
//!
//! # Example
//!
//! ```
//! use trailhead::core::paths::{candidate_paths, destination_base, mirror_path};
//! use trailhead::core::types::{Channel, Slug};
//!
//! let slug = Slug::new("pirate-cove").unwrap();
//! assert_eq!(
//!     candidate_paths(&slug),
//!     vec![
//!         "public/games/pirate-cove/draft",
//!         "public/games/pirate-cove",
//!         "public/draft",
//!         "public",
//!     ]
//! );
//! assert_eq!(destination_base(&slug, Channel::Published), "public/games/pirate-cove");
//! assert_eq!(
//!     mirror_path("public/games/pirate-cove/config.json", &slug).as_deref(),
//!     Some("game/public/games/pirate-cove/config.json")
//! );
//! ```

use super::types::{Channel, Document, Slug};

/// Root of all admin-managed content.
pub const PUBLIC_ROOT: &str = "public";

/// Directory holding per-game content.
pub const GAMES_ROOT: &str = "public/games";

/// Prefix of the companion tree consumed by the player-facing site.
pub const MIRROR_PREFIX: &str = "game/";

/// Slug values that denote the legacy (unslugged) game.
pub const LEGACY_TOKENS: [&str; 3] = ["(legacy root)", "legacy-root", "root"];

const DRAFT_SEGMENT: &str = "draft";

/// Whether a raw slug denotes the legacy root.
///
/// True iff the trimmed, lowercased value is empty or one of
/// [`LEGACY_TOKENS`].
pub fn is_legacy(raw: &str) -> bool {
    let normalized = raw.trim().to_lowercase();
    normalized.is_empty() || LEGACY_TOKENS.contains(&normalized.as_str())
}

/// Base path of a game's published content.
fn game_base(slug: &Slug) -> String {
    format!("{}/{}", GAMES_ROOT, slug.as_str())
}

/// Ordered base paths to probe for a game's current content, most specific
/// first.
///
/// Per-game draft, per-game published, global draft, global published. The
/// legacy root only has the last two.
pub fn candidate_paths(slug: &Slug) -> Vec<String> {
    let mut candidates = Vec::with_capacity(4);
    if !slug.is_legacy() {
        let base = game_base(slug);
        candidates.push(format!("{}/{}", base, DRAFT_SEGMENT));
        candidates.push(base);
    }
    candidates.push(format!("{}/{}", PUBLIC_ROOT, DRAFT_SEGMENT));
    candidates.push(PUBLIC_ROOT.to_string());
    candidates
}

/// Canonical base path to write a game's content for a channel.
pub fn destination_base(slug: &Slug, channel: Channel) -> String {
    let published = if slug.is_legacy() {
        PUBLIC_ROOT.to_string()
    } else {
        game_base(slug)
    };

    match channel {
        Channel::Published => published,
        Channel::Draft => format!("{}/{}", published, DRAFT_SEGMENT),
    }
}

/// Full path of a document under a base path.
pub fn document_path(base: &str, document: Document) -> String {
    format!("{}/{}", base, document.file_name())
}

/// Companion-tree path for an admin path.
///
/// Returns `None` for the legacy root and for paths outside
/// `public/games/<slug>`.
pub fn mirror_path(admin_path: &str, slug: &Slug) -> Option<String> {
    if slug.is_legacy() {
        return None;
    }

    let base = game_base(slug);
    let rest = admin_path.strip_prefix(&base)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(format!("{}{}", MIRROR_PREFIX, admin_path))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slug(s: &str) -> Slug {
        Slug::new(s).unwrap()
    }

    mod legacy {
        use super::*;

        #[test]
        fn empty_and_reserved_tokens_are_legacy() {
            assert!(is_legacy(""));
            assert!(is_legacy("  "));
            assert!(is_legacy("root"));
            assert!(is_legacy("Legacy-Root"));
            assert!(is_legacy(" (legacy root) "));
        }

        #[test]
        fn other_strings_are_not_legacy() {
            assert!(!is_legacy("pirate-cove"));
            assert!(!is_legacy("roots"));
            assert!(!is_legacy("legacy"));
            assert!(!is_legacy("(legacy-root)"));
        }
    }

    mod candidates {
        use super::*;

        #[test]
        fn legacy_root() {
            assert_eq!(candidate_paths(&Slug::legacy()), vec!["public/draft", "public"]);
        }

        #[test]
        fn slugged_game() {
            assert_eq!(
                candidate_paths(&slug("pirate-cove")),
                vec![
                    "public/games/pirate-cove/draft",
                    "public/games/pirate-cove",
                    "public/draft",
                    "public",
                ]
            );
        }
    }

    mod destination {
        use super::*;

        #[test]
        fn legacy_destinations() {
            let legacy = Slug::legacy();
            assert_eq!(destination_base(&legacy, Channel::Published), "public");
            assert_eq!(destination_base(&legacy, Channel::Draft), "public/draft");
        }

        #[test]
        fn slugged_destinations() {
            let foo = slug("foo");
            assert_eq!(destination_base(&foo, Channel::Published), "public/games/foo");
            assert_eq!(destination_base(&foo, Channel::Draft), "public/games/foo/draft");
        }

        #[test]
        fn document_paths() {
            assert_eq!(
                document_path("public/games/foo", Document::Missions),
                "public/games/foo/missions.json"
            );
        }
    }

    mod mirror {
        use super::*;

        #[test]
        fn rewrites_game_paths() {
            assert_eq!(
                mirror_path("public/games/foo/missions.json", &slug("foo")).as_deref(),
                Some("game/public/games/foo/missions.json")
            );
        }

        #[test]
        fn legacy_has_no_mirror() {
            assert_eq!(mirror_path("public/config.json", &Slug::legacy()), None);
        }

        #[test]
        fn other_game_prefix_is_not_mirrored() {
            assert_eq!(mirror_path("public/games/foobar/config.json", &slug("foo")), None);
            assert_eq!(mirror_path("public/config.json", &slug("foo")), None);
        }
    }
}
