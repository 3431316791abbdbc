//! Root-relative path normalization and the protected-path denylist.
//!
//! Every selection entry and manifest path passes through [`normalize_rel`]
//! before comparison or storage, so the protected check and archive entry
//! naming behave identically on Windows and Unix. [`is_protected`] is the
//! single predicate consulted at both build time and apply time.

/// Top-level directory names that are never included in a pack and never
/// overwritten by an apply, regardless of what a selection or manifest says.
pub const PROTECTED: &[&str] = &["saves", "screenshots", "logs", "crash-reports"];

/// Rewrite a root-relative path to `/` separators and strip leading and
/// trailing slashes.
pub fn normalize_rel(path: &str) -> String {
    path.replace('\\', "/").trim_matches('/').to_string()
}

/// First path segment of an already-normalized relative path.
pub fn top_segment(rel: &str) -> &str {
    rel.split('/').next().unwrap_or(rel)
}

/// True when the path's top-level segment is on the protected denylist.
pub fn is_protected(path: &str) -> bool {
    let rel = normalize_rel(path);
    PROTECTED.contains(&top_segment(&rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_backslashes() {
        assert_eq!(normalize_rel("config\\mod\\a.cfg"), "config/mod/a.cfg");
    }

    #[test]
    fn test_normalize_strips_slashes() {
        assert_eq!(normalize_rel("/mods/b.jar/"), "mods/b.jar");
        assert_eq!(normalize_rel("mods"), "mods");
    }

    #[test]
    fn test_top_segment() {
        assert_eq!(top_segment("saves/world/level.dat"), "saves");
        assert_eq!(top_segment("options.txt"), "options.txt");
    }

    #[test]
    fn test_protected_top_level() {
        assert!(is_protected("saves"));
        assert!(is_protected("saves/world/level.dat"));
        assert!(is_protected("\\logs\\latest.log"));
        assert!(is_protected("crash-reports/crash-2025.txt"));
    }

    #[test]
    fn test_not_protected() {
        assert!(!is_protected("config"));
        assert!(!is_protected("mods/saves.jar"));
        // only the top segment counts
        assert!(!is_protected("config/saves"));
    }
}
