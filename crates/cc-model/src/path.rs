//! Lexical path normalisation
//!
//! Store paths are `/`-separated regardless of host platform, since most
//! backends are object stores.

/// Normalise a `/`-separated path lexically
///
/// - repeated separators collapse to one
/// - `.` segments are dropped
/// - `..` removes the preceding segment (and is dropped at the root)
/// - an empty result becomes `.` (or `/` when rooted)
#[must_use]
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Join a store root with a relative path and normalise the result
#[must_use]
pub fn join_root(root: &str, relative: &str) -> String {
    clean_path(&format!("{root}/{relative}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clean_basic() {
        assert_eq!(clean_path(""), ".");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("a/b/c"), "a/b/c");
        assert_eq!(clean_path("a//b///c/"), "a/b/c");
        assert_eq!(clean_path("/a/./b/."), "/a/b");
    }

    #[test]
    fn clean_parent_segments() {
        assert_eq!(clean_path("a/b/../c"), "a/c");
        assert_eq!(clean_path("/../a"), "/a");
        assert_eq!(clean_path("../a"), "../a");
        assert_eq!(clean_path("a/../.."), "..");
        assert_eq!(clean_path("a/.."), ".");
    }

    #[test]
    fn join_root_normalises() {
        assert_eq!(join_root("/", "sims/1/out.csv"), "/sims/1/out.csv");
        assert_eq!(join_root("/data/", "/sims//1"), "/data/sims/1");
        assert_eq!(join_root("bucket", "a/../b"), "bucket/b");
    }

    proptest! {
        #[test]
        fn clean_is_idempotent(path in "[a-z./]{0,24}") {
            let once = clean_path(&path);
            prop_assert_eq!(clean_path(&once), once);
        }

        #[test]
        fn clean_has_no_empty_or_dot_segments(path in "[a-z./]{0,24}") {
            let cleaned = clean_path(&path);
            if cleaned != "." && cleaned != "/" {
                prop_assert!(!cleaned.contains("//"));
                prop_assert!(!cleaned.ends_with('/'));
                prop_assert!(cleaned.split('/').all(|s| s != "."));
            }
        }
    }
}
