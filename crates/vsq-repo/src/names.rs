//! Ref name validation.
//!
//! Names follow git-style rules: non-empty, no whitespace or any of
//! `~ ^ : ? * [ \`, no `..` or `@{`, no leading or trailing `.` or `/`,
//! no `.lock` suffix, and no empty or dot-prefixed path components.

use crate::error::{RepoError, RepoResult};

/// Characters that may not appear anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

pub const HEADS_PREFIX: &str = "refs/heads/";
pub const TAGS_PREFIX: &str = "refs/tags/";

fn invalid(name: &str, reason: impl Into<String>) -> RepoError {
    RepoError::InvalidRefName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a short or full ref name.
pub fn validate_ref_name(name: &str) -> RepoResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "must not be empty"));
    }
    if let Some(ch) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(invalid(name, format!("contains forbidden character {ch:?}")));
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }
    if name.ends_with('.') {
        return Err(invalid(name, "must not end with '.'"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(name, format!("component {component:?} starts with '.'")));
        }
    }
    Ok(())
}

/// Full branch ref name for a short branch name.
pub fn branch_ref(short: &str) -> String {
    if short.starts_with(HEADS_PREFIX) {
        short.to_string()
    } else {
        format!("{HEADS_PREFIX}{short}")
    }
}

/// Full tag ref name for a short tag name.
pub fn tag_ref(short: &str) -> String {
    if short.starts_with(TAGS_PREFIX) {
        short.to_string()
    } else {
        format!("{TAGS_PREFIX}{short}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_names() {
        for name in ["main", "feature/roads", "v1.0", "refs/heads/main", "HEAD"] {
            assert!(validate_ref_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for name in [
            "", "has space", "a..b", "a@{1}", "x.lock", "/lead", "trail/", "a//b", ".hidden",
            "dir/.hidden", "end.", "star*", "col:on",
        ] {
            assert!(
                matches!(validate_ref_name(name), Err(RepoError::InvalidRefName { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn prefixes_are_not_doubled() {
        assert_eq!(branch_ref("main"), "refs/heads/main");
        assert_eq!(branch_ref("refs/heads/main"), "refs/heads/main");
        assert_eq!(tag_ref("v1"), "refs/tags/v1");
    }
}
