//! `<ref>:<path>` revision specifications.

use std::fmt;
use std::str::FromStr;

use vsq_types::ObjectId;

use crate::error::{RepoError, RepoResult};
use crate::names::validate_ref_name;

/// The symbolic ref naming the current branch.
pub const HEAD: &str = "HEAD";

/// A revision plus a path inside its root tree.
///
/// The ref part may be `HEAD`, a full ref name (`refs/heads/x`,
/// `refs/tags/x`), a short branch or tag name, or a 64-character hex commit
/// or tree id. The NULL id names the empty tree. An empty path addresses the
/// root tree itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RevSpec {
    pub reference: String,
    pub path: String,
}

impl RevSpec {
    pub fn new(reference: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            path: path.into(),
        }
    }

    /// `HEAD:<path>`.
    pub fn head(path: impl Into<String>) -> Self {
        Self::new(HEAD, path)
    }

    /// The NULL revision at `path`; always resolves to the empty tree.
    pub fn null(path: impl Into<String>) -> Self {
        Self::new(ObjectId::null().to_hex(), path)
    }

    /// Parse `<ref>[:<path>]`, splitting at the first `:`.
    pub fn parse(spec: &str) -> RepoResult<Self> {
        let (reference, path) = spec.split_once(':').unwrap_or((spec, ""));
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(RepoError::InvalidRevSpec {
                spec: spec.to_string(),
                reason: "missing ref".into(),
            });
        }
        if reference != HEAD && !ObjectId::looks_like_hex(reference) {
            validate_ref_name(reference)?;
        }
        let path = path.trim_matches('/');
        if !path.is_empty() && path.split('/').any(str::is_empty) {
            return Err(RepoError::InvalidRevSpec {
                spec: spec.to_string(),
                reason: "empty path segment".into(),
            });
        }
        Ok(Self::new(reference, path))
    }

    /// Same revision, another path.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self::new(self.reference.clone(), path)
    }

    /// Returns `true` if the ref part is the NULL id.
    pub fn is_null(&self) -> bool {
        ObjectId::from_hex(&self.reference).is_ok_and(|id| id.is_null())
    }

    /// Path segments, empty for the root.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for RevSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reference)
        } else {
            write!(f, "{}:{}", self.reference, self.path)
        }
    }
}

impl FromStr for RevSpec {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
