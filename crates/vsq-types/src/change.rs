use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// How a feature differs between an old revision and a new revision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    /// Present in the new revision, absent in the old one.
    Added,
    /// Present in both revisions with different content.
    Modified,
    /// Present in the old revision, absent in the new one.
    Removed,
}

impl ChangeType {
    /// All change types, in declaration order.
    pub const ALL: [ChangeType; 3] = [Self::Added, Self::Modified, Self::Removed];

    /// Returns `true` if the feature's relevant content lives on the old side.
    pub fn reads_old_side(&self) -> bool {
        matches!(self, Self::Removed)
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "ADDED"),
            Self::Modified => write!(f, "MODIFIED"),
            Self::Removed => write!(f, "REMOVED"),
        }
    }
}

impl FromStr for ChangeType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADDED" => Ok(Self::Added),
            "MODIFIED" => Ok(Self::Modified),
            "REMOVED" => Ok(Self::Removed),
            _ => Err(TypeError::UnknownChangeType(s.to_string())),
        }
    }
}
