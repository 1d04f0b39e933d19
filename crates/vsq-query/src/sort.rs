//! Sort keys and the feature comparator.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use vsq_types::{Feature, Value};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }
}

/// One sort key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Native (tree walk) order.
    Natural,
    /// Native order, reversed.
    Reverse,
    /// Attribute value order; nulls sort first ascending.
    Property {
        name: String,
        #[serde(default)]
        direction: SortDirection,
    },
}

impl SortBy {
    pub fn property(name: impl Into<String>, direction: SortDirection) -> Self {
        Self::Property {
            name: name.into(),
            direction,
        }
    }

    pub fn asc(name: impl Into<String>) -> Self {
        Self::property(name, SortDirection::Ascending)
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self::property(name, SortDirection::Descending)
    }
}

/// Canonical ordering of a query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Stream in native order; nothing is buffered.
    #[default]
    Natural,
    /// Buffer and order by these keys, ties broken by native order.
    Explicit(Vec<SortBy>),
}

impl SortOrder {
    /// No keys, or a lone `Natural` key, is natural order.
    pub fn from_keys(keys: &[SortBy]) -> Self {
        match keys {
            [] | [SortBy::Natural] => Self::Natural,
            keys => Self::Explicit(keys.to_vec()),
        }
    }

    pub fn is_natural(&self) -> bool {
        matches!(self, Self::Natural)
    }

    /// Attributes the comparator reads.
    pub fn attribute_names(&self) -> BTreeSet<String> {
        match self {
            Self::Natural => BTreeSet::new(),
            Self::Explicit(keys) => keys
                .iter()
                .filter_map(|key| match key {
                    SortBy::Property { name, .. } => Some(name.clone()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Compare two features given their native positions.
    pub fn compare(&self, a: (&Feature, usize), b: (&Feature, usize)) -> Ordering {
        let Self::Explicit(keys) = self else {
            return a.1.cmp(&b.1);
        };
        for key in keys {
            let ord = match key {
                SortBy::Natural => a.1.cmp(&b.1),
                SortBy::Reverse => b.1.cmp(&a.1),
                SortBy::Property { name, direction } => {
                    let left = a.0.get(name).unwrap_or(&Value::Null);
                    let right = b.0.get(name).unwrap_or(&Value::Null);
                    direction.apply(left.sort_cmp(right))
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.1.cmp(&b.1)
    }
}
