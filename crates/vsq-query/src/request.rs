use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use vsq_filter::Filter;
use vsq_types::{ChangeType, GeometryFactory};

use crate::sort::SortBy;

/// Spatial decimation hint: features smaller than `tolerance` map units
/// share a screen cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecimationHint {
    pub tolerance: f64,
}

/// A query as submitted by a caller, before validation.
///
/// Every field is optional in its serialized form.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub filter: Filter,
    /// `None` returns every attribute; an empty list returns none.
    pub properties: Option<Vec<String>>,
    pub sort: Vec<SortBy>,
    pub offset: Option<u64>,
    /// `None` or `u64::MAX` means unlimited.
    pub max_features: Option<u64>,
    pub change_types: Option<BTreeSet<ChangeType>>,
    pub root_revision: Option<String>,
    /// Absent, or the NULL id, for a snapshot query.
    pub old_root_revision: Option<String>,
    pub decimation: Option<DecimationHint>,
    pub geometry_factory: Option<GeometryFactory>,
    /// Attribute renames. Not supported.
    pub retype: Option<BTreeMap<String, String>>,
    /// Version selection. Not supported.
    pub version: Option<String>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sort(mut self, sort: Vec<SortBy>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_max_features(mut self, max: u64) -> Self {
        self.max_features = Some(max);
        self
    }

    pub fn with_change_types(mut self, types: impl IntoIterator<Item = ChangeType>) -> Self {
        self.change_types = Some(types.into_iter().collect());
        self
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root_revision = Some(root.into());
        self
    }

    pub fn with_old_root(mut self, old_root: impl Into<String>) -> Self {
        self.old_root_revision = Some(old_root.into());
        self
    }

    pub fn with_decimation(mut self, tolerance: f64) -> Self {
        self.decimation = Some(DecimationHint { tolerance });
        self
    }

    pub fn with_geometry_factory(mut self, factory: GeometryFactory) -> Self {
        self.geometry_factory = Some(factory);
        self
    }
}
