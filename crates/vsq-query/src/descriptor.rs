use std::collections::BTreeSet;

use vsq_filter::Filter;
use vsq_types::{ChangeType, GeometryFactory};

use crate::sort::SortOrder;

/// Which attributes a reader emits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    /// Ids and bounds only.
    None,
    /// These attributes, in schema order.
    Names(BTreeSet<String>),
}

impl Projection {
    pub fn includes(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Names(names) => names.contains(name),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Snapshot of one revision, or the changes between two.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryMode {
    Snapshot,
    Diff { old_root: String },
}

/// Canonical, validated form of a query against one feature type.
///
/// Built by [`crate::QueryTranslator`]; immutable afterwards. Aggregates
/// derive narrowed copies through [`QueryDescriptor::for_count`] and
/// [`QueryDescriptor::for_bounds`].
#[derive(Clone, Debug, PartialEq)]
pub struct QueryDescriptor {
    pub type_name: String,
    /// The filter as requested.
    pub filter: Filter,
    /// Equivalent canonical filter; `Include`/`Exclude` enable shortcuts.
    pub simplified: Filter,
    /// Attributes the filter reads.
    pub filter_attributes: BTreeSet<String>,
    pub projection: Projection,
    pub sort: SortOrder,
    pub offset: u64,
    /// `None` is unlimited; `Some(0)` yields nothing.
    pub limit: Option<u64>,
    pub root: String,
    pub mode: QueryMode,
    pub change_types: BTreeSet<ChangeType>,
    /// Screen map cell size, if decimation was requested.
    pub decimation: Option<f64>,
    pub geometry_factory: Option<GeometryFactory>,
    pub default_geometry: Option<String>,
}

impl QueryDescriptor {
    pub fn is_snapshot(&self) -> bool {
        matches!(self.mode, QueryMode::Snapshot)
    }

    pub fn old_root(&self) -> Option<&str> {
        match &self.mode {
            QueryMode::Snapshot => None,
            QueryMode::Diff { old_root } => Some(old_root),
        }
    }

    pub fn wants(&self, change_type: ChangeType) -> bool {
        self.change_types.contains(&change_type)
    }

    /// Whether any stage reads attribute values. When not, the reader can
    /// emit ids and bounds without loading feature content.
    pub fn needs_content(&self) -> bool {
        !self.projection.is_none()
            || !self.filter_attributes.is_empty()
            || !self.sort.attribute_names().is_empty()
    }

    /// Attributes kept between projection and sort: the projection plus
    /// sort keys. `None` keeps everything.
    pub fn working_attributes(&self) -> Option<BTreeSet<String>> {
        let mut keep = match &self.projection {
            Projection::All => return None,
            Projection::None => BTreeSet::new(),
            Projection::Names(names) => names.clone(),
        };
        keep.extend(self.sort.attribute_names());
        Some(keep)
    }

    /// Whether the sort decides which features survive pagination or
    /// decimation.
    fn order_selects(&self) -> bool {
        self.offset > 0 || self.limit.is_some() || self.decimation.is_some()
    }

    /// Same selection with zero properties.
    ///
    /// Native order is used unless decimation makes the count depend on
    /// which feature reaches a cell first.
    pub fn for_count(&self) -> Self {
        let sort = if self.decimation.is_some() {
            self.sort.clone()
        } else {
            SortOrder::Natural
        };
        Self {
            projection: Projection::None,
            sort,
            ..self.clone()
        }
    }

    /// Same selection with only the default geometry. The sort is kept
    /// whenever it picks the features that are returned.
    pub fn for_bounds(&self) -> Self {
        let projection = match &self.default_geometry {
            Some(name) => Projection::Names([name.clone()].into_iter().collect()),
            None => Projection::None,
        };
        let sort = if self.order_selects() {
            self.sort.clone()
        } else {
            SortOrder::Natural
        };
        Self {
            projection,
            sort,
            ..self.clone()
        }
    }
}
