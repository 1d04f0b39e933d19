use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::AdapterConfig;

/// Query hints the adapter honours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hint {
    /// Emitted features are independent values, never views into a cache.
    FeatureDetached,
    /// Spatial decimation through a screen map.
    ScreenMap,
    /// Geometry construction override.
    GeometryFactory,
}

/// What the adapter can do natively, as a plain value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub filter: bool,
    pub sort: bool,
    pub limit: bool,
    pub offset: bool,
    pub retype: bool,
    pub transactions: bool,
    pub provided_fid: bool,
    pub version: bool,
    pub visitor: bool,
    pub hints: BTreeSet<Hint>,
}

impl Capabilities {
    pub fn from_config(config: &AdapterConfig) -> Self {
        let toggles = config.capabilities;
        Self {
            filter: toggles.filter,
            sort: toggles.sort,
            limit: toggles.limit,
            offset: toggles.offset,
            retype: false,
            transactions: true,
            provided_fid: true,
            version: false,
            visitor: false,
            hints: [Hint::FeatureDetached, Hint::ScreenMap, Hint::GeometryFactory]
                .into_iter()
                .collect(),
        }
    }

    pub fn supports_hint(&self, hint: Hint) -> bool {
        self.hints.contains(&hint)
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::from_config(&AdapterConfig::default())
    }
}
