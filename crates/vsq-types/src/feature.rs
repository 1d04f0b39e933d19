use geo_types::Geometry;
use serde::{Deserialize, Serialize};

use crate::change::ChangeType;
use crate::envelope::Envelope;
use crate::value::Value;

/// A materialized feature as emitted by a reader.
///
/// `bounds` comes from the tree node metadata, so it is available even when
/// the projection strips the geometry attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Feature id (the node name within its type tree).
    pub id: String,
    /// How this feature differs between the queried revisions.
    pub change_type: ChangeType,
    /// Node bounds, if the feature has a geometry.
    pub bounds: Option<Envelope>,
    /// Attribute values in schema order.
    pub attributes: Vec<(String, Value)>,
}

impl Feature {
    pub fn new(id: impl Into<String>, change_type: ChangeType) -> Self {
        Self {
            id: id.into(),
            change_type,
            bounds: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_bounds(mut self, bounds: Option<Envelope>) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn geometry(&self, name: &str) -> Option<&Geometry<f64>> {
        self.get(name).and_then(Value::as_geometry)
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(n, _)| n.as_str())
    }

    /// Keep only the attributes for which `keep` returns `true`.
    pub fn retain_attributes(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.attributes.retain(|(n, _)| keep(n));
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
