use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// The binding of a single attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Bool,
    Int,
    Double,
    String,
    Geometry,
}

impl AttributeKind {
    /// Returns `true` if `value` may be stored under this binding.
    /// Nulls are accepted by every binding; ints widen to doubles.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (_, Value::Null)
                | (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Double, Value::Double(_) | Value::Int(_))
                | (Self::String, Value::String(_))
                | (Self::Geometry, Value::Geometry(_))
        )
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Double => "double",
            Self::String => "string",
            Self::Geometry => "geometry",
        };
        f.write_str(s)
    }
}

/// A named, typed attribute of a feature type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Attribute schema of a feature type.
///
/// Attribute order is significant: stored feature values are positional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureType {
    /// Type name (usually the last segment of the type tree path).
    pub name: String,
    /// Ordered attribute descriptors.
    pub attributes: Vec<AttributeDescriptor>,
    /// Name of the default geometry attribute, if the type is spatial.
    #[serde(default)]
    pub default_geometry: Option<String>,
    /// Coordinate reference system identifier, e.g. `EPSG:4326`.
    #[serde(default)]
    pub crs: Option<String>,
}

impl FeatureType {
    pub fn new(name: impl Into<String>, attributes: Vec<AttributeDescriptor>) -> Self {
        let default_geometry = attributes
            .iter()
            .find(|a| a.kind == AttributeKind::Geometry)
            .map(|a| a.name.clone());
        Self {
            name: name.into(),
            attributes,
            default_geometry,
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = Some(crs.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn geometry_attribute(&self) -> Option<&str> {
        self.default_geometry.as_deref()
    }

    /// Same schema under another name. Attributes are untouched.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }
}
