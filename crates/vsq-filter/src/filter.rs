use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use vsq_types::{Envelope, Feature, FeatureType, Value};

use crate::error::{FilterError, FilterResult};

/// Binary comparison operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn matches(self, ord: Ordering) -> bool {
        match self {
            Self::Eq => ord.is_eq(),
            Self::Ne => ord.is_ne(),
            Self::Lt => ord.is_lt(),
            Self::Le => ord.is_le(),
            Self::Gt => ord.is_gt(),
            Self::Ge => ord.is_ge(),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }
}

/// Filter predicate AST.
///
/// Serialized externally tagged: `"include"`, `{"and": [...]}`,
/// `{"compare": {"property": "lanes", "op": "gt", "value": 2}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Matches everything.
    #[default]
    Include,
    /// Matches nothing.
    Exclude,
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// Attribute compared with a literal. Nulls and incomparable kinds never match.
    Compare {
        property: String,
        op: CompareOp,
        value: Value,
    },
    /// Attribute is null or absent.
    IsNull { property: String },
    /// Geometry envelope intersects `envelope`.
    ///
    /// Without a property the feature's default geometry is tested through
    /// its node bounds. An absent envelope is the empty box.
    Bbox {
        #[serde(default)]
        property: Option<String>,
        #[serde(default)]
        envelope: Option<Envelope>,
    },
    /// Feature id is one of the given ids.
    Id(BTreeSet<String>),
}

impl Filter {
    pub fn and(children: Vec<Filter>) -> Self {
        Self::And(children)
    }

    pub fn or(children: Vec<Filter>) -> Self {
        Self::Or(children)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(inner: Filter) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn compare(property: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare {
            property: property.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(property, CompareOp::Eq, value)
    }

    pub fn is_null(property: impl Into<String>) -> Self {
        Self::IsNull {
            property: property.into(),
        }
    }

    /// Bounding-box test against the default geometry.
    pub fn bbox(envelope: Envelope) -> Self {
        Self::Bbox {
            property: None,
            envelope: Some(envelope),
        }
    }

    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Id(ids.into_iter().map(Into::into).collect())
    }

    pub fn is_include(&self) -> bool {
        matches!(self, Self::Include)
    }

    pub fn is_exclude(&self) -> bool {
        matches!(self, Self::Exclude)
    }

    /// Evaluate against a materialized feature.
    pub fn evaluate(&self, feature: &Feature) -> bool {
        match self {
            Self::Include => true,
            Self::Exclude => false,
            Self::And(children) => children.iter().all(|c| c.evaluate(feature)),
            Self::Or(children) => children.iter().any(|c| c.evaluate(feature)),
            Self::Not(inner) => !inner.evaluate(feature),
            Self::Compare {
                property,
                op,
                value,
            } => feature
                .get(property)
                .and_then(|actual| actual.compare(value))
                .is_some_and(|ord| op.matches(ord)),
            Self::IsNull { property } => feature.get(property).map_or(true, Value::is_null),
            Self::Bbox { property, envelope } => {
                let Some(envelope) = envelope else {
                    return false;
                };
                let bounds = match property {
                    Some(name) => feature.geometry(name).and_then(Envelope::of_geometry),
                    None => feature.bounds,
                };
                bounds.is_some_and(|b| b.intersects(envelope))
            }
            Self::Id(ids) => ids.contains(&feature.id),
        }
    }

    /// Names of the attributes this filter reads. A bounding-box test
    /// without a property reads `default_geometry`.
    pub fn attribute_names(&self, default_geometry: Option<&str>) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_attributes(default_geometry, &mut names);
        names
    }

    fn collect_attributes(&self, default_geometry: Option<&str>, out: &mut BTreeSet<String>) {
        match self {
            Self::Include | Self::Exclude | Self::Id(_) => {}
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_attributes(default_geometry, out);
                }
            }
            Self::Not(inner) => inner.collect_attributes(default_geometry, out),
            Self::Compare { property, .. } | Self::IsNull { property } => {
                out.insert(property.clone());
            }
            Self::Bbox { property, .. } => {
                if let Some(name) = property.as_deref().or(default_geometry) {
                    out.insert(name.to_string());
                }
            }
        }
    }

    fn uses_default_geometry(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => {
                children.iter().any(Self::uses_default_geometry)
            }
            Self::Not(inner) => inner.uses_default_geometry(),
            Self::Bbox { property, .. } => property.is_none(),
            _ => false,
        }
    }

    /// Check that every attribute this filter reads exists in `schema`.
    pub fn validate(&self, schema: &FeatureType) -> FilterResult<()> {
        let default_geometry = schema.geometry_attribute();
        if default_geometry.is_none() && self.uses_default_geometry() {
            return Err(FilterError::NoDefaultGeometry {
                type_name: schema.name.clone(),
            });
        }
        match self
            .attribute_names(default_geometry)
            .into_iter()
            .find(|name| !schema.has_attribute(name))
        {
            Some(name) => Err(FilterError::UnknownAttribute {
                name,
                type_name: schema.name.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, children: &[Filter], sep: &str| {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {sep} ")?;
                }
                write!(f, "{child}")?;
            }
            write!(f, ")")
        };
        match self {
            Self::Include => write!(f, "INCLUDE"),
            Self::Exclude => write!(f, "EXCLUDE"),
            Self::And(children) => join(f, children, "AND"),
            Self::Or(children) => join(f, children, "OR"),
            Self::Not(inner) => write!(f, "NOT {inner}"),
            Self::Compare {
                property,
                op,
                value,
            } => match value {
                Value::String(s) => write!(f, "{property} {} '{s}'", op.symbol()),
                other => write!(f, "{property} {} {other}", op.symbol()),
            },
            Self::IsNull { property } => write!(f, "{property} IS NULL"),
            Self::Bbox { property, envelope } => {
                let target = property.as_deref().unwrap_or("<default>");
                match envelope {
                    Some(e) => write!(
                        f,
                        "BBOX({target}, {}, {}, {}, {})",
                        e.min_x, e.min_y, e.max_x, e.max_y
                    ),
                    None => write!(f, "BBOX({target}, EMPTY)"),
                }
            }
            Self::Id(ids) => {
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                write!(f, "IN ({})", ids.join(", "))
            }
        }
    }
}
