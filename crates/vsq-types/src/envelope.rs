use geo::BoundingRect;
use geo_types::Geometry;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box. Always non-empty; "no bounds" is `None`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Envelope {
    /// Create an envelope from two corners, in any order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Degenerate envelope covering a single point.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Envelope of a geometry, or `None` for an empty geometry.
    pub fn of_geometry(geom: &Geometry<f64>) -> Option<Self> {
        let rect = geom.bounding_rect()?;
        Some(Self::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center point `(x, y)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow this envelope to include `other`.
    pub fn expand_to_include(&mut self, other: &Envelope) {
        self.min_x = self.min_x.min(other.min_x);
        self.min_y = self.min_y.min(other.min_y);
        self.max_x = self.max_x.max(other.max_x);
        self.max_y = self.max_y.max(other.max_y);
    }

    /// Smallest envelope covering both.
    pub fn union(&self, other: &Envelope) -> Envelope {
        let mut merged = *self;
        merged.expand_to_include(other);
        merged
    }

    /// Check if this envelope intersects another (touching counts).
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Check if this envelope fully contains another.
    pub fn contains(&self, other: &Envelope) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }
}

/// Expand an optional envelope with an optional addition, in place.
pub fn expand_option(target: &mut Option<Envelope>, addition: Option<&Envelope>) {
    match (target.as_mut(), addition) {
        (Some(current), Some(add)) => current.expand_to_include(add),
        (None, Some(add)) => *target = Some(*add),
        (_, None) => {}
    }
}

/// An envelope tagged with the coordinate reference system of its schema.
///
/// Starts empty; grows through [`ReferencedEnvelope::expand_to_include`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferencedEnvelope {
    pub crs: Option<String>,
    pub envelope: Option<Envelope>,
}

impl ReferencedEnvelope {
    /// An empty envelope in the given CRS.
    pub fn empty(crs: Option<String>) -> Self {
        Self {
            crs,
            envelope: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.envelope.is_none()
    }

    pub fn expand_to_include(&mut self, other: &Envelope) {
        expand_option(&mut self.envelope, Some(other));
    }
}
