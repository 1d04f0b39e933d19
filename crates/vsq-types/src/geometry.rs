use geo::MapCoords;
use geo_types::{Coord, Geometry};
use serde::{Deserialize, Serialize};

/// Geometry construction override supplied with a query.
///
/// A fixed `precision_scale` snaps every coordinate to a grid of
/// `1 / precision_scale` map units, so `100.0` keeps two decimals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryFactory {
    #[serde(default)]
    pub precision_scale: Option<f64>,
}

impl GeometryFactory {
    /// Factory with a fixed precision model.
    pub fn fixed(scale: f64) -> Self {
        Self {
            precision_scale: Some(scale),
        }
    }

    /// Floating precision: geometries pass through unchanged.
    pub fn floating() -> Self {
        Self::default()
    }

    /// Build a geometry through this factory.
    pub fn apply(&self, geom: &Geometry<f64>) -> Geometry<f64> {
        match self.precision_scale {
            Some(scale) if scale > 0.0 && scale.is_finite() => geom.map_coords(|c: Coord<f64>| Coord {
                x: (c.x * scale).round() / scale,
                y: (c.y * scale).round() / scale,
            }),
            _ => geom.clone(),
        }
    }
}
