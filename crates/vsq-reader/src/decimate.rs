//! Screen-map decimation.

use std::collections::HashSet;

use vsq_types::Envelope;

/// A grid of `tolerance`-sized cells over map space.
///
/// A feature whose bounds fit inside one cell claims that cell; later
/// features fitting the same cell are dropped since they would render to
/// the same pixel. Larger features and features without bounds always pass.
#[derive(Debug)]
pub struct ScreenMap {
    tolerance: f64,
    cells: HashSet<(i64, i64)>,
}

impl ScreenMap {
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cells: HashSet::new(),
        }
    }

    fn cell(&self, x: f64, y: f64) -> (i64, i64) {
        (
            (x / self.tolerance).floor() as i64,
            (y / self.tolerance).floor() as i64,
        )
    }

    /// Returns `true` if a feature with these bounds should be emitted.
    pub fn check(&mut self, bounds: Option<&Envelope>) -> bool {
        let Some(b) = bounds else {
            return true;
        };
        let min = self.cell(b.min_x, b.min_y);
        let max = self.cell(b.max_x, b.max_y);
        if min != max {
            return true;
        }
        self.cells.insert(min)
    }

    pub fn occupied(&self) -> usize {
        self.cells.len()
    }
}
