/// Point cloud coordinate bounds tracking and normalisation
use serde::{Deserialize, Serialize};

/// Value returned by the normalisers when an axis has zero extent.
pub const DEGENERATE_AXIS_VALUE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointCloudBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for PointCloudBounds {
    fn default() -> Self {
        Self::new()
    }
}

impl PointCloudBounds {
    /// Create new bounds initialised to infinity values
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
            min_z: f64::INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// Bounds as recorded in a LAS header, available before streaming.
    pub fn from_las(bounds: &las::Bounds) -> Self {
        Self {
            min_x: bounds.min.x,
            max_x: bounds.max.x,
            min_y: bounds.min.y,
            max_y: bounds.max.y,
            min_z: bounds.min.z,
            max_z: bounds.max.z,
        }
    }

    /// Tight bounds over a set of positions.
    pub fn from_positions<'a>(positions: impl IntoIterator<Item = &'a [f64; 3]>) -> Self {
        let mut bounds = Self::new();
        for p in positions {
            bounds.update(p[0], p[1], p[2]);
        }
        bounds
    }

    /// Update bounds with a new point
    pub fn update(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    /// True until at least one point has been added.
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Get world space dimensions
    pub fn dimensions(&self) -> (f64, f64, f64) {
        (
            self.max_x - self.min_x,
            self.max_y - self.min_y,
            self.max_z - self.min_z,
        )
    }

    /// Normalise X coordinate to 0-1 range
    pub fn normalize_x(&self, x: f64) -> f64 {
        normalize(x, self.min_x, self.max_x)
    }

    /// Normalise Y coordinate to 0-1 range
    pub fn normalize_y(&self, y: f64) -> f64 {
        normalize(y, self.min_y, self.max_y)
    }
}

/// Zero or non-finite extent maps every value to the axis midpoint.
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let extent = max - min;
    if !(extent.is_finite() && extent > 0.0) {
        return DEGENERATE_AXIS_VALUE;
    }
    (value - min) / extent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_tracks_extremes() {
        let mut bounds = PointCloudBounds::new();
        assert!(bounds.is_empty());
        bounds.update(1.0, -2.0, 3.0);
        bounds.update(-1.0, 4.0, 0.0);
        assert!(!bounds.is_empty());
        assert_eq!(bounds.dimensions(), (2.0, 6.0, 3.0));
    }

    #[test]
    fn zero_extent_normalises_to_midpoint() {
        let bounds = PointCloudBounds::from_positions(&[[5.0, 0.0, 0.0], [5.0, 10.0, 0.0]]);
        assert_eq!(bounds.normalize_x(5.0), DEGENERATE_AXIS_VALUE);
        assert_eq!(bounds.normalize_y(10.0), 1.0);
        assert!(!bounds.normalize_x(7.0).is_nan());
    }
}
