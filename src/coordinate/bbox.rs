//! Bounding box structure for raster extents and feature envelopes

use geo::{coord, Coord, Polygon, Rect};

/// A bounding box in a coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build a bounding box from a geo rectangle
    pub fn from_rect(rect: &Rect<f64>) -> Self {
        BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
    }

    /// Check if this bounding box contains a coordinate (edges included)
    pub fn contains(&self, c: &Coord<f64>) -> bool {
        c.x >= self.min_x && c.x <= self.max_x &&
            c.y >= self.min_y && c.y <= self.max_y
    }

    /// Check if this bounding box fully contains another one
    pub fn contains_bbox(&self, other: &BoundingBox) -> bool {
        other.min_x >= self.min_x && other.max_x <= self.max_x &&
            other.min_y >= self.min_y && other.max_y <= self.max_y
    }

    /// Check whether two boxes share any area or edge
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x && other.min_x <= self.max_x &&
            self.min_y <= other.max_y && other.min_y <= self.max_y
    }

    /// Convert to a geo rectangle
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_x, y: self.min_y },
            coord! { x: self.max_x, y: self.max_y },
        )
    }

    /// Convert to a closed polygon, used as the clipping window
    pub fn to_polygon(&self) -> Polygon<f64> {
        self.to_rect().to_polygon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_and_intersects() {
        let extent = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(extent.contains(&coord! { x: 10.0, y: 0.0 }));
        assert!(!extent.contains(&coord! { x: 10.5, y: 5.0 }));

        let straddling = BoundingBox::new(8.0, 8.0, 12.0, 12.0);
        let outside = BoundingBox::new(11.0, 11.0, 12.0, 12.0);
        assert!(extent.intersects(&straddling));
        assert!(!extent.contains_bbox(&straddling));
        assert!(!extent.intersects(&outside));
    }
}
