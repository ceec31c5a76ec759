use geo::{BoundingRect, Distance, Euclidean};
use geo_types::{LineString, Point};
use rstar::AABB;

use crate::Meter;

/// The area within `distance` of `line`.
///
/// Kept as the line and a distance rather than a polygon, membership is
/// an exact distance test.
#[derive(Debug, Clone, Copy)]
pub struct Buffer<'a> {
    pub line: &'a LineString<f64>,
    pub distance: Meter,
}

impl<'a> Buffer<'a> {
    pub fn new(line: &'a LineString<f64>, distance: Meter) -> Self {
        Self { line, distance }
    }

    /// Bounding box of the buffer, `None` for an empty line.
    pub fn envelope(&self) -> Option<AABB<Point<f64>>> {
        let rect = self.line.bounding_rect()?;
        let d = self.distance;
        Some(AABB::from_corners(
            Point::new(rect.min().x - d, rect.min().y - d),
            Point::new(rect.max().x + d, rect.max().y + d),
        ))
    }

    pub fn intersects(&self, other: &LineString<f64>) -> bool {
        Euclidean.distance(self.line, other) <= self.distance
    }
}

#[cfg(test)]
mod tests {
    use geo::wkt;

    use super::*;

    #[test]
    fn envelope_is_grown() {
        let line = wkt! {LINESTRING(0.0 0.0, 10.0 5.0)};
        let envelope = Buffer::new(&line, 2.0).envelope().expect("no envelope");
        assert_eq!(envelope.lower(), Point::new(-2.0, -2.0));
        assert_eq!(envelope.upper(), Point::new(12.0, 7.0));
    }

    #[test]
    fn corner_of_envelope_is_outside() {
        let line = wkt! {LINESTRING(0.0 0.0, 10.0 0.0)};
        let buffer = Buffer::new(&line, 3.0);

        // inside the envelope but more than 3 away from the end point
        let corner = wkt! {LINESTRING(12.5 2.5, 13.0 3.0)};
        assert!(!buffer.intersects(&corner));

        let near = wkt! {LINESTRING(5.0 2.9, 5.0 10.0)};
        assert!(buffer.intersects(&near));
    }
}
