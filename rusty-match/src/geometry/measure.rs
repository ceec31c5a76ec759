use geo::{Euclidean, HausdorffDistance, Length};
use geo_types::{coord, Coord, LineString};

use super::{Degrees, Meter};

/// Planar length of a line, in units of its coordinate system.
pub fn length(line: &LineString<f64>) -> Meter {
    Euclidean.length(line)
}

/// Smallest angle between two lines, ignoring their direction.
///
/// Only the first segment of each line is compared, a line with fewer than
/// two coordinates has no direction and compares as `0`. The result is in
/// `[0, 90]`, so a line and its reverse are at `0`.
pub fn angle_between(a: &LineString<f64>, b: &LineString<f64>) -> Degrees {
    let u = first_direction(a);
    let v = first_direction(b);

    let det = u.x * v.y - u.y * v.x;
    let dot = u.x * v.x + u.y * v.y;
    let angle = det.atan2(dot).to_degrees().abs();

    if angle > 90.0 {
        180.0 - angle
    } else {
        angle
    }
}

fn first_direction(line: &LineString<f64>) -> Coord<f64> {
    match (line.0.first(), line.0.get(1)) {
        (Some(&start), Some(&end)) => end - start,
        _ => coord! { x: 0.0, y: 0.0 },
    }
}

/// Symmetric Hausdorff distance over the vertices of both lines.
pub fn hausdorff_distance(a: &LineString<f64>, b: &LineString<f64>) -> Meter {
    a.hausdorff_distance(b)
}
