use geo::{Closest, ClosestPoint, Distance, Euclidean, Length, LineLocatePoint};
use geo_types::{Coord, Line, LineString, MultiLineString, Point};

use super::{length, Meter};

/// Nearest point on `line` to `point`, `None` when it is not unique.
pub fn project(line: &LineString<f64>, point: &Point<f64>) -> Option<Point<f64>> {
    match line.closest_point(point) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => Some(p),
        Closest::Indeterminate => None,
    }
}

/// Replace `point` with the closest vertex of `line` if one lies within `tolerance`.
pub fn snap_to_vertex(point: Point<f64>, line: &LineString<f64>, tolerance: Meter) -> Point<f64> {
    line.points()
        .map(|vertex| (vertex, Euclidean.distance(&vertex, &point)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(point, |(vertex, _)| vertex)
}

/// Clip `line_to_clip` to the extent of `reference_line`.
///
/// Both end points of `reference_line` are projected onto `line_to_clip` and
/// snapped to its vertices, the result is the straight segment between the
/// two projections. When the projections coincide the result has zero
/// length, which callers treat as the lines merely crossing.
pub fn clip_by_projection(
    line_to_clip: &LineString<f64>,
    reference_line: &LineString<f64>,
    snap_tolerance: Meter,
) -> Option<LineString<f64>> {
    let start = reference_line.points().next()?;
    let end = reference_line.points().last()?;

    let start = snap_to_vertex(project(line_to_clip, &start)?, line_to_clip, snap_tolerance);
    let end = snap_to_vertex(project(line_to_clip, &end)?, line_to_clip, snap_tolerance);

    Some(LineString::from(vec![start, end]))
}

/// Part of `line` between `start` and `end`, measured as distance along it.
pub fn substring(line: &LineString<f64>, start: Meter, end: Meter) -> Option<LineString<f64>> {
    let total = length(line);
    let start = start.clamp(0.0, total);
    let end = end.clamp(0.0, total);
    if end <= start {
        return None;
    }

    let mut coords: Vec<Coord<f64>> = Vec::new();
    let mut walked = 0.0;
    let mut reached_end = false;

    for segment in line.lines() {
        let segment_length = Euclidean.length(&segment);
        let next = walked + segment_length;

        if coords.is_empty() {
            if next < start || segment_length == 0.0 {
                walked = next;
                continue;
            }
            coords.push(interpolate(&segment, start - walked));
        }

        if next >= end {
            coords.push(interpolate(&segment, end - walked));
            reached_end = true;
            break;
        }
        coords.push(segment.end);
        walked = next;
    }

    // rounding can leave the walk just short of the last vertex
    if !reached_end && !coords.is_empty() {
        if let Some(&last) = line.0.last() {
            coords.push(last);
        }
    }

    coords.dedup();
    (coords.len() >= 2).then(|| LineString::new(coords))
}

fn interpolate(segment: &Line<f64>, distance: Meter) -> Coord<f64> {
    let segment_length = Euclidean.length(segment);
    if segment_length == 0.0 {
        return segment.start;
    }
    let t = (distance / segment_length).clamp(0.0, 1.0);
    segment.start + segment.delta() * t
}

/// Parts of `a` that are not covered by `b`.
///
/// `b` is expected to lie on `a` (as a clip of `a` does), the span of `a`
/// between the projections of `b`'s end points is removed. The result has
/// zero, one or two parts.
pub fn geometric_difference(a: &LineString<f64>, b: &LineString<f64>) -> MultiLineString<f64> {
    let total = length(a);
    let located = b
        .points()
        .next()
        .zip(b.points().last())
        .and_then(|(first, last)| {
            Some((a.line_locate_point(&first)?, a.line_locate_point(&last)?))
        });

    let Some((from, to)) = located else {
        return MultiLineString::new(vec![a.clone()]);
    };
    let (low, high) = if from <= to { (from, to) } else { (to, from) };

    let parts = [
        substring(a, 0.0, low * total),
        substring(a, high * total, total),
    ];
    MultiLineString::new(parts.into_iter().flatten().collect())
}
