use std::collections::VecDeque;

use geo::{Distance, Euclidean};
use geo_types::{Coord, LineString, MultiLineString, Point};

use super::Meter;
use crate::GeometryError;

/// Chain the parts of a multi-line into a single line.
///
/// Parts are attached to either end of the chain, reversed where needed,
/// when their end points lie within `tolerance` of it. Fails with
/// [`GeometryError::MultiPartGeometry`] when some part cannot be reached.
pub fn merge_lines(
    parts: &MultiLineString<f64>,
    tolerance: Meter,
) -> Result<LineString<f64>, GeometryError> {
    let mut rest: Vec<&LineString<f64>> = parts.iter().filter(|p| p.0.len() >= 2).collect();
    let total = rest.len();

    if total == 0 {
        let coords = parts.iter().map(|p| p.0.len()).max().unwrap_or(0);
        return Err(GeometryError::TooFewCoordinates(coords));
    }

    let first = rest.remove(0);
    let mut chain: VecDeque<Coord<f64>> = first.0.iter().copied().collect();

    while !rest.is_empty() {
        let (Some(&head), Some(&tail)) = (chain.front(), chain.back()) else {
            break;
        };

        let Some((index, end)) = rest
            .iter()
            .enumerate()
            .find_map(|(i, part)| touching_end(part, head, tail, tolerance).map(|e| (i, e)))
        else {
            return Err(GeometryError::MultiPartGeometry {
                parts: total,
                gap: smallest_gap(&rest, head, tail),
            });
        };

        let part = rest.remove(index);
        match end {
            End::TailToStart => chain.extend(part.0.iter().skip(1)),
            End::TailToEnd => chain.extend(part.0.iter().rev().skip(1)),
            End::HeadToEnd => part.0.iter().rev().skip(1).for_each(|&c| chain.push_front(c)),
            End::HeadToStart => part.0.iter().skip(1).for_each(|&c| chain.push_front(c)),
        }
    }

    Ok(LineString::new(chain.into()))
}

#[derive(Debug, Clone, Copy)]
enum End {
    TailToStart,
    TailToEnd,
    HeadToEnd,
    HeadToStart,
}

fn gap(a: Coord<f64>, b: Coord<f64>) -> Meter {
    Euclidean.distance(&Point::from(a), &Point::from(b))
}

fn endpoints(part: &LineString<f64>) -> Option<(Coord<f64>, Coord<f64>)> {
    part.0.first().copied().zip(part.0.last().copied())
}

fn touching_end(
    part: &LineString<f64>,
    head: Coord<f64>,
    tail: Coord<f64>,
    tolerance: Meter,
) -> Option<End> {
    let (start, end) = endpoints(part)?;
    [
        (End::TailToStart, gap(tail, start)),
        (End::TailToEnd, gap(tail, end)),
        (End::HeadToEnd, gap(head, end)),
        (End::HeadToStart, gap(head, start)),
    ]
    .into_iter()
    .find(|(_, d)| *d <= tolerance)
    .map(|(e, _)| e)
}

fn smallest_gap(rest: &[&LineString<f64>], head: Coord<f64>, tail: Coord<f64>) -> Meter {
    rest.iter()
        .filter_map(|part| endpoints(part))
        .flat_map(|(start, end)| {
            [
                gap(tail, start),
                gap(tail, end),
                gap(head, start),
                gap(head, end),
            ]
        })
        .fold(f64::INFINITY, f64::min)
}
