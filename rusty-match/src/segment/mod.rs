use std::collections::HashMap;

use geo_types::LineString;
use log::{debug, warn};

use crate::{length, substring, Deleteable, Id, Insertable, Meter, Network, NetworkError, Queryable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentKey(pub Id);

/// A piece of an edge, pointing back at the edge it was cut from.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub id: Id,
    pub parent_id: Id,
    pub geom: LineString<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct SegmentView<'a> {
    pub id: Id,
    pub parent_id: Id,
    pub geom: &'a LineString<f64>,
}

#[derive(Debug, Default, Clone)]
pub struct Segments {
    pub id: Vec<Id>, // Primary key
    pub parent_id: Vec<Id>,
    pub geom: Vec<LineString<f64>>,
    rows: HashMap<Id, usize>,
}

impl Segments {
    /// Every edge of `network` as one segment with the edge's own id.
    pub fn identity(network: &Network) -> Self {
        network
            .iter()
            .map(|edge| Segment {
                id: edge.id,
                parent_id: edge.id,
                geom: edge.geom.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SegmentView<'_>> {
        self.id
            .iter()
            .zip(&self.parent_id)
            .zip(&self.geom)
            .map(|((&id, &parent_id), geom)| SegmentView {
                id,
                parent_id,
                geom,
            })
    }

    pub fn get(&self, key: &SegmentKey) -> Option<SegmentView<'_>> {
        let index = self.find_index(key)?;
        Some(SegmentView {
            id: self.id[index],
            parent_id: self.parent_id[index],
            geom: &self.geom[index],
        })
    }

    /// The segments for which `keep` holds.
    pub fn filter(&self, mut keep: impl FnMut(&SegmentView<'_>) -> bool) -> Self {
        self.iter()
            .filter(|s| keep(s))
            .map(|s| Segment {
                id: s.id,
                parent_id: s.parent_id,
                geom: s.geom.clone(),
            })
            .collect()
    }
}

impl FromIterator<Segment> for Segments {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        let mut slf = Self::default();
        // the first segment with an id wins
        let skipped = slf.insert_many(iter).into_iter().filter(Result::is_err).count();
        if skipped > 0 {
            warn!("{skipped} segments with repeated ids skipped");
        }
        slf
    }
}

impl Insertable<Segment> for Segments {
    type Key = Result<SegmentKey, NetworkError>;

    fn insert(&mut self, data: Segment) -> Self::Key {
        if self.rows.contains_key(&data.id) {
            return Err(NetworkError::DuplicateId(data.id));
        }

        self.rows.insert(data.id, self.id.len());
        self.id.push(data.id);
        self.parent_id.push(data.parent_id);
        self.geom.push(data.geom);

        Ok(SegmentKey(data.id))
    }
}

impl Deleteable<SegmentKey> for Segments {
    type Output = Segment;
    fn delete(&mut self, key: &SegmentKey) -> Option<Self::Output> {
        let index = self.rows.remove(&key.0)?;
        for row in self.rows.values_mut() {
            if *row > index {
                *row -= 1;
            }
        }
        Some(Self::Output {
            id: self.id.remove(index),
            parent_id: self.parent_id.remove(index),
            geom: self.geom.remove(index),
        })
    }
}

impl Queryable<SegmentKey> for Segments {
    fn find_index(&self, key: &SegmentKey) -> Option<usize> {
        self.rows.get(&key.0).copied()
    }
}

/// Cuts lines into pieces of roughly `length`.
///
/// Every piece ends up between a third of `length` and 1.3 times `length`,
/// except when the whole line is shorter than `length`, then it is kept
/// as it is.
#[derive(Debug, Clone)]
pub struct Segmenter {
    length: Meter,
    next_id: Id,
}

impl Segmenter {
    pub fn new(length: Meter) -> Self {
        Self { length, next_id: 0 }
    }

    /// First id handed out.
    pub fn starting_at(mut self, id: Id) -> Self {
        self.next_id = id;
        self
    }

    pub fn length(&self) -> Meter {
        self.length
    }

    /// Distances along a line of length `total` at which it is cut.
    fn cut_points(&self, total: Meter) -> Vec<Meter> {
        let l = self.length;
        if l.is_nan() || l <= 0.0 || total <= l {
            return vec![0.0, total];
        }

        let n = (total / l).ceil() as usize;
        let mut points: Vec<Meter> = (0..n).map(|i| i as f64 * l).collect();
        points.push(total);

        let last = total - points[n - 1];
        if last < l / 3.0 {
            if last + l > l * 1.3 {
                // merging would overshoot, share the tail between the two
                points[n - 1] = points[n - 2] + (last + l) / 2.0;
            } else {
                points.remove(n - 1);
            }
        }
        points
    }

    /// Pieces of `line`, in order.
    pub fn cut(&self, line: &LineString<f64>) -> Vec<LineString<f64>> {
        let total = length(line);
        let points = self.cut_points(total);
        if points.len() == 2 {
            return vec![line.clone()];
        }

        points
            .windows(2)
            .filter_map(|w| substring(line, w[0], w[1]))
            .collect()
    }

    pub fn segment_edge(&mut self, parent_id: Id, line: &LineString<f64>) -> Vec<Segment> {
        self.cut(line)
            .into_iter()
            .map(|geom| {
                let id = self.next_id;
                self.next_id += 1;
                Segment {
                    id,
                    parent_id,
                    geom,
                }
            })
            .collect()
    }

    pub fn segment_network(&mut self, network: &Network) -> Segments {
        let segments: Segments = network
            .iter()
            .flat_map(|edge| self.segment_edge(edge.id, edge.geom))
            .collect();
        debug!(
            "cut {} {} edges into {} segments of {} m",
            network.len(),
            network.source,
            segments.len(),
            self.length
        );
        segments
    }
}
