use geo_types::LineString;
use itertools::Itertools;
use rstar::{primitives::GeomWithData, RTree};

use super::{Buffer, CandidateSearch};
use crate::{Id, Segments};

pub type IndexedLine = GeomWithData<LineString<f64>, Id>;

/// R-tree over line geometries, keyed by id.
#[derive(Debug, Clone)]
pub struct EdgeIndex {
    pub index: RTree<IndexedLine>,
}

impl EdgeIndex {
    pub fn new() -> EdgeIndex {
        Self {
            index: RTree::new(),
        }
    }

    pub fn from_ids_and_lines(ids: &[Id], lines: &[LineString<f64>]) -> EdgeIndex {
        let geomdata: Vec<IndexedLine> = lines
            .iter()
            .zip(ids.iter())
            .map(|(line, id)| IndexedLine::new(line.clone(), *id))
            .collect();

        EdgeIndex {
            index: RTree::bulk_load(geomdata),
        }
    }

    pub fn from_segments(segments: &Segments) -> EdgeIndex {
        Self::from_ids_and_lines(&segments.id, &segments.geom)
    }

    pub fn insert(&mut self, id: Id, line: LineString<f64>) {
        self.index.insert(IndexedLine::new(line, id));
    }

    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.index.size() == 0
    }
}

impl Default for EdgeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateSearch for EdgeIndex {
    fn candidates(&self, buffer: &Buffer<'_>) -> Vec<Id> {
        let Some(envelope) = buffer.envelope() else {
            return Vec::new();
        };

        // the envelope query is coarse, every hit is checked against the buffer
        self.index
            .locate_in_envelope_intersecting(&envelope)
            .filter(|line| buffer.intersects(line.geom()))
            .map(|line| line.data)
            .sorted_unstable()
            .dedup()
            .collect()
    }
}
