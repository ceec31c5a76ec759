use std::collections::BTreeMap;

use geo::{BoundingRect, Intersects};
use geo_types::{coord, LineString, Rect};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    ConfError, MatchConf, MatchEngine, MatchError, MatchOutcome, Meter, PartAllocator, Segments,
    WorkItem,
};

pub type CellKey = (i64, i64);

/// Splits a matching run into square cells that are matched on their own.
///
/// A reference line belongs to the cell holding the centre of its bounding
/// box. The cell sees every target within `overlap` of it, at least the
/// buffer distance, so lines near a cell border find the same candidates
/// as in an unsplit run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPartition {
    pub cell_size: Meter,
    pub overlap: Meter,
}

impl GridPartition {
    pub fn new(cell_size: Meter, overlap: Meter) -> Self {
        Self { cell_size, overlap }
    }

    /// Cells need a finite positive size, the overlap may be zero.
    pub fn validate(&self) -> Result<(), ConfError> {
        let (cell_size, overlap) = (self.cell_size, self.overlap);
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfError::NotPositive {
                name: "cell_size",
                value: cell_size,
            });
        }
        if !overlap.is_finite() || overlap < 0.0 {
            return Err(ConfError::Negative {
                name: "overlap",
                value: overlap,
            });
        }
        Ok(())
    }

    pub fn cell_of(&self, line: &LineString<f64>) -> Option<CellKey> {
        let centre = line.bounding_rect()?.center();
        Some((
            (centre.x / self.cell_size).floor() as i64,
            (centre.y / self.cell_size).floor() as i64,
        ))
    }

    /// The cell grown by `grow` on every side.
    pub fn cell_bounds(&self, key: CellKey, grow: Meter) -> Rect<f64> {
        let size = self.cell_size;
        let (x, y) = (key.0 as f64 * size, key.1 as f64 * size);
        Rect::new(
            coord! { x: x - grow, y: y - grow },
            coord! { x: x + size + grow, y: y + size + grow },
        )
    }

    pub fn split(&self, items: Vec<WorkItem>) -> BTreeMap<CellKey, Vec<WorkItem>> {
        let mut cells: BTreeMap<CellKey, Vec<WorkItem>> = BTreeMap::new();
        for item in items {
            let key = self.cell_of(&item.geometry).unwrap_or_default();
            cells.entry(key).or_default().push(item);
        }
        cells
    }

    /// Matches every cell in parallel and joins the outcomes.
    pub fn run(
        &self,
        conf: &MatchConf,
        seeds: Vec<WorkItem>,
        targets: &Segments,
        parts: &mut PartAllocator,
    ) -> Result<MatchOutcome, MatchError> {
        conf.validate()?;
        self.validate()?;
        let grow = self.overlap.max(conf.buffer_distance);
        let allocated: &PartAllocator = parts;

        let cells: Vec<(CellKey, Vec<WorkItem>)> = self.split(seeds).into_iter().collect();
        let results: Vec<Result<(MatchOutcome, PartAllocator), MatchError>> = cells
            .into_par_iter()
            .map(|(key, items)| {
                let bounds = self.cell_bounds(key, grow);
                let local = targets.filter(|t| t.geom.intersects(&bounds));
                debug!(
                    "cell {key:?}: {} references, {} target segments",
                    items.len(),
                    local.len()
                );

                let mut local_parts = allocated.clone();
                let outcome = MatchEngine::new(conf, &local)?.run(items, &mut local_parts);
                Ok((outcome, local_parts))
            })
            .collect();

        let mut outcome = MatchOutcome::default();
        for result in results {
            let (cell_outcome, cell_parts) = result?;
            outcome.extend(cell_outcome);
            parts.merge(cell_parts);
        }
        Ok(outcome)
    }
}
