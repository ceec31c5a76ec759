use std::collections::BTreeMap;

use rusty_match::{
    Id, MatchSummary, MatchWarning, NetworkMatch, SegmentKey, Segments, UnmatchedReason, Value,
};
use serde::Serialize;
use wkt::ToWkt;

#[derive(Debug, Serialize)]
pub struct MatchRecord {
    pub reference_id: Id,
    pub reference_parent_id: Option<Id>,
    pub part: u32,
    pub target_id: Id,
    pub target_parent_id: Option<Id>,
    pub percent_removed: f64,
    pub meters_removed: f64,
    pub hausdorff_distance: f64,
    pub angle_degrees: f64,
    pub pass: usize,
    pub wkt: String,
}

#[derive(Debug, Serialize)]
pub struct UnmatchedRecord {
    pub reference_id: Id,
    pub parent_id: Id,
    pub part: u32,
    pub reason: UnmatchedReason,
    pub wkt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub crs: String,
    pub attribute: String,
    pub summary: MatchSummary,
    pub assignments: BTreeMap<Id, Value>,
    pub matches: Vec<MatchRecord>,
    pub unmatched: Vec<UnmatchedRecord>,
    pub warnings: Vec<MatchWarning>,
}

fn parent(segments: &Segments, id: Id) -> Option<Id> {
    segments.get(&SegmentKey(id)).map(|s| s.parent_id)
}

impl Report {
    pub fn new(
        crs: String,
        attribute: String,
        result: &NetworkMatch,
        assignments: BTreeMap<Id, Value>,
    ) -> Self {
        let outcome = &result.outcome;
        let matches = outcome
            .matches
            .iter()
            .map(|m| MatchRecord {
                reference_id: m.reference_id,
                reference_parent_id: parent(&result.reference_segments, m.reference_id),
                part: m.part,
                target_id: m.target_id,
                target_parent_id: parent(&result.target_segments, m.target_id),
                percent_removed: m.percent_removed,
                meters_removed: m.meters_removed,
                hausdorff_distance: m.hausdorff_distance,
                angle_degrees: m.angle_degrees,
                pass: m.pass,
                wkt: m.clipped_geometry.wkt_string(),
            })
            .collect();
        let unmatched = outcome
            .unmatched
            .iter()
            .map(|u| UnmatchedRecord {
                reference_id: u.reference_id,
                parent_id: u.parent_id,
                part: u.part,
                reason: u.reason,
                wkt: u.geometry.as_ref().map(|g| g.wkt_string()),
            })
            .collect();

        Self {
            crs,
            attribute,
            summary: MatchSummary::new(
                &result.reference_segments,
                &result.target_segments,
                outcome,
            ),
            assignments,
            matches,
            unmatched,
            warnings: outcome.warnings.clone(),
        }
    }
}
