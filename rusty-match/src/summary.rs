use std::{collections::HashSet, fmt};

use serde::Serialize;

use crate::{length, MatchOutcome, Meter, SegmentKey, Segments};

/// Counts and lengths describing how much of both networks got matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchSummary {
    pub reference_segments: usize,
    pub reference_length: Meter,
    pub matched_reference_segments: usize,
    pub matched_reference_length: Meter,
    pub unmatched_references: usize,
    pub unmatched_reference_length: Meter,
    pub target_segments: usize,
    pub target_length: Meter,
    pub matched_target_segments: usize,
    pub matched_target_length: Meter,
    pub partial_matches: usize,
    pub passes: usize,
    pub warnings: usize,
}

impl MatchSummary {
    pub fn new(reference: &Segments, target: &Segments, outcome: &MatchOutcome) -> Self {
        let matched_references: HashSet<_> =
            outcome.matches.iter().map(|m| m.reference_id).collect();
        let matched_targets: HashSet<_> = outcome.matches.iter().map(|m| m.target_id).collect();

        Self {
            reference_segments: reference.len(),
            reference_length: reference.geom.iter().map(length).sum(),
            matched_reference_segments: matched_references.len(),
            matched_reference_length: outcome
                .matches
                .iter()
                .map(|m| length(&m.clipped_geometry))
                .sum(),
            unmatched_references: outcome.unmatched.len(),
            unmatched_reference_length: outcome
                .unmatched
                .iter()
                .filter_map(|u| u.geometry.as_ref())
                .map(length)
                .sum(),
            target_segments: target.len(),
            target_length: target.geom.iter().map(length).sum(),
            matched_target_segments: matched_targets.len(),
            matched_target_length: matched_targets
                .iter()
                .filter_map(|&id| target.get(&SegmentKey(id)))
                .map(|s| length(s.geom))
                .sum(),
            partial_matches: outcome.partials.len(),
            passes: outcome.passes,
            warnings: outcome.warnings.len(),
        }
    }

    /// Share of the reference length that was matched, in percent.
    pub fn reference_coverage(&self) -> f64 {
        if self.reference_length > 0.0 {
            self.matched_reference_length / self.reference_length * 100.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "reference: {}/{} segments matched, {:.0} of {:.0} m ({:.1}%)",
            self.matched_reference_segments,
            self.reference_segments,
            self.matched_reference_length,
            self.reference_length,
            self.reference_coverage()
        )?;
        writeln!(
            f,
            "target: {}/{} segments matched, {:.0} of {:.0} m",
            self.matched_target_segments,
            self.target_segments,
            self.matched_target_length,
            self.target_length
        )?;
        write!(
            f,
            "{} partial matches, {} unmatched ({:.0} m), {} passes, {} warnings",
            self.partial_matches,
            self.unmatched_references,
            self.unmatched_reference_length,
            self.passes,
            self.warnings
        )
    }
}

#[cfg(test)]
mod tests {
    use geo::wkt;

    use super::*;
    use crate::{MatchConf, MatchEngine, PartAllocator, Segment, WorkItem};

    #[test]
    fn summary_of_partial_run() {
        let references: Segments = [Segment {
            id: 1,
            parent_id: 1,
            geom: wkt! {LINESTRING(0.0 0.0, 100.0 0.0)},
        }]
        .into_iter()
        .collect();
        let targets: Segments = [
            Segment {
                id: 10,
                parent_id: 10,
                geom: wkt! {LINESTRING(0.0 0.0, 30.0 0.0)},
            },
            Segment {
                id: 11,
                parent_id: 11,
                geom: wkt! {LINESTRING(0.0 40.0, 30.0 40.0)},
            },
        ]
        .into_iter()
        .collect();

        let conf = MatchConf::new(2);
        let outcome = MatchEngine::new(&conf, &targets)
            .expect("invalid conf")
            .run(WorkItem::seeds(&references), &mut PartAllocator::default());
        let summary = MatchSummary::new(&references, &targets, &outcome);

        assert_eq!(summary.matched_reference_segments, 1);
        assert_eq!(summary.matched_target_segments, 1);
        assert_eq!(summary.partial_matches, 1);
        assert_eq!(summary.unmatched_references, 1);
        assert!((summary.matched_reference_length - 30.0).abs() < 1e-9);
        assert!((summary.unmatched_reference_length - 70.0).abs() < 1e-9);
        assert!((summary.reference_coverage() - 30.0).abs() < 1e-9);
        assert!(summary.to_string().starts_with("reference: 1/1 segments matched"));
    }
}
