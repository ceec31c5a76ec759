use geo_types::LineString;
use log::debug;
use serde::Serialize;

use crate::{
    angle_between, clip_by_projection, hausdorff_distance, length, Degrees, Id, MatchConf,
    MatchWarning, Meter,
};

/// A target line compared against a reference line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub reference_id: Id,
    pub target_id: Id,
    pub hausdorff_distance: Meter,
    pub angle_degrees: Degrees,
    pub clipped_reference_geometry: LineString<f64>,
    pub meters_removed: Meter,
    pub percent_removed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scored {
    Kept(ScoredCandidate),
    /// The clip left too little of the reference, the target only crosses it.
    Discarded(MatchWarning),
}

/// Compares one target line with a reference line.
///
/// The reference is clipped to the extent of the target, distance is taken
/// against the clipped reference while the angle uses the whole reference.
pub fn score_candidate(
    reference_id: Id,
    reference: &LineString<f64>,
    target_id: Id,
    target: &LineString<f64>,
    conf: &MatchConf,
) -> Scored {
    let clipped = clip_by_projection(reference, target, conf.snap_tolerance);
    let clipped_length = clipped.as_ref().map_or(0.0, length);

    let Some(clipped) = clipped.filter(|_| clipped_length >= conf.min_clip_length) else {
        debug!(
            "reference {reference_id}: target {target_id} discarded, clip is {clipped_length:.3} m"
        );
        return Scored::Discarded(MatchWarning::DegenerateClip {
            reference_id,
            target_id,
            clipped_length,
        });
    };

    let original_length = length(reference);
    let meters_removed = (original_length - clipped_length).max(0.0);
    let percent_removed = if original_length > 0.0 {
        meters_removed / original_length * 100.0
    } else {
        0.0
    };

    Scored::Kept(ScoredCandidate {
        reference_id,
        target_id,
        hausdorff_distance: hausdorff_distance(target, &clipped),
        angle_degrees: angle_between(target, reference),
        clipped_reference_geometry: clipped,
        meters_removed,
        percent_removed,
    })
}

/// Scores every candidate, discarded candidates come back as warnings.
pub fn score_candidates<'a>(
    reference_id: Id,
    reference: &LineString<f64>,
    candidates: impl IntoIterator<Item = (Id, &'a LineString<f64>)>,
    conf: &MatchConf,
) -> (Vec<ScoredCandidate>, Vec<MatchWarning>) {
    let mut kept = Vec::new();
    let mut warnings = Vec::new();
    for (target_id, target) in candidates {
        match score_candidate(reference_id, reference, target_id, target, conf) {
            Scored::Kept(candidate) => kept.push(candidate),
            Scored::Discarded(warning) => warnings.push(warning),
        }
    }
    (kept, warnings)
}

#[cfg(test)]
mod tests {
    use geo::wkt;

    use super::*;

    fn kept(scored: Scored) -> ScoredCandidate {
        match scored {
            Scored::Kept(candidate) => candidate,
            Scored::Discarded(warning) => panic!("candidate discarded: {warning:?}"),
        }
    }

    #[test]
    fn identical_lines_score_zero() {
        let conf = MatchConf::new(1);
        let line = wkt! {LINESTRING(0.0 0.0, 10.0 0.0)};
        let scored = kept(score_candidate(1, &line, 2, &line, &conf));
        assert_eq!(scored.hausdorff_distance, 0.0);
        assert_eq!(scored.angle_degrees, 0.0);
        assert_eq!(scored.percent_removed, 0.0);
        assert_eq!(scored.meters_removed, 0.0);
    }

    #[test]
    fn shorter_target_clips_reference() {
        let conf = MatchConf::new(1);
        let reference = wkt! {LINESTRING(0.0 0.0, 100.0 0.0)};
        let target = wkt! {LINESTRING(0.0 0.0, 30.0 0.0)};
        let scored = kept(score_candidate(1, &reference, 2, &target, &conf));
        assert_eq!(
            scored.clipped_reference_geometry,
            wkt! {LINESTRING(0.0 0.0, 30.0 0.0)}
        );
        assert!((scored.percent_removed - 70.0).abs() < 1e-9);
        assert!((scored.meters_removed - 70.0).abs() < 1e-9);
    }

    #[test]
    fn crossing_target_is_discarded() {
        let conf = MatchConf::new(1);
        let reference = wkt! {LINESTRING(0.0 0.0, 100.0 0.0)};
        let crossing = wkt! {LINESTRING(50.0 -5.0, 50.0 5.0)};
        let scored = score_candidate(1, &reference, 2, &crossing, &conf);
        assert!(matches!(
            scored,
            Scored::Discarded(MatchWarning::DegenerateClip {
                reference_id: 1,
                target_id: 2,
                ..
            })
        ));

        let (kept, warnings) = score_candidates(1, &reference, [(2, &crossing)], &conf);
        assert!(kept.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn scoring_twice_gives_the_same_numbers() {
        let conf = MatchConf::new(1);
        let reference = wkt! {LINESTRING(0.0 0.0, 40.0 3.0, 80.0 0.0)};
        let a = wkt! {LINESTRING(1.0 1.0, 39.0 4.0)};
        let b = wkt! {LINESTRING(45.0 2.0, 79.0 -1.0)};
        let candidates = [(1, &a), (2, &b)];
        let first = score_candidates(9, &reference, candidates, &conf);
        let second = score_candidates(9, &reference, candidates, &conf);
        assert_eq!(first, second);
        assert_eq!(first.0.len(), 2);
    }
}
