use crate::{MatchConf, ScoredCandidate};

/// Candidates under both the angle and the Hausdorff threshold.
pub fn within_thresholds<'a>(
    candidates: &'a [ScoredCandidate],
    conf: &MatchConf,
) -> impl Iterator<Item = &'a ScoredCandidate> {
    let (angle, hausdorff) = (conf.angular_threshold, conf.hausdorff_threshold);
    candidates
        .iter()
        .filter(move |c| c.angle_degrees < angle && c.hausdorff_distance < hausdorff)
}

/// The best candidate under the thresholds, if any.
///
/// Candidates are ranked by Hausdorff distance first, the angle only breaks
/// ties in distance, and the target id breaks whatever tie remains.
pub fn select_best<'a>(
    candidates: &'a [ScoredCandidate],
    conf: &MatchConf,
) -> Option<&'a ScoredCandidate> {
    within_thresholds(candidates, conf).min_by(|a, b| {
        a.hausdorff_distance
            .total_cmp(&b.hausdorff_distance)
            .then(a.angle_degrees.total_cmp(&b.angle_degrees))
            .then(a.target_id.cmp(&b.target_id))
    })
}

/// Whether the match left enough of the reference over to be matched again.
pub fn is_partial(candidate: &ScoredCandidate, conf: &MatchConf) -> bool {
    candidate.percent_removed > conf.percent_removed_threshold
        && candidate.meters_removed > conf.meters_removed_threshold
}

#[cfg(test)]
mod tests {
    use geo_types::LineString;

    use super::*;

    fn candidate(target_id: u64, hausdorff: f64, angle: f64) -> ScoredCandidate {
        ScoredCandidate {
            reference_id: 1,
            target_id,
            hausdorff_distance: hausdorff,
            angle_degrees: angle,
            clipped_reference_geometry: LineString::new(vec![]),
            meters_removed: 0.0,
            percent_removed: 0.0,
        }
    }

    #[test]
    fn nothing_under_thresholds() {
        let conf = MatchConf::new(1);
        let candidates = [candidate(1, 17.0, 1.0), candidate(2, 1.0, 30.0)];
        assert_eq!(select_best(&candidates, &conf), None);
    }

    #[test]
    fn single_survivor_wins() {
        let conf = MatchConf::new(1);
        let candidates = [candidate(1, 20.0, 1.0), candidate(2, 5.0, 10.0)];
        assert_eq!(select_best(&candidates, &conf).map(|c| c.target_id), Some(2));
    }

    #[test]
    fn distance_beats_angle() {
        let conf = MatchConf::new(1);
        let candidates = [candidate(1, 3.0, 2.0), candidate(2, 2.9, 12.0)];
        assert_eq!(select_best(&candidates, &conf).map(|c| c.target_id), Some(2));
    }

    #[test]
    fn angle_breaks_distance_ties_then_id() {
        let conf = MatchConf::new(1);
        let candidates = [
            candidate(3, 2.0, 5.0),
            candidate(1, 2.0, 4.0),
            candidate(2, 2.0, 4.0),
        ];
        assert_eq!(select_best(&candidates, &conf).map(|c| c.target_id), Some(1));
    }

    #[test]
    fn partial_needs_both_thresholds() {
        let conf = MatchConf::new(1);
        let mut c = candidate(1, 0.0, 0.0);

        c.percent_removed = 70.0;
        c.meters_removed = 70.0;
        assert!(is_partial(&c, &conf));

        c.meters_removed = 4.0;
        assert!(!is_partial(&c, &conf));

        c.percent_removed = 10.0;
        c.meters_removed = 70.0;
        assert!(!is_partial(&c, &conf));
    }
}
