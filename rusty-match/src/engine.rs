use std::collections::HashMap;

use geo_types::{LineString, MultiLineString};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    geometric_difference, is_partial, length, score_candidates, select_best, Buffer,
    CandidateSearch, Degrees, EdgeIndex, Id, MatchConf, MatchError, MatchWarning, Meter,
    ScoredCandidate, SegmentKey, Segments,
};

/// A reference line waiting to be matched.
///
/// Part `0` is a whole reference segment, higher parts are remainders left
/// over by earlier partial matches of the same segment.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkItem {
    pub reference_id: Id,
    pub parent_id: Id,
    pub part: u32,
    pub geometry: LineString<f64>,
}

impl WorkItem {
    pub fn seeds(segments: &Segments) -> Vec<WorkItem> {
        segments
            .iter()
            .map(|s| WorkItem {
                reference_id: s.id,
                parent_id: s.parent_id,
                part: 0,
                geometry: s.geom.clone(),
            })
            .collect()
    }

    fn unmatched(self, reason: UnmatchedReason) -> UnmatchedReference {
        UnmatchedReference {
            reference_id: self.reference_id,
            parent_id: self.parent_id,
            part: self.part,
            geometry: Some(self.geometry),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub reference_id: Id,
    pub part: u32,
    pub target_id: Id,
    pub clipped_geometry: LineString<f64>,
    pub percent_removed: f64,
    pub meters_removed: Meter,
    pub hausdorff_distance: Meter,
    pub angle_degrees: Degrees,
    pub pass: usize,
}

impl Match {
    fn new(candidate: &ScoredCandidate, part: u32, pass: usize) -> Self {
        Self {
            reference_id: candidate.reference_id,
            part,
            target_id: candidate.target_id,
            clipped_geometry: candidate.clipped_reference_geometry.clone(),
            percent_removed: candidate.percent_removed,
            meters_removed: candidate.meters_removed,
            hausdorff_distance: candidate.hausdorff_distance,
            angle_degrees: candidate.angle_degrees,
            pass,
        }
    }
}

/// What a partial match left of the reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialMatch {
    pub reference_id: Id,
    pub part: u32,
    pub remainder_geometry: MultiLineString<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedReason {
    /// Nothing in the target network was within the buffer.
    NoCandidates,
    /// Candidates were found but none passed the thresholds.
    BelowThreshold,
    /// Still waiting when the pass budget ran out.
    Remainder,
    /// The edge could not be merged into a single line.
    MultiPartGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedReference {
    pub reference_id: Id,
    pub parent_id: Id,
    pub part: u32,
    pub geometry: Option<LineString<f64>>,
    pub reason: UnmatchedReason,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureState {
    Pending,
    Scored(Vec<ScoredCandidate>),
    Matched(Match),
    PartiallyMatched(Match, PartialMatch),
    Unmatched(UnmatchedReason),
}

impl FeatureState {
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Pending | Self::Scored(_))
    }
}

/// Hands out part numbers for remainders, unique per reference id.
#[derive(Debug, Clone, Default)]
pub struct PartAllocator {
    last: HashMap<Id, u32>,
}

impl PartAllocator {
    pub fn allocate(&mut self, reference_id: Id) -> u32 {
        let last = self.last.entry(reference_id).or_insert(0);
        *last += 1;
        *last
    }

    /// Takes over the parts handed out by `other`.
    pub fn merge(&mut self, other: PartAllocator) {
        for (id, part) in other.last {
            let last = self.last.entry(id).or_insert(0);
            *last = (*last).max(part);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub matches: Vec<Match>,
    pub partials: Vec<PartialMatch>,
    pub unmatched: Vec<UnmatchedReference>,
    pub warnings: Vec<MatchWarning>,
    pub passes: usize,
}

impl MatchOutcome {
    pub fn extend(&mut self, other: MatchOutcome) {
        self.matches.extend(other.matches);
        self.partials.extend(other.partials);
        self.unmatched.extend(other.unmatched);
        self.warnings.extend(other.warnings);
        self.passes = self.passes.max(other.passes);
    }
}

/// Matches reference lines against one set of target segments.
///
/// The targets are indexed once, every pass then matches its pending
/// lines in parallel. Remainders of partial matches are only picked up
/// once the whole pass is done.
pub struct MatchEngine<'a> {
    conf: &'a MatchConf,
    targets: &'a Segments,
    index: EdgeIndex,
}

impl<'a> MatchEngine<'a> {
    pub fn new(conf: &'a MatchConf, targets: &'a Segments) -> Result<Self, MatchError> {
        conf.validate()?;
        Ok(Self {
            conf,
            targets,
            index: EdgeIndex::from_segments(targets),
        })
    }

    fn candidates(&self, item: &WorkItem) -> Vec<(Id, &'a LineString<f64>)> {
        let targets = self.targets;
        self.index
            .candidates(&Buffer::new(&item.geometry, self.conf.buffer_distance))
            .into_iter()
            .filter_map(|id| Some((id, targets.get(&SegmentKey(id))?.geom)))
            .collect()
    }

    /// Moves `item` one step along `Pending -> Scored -> settled`.
    pub fn advance(
        &self,
        item: &WorkItem,
        state: FeatureState,
        pass: usize,
        warnings: &mut Vec<MatchWarning>,
    ) -> FeatureState {
        match state {
            FeatureState::Pending => {
                let candidates = self.candidates(item);
                if candidates.is_empty() {
                    return FeatureState::Unmatched(UnmatchedReason::NoCandidates);
                }
                let (scored, discarded) =
                    score_candidates(item.reference_id, &item.geometry, candidates, self.conf);
                warnings.extend(discarded);
                FeatureState::Scored(scored)
            }
            FeatureState::Scored(scored) => match select_best(&scored, self.conf) {
                None => FeatureState::Unmatched(UnmatchedReason::BelowThreshold),
                Some(best) => self.resolve(item, best, pass),
            },
            settled => settled,
        }
    }

    fn resolve(&self, item: &WorkItem, best: &ScoredCandidate, pass: usize) -> FeatureState {
        let matched = Match::new(best, item.part, pass);
        if !is_partial(best, self.conf) {
            return FeatureState::Matched(matched);
        }

        let floor = self.conf.remainder_floor();
        let remainder: Vec<LineString<f64>> =
            geometric_difference(&item.geometry, &best.clipped_reference_geometry)
                .into_iter()
                .filter(|part| length(part) >= floor)
                .collect();

        if remainder.is_empty() {
            return FeatureState::Matched(matched);
        }
        FeatureState::PartiallyMatched(
            matched,
            PartialMatch {
                reference_id: item.reference_id,
                part: item.part,
                remainder_geometry: MultiLineString::new(remainder),
            },
        )
    }

    /// Advances `item` until it is settled.
    pub fn settle(&self, item: &WorkItem, pass: usize) -> (FeatureState, Vec<MatchWarning>) {
        let mut warnings = Vec::new();
        let mut state = FeatureState::Pending;
        while !state.is_settled() {
            state = self.advance(item, state, pass, &mut warnings);
        }
        (state, warnings)
    }

    /// Runs passes until nothing is pending or `max_passes` is used up.
    pub fn run(&self, seeds: Vec<WorkItem>, parts: &mut PartAllocator) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();
        let mut pending = seeds;

        while !pending.is_empty() {
            if outcome.passes >= self.conf.max_passes {
                let remaining = pending.len();
                warn!(
                    "pass budget of {} used up, {remaining} remainders left unmatched",
                    self.conf.max_passes
                );
                outcome.warnings.push(MatchWarning::PassBudgetExceeded {
                    passes: outcome.passes,
                    remaining,
                });
                outcome.unmatched.extend(
                    pending
                        .into_iter()
                        .map(|item| item.unmatched(UnmatchedReason::Remainder)),
                );
                break;
            }

            outcome.passes += 1;
            let pass = outcome.passes;
            let settled: Vec<_> = pending
                .into_par_iter()
                .map(|item| {
                    let (state, warnings) = self.settle(&item, pass);
                    (item, state, warnings)
                })
                .collect();

            let matched_before = outcome.matches.len();
            let mut next = Vec::new();
            for (item, state, warnings) in settled {
                outcome.warnings.extend(warnings);
                match state {
                    FeatureState::Matched(matched) => outcome.matches.push(matched),
                    FeatureState::PartiallyMatched(matched, partial) => {
                        next.extend(partial.remainder_geometry.iter().map(|geometry| WorkItem {
                            reference_id: item.reference_id,
                            parent_id: item.parent_id,
                            part: parts.allocate(item.reference_id),
                            geometry: geometry.clone(),
                        }));
                        outcome.matches.push(matched);
                        outcome.partials.push(partial);
                    }
                    FeatureState::Unmatched(reason) => outcome.unmatched.push(item.unmatched(reason)),
                    FeatureState::Pending | FeatureState::Scored(_) => outcome
                        .unmatched
                        .push(item.unmatched(UnmatchedReason::BelowThreshold)),
                }
            }

            info!(
                "pass {pass}: {} matched, {} remainders",
                outcome.matches.len() - matched_before,
                next.len()
            );
            pending = next;
        }

        outcome
    }
}
