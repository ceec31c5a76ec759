use std::collections::HashMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    Attributes, GridPartition, Id, MatchConf, MatchEngine, MatchError, MatchOutcome, Network,
    PartAllocator, Segmenter, Segments, Source, UnmatchedReason, UnmatchedReference, Value,
    WorkItem,
};

/// Which target edges a stage matches against, decided on the edge's attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFilter {
    All,
    AttributeEquals(String, Value),
    AttributeNotEquals(String, Value),
}

impl TargetFilter {
    /// A missing attribute compares as [`Value::Null`].
    pub fn accepts(&self, attributes: &Attributes) -> bool {
        let equals = |name: &str, expected: &Value| {
            attributes
                .get(name)
                .map_or(expected.is_null(), |value| value == expected)
        };
        match self {
            Self::All => true,
            Self::AttributeEquals(name, expected) => equals(name, expected),
            Self::AttributeNotEquals(name, expected) => !equals(name, expected),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub filter: TargetFilter,
}

impl Stage {
    pub fn new(name: impl Into<String>, filter: TargetFilter) -> Self {
        Self {
            name: name.into(),
            filter,
        }
    }

    pub fn all() -> Self {
        Self::new("all", TargetFilter::All)
    }
}

/// Segments and outcome of matching a reference network onto a target network.
#[derive(Debug, Clone)]
pub struct NetworkMatch {
    pub reference_segments: Segments,
    pub target_segments: Segments,
    pub outcome: MatchOutcome,
}

/// How two networks are matched.
///
/// Stages run in order, each one on the references the earlier stages left
/// unmatched, against the target edges its filter accepts.
#[derive(Debug, Clone)]
pub struct MatchPlan {
    pub conf: MatchConf,
    pub stages: Vec<Stage>,
    pub grid: Option<GridPartition>,
}

impl MatchPlan {
    pub fn new(conf: MatchConf) -> Self {
        Self {
            conf,
            stages: vec![Stage::all()],
            grid: None,
        }
    }

    pub fn with_stages(mut self, stages: Vec<Stage>) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_grid(mut self, grid: GridPartition) -> Self {
        self.grid = Some(grid);
        self
    }

    fn check(&self, reference: &Network, target: &Network) -> Result<(), MatchError> {
        for (network, expected) in [(reference, Source::Reference), (target, Source::Target)] {
            if network.source != expected {
                return Err(MatchError::WrongSource {
                    expected,
                    got: network.source,
                });
            }
        }
        if reference.crs != target.crs {
            return Err(MatchError::CoordinateSystemMismatch {
                reference: reference.crs.clone(),
                target: target.crs.clone(),
            });
        }
        self.conf.validate()?;
        if let Some(grid) = &self.grid {
            grid.validate()?;
        }
        Ok(())
    }

    fn segments(&self, network: &Network) -> Segments {
        match self.conf.segment_length {
            Some(length) => Segmenter::new(length).segment_network(network),
            None => Segments::identity(network),
        }
    }

    fn run_stage(
        &self,
        seeds: Vec<WorkItem>,
        targets: &Segments,
        parts: &mut PartAllocator,
    ) -> Result<MatchOutcome, MatchError> {
        match &self.grid {
            Some(grid) => grid.run(&self.conf, seeds, targets, parts),
            None => Ok(MatchEngine::new(&self.conf, targets)?.run(seeds, parts)),
        }
    }

    pub fn run(&self, reference: &Network, target: &Network) -> Result<NetworkMatch, MatchError> {
        self.check(reference, target)?;

        let reference_segments = self.segments(reference);
        let target_segments = self.segments(target);
        let target_attributes: HashMap<Id, &Attributes> =
            target.iter().map(|e| (e.id, e.attributes)).collect();

        let mut outcome = MatchOutcome::default();
        outcome
            .unmatched
            .extend(reference.rejected.iter().map(|r| UnmatchedReference {
                reference_id: r.id,
                parent_id: r.id,
                part: 0,
                geometry: None,
                reason: UnmatchedReason::MultiPartGeometry,
            }));

        let default_stages = [Stage::all()];
        let stages = if self.stages.is_empty() {
            &default_stages[..]
        } else {
            &self.stages[..]
        };

        let mut parts = PartAllocator::default();
        let mut pending = WorkItem::seeds(&reference_segments);
        let mut left: Vec<UnmatchedReference> = Vec::new();

        for stage in stages {
            if pending.is_empty() {
                break;
            }
            let targets = target_segments.filter(|s| {
                target_attributes
                    .get(&s.parent_id)
                    .is_some_and(|a| stage.filter.accepts(a))
            });
            info!(
                "stage {}: {} references against {} target segments",
                stage.name,
                pending.len(),
                targets.len()
            );

            let mut stage_outcome = self.run_stage(pending, &targets, &mut parts)?;
            left = std::mem::take(&mut stage_outcome.unmatched);
            pending = left.iter().filter_map(retry).collect();
            outcome.extend(stage_outcome);
        }
        outcome.unmatched.extend(left);

        info!(
            "{} matches, {} unmatched references",
            outcome.matches.len(),
            outcome.unmatched.len()
        );
        Ok(NetworkMatch {
            reference_segments,
            target_segments,
            outcome,
        })
    }
}

fn retry(unmatched: &UnmatchedReference) -> Option<WorkItem> {
    Some(WorkItem {
        reference_id: unmatched.reference_id,
        parent_id: unmatched.parent_id,
        part: unmatched.part,
        geometry: unmatched.geometry.clone()?,
    })
}

/// Matches `reference` onto `target` in a single stage.
pub fn match_networks(
    reference: &Network,
    target: &Network,
    conf: &MatchConf,
) -> Result<NetworkMatch, MatchError> {
    MatchPlan::new(conf.clone()).run(reference, target)
}
