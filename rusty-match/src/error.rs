use serde::Serialize;
use thiserror::Error;

use crate::{Crs, Id, Meter, Source};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("{parts} line parts cannot be merged into one line, closest gap is {gap}")]
    MultiPartGeometry { parts: usize, gap: Meter },
    #[error("a line needs at least 2 coordinates, got {0}")]
    TooFewCoordinates(usize),
    #[error("expected a line geometry, got {0}")]
    Unsupported(&'static str),
    #[error("WKB error {0}")]
    Wkb(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("id {0} is already in the table")]
    DuplicateId(Id),
    #[error("edge {id}: {source}")]
    Geometry { id: Id, source: GeometryError },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfError {
    #[error("{name} must be a positive number, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("angular_threshold must be in (0, 90], got {0}")]
    AngleOutOfRange(f64),
    #[error("percent_removed_threshold must be in (0, 100], got {0}")]
    PercentOutOfRange(f64),
    #[error("max_passes must be at least 1")]
    NoPasses,
    #[error("could not parse configuration: {0}")]
    Parse(String),
}

/// Errors that stop a run before any matching is done.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    #[error("reference network is in {reference} but target network is in {target}")]
    CoordinateSystemMismatch { reference: Crs, target: Crs },
    #[error("expected a {expected} network, got a {got} network")]
    WrongSource { expected: Source, got: Source },
    #[error("invalid configuration: {0}")]
    Conf(#[from] ConfError),
}

/// Recoverable conditions met during a run. They are logged as they happen
/// and collected on the outcome, never returned as errors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchWarning {
    /// Clipping the reference to the candidate left (almost) nothing,
    /// the candidate only crosses the reference.
    DegenerateClip {
        reference_id: Id,
        target_id: Id,
        clipped_length: Meter,
    },
    /// `max_passes` ran out while remainders were still waiting.
    PassBudgetExceeded { passes: usize, remaining: usize },
}
