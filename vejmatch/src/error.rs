use std::path::PathBuf;

use rusty_match::{ConfError, Id, MatchError, NetworkError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feature {id}: invalid WKT: {message}")]
    Wkt { id: Id, message: String },
    #[error("feature {id}: expected a line geometry")]
    NotALine { id: Id },
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Conf(#[from] ConfError),
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error("--max-passes is required when no --conf file sets max_passes")]
    MissingMaxPasses,
    #[error("stage filter must look like name=value, got {0:?}")]
    BadStage(String),
}
