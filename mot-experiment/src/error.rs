use crate::config::ConfigError;
use mot_core::{SurfaceError, TrialState};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot {operation} a trial in state {from:?}")]
    InvalidTransition {
        from: TrialState,
        operation: &'static str,
    },
    #[error("a forced-choice prompt needs at least one option")]
    NoOptions,
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type Result<T> = std::result::Result<T, ExperimentError>;
