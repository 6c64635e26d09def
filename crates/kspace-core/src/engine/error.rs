use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::configuration::ConfigurationError;
use crate::core::models::select::InvalidTrialState;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Configuration error: {source}")]
    Configuration {
        #[from]
        source: ConfigurationError,
    },

    #[error(transparent)]
    InvalidTrialState(#[from] InvalidTrialState),

    #[error("Ewald splitting parameter is not a number (tolerance {tolerance}, cutoff {cutoff})")]
    InvalidAlpha { tolerance: f64, cutoff: f64 },

    #[error("No wave vectors satisfy 0 < k^2 < {kmax_squared}")]
    NoWaveVectors { kmax_squared: f64 },

    #[error("kmax_squared requires a cubic domain")]
    NonCubicDomain,

    #[error(
        "Structure factor size mismatch: trial has {trial} entries, {expected} wave vectors"
    )]
    StructureFactorMismatch { trial: usize, expected: usize },

    #[error("Engine used before precompute")]
    NotPrecomputed,

    #[error("Incremental updates are only supported for group 0 (got group {0})")]
    UnsupportedGroup(usize),

    #[error("No committed eik row for site {site} of particle {particle}")]
    MissingEik { particle: usize, site: usize },

    #[error("Volume changes are not supported by the Ewald reciprocal term")]
    VolumeChangeUnsupported,

    #[error("Tolerance {tolerance} not reached along dimension {dim} with kmax up to {max_kmax}")]
    KmaxSearchFailed {
        dim: usize,
        tolerance: f64,
        max_kmax: i32,
    },

    #[error("Committed state is inconsistent with a full recomputation: {}", .0.join("; "))]
    Inconsistent(Vec<String>),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Internal logic error: {0}")]
    Internal(String),
}
