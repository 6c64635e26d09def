use kspace::core::io::particle_type::ParticleTypeLoadError;
use kspace::core::io::xyz::XyzError;
use kspace::engine::error::EngineError;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    ParticleType(#[from] ParticleTypeLoadError),

    #[error(transparent)]
    Coordinates(#[from] XyzError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
