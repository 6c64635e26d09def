//! Provides input/output for configuration and model files.
//!
//! Coordinates are exchanged as XYZ frames carrying the periodic cell on their
//! comment line. Rigid particle types, along with the charges of their site
//! types, are described in TOML.

pub mod particle_type;
pub mod xyz;
