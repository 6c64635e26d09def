//! # Models Module
//!
//! Data structures describing what the Ewald engine acts on.
//!
//! - [`domain`] - The periodic cell (side lengths and tilt factors)
//! - [`particle`] - Particle types, particle slots and charged sites
//! - [`configuration`] - The slot arena of particles with ghost reuse and groups
//! - [`select`] - Selections of sites tagged with a Monte Carlo trial state
//! - [`params`] - Per-site-type charges, the real-space cutoff and physical constants

pub mod configuration;
pub mod domain;
pub mod params;
pub mod particle;
pub mod select;
