//! # Engine Module
//!
//! The reciprocal-space part of the Ewald sum, maintained incrementally across Monte
//! Carlo trials.
//!
//! ## Overview
//!
//! [`ewald::Ewald`] owns every piece of cached state: the half-space wave vectors and
//! their prefactors, one packed `exp(i k·r)` row per site, and a structure factor kept
//! in a committed and a trial generation. A trial only ever writes the trial generation
//! and scratch rows; accepting it is a single [`ewald::Ewald::finalize`] call.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated choice between `kmax_squared`, explicit
//!   per-axis maxima and a tolerance target
//! - **Parameter Resolution** ([`params`]) - Turns a configuration into alpha and the
//!   wave-number maxima, including the tolerance-driven estimates
//! - **Wave Vectors** ([`wave_vectors`]) - Reciprocal basis, half-space enumeration and
//!   Gaussian-screened prefactors
//! - **Eik Arena** ([`eik`]) - Row packing, angle-addition recursion and per-particle
//!   storage of committed rows
//! - **Structure Factor** ([`structure_factor`]) - Accumulation and the committed /
//!   trial generations
//! - **Engine** ([`ewald`]) - The trial protocol tying everything together
//! - **Checkpoints** ([`checkpoint`]) - Binary snapshots of the committed state
//! - **Error Handling** ([`error`]) - Engine-specific error types

pub mod checkpoint;
pub mod config;
pub mod eik;
pub mod error;
pub mod ewald;
pub mod params;
pub mod structure_factor;
pub mod wave_vectors;
