//! # kspace Core Library
//!
//! Reciprocal-space Ewald summation for classical Monte Carlo simulations of charged
//! particles under periodic boundary conditions, with an incremental update protocol
//! that prices a trial move in O(sites moved × wave vectors).
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Domain`, `Configuration`,
//!   `Select`, `ModelParams`), physical constants, and file I/O for coordinates and
//!   particle types.
//!
//! - **[`engine`]: The Logic Core.** The stateful Ewald engine. It owns the wave vectors,
//!   the per-site eik arena and a two-generation (committed / trial) structure factor,
//!   and exposes the `compute` / `finalize` protocol a Monte Carlo driver talks to.
//!
//! - **[`workflows`]: The Public API.** High-level entry points that tie `core` and
//!   `engine` together, such as evaluating the reciprocal energy of a configuration.

pub mod core;
pub mod engine;
pub mod workflows;

#[cfg(test)]
pub(crate) mod testing;
