//! # Workflows Module
//!
//! High-level entry points that tie the data models in [`crate::core`] to the Ewald
//! engine in [`crate::engine`].
//!
//! ## Architecture
//!
//! - **Energy Workflow** ([`energy`]) - Resolves parameters for an in-memory
//!   configuration, performs a full rebuild and commits it, returning the reciprocal
//!   energy along with the parameters that produced it.

pub mod energy;
