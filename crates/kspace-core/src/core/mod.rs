//! # Core Module
//!
//! Fundamental building blocks shared by the Ewald engine and its callers.
//!
//! - **System Representation** ([`models`]) - Periodic domain, particles, sites, ghost
//!   slots, selections and per-site-type model parameters
//! - **Physical Constants** ([`constants`]) - Named CODATA constant sets and the derived
//!   charge conversion factor
//! - **File I/O** ([`io`]) - XYZ coordinate files and TOML particle-type definitions

pub mod constants;
pub mod io;
pub mod models;
