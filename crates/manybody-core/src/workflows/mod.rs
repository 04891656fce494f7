//! # Workflows Module
//!
//! High-level entry points tying models, engines and progress reporting
//! together. Each workflow loads nothing by itself: it receives a
//! materialized [`Model`](crate::core::io::Model) (or a spin-chain
//! definition) plus a job description, runs the matching engine through its
//! phases, and returns a typed result.
//!
//! - [`free_spectrum`] - tight-binding/BdG bands, density of states, Berry
//!   curvature
//! - [`cluster_spectrum`] - exact-diagonalization level scans, interacting
//!   density of states, and cluster-perturbed lattice spectra
//! - [`ground_state`] - infinite- and finite-system DMRG for spin chains

pub mod cluster_spectrum;
pub mod free_spectrum;
pub mod ground_state;
