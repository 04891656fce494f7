//! # Engine Module
//!
//! This module hosts the stateful solvers of the library. Every method owns
//! an engine that assembles Hamiltonian representations from the shared
//! operator generator and runs its algorithm.
//!
//! ## Architecture
//!
//! - **Free fermions** ([`tba`]) - Bloch matrices, band structures, density
//!   of states, and Berry curvature for tight-binding and BdG systems
//! - **Exact diagonalization** ([`ed`]) - sparse many-body Hamiltonians,
//!   Lanczos diagonalization, and continued-fraction Green's functions
//! - **Cluster embedding** ([`cpt`]) - cluster-perturbation lattice Green's
//!   functions built from one or several exactly solved clusters
//! - **Renormalization group** ([`dmrg`]) - infinite and finite-system DMRG
//!   for spin chains, plus matrix product state utilities
//! - **Progress Monitoring** ([`progress`]) - callback-based progress
//!   reporting shared by all engines
//! - **Error Handling** ([`error`]) - engine-level error types

pub mod cpt;
pub mod dmrg;
pub mod ed;
pub mod error;
pub mod progress;
pub mod tba;
