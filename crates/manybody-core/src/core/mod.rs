//! # Core Module
//!
//! This module provides the fundamental building blocks for describing
//! quantum lattice models: geometry, internal degrees of freedom, terms and
//! their expansion into elementary operators, parameter spaces, and the
//! many-body bases the solvers act on.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of model construction:
//!
//! - **Lattice Geometry** ([`lattice`]) - Points, bonds, neighbor search, and
//!   cluster tiling for 1D to 3D systems
//! - **Fermionic Degrees of Freedom** ([`fock`]) - Orbital/spin/Nambu
//!   indices, term definitions, and operator generation over bonds
//! - **Spin Algebra** ([`spin`]) - Spin matrices for arbitrary spin length
//! - **Parameter Spaces** ([`kspace`]) - Brillouin zone meshes,
//!   high-symmetry paths, and generic parameter scans
//! - **Many-Body Bases** ([`basis`]) - Occupation-number bases with particle
//!   and spin sector resolution, and U(1) quantum number bookkeeping
//! - **Model I/O** ([`io`]) - TOML model descriptions
//! - **Numeric Utilities** ([`utils`]) - Vector geometry helpers

pub mod basis;
pub mod fock;
pub mod io;
pub mod kspace;
pub mod lattice;
pub mod spin;
pub mod utils;
