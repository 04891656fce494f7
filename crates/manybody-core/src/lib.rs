//! # manybody Core Library
//!
//! A library for constructing operator representations of electron and spin
//! lattice Hamiltonians and solving them with a family of many-body methods:
//! tight-binding/Bogoliubov-de Gennes, exact diagonalization, cluster
//! perturbation theory with composite-cluster embedding, and the density
//! matrix renormalization group.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (lattices,
//!   degrees of freedom, terms and the operators they expand into), pure
//!   mathematical utilities (geometry, spin matrices, Fock bases), and model
//!   file I/O.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer hosts the solvers.
//!   Each method owns an engine that assembles Hamiltonian representations
//!   from the shared operator generator and runs its algorithm: Bloch matrix
//!   diagonalization (`tba`), sparse Lanczos diagonalization and Green's
//!   functions (`ed`), cluster-embedded lattice Green's functions (`cpt`),
//!   and block renormalization with matrix product states (`dmrg`).
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer.
//!   It ties engines and configuration together to execute complete
//!   calculations (band structures, spectra, ground-state searches) with
//!   progress reporting.

pub mod core;
pub mod engine;
pub mod workflows;
