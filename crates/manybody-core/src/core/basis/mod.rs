//! Many-body bases.
//!
//! [`fock_basis`] enumerates occupation-number states as bit masks, with
//! optional particle-number or per-spin sector resolution. [`quantum_number`]
//! provides the U(1) charge bookkeeping used by sector-projected tensor
//! products in the renormalization-group solver.

pub mod fock_basis;
pub mod quantum_number;

pub use fock_basis::{BasisError, FockBasis, SectorRule};
pub use quantum_number::QuantumNumbers;
