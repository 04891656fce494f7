//! Fermionic degrees of freedom and operator generation.
//!
//! The types in this module turn a symbolic model definition into elementary
//! operators:
//!
//! - [`dof`] defines the internal indices of a point (orbital, spin, Nambu)
//!   and their combination with a spatial id into a full [`dof::Index`].
//! - [`config`] assigns internal degrees of freedom to lattice points and
//!   linearizes all indices into a sequence table.
//! - [`coupling`] describes the structure factors of quadratic terms and the
//!   Pauli-style builders over the spin/orbital/sublattice/particle-hole
//!   channels.
//! - [`term`] defines hopping, onsite, pairing and Hubbard terms and expands
//!   them on bonds.
//! - [`operator`] is the elementary-operator representation the solvers
//!   consume, and [`generator`] drives the expansion of a whole term list
//!   over a whole bond list, with constant/alterable parameter bookkeeping.
//!
//! Operators are generated in "half" form: a Hamiltonian is assembled as the
//! sum of all operators plus its Hermitian conjugate, so self-conjugate
//! terms (onsite energies, Hubbard interactions) carry half their value.

pub mod config;
pub mod coupling;
pub mod dof;
pub mod generator;
pub mod operator;
pub mod term;

pub use config::{DofConfig, IndexOrder, IndexTable};
pub use coupling::{Coupling, CouplingList, CouplingMode};
pub use dof::{FockDof, FockId, Index, Nambu};
pub use generator::Generator;
pub use operator::{Operator, OperatorKind, Operators};
pub use term::{Term, TermKind};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FockError {
    #[error("index {0} is not present in the sequence table")]
    IndexNotInTable(Index),

    #[error("internal degrees of freedom differ across the bond ({0} vs {1})")]
    MismatchedInternalDims(usize, usize),

    #[error("unknown alterable parameter '{0}'")]
    UnknownParameter(String),

    #[error("term '{id}' requires {required}, got {got}")]
    UnsupportedDof {
        id: String,
        required: &'static str,
        got: usize,
    },

    #[error("nnambu must be 1 or 2, got {0}")]
    InvalidNambuCount(usize),
}
