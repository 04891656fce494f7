//! Model file I/O.
//!
//! Models are described in TOML: a lattice (preset or explicit geometry),
//! the internal degrees of freedom, a term list, and optionally a many-body
//! basis sector. [`model::Model::load`] turns such a file into the core
//! objects the solvers consume.

pub mod model;

pub use model::{Model, ModelError, ModelFile};
