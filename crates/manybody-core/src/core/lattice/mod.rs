//! Lattice geometry: points, bonds, neighbor search, and cluster tiling.
//!
//! A [`Lattice`](lattice::Lattice) provides a unified description of 1D,
//! quasi-1D, 2D, quasi-2D and 3D lattice systems: the points of a unit cell
//! or cluster, its translation vectors and their reciprocals, and all bonds
//! up to a requested neighbor order. Preset clusters for common geometries
//! live in [`registry`].

pub mod bond;
#[allow(clippy::module_inception)]
pub mod lattice;
pub mod point;
pub mod registry;

pub use bond::Bond;
pub use lattice::{Lattice, LatticeError, tiling};
pub use point::{Point, PointId};
