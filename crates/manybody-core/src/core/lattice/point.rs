use crate::core::utils::geometry::COORD_TOLERANCE;
use nalgebra::DVector;
use std::fmt;

/// The spatial identity of a lattice point.
///
/// `scope` names the cluster or sublattice the point belongs to and `site`
/// numbers the point within that scope. Together they identify a point
/// uniquely across composed lattices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId {
    pub scope: String,
    pub site: usize,
}

impl PointId {
    pub fn new(scope: impl Into<String>, site: usize) -> Self {
        Self {
            scope: scope.into(),
            site,
        }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.scope, self.site)
    }
}

/// A lattice point.
///
/// `rcoord` is the coordinate in real space; `icoord` is the coordinate in
/// lattice space, i.e. the accumulated translation that produced this point
/// from its home cluster (zero for points inside the home cluster).
#[derive(Debug, Clone)]
pub struct Point {
    pub id: PointId,
    pub rcoord: DVector<f64>,
    pub icoord: DVector<f64>,
}

impl Point {
    pub fn new(id: PointId, rcoord: DVector<f64>) -> Self {
        let icoord = DVector::zeros(rcoord.len());
        Self { id, rcoord, icoord }
    }

    pub fn with_icoord(id: PointId, rcoord: DVector<f64>, icoord: DVector<f64>) -> Self {
        Self { id, rcoord, icoord }
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && (&self.rcoord - &other.rcoord).norm() < COORD_TOLERANCE
            && (&self.icoord - &other.icoord).norm() < COORD_TOLERANCE
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: rcoord={:?}, icoord={:?}",
            self.id,
            self.rcoord.as_slice(),
            self.icoord.as_slice()
        )
    }
}
