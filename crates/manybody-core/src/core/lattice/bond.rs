use super::point::Point;
use crate::core::utils::geometry::COORD_TOLERANCE;
use nalgebra::DVector;
use std::fmt;

/// A bond between two lattice points.
///
/// `neighbour` is the order of the neighbor shell the bond belongs to;
/// zeroth-order bonds connect a point to itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Bond {
    pub neighbour: usize,
    pub start: Point,
    pub end: Point,
}

impl Bond {
    pub fn new(neighbour: usize, start: Point, end: Point) -> Self {
        Self {
            neighbour,
            start,
            end,
        }
    }

    /// The real-space displacement from start to end.
    pub fn rcoord(&self) -> DVector<f64> {
        &self.end.rcoord - &self.start.rcoord
    }

    /// The lattice-space displacement from start to end.
    pub fn icoord(&self) -> DVector<f64> {
        &self.end.icoord - &self.start.icoord
    }

    /// Whether the bond stays inside the home cluster.
    pub fn is_intra_cell(&self) -> bool {
        self.icoord().norm() < COORD_TOLERANCE
    }

    /// The bond with start and end points exchanged.
    pub fn reversed(&self) -> Self {
        Self {
            neighbour: self.neighbour,
            start: self.end.clone(),
            end: self.start.clone(),
        }
    }
}

impl fmt::Display for Bond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "neighbour {}: {} -> {}",
            self.neighbour, self.start, self.end
        )
    }
}
