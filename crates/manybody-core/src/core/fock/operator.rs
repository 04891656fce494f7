use super::dof::{Index, Nambu};
use nalgebra::DVector;
use num_complex::Complex64;

/// How an elementary operator maps onto matrix representations.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorKind {
    /// A quadratic `psi^+_row psi_col` in the (possibly Nambu-doubled)
    /// single-particle space.
    Quadratic { row: usize, col: usize },
    /// A product of creation/annihilation factors on single-particle states,
    /// leftmost factor first.
    Product { factors: Vec<(usize, Nambu)> },
}

/// An elementary operator produced by expanding a term on a bond.
///
/// Operators are "half" operators: Hamiltonians are assembled as the sum of
/// all operators plus its Hermitian conjugate.
#[derive(Debug, Clone)]
pub struct Operator {
    /// Id of the term this operator came from.
    pub term_id: String,
    pub value: Complex64,
    /// The indices of the factors, leftmost first.
    pub indices: Vec<Index>,
    /// Real-space displacement of the underlying bond, used for Bloch
    /// phases.
    pub rcoord: DVector<f64>,
    /// Lattice-space displacement of the underlying bond; nonzero exactly
    /// for inter-cluster operators.
    pub icoord: DVector<f64>,
    pub kind: OperatorKind,
}

impl Operator {
    pub fn is_intra_cell(&self) -> bool {
        self.icoord.norm() < crate::core::utils::geometry::COORD_TOLERANCE
    }
}

/// An accumulating collection of operators.
#[derive(Debug, Clone, Default)]
pub struct Operators {
    items: Vec<Operator>,
}

impl Operators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operator: Operator) {
        self.items.push(operator);
    }

    pub fn extend(&mut self, operators: impl IntoIterator<Item = Operator>) {
        self.items.extend(operators);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operator> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Operators {
    type Item = &'a Operator;
    type IntoIter = std::slice::Iter<'a, Operator>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Operators {
    type Item = Operator;
    type IntoIter = std::vec::IntoIter<Operator>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
