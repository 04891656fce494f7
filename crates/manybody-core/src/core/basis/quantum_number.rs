use std::fmt;

/// Per-state U(1) charges of a basis, e.g. twice the total Sz.
///
/// Charges are stored state by state; runs of equal charge can be supplied
/// compressed. The Kronecker combination of two charge lists matches the
/// row-major ordering of the matrix Kronecker product, which is what the
/// sector-projected tensor products rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantumNumbers {
    name: String,
    charges: Vec<i32>,
}

impl QuantumNumbers {
    pub fn from_charges(name: impl Into<String>, charges: Vec<i32>) -> Self {
        Self {
            name: name.into(),
            charges,
        }
    }

    /// Builds the charge list from `(charge, count)` runs.
    pub fn from_counts(name: impl Into<String>, runs: &[(i32, usize)]) -> Self {
        let mut charges = Vec::with_capacity(runs.iter().map(|(_, c)| c).sum());
        for &(charge, count) in runs {
            charges.extend(std::iter::repeat_n(charge, count));
        }
        Self {
            name: name.into(),
            charges,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.charges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    pub fn charge(&self, state: usize) -> i32 {
        self.charges[state]
    }

    pub fn charges(&self) -> &[i32] {
        &self.charges
    }

    /// Charges of the product basis, `self` index major.
    pub fn kron(&self, other: &QuantumNumbers) -> QuantumNumbers {
        let mut charges = Vec::with_capacity(self.len() * other.len());
        for &a in &self.charges {
            for &b in &other.charges {
                charges.push(a + b);
            }
        }
        QuantumNumbers {
            name: self.name.clone(),
            charges,
        }
    }

    /// Indices of the states carrying the target charge.
    pub fn sector_indices(&self, target: i32) -> Vec<usize> {
        self.charges
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == target)
            .map(|(i, _)| i)
            .collect()
    }

    /// Restriction of the charge list to a subset of states.
    pub fn select(&self, states: &[usize]) -> QuantumNumbers {
        QuantumNumbers {
            name: self.name.clone(),
            charges: states.iter().map(|&i| self.charges[i]).collect(),
        }
    }
}

impl fmt::Display for QuantumNumbers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:?}", self.name, self.charges)
    }
}
