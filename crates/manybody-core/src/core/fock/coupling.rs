use super::FockError;
use super::dof::{FockDof, FockId, Index, Nambu};
use crate::core::lattice::Bond;
use num_complex::Complex64;

/// Internal channel a Pauli-style coupling acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouplingMode {
    Spin,
    Orbital,
    Sublattice,
    ParticleHole,
}

/// One structure-factor component of a quadratic term.
///
/// Each optional pair constrains the corresponding internal axis of the
/// (end, start) indices of a bond; unconstrained axes are summed over.
#[derive(Debug, Clone, PartialEq)]
pub struct Coupling {
    pub value: Complex64,
    pub atoms: Option<(usize, usize)>,
    pub orbitals: Option<(usize, usize)>,
    pub spins: Option<(usize, usize)>,
    pub nambus: Option<(Nambu, Nambu)>,
}

impl Coupling {
    /// The identity coupling: sums every internal combination with weight 1.
    pub fn unit() -> Self {
        Self::with_value(Complex64::new(1.0, 0.0))
    }

    pub fn with_value(value: Complex64) -> Self {
        Self {
            value,
            atoms: None,
            orbitals: None,
            spins: None,
            nambus: None,
        }
    }

    pub fn atoms(mut self, end: usize, start: usize) -> Self {
        self.atoms = Some((end, start));
        self
    }

    pub fn orbitals(mut self, end: usize, start: usize) -> Self {
        self.orbitals = Some((end, start));
        self
    }

    pub fn spins(mut self, end: usize, start: usize) -> Self {
        self.spins = Some((end, start));
        self
    }

    pub fn nambus(mut self, end: Nambu, start: Nambu) -> Self {
        self.nambus = Some((end, start));
        self
    }

    /// Multiplies two couplings, contracting adjacent constraints with
    /// Kronecker deltas. Returns `None` when the contraction vanishes.
    pub fn mul(&self, other: &Coupling) -> Option<Coupling> {
        let mut result = Coupling::with_value(self.value * other.value);

        fn contract<T: Copy + PartialEq>(
            value: &mut Complex64,
            a: Option<(T, T)>,
            b: Option<(T, T)>,
        ) -> Option<(T, T)> {
            match (a, b) {
                (Some((a0, a1)), Some((b0, b1))) => {
                    if a1 != b0 {
                        *value = Complex64::new(0.0, 0.0);
                    }
                    Some((a0, b1))
                }
                (Some(pair), None) | (None, Some(pair)) => Some(pair),
                (None, None) => None,
            }
        }

        result.atoms = contract(&mut result.value, self.atoms, other.atoms);
        result.orbitals = contract(&mut result.value, self.orbitals, other.orbitals);
        result.spins = contract(&mut result.value, self.spins, other.spins);
        result.nambus = contract(&mut result.value, self.nambus, other.nambus);

        if result.value.norm() < f64::EPSILON {
            None
        } else {
            Some(result)
        }
    }

    /// Expands the coupling on a bond into `(value, end index, start index)`
    /// quadratics.
    ///
    /// `default_nambus` supplies the particle-hole characters when the
    /// coupling leaves them unconstrained. Atom constraints filter the bond
    /// as `(end atom, start atom)`.
    pub fn expand(
        &self,
        bond: &Bond,
        start_dof: &FockDof,
        end_dof: &FockDof,
        default_nambus: (Nambu, Nambu),
    ) -> Result<Vec<(Complex64, Index, Index)>, FockError> {
        if let Some((end_atom, start_atom)) = self.atoms {
            if (end_dof.atom, start_dof.atom) != (end_atom, start_atom) {
                return Ok(Vec::new());
            }
        }
        let (end_nambu, start_nambu) = self.nambus.unwrap_or(default_nambus);

        let spins: Vec<(usize, usize)> = match self.spins {
            Some(pair) => vec![pair],
            None => {
                if end_dof.nspin != start_dof.nspin {
                    return Err(FockError::MismatchedInternalDims(
                        end_dof.nspin,
                        start_dof.nspin,
                    ));
                }
                (0..end_dof.nspin).map(|s| (s, s)).collect()
            }
        };
        let orbitals: Vec<(usize, usize)> = match self.orbitals {
            Some(pair) => vec![pair],
            None => {
                if end_dof.norbital != start_dof.norbital {
                    return Err(FockError::MismatchedInternalDims(
                        end_dof.norbital,
                        start_dof.norbital,
                    ));
                }
                (0..end_dof.norbital).map(|o| (o, o)).collect()
            }
        };

        let mut result = Vec::with_capacity(spins.len() * orbitals.len());
        for &(end_spin, start_spin) in &spins {
            for &(end_orbital, start_orbital) in &orbitals {
                let end = Index::new(
                    bond.end.id.clone(),
                    FockId::new(end_orbital, end_spin, end_nambu),
                );
                let start = Index::new(
                    bond.start.id.clone(),
                    FockId::new(start_orbital, start_spin, start_nambu),
                );
                result.push((self.value, end, start));
            }
        }
        Ok(result)
    }
}

/// A sum of couplings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CouplingList {
    items: Vec<Coupling>,
}

impl CouplingList {
    pub fn new() -> Self {
        Self::default()
    }

    /// The identity structure factor.
    pub fn unit() -> Self {
        Self {
            items: vec![Coupling::unit()],
        }
    }

    pub fn push(&mut self, coupling: Coupling) {
        self.items.push(coupling);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coupling> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Distributive product of two coupling sums; vanishing contractions are
    /// dropped.
    pub fn mul(&self, other: &CouplingList) -> CouplingList {
        let mut result = CouplingList::new();
        for a in &self.items {
            for b in &other.items {
                if let Some(c) = a.mul(b) {
                    result.push(c);
                }
            }
        }
        result
    }
}

impl From<Vec<Coupling>> for CouplingList {
    fn from(items: Vec<Coupling>) -> Self {
        Self { items }
    }
}

impl<'a> IntoIterator for &'a CouplingList {
    type Item = &'a Coupling;
    type IntoIter = std::slice::Iter<'a, Coupling>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn channel_pair(mode: CouplingMode, value: Complex64, a: usize, b: usize) -> Coupling {
    let coupling = Coupling::with_value(value);
    match mode {
        CouplingMode::Spin => coupling.spins(a, b),
        CouplingMode::Orbital => coupling.orbitals(a, b),
        CouplingMode::Sublattice => coupling.atoms(a, b),
        CouplingMode::ParticleHole => {
            let nambu = |i: usize| {
                if i == 0 {
                    Nambu::Annihilation
                } else {
                    Nambu::Creation
                }
            };
            coupling.nambus(nambu(a), nambu(b))
        }
    }
}

/// The 2x2 identity on the chosen channel.
pub fn sigma_0(mode: CouplingMode) -> CouplingList {
    let one = Complex64::new(1.0, 0.0);
    match mode {
        CouplingMode::ParticleHole => vec![
            channel_pair(mode, one, 0, 1),
            channel_pair(mode, one, 1, 0),
        ],
        _ => vec![
            channel_pair(mode, one, 0, 0),
            channel_pair(mode, one, 1, 1),
        ],
    }
    .into()
}

/// The Pauli matrix sigma-x on the chosen channel.
pub fn sigma_x(mode: CouplingMode) -> CouplingList {
    let one = Complex64::new(1.0, 0.0);
    match mode {
        CouplingMode::ParticleHole => vec![
            channel_pair(mode, one, 0, 0),
            channel_pair(mode, one, 1, 1),
        ],
        _ => vec![
            channel_pair(mode, one, 0, 1),
            channel_pair(mode, one, 1, 0),
        ],
    }
    .into()
}

/// The Pauli matrix sigma-y on the chosen channel.
pub fn sigma_y(mode: CouplingMode) -> CouplingList {
    let i = Complex64::new(0.0, 1.0);
    match mode {
        CouplingMode::ParticleHole => vec![
            channel_pair(mode, i, 0, 0),
            channel_pair(mode, -i, 1, 1),
        ],
        _ => vec![
            channel_pair(mode, i, 0, 1),
            channel_pair(mode, -i, 1, 0),
        ],
    }
    .into()
}

/// The Pauli matrix sigma-z on the chosen channel.
pub fn sigma_z(mode: CouplingMode) -> CouplingList {
    let one = Complex64::new(1.0, 0.0);
    match mode {
        CouplingMode::ParticleHole => vec![
            channel_pair(mode, -one, 0, 1),
            channel_pair(mode, one, 1, 0),
        ],
        _ => vec![
            channel_pair(mode, -one, 0, 0),
            channel_pair(mode, one, 1, 1),
        ],
    }
    .into()
}

/// The raising matrix on the chosen channel.
pub fn sigma_plus(mode: CouplingMode) -> CouplingList {
    let one = Complex64::new(1.0, 0.0);
    match mode {
        CouplingMode::ParticleHole => vec![channel_pair(mode, one, 1, 1)],
        _ => vec![channel_pair(mode, one, 1, 0)],
    }
    .into()
}

/// The lowering matrix on the chosen channel.
pub fn sigma_minus(mode: CouplingMode) -> CouplingList {
    let one = Complex64::new(1.0, 0.0);
    match mode {
        CouplingMode::ParticleHole => vec![channel_pair(mode, one, 0, 0)],
        _ => vec![channel_pair(mode, one, 0, 1)],
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lattice::{Point, PointId};
    use nalgebra::DVector;

    fn test_bond() -> Bond {
        let start = Point::new(PointId::new("C", 0), DVector::from_column_slice(&[0.0]));
        let end = Point::new(PointId::new("C", 1), DVector::from_column_slice(&[1.0]));
        Bond::new(1, start, end)
    }

    #[test]
    fn unconstrained_coupling_sums_all_internal_combinations() {
        let dof = FockDof::new(0, 2, 2, 1).unwrap();
        let expanded = Coupling::unit()
            .expand(
                &test_bond(),
                &dof,
                &dof,
                (Nambu::Creation, Nambu::Annihilation),
            )
            .unwrap();
        assert_eq!(expanded.len(), 4);
        assert!(
            expanded
                .iter()
                .all(|(_, end, start)| end.fid.nambu == Nambu::Creation
                    && start.fid.nambu == Nambu::Annihilation)
        );
    }

    #[test]
    fn spin_constrained_coupling_fixes_the_spin_pair() {
        let dof = FockDof::default();
        let coupling = Coupling::unit().spins(1, 0);
        let expanded = coupling
            .expand(
                &test_bond(),
                &dof,
                &dof,
                (Nambu::Creation, Nambu::Annihilation),
            )
            .unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].1.fid.spin, 1);
        assert_eq!(expanded[0].2.fid.spin, 0);
    }

    #[test]
    fn atom_mismatch_filters_the_bond() {
        let a = FockDof::new(0, 1, 2, 1).unwrap();
        let b = FockDof::new(1, 1, 2, 1).unwrap();
        let coupling = Coupling::unit().atoms(0, 0);
        let expanded = coupling
            .expand(&test_bond(), &a, &b, (Nambu::Creation, Nambu::Annihilation))
            .unwrap();
        assert!(expanded.is_empty());
    }

    #[test]
    fn multiplication_contracts_with_kronecker_delta() {
        let a = Coupling::unit().spins(0, 1);
        let b = Coupling::unit().spins(1, 0);
        let product = a.mul(&b).unwrap();
        assert_eq!(product.spins, Some((0, 0)));

        let c = Coupling::unit().spins(0, 0);
        assert!(a.mul(&c).is_none());
    }

    #[test]
    fn sigma_z_on_spin_channel_weights_spins_oppositely() {
        let list = sigma_z(CouplingMode::Spin);
        let values: Vec<_> = list.iter().map(|c| (c.spins.unwrap(), c.value.re)).collect();
        assert!(values.contains(&((0, 0), -1.0)));
        assert!(values.contains(&((1, 1), 1.0)));
    }

    #[test]
    fn sigma_product_reproduces_pauli_algebra() {
        // sigma_plus * sigma_minus = (1 + sigma_z) / 2 projected on spin-up.
        let product = sigma_plus(CouplingMode::Spin).mul(&sigma_minus(CouplingMode::Spin));
        assert_eq!(product.len(), 1);
        let only = product.iter().next().unwrap();
        assert_eq!(only.spins, Some((1, 1)));
        assert!((only.value.re - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sigma_y_carries_imaginary_weights() {
        let list = sigma_y(CouplingMode::Spin);
        for coupling in &list {
            assert!(coupling.value.re.abs() < 1e-12);
            assert!((coupling.value.im.abs() - 1.0).abs() < 1e-12);
        }
    }
}
