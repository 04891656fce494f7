use super::FockError;
use super::config::{DofConfig, IndexTable};
use super::coupling::CouplingList;
use super::dof::{FockDof, FockId, Index, Nambu};
use super::operator::{Operator, OperatorKind};
use crate::core::lattice::Bond;
use num_complex::Complex64;

/// The kind of a model term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKind {
    /// Quadratic hopping `t c^+_e c_s` on bonds of the given neighbor order.
    Hopping,
    /// Quadratic onsite energy (or bond charge for neighbour > 0).
    Onsite,
    /// Anomalous pairing `delta c^+_e c^+_s`.
    Pairing,
    /// Onsite density-density interaction `U n_up n_down` per orbital.
    Hubbard,
}

/// A term of the Hamiltonian.
#[derive(Debug, Clone)]
pub struct Term {
    pub id: String,
    pub kind: TermKind,
    pub value: Complex64,
    pub neighbour: usize,
    pub couplings: CouplingList,
    /// Marks the term's value as an alterable parameter.
    pub modulate: bool,
}

impl Term {
    pub fn new(
        id: impl Into<String>,
        kind: TermKind,
        value: Complex64,
        neighbour: usize,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            value,
            neighbour,
            couplings: CouplingList::unit(),
            modulate: false,
        }
    }

    pub fn hopping(id: impl Into<String>, value: f64, neighbour: usize) -> Self {
        Self::new(id, TermKind::Hopping, Complex64::new(value, 0.0), neighbour)
    }

    pub fn onsite(id: impl Into<String>, value: f64) -> Self {
        Self::new(id, TermKind::Onsite, Complex64::new(value, 0.0), 0)
    }

    pub fn pairing(id: impl Into<String>, value: f64, neighbour: usize) -> Self {
        Self::new(id, TermKind::Pairing, Complex64::new(value, 0.0), neighbour)
    }

    pub fn hubbard(id: impl Into<String>, value: f64) -> Self {
        Self::new(id, TermKind::Hubbard, Complex64::new(value, 0.0), 0)
    }

    pub fn with_couplings(mut self, couplings: CouplingList) -> Self {
        self.couplings = couplings;
        self
    }

    /// Marks the term's value as a scan parameter.
    pub fn modulated(mut self) -> Self {
        self.modulate = true;
        self
    }

    /// Expands the term on a bond into elementary operators.
    ///
    /// Bonds of a different neighbor order produce nothing. Self-conjugate
    /// operators (onsite quadratics, Hubbard quartics) carry half their
    /// value so that `H = sum + h.c.` holds.
    pub fn operators(
        &self,
        bond: &Bond,
        config: &DofConfig,
        table: &IndexTable,
    ) -> Result<Vec<Operator>, FockError> {
        if bond.neighbour != self.neighbour {
            return Ok(Vec::new());
        }
        let start_dof = config
            .dof(&bond.start.id)
            .copied()
            .ok_or_else(|| FockError::IndexNotInTable(Index::new(
                bond.start.id.clone(),
                FockId::default(),
            )))?;
        let end_dof = config
            .dof(&bond.end.id)
            .copied()
            .ok_or_else(|| FockError::IndexNotInTable(Index::new(
                bond.end.id.clone(),
                FockId::default(),
            )))?;

        match self.kind {
            TermKind::Hopping | TermKind::Onsite => self.expand_quadratic(
                bond,
                &start_dof,
                &end_dof,
                table,
                (Nambu::Creation, Nambu::Annihilation),
                self.kind == TermKind::Onsite,
            ),
            TermKind::Pairing => self.expand_quadratic(
                bond,
                &start_dof,
                &end_dof,
                table,
                (Nambu::Creation, Nambu::Creation),
                false,
            ),
            TermKind::Hubbard => self.expand_hubbard(bond, &end_dof, table),
        }
    }

    fn expand_quadratic(
        &self,
        bond: &Bond,
        start_dof: &FockDof,
        end_dof: &FockDof,
        table: &IndexTable,
        default_nambus: (Nambu, Nambu),
        halve: bool,
    ) -> Result<Vec<Operator>, FockError> {
        let factor = if halve { 0.5 } else { 1.0 };
        let mut operators = Vec::new();
        for coupling in &self.couplings {
            for (weight, end, start) in
                coupling.expand(bond, start_dof, end_dof, default_nambus)?
            {
                // psi^+_row psi_col: the row is the state whose creation
                // operator the end factor is.
                let row = table.seq(&end.dagger())?;
                let col = table.seq(&start)?;
                operators.push(Operator {
                    term_id: self.id.clone(),
                    value: self.value * weight * factor,
                    indices: vec![end, start],
                    rcoord: bond.rcoord(),
                    icoord: bond.icoord(),
                    kind: OperatorKind::Quadratic { row, col },
                });
            }
        }
        Ok(operators)
    }

    fn expand_hubbard(
        &self,
        bond: &Bond,
        dof: &FockDof,
        table: &IndexTable,
    ) -> Result<Vec<Operator>, FockError> {
        if bond.start.id != bond.end.id {
            return Ok(Vec::new());
        }
        if dof.nspin != 2 {
            return Err(FockError::UnsupportedDof {
                id: self.id.clone(),
                required: "two spin flavors",
                got: dof.nspin,
            });
        }
        let pid = &bond.start.id;
        let mut operators = Vec::new();
        for orbital in 0..dof.norbital {
            let up = Index::new(pid.clone(), FockId::new(orbital, 0, Nambu::Annihilation));
            let down = Index::new(pid.clone(), FockId::new(orbital, 1, Nambu::Annihilation));
            let indices = vec![up.dagger(), up.clone(), down.dagger(), down.clone()];
            let factors = vec![
                (table.seq(&up)?, Nambu::Creation),
                (table.seq(&up)?, Nambu::Annihilation),
                (table.seq(&down)?, Nambu::Creation),
                (table.seq(&down)?, Nambu::Annihilation),
            ];
            operators.push(Operator {
                term_id: self.id.clone(),
                value: self.value * 0.5,
                indices,
                rcoord: bond.rcoord(),
                icoord: bond.icoord(),
                kind: OperatorKind::Product { factors },
            });
        }
        Ok(operators)
    }
}
