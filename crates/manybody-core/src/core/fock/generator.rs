use super::FockError;
use super::config::{DofConfig, IndexTable};
use super::operator::{Operator, Operators};
use super::term::Term;
use crate::core::lattice::Bond;
use num_complex::Complex64;
use std::collections::BTreeMap;
use tracing::debug;

/// Expands a term list over a bond list into elementary operators.
///
/// Terms marked as modulated form the alterable parameter set: their values
/// can be updated after construction and only their operators are
/// regenerated. Everything else is expanded once.
#[derive(Debug, Clone)]
pub struct Generator {
    bonds: Vec<Bond>,
    config: DofConfig,
    table: IndexTable,
    constant_terms: Vec<Term>,
    alterable_terms: Vec<Term>,
    constant_ops: Operators,
    alterable_ops: Operators,
}

impl Generator {
    pub fn new(
        bonds: Vec<Bond>,
        config: DofConfig,
        table: IndexTable,
        terms: Vec<Term>,
    ) -> Result<Self, FockError> {
        let (alterable_terms, constant_terms): (Vec<Term>, Vec<Term>) =
            terms.into_iter().partition(|t| t.modulate);
        let constant_ops = expand(&bonds, &config, &table, &constant_terms)?;
        let alterable_ops = expand(&bonds, &config, &table, &alterable_terms)?;
        debug!(
            constant = constant_ops.len(),
            alterable = alterable_ops.len(),
            "expanded terms into operators"
        );
        Ok(Self {
            bonds,
            config,
            table,
            constant_terms,
            alterable_terms,
            constant_ops,
            alterable_ops,
        })
    }

    pub fn table(&self) -> &IndexTable {
        &self.table
    }

    pub fn config(&self) -> &DofConfig {
        &self.config
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// All current operators, constant first.
    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        self.constant_ops.iter().chain(self.alterable_ops.iter())
    }

    /// The constant and alterable parameter values.
    pub fn parameters(&self) -> (BTreeMap<String, Complex64>, BTreeMap<String, Complex64>) {
        let constant = self
            .constant_terms
            .iter()
            .map(|t| (t.id.clone(), t.value))
            .collect();
        let alterable = self
            .alterable_terms
            .iter()
            .map(|t| (t.id.clone(), t.value))
            .collect();
        (constant, alterable)
    }

    /// Updates one alterable parameter and regenerates its operators.
    pub fn update(&mut self, id: &str, value: Complex64) -> Result<(), FockError> {
        let term = self
            .alterable_terms
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| FockError::UnknownParameter(id.to_string()))?;
        term.value = value;
        self.alterable_ops = expand(&self.bonds, &self.config, &self.table, &self.alterable_terms)?;
        Ok(())
    }
}

fn expand(
    bonds: &[Bond],
    config: &DofConfig,
    table: &IndexTable,
    terms: &[Term],
) -> Result<Operators, FockError> {
    let mut operators = Operators::new();
    for term in terms {
        for bond in bonds {
            operators.extend(term.operators(bond, config, table)?);
        }
    }
    Ok(operators)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fock::config::IndexOrder;
    use crate::core::fock::dof::FockDof;
    use crate::core::lattice::{Lattice, Point, PointId};
    use nalgebra::DVector;

    fn chain_generator() -> Generator {
        let points: Vec<Point> = (0..2)
            .map(|i| Point::new(PointId::new("C", i), DVector::from_column_slice(&[i as f64])))
            .collect();
        let lattice = Lattice::new("chain", points, vec![], 1).unwrap();
        let config = DofConfig::uniform(&lattice.pids(), FockDof::default());
        let table = config.table(IndexOrder::SiteMajor, true);
        Generator::new(
            lattice.bonds().to_vec(),
            config,
            table,
            vec![
                Term::hopping("t", -1.0, 1),
                Term::hubbard("U", 4.0).modulated(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn generator_splits_constant_and_alterable_parameters() {
        let generator = chain_generator();
        let (constant, alterable) = generator.parameters();
        assert!(constant.contains_key("t"));
        assert!(alterable.contains_key("U"));
    }

    #[test]
    fn update_changes_alterable_operator_values() {
        let mut generator = chain_generator();
        generator.update("U", Complex64::new(8.0, 0.0)).unwrap();
        let hubbard_value: f64 = generator
            .operators()
            .filter(|o| o.term_id == "U")
            .map(|o| o.value.re)
            .next()
            .unwrap();
        assert!((hubbard_value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn updating_a_constant_parameter_is_an_error() {
        let mut generator = chain_generator();
        assert!(matches!(
            generator.update("t", Complex64::new(0.5, 0.0)),
            Err(FockError::UnknownParameter(_))
        ));
    }

    #[test]
    fn operator_count_matches_bond_expansion() {
        let generator = chain_generator();
        // Hopping: one bond, two spins. Hubbard: two self bonds, one orbital.
        assert_eq!(generator.operators().count(), 4);
    }
}
