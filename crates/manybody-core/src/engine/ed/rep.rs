use crate::core::basis::FockBasis;
use crate::core::fock::{FockError, IndexTable, Nambu, Operator};
use crate::engine::error::EngineError;
use nalgebra_sparse::CooMatrix;
use num_complex::Complex64;

/// An operator reduced to a weighted product of creation/annihilation
/// factors on single-particle states, leftmost factor first.
#[derive(Debug, Clone)]
pub struct FactorChain {
    pub value: Complex64,
    pub factors: Vec<(usize, Nambu)>,
}

impl FactorChain {
    /// Resolves an operator's indices through the sequence table.
    pub fn from_operator(op: &Operator, table: &IndexTable) -> Result<Self, FockError> {
        let factors = op
            .indices
            .iter()
            .map(|index| Ok((table.seq(index)?, index.fid.nambu)))
            .collect::<Result<Vec<_>, FockError>>()?;
        Ok(Self {
            value: op.value,
            factors,
        })
    }

    /// A single annihilation factor, used for Green's function operators.
    pub fn annihilator(seq: usize) -> Self {
        Self {
            value: Complex64::new(1.0, 0.0),
            factors: vec![(seq, Nambu::Annihilation)],
        }
    }

    /// The Hermitian conjugate: factors reversed and daggered, value
    /// conjugated.
    pub fn dagger(&self) -> Self {
        Self {
            value: self.value.conj(),
            factors: self
                .factors
                .iter()
                .rev()
                .map(|&(seq, nambu)| (seq, nambu.dagger()))
                .collect(),
        }
    }

    /// Net particle-number change per application, signed.
    pub fn particle_delta(&self) -> i64 {
        self.factors
            .iter()
            .map(|(_, nambu)| match nambu {
                Nambu::Creation => 1,
                Nambu::Annihilation => -1,
            })
            .sum()
    }
}

/// Fermionic sign of acting on `state` at bit `seq`: the parity of the
/// occupied states below it.
#[inline]
fn jordan_wigner_sign(state: u64, seq: usize) -> f64 {
    let below = state & ((1u64 << seq) - 1);
    if below.count_ones() % 2 == 0 { 1.0 } else { -1.0 }
}

/// Applies a factor chain to one occupation state.
///
/// Returns the resulting state and the accumulated sign, or `None` when the
/// chain annihilates the state.
pub fn apply_chain(chain: &FactorChain, state: u64) -> Option<(u64, f64)> {
    let mut current = state;
    let mut sign = 1.0;
    for &(seq, nambu) in chain.factors.iter().rev() {
        let bit = 1u64 << seq;
        match nambu {
            Nambu::Annihilation => {
                if current & bit == 0 {
                    return None;
                }
                sign *= jordan_wigner_sign(current, seq);
                current &= !bit;
            }
            Nambu::Creation => {
                if current & bit != 0 {
                    return None;
                }
                sign *= jordan_wigner_sign(current, seq);
                current |= bit;
            }
        }
    }
    Some((current, sign))
}

/// The sparse matrix of a factor chain between two basis sectors.
///
/// Entry `(to_rank, from_rank)` holds the amplitude of mapping the
/// `from`-state onto the `to`-state. States that leave the target sector are
/// an error, since that indicates inconsistent sector bookkeeping.
pub fn chain_matrix(
    chain: &FactorChain,
    from: &FockBasis,
    to: &FockBasis,
) -> Result<CooMatrix<Complex64>, EngineError> {
    let mut coo = CooMatrix::new(to.len(), from.len());
    for (from_rank, &state) in from.states().iter().enumerate() {
        let Some((mapped, sign)) = apply_chain(chain, state) else {
            continue;
        };
        let to_rank = to.rank(mapped).ok_or_else(|| {
            EngineError::Internal(format!(
                "state {mapped:b} produced by an operator is outside the target sector {to}"
            ))
        })?;
        coo.push(to_rank, from_rank, chain.value * sign);
    }
    Ok(coo)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn number_chain(seq: usize) -> FactorChain {
        FactorChain {
            value: Complex64::new(1.0, 0.0),
            factors: vec![(seq, Nambu::Creation), (seq, Nambu::Annihilation)],
        }
    }

    #[test]
    fn annihilating_an_empty_state_gives_nothing() {
        let chain = FactorChain::annihilator(1);
        assert!(apply_chain(&chain, 0b0001).is_none());
    }

    #[test]
    fn number_operator_is_diagonal_on_occupation() {
        let chain = number_chain(1);
        let (state, sign) = apply_chain(&chain, 0b0010).unwrap();
        assert_eq!(state, 0b0010);
        assert!((sign - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn fermionic_sign_counts_occupied_states_below() {
        // c_2 acting on |110> passes over the occupied state 1.
        let chain = FactorChain::annihilator(2);
        let (state, sign) = apply_chain(&chain, 0b0110).unwrap();
        assert_eq!(state, 0b0010);
        assert!((sign + 1.0).abs() < TOLERANCE);

        // c_2 acting on |101> passes over an even number of occupied states.
        let (_, sign) = apply_chain(&chain, 0b0101).unwrap();
        assert!((sign - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn anticommutation_shows_up_as_an_order_sign() {
        // c^+_0 c^+_1 |0> = -c^+_1 c^+_0 |0>.
        let forward = FactorChain {
            value: Complex64::new(1.0, 0.0),
            factors: vec![(0, Nambu::Creation), (1, Nambu::Creation)],
        };
        let backward = FactorChain {
            value: Complex64::new(1.0, 0.0),
            factors: vec![(1, Nambu::Creation), (0, Nambu::Creation)],
        };
        let (state_f, sign_f) = apply_chain(&forward, 0).unwrap();
        let (state_b, sign_b) = apply_chain(&backward, 0).unwrap();
        assert_eq!(state_f, state_b);
        assert!((sign_f + sign_b).abs() < TOLERANCE);
    }

    #[test]
    fn dagger_reverses_and_flips_factors() {
        let chain = FactorChain {
            value: Complex64::new(0.0, 2.0),
            factors: vec![(0, Nambu::Creation), (1, Nambu::Annihilation)],
        };
        let dagger = chain.dagger();
        assert_eq!(dagger.factors, vec![(1, Nambu::Creation), (0, Nambu::Annihilation)]);
        assert!((dagger.value - Complex64::new(0.0, -2.0)).norm() < TOLERANCE);
    }

    #[test]
    fn chain_matrix_connects_adjacent_sectors() {
        let from = FockBasis::with_particle_number(3, 1).unwrap();
        let to = FockBasis::with_particle_number(3, 2).unwrap();
        let chain = FactorChain {
            value: Complex64::new(1.0, 0.0),
            factors: vec![(2, Nambu::Creation)],
        };
        let matrix = chain_matrix(&chain, &from, &to).unwrap();
        // Two of the three one-particle states miss state 2 and gain it.
        assert_eq!(matrix.nnz(), 2);
    }

    #[test]
    fn hopping_between_sites_preserves_the_sector() {
        let basis = FockBasis::with_particle_number(2, 1).unwrap();
        let chain = FactorChain {
            value: Complex64::new(-1.0, 0.0),
            factors: vec![(1, Nambu::Creation), (0, Nambu::Annihilation)],
        };
        let matrix = chain_matrix(&chain, &basis, &basis).unwrap();
        assert_eq!(matrix.nnz(), 1);
        let (rows, cols, values) = matrix.clone().disassemble();
        assert_eq!(rows, vec![1]);
        assert_eq!(cols, vec![0]);
        assert!((values[0].re + 1.0).abs() < TOLERANCE);
    }
}
