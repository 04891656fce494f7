use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BasisError {
    #[error("at most 63 single-particle states are supported, got {0}")]
    TooManyStates(usize),

    #[error("sector ({occupied} particles in {nstate} states) is empty")]
    EmptySector { nstate: usize, occupied: usize },

    #[error("spin-resolved bases need an even state count, got {0}")]
    OddStateCount(usize),

    #[error("sequence {seq} is outside the single-particle space of size {nstate}")]
    SeqOutOfRange { seq: usize, nstate: usize },

    #[error("no sector left after shifting the particle number")]
    ShiftOutOfRange,
}

/// Occupation sector selection of a Fock basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorRule {
    /// Every occupation state.
    All,
    /// Fixed total particle number.
    ParticleNumber(usize),
    /// Fixed particle number per spin block. Spin-up states occupy the bit
    /// range `[0, nstate/2)`, spin-down states `[nstate/2, nstate)`.
    SpinResolved { nup: usize, ndown: usize },
}

/// An occupation-number basis over `nstate` single-particle states.
///
/// Basis states are stored as bit masks in ascending numeric order, so the
/// rank of a state is found by binary search.
#[derive(Debug, Clone)]
pub struct FockBasis {
    nstate: usize,
    rule: SectorRule,
    states: Vec<u64>,
}

/// All bit masks over `nbits` bits with exactly `k` bits set, ascending.
fn combinations(nbits: usize, k: usize) -> Vec<u64> {
    if k > nbits {
        return Vec::new();
    }
    if k == 0 {
        return vec![0];
    }
    let mut result = Vec::new();
    let mut state: u64 = (1u64 << k) - 1;
    let limit: u64 = 1u64 << nbits;
    while state < limit {
        result.push(state);
        let carry = state & state.wrapping_neg();
        let ripple = state + carry;
        state = (((ripple ^ state) >> 2) / carry) | ripple;
    }
    result
}

impl FockBasis {
    /// The full Fock space.
    pub fn all(nstate: usize) -> Result<Self, BasisError> {
        if nstate > 63 {
            return Err(BasisError::TooManyStates(nstate));
        }
        Ok(Self {
            nstate,
            rule: SectorRule::All,
            states: (0..(1u64 << nstate)).collect(),
        })
    }

    /// The sector with a fixed total particle number.
    pub fn with_particle_number(nstate: usize, occupied: usize) -> Result<Self, BasisError> {
        if nstate > 63 {
            return Err(BasisError::TooManyStates(nstate));
        }
        let states = combinations(nstate, occupied);
        if states.is_empty() {
            return Err(BasisError::EmptySector { nstate, occupied });
        }
        Ok(Self {
            nstate,
            rule: SectorRule::ParticleNumber(occupied),
            states,
        })
    }

    /// The sector with fixed particle numbers per spin block.
    pub fn spin_resolved(nstate: usize, nup: usize, ndown: usize) -> Result<Self, BasisError> {
        if nstate > 63 {
            return Err(BasisError::TooManyStates(nstate));
        }
        if nstate % 2 != 0 {
            return Err(BasisError::OddStateCount(nstate));
        }
        let half = nstate / 2;
        let ups = combinations(half, nup);
        let downs = combinations(half, ndown);
        if ups.is_empty() || downs.is_empty() {
            return Err(BasisError::EmptySector {
                nstate: half,
                occupied: if ups.is_empty() { nup } else { ndown },
            });
        }
        let mut states = Vec::with_capacity(ups.len() * downs.len());
        for &down in &downs {
            for &up in &ups {
                states.push((down << half) | up);
            }
        }
        Ok(Self {
            nstate,
            rule: SectorRule::SpinResolved { nup, ndown },
            states,
        })
    }

    pub fn nstate(&self) -> usize {
        self.nstate
    }

    pub fn rule(&self) -> SectorRule {
        self.rule
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[u64] {
        &self.states
    }

    pub fn state(&self, rank: usize) -> u64 {
        self.states[rank]
    }

    /// The rank of a state in this basis, if it belongs to the sector.
    pub fn rank(&self, state: u64) -> Option<usize> {
        self.states.binary_search(&state).ok()
    }

    /// The basis reached by adding `delta` particles to the single-particle
    /// state `seq`'s sector.
    ///
    /// For spin-resolved bases the affected spin block is inferred from the
    /// bit position of `seq`.
    pub fn shifted(&self, seq: usize, delta: i64) -> Result<Self, BasisError> {
        if seq >= self.nstate {
            return Err(BasisError::SeqOutOfRange {
                seq,
                nstate: self.nstate,
            });
        }
        let shift = |n: usize| -> Result<usize, BasisError> {
            let shifted = n as i64 + delta;
            if shifted < 0 {
                Err(BasisError::ShiftOutOfRange)
            } else {
                Ok(shifted as usize)
            }
        };
        match self.rule {
            SectorRule::All => Ok(self.clone()),
            SectorRule::ParticleNumber(n) => {
                Self::with_particle_number(self.nstate, shift(n)?)
                    .map_err(|_| BasisError::ShiftOutOfRange)
            }
            SectorRule::SpinResolved { nup, ndown } => {
                let half = self.nstate / 2;
                let (nup, ndown) = if seq < half {
                    (shift(nup)?, ndown)
                } else {
                    (nup, shift(ndown)?)
                };
                Self::spin_resolved(self.nstate, nup, ndown)
                    .map_err(|_| BasisError::ShiftOutOfRange)
            }
        }
    }

    /// Whether two bases describe the same sector.
    pub fn same_sector(&self, other: &Self) -> bool {
        self.nstate == other.nstate && self.rule == other.rule
    }
}

impl fmt::Display for FockBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            SectorRule::All => write!(f, "F({})", self.nstate),
            SectorRule::ParticleNumber(n) => write!(f, "F({}:{})", self.nstate, n),
            SectorRule::SpinResolved { nup, ndown } => {
                let half = self.nstate / 2;
                write!(f, "F({half}:{nup},{half}:{ndown})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_basis_counts_all_occupation_states() {
        let basis = FockBasis::all(4).unwrap();
        assert_eq!(basis.len(), 16);
        assert_eq!(basis.rank(0b1010), Some(10));
    }

    #[test]
    fn particle_number_sector_has_binomial_size() {
        let basis = FockBasis::with_particle_number(4, 2).unwrap();
        assert_eq!(basis.len(), 6);
        assert!(basis.states().iter().all(|s| s.count_ones() == 2));
    }

    #[test]
    fn states_are_sorted_so_rank_is_a_binary_search() {
        let basis = FockBasis::with_particle_number(6, 3).unwrap();
        for (i, &state) in basis.states().iter().enumerate() {
            assert_eq!(basis.rank(state), Some(i));
        }
        assert!(basis.states().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn spin_resolved_sector_combines_the_two_blocks() {
        // 2 sites, one up and one down electron: 2 * 2 states.
        let basis = FockBasis::spin_resolved(4, 1, 1).unwrap();
        assert_eq!(basis.len(), 4);
        for &state in basis.states() {
            assert_eq!((state & 0b11).count_ones(), 1);
            assert_eq!((state >> 2).count_ones(), 1);
        }
    }

    #[test]
    fn rank_of_foreign_state_is_none() {
        let basis = FockBasis::with_particle_number(4, 2).unwrap();
        assert_eq!(basis.rank(0b0001), None);
    }

    #[test]
    fn shifting_a_spin_up_sequence_changes_the_up_count() {
        let basis = FockBasis::spin_resolved(4, 1, 1).unwrap();
        let plus = basis.shifted(0, 1).unwrap();
        assert_eq!(
            plus.rule(),
            SectorRule::SpinResolved { nup: 2, ndown: 1 }
        );
        let minus = basis.shifted(3, -1).unwrap();
        assert_eq!(
            minus.rule(),
            SectorRule::SpinResolved { nup: 1, ndown: 0 }
        );
    }

    #[test]
    fn shifting_out_of_the_space_is_an_error() {
        let basis = FockBasis::with_particle_number(2, 2).unwrap();
        assert!(matches!(
            basis.shifted(0, 1),
            Err(BasisError::ShiftOutOfRange)
        ));
    }

    #[test]
    fn empty_sector_is_rejected() {
        assert!(matches!(
            FockBasis::with_particle_number(2, 5),
            Err(BasisError::EmptySector { .. })
        ));
    }

    #[test]
    fn display_shows_the_sector_shape() {
        let basis = FockBasis::spin_resolved(8, 2, 2).unwrap();
        assert_eq!(basis.to_string(), "F(4:2,4:2)");
    }
}
