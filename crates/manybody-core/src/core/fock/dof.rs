use super::FockError;
use crate::core::lattice::PointId;
use std::fmt;

/// Particle-hole character of a fermionic index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Nambu {
    #[default]
    Annihilation,
    Creation,
}

impl Nambu {
    /// The opposite particle-hole character.
    pub fn dagger(self) -> Self {
        match self {
            Nambu::Annihilation => Nambu::Creation,
            Nambu::Creation => Nambu::Annihilation,
        }
    }

    pub fn as_index(self) -> usize {
        match self {
            Nambu::Annihilation => 0,
            Nambu::Creation => 1,
        }
    }
}

/// The internal id of a fermionic degree of freedom on one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FockId {
    pub orbital: usize,
    pub spin: usize,
    pub nambu: Nambu,
}

impl FockId {
    pub fn new(orbital: usize, spin: usize, nambu: Nambu) -> Self {
        Self {
            orbital,
            spin,
            nambu,
        }
    }

    /// Flips the Nambu index while keeping orbital and spin.
    pub fn dagger(self) -> Self {
        Self {
            nambu: self.nambu.dagger(),
            ..self
        }
    }
}

/// The internal fermionic degrees of freedom living on a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FockDof {
    /// Atom species on this point, used by sublattice-selective couplings.
    pub atom: usize,
    pub norbital: usize,
    pub nspin: usize,
    /// 1 when the Nambu space is unused, 2 when it is.
    pub nnambu: usize,
}

impl Default for FockDof {
    fn default() -> Self {
        Self {
            atom: 0,
            norbital: 1,
            nspin: 2,
            nnambu: 1,
        }
    }
}

impl FockDof {
    pub fn new(atom: usize, norbital: usize, nspin: usize, nnambu: usize) -> Result<Self, FockError> {
        if nnambu != 1 && nnambu != 2 {
            return Err(FockError::InvalidNambuCount(nnambu));
        }
        Ok(Self {
            atom,
            norbital,
            nspin,
            nnambu,
        })
    }

    /// Number of internal indices, with or without the Nambu axis.
    pub fn ndegree(&self, mask_nambu: bool) -> usize {
        let nambu = if mask_nambu { 1 } else { self.nnambu };
        self.norbital * self.nspin * nambu
    }

    /// All indices of this point, in (nambu, spin, orbital) enumeration
    /// order. With `mask_nambu` the Nambu axis collapses to annihilation.
    pub fn indices(&self, pid: &PointId, mask_nambu: bool) -> Vec<Index> {
        let nnambu = if mask_nambu { 1 } else { self.nnambu };
        let mut result = Vec::with_capacity(self.ndegree(mask_nambu));
        for nambu in 0..nnambu {
            let nambu = if nambu == 0 {
                Nambu::Annihilation
            } else {
                Nambu::Creation
            };
            for spin in 0..self.nspin {
                for orbital in 0..self.norbital {
                    result.push(Index {
                        pid: pid.clone(),
                        fid: FockId::new(orbital, spin, nambu),
                    });
                }
            }
        }
        result
    }
}

/// A full single-particle index: spatial id plus internal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Index {
    pub pid: PointId,
    pub fid: FockId,
}

impl Index {
    pub fn new(pid: PointId, fid: FockId) -> Self {
        Self { pid, fid }
    }

    pub fn dagger(&self) -> Self {
        Self {
            pid: self.pid.clone(),
            fid: self.fid.dagger(),
        }
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dag = match self.fid.nambu {
            Nambu::Annihilation => "",
            Nambu::Creation => "+",
        };
        write!(
            f,
            "c{}({},ob{},sp{})",
            dag, self.pid, self.fid.orbital, self.fid.spin
        )
    }
}
