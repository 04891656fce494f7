use super::FockError;
use super::dof::{FockDof, Index, Nambu};
use crate::core::lattice::PointId;
use std::collections::{BTreeMap, HashMap};

/// Linearization order of the sequence table.
///
/// The order decides which internal axis varies slowest and thereby the
/// block structure of matrix representations:
///
/// - `NambuMajor` puts all annihilation indices before all creation indices
///   (within a scope), giving the particle/hole block layout of BdG
///   matrices.
/// - `SiteMajor` keeps all indices of one site adjacent.
/// - `SpinMajor` puts all spin-up indices before all spin-down indices,
///   giving the spin block layout that sector-resolved Fock bases rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrder {
    #[default]
    NambuMajor,
    SiteMajor,
    SpinMajor,
}

/// Assignment of internal degrees of freedom to lattice points.
#[derive(Debug, Clone, Default)]
pub struct DofConfig {
    map: BTreeMap<PointId, FockDof>,
}

impl DofConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration by applying `dof_of` to every point id.
    pub fn build(pids: &[PointId], dof_of: impl Fn(&PointId) -> FockDof) -> Self {
        let mut config = Self::new();
        for pid in pids {
            config.insert(pid.clone(), dof_of(pid));
        }
        config
    }

    /// Builds a configuration assigning the same degrees of freedom to all
    /// points.
    pub fn uniform(pids: &[PointId], dof: FockDof) -> Self {
        Self::build(pids, |_| dof)
    }

    pub fn insert(&mut self, pid: PointId, dof: FockDof) {
        self.map.insert(pid, dof);
    }

    pub fn dof(&self, pid: &PointId) -> Option<&FockDof> {
        self.map.get(pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PointId, &FockDof)> {
        self.map.iter()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Linearizes all indices into a sequence table.
    ///
    /// With `mask_nambu` the Nambu axis is collapsed, so creation and
    /// annihilation indices of the same state share a sequence.
    pub fn table(&self, order: IndexOrder, mask_nambu: bool) -> IndexTable {
        let mut indices: Vec<Index> = self
            .map
            .iter()
            .flat_map(|(pid, dof)| dof.indices(pid, mask_nambu))
            .collect();
        indices.sort_by(|a, b| sort_key(a, order).cmp(&sort_key(b, order)));
        let seqs = indices
            .iter()
            .cloned()
            .enumerate()
            .map(|(seq, index)| (index, seq))
            .collect();
        IndexTable {
            indices,
            seqs,
            mask_nambu,
        }
    }
}

type SortKey<'a> = (&'a str, usize, usize, usize, usize);

fn sort_key(index: &Index, order: IndexOrder) -> SortKey<'_> {
    let scope = index.pid.scope.as_str();
    let site = index.pid.site;
    let (orbital, spin, nambu) = (
        index.fid.orbital,
        index.fid.spin,
        index.fid.nambu.as_index(),
    );
    match order {
        IndexOrder::NambuMajor => (scope, nambu, site, orbital, spin),
        IndexOrder::SiteMajor => (scope, site, orbital, spin, nambu),
        IndexOrder::SpinMajor => (scope, spin, site, orbital, nambu),
    }
}

/// A stable mapping from indices to matrix sequences.
#[derive(Debug, Clone)]
pub struct IndexTable {
    indices: Vec<Index>,
    seqs: HashMap<Index, usize>,
    mask_nambu: bool,
}

impl IndexTable {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn mask_nambu(&self) -> bool {
        self.mask_nambu
    }

    /// The sequence assigned to an index.
    ///
    /// In a Nambu-masked table the particle-hole character of the query is
    /// ignored.
    pub fn seq(&self, index: &Index) -> Result<usize, FockError> {
        let key = if self.mask_nambu && index.fid.nambu != Nambu::Annihilation {
            let mut normalized = index.clone();
            normalized.fid.nambu = Nambu::Annihilation;
            return self
                .seqs
                .get(&normalized)
                .copied()
                .ok_or_else(|| FockError::IndexNotInTable(index.clone()));
        } else {
            index
        };
        self.seqs
            .get(key)
            .copied()
            .ok_or_else(|| FockError::IndexNotInTable(index.clone()))
    }

    pub fn index(&self, seq: usize) -> &Index {
        &self.indices[seq]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Index> {
        self.indices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fock::dof::FockId;

    fn pids(n: usize) -> Vec<PointId> {
        (0..n).map(|i| PointId::new("C", i)).collect()
    }

    #[test]
    fn masked_table_has_one_sequence_per_state() {
        let config = DofConfig::uniform(&pids(2), FockDof::new(0, 1, 2, 2).unwrap());
        let table = config.table(IndexOrder::SiteMajor, true);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn unmasked_table_doubles_for_the_nambu_axis() {
        let config = DofConfig::uniform(&pids(2), FockDof::new(0, 1, 2, 2).unwrap());
        let table = config.table(IndexOrder::NambuMajor, false);
        assert_eq!(table.len(), 8);
    }

    #[test]
    fn nambu_major_order_puts_creation_indices_in_the_upper_block() {
        let config = DofConfig::uniform(&pids(2), FockDof::new(0, 1, 2, 2).unwrap());
        let table = config.table(IndexOrder::NambuMajor, false);
        let half = table.len() / 2;
        for seq in 0..half {
            assert_eq!(table.index(seq).fid.nambu, Nambu::Annihilation);
        }
        for seq in half..table.len() {
            assert_eq!(table.index(seq).fid.nambu, Nambu::Creation);
        }
    }

    #[test]
    fn spin_major_order_puts_spin_up_first() {
        let config = DofConfig::uniform(&pids(2), FockDof::default());
        let table = config.table(IndexOrder::SpinMajor, true);
        let half = table.len() / 2;
        for seq in 0..half {
            assert_eq!(table.index(seq).fid.spin, 0);
        }
        for seq in half..table.len() {
            assert_eq!(table.index(seq).fid.spin, 1);
        }
    }

    #[test]
    fn masked_table_resolves_creation_indices_to_their_state() {
        let config = DofConfig::uniform(&pids(1), FockDof::default());
        let table = config.table(IndexOrder::SiteMajor, true);
        let annihilation = Index::new(
            PointId::new("C", 0),
            FockId::new(0, 1, Nambu::Annihilation),
        );
        let creation = annihilation.dagger();
        assert_eq!(
            table.seq(&annihilation).unwrap(),
            table.seq(&creation).unwrap()
        );
    }

    #[test]
    fn unknown_index_is_an_error() {
        let config = DofConfig::uniform(&pids(1), FockDof::default());
        let table = config.table(IndexOrder::SiteMajor, true);
        let foreign = Index::new(PointId::new("X", 7), FockId::default());
        assert!(matches!(
            table.seq(&foreign),
            Err(FockError::IndexNotInTable(_))
        ));
    }
}
