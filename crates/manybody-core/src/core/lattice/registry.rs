use super::lattice::{Lattice, LatticeError};
use super::point::{Point, PointId};
use nalgebra::DVector;
use phf::phf_map;

const SQRT3_HALF: f64 = 0.8660254037844386;
const HONEYCOMB_B_Y: f64 = 0.2886751345948129;

/// A predefined cluster geometry: site coordinates plus the translation
/// vectors of the underlying Bravais lattice.
#[derive(Debug, Clone, Copy)]
pub struct ClusterPreset {
    pub rcoords: &'static [&'static [f64]],
    pub vectors: &'static [&'static [f64]],
}

/// Preset clusters for common geometries.
///
/// `L*` are linear chains, `S*` square clusters, `H*` honeycomb clusters and
/// `T1` the triangular unit cell. Site coordinates are in units of the
/// nearest Bravais-vector length.
pub static CLUSTER_PRESETS: phf::Map<&'static str, ClusterPreset> = phf_map! {
    "L1" => ClusterPreset {
        rcoords: &[&[0.0]],
        vectors: &[&[1.0]],
    },
    "L2" => ClusterPreset {
        rcoords: &[&[0.0], &[1.0]],
        vectors: &[&[2.0]],
    },
    "S1" => ClusterPreset {
        rcoords: &[&[0.0, 0.0]],
        vectors: &[&[1.0, 0.0], &[0.0, 1.0]],
    },
    "S2x2" => ClusterPreset {
        rcoords: &[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]],
        vectors: &[&[2.0, 0.0], &[0.0, 2.0]],
    },
    "T1" => ClusterPreset {
        rcoords: &[&[0.0, 0.0]],
        vectors: &[&[1.0, 0.0], &[0.5, SQRT3_HALF]],
    },
    "H2" => ClusterPreset {
        rcoords: &[&[0.0, 0.0], &[0.5, HONEYCOMB_B_Y]],
        vectors: &[&[1.0, 0.0], &[0.5, SQRT3_HALF]],
    },
    "H4" => ClusterPreset {
        rcoords: &[
            &[0.0, 0.0],
            &[0.5, HONEYCOMB_B_Y],
            &[0.5, SQRT3_HALF],
            &[1.0, SQRT3_HALF + HONEYCOMB_B_Y],
        ],
        vectors: &[&[1.0, 0.0], &[1.0, 2.0 * SQRT3_HALF]],
    },
    "H8P" => ClusterPreset {
        rcoords: &[
            &[0.0, 0.0],
            &[0.5, HONEYCOMB_B_Y],
            &[1.0, 0.0],
            &[1.5, HONEYCOMB_B_Y],
            &[0.5, SQRT3_HALF],
            &[1.0, SQRT3_HALF + HONEYCOMB_B_Y],
            &[1.5, SQRT3_HALF],
            &[2.0, SQRT3_HALF + HONEYCOMB_B_Y],
        ],
        vectors: &[&[2.0, 0.0], &[1.0, 2.0 * SQRT3_HALF]],
    },
};

/// Looks up a preset by name.
pub fn preset(name: &str) -> Option<&'static ClusterPreset> {
    CLUSTER_PRESETS.get(name)
}

impl ClusterPreset {
    /// The preset's points under the given scope, in site order.
    pub fn points(&self, scope: &str) -> Vec<Point> {
        self.rcoords
            .iter()
            .enumerate()
            .map(|(site, rcoord)| {
                Point::new(PointId::new(scope, site), DVector::from_column_slice(rcoord))
            })
            .collect()
    }

    /// A subset of the preset's points, renumbered in selection order.
    ///
    /// Useful for carving sublattices out of a larger preset cluster.
    pub fn select(&self, scope: &str, sites: &[usize]) -> Vec<Point> {
        sites
            .iter()
            .enumerate()
            .map(|(site, &original)| {
                Point::new(
                    PointId::new(scope, site),
                    DVector::from_column_slice(self.rcoords[original]),
                )
            })
            .collect()
    }

    pub fn translation_vectors(&self) -> Vec<DVector<f64>> {
        self.vectors
            .iter()
            .map(|v| DVector::from_column_slice(v))
            .collect()
    }

    /// Builds the periodic lattice of this preset.
    pub fn lattice(&self, name: &str, nneighbour: usize) -> Result<Lattice, LatticeError> {
        Lattice::new(
            name,
            self.points(name),
            self.translation_vectors(),
            nneighbour,
        )
    }

    /// Builds the preset as a finite cluster without translations.
    pub fn finite_cluster(&self, name: &str, nneighbour: usize) -> Result<Lattice, LatticeError> {
        Lattice::new(name, self.points(name), vec![], nneighbour)
    }
}
