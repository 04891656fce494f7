use super::bond::Bond;
use super::point::{Point, PointId};
use crate::core::utils::geometry::{self, GeometryError};
use itertools::Itertools;
use nalgebra::DVector;
use std::collections::HashMap;
use thiserror::Error;

/// Tolerance used when classifying bond lengths into neighbor shells.
const SHELL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("lattice '{0}' has no points")]
    Empty(String),

    #[error("duplicate point id {0}")]
    DuplicatePointId(PointId),

    #[error("point {id} has {got} coordinate components, expected {expected}")]
    InconsistentDimension {
        id: PointId,
        expected: usize,
        got: usize,
    },

    #[error("only {found} neighbor shells exist, but {requested} were requested")]
    InsufficientShells { found: usize, requested: usize },

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Tiles a cluster by integer combinations of translation vectors.
///
/// Each entry of `indices` is one translated copy; sites of the k-th copy are
/// offset by `k * cluster.len()` so ids stay unique. When `translate_icoord`
/// is set the translated points record the applied displacement as their
/// lattice-space coordinate. The returned map sends every new id to the id of
/// the original point it came from.
pub fn tiling(
    cluster: &[Point],
    vectors: &[DVector<f64>],
    indices: &[Vec<i64>],
    translate_icoord: bool,
) -> (Vec<Point>, HashMap<PointId, PointId>) {
    let mut supercluster = Vec::with_capacity(cluster.len() * indices.len());
    let mut map = HashMap::new();
    let increment = cluster.len();

    for (copy, index) in indices.iter().enumerate() {
        let displacement = displacement_of(index, vectors, cluster);
        for point in cluster {
            let id = PointId::new(point.id.scope.clone(), point.id.site + copy * increment);
            map.insert(id.clone(), point.id.clone());
            let rcoord = &point.rcoord + &displacement;
            let icoord = if translate_icoord {
                &point.icoord + &displacement
            } else {
                point.icoord.clone()
            };
            supercluster.push(Point::with_icoord(id, rcoord, icoord));
        }
    }
    (supercluster, map)
}

fn displacement_of(index: &[i64], vectors: &[DVector<f64>], cluster: &[Point]) -> DVector<f64> {
    let dim = cluster.first().map(|p| p.rcoord.len()).unwrap_or(0);
    let mut displacement = DVector::zeros(dim);
    for (&coefficient, vector) in index.iter().zip(vectors) {
        displacement += vector * coefficient as f64;
    }
    displacement
}

/// Finds all bonds of a cluster up to the `nneighbour`-th shell.
///
/// Periodic images along the translation vectors are included, so bonds that
/// leave the home cluster carry the connecting translation as the end point's
/// lattice-space coordinate. Every undirected bond is reported exactly once;
/// zeroth-order self bonds are reported for every point.
pub fn neighbor_bonds(
    cluster: &[Point],
    vectors: &[DVector<f64>],
    nneighbour: usize,
) -> Result<Vec<Bond>, LatticeError> {
    let images = periodic_images(cluster, vectors, nneighbour);

    let mut distances: Vec<f64> = Vec::new();
    for point in cluster {
        for image in &images {
            let d = (&point.rcoord - &image.rcoord).norm();
            if d > SHELL_TOLERANCE {
                distances.push(d);
            }
        }
    }
    distances.sort_by(f64::total_cmp);
    let mut shells: Vec<f64> = Vec::new();
    for d in distances {
        match shells.last() {
            Some(&last) if (d - last).abs() < SHELL_TOLERANCE => {}
            _ => shells.push(d),
        }
        if shells.len() == nneighbour {
            break;
        }
    }
    if shells.len() < nneighbour {
        return Err(LatticeError::InsufficientShells {
            found: shells.len(),
            requested: nneighbour,
        });
    }

    let mut bonds: Vec<Bond> = cluster
        .iter()
        .map(|p| Bond::new(0, p.clone(), p.clone()))
        .collect();
    for point in cluster {
        for image in &images {
            let d = (&point.rcoord - &image.rcoord).norm();
            if d < SHELL_TOLERANCE {
                continue;
            }
            let Some(shell) = shells
                .iter()
                .position(|&s| (d - s).abs() < SHELL_TOLERANCE)
            else {
                continue;
            };
            if is_representative(point, image) {
                bonds.push(Bond::new(shell + 1, point.clone(), image.clone()));
            }
        }
    }
    Ok(bonds)
}

/// Keeps one representative out of every pair of mutually reversed bonds.
///
/// Intra-cluster bonds are kept in ascending id order; bonds into another
/// cell are kept when the connecting translation points into the positive
/// half-space (its first nonzero component is positive).
fn is_representative(start: &Point, end: &Point) -> bool {
    let icoord = &end.icoord - &start.icoord;
    match icoord.iter().find(|c| c.abs() > SHELL_TOLERANCE) {
        None => (&start.id.scope, start.id.site) < (&end.id.scope, end.id.site),
        Some(&component) => component > 0.0,
    }
}

fn periodic_images(
    cluster: &[Point],
    vectors: &[DVector<f64>],
    nneighbour: usize,
) -> Vec<Point> {
    if vectors.is_empty() {
        return cluster.to_vec();
    }
    let reach = nneighbour as i64 + 1;
    let ranges = vec![(-reach..=reach).collect::<Vec<i64>>(); vectors.len()];
    let indices: Vec<Vec<i64>> = ranges
        .into_iter()
        .multi_cartesian_product()
        .collect();

    let mut images = Vec::with_capacity(cluster.len() * indices.len());
    for index in &indices {
        let displacement = displacement_of(index, vectors, cluster);
        for point in cluster {
            images.push(Point::with_icoord(
                point.id.clone(),
                &point.rcoord + &displacement,
                &point.icoord + &displacement,
            ));
        }
    }
    images
}

/// A unified description of 1D to 3D lattice systems.
#[derive(Debug, Clone)]
pub struct Lattice {
    name: String,
    points: Vec<Point>,
    vectors: Vec<DVector<f64>>,
    reciprocals: Vec<DVector<f64>>,
    nneighbour: usize,
    bonds: Vec<Bond>,
}

impl Lattice {
    /// Builds a lattice from its points and translation vectors, searching
    /// all bonds up to the `nneighbour`-th shell.
    pub fn new(
        name: impl Into<String>,
        points: Vec<Point>,
        vectors: Vec<DVector<f64>>,
        nneighbour: usize,
    ) -> Result<Self, LatticeError> {
        let name = name.into();
        if points.is_empty() {
            return Err(LatticeError::Empty(name));
        }
        let dim = points[0].rcoord.len();
        let mut seen = std::collections::HashSet::new();
        for point in &points {
            if point.rcoord.len() != dim {
                return Err(LatticeError::InconsistentDimension {
                    id: point.id.clone(),
                    expected: dim,
                    got: point.rcoord.len(),
                });
            }
            if !seen.insert(point.id.clone()) {
                return Err(LatticeError::DuplicatePointId(point.id.clone()));
            }
        }
        let reciprocals = geometry::reciprocals(&vectors)?;
        let bonds = neighbor_bonds(&points, &vectors, nneighbour)?;
        Ok(Self {
            name,
            points,
            vectors,
            reciprocals,
            nneighbour,
            bonds,
        })
    }

    /// Merges the points of several lattices into one composite lattice.
    ///
    /// Point ids keep their original scopes, so the sublattice structure
    /// stays visible in the composed system.
    pub fn compose(
        name: impl Into<String>,
        parts: &[&Lattice],
        vectors: Vec<DVector<f64>>,
        nneighbour: usize,
    ) -> Result<Self, LatticeError> {
        let points = parts
            .iter()
            .flat_map(|l| l.points.iter().cloned())
            .collect();
        Self::new(name, points, vectors, nneighbour)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, id: &PointId) -> Option<&Point> {
        self.points.iter().find(|p| &p.id == id)
    }

    /// The ids of all points, in their defining order.
    pub fn pids(&self) -> Vec<PointId> {
        self.points.iter().map(|p| p.id.clone()).collect()
    }

    pub fn vectors(&self) -> &[DVector<f64>] {
        &self.vectors
    }

    pub fn reciprocals(&self) -> &[DVector<f64>] {
        &self.reciprocals
    }

    pub fn nneighbour(&self) -> usize {
        self.nneighbour
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dvec(components: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(components)
    }

    fn chain_points(n: usize) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(PointId::new("C", i), dvec(&[i as f64])))
            .collect()
    }

    #[test]
    fn tiling_offsets_sites_per_copy_and_maps_back() {
        let cluster = chain_points(2);
        let indices = vec![vec![0], vec![1]];
        let (supercluster, map) = tiling(&cluster, &[dvec(&[2.0])], &indices, false);
        assert_eq!(supercluster.len(), 4);
        assert_eq!(supercluster[2].id.site, 2);
        assert!((supercluster[2].rcoord[0] - 2.0).abs() < 1e-12);
        assert_eq!(map[&PointId::new("C", 3)], PointId::new("C", 1));
    }

    #[test]
    fn tiling_with_icoord_translation_records_displacement() {
        let cluster = chain_points(1);
        let (supercluster, _) = tiling(&cluster, &[dvec(&[2.0])], &[vec![1]], true);
        assert!((supercluster[0].icoord[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn chain_lattice_has_self_and_nearest_neighbour_bonds() {
        let lattice = Lattice::new("chain", chain_points(2), vec![dvec(&[2.0])], 1).unwrap();
        let self_bonds = lattice.bonds().iter().filter(|b| b.neighbour == 0).count();
        let nn_bonds = lattice.bonds().iter().filter(|b| b.neighbour == 1).count();
        assert_eq!(self_bonds, 2);
        assert_eq!(nn_bonds, 2);
    }

    #[test]
    fn chain_inter_cell_bond_carries_positive_translation() {
        let lattice = Lattice::new("chain", chain_points(2), vec![dvec(&[2.0])], 1).unwrap();
        let inter: Vec<_> = lattice
            .bonds()
            .iter()
            .filter(|b| b.neighbour == 1 && !b.is_intra_cell())
            .collect();
        assert_eq!(inter.len(), 1);
        assert!((inter[0].icoord()[0] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn square_lattice_bond_counts_per_shell() {
        let points = vec![Point::new(PointId::new("S", 0), dvec(&[0.0, 0.0]))];
        let vectors = vec![dvec(&[1.0, 0.0]), dvec(&[0.0, 1.0])];
        let lattice = Lattice::new("square", points, vectors, 2).unwrap();
        let first = lattice.bonds().iter().filter(|b| b.neighbour == 1).count();
        let second = lattice.bonds().iter().filter(|b| b.neighbour == 2).count();
        assert_eq!(first, 2);
        assert_eq!(second, 2);
    }

    #[test]
    fn honeycomb_cell_has_three_nearest_neighbour_bonds() {
        let points = vec![
            Point::new(PointId::new("H", 0), dvec(&[0.0, 0.0])),
            Point::new(PointId::new("H", 1), dvec(&[0.5, 0.2886751345948129])),
        ];
        let vectors = vec![dvec(&[1.0, 0.0]), dvec(&[0.5, 0.8660254037844386])];
        let lattice = Lattice::new("honeycomb", points, vectors, 1).unwrap();
        let nn = lattice.bonds().iter().filter(|b| b.neighbour == 1).count();
        assert_eq!(nn, 3);
    }

    #[test]
    fn finite_cluster_without_vectors_finds_intra_bonds_only() {
        let lattice = Lattice::new("open-chain", chain_points(3), vec![], 1).unwrap();
        let nn: Vec<_> = lattice
            .bonds()
            .iter()
            .filter(|b| b.neighbour == 1)
            .collect();
        assert_eq!(nn.len(), 2);
        assert!(nn.iter().all(|b| b.is_intra_cell()));
    }

    #[test]
    fn requesting_more_shells_than_exist_is_an_error() {
        let result = Lattice::new("single", chain_points(1), vec![], 1);
        assert!(matches!(
            result,
            Err(LatticeError::InsufficientShells { .. })
        ));
    }

    #[test]
    fn duplicate_point_ids_are_rejected() {
        let points = vec![
            Point::new(PointId::new("C", 0), dvec(&[0.0])),
            Point::new(PointId::new("C", 0), dvec(&[1.0])),
        ];
        let result = Lattice::new("bad", points, vec![], 1);
        assert!(matches!(result, Err(LatticeError::DuplicatePointId(_))));
    }

    #[test]
    fn compose_merges_sublattice_points_with_scopes() {
        let a = Lattice::new(
            "A",
            vec![Point::new(PointId::new("A", 0), dvec(&[0.0]))],
            vec![],
            0,
        )
        .unwrap();
        let b = Lattice::new(
            "B",
            vec![Point::new(PointId::new("B", 0), dvec(&[1.0]))],
            vec![],
            0,
        )
        .unwrap();
        let merged = Lattice::compose("AB", &[&a, &b], vec![dvec(&[2.0])], 1).unwrap();
        assert_eq!(merged.points().len(), 2);
        assert!(merged.point(&PointId::new("B", 0)).is_some());
    }
}
