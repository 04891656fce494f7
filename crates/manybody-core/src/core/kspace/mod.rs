//! Parameter spaces and Brillouin-zone meshes.
//!
//! A [`ParamSpace`] is a tagged list of meshes: scalar meshes for term
//! parameters (interaction scans) and vector meshes for k-points. Solvers
//! iterate over it in direct-product or zipped mode and receive tag/value
//! samples. Constructors for uniform reciprocal-cell meshes and
//! high-symmetry paths live here as well.

use crate::core::utils::geometry;
use itertools::Itertools;
use nalgebra::DVector;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KspaceError {
    #[error("no axis tagged '{0}'")]
    TagNotFound(String),

    #[error("zipped iteration requires equal ranks, got {0:?}")]
    ZipRankMismatch(Vec<usize>),

    #[error("a path needs at least two corners, got {0}")]
    DegeneratePath(usize),
}

/// The sample points of one axis.
#[derive(Debug, Clone)]
pub enum Mesh {
    Scalars(Vec<f64>),
    Vectors(Vec<DVector<f64>>),
}

impl Mesh {
    pub fn len(&self) -> usize {
        match self {
            Mesh::Scalars(v) => v.len(),
            Mesh::Vectors(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value(&self, i: usize) -> SampleValue {
        match self {
            Mesh::Scalars(v) => SampleValue::Scalar(v[i]),
            Mesh::Vectors(v) => SampleValue::Vector(v[i].clone()),
        }
    }
}

/// One tagged axis of a parameter space.
#[derive(Debug, Clone)]
pub struct Axis {
    pub tag: String,
    pub mesh: Mesh,
    pub volume: Option<f64>,
}

/// A single coordinate of a sample.
#[derive(Debug, Clone)]
pub enum SampleValue {
    Scalar(f64),
    Vector(DVector<f64>),
}

impl SampleValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            SampleValue::Scalar(v) => Some(*v),
            SampleValue::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&DVector<f64>> {
        match self {
            SampleValue::Scalar(_) => None,
            SampleValue::Vector(v) => Some(v),
        }
    }
}

/// One point of a parameter space: tag/value assignments per axis.
#[derive(Debug, Clone)]
pub struct Sample {
    entries: Vec<(String, SampleValue)>,
}

impl Sample {
    pub fn get(&self, tag: &str) -> Option<&SampleValue> {
        self.entries
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SampleValue)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v))
    }
}

/// How to combine several axes into samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterMode {
    /// Direct product of all meshes.
    Product,
    /// Zip meshes of equal rank point by point.
    Zip,
}

/// A unified description of parameter spaces.
#[derive(Debug, Clone)]
pub struct ParamSpace {
    axes: Vec<Axis>,
}

impl ParamSpace {
    pub fn new(axes: Vec<Axis>) -> Self {
        Self { axes }
    }

    pub fn single(tag: impl Into<String>, mesh: Mesh, volume: Option<f64>) -> Self {
        Self::new(vec![Axis {
            tag: tag.into(),
            mesh,
            volume,
        }])
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.axes.iter().map(|a| a.tag.as_str())
    }

    fn axis(&self, tag: &str) -> Result<&Axis, KspaceError> {
        self.axes
            .iter()
            .find(|a| a.tag == tag)
            .ok_or_else(|| KspaceError::TagNotFound(tag.to_string()))
    }

    /// Number of sample points of the tagged axis.
    pub fn rank(&self, tag: &str) -> Result<usize, KspaceError> {
        Ok(self.axis(tag)?.mesh.len())
    }

    pub fn mesh(&self, tag: &str) -> Result<&Mesh, KspaceError> {
        Ok(&self.axis(tag)?.mesh)
    }

    pub fn volume(&self, tag: &str) -> Result<Option<f64>, KspaceError> {
        Ok(self.axis(tag)?.volume)
    }

    /// Total number of samples under the given iteration mode.
    pub fn len(&self, mode: IterMode) -> usize {
        match mode {
            IterMode::Product => self.axes.iter().map(|a| a.mesh.len()).product(),
            IterMode::Zip => self.axes.first().map(|a| a.mesh.len()).unwrap_or(0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }

    /// Materializes all samples in the given iteration mode.
    pub fn samples(&self, mode: IterMode) -> Result<Vec<Sample>, KspaceError> {
        match mode {
            IterMode::Product => {
                let ranges: Vec<Vec<usize>> =
                    self.axes.iter().map(|a| (0..a.mesh.len()).collect()).collect();
                Ok(ranges
                    .into_iter()
                    .multi_cartesian_product()
                    .map(|positions| Sample {
                        entries: self
                            .axes
                            .iter()
                            .zip(&positions)
                            .map(|(axis, &i)| (axis.tag.clone(), axis.mesh.value(i)))
                            .collect(),
                    })
                    .collect())
            }
            IterMode::Zip => {
                let ranks: Vec<usize> = self.axes.iter().map(|a| a.mesh.len()).collect();
                if ranks.windows(2).any(|w| w[0] != w[1]) {
                    return Err(KspaceError::ZipRankMismatch(ranks));
                }
                let n = ranks.first().copied().unwrap_or(0);
                Ok((0..n)
                    .map(|i| Sample {
                        entries: self
                            .axes
                            .iter()
                            .map(|axis| (axis.tag.clone(), axis.mesh.value(i)))
                            .collect(),
                    })
                    .collect())
            }
        }
    }
}

fn cell_volume(reciprocals: &[DVector<f64>]) -> f64 {
    match reciprocals.len() {
        1 => reciprocals[0].norm(),
        2 => {
            let zero = DVector::zeros(3);
            let pad = |v: &DVector<f64>| {
                let mut p = zero.clone();
                for (i, x) in v.iter().enumerate() {
                    p[i] = *x;
                }
                p
            };
            let (a, b) = (pad(&reciprocals[0]), pad(&reciprocals[1]));
            (a[0] * b[1] - a[1] * b[0]).hypot(a[1] * b[2] - a[2] * b[1]).hypot(a[2] * b[0] - a[0] * b[2])
        }
        3 => geometry::volume(&reciprocals[0], &reciprocals[1], &reciprocals[2])
            .map(f64::abs)
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// A uniform mesh over a region of the reciprocal cell, tagged `k`.
///
/// `segments` gives the fractional start/stop along each reciprocal vector
/// (default `-1/2..1/2`); with `end` the endpoint is included.
pub fn kspace(
    reciprocals: &[DVector<f64>],
    nk: usize,
    segments: Option<&[(f64, f64)]>,
    end: bool,
) -> ParamSpace {
    let nvectors = reciprocals.len();
    let default_segments = vec![(-0.5, 0.5); nvectors];
    let segments = segments.unwrap_or(&default_segments);
    let divisor = if end {
        nk.saturating_sub(1).max(1)
    } else {
        nk.max(1)
    } as f64;

    let ranges: Vec<Vec<usize>> = (0..nvectors).map(|_| (0..nk).collect()).collect();
    let mesh: Vec<DVector<f64>> = ranges
        .into_iter()
        .multi_cartesian_product()
        .map(|pos| {
            let dim = reciprocals[0].len();
            let mut k = DVector::zeros(dim);
            for (((a, b), &i), reciprocal) in
                segments.iter().zip(&pos).zip(reciprocals)
            {
                k += reciprocal * (a + (b - a) * i as f64 / divisor);
            }
            k
        })
        .collect();

    ParamSpace::single("k", Mesh::Vectors(mesh), Some(cell_volume(reciprocals)))
}

/// A one-axis time space tagged `t`.
pub fn tspace(mesh: Vec<f64>) -> ParamSpace {
    let volume = mesh
        .iter()
        .fold(None::<(f64, f64)>, |acc, &v| {
            Some(match acc {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            })
        })
        .map(|(lo, hi)| hi - lo);
    ParamSpace::single("t", Mesh::Scalars(mesh), volume)
}

/// A piecewise-linear path through the reciprocal cell, tagged `k`.
///
/// Corners are fractional coordinates in the reciprocal basis; each segment
/// is sampled with `nk` points, the last corner is included.
pub fn path(
    reciprocals: &[DVector<f64>],
    corners: &[&[f64]],
    nk: usize,
) -> Result<ParamSpace, KspaceError> {
    if corners.len() < 2 {
        return Err(KspaceError::DegeneratePath(corners.len()));
    }
    let to_cartesian = |fractional: &[f64]| {
        let dim = reciprocals[0].len();
        let mut k = DVector::zeros(dim);
        for (coefficient, reciprocal) in fractional.iter().zip(reciprocals) {
            k += reciprocal * *coefficient;
        }
        k
    };
    let mut mesh = Vec::with_capacity((corners.len() - 1) * nk + 1);
    for window in corners.windows(2) {
        let (from, to) = (to_cartesian(window[0]), to_cartesian(window[1]));
        for i in 0..nk {
            let fraction = i as f64 / nk as f64;
            mesh.push(&from + (&to - &from) * fraction);
        }
    }
    mesh.push(to_cartesian(corners[corners.len() - 1]));
    Ok(ParamSpace::single("k", Mesh::Vectors(mesh), None))
}

/// The Gamma-X-M-Gamma path of a square reciprocal cell.
pub fn square_gxm(reciprocals: &[DVector<f64>], nk: usize) -> Result<ParamSpace, KspaceError> {
    path(
        reciprocals,
        &[&[0.0, 0.0], &[0.5, 0.0], &[0.5, 0.5], &[0.0, 0.0]],
        nk,
    )
}

/// The Gamma-K-M-Gamma path of a hexagonal reciprocal cell.
pub fn hexagon_gkm(reciprocals: &[DVector<f64>], nk: usize) -> Result<ParamSpace, KspaceError> {
    path(
        reciprocals,
        &[
            &[0.0, 0.0],
            &[2.0 / 3.0, 1.0 / 3.0],
            &[0.5, 0.0],
            &[0.0, 0.0],
        ],
        nk,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn dvec(components: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(components)
    }

    #[test]
    fn product_iteration_covers_all_combinations() {
        let space = ParamSpace::new(vec![
            Axis {
                tag: "U".into(),
                mesh: Mesh::Scalars(vec![0.0, 1.0]),
                volume: None,
            },
            Axis {
                tag: "mu".into(),
                mesh: Mesh::Scalars(vec![0.0, 0.5, 1.0]),
                volume: None,
            },
        ]);
        let samples = space.samples(IterMode::Product).unwrap();
        assert_eq!(samples.len(), 6);
        assert_eq!(space.len(IterMode::Product), 6);
    }

    #[test]
    fn zip_iteration_requires_equal_ranks() {
        let space = ParamSpace::new(vec![
            Axis {
                tag: "U".into(),
                mesh: Mesh::Scalars(vec![0.0, 1.0]),
                volume: None,
            },
            Axis {
                tag: "mu".into(),
                mesh: Mesh::Scalars(vec![0.0]),
                volume: None,
            },
        ]);
        assert!(matches!(
            space.samples(IterMode::Zip),
            Err(KspaceError::ZipRankMismatch(_))
        ));
    }

    #[test]
    fn kspace_mesh_has_nk_to_the_dimension_points() {
        let reciprocals = vec![dvec(&[2.0 * PI, 0.0]), dvec(&[0.0, 2.0 * PI])];
        let space = kspace(&reciprocals, 4, None, false);
        assert_eq!(space.rank("k").unwrap(), 16);
        assert!((space.volume("k").unwrap().unwrap() - (2.0 * PI) * (2.0 * PI)).abs() < 1e-9);
    }

    #[test]
    fn kspace_samples_stay_inside_the_default_segments() {
        let reciprocals = vec![dvec(&[2.0 * PI])];
        let space = kspace(&reciprocals, 8, None, false);
        let Mesh::Vectors(mesh) = space.mesh("k").unwrap() else {
            panic!("k mesh must be vectorial");
        };
        for k in mesh {
            assert!(k[0] >= -PI - 1e-9 && k[0] < PI);
        }
    }

    #[test]
    fn path_visits_every_corner() {
        let reciprocals = vec![dvec(&[2.0 * PI, 0.0]), dvec(&[0.0, 2.0 * PI])];
        let space = square_gxm(&reciprocals, 10).unwrap();
        let Mesh::Vectors(mesh) = space.mesh("k").unwrap() else {
            panic!("k mesh must be vectorial");
        };
        assert_eq!(mesh.len(), 31);
        assert!((&mesh[10] - dvec(&[PI, 0.0])).norm() < 1e-9);
        assert!((&mesh[20] - dvec(&[PI, PI])).norm() < 1e-9);
        assert!(mesh[30].norm() < 1e-9);
    }

    #[test]
    fn tspace_records_the_mesh_extent_as_volume() {
        let space = tspace(vec![0.0, 0.5, 2.0]);
        assert!((space.volume("t").unwrap().unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let space = tspace(vec![0.0]);
        assert!(matches!(
            space.rank("k"),
            Err(KspaceError::TagNotFound(_))
        ));
    }
}
