use nalgebra::{DVector, Matrix3, Vector3};
use std::f64::consts::PI;
use thiserror::Error;

/// Tolerance below which two coordinates are considered identical.
pub const COORD_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("expected a 3-component vector, got {0} components")]
    NotThreeDimensional(usize),

    #[error("vector dimensions do not match: {0} vs {1}")]
    DimensionMismatch(usize, usize),

    #[error("vector dimension {0} is not supported here (must be 1 to 3)")]
    UnsupportedDimension(usize),

    #[error("at most 3 translation vectors are supported, got {0}")]
    TooManyVectors(usize),

    #[error("translation vectors are linearly dependent")]
    SingularVectors,
}

/// Relative orientation of two vectors, within [`COORD_TOLERANCE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parallelism {
    Parallel,
    AntiParallel,
    No,
}

/// Azimuth of a vector in radians, in `[0, 2*pi)`.
///
/// The azimuth is measured from the x-axis in the x-y plane; vectors with a
/// negative y-component map to the upper half of the range.
pub fn azimuth(v: &DVector<f64>) -> f64 {
    let y = if v.len() > 1 { v[1] } else { 0.0 };
    let angle = (v[0] / v.norm()).acos();
    if y >= 0.0 { angle } else { 2.0 * PI - angle }
}

/// Azimuth of a vector in degrees, in `[0, 360)`.
pub fn azimuth_degrees(v: &DVector<f64>) -> f64 {
    azimuth(v).to_degrees()
}

/// Polar angle of a 3-component vector in radians.
pub fn polar(v: &DVector<f64>) -> Result<f64, GeometryError> {
    if v.len() != 3 {
        return Err(GeometryError::NotThreeDimensional(v.len()));
    }
    Ok((v[2] / v.norm()).acos())
}

/// Polar angle of a 3-component vector in degrees.
pub fn polar_degrees(v: &DVector<f64>) -> Result<f64, GeometryError> {
    polar(v).map(f64::to_degrees)
}

fn embed3(v: &DVector<f64>) -> Result<Vector3<f64>, GeometryError> {
    match v.len() {
        1 => Ok(Vector3::new(v[0], 0.0, 0.0)),
        2 => Ok(Vector3::new(v[0], v[1], 0.0)),
        3 => Ok(Vector3::new(v[0], v[1], v[2])),
        n => Err(GeometryError::UnsupportedDimension(n)),
    }
}

/// Volume spanned by three vectors.
///
/// Vectors with fewer than three components span zero volume.
pub fn volume(
    a: &DVector<f64>,
    b: &DVector<f64>,
    c: &DVector<f64>,
) -> Result<f64, GeometryError> {
    if a.len() < 3 || b.len() < 3 || c.len() < 3 {
        embed3(a)?;
        embed3(b)?;
        embed3(c)?;
        return Ok(0.0);
    }
    let (a, b, c) = (embed3(a)?, embed3(b)?, embed3(c)?);
    Ok(a.dot(&b.cross(&c)))
}

/// Judges whether two vectors are parallel, anti-parallel, or neither.
///
/// Zero vectors count as parallel to everything.
pub fn is_parallel(a: &DVector<f64>, b: &DVector<f64>) -> Result<Parallelism, GeometryError> {
    let (na, nb) = (a.norm(), b.norm());
    if na < COORD_TOLERANCE || nb < COORD_TOLERANCE {
        return Ok(Parallelism::Parallel);
    }
    if a.len() != b.len() {
        return Err(GeometryError::DimensionMismatch(a.len(), b.len()));
    }
    let cosine = a.dot(b) / (na * nb);
    if (cosine - 1.0).abs() < COORD_TOLERANCE {
        Ok(Parallelism::Parallel)
    } else if (cosine + 1.0).abs() < COORD_TOLERANCE {
        Ok(Parallelism::AntiParallel)
    } else {
        Ok(Parallelism::No)
    }
}

/// Returns the reciprocal vectors dual to the input translation vectors.
///
/// For a single vector the dual is `2*pi * v / |v|^2`; for two or three
/// vectors the duals are the rows of the inverted column matrix scaled by
/// `2*pi`, truncated back to the input dimension.
pub fn reciprocals(vectors: &[DVector<f64>]) -> Result<Vec<DVector<f64>>, GeometryError> {
    match vectors.len() {
        0 => Ok(Vec::new()),
        1 => {
            let v = &vectors[0];
            Ok(vec![v * (2.0 * PI / v.norm_squared())])
        }
        n @ (2 | 3) => {
            let ndim = vectors[0].len();
            for v in vectors {
                if v.len() != ndim {
                    return Err(GeometryError::DimensionMismatch(ndim, v.len()));
                }
            }
            let mut columns = Matrix3::<f64>::zeros();
            columns.set_column(0, &embed3(&vectors[0])?);
            columns.set_column(1, &embed3(&vectors[1])?);
            if n == 2 {
                let cross = embed3(&vectors[0])?.cross(&embed3(&vectors[1])?);
                columns.set_column(2, &cross);
            } else {
                columns.set_column(2, &embed3(&vectors[2])?);
            }
            let inverse = columns
                .try_inverse()
                .ok_or(GeometryError::SingularVectors)?;
            Ok((0..n)
                .map(|i| {
                    DVector::from_iterator(ndim, (0..ndim).map(|d| inverse[(i, d)] * 2.0 * PI))
                })
                .collect())
        }
        n => Err(GeometryError::TooManyVectors(n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn dvec(components: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(components)
    }

    #[test]
    fn azimuth_of_positive_y_vector_is_in_lower_half_range() {
        let angle = azimuth(&dvec(&[1.0, 1.0]));
        assert!(f64_approx_equal(angle, PI / 4.0));
    }

    #[test]
    fn azimuth_of_negative_y_vector_is_in_upper_half_range() {
        let angle = azimuth(&dvec(&[0.0, -1.0]));
        assert!(f64_approx_equal(angle, 1.5 * PI));
    }

    #[test]
    fn azimuth_degrees_of_negative_x_vector_is_180() {
        assert!(f64_approx_equal(azimuth_degrees(&dvec(&[-1.0, 0.0])), 180.0));
    }

    #[test]
    fn polar_of_z_axis_vector_is_zero() {
        let angle = polar(&dvec(&[0.0, 0.0, 2.0])).unwrap();
        assert!(f64_approx_equal(angle, 0.0));
    }

    #[test]
    fn polar_of_two_component_vector_is_an_error() {
        let result = polar(&dvec(&[1.0, 0.0]));
        assert_eq!(result, Err(GeometryError::NotThreeDimensional(2)));
    }

    #[test]
    fn volume_of_unit_cube_vectors_is_one() {
        let v = volume(
            &dvec(&[1.0, 0.0, 0.0]),
            &dvec(&[0.0, 1.0, 0.0]),
            &dvec(&[0.0, 0.0, 1.0]),
        )
        .unwrap();
        assert!(f64_approx_equal(v, 1.0));
    }

    #[test]
    fn volume_of_low_dimensional_vectors_is_zero() {
        let v = volume(&dvec(&[1.0, 0.0]), &dvec(&[0.0, 1.0]), &dvec(&[1.0, 1.0])).unwrap();
        assert!(f64_approx_equal(v, 0.0));
    }

    #[test]
    fn parallel_vectors_are_detected() {
        let p = is_parallel(&dvec(&[1.0, 2.0]), &dvec(&[2.0, 4.0])).unwrap();
        assert_eq!(p, Parallelism::Parallel);
    }

    #[test]
    fn anti_parallel_vectors_are_detected() {
        let p = is_parallel(&dvec(&[1.0, 0.0]), &dvec(&[-3.0, 0.0])).unwrap();
        assert_eq!(p, Parallelism::AntiParallel);
    }

    #[test]
    fn oblique_vectors_are_not_parallel() {
        let p = is_parallel(&dvec(&[1.0, 0.0]), &dvec(&[1.0, 1.0])).unwrap();
        assert_eq!(p, Parallelism::No);
    }

    #[test]
    fn zero_vector_is_parallel_to_everything() {
        let p = is_parallel(&dvec(&[0.0, 0.0]), &dvec(&[1.0, 1.0])).unwrap();
        assert_eq!(p, Parallelism::Parallel);
    }

    #[test]
    fn mismatched_dimensions_are_an_error() {
        let result = is_parallel(&dvec(&[1.0, 0.0]), &dvec(&[1.0, 0.0, 0.0]));
        assert_eq!(result, Err(GeometryError::DimensionMismatch(2, 3)));
    }

    #[test]
    fn reciprocal_of_single_vector_scales_with_inverse_length() {
        let duals = reciprocals(&[dvec(&[2.0, 0.0])]).unwrap();
        assert!(f64_approx_equal(duals[0][0], PI));
        assert!(f64_approx_equal(duals[0][1], 0.0));
    }

    #[test]
    fn reciprocals_of_square_vectors_are_orthogonal_duals() {
        let duals = reciprocals(&[dvec(&[1.0, 0.0]), dvec(&[0.0, 1.0])]).unwrap();
        assert!(f64_approx_equal(duals[0][0], 2.0 * PI));
        assert!(f64_approx_equal(duals[0][1], 0.0));
        assert!(f64_approx_equal(duals[1][1], 2.0 * PI));
    }

    #[test]
    fn reciprocals_satisfy_duality_for_oblique_vectors() {
        let a1 = dvec(&[1.0, 0.0]);
        let a2 = dvec(&[0.5, 0.8660254037844386]);
        let duals = reciprocals(&[a1.clone(), a2.clone()]).unwrap();
        assert!(f64_approx_equal(a1.dot(&duals[0]), 2.0 * PI));
        assert!(f64_approx_equal(a1.dot(&duals[1]), 0.0));
        assert!(f64_approx_equal(a2.dot(&duals[1]), 2.0 * PI));
        assert!(f64_approx_equal(a2.dot(&duals[0]), 0.0));
    }

    #[test]
    fn more_than_three_vectors_is_an_error() {
        let vs: Vec<_> = (0..4).map(|_| dvec(&[1.0, 0.0, 0.0])).collect();
        assert_eq!(reciprocals(&vs), Err(GeometryError::TooManyVectors(4)));
    }
}
