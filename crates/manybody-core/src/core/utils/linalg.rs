use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;

/// Eigendecomposition of a Hermitian matrix with eigenvalues sorted ascending.
///
/// Columns of the returned matrix are the eigenvectors in the same order.
pub fn hermitian_eigen(matrix: DMatrix<Complex64>) -> (DVector<f64>, DMatrix<Complex64>) {
    let eigen = nalgebra::SymmetricEigen::new(matrix);
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[i].total_cmp(&eigen.eigenvalues[j]));
    let values = DVector::from_iterator(order.len(), order.iter().map(|&i| eigen.eigenvalues[i]));
    let vectors = DMatrix::from_columns(
        &order
            .iter()
            .map(|&i| eigen.eigenvectors.column(i).into_owned())
            .collect::<Vec<_>>(),
    );
    (values, vectors)
}

/// Eigenvalues of a Hermitian matrix, sorted ascending.
pub fn hermitian_eigenvalues(matrix: DMatrix<Complex64>) -> DVector<f64> {
    let eigen = nalgebra::SymmetricEigen::new(matrix);
    let mut values: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
    values.sort_by(f64::total_cmp);
    DVector::from_vec(values)
}

/// Eigendecomposition of a real symmetric matrix, eigenvalues ascending.
pub fn symmetric_eigen(matrix: DMatrix<f64>) -> (DVector<f64>, DMatrix<f64>) {
    let eigen = nalgebra::SymmetricEigen::new(matrix);
    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[i].total_cmp(&eigen.eigenvalues[j]));
    let values = DVector::from_iterator(order.len(), order.iter().map(|&i| eigen.eigenvalues[i]));
    let vectors = DMatrix::from_columns(
        &order
            .iter()
            .map(|&i| eigen.eigenvectors.column(i).into_owned())
            .collect::<Vec<_>>(),
    );
    (values, vectors)
}

/// Result of a truncated singular value decomposition.
#[derive(Debug, Clone)]
pub struct TruncatedSvd {
    pub u: DMatrix<f64>,
    pub singular_values: DVector<f64>,
    pub v_t: DMatrix<f64>,
    /// Relative weight of the discarded singular values,
    /// `sum(dropped s^2) / sum(all s^2)`.
    pub truncation_error: f64,
}

/// Singular value decomposition truncated to at most `nmax` values.
///
/// Singular values below `tol` are discarded as well, but at least one value
/// is always kept.
pub fn svd_truncated(matrix: &DMatrix<f64>, nmax: usize, tol: f64) -> TruncatedSvd {
    let nmax = nmax.max(1);
    let svd = matrix.clone().svd(true, true);
    let u = svd.u.unwrap();
    let v_t = svd.v_t.unwrap();
    let singular = svd.singular_values;

    let mut order: Vec<usize> = (0..singular.len()).collect();
    order.sort_by(|&i, &j| singular[j].total_cmp(&singular[i]));

    let total_weight: f64 = singular.iter().map(|s| s * s).sum();
    let mut keep = Vec::new();
    for (rank, &i) in order.iter().enumerate() {
        if rank >= nmax || (singular[i] < tol && rank > 0) {
            break;
        }
        keep.push(i);
    }
    let kept_weight: f64 = keep.iter().map(|&i| singular[i] * singular[i]).sum();
    let truncation_error = if total_weight > 0.0 {
        1.0 - kept_weight / total_weight
    } else {
        0.0
    };

    let u_kept = DMatrix::from_columns(
        &keep
            .iter()
            .map(|&i| u.column(i).into_owned())
            .collect::<Vec<_>>(),
    );
    let v_t_kept = DMatrix::from_rows(
        &keep
            .iter()
            .map(|&i| v_t.row(i).into_owned())
            .collect::<Vec<_>>(),
    );
    let values = DVector::from_iterator(keep.len(), keep.iter().map(|&i| singular[i]));

    TruncatedSvd {
        u: u_kept,
        singular_values: values,
        v_t: v_t_kept,
        truncation_error,
    }
}

/// Solves a tridiagonal complex system with the Thomas algorithm.
///
/// `sub` and `sup` hold the sub- and super-diagonals and must be one element
/// shorter than `diag`.
pub fn solve_tridiagonal(
    diag: &[Complex64],
    sub: &[Complex64],
    sup: &[Complex64],
    rhs: &[Complex64],
) -> Vec<Complex64> {
    let n = diag.len();
    debug_assert_eq!(sub.len(), n - 1);
    debug_assert_eq!(sup.len(), n - 1);
    debug_assert_eq!(rhs.len(), n);

    let mut c_prime = vec![Complex64::new(0.0, 0.0); n];
    let mut d_prime = vec![Complex64::new(0.0, 0.0); n];

    c_prime[0] = sup.first().copied().unwrap_or_default() / diag[0];
    d_prime[0] = rhs[0] / diag[0];
    for i in 1..n {
        let denom = diag[i] - sub[i - 1] * c_prime[i - 1];
        if i < n - 1 {
            c_prime[i] = sup[i] / denom;
        }
        d_prime[i] = (rhs[i] - sub[i - 1] * d_prime[i - 1]) / denom;
    }

    let mut x = vec![Complex64::new(0.0, 0.0); n];
    x[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = d_prime[i] - c_prime[i] * x[i + 1];
    }
    x
}

/// Dense Kronecker product of two real matrices.
pub fn kron(a: &DMatrix<f64>, b: &DMatrix<f64>) -> DMatrix<f64> {
    let (ar, ac) = a.shape();
    let (br, bc) = b.shape();
    let mut result = DMatrix::zeros(ar * br, ac * bc);
    for i in 0..ar {
        for j in 0..ac {
            let scale = a[(i, j)];
            if scale == 0.0 {
                continue;
            }
            for k in 0..br {
                for l in 0..bc {
                    result[(i * br + k, j * bc + l)] = scale * b[(k, l)];
                }
            }
        }
    }
    result
}
