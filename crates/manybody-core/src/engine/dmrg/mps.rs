use crate::core::utils::linalg::{TruncatedSvd, svd_truncated};
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MpsError {
    #[error("state of length {0} does not factor into the site dimensions {1:?}")]
    BadStateLength(usize, Vec<usize>),

    #[error("bond dimensions of neighboring tensors do not match ({0} vs {1})")]
    BondMismatch(usize, usize),

    #[error("a cut needs a singular-value vector and vice versa")]
    InconsistentCut,

    #[error("cut {cut} is outside the chain of {nsite} sites")]
    CutOutOfRange { cut: usize, nsite: usize },

    #[error("the chain carries no cut to move")]
    NoCut,

    #[error("the state is not normalized (norm {0})")]
    NotNormalized(f64),
}

/// A rank-3 site tensor with (left link, site, right link) axes.
#[derive(Debug, Clone)]
pub struct Tensor3 {
    data: Vec<f64>,
    dims: (usize, usize, usize),
}

impl Tensor3 {
    pub fn zeros(left: usize, site: usize, right: usize) -> Self {
        Self {
            data: vec![0.0; left * site * right],
            dims: (left, site, right),
        }
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        self.dims
    }

    #[inline]
    pub fn get(&self, l: usize, s: usize, r: usize) -> f64 {
        self.data[(l * self.dims.1 + s) * self.dims.2 + r]
    }

    #[inline]
    pub fn set(&mut self, l: usize, s: usize, r: usize, value: f64) {
        self.data[(l * self.dims.1 + s) * self.dims.2 + r] = value;
    }

    /// Matricization with the left link and site fused into rows.
    fn fuse_left(&self) -> DMatrix<f64> {
        let (l, s, r) = self.dims;
        DMatrix::from_fn(l * s, r, |row, col| self.get(row / s, row % s, col))
    }

    /// Matricization with the site and right link fused into columns.
    fn fuse_right(&self) -> DMatrix<f64> {
        let (l, s, r) = self.dims;
        DMatrix::from_fn(l, s * r, |row, col| self.get(row, col / r, col % r))
    }

    fn from_fused_left(matrix: &DMatrix<f64>, site: usize) -> Self {
        let rows = matrix.nrows();
        let left = rows / site;
        let right = matrix.ncols();
        let mut tensor = Self::zeros(left, site, right);
        for row in 0..rows {
            for col in 0..right {
                tensor.set(row / site, row % site, col, matrix[(row, col)]);
            }
        }
        tensor
    }

    fn from_fused_right(matrix: &DMatrix<f64>, site: usize) -> Self {
        let left = matrix.nrows();
        let cols = matrix.ncols();
        let right = cols / site;
        let mut tensor = Self::zeros(left, site, right);
        for row in 0..left {
            for col in 0..cols {
                tensor.set(row, col / right, col % right, matrix[(row, col)]);
            }
        }
        tensor
    }

    /// Contracts a matrix into the left link: `T'[l,s,r] = M[l,l'] T[l',s,r]`.
    fn absorb_left(&self, matrix: &DMatrix<f64>) -> Self {
        let (_, s, r) = self.dims;
        let fused = matrix * self.fuse_right();
        Self::from_fused_right(&fused, s).reshaped_site(s, r)
    }

    /// Contracts a matrix into the right link: `T'[l,s,r] = T[l,s,r'] M[r',r]`.
    fn absorb_right(&self, matrix: &DMatrix<f64>) -> Self {
        let (l, s, _) = self.dims;
        let fused = self.fuse_left() * matrix;
        let mut tensor = Self::from_fused_left(&fused, s);
        tensor.dims.0 = l;
        tensor
    }

    fn reshaped_site(mut self, site: usize, right: usize) -> Self {
        let total = self.data.len();
        self.dims = (total / (site * right), site, right);
        self
    }

    /// Scales the right link by a vector.
    fn scale_right(&self, weights: &DVector<f64>) -> Self {
        let (l, s, r) = self.dims;
        let mut tensor = self.clone();
        for li in 0..l {
            for si in 0..s {
                for ri in 0..r {
                    tensor.set(li, si, ri, self.get(li, si, ri) * weights[ri]);
                }
            }
        }
        tensor
    }

    /// Scales the left link by a vector.
    fn scale_left(&self, weights: &DVector<f64>) -> Self {
        let (l, s, r) = self.dims;
        let mut tensor = self.clone();
        for li in 0..l {
            for si in 0..s {
                for ri in 0..r {
                    tensor.set(li, si, ri, self.get(li, si, ri) * weights[li]);
                }
            }
        }
        tensor
    }
}

/// Default maximum bond dimension of canonical moves.
pub const DEFAULT_NMAX: usize = 200;
/// Default singular-value cutoff of canonical moves.
pub const DEFAULT_TOL: f64 = 1e-14;

/// A matrix product state in the general mixed-canonical form.
///
/// Tensors left of the cut are in the A (left-canonical) role, tensors
/// right of it in the B role; the singular values on the connecting link
/// are stored separately. Left-, right- and mixed-canonical states are the
/// special cases `cut = nsite`, `cut = 0` and anything in between.
#[derive(Debug, Clone)]
pub struct Mps {
    tensors: Vec<Tensor3>,
    lambda: Option<DVector<f64>>,
    cut: Option<usize>,
}

impl Mps {
    pub fn new(
        tensors: Vec<Tensor3>,
        lambda: Option<DVector<f64>>,
        cut: Option<usize>,
    ) -> Result<Self, MpsError> {
        for pair in tensors.windows(2) {
            if pair[0].dims().2 != pair[1].dims().0 {
                return Err(MpsError::BondMismatch(pair[0].dims().2, pair[1].dims().0));
            }
        }
        match (&lambda, cut) {
            (Some(_), Some(cut)) if cut > tensors.len() => Err(MpsError::CutOutOfRange {
                cut,
                nsite: tensors.len(),
            }),
            (Some(_), Some(_)) | (None, None) => Ok(Self {
                tensors,
                lambda,
                cut,
            }),
            _ => Err(MpsError::InconsistentCut),
        }
    }

    /// Factorizes a dense state into a left-canonical chain.
    pub fn from_state(state: &DVector<f64>, site_dims: &[usize]) -> Result<Self, MpsError> {
        let total: usize = site_dims.iter().product();
        if site_dims.is_empty() || state.len() != total || total == 0 {
            return Err(MpsError::BadStateLength(state.len(), site_dims.to_vec()));
        }
        let mut tensors = Vec::with_capacity(site_dims.len());
        let mut rest = DMatrix::from_fn(1, total, |_, col| state[col]);
        let mut bond = 1;
        for (position, &d) in site_dims.iter().enumerate() {
            let columns = rest.ncols() / d;
            let matrix = DMatrix::from_fn(bond * d, columns, |row, col| {
                rest[(row / d, (row % d) * columns + col)]
            });
            if position + 1 == site_dims.len() {
                tensors.push(Tensor3::from_fused_left(&matrix, d));
                let norm = matrix.norm();
                return Self::new(
                    tensors,
                    Some(DVector::from_element(1, norm)),
                    Some(site_dims.len()),
                )
                .map(|mut mps| {
                    // Normalize the trailing tensor so the weight sits in
                    // the singular-value vector alone.
                    if norm > 0.0 {
                        let last = mps.tensors.last_mut().unwrap();
                        for value in &mut last.data {
                            *value /= norm;
                        }
                    }
                    mps
                });
            }
            let svd = svd_truncated(&matrix, usize::MAX, DEFAULT_TOL);
            tensors.push(Tensor3::from_fused_left(&svd.u, d));
            bond = svd.singular_values.len();
            let sigma = DMatrix::from_diagonal(&svd.singular_values);
            rest = sigma * svd.v_t;
        }
        unreachable!("the loop returns on the last site");
    }

    pub fn nsite(&self) -> usize {
        self.tensors.len()
    }

    pub fn cut(&self) -> Option<usize> {
        self.cut
    }

    pub fn lambda(&self) -> Option<&DVector<f64>> {
        self.lambda.as_ref()
    }

    pub fn tensor(&self, site: usize) -> &Tensor3 {
        &self.tensors[site]
    }

    /// Bond dimension on every internal link.
    pub fn bond_dims(&self) -> Vec<usize> {
        self.tensors
            .iter()
            .take(self.nsite().saturating_sub(1))
            .map(|t| t.dims().2)
            .collect()
    }

    /// Contracts the chain back into a dense state.
    pub fn state(&self) -> DVector<f64> {
        let mut accumulated = DMatrix::from_element(1, 1, 1.0);
        for (position, tensor) in self.tensors.iter().enumerate() {
            if let (Some(cut), Some(lambda)) = (self.cut, &self.lambda) {
                if cut == position {
                    let scale = DMatrix::from_diagonal(lambda);
                    accumulated *= scale;
                }
            }
            let (l, s, r) = tensor.dims();
            let rows = accumulated.nrows();
            let mut next = DMatrix::zeros(rows * s, r);
            for p in 0..rows {
                for si in 0..s {
                    for ri in 0..r {
                        let mut amplitude = 0.0;
                        for li in 0..l {
                            amplitude += accumulated[(p, li)] * tensor.get(li, si, ri);
                        }
                        next[(p * s + si, ri)] = amplitude;
                    }
                }
            }
            accumulated = next;
        }
        if let (Some(cut), Some(lambda)) = (self.cut, &self.lambda) {
            if cut == self.nsite() {
                let scale = DMatrix::from_diagonal(lambda);
                accumulated *= scale;
            }
        }
        DVector::from_fn(accumulated.nrows(), |row, _| accumulated[(row, 0)])
    }

    /// The norm of the state.
    pub fn norm(&self) -> f64 {
        match (&self.lambda, self.cut) {
            (Some(lambda), Some(cut)) if cut > 0 && cut < self.nsite() => lambda.norm(),
            _ => self.state().norm(),
        }
    }

    /// Moves the cut one link to the right, absorbing the singular values
    /// and re-splitting with truncation. Returns the truncation error.
    fn move_right(&mut self, nmax: usize, tol: f64) -> Result<f64, MpsError> {
        let cut = self.cut.ok_or(MpsError::NoCut)?;
        if cut >= self.nsite() {
            return Err(MpsError::CutOutOfRange {
                cut: cut + 1,
                nsite: self.nsite(),
            });
        }
        let lambda = self.lambda.take().ok_or(MpsError::InconsistentCut)?;
        // At the chain head the singular-value vector sits on the trivial
        // left link and is absorbed as a scale.
        let merged = if cut == 0 {
            self.tensors[cut].scale_left(&lambda)
        } else {
            let scale = DMatrix::from_diagonal(&lambda);
            self.tensors[cut].absorb_left(&scale)
        };
        let (_, site, _) = merged.dims();
        let TruncatedSvd {
            u,
            singular_values,
            v_t,
            truncation_error,
        } = svd_truncated(&merged.fuse_left(), nmax, tol);
        self.tensors[cut] = Tensor3::from_fused_left(&u, site);
        if cut + 1 == self.nsite() {
            let tail = DVector::from_fn(singular_values.len(), |i, _| {
                singular_values[i] * v_t[(i, 0)]
            });
            self.lambda = Some(tail);
        } else {
            self.tensors[cut + 1] = self.tensors[cut + 1].absorb_left(&v_t);
            self.lambda = Some(singular_values);
        }
        self.cut = Some(cut + 1);
        Ok(truncation_error)
    }

    /// Moves the cut one link to the left. Returns the truncation error.
    fn move_left(&mut self, nmax: usize, tol: f64) -> Result<f64, MpsError> {
        let cut = self.cut.ok_or(MpsError::NoCut)?;
        if cut == 0 {
            return Err(MpsError::CutOutOfRange {
                cut: 0,
                nsite: self.nsite(),
            });
        }
        let lambda = self.lambda.take().ok_or(MpsError::InconsistentCut)?;
        // At the chain tail the singular-value vector sits on the trivial
        // right link and is absorbed as a scale.
        let merged = if cut == self.nsite() {
            self.tensors[cut - 1].scale_right(&lambda)
        } else {
            let scale = DMatrix::from_diagonal(&lambda);
            self.tensors[cut - 1].absorb_right(&scale)
        };
        let (_, site, _) = merged.dims();
        let TruncatedSvd {
            u,
            singular_values,
            v_t,
            truncation_error,
        } = svd_truncated(&merged.fuse_right(), nmax, tol);
        self.tensors[cut - 1] = Tensor3::from_fused_right(&v_t, site);
        if cut == 1 {
            let head = DVector::from_fn(singular_values.len(), |i, _| {
                u[(0, i)] * singular_values[i]
            });
            self.lambda = Some(head);
        } else {
            self.tensors[cut - 2] = self.tensors[cut - 2].absorb_right(&u);
            self.lambda = Some(singular_values);
        }
        self.cut = Some(cut - 1);
        Ok(truncation_error)
    }

    /// Shifts the cut `count` links rightward with truncation.
    pub fn shift_right(&mut self, count: usize, nmax: usize, tol: f64) -> Result<f64, MpsError> {
        let mut error = 0.0;
        for _ in 0..count {
            error += self.move_right(nmax, tol)?;
        }
        Ok(error)
    }

    /// Shifts the cut `count` links leftward with truncation.
    pub fn shift_left(&mut self, count: usize, nmax: usize, tol: f64) -> Result<f64, MpsError> {
        let mut error = 0.0;
        for _ in 0..count {
            error += self.move_left(nmax, tol)?;
        }
        Ok(error)
    }

    /// Brings the chain into mixed-canonical form at the requested cut by
    /// sweeping across the whole chain and back. Returns the accumulated
    /// truncation error.
    pub fn canonicalize(&mut self, cut: usize, nmax: usize, tol: f64) -> Result<f64, MpsError> {
        if cut > self.nsite() {
            return Err(MpsError::CutOutOfRange {
                cut,
                nsite: self.nsite(),
            });
        }
        if self.cut.is_none() {
            self.cut = Some(self.nsite());
            self.lambda = Some(DVector::from_element(1, 1.0));
        }
        let mut error = 0.0;
        let position = self.cut.unwrap_or_default();
        if position <= self.nsite() / 2 {
            error += self.shift_left(position, usize::MAX, 0.0)?;
            error += self.shift_right(self.nsite(), usize::MAX, 0.0)?;
            error += self.shift_left(self.nsite() - cut, nmax, tol)?;
        } else {
            error += self.shift_right(self.nsite() - position, usize::MAX, 0.0)?;
            error += self.shift_left(self.nsite(), usize::MAX, 0.0)?;
            error += self.shift_right(cut, nmax, tol)?;
        }
        Ok(error)
    }

    /// Checks the canonical condition site by site: A-tensors left of the
    /// cut, B-tensors right of it.
    pub fn is_canonical(&self) -> Vec<bool> {
        let cut = self.cut.unwrap_or(self.nsite());
        self.tensors
            .iter()
            .enumerate()
            .map(|(position, tensor)| {
                let (l, s, r) = tensor.dims();
                if position < cut {
                    let mut gram = DMatrix::<f64>::zeros(r, r);
                    for si in 0..s {
                        let slice = DMatrix::from_fn(l, r, |a, b| tensor.get(a, si, b));
                        gram += slice.transpose() * slice;
                    }
                    (gram - DMatrix::identity(r, r)).norm() < 1e-10
                } else {
                    let mut gram = DMatrix::<f64>::zeros(l, l);
                    for si in 0..s {
                        let slice = DMatrix::from_fn(l, r, |a, b| tensor.get(a, si, b));
                        gram += &slice * slice.transpose();
                    }
                    (gram - DMatrix::identity(l, l)).norm() < 1e-10
                }
            })
            .collect()
    }

    /// Converts a normalized chain to the Vidal canonical form.
    pub fn to_vidal(&self) -> Result<Vidal, MpsError> {
        let norm = self.norm();
        if (norm - 1.0).abs() > 1e-8 {
            return Err(MpsError::NotNormalized(norm));
        }
        let mut sweep = self.clone();
        sweep.canonicalize(0, usize::MAX, 0.0)?;

        let mut gammas = Vec::with_capacity(self.nsite());
        let mut lambdas: Vec<DVector<f64>> = Vec::with_capacity(self.nsite() - 1);
        for site in 0..sweep.nsite() {
            sweep.move_right(usize::MAX, 0.0)?;
            let a_tensor = sweep.tensors[site].clone();
            let gamma = match lambdas.last() {
                Some(previous) => {
                    let inverse =
                        DVector::from_fn(previous.len(), |i, _| 1.0 / previous[i]);
                    a_tensor.scale_left(&inverse)
                }
                None => a_tensor,
            };
            gammas.push(gamma);
            if site + 1 < sweep.nsite() {
                lambdas.push(
                    sweep
                        .lambda
                        .clone()
                        .ok_or(MpsError::InconsistentCut)?,
                );
            }
        }
        // The trailing weight is +-1 for a normalized chain; fold its sign
        // into the last site tensor.
        if let Some(tail) = &sweep.lambda {
            if let Some(last) = gammas.last_mut() {
                *last = last.scale_right(tail);
            }
        }
        Ok(Vidal { gammas, lambdas })
    }
}

/// The Vidal canonical form: site tensors with singular-value vectors on
/// every internal link.
#[derive(Debug, Clone)]
pub struct Vidal {
    gammas: Vec<Tensor3>,
    lambdas: Vec<DVector<f64>>,
}

impl Vidal {
    pub fn nsite(&self) -> usize {
        self.gammas.len()
    }

    pub fn lambdas(&self) -> &[DVector<f64>] {
        &self.lambdas
    }

    /// Converts to the mixed-canonical form with the cut on the given link.
    pub fn to_mixed(&self, cut: usize) -> Result<Mps, MpsError> {
        if cut > self.nsite() {
            return Err(MpsError::CutOutOfRange {
                cut,
                nsite: self.nsite(),
            });
        }
        let mut tensors = Vec::with_capacity(self.nsite());
        for (site, gamma) in self.gammas.iter().enumerate() {
            let tensor = if site < cut {
                if site == 0 {
                    gamma.clone()
                } else {
                    gamma.scale_left(&self.lambdas[site - 1])
                }
            } else if site < self.lambdas.len() {
                gamma.scale_right(&self.lambdas[site])
            } else {
                gamma.clone()
            };
            tensors.push(tensor);
        }
        let lambda = if cut > 0 && cut <= self.lambdas.len() {
            self.lambdas[cut - 1].clone()
        } else {
            DVector::from_element(1, 1.0)
        };
        Mps::new(tensors, Some(lambda), Some(cut))
    }

    /// Contracts the chain into a dense state.
    pub fn state(&self) -> Result<DVector<f64>, MpsError> {
        self.to_mixed(0).map(|mps| mps.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn random_state(len: usize, seed: u64) -> DVector<f64> {
        // A simple deterministic pseudo-random fill keeps tests stable.
        let mut x = seed;
        let mut state = DVector::from_fn(len, |_, _| {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((x >> 33) as f64 / (1u64 << 31) as f64) - 1.0
        });
        let norm = state.norm();
        state /= norm;
        state
    }

    #[test]
    fn from_state_round_trips_through_the_chain() {
        let state = random_state(8, 7);
        let mps = Mps::from_state(&state, &[2, 2, 2]).unwrap();
        assert_eq!(mps.nsite(), 3);
        assert!((mps.state() - state).norm() < TOLERANCE);
    }

    #[test]
    fn from_state_produces_a_left_canonical_chain() {
        let state = random_state(16, 3);
        let mps = Mps::from_state(&state, &[2, 2, 2, 2]).unwrap();
        assert_eq!(mps.cut(), Some(4));
        assert!(mps.is_canonical().iter().all(|&ok| ok));
        assert!((mps.norm() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn mismatched_site_dimensions_are_rejected() {
        let state = random_state(6, 1);
        assert!(matches!(
            Mps::from_state(&state, &[2, 2]),
            Err(MpsError::BadStateLength(6, _))
        ));
    }

    #[test]
    fn canonicalization_to_a_middle_cut_preserves_the_state() {
        let state = random_state(16, 11);
        let mut mps = Mps::from_state(&state, &[2, 2, 2, 2]).unwrap();
        let error = mps.canonicalize(2, usize::MAX, 0.0).unwrap();
        assert!(error < TOLERANCE);
        assert_eq!(mps.cut(), Some(2));
        assert!(mps.is_canonical().iter().all(|&ok| ok));
        assert!((mps.state() - state).norm() < TOLERANCE);
    }

    #[test]
    fn shifting_moves_the_cut_both_ways() {
        let state = random_state(8, 5);
        let mut mps = Mps::from_state(&state, &[2, 2, 2]).unwrap();
        mps.shift_left(2, usize::MAX, 0.0).unwrap();
        assert_eq!(mps.cut(), Some(1));
        mps.shift_right(1, usize::MAX, 0.0).unwrap();
        assert_eq!(mps.cut(), Some(2));
        assert!((mps.state() - state).norm() < TOLERANCE);
    }

    #[test]
    fn product_states_have_bond_dimension_one() {
        // |up up up> as a dense vector.
        let mut state = DVector::zeros(8);
        state[0] = 1.0;
        let mps = Mps::from_state(&state, &[2, 2, 2]).unwrap();
        assert!(mps.bond_dims().iter().all(|&d| d == 1));
    }

    #[test]
    fn truncating_an_entangled_pair_loses_half_the_weight() {
        // (|uu> + |dd>) / sqrt(2): both singular values are 1/sqrt(2).
        let mut state = DVector::zeros(4);
        state[0] = 1.0 / 2.0f64.sqrt();
        state[3] = 1.0 / 2.0f64.sqrt();
        let mut mps = Mps::from_state(&state, &[2, 2]).unwrap();
        let error = mps.canonicalize(1, 1, 0.0).unwrap();
        assert!((error - 0.5).abs() < 1e-6);
        assert_eq!(mps.lambda().unwrap().len(), 1);
    }

    #[test]
    fn vidal_round_trip_preserves_the_state() {
        let state = random_state(16, 23);
        let mps = Mps::from_state(&state, &[2, 2, 2, 2]).unwrap();
        let vidal = mps.to_vidal().unwrap();
        assert_eq!(vidal.nsite(), 4);
        assert_eq!(vidal.lambdas().len(), 3);
        for cut in 0..=4 {
            let mixed = vidal.to_mixed(cut).unwrap();
            let rebuilt = mixed.state();
            assert!(
                (&rebuilt - &state).norm() < 1e-7,
                "cut {cut}: deviation {}",
                (&rebuilt - &state).norm()
            );
        }
    }

    #[test]
    fn unnormalized_states_cannot_go_to_vidal_form() {
        let state = random_state(8, 9) * 2.0;
        let mps = Mps::from_state(&state, &[2, 2, 2]).unwrap();
        assert!(matches!(mps.to_vidal(), Err(MpsError::NotNormalized(_))));
    }
}
