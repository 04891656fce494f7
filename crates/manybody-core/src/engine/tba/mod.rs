//! Tight-binding approximation for fermionic systems, including BdG
//! (mean-field superconducting) systems in the Nambu-doubled space.
//!
//! The engine assembles dense Bloch matrices from the operator generator;
//! the apps compute energy bands ([`bands`]), the density of states
//! ([`dos`]) and the Berry curvature with the Chern number ([`berry`]).

pub mod bands;
pub mod berry;
pub mod dos;

use crate::core::fock::{
    DofConfig, Generator, IndexOrder, OperatorKind, Term, TermKind,
};
use crate::core::io::Model;
use crate::core::kspace::{IterMode, ParamSpace, SampleValue};
use crate::core::lattice::Lattice;
use crate::core::utils::linalg;
use crate::engine::error::EngineError;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use tracing::{debug, instrument};

/// Tight-binding engine: dense Bloch matrices and their spectra.
pub struct TbaEngine {
    lattice: Lattice,
    generator: Generator,
    nambu: bool,
}

impl TbaEngine {
    /// Builds the engine from a lattice, its degrees of freedom and a term
    /// list. With `nambu` the single-particle space is particle-hole doubled
    /// and pairing terms become meaningful.
    pub fn new(
        lattice: Lattice,
        config: DofConfig,
        terms: Vec<Term>,
        nambu: bool,
    ) -> Result<Self, EngineError> {
        if terms.iter().any(|t| t.kind == TermKind::Hubbard) {
            return Err(EngineError::InvalidConfig(
                "interaction terms are not supported by the tight-binding engine".into(),
            ));
        }
        let table = config.table(IndexOrder::NambuMajor, !nambu);
        let generator = Generator::new(lattice.bonds().to_vec(), config, table, terms)?;
        debug!(nmatrix = generator.table().len(), nambu, "tight-binding engine ready");
        Ok(Self {
            lattice,
            generator,
            nambu,
        })
    }

    pub fn from_model(model: &Model, nambu: bool) -> Result<Self, EngineError> {
        Self::new(
            model.lattice.clone(),
            model.config.clone(),
            model.terms.clone(),
            nambu,
        )
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Dimension of the Bloch matrix.
    pub fn nmatrix(&self) -> usize {
        self.generator.table().len()
    }

    /// Updates an alterable term parameter.
    pub fn update(&mut self, id: &str, value: f64) -> Result<(), EngineError> {
        self.generator.update(id, Complex64::new(value, 0.0))?;
        Ok(())
    }

    /// The Bloch matrix at a point of the reciprocal space.
    ///
    /// Without a k-point the bare cluster matrix is returned. In Nambu mode
    /// the particle-hole mirror of every particle-block entry is added
    /// before the matrix is closed with its adjoint.
    pub fn matrix(&self, k: Option<&DVector<f64>>) -> Result<DMatrix<Complex64>, EngineError> {
        let n = self.nmatrix();
        let mut matrix = DMatrix::<Complex64>::zeros(n, n);
        for op in self.generator.operators() {
            let OperatorKind::Quadratic { row, col } = &op.kind else {
                return Err(EngineError::Internal(format!(
                    "non-quadratic operator from term '{}' reached the Bloch assembly",
                    op.term_id
                )));
            };
            let (row, col) = (*row, *col);
            let phase = match k {
                None => Complex64::new(1.0, 0.0),
                Some(k) => {
                    let mut dot = 0.0;
                    for (ki, ri) in k.iter().zip(op.rcoord.iter()) {
                        dot += ki * ri;
                    }
                    Complex64::new(0.0, -dot).exp()
                }
            };
            matrix[(row, col)] += op.value * phase;
            if self.nambu && row < n / 2 && col < n / 2 {
                matrix[(col + n / 2, row + n / 2)] -= op.value * phase.conj();
            }
        }
        let adjoint = matrix.adjoint();
        Ok(matrix + adjoint)
    }

    /// The Bloch matrices over a parameter space.
    ///
    /// Scalar axes update the correspondingly named alterable parameters,
    /// the `k` axis feeds the Bloch phase.
    pub fn matrices(
        &mut self,
        space: &ParamSpace,
        mode: IterMode,
    ) -> Result<Vec<DMatrix<Complex64>>, EngineError> {
        let samples = space.samples(mode)?;
        let mut result = Vec::with_capacity(samples.len());
        for sample in &samples {
            let mut k = None;
            for (tag, value) in sample.iter() {
                match value {
                    SampleValue::Vector(v) if tag == "k" => k = Some(v.clone()),
                    SampleValue::Scalar(s) => self.update(tag, *s)?,
                    SampleValue::Vector(_) => {}
                }
            }
            result.push(self.matrix(k.as_ref())?);
        }
        Ok(result)
    }

    /// Sorted eigenvalues of the Bloch matrix at one k-point.
    pub fn eigvals_at(&self, k: Option<&DVector<f64>>) -> Result<Vec<f64>, EngineError> {
        Ok(linalg::hermitian_eigenvalues(self.matrix(k)?)
            .iter()
            .copied()
            .collect())
    }

    /// All eigenvalues over a parameter space.
    ///
    /// Vector-valued axes tagged `k` feed the Bloch phase; scalar axes
    /// update the correspondingly named alterable parameters.
    #[instrument(skip_all, name = "tba_eigvals")]
    pub fn eigvals(
        &mut self,
        space: Option<&ParamSpace>,
        mode: IterMode,
    ) -> Result<Vec<Vec<f64>>, EngineError> {
        let Some(space) = space else {
            return Ok(vec![self.eigvals_at(None)?]);
        };
        let samples = space.samples(mode)?;
        let mut result = Vec::with_capacity(samples.len());
        for sample in &samples {
            let mut k = None;
            for (tag, value) in sample.iter() {
                match value {
                    SampleValue::Vector(v) if tag == "k" => k = Some(v.clone()),
                    SampleValue::Scalar(s) => self.update(tag, *s)?,
                    SampleValue::Vector(_) => {}
                }
            }
            result.push(self.eigvals_at(k.as_ref())?);
        }
        Ok(result)
    }

    /// The chemical potential at the given filling factor.
    pub fn mu(&mut self, filling: f64, kspace: Option<&ParamSpace>) -> Result<f64, EngineError> {
        let eigvals = self.sorted_eigvals(kspace)?;
        let nelectron = (filling * eigvals.len() as f64).round() as usize;
        if nelectron == 0 || nelectron >= eigvals.len() {
            return Err(EngineError::InvalidConfig(format!(
                "filling {filling} leaves no levels on one side of the Fermi level"
            )));
        }
        Ok((eigvals[nelectron] + eigvals[nelectron - 1]) / 2.0)
    }

    /// The ground-state energy at the given filling factor.
    pub fn gse(&mut self, filling: f64, kspace: Option<&ParamSpace>) -> Result<f64, EngineError> {
        let eigvals = self.sorted_eigvals(kspace)?;
        let nelectron = (filling * eigvals.len() as f64).round() as usize;
        Ok(eigvals[..nelectron].iter().sum())
    }

    fn sorted_eigvals(&mut self, kspace: Option<&ParamSpace>) -> Result<Vec<f64>, EngineError> {
        let mut eigvals: Vec<f64> = self
            .eigvals(kspace, IterMode::Product)?
            .into_iter()
            .flatten()
            .collect();
        eigvals.sort_by(f64::total_cmp);
        Ok(eigvals)
    }
}
