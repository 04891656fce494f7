//! Cluster perturbation theory.
//!
//! The lattice is tiled by one or several exactly solved clusters. Their
//! zero-temperature Green's functions form the block-diagonal cluster
//! propagator; hopping between clusters (and between the subsystems of a
//! composite cluster) enters as a Bloch-summed perturbation:
//!
//! `G_cpt(k, w) = [G_c(w)^-1 - V(k)]^-1`
//!
//! Periodization restores lattice momentum as a good quantum number. The
//! apps compute spectral functions along a path ([`spectrum`]) and the
//! lattice density of states ([`dos`]).

pub mod dos;
pub mod spectrum;

use crate::core::fock::{
    DofConfig, Generator, IndexOrder, IndexTable, OperatorKind, Term,
};
use crate::core::lattice::Lattice;
use crate::engine::ed::EdEngine;
use crate::engine::ed::green::{self, GreenApp, GreenFunction};
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use tracing::{debug, info, instrument};

/// Cluster-perturbation engine over one or several cluster subsystems.
///
/// A single subsystem is ordinary CPT; several subsystems realize the
/// composite-cluster tilings used by the variational cluster approach.
pub struct CptEngine {
    lattice: Lattice,
    generator: Generator,
    subsystems: Vec<EdEngine>,
    /// Cluster sequence -> (subsystem, subsystem sequence).
    mapping: Vec<(usize, usize)>,
    /// Real-space position of every cluster sequence.
    rcoords: Vec<DVector<f64>>,
    greens: Option<Vec<GreenFunction>>,
}

impl CptEngine {
    /// Builds the engine from the tiled lattice, its terms, and the exactly
    /// solved subsystems covering the cluster.
    pub fn new(
        lattice: Lattice,
        config: DofConfig,
        terms: Vec<Term>,
        subsystems: Vec<EdEngine>,
    ) -> Result<Self, EngineError> {
        if subsystems.is_empty() {
            return Err(EngineError::InvalidConfig(
                "cluster perturbation theory needs at least one solved subsystem".into(),
            ));
        }
        let table = config.table(IndexOrder::SiteMajor, true);
        let (mapping, rcoords) = build_mapping(&lattice, &table, &subsystems)?;
        let generator = Generator::new(lattice.bonds().to_vec(), config, table, terms)?;
        debug!(
            nseq = generator.table().len(),
            nsub = subsystems.len(),
            "cluster-perturbation engine ready"
        );
        Ok(Self {
            lattice,
            generator,
            subsystems,
            mapping,
            rcoords,
            greens: None,
        })
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    /// Dimension of the cluster single-particle space.
    pub fn nseq(&self) -> usize {
        self.generator.table().len()
    }

    /// Solves all subsystem Green's functions.
    #[instrument(skip_all, name = "cpt_prepare")]
    pub fn prepare(
        &mut self,
        app: &GreenApp,
        reporter: &ProgressReporter,
    ) -> Result<(), EngineError> {
        info!(nsub = self.subsystems.len(), "solving cluster Green's functions");
        let mut greens = Vec::with_capacity(self.subsystems.len());
        for subsystem in &self.subsystems {
            greens.push(green::prepare(subsystem, app, reporter)?);
        }
        self.greens = Some(greens);
        Ok(())
    }

    fn greens(&self) -> Result<&[GreenFunction], EngineError> {
        self.greens.as_deref().ok_or_else(|| {
            EngineError::Internal("the cluster Green's functions are not prepared".into())
        })
    }

    /// The block-diagonal cluster Green's function.
    pub fn cluster_green(&self, omega: Complex64) -> Result<DMatrix<Complex64>, EngineError> {
        let greens = self.greens()?;
        let blocks: Vec<DMatrix<Complex64>> =
            greens.iter().map(|g| g.evaluate(omega)).collect();
        let n = self.nseq();
        let mut gc = DMatrix::zeros(n, n);
        for a in 0..n {
            let (sub_a, i) = self.mapping[a];
            for b in 0..n {
                let (sub_b, j) = self.mapping[b];
                if sub_a == sub_b {
                    gc[(a, b)] = blocks[sub_a][(i, j)];
                }
            }
        }
        Ok(gc)
    }

    /// The Bloch-summed perturbation: every quadratic operator that leaves
    /// its subsystem or its cluster, with phase `exp(-i k . R)` on the
    /// connecting translation.
    pub fn intercluster(&self, k: &DVector<f64>) -> DMatrix<Complex64> {
        let n = self.nseq();
        let mut v = DMatrix::<Complex64>::zeros(n, n);
        for op in self.generator.operators() {
            let OperatorKind::Quadratic { row, col } = &op.kind else {
                continue;
            };
            let (row, col) = (*row, *col);
            let intra_subsystem =
                op.is_intra_cell() && self.mapping[row].0 == self.mapping[col].0;
            if intra_subsystem {
                continue;
            }
            let mut dot = 0.0;
            for (ki, ri) in k.iter().zip(op.icoord.iter()) {
                dot += ki * ri;
            }
            let phase = Complex64::new(0.0, -dot).exp();
            v[(row, col)] += op.value * phase;
        }
        let adjoint = v.adjoint();
        v + adjoint
    }

    /// The cluster-perturbed Green's function at `(k, w)`.
    pub fn cpt_green(
        &self,
        k: &DVector<f64>,
        omega: Complex64,
    ) -> Result<DMatrix<Complex64>, EngineError> {
        let gc = self.cluster_green(omega)?;
        let gc_inverse = gc.try_inverse().ok_or_else(|| {
            EngineError::Internal("the cluster Green's function is singular".into())
        })?;
        let matrix = gc_inverse - self.intercluster(k);
        matrix.try_inverse().ok_or_else(|| {
            EngineError::Internal("the embedded Green's function is singular".into())
        })
    }

    /// The fully periodized lattice Green's function, per site.
    pub fn periodized(
        &self,
        k: &DVector<f64>,
        omega: Complex64,
    ) -> Result<Complex64, EngineError> {
        let g = self.cpt_green(k, omega)?;
        let n = self.nseq();
        let mut total = Complex64::new(0.0, 0.0);
        for a in 0..n {
            for b in 0..n {
                let mut dot = 0.0;
                for (ki, (ra, rb)) in k
                    .iter()
                    .zip(self.rcoords[a].iter().zip(self.rcoords[b].iter()))
                {
                    dot += ki * (ra - rb);
                }
                total += Complex64::new(0.0, -dot).exp() * g[(a, b)];
            }
        }
        Ok(total / Complex64::new(self.lattice.points().len() as f64, 0.0))
    }

    /// The spectral weight `-2 Im G(k, w)` of the periodized propagator.
    pub fn spectral_weight(
        &self,
        k: &DVector<f64>,
        omega: Complex64,
    ) -> Result<f64, EngineError> {
        Ok(-2.0 * self.periodized(k, omega)?.im)
    }
}

fn build_mapping(
    lattice: &Lattice,
    table: &IndexTable,
    subsystems: &[EdEngine],
) -> Result<(Vec<(usize, usize)>, Vec<DVector<f64>>), EngineError> {
    let mut mapping = Vec::with_capacity(table.len());
    let mut rcoords = Vec::with_capacity(table.len());
    for seq in 0..table.len() {
        let index = table.index(seq);
        let owner = subsystems
            .iter()
            .enumerate()
            .find_map(|(s, subsystem)| {
                subsystem
                    .table()
                    .seq(index)
                    .ok()
                    .map(|sub_seq| (s, sub_seq))
            })
            .ok_or_else(|| {
                EngineError::InvalidConfig(format!(
                    "index {index} is not covered by any subsystem"
                ))
            })?;
        mapping.push(owner);
        let point = lattice.point(&index.pid).ok_or_else(|| {
            EngineError::Internal(format!("point {} missing from the lattice", index.pid))
        })?;
        rcoords.push(point.rcoord.clone());
    }
    Ok((mapping, rcoords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::basis::FockBasis;
    use crate::core::fock::FockDof;
    use crate::core::lattice::{Point, PointId};
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-6;

    /// A free 1D chain tiled by a two-site cluster. CPT is exact for free
    /// systems, so the periodized propagator must match the bare band.
    fn free_chain_engine() -> CptEngine {
        let points: Vec<Point> = (0..2)
            .map(|i| Point::new(PointId::new("L2", i), DVector::from_column_slice(&[i as f64])))
            .collect();
        let cluster = Lattice::new("L2", points.clone(), vec![], 1).unwrap();
        let lattice = Lattice::new(
            "L2",
            points,
            vec![DVector::from_column_slice(&[2.0])],
            1,
        )
        .unwrap();

        let config = DofConfig::uniform(&lattice.pids(), FockDof::default());
        let terms = vec![Term::hopping("t", -1.0, 1)];
        let basis = FockBasis::spin_resolved(4, 1, 1).unwrap();
        let subsystem = EdEngine::new(cluster, config.clone(), terms.clone(), basis).unwrap();

        let mut engine = CptEngine::new(lattice, config, terms, vec![subsystem]).unwrap();
        engine
            .prepare(&GreenApp { nstep: 30 }, &ProgressReporter::new())
            .unwrap();
        engine
    }

    #[test]
    fn free_chain_periodized_propagator_matches_the_bare_band() {
        let engine = free_chain_engine();
        for &k in &[0.3f64, 1.1, 2.0] {
            let kvec = DVector::from_column_slice(&[k]);
            let omega = Complex64::new(3.0, 0.05);
            let expected = 2.0 / (omega - Complex64::new(-2.0 * k.cos(), 0.0));
            let actual = engine.periodized(&kvec, omega).unwrap();
            assert!(
                (actual - expected).norm() < TOLERANCE,
                "k = {k}: {actual} vs {expected}"
            );
        }
    }

    #[test]
    fn intercluster_matrix_is_hermitian_and_k_periodic() {
        let engine = free_chain_engine();
        let k = DVector::from_column_slice(&[0.7]);
        let v = engine.intercluster(&k);
        assert!((v.clone() - v.adjoint()).norm() < TOLERANCE);

        let shifted = DVector::from_column_slice(&[0.7 + PI]);
        let v_shifted = engine.intercluster(&shifted);
        assert!((v - v_shifted).norm() < TOLERANCE);
    }

    #[test]
    fn spectral_weight_peaks_on_the_band() {
        let engine = free_chain_engine();
        let k = DVector::from_column_slice(&[PI / 3.0]);
        let on_band = Complex64::new(-2.0 * (PI / 3.0).cos(), 0.05);
        let off_band = Complex64::new(3.0, 0.05);
        let peak = engine.spectral_weight(&k, on_band).unwrap();
        let tail = engine.spectral_weight(&k, off_band).unwrap();
        assert!(peak > 10.0 * tail);
    }

    #[test]
    fn unprepared_engine_refuses_to_evaluate() {
        let points: Vec<Point> = (0..2)
            .map(|i| Point::new(PointId::new("L2", i), DVector::from_column_slice(&[i as f64])))
            .collect();
        let cluster = Lattice::new("L2", points.clone(), vec![], 1).unwrap();
        let lattice =
            Lattice::new("L2", points, vec![DVector::from_column_slice(&[2.0])], 1).unwrap();
        let config = DofConfig::uniform(&lattice.pids(), FockDof::default());
        let terms = vec![Term::hopping("t", -1.0, 1)];
        let basis = FockBasis::spin_resolved(4, 1, 1).unwrap();
        let subsystem = EdEngine::new(cluster, config.clone(), terms.clone(), basis).unwrap();
        let engine = CptEngine::new(lattice, config, terms, vec![subsystem]).unwrap();
        assert!(engine.cluster_green(Complex64::new(0.0, 0.1)).is_err());
    }
}
