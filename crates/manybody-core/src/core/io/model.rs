use crate::core::basis::{BasisError, FockBasis};
use crate::core::fock::coupling::{self, CouplingMode};
use crate::core::fock::{CouplingList, DofConfig, FockDof, FockError, Term, TermKind};
use crate::core::lattice::registry;
use crate::core::lattice::{Lattice, LatticeError, Point, PointId};
use nalgebra::DVector;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },

    #[error("unknown cluster preset '{0}'")]
    UnknownPreset(String),

    #[error("lattice needs either a preset or explicit rcoords")]
    MissingLatticeSpec,

    #[error("unknown coupling '{0}' (expected '<sigma>:<channel>')")]
    UnknownCoupling(String),

    #[error(transparent)]
    Lattice(#[from] LatticeError),

    #[error(transparent)]
    Fock(#[from] FockError),

    #[error(transparent)]
    Basis(#[from] BasisError),

    #[error("basis of kind '{kind}' is missing field '{field}'")]
    MissingBasisField { kind: String, field: &'static str },
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelFile {
    pub model: ModelMeta,
    pub lattice: LatticeSpec,
    #[serde(default)]
    pub dof: DofSpec,
    #[serde(default)]
    pub terms: Vec<TermSpec>,
    pub basis: Option<BasisSpec>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelMeta {
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LatticeSpec {
    pub preset: Option<String>,
    pub rcoords: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    pub vectors: Vec<Vec<f64>>,
    #[serde(default = "default_nneighbour")]
    pub nneighbour: usize,
    #[serde(default = "default_true")]
    pub periodic: bool,
}

fn default_nneighbour() -> usize {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct DofSpec {
    /// Optional per-site atom species, cycled over the lattice points.
    pub atoms: Option<Vec<usize>>,
    #[serde(default = "default_one")]
    pub norbital: usize,
    #[serde(default = "default_two")]
    pub nspin: usize,
    #[serde(default = "default_one")]
    pub nnambu: usize,
}

fn default_one() -> usize {
    1
}

fn default_two() -> usize {
    2
}

impl Default for DofSpec {
    fn default() -> Self {
        Self {
            atoms: None,
            norbital: 1,
            nspin: 2,
            nnambu: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TermSpec {
    pub kind: TermKindSpec,
    pub id: String,
    pub value: f64,
    pub neighbour: Option<usize>,
    #[serde(default)]
    pub modulate: bool,
    /// Structure factor as `<sigma>:<channel>`, e.g. `sigma_z:spin`.
    pub coupling: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TermKindSpec {
    Hopping,
    Onsite,
    Pairing,
    Hubbard,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BasisSpec {
    pub kind: BasisKindSpec,
    pub nparticle: Option<usize>,
    pub nup: Option<usize>,
    pub ndown: Option<usize>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BasisKindSpec {
    All,
    Number,
    Spinz,
}

/// A fully materialized model: the input every solver starts from.
#[derive(Debug, Clone)]
pub struct Model {
    pub name: String,
    pub lattice: Lattice,
    pub config: DofConfig,
    pub terms: Vec<Term>,
    pub basis: Option<FockBasis>,
}

impl Model {
    /// Loads and materializes a TOML model description.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let file: ModelFile = toml::from_str(&content).map_err(|e| ModelError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_file(file)
    }

    pub fn from_file(file: ModelFile) -> Result<Self, ModelError> {
        let name = file.model.name.clone();
        let lattice = build_lattice(&name, &file.lattice)?;
        let config = build_config(&lattice, &file.dof)?;
        let terms = file
            .terms
            .iter()
            .map(build_term)
            .collect::<Result<Vec<_>, _>>()?;
        let basis = match &file.basis {
            Some(spec) => Some(build_basis(spec, &lattice, &file.dof)?),
            None => None,
        };
        Ok(Self {
            name,
            lattice,
            config,
            terms,
            basis,
        })
    }

    /// Number of single-particle states without the Nambu axis.
    pub fn nstate(&self) -> usize {
        self.config
            .iter()
            .map(|(_, dof)| dof.ndegree(true))
            .sum()
    }
}

fn build_lattice(name: &str, spec: &LatticeSpec) -> Result<Lattice, ModelError> {
    if let Some(preset_name) = &spec.preset {
        let preset = registry::preset(preset_name)
            .ok_or_else(|| ModelError::UnknownPreset(preset_name.clone()))?;
        return if spec.periodic {
            Ok(preset.lattice(name, spec.nneighbour)?)
        } else {
            Ok(preset.finite_cluster(name, spec.nneighbour)?)
        };
    }
    let rcoords = spec.rcoords.as_ref().ok_or(ModelError::MissingLatticeSpec)?;
    let points: Vec<Point> = rcoords
        .iter()
        .enumerate()
        .map(|(site, rcoord)| {
            Point::new(PointId::new(name, site), DVector::from_column_slice(rcoord))
        })
        .collect();
    let vectors: Vec<DVector<f64>> = if spec.periodic {
        spec.vectors
            .iter()
            .map(|v| DVector::from_column_slice(v))
            .collect()
    } else {
        Vec::new()
    };
    Ok(Lattice::new(name, points, vectors, spec.nneighbour)?)
}

fn build_config(lattice: &Lattice, spec: &DofSpec) -> Result<DofConfig, ModelError> {
    let pids = lattice.pids();
    let mut config = DofConfig::new();
    for (position, pid) in pids.iter().enumerate() {
        let atom = spec
            .atoms
            .as_ref()
            .map(|atoms| atoms[position % atoms.len()])
            .unwrap_or(0);
        config.insert(
            pid.clone(),
            FockDof::new(atom, spec.norbital, spec.nspin, spec.nnambu)?,
        );
    }
    Ok(config)
}

fn build_term(spec: &TermSpec) -> Result<Term, ModelError> {
    let kind = match spec.kind {
        TermKindSpec::Hopping => TermKind::Hopping,
        TermKindSpec::Onsite => TermKind::Onsite,
        TermKindSpec::Pairing => TermKind::Pairing,
        TermKindSpec::Hubbard => TermKind::Hubbard,
    };
    let neighbour = spec.neighbour.unwrap_or(match kind {
        TermKind::Hopping | TermKind::Pairing => 1,
        TermKind::Onsite | TermKind::Hubbard => 0,
    });
    let mut term = Term::new(
        &spec.id,
        kind,
        num_complex::Complex64::new(spec.value, 0.0),
        neighbour,
    );
    if let Some(coupling) = &spec.coupling {
        term = term.with_couplings(parse_coupling(coupling)?);
    }
    if spec.modulate {
        term = term.modulated();
    }
    Ok(term)
}

fn parse_coupling(text: &str) -> Result<CouplingList, ModelError> {
    let (sigma, channel) = text
        .split_once(':')
        .ok_or_else(|| ModelError::UnknownCoupling(text.to_string()))?;
    let mode = match channel {
        "spin" => CouplingMode::Spin,
        "orbital" => CouplingMode::Orbital,
        "sublattice" => CouplingMode::Sublattice,
        "particle-hole" => CouplingMode::ParticleHole,
        _ => return Err(ModelError::UnknownCoupling(text.to_string())),
    };
    let list = match sigma {
        "sigma_0" => coupling::sigma_0(mode),
        "sigma_x" => coupling::sigma_x(mode),
        "sigma_y" => coupling::sigma_y(mode),
        "sigma_z" => coupling::sigma_z(mode),
        "sigma_plus" => coupling::sigma_plus(mode),
        "sigma_minus" => coupling::sigma_minus(mode),
        _ => return Err(ModelError::UnknownCoupling(text.to_string())),
    };
    Ok(list)
}

fn build_basis(
    spec: &BasisSpec,
    lattice: &Lattice,
    dof: &DofSpec,
) -> Result<FockBasis, ModelError> {
    let nstate = lattice.points().len() * dof.norbital * dof.nspin;
    match spec.kind {
        BasisKindSpec::All => Ok(FockBasis::all(nstate)?),
        BasisKindSpec::Number => {
            let n = spec.nparticle.ok_or(ModelError::MissingBasisField {
                kind: "number".into(),
                field: "nparticle",
            })?;
            Ok(FockBasis::with_particle_number(nstate, n)?)
        }
        BasisKindSpec::Spinz => {
            let nup = spec.nup.ok_or(ModelError::MissingBasisField {
                kind: "spinz".into(),
                field: "nup",
            })?;
            let ndown = spec.ndown.ok_or(ModelError::MissingBasisField {
                kind: "spinz".into(),
                field: "ndown",
            })?;
            Ok(FockBasis::spin_resolved(nstate, nup, ndown)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::basis::SectorRule;
    use std::fs;
    use tempfile::tempdir;

    const SQUARE_HUBBARD: &str = r#"
        [model]
        name = "square-hubbard"

        [lattice]
        preset = "S2x2"
        nneighbour = 1
        periodic = false

        [dof]
        norbital = 1
        nspin = 2
        nnambu = 1

        [[terms]]
        kind = "hopping"
        id = "t"
        value = -1.0
        neighbour = 1

        [[terms]]
        kind = "hubbard"
        id = "U"
        value = 8.0
        modulate = true

        [basis]
        kind = "spinz"
        nup = 2
        ndown = 2
    "#;

    #[test]
    fn load_materializes_a_full_model() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(&path, SQUARE_HUBBARD).unwrap();

        let model = Model::load(&path).unwrap();
        assert_eq!(model.name, "square-hubbard");
        assert_eq!(model.lattice.points().len(), 4);
        assert_eq!(model.terms.len(), 2);
        assert!(model.terms[1].modulate);
        assert_eq!(model.nstate(), 8);
        assert_eq!(
            model.basis.unwrap().rule(),
            SectorRule::SpinResolved { nup: 2, ndown: 2 }
        );
    }

    #[test]
    fn missing_file_reports_the_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let result = Model::load(&path);
        assert!(matches!(result, Err(ModelError::Io { .. })));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not toml").unwrap();
        assert!(matches!(
            Model::load(&path),
            Err(ModelError::Toml { .. })
        ));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let file = ModelFile {
            model: ModelMeta {
                name: "x".into(),
            },
            lattice: LatticeSpec {
                preset: Some("NOPE".into()),
                rcoords: None,
                vectors: vec![],
                nneighbour: 1,
                periodic: true,
            },
            dof: DofSpec::default(),
            terms: vec![],
            basis: None,
        };
        assert!(matches!(
            Model::from_file(file),
            Err(ModelError::UnknownPreset(_))
        ));
    }

    #[test]
    fn explicit_geometry_builds_without_preset() {
        let file = ModelFile {
            model: ModelMeta {
                name: "chain".into(),
            },
            lattice: LatticeSpec {
                preset: None,
                rcoords: Some(vec![vec![0.0], vec![1.0]]),
                vectors: vec![vec![2.0]],
                nneighbour: 1,
                periodic: true,
            },
            dof: DofSpec::default(),
            terms: vec![],
            basis: None,
        };
        let model = Model::from_file(file).unwrap();
        assert_eq!(model.lattice.vectors().len(), 1);
    }

    #[test]
    fn coupling_strings_resolve_to_structure_factors() {
        let spec = TermSpec {
            kind: TermKindSpec::Onsite,
            id: "h".into(),
            value: 0.5,
            neighbour: None,
            modulate: false,
            coupling: Some("sigma_z:spin".into()),
        };
        let term = build_term(&spec).unwrap();
        assert_eq!(term.couplings.len(), 2);

        let bad = TermSpec {
            coupling: Some("sigma_q:spin".into()),
            ..spec
        };
        assert!(matches!(
            build_term(&bad),
            Err(ModelError::UnknownCoupling(_))
        ));
    }
}
