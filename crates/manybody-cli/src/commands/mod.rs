pub mod cpt;
pub mod dmrg;
pub mod ed;
pub mod tba;

use crate::cli::PathKind;
use crate::error::{CliError, Result};
use manybody::core::kspace::{self, ParamSpace};
use manybody::core::lattice::Lattice;

/// Builds the band path of a lattice: an explicit kind, or a guess from the
/// reciprocal geometry (orthogonal vectors mean a square cell).
pub(crate) fn band_path(lattice: &Lattice, kind: PathKind, nk: usize) -> Result<ParamSpace> {
    let reciprocals = lattice.reciprocals().to_vec();
    match reciprocals.len() {
        0 => Err(CliError::InvalidArgument(
            "the model has no translation vectors, so there is no band path".into(),
        )),
        1 => Ok(kspace::path(&reciprocals, &[&[0.0], &[0.5]], nk)?),
        2 => {
            let kind = match kind {
                PathKind::Auto => {
                    let cosine = reciprocals[0].dot(&reciprocals[1])
                        / (reciprocals[0].norm() * reciprocals[1].norm());
                    if cosine.abs() < 1e-8 {
                        PathKind::Square
                    } else {
                        PathKind::Hexagon
                    }
                }
                other => other,
            };
            match kind {
                PathKind::Square => Ok(kspace::square_gxm(&reciprocals, nk)?),
                _ => Ok(kspace::hexagon_gkm(&reciprocals, nk)?),
            }
        }
        n => Err(CliError::InvalidArgument(format!(
            "band paths for {n}-dimensional reciprocal cells are not predefined"
        ))),
    }
}

/// Parses a scan specifier `<id>:<from>:<to>:<samples>` into a parameter
/// space.
pub(crate) fn parse_scan(scan: &str) -> Result<ParamSpace> {
    let parts: Vec<&str> = scan.split(':').collect();
    let [id, from, to, samples] = parts.as_slice() else {
        return Err(CliError::InvalidArgument(format!(
            "scan '{scan}' does not match <id>:<from>:<to>:<samples>"
        )));
    };
    let from: f64 = from
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("bad scan start '{from}'")))?;
    let to: f64 = to
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("bad scan stop '{to}'")))?;
    let samples: usize = samples
        .parse()
        .map_err(|_| CliError::InvalidArgument(format!("bad sample count '{samples}'")))?;
    if samples < 2 {
        return Err(CliError::InvalidArgument(
            "a scan needs at least two samples".into(),
        ));
    }
    let mesh = (0..samples)
        .map(|i| from + (to - from) * i as f64 / (samples - 1) as f64)
        .collect();
    Ok(ParamSpace::single(
        id.to_string(),
        kspace::Mesh::Scalars(mesh),
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use manybody::core::lattice::registry;

    #[test]
    fn auto_path_picks_square_for_orthogonal_cells() {
        let lattice = registry::preset("S1").unwrap().lattice("S1", 1).unwrap();
        let path = band_path(&lattice, PathKind::Auto, 10).unwrap();
        assert_eq!(path.rank("k").unwrap(), 31);
    }

    #[test]
    fn auto_path_picks_hexagon_for_oblique_cells() {
        let lattice = registry::preset("H2").unwrap().lattice("H2", 1).unwrap();
        let path = band_path(&lattice, PathKind::Auto, 10).unwrap();
        assert_eq!(path.rank("k").unwrap(), 31);
    }

    #[test]
    fn scan_parses_into_a_linear_mesh() {
        let space = parse_scan("U:0:8:5").unwrap();
        assert_eq!(space.rank("U").unwrap(), 5);
        let kspace::Mesh::Scalars(mesh) = space.mesh("U").unwrap() else {
            panic!("scan mesh must be scalar");
        };
        assert!((mesh[4] - 8.0).abs() < 1e-12);
        assert!((mesh[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn malformed_scan_is_rejected() {
        assert!(matches!(
            parse_scan("U:0:8"),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
