use crate::error::Result;
use manybody::engine::cpt::dos::CptDosResult;
use manybody::engine::cpt::spectrum::SpectrumResult;
use manybody::engine::dmrg::{GrowthResult, SweepResult};
use manybody::engine::ed::levels::LevelsResult;
use manybody::engine::tba::bands::BandsResult;
use manybody::engine::tba::berry::BerryResult;
use std::path::{Path, PathBuf};
use tracing::info;

fn target_file(out: &Path, name: &str, job: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(out)?;
    Ok(out.join(format!("{name}_{job}.csv")))
}

pub fn write_bands(out: &Path, name: &str, result: &BandsResult) -> Result<PathBuf> {
    let path = target_file(out, name, "bands")?;
    let mut writer = csv::Writer::from_path(&path)?;
    let nbands = result.energies.first().map(Vec::len).unwrap_or(0);
    let mut header = vec!["distance".to_string()];
    header.extend((0..nbands).map(|b| format!("band{b}")));
    writer.write_record(&header)?;
    for (distance, energies) in result.distances.iter().zip(&result.energies) {
        let mut record = vec![distance.to_string()];
        record.extend(energies.iter().map(f64::to_string));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote energy bands");
    Ok(path)
}

pub fn write_dos(out: &Path, name: &str, energies: &[f64], dos: &[f64]) -> Result<PathBuf> {
    let path = target_file(out, name, "dos")?;
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["energy", "dos"])?;
    for (energy, weight) in energies.iter().zip(dos) {
        writer.write_record([energy.to_string(), weight.to_string()])?;
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote density of states");
    Ok(path)
}

pub fn write_berry(out: &Path, name: &str, result: &BerryResult) -> Result<PathBuf> {
    let path = target_file(out, name, "berry")?;
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["kx", "ky", "curvature"])?;
    for (k, curvature) in result.kpoints.iter().zip(&result.curvature) {
        writer.write_record([
            k[0].to_string(),
            k.get(1).copied().unwrap_or(0.0).to_string(),
            curvature.to_string(),
        ])?;
    }
    writer.flush()?;
    info!(
        path = %path.display(),
        chern = result.chern_number,
        "wrote Berry curvature"
    );
    Ok(path)
}

pub fn write_levels(out: &Path, name: &str, result: &LevelsResult) -> Result<PathBuf> {
    let path = target_file(out, name, "levels")?;
    let mut writer = csv::Writer::from_path(&path)?;
    let ns = result.levels.first().map(Vec::len).unwrap_or(0);
    let mut header = vec!["parameter".to_string()];
    header.extend((0..ns).map(|l| format!("E{l}")));
    for order in 1..=result.derivatives.len() {
        header.extend((0..ns).map(|l| format!("d{order}E{l}")));
    }
    writer.write_record(&header)?;
    for (i, parameter) in result.parameters.iter().enumerate() {
        let mut record = vec![parameter.to_string()];
        record.extend(result.levels[i].iter().map(f64::to_string));
        for derivative in &result.derivatives {
            record.extend(derivative[i].iter().map(f64::to_string));
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote energy levels");
    Ok(path)
}

pub fn write_spectrum(out: &Path, name: &str, result: &SpectrumResult) -> Result<PathBuf> {
    let path = target_file(out, name, "spectrum")?;
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["distance", "energy", "intensity"])?;
    for (distance, row) in result.distances.iter().zip(&result.intensity) {
        for (energy, intensity) in result.energies.iter().zip(row) {
            writer.write_record([
                distance.to_string(),
                energy.to_string(),
                intensity.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote spectral function");
    Ok(path)
}

pub fn write_cpt_dos(out: &Path, name: &str, result: &CptDosResult) -> Result<PathBuf> {
    write_dos(out, name, &result.energies, &result.dos)
}

pub fn write_growth(out: &Path, name: &str, result: &GrowthResult) -> Result<PathBuf> {
    let path = target_file(out, name, "growth")?;
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([
        "nsite",
        "energy",
        "energy_per_site",
        "truncation_error",
        "kept",
    ])?;
    for step in &result.steps {
        writer.write_record([
            step.nsite.to_string(),
            step.energy.to_string(),
            step.energy_per_site.to_string(),
            step.truncation_error.to_string(),
            step.kept.to_string(),
        ])?;
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote growth trace");
    Ok(path)
}

pub fn write_sweeps(out: &Path, name: &str, result: &SweepResult) -> Result<PathBuf> {
    let path = target_file(out, name, "sweeps")?;
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record(["sweep", "energy"])?;
    for (sweep, energy) in result.sweep_energies.iter().enumerate() {
        writer.write_record([sweep.to_string(), energy.to_string()])?;
    }
    writer.flush()?;
    info!(path = %path.display(), "wrote sweep trace");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn bands_file_has_one_row_per_k_point() {
        let dir = tempdir().unwrap();
        let result = BandsResult {
            distances: vec![0.0, 1.0],
            energies: vec![vec![-1.0, 1.0], vec![-0.5, 0.5]],
        };
        let path = write_bands(dir.path(), "test", &result).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "distance,band0,band1");
        assert!(lines[1].starts_with("0,"));
    }

    #[test]
    fn dos_file_pairs_energy_and_weight() {
        let dir = tempdir().unwrap();
        let path = write_dos(dir.path(), "test", &[0.0, 0.5], &[1.0, 2.0]).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("0.5,2"));
    }

    #[test]
    fn output_directory_is_created_on_demand() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let path = write_dos(&nested, "test", &[0.0], &[0.0]).unwrap();
        assert!(path.exists());
    }
}
