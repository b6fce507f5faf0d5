//! Basis and observation files.
//!
//! - basis sets are JSON (`{grid, entries: [{uid, metadata, intensity}]}`) and
//!   go through `BasisSet` validation on deserialize
//! - observations are CSV with a header row; column names are matched
//!   case-insensitively and a few common aliases are accepted
//!
//! The writers produce files the loaders accept, for `pahfit demo --write-inputs`.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use csv::StringRecord;
use tracing::info;

use crate::domain::{AbscissaUnit, BasisSet, Observation};
use crate::error::FitError;
use crate::io::write_atomically;

const ABSCISSA_COLUMNS: [&str; 4] = ["abscissa", "x", "wavenumber", "wavelength"];
const FLUX_COLUMNS: [&str; 2] = ["flux", "y"];
const UNCERTAINTY_COLUMNS: [&str; 3] = ["uncertainty", "sigma", "error"];

pub fn load_basis(path: &Path) -> Result<BasisSet, FitError> {
    let file = File::open(path).map_err(|e| FitError::io(path, e))?;
    let basis: BasisSet = serde_json::from_reader(BufReader::new(file)).map_err(|e| FitError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), entries = basis.len(), samples = basis.grid().len(), "loaded basis set");
    Ok(basis)
}

/// Load an observation CSV; a missing uncertainty column reads as zeros.
pub fn load_observation(path: &Path, unit: AbscissaUnit) -> Result<Observation, FitError> {
    let file = File::open(path).map_err(|e| FitError::io(path, e))?;
    let parse_err = |message: String| FitError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| parse_err(format!("failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let x_idx = find_column(&header_map, &ABSCISSA_COLUMNS)
        .ok_or_else(|| parse_err("missing required column: `abscissa`".to_string()))?;
    let y_idx = find_column(&header_map, &FLUX_COLUMNS)
        .ok_or_else(|| parse_err("missing required column: `flux`".to_string()))?;
    let sigma_idx = find_column(&header_map, &UNCERTAINTY_COLUMNS);

    let mut abscissa = Vec::new();
    let mut flux = Vec::new();
    let mut uncertainty = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| parse_err(format!("line {line}: {e}")))?;

        abscissa.push(parse_field(&record, x_idx, "abscissa").map_err(|m| parse_err(format!("line {line}: {m}")))?);
        flux.push(parse_field(&record, y_idx, "flux").map_err(|m| parse_err(format!("line {line}: {m}")))?);
        let sigma = match sigma_idx {
            Some(i) => parse_field(&record, i, "uncertainty").map_err(|m| parse_err(format!("line {line}: {m}")))?,
            None => 0.0,
        };
        uncertainty.push(sigma);
    }

    if abscissa.is_empty() {
        return Err(parse_err("no data rows".to_string()));
    }

    let observation = Observation::new(unit, abscissa, flux, uncertainty)?;
    info!(
        path = %path.display(),
        samples = observation.len(),
        unit = unit.label(),
        has_uncertainty = sigma_idx.is_some(),
        "loaded observation"
    );
    Ok(observation)
}

pub fn write_basis(path: &Path, basis: &BasisSet) -> Result<(), FitError> {
    write_atomically(path, |w| serde_json::to_writer(w, basis).map_err(std::io::Error::other))
}

pub fn write_observation(path: &Path, observation: &Observation) -> Result<(), FitError> {
    write_atomically(path, |w| {
        let mut writer = csv::Writer::from_writer(w);
        writer.write_record(["abscissa", "flux", "uncertainty"])?;
        for ((x, y), s) in observation
            .abscissa()
            .iter()
            .zip(observation.flux())
            .zip(observation.uncertainty())
        {
            writer.write_record([x.to_string(), y.to_string(), s.to_string()])?;
        }
        writer.flush()
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often put a BOM in front of the first header.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(header_map: &HashMap<String, usize>, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| header_map.get(*name).copied())
}

fn parse_field(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let raw = record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("missing value for `{name}`"))?;
    raw.parse::<f64>()
        .map_err(|_| format!("invalid number '{raw}' for `{name}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn observation_csv_with_aliases_and_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "obs.csv", "\u{feff}Wavenumber, Y ,Sigma\n1000,1.5,0.1\n1100,2.5,0.2\n");

        let obs = load_observation(&path, AbscissaUnit::Wavenumber).unwrap();
        assert_eq!(obs.abscissa(), &[1000.0, 1100.0]);
        assert_eq!(obs.flux(), &[1.5, 2.5]);
        assert_eq!(obs.uncertainty(), &[0.1, 0.2]);
    }

    #[test]
    fn missing_uncertainty_column_reads_as_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "obs.csv", "# comment\nabscissa,flux\n5.0,1.0\n6.0,2.0\n");

        let obs = load_observation(&path, AbscissaUnit::Wavelength).unwrap();
        assert_eq!(obs.uncertainty(), &[0.0, 0.0]);
    }

    #[test]
    fn bad_rows_report_the_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "obs.csv", "abscissa,flux\n5.0,1.0\n6.0,abc\n");

        match load_observation(&path, AbscissaUnit::Wavelength).unwrap_err() {
            FitError::Parse { message, .. } => assert!(message.contains("line 3"), "{message}"),
            other => panic!("unexpected error: {other}"),
        }

        let path = write(&dir, "noflux.csv", "abscissa,counts\n5.0,1.0\n");
        assert!(matches!(
            load_observation(&path, AbscissaUnit::Wavelength).unwrap_err(),
            FitError::Parse { .. }
        ));
    }

    #[test]
    fn written_inputs_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let obs = Observation::new(AbscissaUnit::Wavenumber, vec![700.0, 800.0], vec![0.25, 1e-7], vec![0.0, 0.5])
            .unwrap();
        let path = dir.path().join("obs.csv");
        write_observation(&path, &obs).unwrap();
        assert_eq!(load_observation(&path, AbscissaUnit::Wavenumber).unwrap(), obs);
    }

    #[test]
    fn basis_json_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let good = write(
            &dir,
            "basis.json",
            r#"{"grid":[1.0,2.0],"entries":[{"uid":18,"metadata":{"charge":"neutral","size":"small","structure":"solo","nitrogen":false,"pure":true,"n_c":24},"intensity":[0.1,0.2]}]}"#,
        );
        let basis = load_basis(&good).unwrap();
        assert_eq!(basis.uids().collect::<Vec<_>>(), [18]);

        let ragged = write(
            &dir,
            "ragged.json",
            r#"{"grid":[1.0,2.0],"entries":[{"uid":18,"metadata":{"charge":"neutral","size":"small","structure":"solo","nitrogen":false,"pure":true,"n_c":24},"intensity":[0.1]}]}"#,
        );
        assert!(matches!(load_basis(&ragged).unwrap_err(), FitError::Parse { .. }));
    }
}
