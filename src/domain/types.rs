//! Shared domain types.
//!
//! These types are kept serializable so they can be:
//!
//! - loaded from a basis/observation file
//! - embedded in a fitted record (JSON) and reloaded later
//! - rendered into tables and plots

use std::collections::HashMap;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Catalog identifier of a basis entry.
pub type Uid = u32;

/// Relative tolerance used when comparing two abscissa grids.
pub const GRID_RTOL: f64 = 1e-9;

/// Molecular charge state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charge {
    Anion,
    Neutral,
    Cation,
}

impl Charge {
    pub const ALL: [Charge; 3] = [Charge::Anion, Charge::Neutral, Charge::Cation];

    pub fn key(self) -> &'static str {
        match self {
            Charge::Anion => "anion",
            Charge::Neutral => "neutral",
            Charge::Cation => "cation",
        }
    }
}

/// Size class by carbon atom count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    pub const ALL: [SizeClass; 3] = [SizeClass::Small, SizeClass::Medium, SizeClass::Large];

    /// Largest carbon count still classed as small, plus one.
    pub const SMALL_BELOW: u32 = 50;
    /// Largest carbon count classed as medium.
    pub const MEDIUM_UP_TO: u32 = 70;

    /// Classify a carbon count with the default thresholds.
    pub fn from_carbons(n_c: u32) -> Self {
        if n_c < Self::SMALL_BELOW {
            SizeClass::Small
        } else if n_c <= Self::MEDIUM_UP_TO {
            SizeClass::Medium
        } else {
            SizeClass::Large
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        }
    }
}

/// Edge structure: the number of adjacent CH groups on the dominant edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    Solo,
    Duo,
    Trio,
    Quartet,
    Quintet,
}

impl Structure {
    pub const ALL: [Structure; 5] = [
        Structure::Solo,
        Structure::Duo,
        Structure::Trio,
        Structure::Quartet,
        Structure::Quintet,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Structure::Solo => "solo",
            Structure::Duo => "duo",
            Structure::Trio => "trio",
            Structure::Quartet => "quartet",
            Structure::Quintet => "quintet",
        }
    }
}

/// Chemical composition, derived from the heteroatom and purity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Composition {
    Pure,
    Nitrogen,
    Other,
}

impl Composition {
    pub const ALL: [Composition; 3] = [Composition::Pure, Composition::Nitrogen, Composition::Other];

    pub fn key(self) -> &'static str {
        match self {
            Composition::Pure => "pure",
            Composition::Nitrogen => "nitrogen",
            Composition::Other => "other",
        }
    }
}

/// Fixed per-molecule metadata attached to each basis entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub charge: Charge,
    pub size: SizeClass,
    pub structure: Structure,
    /// Nitrogen-substituted.
    pub nitrogen: bool,
    /// Pure carbon/hydrogen species.
    pub pure: bool,
    /// Carbon atom count.
    pub n_c: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Metadata {
    pub fn composition(&self) -> Composition {
        if self.nitrogen {
            Composition::Nitrogen
        } else if self.pure {
            Composition::Pure
        } else {
            Composition::Other
        }
    }
}

/// One reference spectrum and its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisEntry {
    pub uid: Uid,
    pub metadata: Metadata,
    /// Intensity per grid sample of the owning basis set.
    pub intensity: Vec<f64>,
}

/// Ordered basis entries on a shared abscissa grid.
///
/// Insertion order defines the column order of the fit matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BasisSetFile", into = "BasisSetFile")]
pub struct BasisSet {
    grid: Vec<f64>,
    entries: Vec<BasisEntry>,
    index: HashMap<Uid, usize>,
}

/// On-disk shape of a basis set.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BasisSetFile {
    grid: Vec<f64>,
    entries: Vec<BasisEntry>,
}

impl BasisSet {
    pub fn new(grid: Vec<f64>, entries: Vec<BasisEntry>) -> Result<Self, FitError> {
        if entries.is_empty() {
            return Err(FitError::EmptyBasis);
        }
        ensure_grid("basis grid", &grid)?;

        let mut index = HashMap::with_capacity(entries.len());
        for (pos, entry) in entries.iter().enumerate() {
            if entry.intensity.len() != grid.len() {
                return Err(FitError::dimension(
                    format!("intensity of basis entry {}", entry.uid),
                    grid.len(),
                    entry.intensity.len(),
                ));
            }
            if entry.intensity.iter().any(|v| !v.is_finite()) {
                return Err(FitError::InvalidInput(format!(
                    "Basis entry {} has non-finite intensities.",
                    entry.uid
                )));
            }
            if index.insert(entry.uid, pos).is_some() {
                return Err(FitError::InvalidInput(format!(
                    "Duplicate basis entry uid {}.",
                    entry.uid
                )));
            }
        }

        Ok(Self { grid, entries, index })
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn entries(&self) -> &[BasisEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed set; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, uid: Uid) -> Option<&BasisEntry> {
        self.position(uid).map(|pos| &self.entries[pos])
    }

    /// Column index of `uid` in the fit matrix.
    pub fn position(&self, uid: Uid) -> Option<usize> {
        self.index.get(&uid).copied()
    }

    pub fn uids(&self) -> impl Iterator<Item = Uid> + '_ {
        self.entries.iter().map(|e| e.uid)
    }
}

impl TryFrom<BasisSetFile> for BasisSet {
    type Error = FitError;

    fn try_from(file: BasisSetFile) -> Result<Self, Self::Error> {
        BasisSet::new(file.grid, file.entries)
    }
}

impl From<BasisSet> for BasisSetFile {
    fn from(set: BasisSet) -> Self {
        BasisSetFile {
            grid: set.grid,
            entries: set.entries,
        }
    }
}

/// Abscissa unit of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AbscissaUnit {
    /// Wavenumber in 1/cm.
    Wavenumber,
    /// Wavelength in micron.
    Wavelength,
}

impl AbscissaUnit {
    pub fn label(self) -> &'static str {
        match self {
            AbscissaUnit::Wavenumber => "wavenumber [1/cm]",
            AbscissaUnit::Wavelength => "wavelength [micron]",
        }
    }

    /// Express a wavelength (micron) in this unit.
    pub fn from_micron(self, micron: f64) -> f64 {
        match self {
            AbscissaUnit::Wavenumber => 1e4 / micron,
            AbscissaUnit::Wavelength => micron,
        }
    }

    /// Express a value in this unit as a wavelength (micron).
    pub fn to_micron(self, value: f64) -> f64 {
        match self {
            AbscissaUnit::Wavenumber => 1e4 / value,
            AbscissaUnit::Wavelength => value,
        }
    }
}

/// A measured spectrum on the basis grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObservationFile", into = "ObservationFile")]
pub struct Observation {
    unit: AbscissaUnit,
    abscissa: Vec<f64>,
    flux: Vec<f64>,
    uncertainty: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObservationFile {
    unit: AbscissaUnit,
    abscissa: Vec<f64>,
    flux: Vec<f64>,
    uncertainty: Vec<f64>,
}

impl Observation {
    pub fn new(
        unit: AbscissaUnit,
        abscissa: Vec<f64>,
        flux: Vec<f64>,
        uncertainty: Vec<f64>,
    ) -> Result<Self, FitError> {
        ensure_grid("observation abscissa", &abscissa)?;
        if abscissa.iter().any(|&x| x <= 0.0) {
            return Err(FitError::InvalidInput(
                "Observation abscissa must be strictly positive.".to_string(),
            ));
        }
        if flux.len() != abscissa.len() {
            return Err(FitError::dimension("observation flux", abscissa.len(), flux.len()));
        }
        if uncertainty.len() != abscissa.len() {
            return Err(FitError::dimension(
                "observation uncertainty",
                abscissa.len(),
                uncertainty.len(),
            ));
        }
        if flux.iter().any(|v| !v.is_finite()) {
            return Err(FitError::InvalidInput("Observation flux must be finite.".to_string()));
        }
        if uncertainty.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(FitError::InvalidInput(
                "Observation uncertainty must be finite and non-negative.".to_string(),
            ));
        }

        Ok(Self {
            unit,
            abscissa,
            flux,
            uncertainty,
        })
    }

    pub fn unit(&self) -> AbscissaUnit {
        self.unit
    }

    pub fn abscissa(&self) -> &[f64] {
        &self.abscissa
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn uncertainty(&self) -> &[f64] {
        &self.uncertainty
    }

    pub fn len(&self) -> usize {
        self.abscissa.len()
    }

    pub fn is_empty(&self) -> bool {
        self.abscissa.is_empty()
    }

    /// `(min, max)` of the abscissa, regardless of grid direction.
    pub fn coverage(&self) -> (f64, f64) {
        let first = self.abscissa[0];
        let last = self.abscissa[self.abscissa.len() - 1];
        (first.min(last), first.max(last))
    }

    /// Copy of this observation with the abscissa expressed in `unit`.
    ///
    /// Sample order is preserved, so the grid direction flips when the unit
    /// actually changes.
    pub fn abscissa_units_to(&self, unit: AbscissaUnit) -> Observation {
        if unit == self.unit {
            return self.clone();
        }
        let abscissa = self
            .abscissa
            .iter()
            .map(|&x| unit.from_micron(self.unit.to_micron(x)))
            .collect();
        Observation {
            unit,
            abscissa,
            flux: self.flux.clone(),
            uncertainty: self.uncertainty.clone(),
        }
    }
}

impl TryFrom<ObservationFile> for Observation {
    type Error = FitError;

    fn try_from(file: ObservationFile) -> Result<Self, Self::Error> {
        Observation::new(file.unit, file.abscissa, file.flux, file.uncertainty)
    }
}

impl From<Observation> for ObservationFile {
    fn from(obs: Observation) -> Self {
        ObservationFile {
            unit: obs.unit,
            abscissa: obs.abscissa,
            flux: obs.flux,
            uncertainty: obs.uncertainty,
        }
    }
}

/// What a basis entry contributes when ranking or aggregating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Contribution {
    /// The raw fit weight.
    #[default]
    Weight,
    /// Weight times the entry's integrated intensity.
    Flux,
}

/// Breakdown dimension used to split the fit into component spectra.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grouping {
    Size,
    Charge,
    Composition,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub basis_path: PathBuf,
    pub observation_path: PathBuf,
    pub unit: AbscissaUnit,

    /// Histogram bins for the size distribution.
    pub size_bins: usize,
    /// Rank by flux contribution instead of raw weight.
    pub rank_by_flux: bool,
    pub top_n: usize,

    pub max_iter: Option<usize>,

    pub export_table: Option<PathBuf>,
    pub export_record: Option<PathBuf>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            basis_path: PathBuf::from("basis.json"),
            observation_path: PathBuf::from("observation.csv"),
            unit: AbscissaUnit::Wavenumber,
            size_bins: 3,
            rank_by_flux: false,
            top_n: 10,
            max_iter: None,
            export_table: None,
            export_record: None,
        }
    }
}

impl FitConfig {
    pub fn contribution(&self) -> Contribution {
        if self.rank_by_flux {
            Contribution::Flux
        } else {
            Contribution::Weight
        }
    }
}

/// Check that `values` is a non-empty, finite, strictly monotonic grid.
pub(crate) fn ensure_grid(what: &str, values: &[f64]) -> Result<(), FitError> {
    if values.is_empty() {
        return Err(FitError::InvalidInput(format!("{what} is empty.")));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(FitError::InvalidInput(format!("{what} contains non-finite values.")));
    }
    if values.len() > 1 {
        let increasing = values.windows(2).all(|w| w[1] > w[0]);
        let decreasing = values.windows(2).all(|w| w[1] < w[0]);
        if !(increasing || decreasing) {
            return Err(FitError::InvalidInput(format!("{what} is not strictly monotonic.")));
        }
    }
    Ok(())
}

/// Compare two grids sample by sample.
pub(crate) fn ensure_same_grid(what: &str, expected: &[f64], actual: &[f64]) -> Result<(), FitError> {
    if expected.len() != actual.len() {
        return Err(FitError::dimension(what, expected.len(), actual.len()));
    }
    for (i, (&a, &b)) in expected.iter().zip(actual).enumerate() {
        let scale = a.abs().max(b.abs()).max(1.0);
        if (a - b).abs() > GRID_RTOL * scale {
            return Err(FitError::dimension(
                format!("{what} sample {i}"),
                format!("{a}"),
                format!("{b}"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(n_c: u32) -> Metadata {
        Metadata {
            charge: Charge::Neutral,
            size: SizeClass::from_carbons(n_c),
            structure: Structure::Duo,
            nitrogen: false,
            pure: true,
            n_c,
            formula: None,
        }
    }

    #[test]
    fn size_class_thresholds() {
        assert_eq!(SizeClass::from_carbons(24), SizeClass::Small);
        assert_eq!(SizeClass::from_carbons(50), SizeClass::Medium);
        assert_eq!(SizeClass::from_carbons(70), SizeClass::Medium);
        assert_eq!(SizeClass::from_carbons(96), SizeClass::Large);
    }

    #[test]
    fn basis_set_rejects_empty_and_ragged_entries() {
        let err = BasisSet::new(vec![1.0, 2.0], Vec::new()).unwrap_err();
        assert!(matches!(err, FitError::EmptyBasis));

        let ragged = vec![BasisEntry {
            uid: 7,
            metadata: meta(24),
            intensity: vec![1.0],
        }];
        let err = BasisSet::new(vec![1.0, 2.0], ragged).unwrap_err();
        assert!(matches!(err, FitError::DimensionMismatch { .. }));
    }

    #[test]
    fn basis_set_rejects_duplicate_uids() {
        let entry = BasisEntry {
            uid: 7,
            metadata: meta(24),
            intensity: vec![1.0, 0.0],
        };
        let err = BasisSet::new(vec![1.0, 2.0], vec![entry.clone(), entry]).unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));
    }

    #[test]
    fn basis_set_json_goes_through_validation() {
        let json = r#"{"grid":[1.0,2.0],"entries":[]}"#;
        assert!(serde_json::from_str::<BasisSet>(json).is_err());

        let json = r#"{"grid":[1.0,2.0],"entries":[{"uid":3,"metadata":{"charge":"cation","size":"small","structure":"trio","nitrogen":true,"pure":false,"n_c":16},"intensity":[0.5,1.5]}]}"#;
        let set: BasisSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.position(3), Some(0));
        assert_eq!(set.get(3).unwrap().metadata.composition(), Composition::Nitrogen);
    }

    #[test]
    fn observation_validates_shapes() {
        let err = Observation::new(AbscissaUnit::Wavenumber, vec![1.0, 2.0], vec![1.0], vec![0.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, FitError::DimensionMismatch { .. }));

        let err = Observation::new(
            AbscissaUnit::Wavenumber,
            vec![1.0, 3.0, 2.0],
            vec![1.0; 3],
            vec![0.0; 3],
        )
        .unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));

        let err = Observation::new(AbscissaUnit::Wavenumber, vec![1.0, 2.0], vec![1.0; 2], vec![-1.0, 0.0])
            .unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));
    }

    #[test]
    fn unit_conversion_flips_wavenumber_to_micron() {
        let obs = Observation::new(
            AbscissaUnit::Wavenumber,
            vec![1000.0, 2000.0],
            vec![1.0, 2.0],
            vec![0.1, 0.1],
        )
        .unwrap();
        let um = obs.abscissa_units_to(AbscissaUnit::Wavelength);
        assert_eq!(um.unit(), AbscissaUnit::Wavelength);
        assert!((um.abscissa()[0] - 10.0).abs() < 1e-12);
        assert!((um.abscissa()[1] - 5.0).abs() < 1e-12);
        assert_eq!(um.flux(), obs.flux());
        assert_eq!(um.coverage(), (5.0, 10.0));
    }

    #[test]
    fn grid_comparison_reports_first_differing_sample() {
        let err = ensure_same_grid("abscissa", &[1.0, 2.0, 3.0], &[1.0, 2.5, 3.0]).unwrap_err();
        match err {
            FitError::DimensionMismatch { what, .. } => assert_eq!(what, "abscissa sample 1"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(ensure_same_grid("abscissa", &[1.0, 2.0], &[1.0, 2.0 + 1e-12]).is_ok());
    }
}
