//! Synthetic PAH basis sets and observations for the `demo` command and tests.
//!
//! Each basis entry is a sum of Gaussian emission bands at the classic PAH
//! feature positions. Band strengths and molecular metadata are drawn from a
//! per-entry RNG seeded from `(seed, uid)`, so entries can be built in parallel
//! and still come out identical for a given seed.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;
use tracing::info;

use crate::domain::{
    AbscissaUnit, BasisEntry, BasisSet, Charge, Metadata, Observation, SizeClass, Structure, Uid,
};
use crate::error::FitError;

/// Emission features used for synthetic spectra (micron).
pub const EMISSION_FEATURES: [f64; 6] = [3.3, 6.2, 7.7, 8.6, 11.2, 12.7];

/// Catalog uids used by the demo.
pub const DEMO_UIDS: [Uid; 5] = [18, 73, 726, 2054, 223];

/// True weights of the demo observation, by uid.
pub const DEMO_MIX: [(Uid, f64); 5] = [(18, 1.0), (73, 0.5), (726, 2.0), (2054, 0.0), (223, 1.5)];

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Grid samples.
    pub points: usize,
    /// Grid range in 1/cm.
    pub x_min: f64,
    pub x_max: f64,
    /// Band width (FWHM) in 1/cm.
    pub fwhm: f64,
    pub seed: u64,
    /// Noise level as a fraction of the peak observed flux.
    pub noise: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            points: 500,
            x_min: 700.0,
            x_max: 3200.0,
            fwhm: 15.0,
            seed: 42,
            noise: 0.01,
        }
    }
}

impl SyntheticConfig {
    fn validate(&self) -> Result<(), FitError> {
        if self.points < 2 {
            return Err(FitError::InvalidInput("Synthetic grid needs at least two points.".to_string()));
        }
        if !(self.x_min.is_finite() && self.x_max.is_finite() && self.x_min > 0.0 && self.x_max > self.x_min) {
            return Err(FitError::InvalidInput(format!(
                "Invalid synthetic grid range [{}, {}].",
                self.x_min, self.x_max
            )));
        }
        if !(self.fwhm.is_finite() && self.fwhm > 0.0) {
            return Err(FitError::InvalidInput("Band FWHM must be finite and > 0.".to_string()));
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return Err(FitError::InvalidInput("Noise level must be finite and >= 0.".to_string()));
        }
        Ok(())
    }

    /// Increasing wavenumber grid.
    pub fn grid(&self) -> Vec<f64> {
        let step = (self.x_max - self.x_min) / (self.points - 1) as f64;
        (0..self.points).map(|i| self.x_min + step * i as f64).collect()
    }
}

/// Build a synthetic basis set with one entry per uid, in the given order.
pub fn synthetic_basis(uids: &[Uid], config: &SyntheticConfig) -> Result<BasisSet, FitError> {
    config.validate()?;
    let grid = config.grid();

    let entries: Vec<BasisEntry> = uids
        .par_iter()
        .map(|&uid| synthetic_entry(uid, &grid, config))
        .collect();

    info!(entries = entries.len(), samples = grid.len(), seed = config.seed, "generated synthetic basis");
    BasisSet::new(grid, entries)
}

/// Observation built from a known mix of basis entries plus Gaussian noise.
///
/// The uncertainty column is the noise standard deviation (zero when
/// `noise == 0`).
pub fn synthetic_observation(
    basis: &BasisSet,
    mix: &[(Uid, f64)],
    config: &SyntheticConfig,
) -> Result<Observation, FitError> {
    config.validate()?;
    let n = basis.grid().len();

    let mut flux = vec![0.0; n];
    for &(uid, weight) in mix {
        let entry = basis
            .get(uid)
            .ok_or_else(|| FitError::InvalidInput(format!("Mix refers to unknown uid {uid}.")))?;
        for (acc, &v) in flux.iter_mut().zip(&entry.intensity) {
            *acc += weight * v;
        }
    }

    let peak = flux.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let sigma = config.noise * peak;
    if sigma > 0.0 {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let normal = Normal::new(0.0, sigma)
            .map_err(|e| FitError::InvalidInput(format!("Noise distribution error: {e}")))?;
        for v in flux.iter_mut() {
            *v += normal.sample(&mut rng);
        }
    }

    Observation::new(AbscissaUnit::Wavenumber, basis.grid().to_vec(), flux, vec![sigma; n])
}

fn synthetic_entry(uid: Uid, grid: &[f64], config: &SyntheticConfig) -> BasisEntry {
    let mut rng = StdRng::seed_from_u64(entry_seed(config.seed, uid));

    let n_c: u32 = rng.gen_range(16..=120);
    let charge = Charge::ALL[rng.gen_range(0..Charge::ALL.len())];
    let structure = Structure::ALL[rng.gen_range(0..Structure::ALL.len())];
    let nitrogen = rng.gen_bool(0.2);
    let pure = !nitrogen && rng.gen_bool(0.8);

    // Ions are bright in the 6-9 micron C-C modes, neutrals at 3.3 micron.
    let strengths: Vec<f64> = EMISSION_FEATURES
        .iter()
        .map(|&micron| {
            let base: f64 = rng.gen_range(0.2..1.0);
            match charge {
                Charge::Neutral if micron < 4.0 => base * 2.0,
                Charge::Anion | Charge::Cation if (6.0..9.0).contains(&micron) => base * 2.0,
                _ => base,
            }
        })
        .collect();

    let sigma = config.fwhm / (8.0 * std::f64::consts::LN_2).sqrt();
    let intensity: Vec<f64> = grid
        .iter()
        .map(|&x| {
            EMISSION_FEATURES
                .iter()
                .zip(&strengths)
                .map(|(&micron, &a)| {
                    let center = AbscissaUnit::Wavenumber.from_micron(micron);
                    let z = (x - center) / sigma;
                    a * (-0.5 * z * z).exp()
                })
                .sum::<f64>()
        })
        .collect();

    BasisEntry {
        uid,
        metadata: Metadata {
            charge,
            size: SizeClass::from_carbons(n_c),
            structure,
            nitrogen,
            pure,
            n_c,
            formula: Some(format!("C{n_c}H{}", n_c / 3 + 6)),
        },
        intensity,
    }
}

fn entry_seed(seed: u64, uid: Uid) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ u64::from(uid)
}
