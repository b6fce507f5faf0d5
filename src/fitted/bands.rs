//! Residual diagnostics: a global error and five feature-band errors.
//!
//! - `err` is `||residual||_2 / ||flux||_2` over the full grid.
//! - each band error is the RMS of `residual / sigma` over the samples inside
//!   the band window (unscaled where `sigma == 0`), falling back to the single
//!   sample nearest the rest position when the window holds no sample.
//!
//! Band positions are rest wavelengths in micron and are converted to the
//! observation's abscissa unit before lookup.

use serde::Serialize;
use tracing::warn;

use crate::error::FitError;
use crate::fitted::Fitted;
use crate::math::norm2;

/// Error keys, in output order.
pub const ERROR_KEYS: [&str; 6] = ["err", "e127", "e112", "e77", "e62", "e33"];

/// A diagnostic PAH emission feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBand {
    pub key: &'static str,
    /// Rest wavelength (micron).
    pub rest: f64,
    /// Wavelength window (micron), `lo < hi`.
    pub window: (f64, f64),
}

pub const FEATURE_BANDS: [FeatureBand; 5] = [
    FeatureBand {
        key: "e127",
        rest: 12.7,
        window: (12.2, 13.0),
    },
    FeatureBand {
        key: "e112",
        rest: 11.2,
        window: (10.6, 11.6),
    },
    FeatureBand {
        key: "e77",
        rest: 7.7,
        window: (7.3, 8.3),
    },
    FeatureBand {
        key: "e62",
        rest: 6.2,
        window: (5.9, 6.6),
    },
    FeatureBand {
        key: "e33",
        rest: 3.3,
        window: (3.1, 3.4),
    },
];

/// Fit error summary. Field order is the output order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitErrors {
    pub err: f64,
    pub e127: f64,
    pub e112: f64,
    pub e77: f64,
    pub e62: f64,
    pub e33: f64,
}

impl FitErrors {
    pub fn values(&self) -> [f64; 6] {
        [self.err, self.e127, self.e112, self.e77, self.e62, self.e33]
    }

    /// `(key, value)` pairs in `ERROR_KEYS` order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        ERROR_KEYS.into_iter().zip(self.values())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    fn from_parts(err: f64, bands: [f64; 5]) -> Self {
        let [e127, e112, e77, e62, e33] = bands;
        Self {
            err,
            e127,
            e112,
            e77,
            e62,
            e33,
        }
    }
}

impl Fitted {
    /// Error summary; bands outside the abscissa coverage report NaN.
    pub fn error(&self) -> FitErrors {
        let mut bands = [f64::NAN; 5];
        for (slot, band) in bands.iter_mut().zip(FEATURE_BANDS.iter()) {
            match self.band_error(band) {
                Ok(v) => *slot = v,
                Err(e) => warn!(band = band.key, error = %e, "band error unavailable"),
            }
        }
        FitErrors::from_parts(self.global_error(), bands)
    }

    /// Error summary that fails on the first band outside the coverage.
    pub fn try_error(&self) -> Result<FitErrors, FitError> {
        let mut bands = [0.0; 5];
        for (slot, band) in bands.iter_mut().zip(FEATURE_BANDS.iter()) {
            *slot = self.band_error(band)?;
        }
        Ok(FitErrors::from_parts(self.global_error(), bands))
    }

    /// `||residual|| / ||flux||`; NaN for an all-zero observation.
    pub fn global_error(&self) -> f64 {
        let flux_norm = norm2(self.observation().flux());
        if flux_norm == 0.0 {
            return f64::NAN;
        }
        norm2(self.residual()) / flux_norm
    }

    pub fn band_error(&self, band: &FeatureBand) -> Result<f64, FitError> {
        let obs = self.observation();
        let unit = obs.unit();
        let x = obs.abscissa();
        let (min, max) = obs.coverage();

        let position = unit.from_micron(band.rest);
        if position < min || position > max {
            return Err(FitError::OutOfRange {
                band: band.key,
                position,
                min,
                max,
            });
        }

        let a = unit.from_micron(band.window.0);
        let b = unit.from_micron(band.window.1);
        let (lo, hi) = (a.min(b), a.max(b));

        let mut idx: Vec<usize> = (0..x.len()).filter(|&i| x[i] >= lo && x[i] <= hi).collect();
        if idx.is_empty() {
            let nearest = (0..x.len())
                .min_by(|&i, &j| (x[i] - position).abs().total_cmp(&(x[j] - position).abs()))
                .unwrap_or(0);
            idx.push(nearest);
        }

        let residual = self.residual();
        let sigma = obs.uncertainty();
        let sum_sq: f64 = idx
            .iter()
            .map(|&i| {
                let r = if sigma[i] > 0.0 {
                    residual[i] / sigma[i]
                } else {
                    residual[i]
                };
                r * r
            })
            .sum();

        Ok((sum_sq / idx.len() as f64).sqrt())
    }
}
