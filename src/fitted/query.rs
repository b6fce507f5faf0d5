//! Rankings, size histogram, and component spectra.

use serde::Serialize;

use crate::domain::{Charge, Composition, Contribution, Grouping, SizeClass, Uid};
use crate::error::FitError;
use crate::fitted::Fitted;

/// Histogram bins used by `size_distribution`.
pub const DEFAULT_SIZE_BINS: usize = 3;

/// One entry of a ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedEntry {
    pub uid: Uid,
    pub weight: f64,
    /// Weight times integrated intensity.
    pub flux: f64,
}

/// Weight-weighted histogram of carbon counts.
///
/// `edges.len() == counts.len() + 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeDistribution {
    pub counts: Vec<f64>,
    pub edges: Vec<f64>,
}

/// Summed spectrum of every entry in one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub label: &'static str,
    pub spectrum: Vec<f64>,
}

impl Fitted {
    /// Entries with non-zero weight, most important first.
    ///
    /// `Weight` ranks by raw weight, `Flux` by share of fitted flux. Ties keep
    /// basis order.
    pub fn sort(&self, by: Contribution) -> Vec<RankedEntry> {
        let flux = self.contributions(Contribution::Flux);
        let mut ranked: Vec<RankedEntry> = self
            .weights()
            .zip(flux)
            .filter(|((_, w), _)| *w > 0.0)
            .map(|((uid, weight), flux)| RankedEntry { uid, weight, flux })
            .collect();

        let key = |e: &RankedEntry| match by {
            Contribution::Weight => e.weight,
            Contribution::Flux => e.flux,
        };
        ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
        ranked
    }

    pub fn size_distribution(&self) -> SizeDistribution {
        histogram(self.size_samples(), DEFAULT_SIZE_BINS)
    }

    pub fn size_distribution_with(&self, bins: usize) -> Result<SizeDistribution, FitError> {
        if bins == 0 {
            return Err(FitError::InvalidInput("Size distribution needs at least one bin.".to_string()));
        }
        Ok(histogram(self.size_samples(), bins))
    }

    /// Component spectra per category of `grouping`, in category order.
    ///
    /// Categories without any weighted entry are omitted.
    pub fn components(&self, grouping: Grouping) -> Vec<Component> {
        let labels: Vec<&'static str> = match grouping {
            Grouping::Size => SizeClass::ALL.iter().map(|s| s.key()).collect(),
            Grouping::Charge => Charge::ALL.iter().map(|c| c.key()).collect(),
            Grouping::Composition => Composition::ALL.iter().map(|c| c.key()).collect(),
        };
        let n = self.observation().len();

        let mut out: Vec<Component> = labels
            .into_iter()
            .map(|label| Component {
                label,
                spectrum: vec![0.0; n],
            })
            .collect();
        let mut used = vec![false; out.len()];

        for (entry, &w) in self.basis().entries().iter().zip(self.weight_vector()) {
            if w <= 0.0 {
                continue;
            }
            let meta = &entry.metadata;
            let slot = match grouping {
                Grouping::Size => SizeClass::ALL.iter().position(|&s| s == meta.size),
                Grouping::Charge => Charge::ALL.iter().position(|&c| c == meta.charge),
                Grouping::Composition => Composition::ALL.iter().position(|&c| c == meta.composition()),
            };
            let Some(slot) = slot else { continue };
            used[slot] = true;
            for (acc, &v) in out[slot].spectrum.iter_mut().zip(&entry.intensity) {
                *acc += w * v;
            }
        }

        out.into_iter()
            .zip(used)
            .filter_map(|(c, u)| u.then_some(c))
            .collect()
    }

    fn size_samples(&self) -> Vec<(f64, f64)> {
        self.basis()
            .entries()
            .iter()
            .zip(self.weight_vector())
            .filter(|(_, w)| **w > 0.0)
            .map(|(e, &w)| (f64::from(e.metadata.n_c), w))
            .collect()
    }
}

/// Linear-bin histogram of `(value, weight)` samples; last bin is closed.
fn histogram(samples: Vec<(f64, f64)>, bins: usize) -> SizeDistribution {
    let (lo, hi) = if samples.is_empty() {
        (0.0, 1.0)
    } else {
        let min = samples.iter().map(|s| s.0).fold(f64::INFINITY, f64::min);
        let max = samples.iter().map(|s| s.0).fold(f64::NEG_INFINITY, f64::max);
        if max > min { (min, max) } else { (min - 0.5, max + 0.5) }
    };

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut counts = vec![0.0; bins];
    for (value, weight) in samples {
        let idx = (((value - lo) / width).floor().max(0.0) as usize).min(bins - 1);
        counts[idx] += weight;
    }

    SizeDistribution { counts, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitted::test_support::{entry, fitted_with_weights};
    use crate::domain::Structure;

    fn five_entry_fit() -> Fitted {
        fitted_with_weights(
            vec![
                entry(18, Charge::Neutral, Structure::Solo, 24, false, true, 1.0),
                entry(73, Charge::Cation, Structure::Duo, 32, false, true, 2.0),
                entry(726, Charge::Anion, Structure::Trio, 54, true, false, 0.5),
                entry(2054, Charge::Neutral, Structure::Quartet, 66, false, true, 1.5),
                entry(223, Charge::Cation, Structure::Solo, 96, false, false, 1.0),
            ],
            &[1.0, 0.5, 2.0, 0.0, 1.5],
        )
    }

    #[test]
    fn sort_by_weight_and_flux_differ() {
        // Equal weights; the second entry is brighter.
        let fit = fitted_with_weights(
            vec![
                entry(1, Charge::Neutral, Structure::Solo, 20, false, true, 1.0),
                entry(2, Charge::Neutral, Structure::Solo, 20, false, true, 4.0),
            ],
            &[1.0, 1.0],
        );
        let by_weight: Vec<Uid> = fit.sort(Contribution::Weight).iter().map(|e| e.uid).collect();
        let by_flux: Vec<Uid> = fit.sort(Contribution::Flux).iter().map(|e| e.uid).collect();
        assert_eq!(by_weight, [1, 2]);
        assert_eq!(by_flux, [2, 1]);
        assert_ne!(fit.sort(Contribution::Weight), fit.sort(Contribution::Flux));
    }

    #[test]
    fn sort_skips_zero_weights_and_orders_descending() {
        let ranked = five_entry_fit().sort(Contribution::Weight);
        let uids: Vec<Uid> = ranked.iter().map(|e| e.uid).collect();
        assert_eq!(uids, [726, 223, 18, 73]);
        // flux = weight * integrated intensity (grid spans 3 units)
        assert!((ranked[0].flux - 2.0 * 0.5 * 3.0).abs() < 1e-12);
    }

    #[test]
    fn size_distribution_shape() {
        let dist = five_entry_fit().size_distribution();
        assert_eq!(dist.counts.len(), 3);
        assert_eq!(dist.edges.len(), 4);
        assert_eq!(dist.edges[0], 24.0);
        assert_eq!(dist.edges[3], 96.0);
        // 24, 32 -> first bin; 54 -> second; 96 -> last (closed on the right).
        assert_eq!(dist.counts, vec![1.5, 2.0, 1.5]);
    }

    #[test]
    fn size_distribution_handles_single_size_and_bad_bins() {
        let fit = fitted_with_weights(
            vec![entry(1, Charge::Neutral, Structure::Solo, 24, false, true, 1.0)],
            &[2.0],
        );
        let dist = fit.size_distribution_with(2).unwrap();
        assert_eq!(dist.edges, vec![23.5, 24.0, 24.5]);
        assert_eq!(dist.counts, vec![0.0, 2.0]);
        assert!(fit.size_distribution_with(0).is_err());
    }

    #[test]
    fn components_sum_to_fitted_spectrum() {
        let fit = five_entry_fit();
        let parts = fit.components(Grouping::Charge);
        let labels: Vec<&str> = parts.iter().map(|c| c.label).collect();
        assert_eq!(labels, ["anion", "neutral", "cation"]);

        for i in 0..fit.fitted_spectrum().len() {
            let total: f64 = parts.iter().map(|c| c.spectrum[i]).sum();
            assert!((total - fit.fitted_spectrum()[i]).abs() < 1e-12);
        }

        let composition: Vec<&str> = fit.components(Grouping::Composition).iter().map(|c| c.label).collect();
        assert_eq!(composition, ["pure", "nitrogen", "other"]);
    }
}
