//! Aggregation of fit weights into physical categories.

use serde::Serialize;

use crate::domain::{Charge, Contribution, SizeClass, Structure};
use crate::fitted::Fitted;

/// Breakdown keys, in output order.
pub const BREAKDOWN_KEYS: [&str; 14] = [
    "solo", "duo", "trio", "quartet", "quintet", "anion", "neutral", "cation", "small", "medium", "large",
    "nitrogen", "pure", "n_c",
];

/// Fractional contributions per category.
///
/// The structure, charge, and size groups each sum to one when the fit has any
/// weight at all. `nitrogen` and `pure` are the fractions of entries carrying
/// that flag. `n_c` is different in kind: it is the contribution-weighted mean
/// carbon count of the fit, not a fraction.
///
/// Field order is the output order; serializing keeps it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Breakdown {
    pub solo: f64,
    pub duo: f64,
    pub trio: f64,
    pub quartet: f64,
    pub quintet: f64,
    pub anion: f64,
    pub neutral: f64,
    pub cation: f64,
    pub small: f64,
    pub medium: f64,
    pub large: f64,
    pub nitrogen: f64,
    pub pure: f64,
    pub n_c: f64,
}

impl Breakdown {
    pub fn values(&self) -> [f64; 14] {
        [
            self.solo,
            self.duo,
            self.trio,
            self.quartet,
            self.quintet,
            self.anion,
            self.neutral,
            self.cation,
            self.small,
            self.medium,
            self.large,
            self.nitrogen,
            self.pure,
            self.n_c,
        ]
    }

    /// `(key, value)` pairs in `BREAKDOWN_KEYS` order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        BREAKDOWN_KEYS.into_iter().zip(self.values())
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn structure(&self, structure: Structure) -> f64 {
        match structure {
            Structure::Solo => self.solo,
            Structure::Duo => self.duo,
            Structure::Trio => self.trio,
            Structure::Quartet => self.quartet,
            Structure::Quintet => self.quintet,
        }
    }

    pub fn charge(&self, charge: Charge) -> f64 {
        match charge {
            Charge::Anion => self.anion,
            Charge::Neutral => self.neutral,
            Charge::Cation => self.cation,
        }
    }

    pub fn size(&self, size: SizeClass) -> f64 {
        match size {
            SizeClass::Small => self.small,
            SizeClass::Medium => self.medium,
            SizeClass::Large => self.large,
        }
    }

    fn structure_mut(&mut self, structure: Structure) -> &mut f64 {
        match structure {
            Structure::Solo => &mut self.solo,
            Structure::Duo => &mut self.duo,
            Structure::Trio => &mut self.trio,
            Structure::Quartet => &mut self.quartet,
            Structure::Quintet => &mut self.quintet,
        }
    }

    fn charge_mut(&mut self, charge: Charge) -> &mut f64 {
        match charge {
            Charge::Anion => &mut self.anion,
            Charge::Neutral => &mut self.neutral,
            Charge::Cation => &mut self.cation,
        }
    }

    fn size_mut(&mut self, size: SizeClass) -> &mut f64 {
        match size {
            SizeClass::Small => &mut self.small,
            SizeClass::Medium => &mut self.medium,
            SizeClass::Large => &mut self.large,
        }
    }
}

impl Fitted {
    /// Breakdown by raw fit weight.
    pub fn breakdown(&self) -> Breakdown {
        self.breakdown_by(Contribution::Weight)
    }

    /// Breakdown using the given per-entry contribution.
    pub fn breakdown_by(&self, by: Contribution) -> Breakdown {
        let contributions = self.contributions(by);
        let total: f64 = contributions.iter().sum();
        if !(total > 0.0) {
            return Breakdown::default();
        }

        let mut out = Breakdown::default();
        for (entry, &c) in self.basis().entries().iter().zip(&contributions) {
            if c <= 0.0 {
                continue;
            }
            let meta = &entry.metadata;
            *out.structure_mut(meta.structure) += c;
            *out.charge_mut(meta.charge) += c;
            *out.size_mut(meta.size) += c;
            if meta.nitrogen {
                out.nitrogen += c;
            }
            if meta.pure {
                out.pure += c;
            }
            out.n_c += c * f64::from(meta.n_c);
        }

        for structure in Structure::ALL {
            *out.structure_mut(structure) /= total;
        }
        for charge in Charge::ALL {
            *out.charge_mut(charge) /= total;
        }
        for size in SizeClass::ALL {
            *out.size_mut(size) /= total;
        }
        out.nitrogen /= total;
        out.pure /= total;
        out.n_c /= total;

        out
    }
}
