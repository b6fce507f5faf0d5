//! Full-state export and validated import.
//!
//! `get()` snapshots a `Fitted` into a plain record; `from_record()` rebuilds a
//! `Fitted` from one, rejecting anything that would produce an inconsistent
//! result. `set()` replaces an existing value in one step.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::{BasisSet, Observation, Uid, ensure_same_grid};
use crate::error::FitError;
use crate::fitted::{FitMethod, Fitted};

/// Discriminant stored in every record.
pub const RECORD_TYPE: &str = "Fitted";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRecord {
    pub uid: Uid,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedRecord {
    /// Always `"Fitted"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub method: String,
    /// Basis order; uids missing here are zero.
    pub weights: Vec<WeightRecord>,
    pub basis: BasisSet,
    pub observation: Observation,
    pub fitted: Vec<f64>,
    pub residual: Vec<f64>,
}

impl Fitted {
    pub fn get(&self) -> FittedRecord {
        FittedRecord {
            kind: RECORD_TYPE.to_string(),
            method: self.method().to_string(),
            weights: self
                .weights()
                .map(|(uid, weight)| WeightRecord { uid, weight })
                .collect(),
            basis: self.basis().clone(),
            observation: self.observation().clone(),
            fitted: self.fitted_spectrum().to_vec(),
            residual: self.residual().to_vec(),
        }
    }

    pub fn from_record(record: FittedRecord) -> Result<Fitted, FitError> {
        if record.kind != RECORD_TYPE {
            return Err(FitError::InvalidRecord(format!(
                "expected type `{RECORD_TYPE}`, got `{}`",
                record.kind
            )));
        }
        let method = FitMethod::from_tag(&record.method)
            .ok_or_else(|| FitError::InvalidRecord(format!("unknown method `{}`", record.method)))?;

        let FittedRecord {
            weights: weight_records,
            basis,
            observation,
            fitted,
            residual,
            ..
        } = record;

        ensure_same_grid("record abscissa", basis.grid(), observation.abscissa())?;

        let n = observation.len();
        if fitted.len() != n {
            return Err(FitError::dimension("record fitted spectrum", n, fitted.len()));
        }
        if residual.len() != n {
            return Err(FitError::dimension("record residual spectrum", n, residual.len()));
        }
        if fitted.iter().chain(&residual).any(|v| !v.is_finite()) {
            return Err(FitError::InvalidRecord("spectra must be finite".to_string()));
        }

        let mut weights = vec![0.0; basis.len()];
        let mut seen = HashSet::with_capacity(weight_records.len());
        for WeightRecord { uid, weight } in weight_records {
            let pos = basis
                .position(uid)
                .ok_or_else(|| FitError::InvalidRecord(format!("weight for unknown uid {uid}")))?;
            if !seen.insert(uid) {
                return Err(FitError::InvalidRecord(format!("duplicate weight for uid {uid}")));
            }
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(FitError::InvalidRecord(format!(
                    "weight for uid {uid} must be finite and non-negative, got {weight}"
                )));
            }
            weights[pos] = weight;
        }

        Ok(Fitted::from_parts(
            Arc::new(basis),
            Arc::new(observation),
            weights,
            fitted,
            residual,
            method,
        ))
    }

    /// Replace this value with the one described by `record`.
    ///
    /// On error `self` is left untouched.
    pub fn set(&mut self, record: FittedRecord) -> Result<(), FitError> {
        *self = Fitted::from_record(record)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Charge, Structure};
    use crate::fitted::test_support::{entry, fitted_with_weights};

    fn sample() -> Fitted {
        fitted_with_weights(
            vec![
                entry(18, Charge::Neutral, Structure::Solo, 24, false, true, 1.0),
                entry(73, Charge::Cation, Structure::Duo, 54, true, false, 2.0),
            ],
            &[1.5, 0.0],
        )
    }

    #[test]
    fn get_set_round_trip() {
        let original = sample();
        let record = original.get();
        assert_eq!(record.kind, "Fitted");
        assert_eq!(record.method, "NNLC");

        let rebuilt = Fitted::from_record(record.clone()).unwrap();
        assert_eq!(rebuilt.get(), record);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"type":"Fitted""#), "{json}");
        let parsed: FittedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(Fitted::from_record(parsed).unwrap().get(), record);
    }

    #[test]
    fn wrong_type_is_rejected_and_target_unchanged() {
        let mut target = sample();
        let before = target.get();

        let mut bad = before.clone();
        bad.kind = "Spectrum".to_string();
        let err = target.set(bad).unwrap_err();
        assert!(matches!(err, FitError::InvalidRecord(_)));
        assert_eq!(target.get(), before);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let mut negative = sample().get();
        negative.weights[0].weight = -1.0;
        assert!(Fitted::from_record(negative).is_err());

        let mut unknown = sample().get();
        unknown.weights[1].uid = 999;
        assert!(Fitted::from_record(unknown).is_err());

        let mut duplicate = sample().get();
        duplicate.weights[1].uid = 18;
        assert!(Fitted::from_record(duplicate).is_err());
    }

    #[test]
    fn missing_weights_read_as_zero() {
        let mut record = sample().get();
        record.weights.retain(|w| w.uid == 18);
        let fit = Fitted::from_record(record).unwrap();
        assert_eq!(fit.weight(73), 0.0);
        assert_eq!(fit.weight(18), 1.5);
    }

    #[test]
    fn short_spectra_are_rejected() {
        let mut record = sample().get();
        record.residual.pop();
        assert!(matches!(
            Fitted::from_record(record).unwrap_err(),
            FitError::DimensionMismatch { .. }
        ));
    }
}
