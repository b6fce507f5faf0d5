//! Read/write fitted record JSON files.
//!
//! The record is the portable form of a fit: weights, both spectra, and the
//! full basis set and observation, so `show` can re-render without refitting.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::FitError;
use crate::fitted::{Fitted, FittedRecord};
use crate::io::write_atomically;

pub fn write_record(path: &Path, fitted: &Fitted) -> Result<(), FitError> {
    let record = fitted.get();
    write_atomically(path, |w| serde_json::to_writer_pretty(w, &record).map_err(std::io::Error::other))
}

/// Read a record without validating it against its own basis.
pub fn read_record(path: &Path) -> Result<FittedRecord, FitError> {
    let file = File::open(path).map_err(|e| FitError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| FitError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl Fitted {
    pub fn write_record(&self, path: &Path) -> Result<(), FitError> {
        write_record(path, self)
    }

    /// Read and validate a record in one step.
    pub fn read_record(path: &Path) -> Result<Fitted, FitError> {
        Fitted::from_record(read_record(path)?)
    }
}
