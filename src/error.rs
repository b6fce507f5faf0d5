//! Error taxonomy for fitting, querying, and persistence.
//!
//! Every failure carries enough context to print a precise diagnostic, and
//! maps to a process exit code for the `pahfit` binary.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FitError {
    /// Two grids that must agree do not.
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: String,
        expected: String,
        actual: String,
    },

    #[error("Basis set contains no reference spectra")]
    EmptyBasis,

    /// The non-negative solve failed or did not converge.
    #[error("Linear system could not be solved: {reason}")]
    SingularSystem { reason: String },

    /// A diagnostic feature band lies outside the observation's coverage.
    #[error("Feature band `{band}` at {position:.3} is outside the abscissa range [{min:.3}, {max:.3}]")]
    OutOfRange {
        band: &'static str,
        position: f64,
        min: f64,
        max: f64,
    },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid fitted record: {0}")]
    InvalidRecord(String),
}

impl FitError {
    pub fn dimension(what: impl Into<String>, expected: impl ToString, actual: impl ToString) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn singular(reason: impl Into<String>) -> Self {
        Self::SingularSystem {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Exit code used by the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DimensionMismatch { .. }
            | Self::Parse { .. }
            | Self::InvalidInput(_)
            | Self::InvalidRecord(_) => 2,
            Self::EmptyBasis => 3,
            Self::SingularSystem { .. } | Self::OutOfRange { .. } => 4,
            Self::Io { .. } => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(FitError::dimension("abscissa", 10, 9).exit_code(), 2);
        assert_eq!(FitError::EmptyBasis.exit_code(), 3);
        assert_eq!(FitError::singular("diverged").exit_code(), 4);
        let io = FitError::io("/nowhere", std::io::Error::other("denied"));
        assert_eq!(io.exit_code(), 5);
    }

    #[test]
    fn dimension_mismatch_names_the_grid() {
        let msg = FitError::dimension("abscissa", 10, 9).to_string();
        assert!(msg.contains("abscissa"), "{msg}");
        assert!(msg.contains("10") && msg.contains('9'), "{msg}");
    }
}
