//! Input/output helpers.
//!
//! - basis JSON + observation CSV ingest (`ingest`)
//! - per-entry summary table (`table`)
//! - fitted record JSON read/write (`record`)
//!
//! Every writer goes through `write_atomically`, so a failed write never
//! leaves a partial file at the destination.

pub mod ingest;
pub mod record;
pub mod table;

use std::io::{BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::FitError;

pub use ingest::*;
pub use record::*;
pub use table::*;

/// Write `path` through a temporary file in the same directory, then rename.
pub(crate) fn write_atomically<F>(path: &Path, write: F) -> Result<(), FitError>
where
    F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| FitError::io(path, e))?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        write(&mut out).map_err(|e| FitError::io(path, e))?;
        out.flush().map_err(|e| FitError::io(path, e))?;
    }
    tmp.persist(path).map_err(|e| FitError::io(path, e.error))?;
    Ok(())
}
