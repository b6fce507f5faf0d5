//! Per-entry summary table.
//!
//! One CSV row per basis entry (zero weights included), preceded by `#`
//! comment lines carrying the method and the breakdown/error summaries.

use std::io::Write;
use std::path::Path;

use crate::domain::{BasisEntry, Structure};
use crate::error::FitError;
use crate::fitted::Fitted;
use crate::io::write_atomically;

pub const TABLE_HEADER: &str = "uid,weight,solo,duo,trio,quartet,quintet,charge,size,nitrogen,pure,n_c";

/// Write the summary table for `fitted` to `path`.
pub fn write_table(path: &Path, fitted: &Fitted) -> Result<(), FitError> {
    write_atomically(path, |w| write_table_to(w, fitted))
}

fn write_table_to(w: &mut dyn Write, fitted: &Fitted) -> std::io::Result<()> {
    writeln!(w, "# method: {}", fitted.method())?;

    let breakdown = fitted
        .breakdown()
        .iter()
        .map(|(k, v)| format!("{k}={v:.6}"))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(w, "# breakdown: {breakdown}")?;

    let errors = fitted
        .error()
        .iter()
        .map(|(k, v)| format!("{k}={v:.6}"))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(w, "# errors: {errors}")?;

    writeln!(w, "{TABLE_HEADER}")?;
    for (entry, &weight) in fitted.basis().entries().iter().zip(fitted.weight_vector()) {
        writeln!(w, "{}", format_row(entry, weight))?;
    }
    Ok(())
}

fn format_row(entry: &BasisEntry, weight: f64) -> String {
    let meta = &entry.metadata;
    let one_hot = Structure::ALL
        .iter()
        .map(|&s| if s == meta.structure { "1" } else { "0" })
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{},{:.10e},{},{},{},{},{},{}",
        entry.uid,
        weight,
        one_hot,
        meta.charge.key(),
        meta.size.key(),
        u8::from(meta.nitrogen),
        u8::from(meta.pure),
        meta.n_c,
    )
}
