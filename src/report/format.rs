//! Terminal summaries of a fit.
//!
//! Formatting lives here so the fitting code stays free of presentation
//! concerns and output changes stay local.

use crate::domain::{Charge, Contribution, SizeClass, Structure};
use crate::fitted::{Breakdown, FitErrors, Fitted, RankedEntry, SizeDistribution};

/// Full run summary: inputs, breakdown, errors, size histogram.
pub fn format_fit_summary(fitted: &Fitted, distribution: &SizeDistribution) -> String {
    let mut out = String::new();

    out.push_str("=== pahfit - PAH spectrum decomposition ===\n");
    let (lo, hi) = fitted.observation().coverage();
    out.push_str(&format!(
        "Observation: n={} | {} [{lo:.3}, {hi:.3}]\n",
        fitted.observation().len(),
        fitted.observation().unit().label(),
    ));
    let active = fitted.weight_vector().iter().filter(|&&w| w > 0.0).count();
    out.push_str(&format!(
        "Basis: {} entries | {} with non-zero weight\n",
        fitted.basis().len(),
        active
    ));
    out.push_str(&format!("Method: {}\n", fitted.method()));

    out.push_str("\nBreakdown:\n");
    out.push_str(&format_breakdown(&fitted.breakdown()));

    out.push_str("\nErrors:\n");
    out.push_str(&format_errors(&fitted.error()));

    out.push_str("\nSize distribution (n_c):\n");
    out.push_str(&format_size_distribution(distribution));

    out
}

pub fn format_breakdown(b: &Breakdown) -> String {
    let group = |pairs: Vec<(&str, f64)>| -> String {
        pairs
            .into_iter()
            .map(|(k, v)| format!("{k}={v:.3}"))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let mut out = String::new();
    out.push_str(&format!(
        "- structure: {}\n",
        group(Structure::ALL.iter().map(|&s| (s.key(), b.structure(s))).collect())
    ));
    out.push_str(&format!(
        "- charge   : {}\n",
        group(Charge::ALL.iter().map(|&c| (c.key(), b.charge(c))).collect())
    ));
    out.push_str(&format!(
        "- size     : {}\n",
        group(SizeClass::ALL.iter().map(|&s| (s.key(), b.size(s))).collect())
    ));
    out.push_str(&format!("- nitrogen : {:.3}\n", b.nitrogen));
    out.push_str(&format!("- pure     : {:.3}\n", b.pure));
    out.push_str(&format!("- n_c      : {:.1}\n", b.n_c));
    out
}

pub fn format_errors(e: &FitErrors) -> String {
    let mut out = String::new();
    for (key, value) in e.iter() {
        let shown = if value.is_nan() {
            "n/a".to_string()
        } else {
            format!("{value:.4}")
        };
        out.push_str(&format!("- {key:<5}: {shown}\n"));
    }
    out
}

pub fn format_size_distribution(dist: &SizeDistribution) -> String {
    let mut out = String::new();
    for (count, edge) in dist.counts.iter().zip(dist.edges.windows(2)) {
        out.push_str(&format!("- [{:>7.1}, {:>7.1}] {count:.4}\n", edge[0], edge[1]));
    }
    out
}

/// Table of the `top_n` highest-ranked entries.
pub fn format_ranking(fitted: &Fitted, ranked: &[RankedEntry], top_n: usize, by: Contribution) -> String {
    let mut out = String::new();
    let by_label = match by {
        Contribution::Weight => "weight",
        Contribution::Flux => "flux",
    };
    out.push_str(&format!("Top {} entries by {by_label}:\n", top_n.min(ranked.len())));

    out.push_str(
        format!(
            "{:>8} {:>12} {:>12} {:<8} {:<8} {:<8} {:>5} {:<12}\n",
            "uid", "weight", "flux", "charge", "size", "edge", "n_c", "formula"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<8} {:-<12} {:-<12} {:-<8} {:-<8} {:-<8} {:-<5} {:-<12}\n",
            "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in ranked.iter().take(top_n) {
        let Some(entry) = fitted.basis().get(r.uid) else {
            continue;
        };
        let meta = &entry.metadata;
        out.push_str(
            format!(
                "{:>8} {:>12.4e} {:>12.4e} {:<8} {:<8} {:<8} {:>5} {:<12}\n",
                r.uid,
                r.weight,
                r.flux,
                meta.charge.key(),
                meta.size.key(),
                meta.structure.key(),
                meta.n_c,
                truncate(meta.formula.as_deref().unwrap_or(""), 12),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitted::test_support::{entry, fitted_with_weights};

    fn fit() -> Fitted {
        fitted_with_weights(
            vec![
                entry(18, Charge::Neutral, Structure::Solo, 24, false, true, 1.0),
                entry(73, Charge::Cation, Structure::Duo, 54, true, false, 2.0),
                entry(726, Charge::Anion, Structure::Trio, 96, false, false, 1.0),
            ],
            &[1.0, 0.0, 3.0],
        )
    }

    #[test]
    fn ranking_table_lists_top_entries() {
        let fit = fit();
        let ranked = fit.sort(Contribution::Weight);
        let table = format_ranking(&fit, &ranked, 1, Contribution::Weight);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Top 1 entries by weight:");
        assert_eq!(lines.len(), 4);
        assert!(lines[3].trim_start().starts_with("726"), "{}", lines[3]);
    }

    #[test]
    fn summary_marks_unavailable_band_errors() {
        let fit = fit();
        let text = format_fit_summary(&fit, &fit.size_distribution());
        assert!(text.contains("Method: NNLC"));
        assert!(text.contains("2 with non-zero weight"));
        // The test grid (1-4 micron) only covers the 3.3 micron band.
        assert!(text.contains("- e127 : n/a"), "{text}");
        assert!(text.contains("- e33  : 0.0000"), "{text}");
        assert!(text.contains("- n_c      : 78.0"), "{text}");
    }

    #[test]
    fn truncate_marks_cut_strings() {
        assert_eq!(truncate("C24H12", 12), "C24H12");
        assert_eq!(truncate("C128H30N2O4S", 8), "C128H30.");
    }
}
