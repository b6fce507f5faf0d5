//! ASCII plotting for terminal output and `txt` figures.
//!
//! Fixed-size character grid, deterministic output:
//! - observed samples: `o`
//! - fitted spectrum: `-`
//! - components: first letter of the category
//! - uncertainty: `|`
//! - residual panel: `*` around a `.` zero line

use crate::plot::{Figure, HistogramFigure, Series, SpectrumFigure};

pub(crate) fn render_figure(figure: &Figure, width: usize, height: usize) -> String {
    match figure {
        Figure::Spectrum(fig) => render_spectrum(fig, width, height),
        Figure::Histogram(fig) => render_histogram(fig, width),
    }
}

fn render_spectrum(fig: &SpectrumFigure, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = x_range(&fig.series).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(&fig.series, fig.errors.as_deref()).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first so that points overlay them.
    for s in fig.series.iter().filter(|s| !s.points_only) {
        draw_curve(&mut grid, &s.data, s.glyph, (x_min, x_max), (y_min, y_max));
    }
    if let Some(errors) = &fig.errors {
        for &(x, y, s) in errors {
            if s > 0.0 {
                let col = map_x(x, x_min, x_max, width);
                let top = map_y(y + s, y_min, y_max, height);
                let bottom = map_y(y - s, y_min, y_max, height);
                draw_line(&mut grid, col, top, col, bottom, '|');
            }
        }
    }
    for s in fig.series.iter().filter(|s| s.points_only) {
        for &(x, y) in &s.data {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = s.glyph;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{}: x=[{x_min:.3}, {x_max:.3}] {} | y=[{y_min:.3e}, {y_max:.3e}] {}\n",
        fig.title, fig.x_label, fig.y_label
    ));
    push_grid(&mut out, grid);

    if let Some(residual) = &fig.residual {
        let rows = (height / 3).max(3);
        let (r_min, r_max) = residual
            .iter()
            .map(|&(_, r)| r)
            .fold(None, |acc: Option<(f64, f64)>, r| match acc {
                Some((lo, hi)) => Some((lo.min(r), hi.max(r))),
                None => Some((r, r)),
            })
            .unwrap_or((0.0, 0.0));
        // Keep zero inside the panel.
        let (r_min, r_max) = pad_range(r_min.min(0.0), r_max.max(0.0), 0.05);

        let mut panel = vec![vec![' '; width]; rows];
        let zero = map_y(0.0, r_min, r_max, rows);
        draw_line(&mut panel, 0, zero, width - 1, zero, '.');
        for &(x, r) in residual {
            panel[map_y(r, r_min, r_max, rows)][map_x(x, x_min, x_max, width)] = '*';
        }
        out.push_str(&format!("residual: [{r_min:.3e}, {r_max:.3e}]\n"));
        push_grid(&mut out, panel);
    }

    let legend: Vec<String> = fig.series.iter().map(|s| format!("{} {}", s.glyph, s.label)).collect();
    out.push_str(&legend.join("  "));
    out.push('\n');
    out
}

fn render_histogram(fig: &HistogramFigure, width: usize) -> String {
    let bar_width = width.saturating_sub(40).max(10);
    let peak = fig.counts.iter().copied().fold(0.0_f64, f64::max);

    let mut out = format!("{}: {}\n", fig.title, fig.x_label);
    let last = fig.counts.len().saturating_sub(1);
    for (i, (&count, edge)) in fig.counts.iter().zip(fig.edges.windows(2)).enumerate() {
        let close = if i == last { ']' } else { ')' };
        let len = if peak > 0.0 {
            ((count / peak) * bar_width as f64).round() as usize
        } else {
            0
        };
        out.push_str(&format!(
            "[{:>8.2}, {:>8.2}{close} {:<bar_width$} {count:.4}\n",
            edge[0],
            edge[1],
            "#".repeat(len),
        ));
    }
    out
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
}

fn x_range(series: &[Series]) -> Option<(f64, f64)> {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    for &(x, _) in series.iter().flat_map(|s| &s.data) {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
    }
    if min_x.is_finite() && max_x.is_finite() && max_x > min_x {
        Some((min_x, max_x))
    } else {
        None
    }
}

fn y_range(series: &[Series], errors: Option<&[(f64, f64, f64)]>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for &(_, y) in series.iter().flat_map(|s| &s.data) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    for &(_, y, s) in errors.unwrap_or_default() {
        min_y = min_y.min(y - s);
        max_y = max_y.max(y + s);
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y_max maps to row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], ch: char, x: (f64, f64), y: (f64, f64)) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(cx, cy) in curve {
        let col = map_x(cx, x.0, x.1, width);
        let row = map_y(cy, y.0, y.1, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None => grid[row][col] = ch,
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham); only fills empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectrum_golden_snapshot_small() {
        let fig = SpectrumFigure {
            title: "Fitted spectrum",
            x_label: "wavelength [micron]",
            y_label: "flux",
            series: vec![
                Series {
                    label: "observed".to_string(),
                    glyph: 'o',
                    points_only: true,
                    data: vec![(1.0, 0.0), (10.0, 10.0)],
                },
                Series {
                    label: "fit".to_string(),
                    glyph: '-',
                    points_only: false,
                    data: vec![(1.0, 0.0), (10.0, 0.0)],
                },
            ],
            errors: None,
            residual: None,
        };

        let txt = render_figure(&Figure::Spectrum(fig), 10, 5);
        let expected = concat!(
            "Fitted spectrum: x=[1.000, 10.000] wavelength [micron] | y=[-5.000e-1, 1.050e1] flux\n",
            "         o\n",
            "\n",
            "\n",
            "\n",
            "o---------\n",
            "o observed  - fit\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn residual_panel_is_appended() {
        let fig = SpectrumFigure {
            title: "Fitted spectrum",
            x_label: "x",
            y_label: "y",
            series: vec![Series {
                label: "fit".to_string(),
                glyph: '-',
                points_only: false,
                data: vec![(0.0, 1.0), (1.0, 2.0)],
            }],
            errors: Some(vec![(0.0, 1.0, 0.5)]),
            residual: Some(vec![(0.0, 0.5), (1.0, -0.5)]),
        };
        let txt = render_figure(&Figure::Spectrum(fig), 20, 9);
        assert!(txt.contains("\nresidual: ["), "{txt}");
        assert!(txt.contains('*'));
        assert!(txt.contains('|'));
        assert!(txt.ends_with("- fit\n"));
    }

    #[test]
    fn histogram_bars_scale_to_peak() {
        let fig = HistogramFigure {
            title: "Size distribution",
            x_label: "carbon atoms",
            counts: vec![1.0, 2.0],
            edges: vec![20.0, 30.0, 40.0],
        };
        let txt = render_figure(&Figure::Histogram(fig), 50, 10);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Size distribution: carbon atoms");
        assert_eq!(lines[1], "[   20.00,    30.00) #####      1.0000");
        assert_eq!(lines[2], "[   30.00,    40.00] ########## 2.0000");
    }
}
