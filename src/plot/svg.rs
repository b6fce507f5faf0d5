//! SVG figures via plotters.
//!
//! Figures are rendered into an in-memory string so the caller can write them
//! atomically like every other output file.

use std::error::Error;

use plotters::prelude::*;

use crate::plot::{Figure, HistogramFigure, SpectrumFigure};

const PALETTE: [RGBColor; 6] = [
    RGBColor(0, 0, 0),
    RGBColor(214, 39, 40),
    RGBColor(31, 119, 180),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
];

pub(crate) fn render_figure(figure: &Figure, width: u32, height: u32) -> Result<String, Box<dyn Error>> {
    let width = width.max(200);
    let height = height.max(150);
    let mut doc = String::new();
    {
        let root = SVGBackend::with_string(&mut doc, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        match figure {
            Figure::Spectrum(fig) => draw_spectrum(&root, fig, height)?,
            Figure::Histogram(fig) => draw_histogram(&root, fig)?,
        }
        root.present()?;
    }
    Ok(doc)
}

fn draw_spectrum(
    root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    fig: &SpectrumFigure,
    height: u32,
) -> Result<(), Box<dyn Error>> {
    let (upper, lower) = if fig.residual.is_some() {
        let (u, l) = root.split_vertically(height * 7 / 10);
        (u, Some(l))
    } else {
        (root.clone(), None)
    };

    let (x0, x1) = bounds(fig.series.iter().flat_map(|s| s.data.iter().map(|p| p.0)));
    let (y0, y1) = bounds(
        fig.series
            .iter()
            .flat_map(|s| s.data.iter().map(|p| p.1))
            .chain(fig.errors.iter().flatten().flat_map(|&(_, y, s)| [y - s, y + s])),
    );

    let mut chart = ChartBuilder::on(&upper)
        .caption(fig.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(if lower.is_some() { 10 } else { 40 })
        .y_label_area_size(70)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh().disable_y_mesh().y_desc(fig.y_label);
    if lower.is_none() {
        mesh.x_desc(fig.x_label);
    }
    mesh.draw()?;

    if let Some(errors) = &fig.errors {
        let style = PALETTE[0].mix(0.3);
        chart.draw_series(
            errors
                .iter()
                .filter(|e| e.2 > 0.0)
                .map(|&(x, y, s)| PathElement::new(vec![(x, y - s), (x, y + s)], style)),
        )?;
    }

    for (i, series) in fig.series.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let anno = if series.points_only {
            chart.draw_series(series.data.iter().map(|&p| Circle::new(p, 1, color.filled())))?
        } else {
            chart.draw_series(LineSeries::new(series.data.iter().copied(), color.stroke_width(2)))?
        };
        anno.label(series.label.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    if let (Some(lower), Some(residual)) = (lower, &fig.residual) {
        let (r0, r1) = bounds(residual.iter().map(|p| p.1).chain([0.0]));
        let mut chart = ChartBuilder::on(&lower)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .build_cartesian_2d(x0..x1, r0..r1)?;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc(fig.x_label)
            .y_desc("residual")
            .draw()?;
        chart.draw_series(LineSeries::new([(x0, 0.0), (x1, 0.0)], BLACK.mix(0.5)))?;
        chart.draw_series(LineSeries::new(residual.iter().copied(), PALETTE[1]))?;
    }

    Ok(())
}

fn draw_histogram(
    root: &DrawingArea<SVGBackend<'_>, plotters::coord::Shift>,
    fig: &HistogramFigure,
) -> Result<(), Box<dyn Error>> {
    let (x0, x1) = bounds(fig.edges.iter().copied());
    let (_, y1) = bounds(fig.counts.iter().copied().chain([0.0]));

    let mut chart = ChartBuilder::on(root)
        .caption(fig.title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, 0.0..y1)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(fig.x_label)
        .y_desc("weight")
        .draw()?;

    chart.draw_series(
        fig.counts
            .iter()
            .zip(fig.edges.windows(2))
            .map(|(&c, e)| Rectangle::new([(e[0], 0.0), (e[1], c)], PALETTE[2].mix(0.7).filled())),
    )?;
    Ok(())
}

/// `(min, max)` of finite values, widened so the range is never empty.
fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-12);
    (lo - pad, hi + pad)
}
