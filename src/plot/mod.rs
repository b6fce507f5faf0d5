//! Rendering of fit results.
//!
//! `render` turns a `Fitted` into one figure, chosen by `PlotOptions`:
//!
//! - `sizedistribution`: histogram of carbon counts
//! - `size` / `charge` / `composition`: observation, fit, and component spectra
//! - otherwise: observation and fit, with a residual panel when `residual` is set
//!
//! Figures are either returned as ASCII text or saved as `txt` / `svg` files
//! named `{output}_{suffix}.{ftype}`. Rendering only reads the fit.

pub mod ascii;
pub mod svg;

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{AbscissaUnit, Grouping};
use crate::error::FitError;
use crate::fitted::Fitted;
use crate::io::write_atomically;

#[derive(Debug, Clone)]
pub struct PlotOptions {
    /// Plot against wavelength (micron) instead of the observation's unit.
    pub wavelength: bool,
    pub residual: bool,
    pub size: bool,
    pub charge: bool,
    pub composition: bool,
    pub sizedistribution: bool,
    /// Show the observation uncertainty as error bars.
    pub sigma: bool,
    pub save: bool,
    /// Path stem for saved figures.
    pub output: PathBuf,
    /// `txt` or `svg`.
    pub ftype: String,
    /// Figure size in pixels; text output uses one column per 10 px and one row
    /// per 30 px.
    pub width: u32,
    pub height: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            wavelength: false,
            residual: false,
            size: false,
            charge: false,
            composition: false,
            sizedistribution: false,
            sigma: false,
            save: false,
            output: PathBuf::from("fitted"),
            ftype: "svg".to_string(),
            width: 800,
            height: 600,
        }
    }
}

impl PlotOptions {
    /// File-name suffix of the figure these options select.
    pub fn suffix(&self) -> &'static str {
        if self.sizedistribution {
            "sizedistribution"
        } else if self.size {
            "size"
        } else if self.charge {
            "charge"
        } else if self.composition {
            "composition"
        } else if self.residual {
            "residual"
        } else {
            "fitted"
        }
    }

    pub fn output_path(&self, ftype: FileType) -> PathBuf {
        let mut name = self.output.as_os_str().to_owned();
        name.push(format!("_{}.{}", self.suffix(), ftype.extension()));
        PathBuf::from(name)
    }

    fn text_size(&self) -> (usize, usize) {
        ((self.width / 10).max(20) as usize, (self.height / 30).max(8) as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Txt,
    Svg,
}

impl FileType {
    pub fn parse(s: &str) -> Result<Self, FitError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" => Ok(FileType::Txt),
            "svg" => Ok(FileType::Svg),
            other => Err(FitError::InvalidInput(format!(
                "Unsupported plot file type `{other}`; expected `txt` or `svg`."
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileType::Txt => "txt",
            FileType::Svg => "svg",
        }
    }
}

/// What `render` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    Text(String),
    Saved(PathBuf),
}

pub fn render(fitted: &Fitted, options: &PlotOptions) -> Result<Rendered, FitError> {
    let figure = build_figure(fitted, options);

    if !options.save {
        let (w, h) = options.text_size();
        return Ok(Rendered::Text(ascii::render_figure(&figure, w, h)));
    }

    let ftype = FileType::parse(&options.ftype)?;
    let path = options.output_path(ftype);
    match ftype {
        FileType::Txt => {
            let (w, h) = options.text_size();
            let text = ascii::render_figure(&figure, w, h);
            write_atomically(&path, |out| out.write_all(text.as_bytes()))?;
        }
        FileType::Svg => {
            let doc = svg::render_figure(&figure, options.width, options.height).map_err(|e| svg_error(&path, e))?;
            write_atomically(&path, |out| out.write_all(doc.as_bytes()))?;
        }
    }
    info!(path = %path.display(), figure = options.suffix(), "saved figure");
    Ok(Rendered::Saved(path))
}

fn svg_error(path: &Path, e: Box<dyn std::error::Error>) -> FitError {
    FitError::io(path, std::io::Error::other(e.to_string()))
}

/// A drawn line or point set.
#[derive(Debug, Clone)]
pub(crate) struct Series {
    pub label: String,
    /// Glyph for text output.
    pub glyph: char,
    /// Draw as isolated points rather than a connected line.
    pub points_only: bool,
    pub data: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub(crate) struct SpectrumFigure {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub series: Vec<Series>,
    /// `(x, y, sigma)` error bars.
    pub errors: Option<Vec<(f64, f64, f64)>>,
    pub residual: Option<Vec<(f64, f64)>>,
}

#[derive(Debug, Clone)]
pub(crate) struct HistogramFigure {
    pub title: &'static str,
    pub x_label: &'static str,
    pub counts: Vec<f64>,
    pub edges: Vec<f64>,
}

#[derive(Debug, Clone)]
pub(crate) enum Figure {
    Spectrum(SpectrumFigure),
    Histogram(HistogramFigure),
}

fn build_figure(fitted: &Fitted, options: &PlotOptions) -> Figure {
    if options.sizedistribution {
        let dist = fitted.size_distribution();
        return Figure::Histogram(HistogramFigure {
            title: "Size distribution",
            x_label: "carbon atoms",
            counts: dist.counts,
            edges: dist.edges,
        });
    }

    let observation = if options.wavelength {
        fitted.observation().abscissa_units_to(AbscissaUnit::Wavelength)
    } else {
        fitted.observation().clone()
    };
    let x = observation.abscissa();
    let pair = |y: &[f64]| -> Vec<(f64, f64)> { x.iter().copied().zip(y.iter().copied()).collect() };

    let mut series = vec![
        Series {
            label: "observed".to_string(),
            glyph: 'o',
            points_only: true,
            data: pair(observation.flux()),
        },
        Series {
            label: "fit".to_string(),
            glyph: '-',
            points_only: false,
            data: pair(fitted.fitted_spectrum()),
        },
    ];

    let grouping = if options.size {
        Some(Grouping::Size)
    } else if options.charge {
        Some(Grouping::Charge)
    } else if options.composition {
        Some(Grouping::Composition)
    } else {
        None
    };

    let title = match grouping {
        Some(Grouping::Size) => "Size breakdown",
        Some(Grouping::Charge) => "Charge breakdown",
        Some(Grouping::Composition) => "Composition breakdown",
        None => "Fitted spectrum",
    };

    if let Some(grouping) = grouping {
        for component in fitted.components(grouping) {
            series.push(Series {
                label: component.label.to_string(),
                glyph: component.label.chars().next().unwrap_or('*'),
                points_only: false,
                data: pair(&component.spectrum),
            });
        }
    }

    let errors = options.sigma.then(|| {
        x.iter()
            .zip(observation.flux())
            .zip(observation.uncertainty())
            .map(|((&x, &y), &s)| (x, y, s))
            .collect()
    });

    let residual = (grouping.is_none() && options.residual).then(|| pair(fitted.residual()));

    Figure::Spectrum(SpectrumFigure {
        title,
        x_label: observation.unit().label(),
        y_label: "flux",
        series,
        errors,
        residual,
    })
}
