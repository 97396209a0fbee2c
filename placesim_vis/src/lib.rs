//! PNG figures for placesim runs.
//!
//! Every entry point takes already-computed arrays and writes one figure. Shape
//! mismatches are reported as [`PlotError::Validation`] before anything is drawn.

use std::path::Path;

use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

mod palette;
mod plots;

pub use palette::viridis;
pub use plots::{
    plot_empirical_vs_theoretical, plot_occupancy, plot_population_rate_map, plot_position,
    plot_spike_raster,
};

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("figure I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sim(#[from] placesim::error::SimError),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Render(e.to_string())
    }
}

pub type PlotResult<T> = Result<T, PlotError>;

pub(crate) fn ensure_parent_dir(path: &Path) -> PlotResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
