//! Run configuration, loadable from JSON.
//!
//! Every field has a default, so a config file only needs the values it changes:
//!
//! ```json
//! { "trajectory": { "duration_s": 120.0 }, "undersampling": { "p_reject": 0.9 } }
//! ```

use std::fs;
use std::path::Path;

use placesim::prelude::*;
use serde::{Deserialize, Serialize};

use crate::RunError;

/// Last-zone rejection settings; present only for undersampled runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub last_zone_frac: f64,
    pub p_reject: f64,
    /// Mean speed of the walker. Replaces `trajectory.mu`, which is a mean
    /// velocity for the reflecting generator.
    pub mean_speed: f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        let d = UndersamplingConfig::default();
        Self {
            last_zone_frac: d.last_zone_frac,
            p_reject: d.p_reject,
            mean_speed: d.base.mu,
        }
    }
}

/// Evenly spaced place fields with random peak rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceCellLayout {
    pub n_cells: usize,
    pub first_center: f64,
    pub last_center: f64,
    pub width: f64,
    pub min_peak_rate: f64,
    pub max_peak_rate: f64,
    pub baseline_rate: f64,
}

impl Default for PlaceCellLayout {
    fn default() -> Self {
        Self {
            n_cells: 20,
            first_center: 0.1,
            last_center: 0.9,
            width: 0.1,
            min_peak_rate: 5.0,
            max_peak_rate: 20.0,
            baseline_rate: 0.5,
        }
    }
}

impl PlaceCellLayout {
    pub fn build(&self, rng: &mut Prng) -> SimResult<PlaceFields> {
        PlaceFields::linear_layout(
            self.n_cells,
            self.first_center,
            self.last_center,
            self.width,
            (self.min_peak_rate, self.max_peak_rate),
            self.baseline_rate,
            rng,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub trajectory: TrajectoryConfig,
    /// When set, the trajectory comes from the undersampling generator.
    pub undersampling: Option<ZoneConfig>,
    pub place_cells: PlaceCellLayout,
    pub noise_cells: NoiseCellConfig,

    /// Bins of the empirical rate maps.
    pub empirical_bins: usize,
    /// Bins of the occupancy histogram figure.
    pub occupancy_bins: usize,
    /// Bins of the population heatmap.
    pub heatmap_bins: usize,
    /// Heatmap smoothing width, in bins.
    pub smooth_sigma: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            trajectory: TrajectoryConfig::default(),
            undersampling: None,
            place_cells: PlaceCellLayout::default(),
            noise_cells: NoiseCellConfig::default(),
            empirical_bins: 100,
            occupancy_bins: 50,
            heatmap_bins: 50,
            smooth_sigma: 1.0,
        }
    }
}

impl RunConfig {
    pub fn from_json(text: &str) -> Result<Self, RunError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, RunError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.trajectory.seed = seed;
        self
    }

    pub fn undersampling_config(&self) -> Option<UndersamplingConfig> {
        self.undersampling.map(|zone| {
            let base = TrajectoryConfig {
                mu: zone.mean_speed,
                ..self.trajectory
            };
            UndersamplingConfig::default()
                .with_base(base)
                .with_zone(zone.last_zone_frac, zone.p_reject)
        })
    }
}
