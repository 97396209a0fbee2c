//! # placesim
//!
//! Synthetic place-cell datasets with known ground truth.
//!
//! A simulated animal runs along a 1D track (an Ornstein-Uhlenbeck velocity
//! process with reflecting walls). Place cells fire with Gaussian spatial tuning,
//! noise cells fire at constant rates, and rate maps are estimated from the
//! result so analysis pipelines can be checked against the generating model.
//!
//! ## Quick Start
//!
//! ```
//! use placesim::prelude::*;
//!
//! let cfg = TrajectoryConfig::default().with_timing(0.01, 10.0).with_seed(0);
//! let traj = generate_trajectory(&cfg).unwrap();
//! assert_eq!(traj.len(), 1000);
//!
//! let mut rng = Prng::new(1);
//! let fields = PlaceFields::linear_layout(4, 0.1, 0.9, 0.1, (5.0, 20.0), 0.5, &mut rng).unwrap();
//! let spikes = generate_place_cell_spikes(&fields, &traj.pos, &traj.time, traj.dt(), &mut rng).unwrap();
//! let maps = compute_empirical_rate_maps(50, 1.0, &traj.pos, traj.dt(), &spikes.spike_positions).unwrap();
//! assert_eq!(maps.bin_centers.len(), 50);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): serialization of configs and results; required for dataset storage
//! - `parallel`: evaluate per-neuron rate work via rayon (results are unchanged)
//!
//! ## Modules
//!
//! - [`trajectory`]: OU trajectory with reflecting walls
//! - [`undersampling`]: trajectory variant that under-samples the end of the track
//! - [`spikes`]: place-cell and noise-cell spike generation
//! - [`rate_map`]: empirical, theoretical and smoothed population rate maps
//! - [`storage`]: dataset archive

#[path = "core/error.rs"]
pub mod error;

#[path = "core/prng.rs"]
pub mod prng;

#[path = "core/matrix.rs"]
pub mod matrix;

#[path = "core/tuning.rs"]
pub mod tuning;

#[path = "core/trajectory.rs"]
pub mod trajectory;

#[path = "core/undersampling.rs"]
pub mod undersampling;

#[path = "core/spikes.rs"]
pub mod spikes;

#[path = "core/rate_map.rs"]
pub mod rate_map;

#[cfg(feature = "serde")]
#[path = "core/storage.rs"]
pub mod storage;

/// Prelude module for convenient imports.
///
/// ```
/// use placesim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{SimError, SimResult};
    pub use crate::matrix::{RateMatrix, SpikeMatrix};
    pub use crate::prng::Prng;
    pub use crate::rate_map::{
        compute_empirical_rate_maps, compute_population_rate_map, compute_theoretical_rate_maps,
        occupancy_fraction, EmpiricalRateMaps, PopulationRateMap, TheoreticalRateMaps,
    };
    pub use crate::spikes::{
        generate_noise_cell_spikes, generate_place_cell_spikes, NoiseCellConfig, NoiseCellSpikes,
        PlaceCellSpikes,
    };
    #[cfg(feature = "serde")]
    pub use crate::storage::{load_dataset, save_dataset};
    pub use crate::trajectory::{generate_trajectory, Trajectory, TrajectoryConfig, TrajectoryMeta};
    pub use crate::tuning::PlaceFields;
    pub use crate::undersampling::{generate_undersampled_trajectory, UndersamplingConfig};
}
