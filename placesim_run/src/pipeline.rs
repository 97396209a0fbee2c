use std::path::{Path, PathBuf};

use placesim::prelude::*;

use crate::config::RunConfig;
use crate::RunError;

// Keeps the spike stream decorrelated from the trajectory's own generator.
const SPIKE_STREAM_SALT: u64 = 0x5851_F42D_4C95_7F2D;

/// Where a run writes its outputs.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub dataset: PathBuf,
    pub preview: PathBuf,
    pub figures: Option<PathBuf>,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/toy_example.pcsim"),
            preview: PathBuf::from("data/preview.png"),
            figures: None,
        }
    }
}

/// Everything a run computes, before anything touches disk.
pub struct Simulation {
    pub trajectory: Trajectory,
    pub fields: PlaceFields,
    pub place: PlaceCellSpikes,
    pub noise: NoiseCellSpikes,
    pub empirical: EmpiricalRateMaps,
    pub theoretical: TheoreticalRateMaps,
    pub population: PopulationRateMap,
}

pub fn simulate(cfg: &RunConfig) -> Result<Simulation, RunError> {
    let trajectory = match cfg.undersampling_config() {
        Some(under) => generate_undersampled_trajectory(&under)?,
        None => generate_trajectory(&cfg.trajectory)?,
    };
    let dt = trajectory.dt();
    let track_length = trajectory.track_length();

    let mut rng = Prng::new(cfg.trajectory.seed ^ SPIKE_STREAM_SALT);
    let fields = cfg.place_cells.build(&mut rng)?;
    let place =
        generate_place_cell_spikes(&fields, &trajectory.pos, &trajectory.time, dt, &mut rng)?;

    let empirical = compute_empirical_rate_maps(
        cfg.empirical_bins,
        track_length,
        &trajectory.pos,
        dt,
        &place.spike_positions,
    )?;
    let theoretical = compute_theoretical_rate_maps(track_length, &fields)?;

    let noise = generate_noise_cell_spikes(&cfg.noise_cells, trajectory.len(), dt, &mut rng)?;

    let all_spikes = place.spikes.vstack(&noise.spikes)?;
    let population = compute_population_rate_map(
        &all_spikes,
        &trajectory.pos,
        dt,
        track_length,
        cfg.heatmap_bins,
        cfg.smooth_sigma,
    )?;

    tracing::info!(
        samples = trajectory.len(),
        place_cells = fields.len(),
        place_spikes = place.spikes.total(),
        noise_spikes = noise.spikes.total(),
        undersampled = cfg.undersampling.is_some(),
        "simulation finished"
    );

    Ok(Simulation {
        trajectory,
        fields,
        place,
        noise,
        empirical,
        theoretical,
        population,
    })
}

/// Save the dataset, render the preview and, if requested, the full figure set.
pub fn write_outputs(sim: &Simulation, cfg: &RunConfig, paths: &OutputPaths) -> Result<(), RunError> {
    save_dataset(&paths.dataset, &sim.trajectory)?;

    placesim_vis::plot_population_rate_map(&paths.preview, &sim.population)?;
    tracing::info!(path = %paths.preview.display(), "saved preview");

    if let Some(dir) = &paths.figures {
        write_figures(sim, cfg, dir)?;
    }
    Ok(())
}

fn write_figures(sim: &Simulation, cfg: &RunConfig, dir: &Path) -> Result<(), RunError> {
    let traj = &sim.trajectory;
    let track_length = traj.track_length();

    placesim_vis::plot_occupancy(
        &dir.join("occupancy.png"),
        &traj.pos,
        track_length,
        cfg.occupancy_bins,
    )?;
    placesim_vis::plot_position(&dir.join("position.png"), &traj.time, &traj.pos, track_length)?;
    placesim_vis::plot_spike_raster(
        &dir.join("spike_raster.png"),
        &sim.place.spike_times,
        traj.meta.duration_s,
        sim.fields.centers(),
    )?;
    placesim_vis::plot_empirical_vs_theoretical(
        &dir.join("rate_maps.png"),
        &sim.empirical,
        &sim.theoretical,
        sim.fields.centers(),
        sim.fields.peak_rates(),
        track_length,
    )?;
    placesim_vis::plot_population_rate_map(&dir.join("population_heatmap.png"), &sim.population)?;

    tracing::info!(dir = %dir.display(), "saved figures");
    Ok(())
}
