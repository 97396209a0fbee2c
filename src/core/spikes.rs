//! Spike generation for place cells and noise cells.
//!
//! Both generators use the Bernoulli approximation of an (in)homogeneous
//! Poisson process: a spike at `(i, t)` iff `u < rate[i, t] * dt`. Uniforms are
//! drawn neuron-major from the caller's stream, so the output is a pure function
//! of the inputs and the stream state.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, require_positive, SimError, SimResult};
use crate::matrix::{RateMatrix, SpikeMatrix};
use crate::prng::Prng;
use crate::tuning::PlaceFields;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaceCellSpikes {
    pub spikes: SpikeMatrix,
    /// Per neuron: times (s) of its spikes.
    pub spike_times: Vec<Vec<f64>>,
    /// Per neuron: positions (m) at which it spiked.
    pub spike_positions: Vec<Vec<f64>>,
    pub spike_counts: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NoiseCellConfig {
    pub n_noise: usize,
    /// Lower bound (Hz) of the per-cell rate draw.
    pub min_rate: f64,
    /// Upper bound (Hz) of the per-cell rate draw.
    pub max_rate: f64,
}

impl Default for NoiseCellConfig {
    fn default() -> Self {
        Self {
            n_noise: 10,
            min_rate: 0.1,
            max_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoiseCellSpikes {
    /// Constant rate (Hz) of each noise cell.
    pub rates: Vec<f64>,
    pub spikes: SpikeMatrix,
}

/// Instantaneous rate of every place cell at every position sample.
pub fn place_cell_rates(fields: &PlaceFields, pos: &[f64]) -> RateMatrix {
    let row = |i: usize| fields.rate_curve(i, pos);

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = (0..fields.len()).into_par_iter().map(row).collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = (0..fields.len()).map(row).collect();

    RateMatrix::from_rows(rows, pos.len())
}

fn bernoulli_spikes(rates: &RateMatrix, dt: f64, rng: &mut Prng) -> SpikeMatrix {
    let p_max = rates.max() * dt;
    if p_max > 1.0 {
        tracing::warn!(
            p_max,
            "rate * dt exceeds 1; spike probabilities saturate (Bernoulli approximation breaks down)"
        );
    }

    let mut data = Vec::with_capacity(rates.n_rows() * rates.n_cols());
    for row in rates.rows() {
        data.extend(row.iter().map(|&r| rng.next_f64_01() < r * dt));
    }
    SpikeMatrix::from_raw(rates.n_rows(), rates.n_cols(), data)
}

fn select_where(values: &[f64], mask: &[bool]) -> Vec<f64> {
    values
        .iter()
        .zip(mask)
        .filter_map(|(&v, &hit)| hit.then_some(v))
        .collect()
}

/// Draw place-cell spikes along a trajectory.
///
/// Fails with a validation error before drawing anything if `pos` and `time`
/// differ in length.
pub fn generate_place_cell_spikes(
    fields: &PlaceFields,
    pos: &[f64],
    time: &[f64],
    dt: f64,
    rng: &mut Prng,
) -> SimResult<PlaceCellSpikes> {
    if pos.len() != time.len() {
        return Err(SimError::Validation(format!(
            "pos ({}) and time ({}) must have the same length",
            pos.len(),
            time.len()
        )));
    }
    require_positive("dt", dt)?;

    let rates = place_cell_rates(fields, pos);
    let spikes = bernoulli_spikes(&rates, dt, rng);

    let spike_times: Vec<Vec<f64>> = spikes.rows().map(|row| select_where(time, row)).collect();
    let spike_positions: Vec<Vec<f64>> = spikes.rows().map(|row| select_where(pos, row)).collect();
    let spike_counts = spikes.counts();

    tracing::debug!(
        n_cells = fields.len(),
        n_steps = pos.len(),
        total_spikes = spike_counts.iter().sum::<usize>(),
        "generated place cell spikes"
    );

    Ok(PlaceCellSpikes {
        spikes,
        spike_times,
        spike_positions,
        spike_counts,
    })
}

/// Draw spikes for position-independent noise cells.
///
/// All per-cell rates are drawn first, then the spike uniforms, neuron-major.
pub fn generate_noise_cell_spikes(
    cfg: &NoiseCellConfig,
    n_steps: usize,
    dt: f64,
    rng: &mut Prng,
) -> SimResult<NoiseCellSpikes> {
    require_non_negative("min_rate", cfg.min_rate)?;
    require_non_negative("max_rate", cfg.max_rate)?;
    if cfg.min_rate > cfg.max_rate {
        return Err(SimError::InvalidParameter(format!(
            "min_rate ({}) exceeds max_rate ({})",
            cfg.min_rate, cfg.max_rate
        )));
    }
    require_positive("dt", dt)?;

    let rates: Vec<f64> = (0..cfg.n_noise)
        .map(|_| rng.gen_range_f64(cfg.min_rate, cfg.max_rate))
        .collect();
    let matrix = RateMatrix::from_rows(rates.iter().map(|&r| vec![r; n_steps]).collect(), n_steps);
    let spikes = bernoulli_spikes(&matrix, dt, rng);

    tracing::debug!(
        n_noise = cfg.n_noise,
        n_steps,
        total_spikes = spikes.total(),
        "generated noise cell spikes"
    );

    Ok(NoiseCellSpikes { rates, spikes })
}
