//! Empirical and theoretical rate maps.
//!
//! Empirical maps divide per-bin spike counts by per-bin occupancy time. Bins
//! the trajectory never visited report a rate of exactly 0.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{require_positive, SimError, SimResult};
use crate::matrix::{RateMatrix, SpikeMatrix};
use crate::tuning::{linspace, PlaceFields};

/// Resolution of the position grid used for theoretical maps.
pub const THEORETICAL_GRID_POINTS: usize = 500;

/// Kernel radius of the heatmap smoothing, in standard deviations.
const SMOOTH_TRUNCATE: f32 = 4.0;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EmpiricalRateMaps {
    /// `n_neurons x n_bins`, Hz.
    pub rates: RateMatrix,
    pub bin_centers: Vec<f64>,
    /// Seconds spent in each bin.
    pub occupancy_time: Vec<f64>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TheoreticalRateMaps {
    /// `n_neurons x THEORETICAL_GRID_POINTS`, Hz.
    pub rates: RateMatrix,
    pub x: Vec<f64>,
}

/// Smoothed population heatmap (plot precision).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PopulationRateMap {
    /// One row per neuron, one column per bin.
    pub rates: Vec<Vec<f32>>,
    pub bin_centers: Vec<f64>,
    pub track_length: f64,
}

impl PopulationRateMap {
    pub fn n_neurons(&self) -> usize {
        self.rates.len()
    }

    pub fn n_bins(&self) -> usize {
        self.bin_centers.len()
    }

    pub fn max_rate(&self) -> f32 {
        self.rates
            .iter()
            .flat_map(|r| r.iter().copied())
            .fold(0.0, f32::max)
    }
}

/// Equal-width bins over `[lo, hi]`, with edges from [`linspace`].
///
/// Half-open except the last bin, which also takes `hi`. Values outside the
/// range (and NaN) fall in no bin. A value equal to an edge always lands in the
/// bin that edge opens.
#[derive(Debug, Clone)]
struct Bins {
    edges: Vec<f64>,
}

impl Bins {
    fn new(lo: f64, hi: f64, n: usize) -> Self {
        Self {
            edges: linspace(lo, hi, n + 1),
        }
    }

    fn len(&self) -> usize {
        self.edges.len() - 1
    }

    fn index(&self, x: f64) -> Option<usize> {
        let n = self.len();
        let (lo, hi) = (self.edges[0], self.edges[n]);
        if !(x >= lo && x <= hi) {
            return None;
        }
        if x == hi {
            return Some(n - 1);
        }
        let width = (hi - lo) / n as f64;
        let mut i = (((x - lo) / width) as usize).min(n - 1);
        // The division can round across an edge; settle against the edges.
        if x < self.edges[i] {
            i -= 1;
        } else if i + 1 < n && x >= self.edges[i + 1] {
            i += 1;
        }
        Some(i)
    }

    fn histogram<'a>(&self, values: impl IntoIterator<Item = &'a f64>) -> Vec<usize> {
        let mut counts = vec![0usize; self.len()];
        for &v in values {
            if let Some(i) = self.index(v) {
                counts[i] += 1;
            }
        }
        counts
    }

    fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }
}

fn check_binning(n_bins: usize, track_length: f64, dt: f64) -> SimResult<()> {
    if n_bins == 0 {
        return Err(SimError::InvalidParameter("n_bins must be > 0".to_string()));
    }
    require_positive("track_length", track_length)?;
    require_positive("dt", dt)
}

fn ratio_or_zero(count: usize, occupancy: f64) -> f64 {
    if occupancy > 0.0 {
        count as f64 / occupancy
    } else {
        0.0
    }
}

/// Empirical firing rate per spatial bin for every neuron.
///
/// `spike_positions[i]` holds the positions at which neuron `i` spiked.
pub fn compute_empirical_rate_maps(
    n_bins: usize,
    track_length: f64,
    pos: &[f64],
    dt: f64,
    spike_positions: &[Vec<f64>],
) -> SimResult<EmpiricalRateMaps> {
    check_binning(n_bins, track_length, dt)?;

    let bins = Bins::new(0.0, track_length, n_bins);
    let occupancy_time: Vec<f64> = bins
        .histogram(pos)
        .into_iter()
        .map(|c| c as f64 * dt)
        .collect();

    let row = |spikes: &Vec<f64>| -> Vec<f64> {
        bins.histogram(spikes)
            .into_iter()
            .zip(&occupancy_time)
            .map(|(count, &occ)| ratio_or_zero(count, occ))
            .collect()
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = spike_positions.par_iter().map(row).collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = spike_positions.iter().map(row).collect();

    Ok(EmpiricalRateMaps {
        rates: RateMatrix::from_rows(rows, n_bins),
        bin_centers: bins.centers(),
        occupancy_time,
    })
}

/// Gaussian tuning curves evaluated on a fixed grid over `[0, track_length]`.
pub fn compute_theoretical_rate_maps(
    track_length: f64,
    fields: &PlaceFields,
) -> SimResult<TheoreticalRateMaps> {
    require_positive("track_length", track_length)?;

    let x = linspace(0.0, track_length, THEORETICAL_GRID_POINTS);
    let row = |i: usize| fields.rate_curve(i, &x);

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = (0..fields.len()).into_par_iter().map(row).collect();
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = (0..fields.len()).map(row).collect();

    Ok(TheoreticalRateMaps {
        rates: RateMatrix::from_rows(rows, x.len()),
        x,
    })
}

/// Fraction of position samples falling in each bin, and the bin centers.
pub fn occupancy_fraction(
    pos: &[f64],
    track_length: f64,
    n_bins: usize,
) -> SimResult<(Vec<f64>, Vec<f64>)> {
    check_binning(n_bins, track_length, 1.0)?;

    let bins = Bins::new(0.0, track_length, n_bins);
    let counts = bins.histogram(pos);
    let total: usize = counts.iter().sum();
    let fractions = counts
        .into_iter()
        .map(|c| if total > 0 { c as f64 / total as f64 } else { 0.0 })
        .collect();
    Ok((fractions, bins.centers()))
}

/// Rate map for every row of `spikes`, smoothed along the spatial axis.
///
/// `smooth_sigma` is in bins; values `<= 0` skip smoothing, non-finite values
/// are rejected.
pub fn compute_population_rate_map(
    spikes: &SpikeMatrix,
    pos: &[f64],
    dt: f64,
    track_length: f64,
    n_bins: usize,
    smooth_sigma: f32,
) -> SimResult<PopulationRateMap> {
    if spikes.n_steps() != pos.len() {
        return Err(SimError::Validation(format!(
            "spike matrix has {} timesteps but {} positions were given",
            spikes.n_steps(),
            pos.len()
        )));
    }
    check_binning(n_bins, track_length, dt)?;
    if !smooth_sigma.is_finite() {
        return Err(SimError::InvalidParameter(format!(
            "smooth_sigma must be finite (got {smooth_sigma})"
        )));
    }

    let bins = Bins::new(0.0, track_length, n_bins);
    let occupancy: Vec<f64> = bins.histogram(pos).into_iter().map(|c| c as f64 * dt).collect();

    let rates = spikes
        .rows()
        .map(|row| {
            let fired = pos.iter().zip(row).filter_map(|(p, &s)| s.then_some(p));
            let raw: Vec<f32> = bins
                .histogram(fired)
                .into_iter()
                .zip(&occupancy)
                .map(|(count, &occ)| ratio_or_zero(count, occ) as f32)
                .collect();
            gaussian_smooth_1d(&raw, smooth_sigma)
        })
        .collect();

    Ok(PopulationRateMap {
        rates,
        bin_centers: bins.centers(),
        track_length,
    })
}

/// 1D Gaussian filter with edge values repeated beyond the boundaries.
///
/// Returns the input unchanged when `sigma` is not a positive finite width.
pub fn gaussian_smooth_1d(values: &[f32], sigma: f32) -> Vec<f32> {
    if !(sigma.is_finite() && sigma > 0.0) || values.is_empty() {
        return values.to_vec();
    }

    let radius = (SMOOTH_TRUNCATE * sigma + 0.5) as isize;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|k| {
            let k = k as f32;
            (-0.5 * k * k / (sigma * sigma)).exp()
        })
        .collect();
    let norm: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= norm;
    }

    let last = values.len() as isize - 1;
    (0..values.len() as isize)
        .map(|i| {
            kernel
                .iter()
                .zip(-radius..=radius)
                .map(|(w, k)| w * values[(i + k).clamp(0, last) as usize])
                .sum()
        })
        .collect()
}
