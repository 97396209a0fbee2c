//! Dense row-major matrices indexed by `(neuron, column)`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Binary spike raster: `get(i, t)` is true when neuron `i` spiked at step `t`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpikeMatrix {
    n_neurons: usize,
    n_steps: usize,
    data: Vec<bool>,
}

impl SpikeMatrix {
    pub(crate) fn from_raw(n_neurons: usize, n_steps: usize, data: Vec<bool>) -> Self {
        debug_assert_eq!(data.len(), n_neurons * n_steps);
        Self {
            n_neurons,
            n_steps,
            data,
        }
    }

    pub fn n_neurons(&self) -> usize {
        self.n_neurons
    }

    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    pub fn get(&self, neuron: usize, step: usize) -> bool {
        self.data[neuron * self.n_steps + step]
    }

    pub fn row(&self, neuron: usize) -> &[bool] {
        let start = neuron * self.n_steps;
        &self.data[start..start + self.n_steps]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> + '_ {
        (0..self.n_neurons).map(move |i| self.row(i))
    }

    pub fn row_count(&self, neuron: usize) -> usize {
        self.row(neuron).iter().filter(|&&s| s).count()
    }

    /// Spike count per neuron.
    pub fn counts(&self) -> Vec<usize> {
        (0..self.n_neurons).map(|i| self.row_count(i)).collect()
    }

    pub fn total(&self) -> usize {
        self.data.iter().filter(|&&s| s).count()
    }

    /// Stack `other` below `self` (e.g. place cells followed by noise cells).
    pub fn vstack(&self, other: &SpikeMatrix) -> SimResult<SpikeMatrix> {
        if self.n_steps != other.n_steps {
            return Err(SimError::Validation(format!(
                "cannot stack spike matrices with {} and {} timesteps",
                self.n_steps, other.n_steps
            )));
        }
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(SpikeMatrix::from_raw(
            self.n_neurons + other.n_neurons,
            self.n_steps,
            data,
        ))
    }
}

/// Firing rates (Hz) per neuron and sample.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RateMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f64>,
}

impl RateMatrix {
    pub(crate) fn from_rows(rows: Vec<Vec<f64>>, n_cols: usize) -> Self {
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            debug_assert_eq!(row.len(), n_cols);
            data.extend(row);
        }
        Self {
            n_rows,
            n_cols,
            data,
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n_cols + col]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }
}
