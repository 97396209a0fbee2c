#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{require_finite, require_non_negative, require_positive, SimError, SimResult};
use crate::prng::Prng;

/// Gaussian place-field parameters for a population of place cells.
///
/// All three per-cell arrays have the same length; this is checked on
/// construction so downstream code can index them freely.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaceFields {
    centers: Vec<f64>,
    widths: Vec<f64>,
    peak_rates: Vec<f64>,
    baseline_rate: f64,
}

impl PlaceFields {
    pub fn new(
        centers: Vec<f64>,
        widths: Vec<f64>,
        peak_rates: Vec<f64>,
        baseline_rate: f64,
    ) -> SimResult<Self> {
        if centers.len() != widths.len() || centers.len() != peak_rates.len() {
            return Err(SimError::Validation(format!(
                "length of centers ({}), widths ({}) and peak_rates ({}) must match",
                centers.len(),
                widths.len(),
                peak_rates.len()
            )));
        }
        for &c in &centers {
            require_finite("place field center", c)?;
        }
        for &w in &widths {
            require_positive("place field width", w)?;
        }
        for &r in &peak_rates {
            require_non_negative("peak rate", r)?;
        }
        require_non_negative("baseline_rate", baseline_rate)?;

        Ok(Self {
            centers,
            widths,
            peak_rates,
            baseline_rate,
        })
    }

    /// `n_cells` fields with centers spaced evenly over `[first_center, last_center]`,
    /// a shared width and peak rates drawn uniformly from `peak_range`.
    pub fn linear_layout(
        n_cells: usize,
        first_center: f64,
        last_center: f64,
        width: f64,
        peak_range: (f64, f64),
        baseline_rate: f64,
        rng: &mut Prng,
    ) -> SimResult<Self> {
        let (lo, hi) = peak_range;
        if lo > hi {
            return Err(SimError::InvalidParameter(format!(
                "peak range is empty ({lo} > {hi})"
            )));
        }
        let centers = linspace(first_center, last_center, n_cells);
        let widths = vec![width; n_cells];
        let peak_rates = (0..n_cells).map(|_| rng.gen_range_f64(lo, hi)).collect();
        Self::new(centers, widths, peak_rates, baseline_rate)
    }

    pub fn len(&self) -> usize {
        self.centers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    pub fn peak_rates(&self) -> &[f64] {
        &self.peak_rates
    }

    pub fn baseline_rate(&self) -> f64 {
        self.baseline_rate
    }

    /// Expected firing rate (Hz) of cell `cell` at position `x`.
    #[inline]
    pub fn rate_at(&self, cell: usize, x: f64) -> f64 {
        let z = (x - self.centers[cell]) / self.widths[cell];
        self.baseline_rate + self.peak_rates[cell] * (-0.5 * z * z).exp()
    }

    /// Tuning curve of one cell sampled at every position in `xs`.
    pub fn rate_curve(&self, cell: usize, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.rate_at(cell, x)).collect()
    }
}

/// `n` evenly spaced samples from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + i as f64 * step).collect();
            out[n - 1] = stop;
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = PlaceFields::new(vec![0.1, 0.5], vec![0.1], vec![5.0, 6.0], 0.5).unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
        let err = PlaceFields::new(vec![0.1], vec![0.1], vec![5.0, 6.0], 0.5).unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
    }

    #[test]
    fn non_positive_width_is_rejected() {
        assert!(PlaceFields::new(vec![0.5], vec![0.0], vec![5.0], 0.0).is_err());
    }

    #[test]
    fn peak_of_tuning_curve() {
        let f = PlaceFields::new(vec![0.3, 0.7], vec![0.1, 0.05], vec![10.0, 4.0], 0.5).unwrap();
        assert_eq!(f.rate_at(0, 0.3), 10.5);
        assert_eq!(f.rate_at(1, 0.7), 4.5);
        assert!(f.rate_at(0, 0.9) < 0.51);
    }

    #[test]
    fn linear_layout_spreads_centers() {
        let mut rng = Prng::new(42);
        let f = PlaceFields::linear_layout(5, 0.1, 0.9, 0.1, (5.0, 20.0), 0.5, &mut rng).unwrap();
        assert_eq!(f.len(), 5);
        assert_eq!(f.centers()[0], 0.1);
        assert_eq!(f.centers()[4], 0.9);
        assert!((f.centers()[2] - 0.5).abs() < 1e-12);
        assert!(f.peak_rates().iter().all(|r| (5.0..20.0).contains(r)));
    }

    #[test]
    fn non_finite_centers_are_rejected() {
        for c in [f64::NAN, f64::INFINITY] {
            let err = PlaceFields::new(vec![0.2, c], vec![0.1, 0.1], vec![5.0, 6.0], 0.5).unwrap_err();
            assert!(matches!(err, SimError::InvalidParameter(_)));
        }
        let mut rng = Prng::new(2);
        assert!(PlaceFields::linear_layout(3, f64::NAN, 0.9, 0.1, (5.0, 20.0), 0.5, &mut rng).is_err());
    }

    #[test]
    fn linspace_endpoints() {
        let xs = linspace(0.0, 1.0, 500);
        assert_eq!(xs.len(), 500);
        assert_eq!(xs[0], 0.0);
        assert_eq!(xs[499], 1.0);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }
}
