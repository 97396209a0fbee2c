#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{require_finite, require_non_negative, require_positive, SimResult};
use crate::prng::Prng;

/// Parameters of the Ornstein-Uhlenbeck velocity process and the track.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrajectoryConfig {
    /// Track length in meters.
    pub track_length: f64,
    /// Integration step in seconds.
    pub dt: f64,
    pub duration_s: f64,

    /// Mean-reversion rate.
    pub theta: f64,
    /// Long-run mean velocity (or speed, for the undersampling variant).
    pub mu: f64,
    /// Noise amplitude.
    pub sigma: f64,
    /// Initial velocity.
    pub v0: f64,

    pub seed: u64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            track_length: 1.0,
            dt: 0.005,
            duration_s: 300.0,
            theta: 1.0,
            mu: 0.0,
            sigma: 0.4,
            v0: 0.0,
            seed: 42,
        }
    }
}

impl TrajectoryConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_track_length(mut self, track_length: f64) -> Self {
        self.track_length = track_length;
        self
    }

    pub fn with_timing(mut self, dt: f64, duration_s: f64) -> Self {
        self.dt = dt;
        self.duration_s = duration_s;
        self
    }

    pub fn with_ou(mut self, theta: f64, mu: f64, sigma: f64) -> Self {
        self.theta = theta;
        self.mu = mu;
        self.sigma = sigma;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        require_positive("track_length", self.track_length)?;
        require_positive("dt", self.dt)?;
        require_positive("duration_s", self.duration_s)?;
        require_finite("theta", self.theta)?;
        require_finite("mu", self.mu)?;
        require_non_negative("sigma", self.sigma)?;
        require_finite("v0", self.v0)?;
        Ok(())
    }

    /// `ceil(duration_s / dt)`.
    pub fn n_steps(&self) -> usize {
        (self.duration_s / self.dt).ceil() as usize
    }
}

/// Parameters a trajectory was generated with.
///
/// The zone fields are only present for undersampled runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrajectoryMeta {
    pub track_length: f64,
    pub dt: f64,
    pub duration_s: f64,
    pub theta: f64,
    pub mu: f64,
    pub sigma: f64,
    pub v0: f64,
    pub seed: u64,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub last_zone_frac: Option<f64>,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub p_reject: Option<f64>,
}

impl From<&TrajectoryConfig> for TrajectoryMeta {
    fn from(cfg: &TrajectoryConfig) -> Self {
        Self {
            track_length: cfg.track_length,
            dt: cfg.dt,
            duration_s: cfg.duration_s,
            theta: cfg.theta,
            mu: cfg.mu,
            sigma: cfg.sigma,
            v0: cfg.v0,
            seed: cfg.seed,
            last_zone_frac: None,
            p_reject: None,
        }
    }
}

/// Evenly sampled `(time, position, velocity)` series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trajectory {
    pub time: Vec<f64>,
    pub pos: Vec<f64>,
    pub vel: Vec<f64>,
    pub meta: TrajectoryMeta,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn dt(&self) -> f64 {
        self.meta.dt
    }

    pub fn track_length(&self) -> f64 {
        self.meta.track_length
    }
}

pub(crate) fn time_axis(n_steps: usize, dt: f64) -> Vec<f64> {
    (0..n_steps).map(|i| i as f64 * dt).collect()
}

/// Simulate a 1D trajectory with an OU velocity process and reflecting walls.
///
/// Starts at the track midpoint with velocity `v0`. Each step:
/// `v += theta*(mu - v)*dt + sigma*sqrt(dt)*N(0,1)`, then `pos += v*dt`.
/// Leaving the track mirrors the overshoot back inside and negates the velocity.
pub fn generate_trajectory(cfg: &TrajectoryConfig) -> SimResult<Trajectory> {
    cfg.validate()?;

    let mut rng = Prng::new(cfg.seed);
    let n_steps = cfg.n_steps();
    let time = time_axis(n_steps, cfg.dt);
    let length = cfg.track_length;
    let noise_scale = cfg.sigma * cfg.dt.sqrt();

    let mut pos = vec![0.0f64; n_steps];
    let mut vel = vec![0.0f64; n_steps];
    if n_steps > 0 {
        pos[0] = 0.5 * length;
        vel[0] = cfg.v0;
    }

    let mut reflections = 0usize;
    for t in 0..n_steps.saturating_sub(1) {
        let mut v = vel[t]
            + cfg.theta * (cfg.mu - vel[t]) * cfg.dt
            + noise_scale * rng.standard_normal();
        let mut p = pos[t] + v * cfg.dt;

        if p < 0.0 {
            p = -p;
            v = -v;
            reflections += 1;
        } else if p > length {
            p = 2.0 * length - p;
            v = -v;
            reflections += 1;
        }
        // A single mirror is enough unless the step overshoots the whole track.
        pos[t + 1] = p.clamp(0.0, length);
        vel[t + 1] = v;
    }

    tracing::debug!(n_steps, reflections, seed = cfg.seed, "generated trajectory");

    Ok(Trajectory {
        time,
        pos,
        vel,
        meta: TrajectoryMeta::from(cfg),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn short_cfg(seed: u64) -> TrajectoryConfig {
        TrajectoryConfig::default()
            .with_timing(0.01, 10.0)
            .with_seed(seed)
    }

    #[test]
    fn ten_second_run_has_expected_shape() {
        let traj = generate_trajectory(&short_cfg(0)).unwrap();
        assert_eq!(traj.len(), 1000);
        assert_eq!(traj.pos.len(), 1000);
        assert_eq!(traj.vel.len(), 1000);
        assert_eq!(traj.time[0], 0.0);
        assert!((traj.time[999] - 9.99).abs() < 1e-12);
        assert_eq!(traj.pos[0], 0.5);
    }

    #[test]
    fn time_axis_is_evenly_spaced() {
        let traj = generate_trajectory(&short_cfg(3)).unwrap();
        for w in traj.time.windows(2) {
            assert!(w[1] > w[0]);
            assert!((w[1] - w[0] - 0.01).abs() < 1e-9);
        }
    }

    #[test]
    fn positions_stay_on_track() {
        for seed in 0..8 {
            let cfg = TrajectoryConfig::default()
                .with_track_length(2.0)
                .with_ou(0.5, 0.0, 1.5)
                .with_timing(0.01, 60.0)
                .with_seed(seed);
            let traj = generate_trajectory(&cfg).unwrap();
            assert!(traj
                .pos
                .iter()
                .all(|&p| (0.0..=cfg.track_length).contains(&p)));
        }
    }

    #[test]
    fn same_seed_is_bit_identical() {
        let a = generate_trajectory(&short_cfg(42)).unwrap();
        let b = generate_trajectory(&short_cfg(42)).unwrap();
        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.pos), bits(&b.pos));
        assert_eq!(bits(&a.vel), bits(&b.vel));
        assert_eq!(bits(&a.time), bits(&b.time));
    }

    #[test]
    fn different_seeds_diverge() {
        let a = generate_trajectory(&short_cfg(1)).unwrap();
        let b = generate_trajectory(&short_cfg(2)).unwrap();
        assert_ne!(a.pos, b.pos);
    }

    #[test]
    fn midpoint_follows_track_length() {
        let cfg = short_cfg(5).with_track_length(3.0);
        let traj = generate_trajectory(&cfg).unwrap();
        assert_eq!(traj.pos[0], 1.5);
    }

    #[test]
    fn reflection_flips_velocity() {
        // Strong positive drift pushes the animal into the right wall.
        let cfg = TrajectoryConfig::default()
            .with_ou(5.0, 2.0, 0.0)
            .with_timing(0.01, 5.0)
            .with_seed(9);
        let traj = generate_trajectory(&cfg).unwrap();
        assert!(traj.vel.iter().any(|&v| v < 0.0));
        assert!(traj.pos.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }

    #[test]
    fn zero_noise_zero_velocity_stays_put() {
        let cfg = TrajectoryConfig::default()
            .with_ou(1.0, 0.0, 0.0)
            .with_timing(0.01, 1.0);
        let traj = generate_trajectory(&cfg).unwrap();
        assert!(traj.pos.iter().all(|&p| p == 0.5));
    }

    #[test]
    fn meta_records_parameters() {
        let cfg = short_cfg(17);
        let traj = generate_trajectory(&cfg).unwrap();
        assert_eq!(traj.meta.seed, 17);
        assert_eq!(traj.meta.dt, 0.01);
        assert_eq!(traj.meta.duration_s, 10.0);
        assert!(traj.meta.p_reject.is_none());
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad_dt = TrajectoryConfig::default().with_timing(0.0, 10.0);
        assert!(matches!(
            generate_trajectory(&bad_dt),
            Err(SimError::InvalidParameter(_))
        ));
        let bad_len = TrajectoryConfig::default().with_track_length(-1.0);
        assert!(generate_trajectory(&bad_len).is_err());
        let bad_sigma = TrajectoryConfig::default().with_ou(1.0, 0.0, -0.1);
        assert!(generate_trajectory(&bad_sigma).is_err());
        let nan_duration = TrajectoryConfig::default().with_timing(0.01, f64::NAN);
        assert!(generate_trajectory(&nan_duration).is_err());
    }
}
