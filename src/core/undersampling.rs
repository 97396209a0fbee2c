//! Trajectory variant that under-samples the far end of the track.
//!
//! The animal carries a non-negative speed and a direction instead of a signed
//! velocity. Rightward attempts to enter the last zone of the track are turned
//! back with probability `p_reject`, which depletes occupancy there.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{require_unit_interval, SimResult};
use crate::prng::Prng;
use crate::trajectory::{time_axis, Trajectory, TrajectoryConfig, TrajectoryMeta};

/// Speed damping applied when bouncing off either end of the track.
pub const WALL_SPEED_DAMPING: f64 = 0.6;
/// Speed damping applied when an entry into the last zone is rejected.
pub const REJECT_SPEED_DAMPING: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct UndersamplingConfig {
    /// Track, timing and OU parameters. `mu` is the mean speed here.
    pub base: TrajectoryConfig,
    /// Fraction of the track (at the right end) forming the last zone.
    pub last_zone_frac: f64,
    /// Probability that a rightward entry into the last zone is turned back.
    pub p_reject: f64,
}

impl Default for UndersamplingConfig {
    fn default() -> Self {
        Self {
            base: TrajectoryConfig {
                mu: 0.25,
                ..TrajectoryConfig::default()
            },
            last_zone_frac: 0.2,
            p_reject: 0.5,
        }
    }
}

impl UndersamplingConfig {
    pub fn with_base(mut self, base: TrajectoryConfig) -> Self {
        self.base = base;
        self
    }

    pub fn with_zone(mut self, last_zone_frac: f64, p_reject: f64) -> Self {
        self.last_zone_frac = last_zone_frac;
        self.p_reject = p_reject;
        self
    }

    pub fn validate(&self) -> SimResult<()> {
        self.base.validate()?;
        require_unit_interval("last_zone_frac", self.last_zone_frac)?;
        require_unit_interval("p_reject", self.p_reject)?;
        Ok(())
    }

    /// Left edge of the last zone; positions strictly beyond it are inside.
    pub fn zone_start(&self) -> f64 {
        self.base.track_length * (1.0 - self.last_zone_frac)
    }
}

/// Outcome of a single integration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepEvent {
    None,
    ZoneRejected,
    Wall,
}

#[derive(Debug, Clone, Copy)]
struct Walker {
    pos: f64,
    speed: f64,
    direction: f64,
}

impl Walker {
    fn step(&mut self, cfg: &UndersamplingConfig, rng: &mut Prng) -> StepEvent {
        let base = &cfg.base;
        let length = base.track_length;
        let zone_start = cfg.zone_start();

        let noise = base.sigma * base.dt.sqrt() * rng.standard_normal();
        self.speed = (self.speed + base.theta * (base.mu - self.speed) * base.dt + noise).max(0.0);

        let mut next = self.pos + self.direction * self.speed * base.dt;

        let entering = self.direction > 0.0 && self.pos <= zone_start && next > zone_start;
        if entering && rng.next_f64_01() < cfg.p_reject {
            next = 2.0 * zone_start - next;
            self.speed *= REJECT_SPEED_DAMPING;
            self.direction = -1.0;
            self.pos = next.clamp(0.0, length);
            return StepEvent::ZoneRejected;
        }

        let event = if next < 0.0 {
            next = -next;
            self.direction = 1.0;
            self.speed *= WALL_SPEED_DAMPING;
            StepEvent::Wall
        } else if next > length {
            next = 2.0 * length - next;
            self.direction = -1.0;
            self.speed *= WALL_SPEED_DAMPING;
            StepEvent::Wall
        } else {
            StepEvent::None
        };

        self.pos = next.clamp(0.0, length);
        event
    }

    fn velocity(&self) -> f64 {
        self.direction * self.speed
    }
}

/// Simulate a trajectory with probabilistic rejection of the last zone.
///
/// Starts at the left end (`pos = 0`) with speed `|v0|`, heading right unless
/// `v0` is negative. The recorded velocity is `direction * speed`.
///
/// Each step consumes one normal draw for the speed update and, only when the
/// proposal crosses into the zone from the left while heading right, one
/// uniform draw for the accept/reject decision.
pub fn generate_undersampled_trajectory(cfg: &UndersamplingConfig) -> SimResult<Trajectory> {
    cfg.validate()?;

    let base = &cfg.base;
    let mut rng = Prng::new(base.seed);
    let n_steps = base.n_steps();
    let time = time_axis(n_steps, base.dt);

    let mut walker = Walker {
        pos: 0.0,
        speed: base.v0.abs(),
        direction: if base.v0 < 0.0 { -1.0 } else { 1.0 },
    };

    let mut pos = Vec::with_capacity(n_steps);
    let mut vel = Vec::with_capacity(n_steps);
    let mut rejections = 0usize;
    let mut wall_hits = 0usize;

    if n_steps > 0 {
        pos.push(walker.pos);
        vel.push(walker.velocity());
    }
    for _ in 1..n_steps {
        match walker.step(cfg, &mut rng) {
            StepEvent::ZoneRejected => rejections += 1,
            StepEvent::Wall => wall_hits += 1,
            StepEvent::None => {}
        }
        pos.push(walker.pos);
        vel.push(walker.velocity());
    }

    tracing::debug!(
        n_steps,
        rejections,
        wall_hits,
        p_reject = cfg.p_reject,
        "generated undersampled trajectory"
    );

    let mut meta = TrajectoryMeta::from(base);
    meta.last_zone_frac = Some(cfg.last_zone_frac);
    meta.p_reject = Some(cfg.p_reject);

    Ok(Trajectory {
        time,
        pos,
        vel,
        meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn cfg(seed: u64, p_reject: f64) -> UndersamplingConfig {
        UndersamplingConfig::default()
            .with_base(
                TrajectoryConfig::default()
                    .with_ou(1.0, 0.3, 0.4)
                    .with_timing(0.01, 600.0)
                    .with_seed(seed),
            )
            .with_zone(0.2, p_reject)
    }

    fn zone_fraction(traj: &Trajectory, zone_start: f64) -> f64 {
        let inside = traj.pos.iter().filter(|&&p| p > zone_start).count();
        inside as f64 / traj.len() as f64
    }

    #[test]
    fn starts_at_left_end() {
        let traj = generate_undersampled_trajectory(&cfg(1, 0.5)).unwrap();
        assert_eq!(traj.pos[0], 0.0);
        assert_eq!(traj.len(), 60_000);
    }

    #[test]
    fn full_rejection_never_enters_zone() {
        for seed in 0..4 {
            let c = cfg(seed, 1.0);
            let traj = generate_undersampled_trajectory(&c).unwrap();
            assert_eq!(zone_fraction(&traj, c.zone_start()), 0.0);
        }
    }

    #[test]
    fn rejection_depletes_zone_occupancy() {
        let open = cfg(7, 0.0);
        let biased = cfg(7, 0.8);
        let open_frac = zone_fraction(&generate_undersampled_trajectory(&open).unwrap(), open.zone_start());
        let biased_frac =
            zone_fraction(&generate_undersampled_trajectory(&biased).unwrap(), biased.zone_start());
        assert!(open_frac > 0.0);
        assert!(biased_frac < open_frac, "open={open_frac} biased={biased_frac}");
    }

    #[test]
    fn positions_stay_on_track_and_speed_non_negative() {
        let c = cfg(3, 0.5);
        let traj = generate_undersampled_trajectory(&c).unwrap();
        assert!(traj.pos.iter().all(|&p| (0.0..=1.0).contains(&p)));
        // |vel| is the speed.
        assert!(traj.vel.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn deterministic_for_seed() {
        let a = generate_undersampled_trajectory(&cfg(11, 0.5)).unwrap();
        let b = generate_undersampled_trajectory(&cfg(11, 0.5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn meta_carries_zone_parameters() {
        let traj = generate_undersampled_trajectory(&cfg(2, 0.25)).unwrap();
        assert_eq!(traj.meta.last_zone_frac, Some(0.2));
        assert_eq!(traj.meta.p_reject, Some(0.25));
    }

    #[test]
    fn rejected_entry_turns_walker_left() {
        let c = UndersamplingConfig::default()
            .with_base(TrajectoryConfig::default().with_ou(0.0, 0.0, 0.0).with_timing(0.1, 1.0))
            .with_zone(0.2, 1.0);
        let mut walker = Walker {
            pos: 0.75,
            speed: 1.0,
            direction: 1.0,
        };
        let mut rng = Prng::new(1);
        let event = walker.step(&c, &mut rng);
        assert_eq!(event, StepEvent::ZoneRejected);
        assert_eq!(walker.direction, -1.0);
        assert_eq!(walker.speed, 0.5);
        // Proposal 0.85 mirrors back across 0.8.
        assert!((walker.pos - 0.75).abs() < 1e-12);
    }

    #[test]
    fn wall_bounce_damps_speed() {
        let c = UndersamplingConfig::default()
            .with_base(TrajectoryConfig::default().with_ou(0.0, 0.0, 0.0).with_timing(0.1, 1.0))
            .with_zone(0.0, 0.0);
        let mut walker = Walker {
            pos: 0.05,
            speed: 1.0,
            direction: -1.0,
        };
        let mut rng = Prng::new(1);
        assert_eq!(walker.step(&c, &mut rng), StepEvent::Wall);
        assert_eq!(walker.direction, 1.0);
        assert!((walker.speed - WALL_SPEED_DAMPING).abs() < 1e-12);
        assert!((walker.pos - 0.05).abs() < 1e-12);
    }

    #[test]
    fn negative_speed_is_clamped() {
        let c = UndersamplingConfig::default()
            .with_base(TrajectoryConfig::default().with_ou(100.0, -5.0, 0.0).with_timing(0.1, 1.0))
            .with_zone(0.2, 0.0);
        let mut walker = Walker {
            pos: 0.5,
            speed: 0.1,
            direction: 1.0,
        };
        let mut rng = Prng::new(1);
        walker.step(&c, &mut rng);
        assert_eq!(walker.speed, 0.0);
        assert_eq!(walker.pos, 0.5);
        assert_eq!(walker.direction, 1.0);
    }

    #[test]
    fn rejects_out_of_range_zone_parameters() {
        let bad = UndersamplingConfig::default().with_zone(0.2, 1.5);
        assert!(matches!(
            generate_undersampled_trajectory(&bad),
            Err(SimError::InvalidParameter(_))
        ));
        let bad = UndersamplingConfig::default().with_zone(-0.1, 0.5);
        assert!(generate_undersampled_trajectory(&bad).is_err());
    }
}
