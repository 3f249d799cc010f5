// Trapezoidal velocity profiles and straight-line move sampling

use crate::linkage::Point;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("zero-length move at {position}")]
    DegenerateMove { position: f64 },

    #[error("limits must be positive and finite (max_velocity {max_velocity}, acceleration {acceleration})")]
    InvalidLimit { max_velocity: f64, acceleration: f64 },
}

/// Single-axis trapezoidal velocity profile.
///
/// The profile is fully determined at construction: an acceleration ramp up
/// to the cruise velocity, an optional constant-velocity cruise, and a
/// matching deceleration ramp. `t1` and `t2` are the absolute phase
/// breakpoints and `t3` the total duration; when the move is too short to
/// reach the velocity limit the cruise phase vanishes (`t1 == t2`) and the
/// profile degenerates to a triangle.
///
/// Positions evolve only through [`TrapezoidProfile::tick`], driven by the
/// caller's clock. The phase formulas produce a displacement measured from
/// zero; [`TrapezoidProfile::displacement`] exposes that raw value and
/// [`TrapezoidProfile::position`] offsets it into the caller's frame.
#[derive(Clone, Copy, Debug)]
pub struct TrapezoidProfile {
    initial_position: f64,
    final_position: f64,
    velocity: f64,
    acceleration: f64,
    t1: f64,
    t2: f64,
    t3: f64,
    current_time: f64,
    current_offset: f64,
    active: bool,
}

impl TrapezoidProfile {
    /// Plan a move between two positions under magnitude limits.
    ///
    /// Both limits are magnitudes; signs are derived from the direction of
    /// travel. A zero-length move yields an inactive zero-duration profile
    /// holding the initial position. Non-positive limits are not checked
    /// here — callers wanting validation use [`TrapezoidProfile::plan`].
    pub fn new(
        initial_position: f64,
        final_position: f64,
        max_velocity: f64,
        acceleration: f64,
    ) -> Self {
        let displacement = final_position - initial_position;
        if displacement == 0.0 {
            return Self {
                initial_position,
                final_position,
                velocity: 0.0,
                acceleration: 0.0,
                t1: 0.0,
                t2: 0.0,
                t3: 0.0,
                current_time: 0.0,
                current_offset: 0.0,
                active: false,
            };
        }

        let acceleration = acceleration.copysign(displacement);
        // displacement * acceleration is non-negative by construction, so
        // the square root cannot trip on a sign mismatch.
        let velocity = (displacement * acceleration)
            .sqrt()
            .min(max_velocity)
            .copysign(displacement);

        // t2 doubles as displacement/velocity and the absolute end of the
        // cruise phase: the accel and decel ramps each cover velocity*t1/2,
        // so the two readings coincide for this profile family.
        let t1 = velocity / acceleration;
        let t2 = displacement / velocity;
        let t3 = t1 + t2;

        Self {
            initial_position,
            final_position,
            velocity,
            acceleration,
            t1,
            t2,
            t3,
            current_time: 0.0,
            current_offset: 0.0,
            active: true,
        }
    }

    /// Checked constructor: rejects non-positive or non-finite limits and
    /// zero-length moves with explicit errors instead of the garbage-in
    /// contract of [`TrapezoidProfile::new`].
    pub fn plan(
        initial_position: f64,
        final_position: f64,
        max_velocity: f64,
        acceleration: f64,
    ) -> Result<Self, ProfileError> {
        if !(max_velocity > 0.0 && max_velocity.is_finite())
            || !(acceleration > 0.0 && acceleration.is_finite())
        {
            return Err(ProfileError::InvalidLimit {
                max_velocity,
                acceleration,
            });
        }
        let displacement = final_position - initial_position;
        if displacement == 0.0 || !displacement.is_finite() {
            return Err(ProfileError::DegenerateMove {
                position: initial_position,
            });
        }
        Ok(Self::new(
            initial_position,
            final_position,
            max_velocity,
            acceleration,
        ))
    }

    /// Advance the profile by one caller-supplied time step.
    ///
    /// Phase selection is purely time-driven: the accumulated time is
    /// compared against the precomputed breakpoints on every call. Past
    /// `t3` the profile deactivates and the position is left where the last
    /// in-profile tick put it, not snapped to the target.
    pub fn tick(&mut self, time_step: f64) {
        if !self.active {
            return;
        }

        self.current_time += time_step;
        let t = self.current_time;

        if t <= self.t1 {
            self.current_offset = 0.5 * self.acceleration * t * t;
        } else if t <= self.t2 {
            self.current_offset =
                self.velocity * (t - self.t1) + 0.5 * self.acceleration * self.t1 * self.t1;
        } else if t <= self.t3 {
            self.current_offset = self.velocity * (t - self.t1)
                + 0.5 * self.acceleration * self.t1 * self.t1
                - 0.5 * self.acceleration * (t - self.t2) * (t - self.t2);
        } else {
            self.active = false;
        }
    }

    /// Commanded position in the caller's frame.
    pub fn position(&self) -> f64 {
        self.initial_position + self.current_offset
    }

    /// Distance traveled from the initial position — the raw value the
    /// phase formulas produce.
    pub fn displacement(&self) -> f64 {
        self.current_offset
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn target(&self) -> f64 {
        self.final_position
    }

    /// Total profile duration.
    pub fn duration(&self) -> f64 {
        self.t3
    }

    /// Absolute phase breakpoints: end of acceleration, end of cruise, end
    /// of the move.
    pub fn phase_times(&self) -> (f64, f64, f64) {
        (self.t1, self.t2, self.t3)
    }

    /// Time accumulated by ticks so far.
    pub fn elapsed(&self) -> f64 {
        self.current_time
    }
}

/// Straight-line cartesian move sampled at a fixed period.
///
/// Component velocities derive from the dominant-axis travel time at
/// `max_velocity`. A move shorter than one sampling period collapses to the
/// final point alone; the last sample is snapped to the exact target so
/// accumulated rounding never lands the move short.
pub fn constant_velocity(
    initial: Point,
    target: Point,
    max_velocity: f64,
    sampling_time: f64,
) -> Vec<Point> {
    let dx = target.x - initial.x;
    let dy = target.y - initial.y;
    let travel_time = dx.abs().max(dy.abs()) / max_velocity;

    if !(travel_time > sampling_time) {
        return vec![target];
    }

    let vx = dx / travel_time;
    let vy = dy / travel_time;

    let samples = (travel_time / sampling_time) as usize;
    let mut points = Vec::with_capacity(samples);
    for i in 0..samples {
        let t = (i + 1) as f64 * sampling_time;
        points.push(Point::new(initial.x + vx * t, initial.y + vy * t));
    }
    if let Some(last) = points.last_mut() {
        *last = target;
    }

    points
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tick until the profile deactivates, asserting strict monotonicity in
    /// the direction of travel while it is live.
    fn run_to_end(profile: &mut TrapezoidProfile, time_step: f64) {
        let direction = (profile.target() - profile.position()).signum();
        let mut previous = profile.position();
        while profile.is_active() {
            profile.tick(time_step);
            if profile.is_active() {
                assert!(
                    (profile.position() - previous) * direction > 0.0,
                    "position reversed at t={}",
                    profile.elapsed()
                );
                previous = profile.position();
            }
        }
    }

    #[test]
    fn triangular_profile_phase_times() {
        // Short move, generous acceleration: sqrt(d*a) < max_velocity, so
        // the cruise phase vanishes.
        let profile = TrapezoidProfile::plan(0.0, 0.10, 0.5, 2.0).unwrap();
        let (t1, t2, t3) = profile.phase_times();
        let expected_t1 = (0.10f64 / 2.0).sqrt();
        assert!((t1 - expected_t1).abs() < 1e-12);
        assert!((t2 - t1).abs() < 1e-12);
        assert!((t3 - 2.0 * expected_t1).abs() < 1e-12);
    }

    #[test]
    fn trapezoidal_profile_phase_times() {
        // Long move, low velocity limit: a true trapezoid with t1 < t2.
        let profile = TrapezoidProfile::plan(0.0, 1.0, 0.5, 2.0).unwrap();
        let (t1, t2, t3) = profile.phase_times();
        assert!((t1 - 0.25).abs() < 1e-12);
        assert!((t2 - 2.0).abs() < 1e-12);
        assert!((t3 - 2.25).abs() < 1e-12);
        assert!(t1 < t2);

        // t2 as displacement/velocity equals the absolute end of cruise.
        let cruise_distance = 1.0 - 2.0 * t1 * t1;
        assert!((t2 - (t1 + cruise_distance / 0.5)).abs() < 1e-12);
    }

    #[test]
    fn ticking_lands_within_one_step_of_target() {
        let mut profile = TrapezoidProfile::plan(0.0, 0.10, 0.5, 2.0).unwrap();
        run_to_end(&mut profile, 0.01);

        // The endpoint is not snapped; it may fall short by at most one
        // tick's worth of travel.
        assert!((profile.position() - 0.10).abs() < 0.5 * 0.01);
        assert!((profile.displacement() - 0.10).abs() < 0.5 * 0.01);
        assert!(profile.position() <= 0.10);
    }

    #[test]
    fn position_is_offset_displacement_is_not() {
        let mut profile = TrapezoidProfile::plan(0.5, 0.6, 0.5, 2.0).unwrap();
        run_to_end(&mut profile, 0.01);
        assert!((profile.position() - 0.6).abs() < 5e-3);
        assert!((profile.displacement() - 0.1).abs() < 5e-3);
    }

    #[test]
    fn negative_moves_descend_monotonically() {
        let mut profile = TrapezoidProfile::plan(0.2, 0.1, 0.5, 2.0).unwrap();
        run_to_end(&mut profile, 0.01);
        assert!((profile.position() - 0.1).abs() < 5e-3);
        assert!(profile.position() >= 0.1);
    }

    #[test]
    fn zero_displacement_is_inactive_at_birth() {
        let profile = TrapezoidProfile::new(1.0, 1.0, 0.5, 2.0);
        assert!(!profile.is_active());
        assert_eq!(profile.position(), 1.0);
        assert_eq!(profile.duration(), 0.0);
    }

    #[test]
    fn plan_rejects_degenerate_and_invalid_inputs() {
        assert!(matches!(
            TrapezoidProfile::plan(1.0, 1.0, 0.5, 2.0),
            Err(ProfileError::DegenerateMove { .. })
        ));
        assert!(matches!(
            TrapezoidProfile::plan(0.0, 1.0, 0.0, 2.0),
            Err(ProfileError::InvalidLimit { .. })
        ));
        assert!(matches!(
            TrapezoidProfile::plan(0.0, 1.0, 0.5, -2.0),
            Err(ProfileError::InvalidLimit { .. })
        ));
        assert!(matches!(
            TrapezoidProfile::plan(0.0, f64::NAN, 0.5, 2.0),
            Err(ProfileError::DegenerateMove { .. })
        ));
    }

    #[test]
    fn tick_is_a_no_op_once_inactive() {
        let mut profile = TrapezoidProfile::plan(0.0, 0.10, 0.5, 2.0).unwrap();
        run_to_end(&mut profile, 0.01);
        let resting = profile.position();
        profile.tick(0.01);
        profile.tick(0.01);
        assert_eq!(profile.position(), resting);
        assert!(!profile.is_active());
    }

    #[test]
    fn constant_velocity_samples_the_segment() {
        let points = constant_velocity(
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.5),
            1.0,
            0.25,
        );
        assert_eq!(points.len(), 4);
        assert_eq!(points[0], Point::new(0.25, 0.125));
        assert_eq!(points[3], Point::new(1.0, 0.5));
        // collinearity: y tracks x at half slope
        for p in &points {
            assert!((p.y - 0.5 * p.x).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_velocity_short_move_is_a_single_sample() {
        let target = Point::new(0.001, 0.0);
        let points = constant_velocity(Point::new(0.0, 0.0), target, 1.0, 0.25);
        assert_eq!(points, vec![target]);

        let stationary = constant_velocity(target, target, 1.0, 0.25);
        assert_eq!(stationary, vec![target]);
    }
}
