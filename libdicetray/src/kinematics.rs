//! Throw kinematics: turning a 2D throw gesture into per-die launch state.
//!
//! A [`ThrowRequest`] is generated exactly once per die per throw. The
//! prediction pass and the visible pass both spawn from the same request,
//! so it is an immutable value.

use std::f32::consts::{PI, TAU};
use std::time::Duration;

use nalgebra::{Point3, Unit, UnitQuaternion, Vector2, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::BoxConfig;
use crate::die::DieType;
use crate::Real;

/// Longest swipe that still adds boost.
const SWIPE_MAX: Duration = Duration::from_millis(2000);
/// Swipe duration at which the boost would reach zero.
const SWIPE_ZERO_BOOST_SECS: Real = 2.5;

/// Direction and strength of a throw in the floor plane (`x`, `z`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowVector {
    /// Unit direction; `.x` maps to world x and `.y` to world z.
    pub direction: Vector2<Real>,
    pub boost: Real,
}

impl ThrowVector {
    /// `direction` need not be normalized; a zero vector throws along +x.
    pub fn new(direction: Vector2<Real>, boost: Real) -> Self {
        let direction = direction
            .try_normalize(1e-6)
            .unwrap_or_else(|| Vector2::new(1.0, 0.0));
        Self { direction, boost }
    }

    /// Click-style throw: a random direction across the box.
    pub fn random<R: Rng>(rng: &mut R, config: &BoxConfig) -> Self {
        let v = Vector2::new(
            (rng.gen::<Real>() * 2.0 - 1.0) * config.half_width,
            -(rng.gen::<Real>() * 2.0 - 1.0) * config.half_depth,
        );
        let dist = v.norm();
        let boost = (rng.gen::<Real>() + 3.0) * dist;
        Self::new(v, boost)
    }

    /// Swipe gesture of `(dx, dz)` box units lasting `duration`. Slower
    /// swipes throw softer; swipes too short to read as a throw give `None`.
    pub fn from_swipe(dx: Real, dz: Real, duration: Duration, config: &BoxConfig) -> Option<Self> {
        let v = Vector2::new(dx, dz);
        let dist = v.norm();
        if dist < (config.half_width * config.half_depth * 0.1).sqrt() {
            return None;
        }
        let t = duration.min(SWIPE_MAX).as_secs_f32();
        let boost = ((SWIPE_ZERO_BOOST_SECS - t) / SWIPE_ZERO_BOOST_SECS).sqrt() * dist * 2.0;
        Some(Self::new(v, boost))
    }
}

/// Launch state of one die.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowRequest {
    pub die_type: DieType,
    pub position: Point3<Real>,
    pub velocity: Vector3<Real>,
    pub angular_velocity: Vector3<Real>,
    /// Initial rotation axis (not necessarily normalized) and angle.
    pub axis: Vector3<Real>,
    pub angle: Real,
}

impl ThrowRequest {
    pub fn orientation(&self) -> UnitQuaternion<Real> {
        let axis = Unit::try_new(self.axis, 1e-6).unwrap_or_else(Vector3::y_axis);
        UnitQuaternion::from_axis_angle(&axis, self.angle)
    }
}

/// Rotate `dir` by a random angle within +-18 degrees.
fn perturb<R: Rng>(rng: &mut R, dir: Vector2<Real>) -> Vector2<Real> {
    let angle = rng.gen::<Real>() * PI / 5.0 - PI / 10.0;
    let (s, c) = angle.sin_cos();
    Vector2::new(dir.x * c - dir.y * s, dir.x * s + dir.y * c)
}

/// Generate one launch per die.
///
/// Each die spawns near the box edge opposite its perturbed direction and
/// flies back across the floor.
pub fn plan_throw<R: Rng>(
    dice: &[DieType],
    throw: &ThrowVector,
    config: &BoxConfig,
    rng: &mut R,
) -> Vec<ThrowRequest> {
    let (low, high) = config.spawn_height;
    dice.iter()
        .map(|&die_type| {
            let vec = perturb(rng, throw.direction);
            let mut x = config.half_width * 0.9 * if vec.x > 0.0 { -1.0 } else { 1.0 };
            let mut z = config.half_depth * 0.9 * if vec.y > 0.0 { -1.0 } else { 1.0 };
            let projector = (vec.x / vec.y).abs();
            if projector > 1.0 {
                z /= projector;
            } else {
                x *= projector;
            }
            let y = low + rng.gen::<Real>() * (high - low);

            let vel = perturb(rng, throw.direction);
            let velocity = Vector3::new(vel.x * throw.boost, -config.drop_speed, vel.y * throw.boost);

            let spin_x = rng.gen::<Real>() * 5.0 + die_type.inertia();
            let spin_z = rng.gen::<Real>() * 5.0 + die_type.inertia();
            let angular_velocity = Vector3::new(vec.y * spin_x, 0.0, -vec.x * spin_z);

            let axis = Vector3::new(rng.gen(), rng.gen(), rng.gen());
            let angle = rng.gen::<Real>() * TAU;

            ThrowRequest {
                die_type,
                position: Point3::new(x, y, z),
                velocity,
                angular_velocity,
                axis,
                angle,
            }
        })
        .collect()
}
