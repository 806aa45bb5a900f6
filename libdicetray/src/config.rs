//! Tunables for the dice box and the die appearance.
//!
//! Everything deserializes from JSON with per-field defaults, so a config
//! file only needs the keys it changes.

use std::path::Path;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::die::DieType;
use crate::error::DiceError;
use crate::Real;

/// Restitution and friction between dice and one kind of surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialPair {
    pub restitution: Real,
    pub static_friction: Real,
    pub dynamic_friction: Real,
}

impl MaterialPair {
    pub const FLOOR: MaterialPair = MaterialPair {
        restitution: 0.25,
        static_friction: 0.6,
        dynamic_friction: 0.4,
    };
    pub const WALL: MaterialPair = MaterialPair {
        restitution: 0.6,
        static_friction: 0.0,
        dynamic_friction: 0.0,
    };
}

/// How wall-clock frame time is turned into simulation steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// Whole fixed steps only; leftover time carries to the next frame.
    #[default]
    Fixed,
    /// Fixed steps, then one partial step for the remainder.
    Adaptive,
}

/// Top-down perspective camera used for screen-space anchors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera height above the floor, looking straight down.
    pub height: Real,
    /// Vertical field of view in radians.
    pub fov_y: Real,
    pub viewport_width: Real,
    pub viewport_height: Real,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            height: 30.0,
            fov_y: 0.6,
            viewport_width: 1280.0,
            viewport_height: 768.0,
        }
    }
}

/// Physical box and simulation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    /// Half extents of the floor along x and z.
    pub half_width: Real,
    pub half_depth: Real,
    pub die_radius: Real,
    pub gravity: [Real; 3],
    /// Fixed simulation step in seconds.
    pub timestep: Real,
    pub step_mode: StepMode,
    /// Cap on whole steps per animation frame (fixed mode).
    pub max_substeps: u32,
    /// Simulated time after which a throw is resolved no matter what.
    pub max_sim_seconds: Real,
    pub solver_iterations: usize,
    /// Allowed penetration before position bias kicks in.
    pub contact_slop: Real,
    pub baumgarte: Real,
    pub linear_damping: Real,
    pub angular_damping: Real,
    pub roll_resistance: Real,
    /// Closing speeds below this never bounce.
    pub restitution_threshold: Real,
    pub settle_linear_epsilon: Real,
    pub settle_angular_epsilon: Real,
    pub settle_steps: u32,
    pub floor: MaterialPair,
    pub wall: MaterialPair,
    /// Spawn height range above the floor.
    pub spawn_height: (Real, Real),
    /// Downward launch speed added to every die.
    pub drop_speed: Real,
    pub camera: CameraConfig,
    /// Seed for throw randomness; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            half_width: 10.0,
            half_depth: 6.0,
            die_radius: 1.0,
            gravity: [0.0, -156.8, 0.0],
            timestep: 1.0 / 60.0,
            step_mode: StepMode::Fixed,
            max_substeps: 8,
            max_sim_seconds: 10.0,
            solver_iterations: 10,
            contact_slop: 0.005,
            baumgarte: 0.2,
            linear_damping: 0.1,
            angular_damping: 0.1,
            roll_resistance: 0.02,
            restitution_threshold: 5.0,
            settle_linear_epsilon: 0.1,
            settle_angular_epsilon: 0.5,
            settle_steps: 3,
            floor: MaterialPair::FLOOR,
            wall: MaterialPair::WALL,
            spawn_height: (4.0, 8.0),
            drop_speed: 0.2,
            camera: CameraConfig::default(),
            seed: None,
        }
    }
}

impl BoxConfig {
    pub fn from_json_str(json: &str) -> Result<Self, DiceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DiceError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| DiceError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn gravity(&self) -> Vector3<Real> {
        Vector3::from(self.gravity)
    }
}

/// Presentation choices that shape die meshes.
///
/// Passed explicitly into template construction; changing it means
/// rebuilding templates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Multiplier on each die type's bevel width; 0 gives sharp edges.
    pub bevel: Real,
    /// Scales label UVs about the face center.
    pub label_scale: Real,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            bevel: 1.0,
            label_scale: 1.0,
        }
    }
}

impl Theme {
    /// Chamfer factor for a die type, `None` when bevels are disabled.
    pub fn chamfer_factor(&self, die: DieType) -> Option<Real> {
        (self.bevel > 0.0).then(|| 1.0 - (1.0 - die.chamfer()) * self.bevel)
    }
}
