//! libdicetray: physically simulated polyhedral dice with optional forced outcomes.
//!
//! - d4, d6, d8, d9, d10, d12, d20 and d100 built from canonical polytopes
//! - Chamfered render meshes with per-triangle face groups (printed labels)
//! - Unchamfered convex collision hulls with exact mass properties
//! - Semi-implicit integration, sequential-impulse contacts against a floor
//!   and four walls, Coulomb friction, rolling resistance, settle detection
//! - Outcome reading, and label rewriting that makes a replayed throw land
//!   on requested values
//!
//! Public API:
//! - notation::parse(&str) -> RollNotation, notation::stringify(&RollNotation) -> String
//! - DiceBox::new(config, theme)
//! - dice_box.roll(&notation, throw, on_complete) -> Option<RunId>, then
//!   dice_box.animate(run, elapsed) once per frame
//! - dice_box.roll_to_completion(&notation, throw) -> Option<RollOutcome>
//! - dice_box.screen_positions() -> Vec<ScreenAnchor>
//!
//! Example (headless):
//! let mut dice_box = DiceBox::new(BoxConfig::default(), Theme::default());
//! let outcome = dice_box.roll_to_completion(&parse("2d6+1d20+3"), None)?;
//! outcome.map(|o| o.total)

pub mod body;
pub mod camera;
pub mod chamfer;
pub mod config;
pub mod dicebox;
pub mod die;
pub mod error;
pub mod forcing;
pub mod hull;
pub mod kinematics;
pub mod mesh;
pub mod notation;
pub mod outcome;
pub mod polyhedron;
pub mod settle;
pub mod template;
pub mod world;

pub use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector2, Vector3};

pub use body::{DieInstance, RigidBody};
pub use camera::{Camera, ScreenAnchor};
pub use config::{BoxConfig, CameraConfig, MaterialPair, StepMode, Theme};
pub use dicebox::{DiceBox, RollOutcome, RunId, RunState};
pub use die::DieType;
pub use error::{DiceError, GeometryError};
pub use kinematics::{ThrowRequest, ThrowVector};
pub use mesh::PolytopeMesh;
pub use notation::{parse, stringify, RollNotation};
pub use polyhedron::Polyhedron;
pub use world::ThrowSimulator;

pub type Real = f32;
