//! Rigid bodies and live dice.

use std::sync::Arc;

use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

use crate::die::DieType;
use crate::hull::CollisionHull;
use crate::kinematics::ThrowRequest;
use crate::mesh::PolytopeMesh;
use crate::Real;

/// Rigid-body data: mass, inverse mass, inverse inertia in body space, and state.
#[derive(Clone, Debug, PartialEq)]
pub struct RigidBody {
    pub mass: Real,
    pub inv_mass: Real,
    /// Inverse inertia in body coordinates.
    pub inv_inertia_body: Matrix3<Real>,

    pub position: Point3<Real>,
    pub orientation: UnitQuaternion<Real>,
    pub velocity: Vector3<Real>,
    pub angular_velocity: Vector3<Real>,
}

impl RigidBody {
    pub fn from_hull(hull: &CollisionHull) -> Self {
        Self {
            mass: hull.mass,
            inv_mass: 1.0 / hull.mass.max(1e-6),
            inv_inertia_body: hull.inv_inertia,
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }

    pub fn inv_inertia_world(&self) -> Matrix3<Real> {
        let rotation = self.orientation.to_rotation_matrix();
        let r = rotation.matrix();
        r * self.inv_inertia_body * r.transpose()
    }

    pub fn apply_impulse_at_point(&mut self, impulse: Vector3<Real>, contact_r: Vector3<Real>) {
        self.velocity += impulse * self.inv_mass;
        let inv_iw = self.inv_inertia_world();
        self.angular_velocity += inv_iw * contact_r.cross(&impulse);
    }

    /// Velocity of the body-attached point at offset `r` from the center.
    pub fn point_velocity(&self, r: &Vector3<Real>) -> Vector3<Real> {
        self.velocity + self.angular_velocity.cross(r)
    }

    /// Semi-implicit position update: `q' = 0.5 * w_quat * q`, renormalized.
    pub fn integrate(&mut self, dt: Real) {
        self.position += self.velocity * dt;
        let w = self.angular_velocity;
        let q = *self.orientation.quaternion();
        let dq = Quaternion::from_parts(0.0, w) * q * (0.5 * dt);
        self.orientation = UnitQuaternion::new_normalize(q + dq);
    }
}

/// One die in flight: its render mesh (owned, relabelable), its shared hull
/// and its rigid-body state.
#[derive(Clone, Debug)]
pub struct DieInstance {
    pub die_type: DieType,
    pub mesh: PolytopeMesh,
    pub hull: Arc<CollisionHull>,
    pub body: RigidBody,
    /// Consecutive steps spent below the settle epsilons.
    pub still_steps: u32,
    /// Iteration at which the die was flagged settled, `None` while moving.
    pub settled_since: Option<u32>,
}

impl DieInstance {
    /// Place a fresh die according to its throw request.
    pub fn spawn(
        mesh: PolytopeMesh,
        hull: Arc<CollisionHull>,
        request: &ThrowRequest,
    ) -> Self {
        let mut body = RigidBody::from_hull(&hull);
        body.position = request.position;
        body.orientation = request.orientation();
        body.velocity = request.velocity;
        body.angular_velocity = request.angular_velocity;
        Self {
            die_type: mesh.die_type,
            mesh,
            hull,
            body,
            still_steps: 0,
            settled_since: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.settled_since.is_some()
    }

    /// World-space hull vertices.
    pub fn vertices_world(&self) -> Vec<Point3<Real>> {
        let r = self.body.orientation.to_rotation_matrix();
        self.hull
            .vertices
            .iter()
            .map(|p| self.body.position + r * p.coords)
            .collect()
    }
}
