//! Throw simulation: gravity, a floor, four walls and an impulse solver.
//!
//! Dice only collide with the box, never with each other. Given the same
//! dice and the same throw requests, stepping is fully deterministic.

use log::{trace, warn};
use nalgebra::Vector3;

use crate::body::{DieInstance, RigidBody};
use crate::config::{BoxConfig, MaterialPair, StepMode};
use crate::settle::SettleDetector;
use crate::Real;

const EPS: Real = 1e-6;

/// Static half-space `normal . p >= offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub offset: Real,
    pub material: MaterialPair,
}

impl Plane {
    pub fn distance(&self, p: &Vector3<Real>) -> Real {
        self.normal.dot(p) - self.offset
    }
}

/// The floor plus four inward-facing walls around `half_width x half_depth`.
pub fn box_planes(config: &BoxConfig) -> Vec<Plane> {
    let wall = |normal: Vector3<Real>, half: Real| Plane {
        normal,
        offset: -half,
        material: config.wall,
    };
    vec![
        Plane {
            normal: Vector3::y(),
            offset: 0.0,
            material: config.floor,
        },
        wall(Vector3::x(), config.half_width),
        wall(-Vector3::x(), config.half_width),
        wall(Vector3::z(), config.half_depth),
        wall(-Vector3::z(), config.half_depth),
    ]
}

/// One hull vertex touching (or about to touch) a plane.
struct Contact {
    r: Vector3<Real>,
    normal: Vector3<Real>,
    tangents: [Vector3<Real>; 2],
    material: MaterialPair,
    /// Normal velocity the solver drives toward.
    target: Real,
    normal_mass: Real,
    tangent_mass: [Real; 2],
    normal_impulse: Real,
    tangent_impulse: [Real; 2],
}

/// Owns the dice of one throw and steps them until they settle.
#[derive(Debug)]
pub struct ThrowSimulator {
    config: BoxConfig,
    planes: Vec<Plane>,
    dice: Vec<DieInstance>,
    detector: SettleDetector,
    iteration: u32,
    /// Simulated seconds so far; `f64` so thousands of short steps sum cleanly.
    simulated: f64,
    accumulator: Real,
    finished: bool,
}

impl ThrowSimulator {
    pub fn new(config: &BoxConfig, dice: Vec<DieInstance>) -> Self {
        let detector = SettleDetector::from_config(config);
        let finished = detector.is_finished(&dice, 0.0);
        Self {
            config: config.clone(),
            planes: box_planes(config),
            dice,
            detector,
            iteration: 0,
            simulated: 0.0,
            accumulator: 0.0,
            finished,
        }
    }

    pub fn dice(&self) -> &[DieInstance] {
        &self.dice
    }

    pub fn into_dice(self) -> Vec<DieInstance> {
        self.dice
    }

    /// Steps taken so far.
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// Seconds of simulated time covered by the steps taken so far.
    pub fn simulated_seconds(&self) -> Real {
        self.simulated as Real
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance by `elapsed` seconds of wall-clock time. Returns the number
    /// of steps taken.
    pub fn advance(&mut self, elapsed: Real, mode: StepMode) -> u32 {
        let dt = self.config.timestep;
        let mut steps = 0;
        match mode {
            StepMode::Fixed => {
                let max_substeps = self.config.max_substeps.max(1);
                // Time debt beyond one frame's worth of substeps is dropped.
                self.accumulator += elapsed.min(dt * (max_substeps + 1) as Real);
                while self.accumulator >= dt && steps < max_substeps && !self.finished {
                    self.step(dt);
                    self.accumulator -= dt;
                    steps += 1;
                }
            }
            StepMode::Adaptive => {
                let mut remaining = elapsed;
                while remaining >= dt && !self.finished {
                    self.step(dt);
                    remaining -= dt;
                    steps += 1;
                }
                if remaining > EPS && !self.finished {
                    self.step(remaining);
                    steps += 1;
                }
            }
        }
        steps
    }

    /// Fast-forward with whole fixed steps until the throw finishes.
    /// Returns the final iteration count.
    pub fn run_to_rest(&mut self) -> u32 {
        let dt = self.config.timestep;
        while !self.finished {
            self.step(dt);
        }
        self.iteration
    }

    /// One simulation step of length `dt`.
    pub fn step(&mut self, dt: Real) {
        if self.finished {
            return;
        }
        let gravity = self.config.gravity();
        let linear_damping = 1.0 / (1.0 + dt * self.config.linear_damping);
        let angular_damping = 1.0 / (1.0 + dt * self.config.angular_damping);

        let mut contact_count = 0;
        for die in &mut self.dice {
            let body = &mut die.body;
            body.velocity += gravity * dt;
            body.velocity *= linear_damping;
            body.angular_velocity *= angular_damping;

            let mut contacts = collect_contacts(die, &self.planes, &self.config, dt);
            contact_count += contacts.len();
            for _ in 0..self.config.solver_iterations {
                for contact in &mut contacts {
                    solve_contact(&mut die.body, contact);
                }
            }

            let body = &mut die.body;
            if !contacts.is_empty() {
                let inv_iw = body.inv_inertia_world();
                let tau = -body.angular_velocity * self.config.roll_resistance * body.mass;
                body.angular_velocity += inv_iw * tau * dt;
            }
            body.integrate(dt);
        }

        self.iteration += 1;
        self.simulated += f64::from(dt);
        let simulated = self.simulated as Real;
        self.finished = self.detector.observe(&mut self.dice, self.iteration, simulated);
        trace!(
            "step {}: {} contacts, finished={}",
            self.iteration,
            contact_count,
            self.finished
        );
        if self.finished && !self.dice.iter().all(DieInstance::is_settled) {
            warn!(
                "throw still moving after {} steps ({:.2} s); resolving from current state",
                self.iteration, self.simulated
            );
        }
    }
}

fn tangent_basis(n: &Vector3<Real>) -> [Vector3<Real>; 2] {
    let reference = if n.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let t1 = n.cross(&reference).normalize();
    let t2 = n.cross(&t1);
    [t1, t2]
}

/// Speculative vertex contacts: a vertex counts when it is within the slop
/// of a plane or would cross it during this step.
fn collect_contacts(
    die: &DieInstance,
    planes: &[Plane],
    config: &BoxConfig,
    dt: Real,
) -> Vec<Contact> {
    let body = &die.body;
    let rotation = body.orientation.to_rotation_matrix();
    let inv_iw = body.inv_inertia_world();
    let mass_along = |r: &Vector3<Real>, dir: &Vector3<Real>| {
        let angular = (inv_iw * r.cross(dir)).cross(r).dot(dir);
        (body.inv_mass + angular).max(EPS)
    };

    let radius = die.hull.bounding_radius();
    // No vertex can move faster than this during the step.
    let reach = (body.velocity.norm() + body.angular_velocity.norm() * radius) * dt;

    let mut contacts = Vec::new();
    for plane in planes {
        if plane.distance(&body.position.coords) - radius >= config.contact_slop + reach {
            continue;
        }
        for v in &die.hull.vertices {
            let r = rotation * v.coords;
            let d = plane.distance(&(body.position.coords + r));
            let vn = body.point_velocity(&r).dot(&plane.normal);
            if d >= config.contact_slop + (-vn * dt).max(0.0) {
                continue;
            }

            let target = if d > 0.0 {
                -d / dt
            } else {
                let bounce = if vn < -config.restitution_threshold {
                    -plane.material.restitution * vn
                } else {
                    0.0
                };
                bounce.max(config.baumgarte * (-d - config.contact_slop).max(0.0) / dt)
            };

            let tangents = tangent_basis(&plane.normal);
            contacts.push(Contact {
                r,
                normal: plane.normal,
                tangents,
                material: plane.material,
                target,
                normal_mass: mass_along(&r, &plane.normal),
                tangent_mass: [mass_along(&r, &tangents[0]), mass_along(&r, &tangents[1])],
                normal_impulse: 0.0,
                tangent_impulse: [0.0; 2],
            });
        }
    }
    contacts
}

/// Sequential-impulse pass over one contact: clamped accumulated normal
/// impulse, then Coulomb friction along both tangents.
fn solve_contact(body: &mut RigidBody, c: &mut Contact) {

    let vn = body.point_velocity(&c.r).dot(&c.normal);
    let accumulated = (c.normal_impulse + (c.target - vn) / c.normal_mass).max(0.0);
    let jn = accumulated - c.normal_impulse;
    c.normal_impulse = accumulated;
    body.apply_impulse_at_point(c.normal * jn, c.r);

    if c.material.static_friction <= 0.0 {
        return;
    }
    let max_static = c.material.static_friction * c.normal_impulse;
    let dynamic = c.material.dynamic_friction * c.normal_impulse;
    for k in 0..2 {
        let t = c.tangents[k];
        let vt = body.point_velocity(&c.r).dot(&t);
        let mut accumulated = c.tangent_impulse[k] - vt / c.tangent_mass[k];
        if accumulated.abs() > max_static {
            accumulated = dynamic.copysign(accumulated);
        }
        let jt = accumulated - c.tangent_impulse[k];
        c.tangent_impulse[k] = accumulated;
        body.apply_impulse_at_point(t * jt, c.r);
    }
}
