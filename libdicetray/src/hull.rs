//! Collision hulls.
//!
//! The hull is the unchamfered polytope scaled to the die radius. Visuals and
//! collision intentionally diverge: the hull only has to be convex and cheap.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::die::DieType;
use crate::error::GeometryError;
use crate::polyhedron::Polyhedron;
use crate::Real;

/// Convex collision shape plus its mass properties, shared read-only by
/// every die of one type.
#[derive(Clone, Debug)]
pub struct CollisionHull {
    pub die_type: DieType,
    /// Body-space vertices relative to the center of mass.
    pub vertices: Vec<Point3<Real>>,
    pub faces: Vec<Vec<usize>>,
    /// Outward unit normal per face (body space).
    pub face_normals: Vec<Vector3<Real>>,
    pub mass: Real,
    pub volume: Real,
    /// Inertia tensor about the center of mass (body space).
    pub inertia: Matrix3<Real>,
    pub inv_inertia: Matrix3<Real>,
}

impl CollisionHull {
    /// Build the hull of a die type's canonical polytope.
    pub fn for_die(die: DieType, radius: Real) -> Result<Self, GeometryError> {
        Self::from_polyhedron(die, &Polyhedron::for_die(die), radius, die.mass())
    }

    /// Scale `poly` by `radius` and compute mass properties for `mass`.
    pub fn from_polyhedron(
        die: DieType,
        poly: &Polyhedron,
        radius: Real,
        mass: Real,
    ) -> Result<Self, GeometryError> {
        poly.validate()?;

        let mut face_normals = Vec::with_capacity(poly.faces.len());
        for face in 0..poly.faces.len() {
            face_normals.push(poly.face_normal(face)?);
        }

        let scaled = poly.scaled(radius);
        let (volume, centroid, inertia_origin) = compute_mass_props(&scaled, &poly.faces)?;

        // Desired mass => scale by density.
        let density = mass / volume;
        let inertia = inertia_origin * density;

        // Parallel-axis theorem: move the origin inertia to the center of mass.
        let c = centroid.coords;
        let inertia_cm = inertia - (Matrix3::identity() * c.dot(&c) - c * c.transpose()) * mass;

        let inv_inertia = inertia_cm
            .try_inverse()
            .ok_or(GeometryError::ZeroVolume)?;

        let vertices = scaled.iter().map(|p| Point3::from(p - centroid)).collect();

        Ok(Self {
            die_type: die,
            vertices,
            faces: poly.faces.clone(),
            face_normals,
            mass,
            volume,
            inertia: inertia_cm,
            inv_inertia,
        })
    }

    /// Largest distance from the center of mass to a hull vertex.
    pub fn bounding_radius(&self) -> Real {
        self.vertices
            .iter()
            .map(|v| v.coords.norm())
            .fold(0.0, Real::max)
    }
}

/// Volume, centroid and inertia tensor about the origin of a closed polytope
/// with unit density.
///
/// Every face is fan-triangulated and each triangle forms a tetrahedron with
/// the origin. The tetrahedron covariance `C = V/20 (sum p p^T + s s^T)`
/// (with `s` the vertex sum) is exact, and `I = tr(C) I3 - C`.
fn compute_mass_props(
    vertices: &[Point3<Real>],
    faces: &[Vec<usize>],
) -> Result<(Real, Point3<Real>, Matrix3<Real>), GeometryError> {
    let mut volume = 0.0;
    let mut first_moment = Vector3::zeros();
    let mut covariance = Matrix3::zeros();

    for face in faces {
        let a = vertices[face[0]].coords;
        for k in 1..face.len() - 1 {
            let b = vertices[face[k]].coords;
            let c = vertices[face[k + 1]].coords;
            let vol = a.dot(&b.cross(&c)) / 6.0;
            let s = a + b + c;

            volume += vol;
            first_moment += s * (vol / 4.0);
            covariance += (a * a.transpose() + b * b.transpose() + c * c.transpose() + s * s.transpose())
                * (vol / 20.0);
        }
    }

    if volume.abs() < 1e-12 {
        return Err(GeometryError::ZeroVolume);
    }
    let centroid = Point3::from(first_moment / volume);
    let inertia = Matrix3::identity() * covariance.trace() - covariance;
    Ok((volume, centroid, inertia))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Real, b: Real, eps: Real) -> bool {
        (a - b).abs() <= eps * b.abs().max(1.0)
    }

    #[test]
    fn test_cube_mass_props_are_exact() {
        // Unit-sphere cube has half side 1/sqrt(3).
        let hull = CollisionHull::from_polyhedron(
            DieType::D6,
            &Polyhedron::for_die(DieType::D6),
            3f32.sqrt(),
            2.0,
        )
        .unwrap();
        // side 2 -> volume 8, I = m * (s^2 + s^2) / 12 = 2 * 8 / 12
        assert!(approx(hull.volume, 8.0, 1e-4));
        for i in 0..3 {
            assert!(approx(hull.inertia[(i, i)], 4.0 / 3.0, 1e-4));
            for j in 0..3 {
                if i != j {
                    assert!(hull.inertia[(i, j)].abs() < 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_every_die_has_positive_inertia() {
        for die in DieType::ALL {
            let hull = CollisionHull::for_die(die, 1.0).unwrap();
            assert!(hull.volume > 0.0, "{die}");
            assert_eq!(hull.mass, die.mass());
            for i in 0..3 {
                assert!(hull.inertia[(i, i)] > 0.0, "{die}");
            }
        }
    }

    #[test]
    fn test_hull_is_unchamfered_and_scaled() {
        let hull = CollisionHull::for_die(DieType::D20, 2.0).unwrap();
        assert_eq!(hull.vertices.len(), 12);
        assert_eq!(hull.faces.len(), 20);
        assert!(approx(hull.bounding_radius(), 2.0, 1e-4));
    }

    #[test]
    fn test_face_normals_are_unit() {
        let hull = CollisionHull::for_die(DieType::D10, 1.0).unwrap();
        for n in &hull.face_normals {
            assert!(approx(n.norm(), 1.0, 1e-5));
        }
    }

    #[test]
    fn test_degenerate_polytope_fails() {
        let mut poly = Polyhedron::for_die(DieType::D6);
        for v in &mut poly.vertices {
            v.z = 0.0;
        }
        assert!(CollisionHull::from_polyhedron(DieType::D6, &poly, 1.0, 1.0).is_err());
    }
}
