//! Canonical die polytopes.
//!
//! Every table is normalized so its vertices sit on the unit sphere, and
//! every face is wound counter-clockwise when viewed from outside. The same
//! polytope feeds both the collision hull and the chamfer operator.

use nalgebra::{Point3, Vector3};

use crate::die::{DieType, Shape, D10_KITE_LABELS};
use crate::error::GeometryError;
use crate::Real;

/// Polyhedron: vertices, faces (lists of vertex indices) and one face-group
/// id per face. Group 0 marks an unlabeled face.
#[derive(Clone, Debug, PartialEq)]
pub struct Polyhedron {
    pub vertices: Vec<Point3<Real>>,
    pub faces: Vec<Vec<usize>>,
    pub groups: Vec<u32>,
}

impl Polyhedron {
    /// Canonical, normalized polytope for a die type.
    pub fn for_die(die: DieType) -> Self {
        let poly = match die.shape() {
            Shape::Tetrahedron => create_tetrahedron(),
            Shape::Cube => create_cube(),
            Shape::Octahedron => create_octahedron(),
            Shape::Dodecahedron => create_dodecahedron(),
            Shape::Icosahedron => create_icosahedron(),
            Shape::Trapezohedron => create_trapezohedron(|kite| {
                let label = D10_KITE_LABELS[kite];
                match die {
                    // Labels 1..=9 keep their number as group id; the "0"
                    // kite stays blank.
                    DieType::D9 => label,
                    _ => label + 1,
                }
            }),
        };
        poly.normalized().oriented_outward()
    }

    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.faces.is_empty() {
            return Err(GeometryError::NoFaces);
        }
        if self.vertices.is_empty() {
            return Err(GeometryError::NoVertices);
        }
        if self.groups.len() != self.faces.len() {
            return Err(GeometryError::GroupCountMismatch {
                faces: self.faces.len(),
                groups: self.groups.len(),
            });
        }
        for (face, f) in self.faces.iter().enumerate() {
            if f.len() < 3 {
                return Err(GeometryError::DegenerateFace { face });
            }
            if let Some(&vertex) = f.iter().find(|&&i| i >= self.vertices.len()) {
                return Err(GeometryError::IndexOutOfBounds { face, vertex });
            }
        }
        Ok(())
    }

    /// Push every vertex onto the unit sphere (divide by its own length).
    pub fn normalized(mut self) -> Self {
        for v in &mut self.vertices {
            let len = v.coords.norm();
            if len > 0.0 {
                v.coords /= len;
            }
        }
        self
    }

    /// Reverse any face whose winding points its normal back toward the
    /// origin. Valid for convex polytopes that contain the origin.
    pub fn oriented_outward(mut self) -> Self {
        for i in 0..self.faces.len() {
            let n = self.newell_normal(i);
            let c = self.face_centroid(i);
            if n.dot(&c.coords) < 0.0 {
                self.faces[i].reverse();
            }
        }
        self
    }

    pub fn face_centroid(&self, face: usize) -> Point3<Real> {
        let f = &self.faces[face];
        let sum = f
            .iter()
            .fold(Vector3::zeros(), |acc, &i| acc + self.vertices[i].coords);
        Point3::from(sum / f.len() as Real)
    }

    /// Unit outward normal of a face (Newell's method, robust for slightly
    /// non-planar faces such as normalized kites).
    pub fn face_normal(&self, face: usize) -> Result<Vector3<Real>, GeometryError> {
        let n = self.newell_normal(face);
        if n.norm_squared() < 1e-12 {
            return Err(GeometryError::ZeroNormal { face });
        }
        Ok(n.normalize())
    }

    /// Number of faces touching each vertex.
    pub fn vertex_valence(&self) -> Vec<usize> {
        let mut valence = vec![0; self.vertices.len()];
        for f in &self.faces {
            for &i in f {
                valence[i] += 1;
            }
        }
        valence
    }

    pub fn scaled(&self, radius: Real) -> Vec<Point3<Real>> {
        self.vertices.iter().map(|v| v * radius).collect()
    }

    fn newell_normal(&self, face: usize) -> Vector3<Real> {
        let f = &self.faces[face];
        let mut n = Vector3::zeros();
        for (k, &i) in f.iter().enumerate() {
            let a = self.vertices[i];
            let b = self.vertices[f[(k + 1) % f.len()]];
            n.x += (a.y - b.y) * (a.z + b.z);
            n.y += (a.z - b.z) * (a.x + b.x);
            n.z += (a.x - b.x) * (a.y + b.y);
        }
        n
    }
}

fn sequential_groups(faces: &[Vec<usize>]) -> Vec<u32> {
    (1..=faces.len() as u32).collect()
}

fn points(raw: &[[Real; 3]]) -> Vec<Point3<Real>> {
    raw.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect()
}

fn create_tetrahedron() -> Polyhedron {
    let vertices = points(&[
        [1.0, 1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [1.0, -1.0, -1.0],
    ]);
    // Face g is opposite the vertex numbered g in label set 0.
    let faces = vec![vec![1, 0, 2], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]];
    let groups = sequential_groups(&faces);
    Polyhedron {
        vertices,
        faces,
        groups,
    }
}

fn create_cube() -> Polyhedron {
    let vertices = points(&[
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ]);
    // Opposite faces sum to 7.
    let faces = vec![
        vec![0, 3, 2, 1], // -Z
        vec![1, 2, 6, 5], // +X
        vec![0, 1, 5, 4], // -Y
        vec![3, 7, 6, 2], // +Y
        vec![0, 4, 7, 3], // -X
        vec![4, 5, 6, 7], // +Z
    ];
    let groups = sequential_groups(&faces);
    Polyhedron {
        vertices,
        faces,
        groups,
    }
}

fn create_octahedron() -> Polyhedron {
    let vertices = points(&[
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
    ]);
    let faces = vec![
        vec![0, 2, 4],
        vec![0, 4, 3],
        vec![0, 3, 5],
        vec![0, 5, 2],
        vec![1, 3, 4],
        vec![1, 4, 2],
        vec![1, 2, 5],
        vec![1, 5, 3],
    ];
    let groups = sequential_groups(&faces);
    Polyhedron {
        vertices,
        faces,
        groups,
    }
}

fn create_dodecahedron() -> Polyhedron {
    // Golden ratio
    let p = (1.0 + 5f32.sqrt()) / 2.0;
    let q = 1.0 / p;
    let vertices = points(&[
        [0.0, q, p],
        [0.0, q, -p],
        [0.0, -q, p],
        [0.0, -q, -p],
        [p, 0.0, q],
        [p, 0.0, -q],
        [-p, 0.0, q],
        [-p, 0.0, -q],
        [q, p, 0.0],
        [q, -p, 0.0],
        [-q, p, 0.0],
        [-q, -p, 0.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, -1.0],
        [1.0, -1.0, 1.0],
        [1.0, -1.0, -1.0],
        [-1.0, 1.0, 1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, -1.0, -1.0],
    ]);
    let faces = vec![
        vec![2, 14, 4, 12, 0],
        vec![15, 9, 11, 19, 3],
        vec![16, 10, 17, 7, 6],
        vec![6, 7, 19, 11, 18],
        vec![6, 18, 2, 0, 16],
        vec![18, 11, 9, 14, 2],
        vec![1, 17, 10, 8, 13],
        vec![1, 13, 5, 15, 3],
        vec![13, 8, 12, 4, 5],
        vec![5, 4, 14, 9, 15],
        vec![0, 12, 8, 10, 16],
        vec![3, 19, 7, 17, 1],
    ];
    let groups = sequential_groups(&faces);
    Polyhedron {
        vertices,
        faces,
        groups,
    }
}

fn create_icosahedron() -> Polyhedron {
    // Golden ratio
    let t = (1.0 + 5f32.sqrt()) / 2.0;
    let vertices = points(&[
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ]);
    let faces = vec![
        vec![0, 11, 5],
        vec![0, 5, 1],
        vec![0, 1, 7],
        vec![0, 7, 10],
        vec![0, 10, 11],
        vec![1, 5, 9],
        vec![5, 11, 4],
        vec![11, 10, 2],
        vec![10, 7, 6],
        vec![7, 1, 8],
        vec![3, 9, 4],
        vec![3, 4, 2],
        vec![3, 2, 6],
        vec![3, 6, 8],
        vec![3, 8, 9],
        vec![4, 9, 5],
        vec![2, 4, 11],
        vec![6, 2, 10],
        vec![8, 6, 7],
        vec![9, 8, 1],
    ];
    let groups = sequential_groups(&faces);
    Polyhedron {
        vertices,
        faces,
        groups,
    }
}

/// Pentagonal trapezohedron: two 5-vertex rings offset by 36 degrees plus two
/// poles. Each of the 10 faces is a kite `[pole, ring, opposite ring, ring]`.
///
/// Ring vertex `i` sits at angle `36 * i` degrees; odd vertices form the upper
/// ring. Kite `k` straddles ring vertex `k`: even kites hang from the upper
/// pole, odd kites from the lower one. `group_of` maps a kite to its
/// face-group id.
fn create_trapezohedron(group_of: impl Fn(usize) -> u32) -> Polyhedron {
    use std::f32::consts::PI;

    // Ring height that makes each kite planar before normalization.
    let c = (PI / 5.0).cos();
    let h = (1.0 - c) / (1.0 + c);

    let mut vertices = Vec::with_capacity(12);
    for i in 0..10 {
        let angle = PI / 5.0 * i as Real;
        let y = if i % 2 == 1 { h } else { -h };
        vertices.push(Point3::new(angle.cos(), y, angle.sin()));
    }
    let top = vertices.len();
    vertices.push(Point3::new(0.0, 1.0, 0.0));
    let bottom = vertices.len();
    vertices.push(Point3::new(0.0, -1.0, 0.0));

    let mut faces = Vec::with_capacity(10);
    let mut groups = Vec::with_capacity(10);
    for k in 0..10 {
        let prev = (k + 9) % 10;
        let next = (k + 1) % 10;
        if k % 2 == 0 {
            faces.push(vec![top, next, k, prev]);
        } else {
            faces.push(vec![bottom, prev, k, next]);
        }
        groups.push(group_of(k));
    }

    Polyhedron {
        vertices,
        faces,
        groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_canonical_tables_validate() {
        for die in DieType::ALL {
            let poly = Polyhedron::for_die(die);
            assert!(poly.validate().is_ok(), "{die} failed validation");
        }
    }

    #[test]
    fn test_vertices_on_unit_sphere() {
        for die in DieType::ALL {
            for v in &Polyhedron::for_die(die).vertices {
                assert!((v.coords.norm() - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_faces_point_outward() {
        for die in DieType::ALL {
            let poly = Polyhedron::for_die(die);
            for face in 0..poly.faces.len() {
                let n = poly.face_normal(face).unwrap();
                assert!(n.dot(&poly.face_centroid(face).coords) > 0.0);
            }
        }
    }

    #[test]
    fn test_every_edge_has_a_twin() {
        for die in DieType::ALL {
            let poly = Polyhedron::for_die(die);
            let mut edges = HashSet::new();
            for f in &poly.faces {
                for k in 0..f.len() {
                    assert!(edges.insert((f[k], f[(k + 1) % f.len()])));
                }
            }
            for &(a, b) in &edges {
                assert!(edges.contains(&(b, a)), "{die}: edge {a}->{b} is open");
            }
        }
    }

    #[test]
    fn test_face_groups_cover_labels() {
        for die in DieType::ALL {
            let poly = Polyhedron::for_die(die);
            let labeled: HashSet<u32> = poly.groups.iter().copied().filter(|&g| g != 0).collect();
            let expected: HashSet<u32> = (1..=die.face_count()).collect();
            assert_eq!(labeled, expected, "{die}");
        }
    }

    #[test]
    fn test_d9_has_one_blank_kite() {
        let poly = Polyhedron::for_die(DieType::D9);
        assert_eq!(poly.groups.iter().filter(|&&g| g == 0).count(), 1);
    }

    #[test]
    fn test_trapezohedron_kites_have_four_corners() {
        let poly = Polyhedron::for_die(DieType::D10);
        assert_eq!(poly.vertices.len(), 12);
        assert_eq!(poly.faces.len(), 10);
        assert!(poly.faces.iter().all(|f| f.len() == 4));
        assert_eq!(poly.vertex_valence()[10], 5);
        assert_eq!(poly.vertex_valence()[11], 5);
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        let mut poly = Polyhedron::for_die(DieType::D6);
        poly.faces[0] = vec![0, 1];
        assert_eq!(poly.validate(), Err(GeometryError::DegenerateFace { face: 0 }));

        let mut poly = Polyhedron::for_die(DieType::D6);
        poly.faces[2][1] = 99;
        assert_eq!(
            poly.validate(),
            Err(GeometryError::IndexOutOfBounds { face: 2, vertex: 99 })
        );

        let mut poly = Polyhedron::for_die(DieType::D6);
        poly.groups.pop();
        assert!(matches!(
            poly.validate(),
            Err(GeometryError::GroupCountMismatch { .. })
        ));
    }
}
