//! Bevel (chamfer) operator.
//!
//! Shrinks every face toward its centroid, then fills the opened gaps with a
//! quad per edge and a polygon per vertex. Output faces keep the input
//! winding; edge and corner fillers carry face-group id 0.

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use crate::error::GeometryError;
use crate::polyhedron::Polyhedron;
use crate::Real;

/// Directed-edge adjacency of a closed polytope, built once per template.
struct EdgeIndex {
    /// `(from, to)` -> face whose winding contains that directed edge.
    face_of: HashMap<(usize, usize), usize>,
}

impl EdgeIndex {
    fn build(poly: &Polyhedron) -> Result<Self, GeometryError> {
        let mut face_of = HashMap::new();
        for (face, f) in poly.faces.iter().enumerate() {
            for k in 0..f.len() {
                let edge = (f[k], f[(k + 1) % f.len()]);
                if face_of.insert(edge, face).is_some() {
                    return Err(GeometryError::NonManifoldEdge {
                        from: edge.0,
                        to: edge.1,
                    });
                }
            }
        }
        Ok(Self { face_of })
    }

    fn twin(&self, from: usize, to: usize) -> Result<usize, GeometryError> {
        self.face_of
            .get(&(to, from))
            .copied()
            .ok_or(GeometryError::OpenEdge { from, to })
    }
}

/// Bevel `poly` keeping fraction `factor` of every face.
///
/// The result is a new polyhedron whose first `poly.faces.len()` faces are
/// the shrunk originals (same groups), followed by one quad per edge and one
/// polygon per vertex (group 0).
pub fn chamfer(poly: &Polyhedron, factor: Real) -> Result<Polyhedron, GeometryError> {
    if !(factor > 0.0 && factor < 1.0) {
        return Err(GeometryError::ChamferFactor(factor));
    }
    poly.validate()?;
    let edges = EdgeIndex::build(poly)?;

    let corner_total: usize = poly.faces.iter().map(Vec::len).sum();
    let mut vertices: Vec<Point3<Real>> = Vec::with_capacity(corner_total);
    let mut faces: Vec<Vec<usize>> = Vec::with_capacity(poly.faces.len() * 3);
    let mut groups: Vec<u32> = Vec::with_capacity(poly.faces.len() * 3);

    // (face, original vertex) -> shrunk corner handle
    let mut corner_of: HashMap<(usize, usize), usize> = HashMap::with_capacity(corner_total);
    // original vertex -> its corners, in face order
    let mut corners_around: Vec<Vec<usize>> = poly
        .vertex_valence()
        .into_iter()
        .map(Vec::with_capacity)
        .collect();

    for (face, f) in poly.faces.iter().enumerate() {
        let center = poly.face_centroid(face);
        let mut shrunk = Vec::with_capacity(f.len());
        for &v in f {
            let handle = vertices.len();
            vertices.push(center + (poly.vertices[v] - center) * factor);
            corner_of.insert((face, v), handle);
            corners_around[v].push(handle);
            shrunk.push(handle);
        }
        faces.push(shrunk);
        groups.push(poly.groups[face]);
    }

    // One bevel quad per undirected edge, emitted from the lower face index.
    // Around each vertex the quad also links two corners: `next[c]` is the
    // corner that follows `c` when walking that vertex's gap.
    let mut next: HashMap<usize, usize> = HashMap::with_capacity(corner_total);
    for (face, f) in poly.faces.iter().enumerate() {
        for k in 0..f.len() {
            let (a, b) = (f[k], f[(k + 1) % f.len()]);
            let other = edges.twin(a, b)?;
            if other < face {
                continue;
            }
            let quad = [
                corner_of[&(face, a)],
                corner_of[&(other, a)],
                corner_of[&(other, b)],
                corner_of[&(face, b)],
            ];
            next.insert(quad[1], quad[0]);
            next.insert(quad[3], quad[2]);
            faces.push(quad.to_vec());
            groups.push(0);
        }
    }

    for (vertex, around) in corners_around.iter().enumerate() {
        let valence = around.len();
        if valence < 3 {
            // A closed convex polytope has at least three faces per vertex.
            return Err(GeometryError::CornerWalk {
                vertex,
                placed: valence,
                valence,
            });
        }
        let mut corner = Vec::with_capacity(valence);
        corner.push(around[0]);
        while corner.len() < valence {
            let last = corner[corner.len() - 1];
            match next.get(&last) {
                Some(&n) if around.contains(&n) && !corner.contains(&n) => corner.push(n),
                _ => {
                    return Err(GeometryError::CornerWalk {
                        vertex,
                        placed: corner.len(),
                        valence,
                    })
                }
            }
        }
        faces.push(corner);
        groups.push(0);
    }

    Ok(Polyhedron {
        vertices,
        faces,
        groups,
    })
}

/// One triangle of a fan-triangulated face: corners `0`, `fan` and
/// `fan + 1` of face `face`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FanTriangle {
    pub face: usize,
    pub fan: usize,
    pub corners: [usize; 3],
    pub group: u32,
}

/// Fan-triangulate every face from its first corner. Each triangle inherits
/// its face's group id.
pub fn triangulate(poly: &Polyhedron) -> Vec<FanTriangle> {
    let mut out = Vec::with_capacity(poly.faces.iter().map(|f| f.len() - 2).sum());
    for (face, (f, &group)) in poly.faces.iter().zip(&poly.groups).enumerate() {
        for fan in 1..f.len() - 1 {
            out.push(FanTriangle {
                face,
                fan,
                corners: [f[0], f[fan], f[fan + 1]],
                group,
            });
        }
    }
    out
}

/// Flat normal of a triangle, zero if degenerate.
pub(crate) fn triangle_normal(vertices: &[Point3<Real>], tri: [usize; 3]) -> Vector3<Real> {
    let a = vertices[tri[0]];
    let n = (vertices[tri[1]] - a).cross(&(vertices[tri[2]] - a));
    n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::die::DieType;
    use std::collections::HashSet;

    const CHAMFERED: [DieType; 5] = [
        DieType::D4,
        DieType::D6,
        DieType::D8,
        DieType::D12,
        DieType::D20,
    ];

    fn edge_count(poly: &Polyhedron) -> usize {
        poly.faces.iter().map(Vec::len).sum::<usize>() / 2
    }

    #[test]
    fn test_face_counts() {
        for die in CHAMFERED {
            let poly = Polyhedron::for_die(die);
            let bevelled = chamfer(&poly, 0.95).unwrap();
            let expected = poly.faces.len() + edge_count(&poly) + poly.vertices.len();
            assert_eq!(bevelled.faces.len(), expected, "{die}");
        }
        // cube: 6 faces + 12 edges + 8 corners
        let cube = chamfer(&Polyhedron::for_die(DieType::D6), 0.9).unwrap();
        assert_eq!(cube.faces.len(), 26);
    }

    #[test]
    fn test_result_is_closed_and_outward() {
        for die in CHAMFERED {
            let bevelled = chamfer(&Polyhedron::for_die(die), 0.95).unwrap();
            let mut edges = HashSet::new();
            for f in &bevelled.faces {
                for k in 0..f.len() {
                    assert!(edges.insert((f[k], f[(k + 1) % f.len()])));
                }
            }
            for &(a, b) in &edges {
                assert!(edges.contains(&(b, a)), "{die}: open edge {a}->{b}");
            }
            for face in 0..bevelled.faces.len() {
                let n = bevelled.face_normal(face).unwrap();
                let c = bevelled.face_centroid(face);
                assert!(n.dot(&c.coords) > 0.0, "{die}: face {face} points inward");
            }
        }
    }

    #[test]
    fn test_filler_faces_are_unlabeled() {
        let poly = Polyhedron::for_die(DieType::D20);
        let bevelled = chamfer(&poly, 0.95).unwrap();
        assert_eq!(&bevelled.groups[..poly.faces.len()], &poly.groups[..]);
        assert!(bevelled.groups[poly.faces.len()..].iter().all(|&g| g == 0));
    }

    #[test]
    fn test_corner_faces_match_valence() {
        let poly = Polyhedron::for_die(DieType::D20);
        let bevelled = chamfer(&poly, 0.95).unwrap();
        let corners = &bevelled.faces[bevelled.faces.len() - poly.vertices.len()..];
        assert!(corners.iter().all(|f| f.len() == 5));
    }

    #[test]
    fn test_shrinks_toward_centroid() {
        let poly = Polyhedron::for_die(DieType::D6);
        let bevelled = chamfer(&poly, 0.5).unwrap();
        let before = poly.face_centroid(0);
        let after = bevelled.face_centroid(0);
        assert!((before - after).norm() < 1e-5);
        let v0 = poly.vertices[poly.faces[0][0]];
        let c0 = bevelled.vertices[bevelled.faces[0][0]];
        assert!(((c0 - before).norm() - 0.5 * (v0 - before).norm()).abs() < 1e-5);
    }

    #[test]
    fn test_rejects_bad_factor() {
        let poly = Polyhedron::for_die(DieType::D6);
        assert_eq!(chamfer(&poly, 1.0), Err(GeometryError::ChamferFactor(1.0)));
        assert_eq!(chamfer(&poly, 0.0), Err(GeometryError::ChamferFactor(0.0)));
    }

    #[test]
    fn test_open_polytope_is_fatal() {
        let mut poly = Polyhedron::for_die(DieType::D6);
        poly.faces.pop();
        poly.groups.pop();
        assert!(matches!(
            chamfer(&poly, 0.95),
            Err(GeometryError::OpenEdge { .. })
        ));
    }

    #[test]
    fn test_triangulate_keeps_groups() {
        let poly = Polyhedron::for_die(DieType::D10);
        let tris = triangulate(&poly);
        assert_eq!(tris.len(), 20);
        assert_eq!(tris[1].corners, [poly.faces[0][0], poly.faces[0][2], poly.faces[0][3]]);
        for group in 1..=10 {
            assert_eq!(tris.iter().filter(|t| t.group == group).count(), 2);
        }
    }
}
