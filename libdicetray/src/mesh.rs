//! Render meshes for dice.
//!
//! A [`PolytopeMesh`] is what a renderer draws and what the outcome resolver
//! reads. Each triangle carries the face-group id of the printed face it
//! belongs to; bevel and corner filler triangles carry 0.

use std::collections::BTreeSet;

use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::chamfer::{chamfer, triangle_normal, triangulate};
use crate::config::Theme;
use crate::die::{DieType, D4_LABEL_SETS};
use crate::error::GeometryError;
use crate::polyhedron::Polyhedron;
use crate::Real;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolytopeMesh {
    pub die_type: DieType,
    /// Body-space vertex positions, scaled by the die radius.
    pub positions: Vec<Point3<Real>>,
    pub triangles: Vec<[usize; 3]>,
    /// Face-group id per triangle (parallel to `triangles`).
    pub face_groups: Vec<u32>,
    /// Flat body-space normal per triangle.
    pub normals: Vec<Vector3<Real>>,
    /// Texture coordinates per triangle corner.
    pub uvs: Vec<[Vector2<Real>; 3]>,
    /// Active d4 corner-label permutation (index into `D4_LABEL_SETS`).
    pub label_set: u8,
}

impl PolytopeMesh {
    /// Build the render mesh of a die type.
    ///
    /// Kite-faced dice are never bevelled; everything else is chamfered by
    /// the theme's bevel unless the theme disables bevels.
    pub fn build(die: DieType, theme: &Theme, radius: Real) -> Result<Self, GeometryError> {
        let poly = Polyhedron::for_die(die);
        poly.validate()?;
        let faceted = match theme.chamfer_factor(die) {
            Some(factor) if !die.is_kite() => chamfer(&poly, factor)?,
            _ => poly,
        };

        let mut face_uvs = Vec::with_capacity(faceted.faces.len());
        for (face, f) in faceted.faces.iter().enumerate() {
            let uvs = if faceted.groups[face] == 0 {
                vec![Vector2::zeros(); f.len()]
            } else if die.is_kite() {
                kite_uvs(&faceted, face)?
            } else {
                regular_uvs(die, f.len())
            };
            face_uvs.push(
                uvs.into_iter()
                    .map(|uv| scale_about_center(uv, theme.label_scale))
                    .collect::<Vec<_>>(),
            );
        }

        let positions = faceted.scaled(radius);
        let mut triangles = Vec::new();
        let mut face_groups = Vec::new();
        let mut normals = Vec::new();
        let mut uvs = Vec::new();
        for tri in triangulate(&faceted) {
            triangles.push(tri.corners);
            face_groups.push(tri.group);
            normals.push(triangle_normal(&positions, tri.corners));
            let fuv = &face_uvs[tri.face];
            uvs.push([fuv[0], fuv[tri.fan], fuv[tri.fan + 1]]);
        }

        Ok(Self {
            die_type: die,
            positions,
            triangles,
            face_groups,
            normals,
            uvs,
            label_set: 0,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Labeled face-group ids present on the mesh.
    pub fn groups(&self) -> BTreeSet<u32> {
        self.face_groups.iter().copied().filter(|&g| g != 0).collect()
    }

    /// Shift every printed label by `offset` label positions, wrapping within
    /// the die's label table. Blank faces stay blank.
    ///
    /// A d4 prints three numbers per face, so it rotates `label_set`
    /// instead of touching face groups.
    pub fn relabel(&mut self, offset: i32) {
        if offset == 0 {
            return;
        }
        if self.die_type == DieType::D4 {
            let sets = D4_LABEL_SETS.len() as i32;
            self.label_set = (self.label_set as i32 + offset).rem_euclid(sets) as u8;
            return;
        }
        let n = self.die_type.face_count() as i32;
        for g in self.face_groups.iter_mut().filter(|g| **g != 0) {
            *g = ((*g as i32 - 1 + offset).rem_euclid(n) + 1) as u32;
        }
    }

    /// Number printed on the d4 face `group` at its apex under the active
    /// label set: the one number missing from that face's corners.
    pub fn d4_apex_value(&self, group: u32) -> Option<i32> {
        let corners = D4_LABEL_SETS
            .get(self.label_set as usize)?
            .get((group as usize).checked_sub(1)?)?;
        (1..=4).find(|n| !corners.contains(&(*n as u8)))
    }

    /// Average of the distinct vertices used by a face group.
    pub fn group_centroid(&self, group: u32) -> Option<Point3<Real>> {
        let vertices: BTreeSet<usize> = self
            .triangles
            .iter()
            .zip(&self.face_groups)
            .filter(|(_, &g)| g == group)
            .flat_map(|(tri, _)| tri.iter().copied())
            .collect();
        if vertices.is_empty() {
            return None;
        }
        let sum = vertices
            .iter()
            .fold(Vector3::zeros(), |acc, &i| acc + self.positions[i].coords);
        Some(Point3::from(sum / vertices.len() as Real))
    }
}

/// Angular UV layout of a regular `n`-gon face.
fn regular_uvs(die: DieType, n: usize) -> Vec<Vector2<Real>> {
    let (tab, start) = die.uv_layout();
    let step = std::f32::consts::TAU / n as Real;
    (0..n)
        .map(|j| {
            let a = start + step * j as Real;
            Vector2::new(
                (a.cos() + 1.0 + tab) / 2.0 / (1.0 + tab),
                (a.sin() + 1.0 + tab) / 2.0 / (1.0 + tab),
            )
        })
        .collect()
}

/// UVs of a kite from its real extents, in a face-local basis whose "up"
/// points at the kite's pole so labels are not stretched.
fn kite_uvs(poly: &Polyhedron, face: usize) -> Result<Vec<Vector2<Real>>, GeometryError> {
    let f = &poly.faces[face];
    let normal = poly.face_normal(face)?;
    let center = poly.face_centroid(face);
    let pole = f
        .iter()
        .map(|&i| poly.vertices[i])
        .max_by(|a, b| a.y.abs().total_cmp(&b.y.abs()))
        .unwrap_or(center);

    let toward_pole = pole - center;
    let up = (toward_pole - normal * toward_pole.dot(&normal))
        .try_normalize(1e-9)
        .ok_or(GeometryError::ZeroNormal { face })?;
    let right = up.cross(&normal);

    let local: Vec<Vector2<Real>> = f
        .iter()
        .map(|&i| {
            let d = poly.vertices[i] - center;
            Vector2::new(d.dot(&right), d.dot(&up))
        })
        .collect();
    let extent = local
        .iter()
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(0.0, Real::max)
        .max(1e-6);
    Ok(local
        .into_iter()
        .map(|p| Vector2::new(0.5 + p.x / (2.0 * extent), 0.5 + p.y / (2.0 * extent)))
        .collect())
}

fn scale_about_center(uv: Vector2<Real>, scale: Real) -> Vector2<Real> {
    let half = Vector2::new(0.5, 0.5);
    half + (uv - half) * scale
}
