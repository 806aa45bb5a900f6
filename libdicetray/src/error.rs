//! Error types.
//!
//! Only template construction and configuration loading can fail. Bad user
//! input (notation, out-of-range forced values, overlapping rolls) is
//! recovered locally and never surfaces here.

use std::path::PathBuf;

use thiserror::Error;

use crate::die::DieType;

/// Failures while building a die's mesh or collision template.
///
/// The per-type tables are fixed data, so any of these indicates a bug in
/// those tables rather than bad input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polyhedron has no faces")]
    NoFaces,
    #[error("polyhedron has no vertices")]
    NoVertices,
    #[error("face {face} has fewer than 3 vertices")]
    DegenerateFace { face: usize },
    #[error("face {face} references vertex {vertex} which does not exist")]
    IndexOutOfBounds { face: usize, vertex: usize },
    #[error("face {face} has a zero-length normal")]
    ZeroNormal { face: usize },
    #[error("face-group table has {groups} entries for {faces} faces")]
    GroupCountMismatch { faces: usize, groups: usize },
    #[error("edge {from}->{to} has no twin; the polytope is not closed")]
    OpenEdge { from: usize, to: usize },
    #[error("edge {from}->{to} is shared by more than two faces")]
    NonManifoldEdge { from: usize, to: usize },
    #[error("corner walk around vertex {vertex} found no continuation after {placed} of {valence} corners")]
    CornerWalk {
        vertex: usize,
        placed: usize,
        valence: usize,
    },
    #[error("chamfer factor {0} must lie strictly between 0 and 1")]
    ChamferFactor(f32),
    #[error("polyhedron encloses zero volume")]
    ZeroVolume,
    #[error("{0} mesh has no labeled faces")]
    Unlabeled(DieType),
    #[error("{die}: {source}")]
    Template {
        die: DieType,
        #[source]
        source: Box<GeometryError>,
    },
}

/// Crate-level error.
#[derive(Error, Debug)]
pub enum DiceError {
    #[error("template construction failed: {0}")]
    Geometry(#[from] GeometryError),
    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
