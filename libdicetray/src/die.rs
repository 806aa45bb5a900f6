//! Die types and their fixed per-type constants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Real;

/// One of the supported polyhedral dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieType {
    D4,
    D6,
    D8,
    D9,
    D10,
    D12,
    D20,
    D100,
}

/// Solid a die type is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Tetrahedron,
    Cube,
    Octahedron,
    Trapezohedron,
    Dodecahedron,
    Icosahedron,
}

const LABELS_1_TO_20: [i32; 20] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20,
];
const LABELS_0_TO_9: [i32; 10] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9];

/// Printed d10 label of kite `k` (kites ordered by angle, even kites on the
/// upper pole). Opposite kites sum to 9.
pub(crate) const D10_KITE_LABELS: [u32; 10] = [0, 3, 2, 1, 4, 9, 6, 7, 8, 5];

/// Corner numbers printed on each d4 face, per label set.
///
/// `D4_LABEL_SETS[set][group - 1]` lists the numbers at the face's corners in
/// winding order. Set `k` is set 0 with every number advanced by `k` (mod 4).
/// The face a d4 rests on is missing exactly the number at the apex.
pub const D4_LABEL_SETS: [[[u8; 3]; 4]; 4] = [
    [[3, 4, 2], [4, 3, 1], [4, 1, 2], [3, 2, 1]],
    [[4, 1, 3], [1, 4, 2], [1, 2, 3], [4, 3, 2]],
    [[1, 2, 4], [2, 1, 3], [2, 3, 4], [1, 4, 3]],
    [[2, 3, 1], [3, 2, 4], [3, 4, 1], [2, 1, 4]],
];

impl DieType {
    pub const ALL: [DieType; 8] = [
        DieType::D4,
        DieType::D6,
        DieType::D8,
        DieType::D9,
        DieType::D10,
        DieType::D12,
        DieType::D20,
        DieType::D100,
    ];

    /// Number written after the `d` in notation.
    pub fn sides(self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D9 => 9,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
            DieType::D100 => 100,
        }
    }

    pub fn from_sides(sides: u32) -> Option<Self> {
        DieType::ALL.into_iter().find(|d| d.sides() == sides)
    }

    pub fn shape(self) -> Shape {
        match self {
            DieType::D4 => Shape::Tetrahedron,
            DieType::D6 => Shape::Cube,
            DieType::D8 => Shape::Octahedron,
            DieType::D9 | DieType::D10 | DieType::D100 => Shape::Trapezohedron,
            DieType::D12 => Shape::Dodecahedron,
            DieType::D20 => Shape::Icosahedron,
        }
    }

    /// Kite-faced dice are read by face centroid height, not face normal.
    pub fn is_kite(self) -> bool {
        self.shape() == Shape::Trapezohedron
    }

    /// Printed number of each labeled face, indexed by `face-group id - 1`.
    pub fn labels(self) -> &'static [i32] {
        match self {
            DieType::D4 => &LABELS_1_TO_20[..4],
            DieType::D6 => &LABELS_1_TO_20[..6],
            DieType::D8 => &LABELS_1_TO_20[..8],
            DieType::D9 => &LABELS_1_TO_20[..9],
            DieType::D10 | DieType::D100 => &LABELS_0_TO_9,
            DieType::D12 => &LABELS_1_TO_20[..12],
            DieType::D20 => &LABELS_1_TO_20,
        }
    }

    /// Number of labeled faces; face-group ids run `1..=face_count()`.
    pub fn face_count(self) -> u32 {
        self.labels().len() as u32
    }

    /// Result reported for a label index. A d10 "0" reads as 10 and the d100
    /// prints tens.
    pub fn value_at(self, label_index: usize) -> i32 {
        let raw = self.labels()[label_index];
        match self {
            DieType::D10 if raw == 0 => 10,
            DieType::D100 => raw * 10,
            _ => raw,
        }
    }

    /// Inverse of [`value_at`](Self::value_at); `None` for values this die
    /// can never show.
    pub fn label_index(self, value: i32) -> Option<usize> {
        (0..self.labels().len()).find(|&i| self.value_at(i) == value)
    }

    /// Smallest and largest result this die can report.
    pub fn value_range(self) -> (i32, i32) {
        (0..self.labels().len())
            .map(|i| self.value_at(i))
            .fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }

    pub fn mass(self) -> Real {
        match self {
            DieType::D4 | DieType::D6 => 0.30,
            DieType::D8 => 0.34,
            DieType::D9 | DieType::D10 | DieType::D100 | DieType::D12 => 0.35,
            DieType::D20 => 0.40,
        }
    }

    /// Spin contribution used when launching a die of this type.
    pub fn inertia(self) -> Real {
        match self {
            DieType::D4 => 5.0,
            DieType::D6 => 13.0,
            DieType::D8 => 10.0,
            DieType::D9 | DieType::D10 | DieType::D100 => 9.0,
            DieType::D12 => 8.0,
            DieType::D20 => 6.0,
        }
    }

    /// Default bevel factor (fraction of a face kept after chamfering).
    pub fn chamfer(self) -> Real {
        match self {
            DieType::D4 => 0.96,
            DieType::D6 => 0.96,
            DieType::D8 => 0.965,
            DieType::D9 | DieType::D10 | DieType::D100 => 0.945,
            DieType::D12 => 0.968,
            DieType::D20 => 0.955,
        }
    }

    /// Texture layout of a regular face: `(tab, start_angle)`.
    pub(crate) fn uv_layout(self) -> (Real, Real) {
        use std::f32::consts::PI;
        match self {
            DieType::D4 => (-0.1, PI * 7.0 / 6.0),
            DieType::D6 => (0.1, PI / 4.0),
            DieType::D8 => (0.0, -PI / 8.0),
            DieType::D9 | DieType::D10 | DieType::D100 => (0.0, PI * 6.0 / 5.0),
            DieType::D12 => (0.2, -PI / 8.0),
            DieType::D20 => (-0.2, -PI / 8.0),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            DieType::D4 => "d4",
            DieType::D6 => "d6",
            DieType::D8 => "d8",
            DieType::D9 => "d9",
            DieType::D10 => "d10",
            DieType::D12 => "d12",
            DieType::D20 => "d20",
            DieType::D100 => "d100",
        }
    }
}

impl fmt::Display for DieType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
