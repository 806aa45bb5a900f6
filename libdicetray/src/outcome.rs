//! Reading a settled die.
//!
//! Ordinary dice show the face whose normal points most nearly up. Kite
//! faces lean too steeply for that, so kite dice show the face group whose
//! centroid ends up highest. A d4 shows the number at its apex, read off
//! the face it rests on.

use log::debug;
use nalgebra::Vector3;

use crate::body::DieInstance;
use crate::die::DieType;
use crate::error::GeometryError;
use crate::Real;

/// The face a die came to rest on and the value it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    pub group: u32,
    pub value: i32,
}

/// Resolve the value a die currently shows.
pub fn resolve(die: &DieInstance) -> Result<Reading, GeometryError> {
    let reading = match die.die_type {
        DieType::D4 => resolve_d4(die),
        d if d.is_kite() => resolve_by_centroid(die),
        _ => resolve_by_normal(die).map(|group| Reading {
            group,
            value: die.die_type.value_at(group as usize - 1),
        }),
    };
    reading.ok_or(GeometryError::Unlabeled(die.die_type))
}

/// Labeled face group whose world normal has the largest component along
/// `direction`.
fn extreme_group(die: &DieInstance, direction: Vector3<Real>) -> Option<u32> {
    let rotation = die.body.orientation;
    die.mesh
        .normals
        .iter()
        .zip(&die.mesh.face_groups)
        .filter(|(_, &g)| g != 0)
        .map(|(n, &g)| ((rotation * n).dot(&direction), g))
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, g)| g)
}

fn resolve_by_normal(die: &DieInstance) -> Option<u32> {
    extreme_group(die, Vector3::y())
}

fn resolve_d4(die: &DieInstance) -> Option<Reading> {
    let group = extreme_group(die, -Vector3::y())?;
    let value = die.mesh.d4_apex_value(group)?;
    Some(Reading { group, value })
}

/// Highest labeled kite wins. A d9 resting with its blank kite on top
/// reads the highest labeled kite below it, so it always shows 1..=9.
fn resolve_by_centroid(die: &DieInstance) -> Option<Reading> {
    let body = &die.body;
    let height = |g: u32| {
        die.mesh
            .group_centroid(g)
            .map(|c| (body.position + body.orientation * c.coords).y)
    };
    let (top, group) = die
        .mesh
        .groups()
        .into_iter()
        .filter_map(|g| Some((height(g)?, g)))
        .max_by(|a, b| a.0.total_cmp(&b.0))?;
    if height(0).is_some_and(|blank| blank > top) {
        debug!(
            "{} rests blank side up; reading the next kite, group {group}",
            die.die_type
        );
    }
    Some(Reading {
        group,
        value: die.die_type.value_at(group as usize - 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use crate::kinematics::ThrowRequest;
    use crate::template::DieTemplate;
    use nalgebra::{Point3, Rotation3, UnitQuaternion};

    /// Die whose labeled face `group` is rotated to point along `target`.
    fn die_facing(die: DieType, group: u32, target: Vector3<Real>) -> DieInstance {
        let template = DieTemplate::build(die, &Theme::default(), 1.0).unwrap();
        let normal = if die.is_kite() {
            template.mesh.group_centroid(group).unwrap().coords.normalize()
        } else {
            let tri = template
                .mesh
                .face_groups
                .iter()
                .position(|&g| g == group)
                .unwrap();
            template.mesh.normals[tri]
        };
        let rotation = Rotation3::rotation_between(&normal, &target)
            .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI));
        let q = UnitQuaternion::from_rotation_matrix(&rotation);
        let (axis, angle) = q
            .axis_angle()
            .map(|(a, angle)| (a.into_inner(), angle))
            .unwrap_or((Vector3::y(), 0.0));
        let request = ThrowRequest {
            die_type: die,
            position: Point3::new(0.0, 1.0, 0.0),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            axis,
            angle,
        };
        DieInstance::spawn(template.mesh, template.hull, &request)
    }

    #[test]
    fn test_face_up_is_read() {
        for die in [DieType::D6, DieType::D8, DieType::D12, DieType::D20] {
            for group in 1..=die.face_count() {
                let d = die_facing(die, group, Vector3::y());
                let reading = resolve(&d).unwrap();
                assert_eq!(reading.group, group, "{die}");
                assert_eq!(reading.value, group as i32, "{die}");
            }
        }
    }

    #[test]
    fn test_d10_zero_reads_as_ten() {
        // group 1 carries the printed "0"
        let d = die_facing(DieType::D10, 1, Vector3::y());
        assert_eq!(resolve(&d).unwrap().value, 10);
        let d = die_facing(DieType::D10, 8, Vector3::y());
        assert_eq!(resolve(&d).unwrap().value, 7);
    }

    #[test]
    fn test_d100_reads_tens() {
        let d = die_facing(DieType::D100, 4, Vector3::y());
        assert_eq!(resolve(&d).unwrap().value, 30);
        let d = die_facing(DieType::D100, 1, Vector3::y());
        assert_eq!(resolve(&d).unwrap().value, 0);
    }

    #[test]
    fn test_d9_never_reads_blank() {
        for group in 1..=9 {
            let d = die_facing(DieType::D9, group, Vector3::y());
            let reading = resolve(&d).unwrap();
            assert_eq!(reading.value, group as i32);
        }
    }

    #[test]
    fn test_d9_blank_side_up_reads_a_labeled_kite() {
        // Group 0 of a d9 is exactly the blank kite; kites are never bevelled.
        let template = DieTemplate::build(DieType::D9, &Theme::default(), 1.0).unwrap();
        let blank = template.mesh.group_centroid(0).unwrap().coords.normalize();
        let rotation = Rotation3::rotation_between(&blank, &Vector3::y())
            .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI));
        let (axis, angle) = UnitQuaternion::from_rotation_matrix(&rotation)
            .axis_angle()
            .map(|(a, angle)| (a.into_inner(), angle))
            .unwrap_or((Vector3::y(), 0.0));
        let request = ThrowRequest {
            die_type: DieType::D9,
            position: Point3::new(0.0, 1.0, 0.0),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            axis,
            angle,
        };
        let d = DieInstance::spawn(template.mesh, template.hull, &request);
        let reading = resolve(&d).unwrap();
        assert_ne!(reading.group, 0);
        assert!((1..=9).contains(&reading.value), "{reading:?}");
    }

    #[test]
    fn test_d4_reads_apex() {
        for group in 1..=4 {
            let d = die_facing(DieType::D4, group, -Vector3::y());
            let reading = resolve(&d).unwrap();
            assert_eq!(reading.group, group);
            assert_eq!(reading.value, group as i32);
        }
    }
}
