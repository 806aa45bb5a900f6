//! Screen-space anchors for overlay UI.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::config::CameraConfig;
use crate::die::DieType;
use crate::Real;

/// Projected position of one live die, in viewport pixels from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenAnchor {
    pub x: Real,
    pub y: Real,
    pub die_type: DieType,
}

/// Perspective camera hanging above the box center, looking straight down.
/// World `+x` is screen right, world `+z` is screen down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    config: CameraConfig,
    focal: Real,
}

impl Camera {
    pub fn new(config: CameraConfig) -> Self {
        let focal = config.viewport_height / 2.0 / (config.fov_y / 2.0).tan();
        Self { config, focal }
    }

    /// Project a world point; `None` for points at or above the camera.
    pub fn project(&self, p: &Point3<Real>) -> Option<(Real, Real)> {
        let depth = self.config.height - p.y;
        if depth <= 1e-4 {
            return None;
        }
        let scale = self.focal / depth;
        Some((
            self.config.viewport_width / 2.0 + p.x * scale,
            self.config.viewport_height / 2.0 + p.z * scale,
        ))
    }

    pub fn anchor(&self, p: &Point3<Real>, die_type: DieType) -> Option<ScreenAnchor> {
        self.project(p).map(|(x, y)| ScreenAnchor { x, y, die_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_projects_to_viewport_center() {
        let camera = Camera::new(CameraConfig::default());
        let (x, y) = camera.project(&Point3::new(0.0, 1.0, 0.0)).unwrap();
        assert!((x - 640.0).abs() < 1e-3 && (y - 384.0).abs() < 1e-3);
    }

    #[test]
    fn test_axes_and_perspective() {
        let camera = Camera::new(CameraConfig::default());
        let (x, y) = camera.project(&Point3::new(5.0, 0.0, 3.0)).unwrap();
        assert!(x > 640.0 && y > 384.0);
        // Closer to the camera means further from the center.
        let (high_x, _) = camera.project(&Point3::new(5.0, 10.0, 3.0)).unwrap();
        assert!(high_x > x);
    }

    #[test]
    fn test_points_above_camera_are_hidden() {
        let camera = Camera::new(CameraConfig::default());
        assert!(camera.project(&Point3::new(0.0, 31.0, 0.0)).is_none());
        assert!(camera.anchor(&Point3::new(0.0, 0.0, 0.0), DieType::D6).is_some());
    }
}
