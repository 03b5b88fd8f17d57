//! Sketch planes

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

/// A plane in 3D space that a 2D profile is placed on
///
/// Local `x` maps to `x_axis`, local `y` to `y_axis`. The normal is
/// `x_axis × y_axis`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SketchPlane {
    /// Origin of the plane in world coordinates
    pub origin: DVec3,
    /// Local X direction (unit length)
    pub x_axis: DVec3,
    /// Local Y direction (unit length)
    pub y_axis: DVec3,
}

impl SketchPlane {
    /// Create a plane from an origin, an X direction and a normal
    pub fn new(origin: DVec3, x_axis: DVec3, normal: DVec3) -> Self {
        let normal = normal.normalize();
        let x_axis = x_axis.normalize();
        let y_axis = normal.cross(x_axis).normalize();
        Self {
            origin,
            x_axis,
            y_axis,
        }
    }

    /// Horizontal plane at height `z`, normal +Z
    pub fn xy(z: f64) -> Self {
        Self {
            origin: DVec3::new(0.0, 0.0, z),
            x_axis: DVec3::X,
            y_axis: DVec3::Y,
        }
    }

    /// Plane normal
    pub fn normal(&self) -> DVec3 {
        self.x_axis.cross(self.y_axis).normalize()
    }

    /// Same plane with a different origin
    pub fn with_origin(mut self, origin: DVec3) -> Self {
        self.origin = origin;
        self
    }

    /// Plane moved along its normal
    pub fn offset(mut self, distance: f64) -> Self {
        self.origin += self.normal() * distance;
        self
    }

    /// Map a local point to world coordinates
    pub fn to_world(&self, p: DVec2) -> DVec3 {
        self.origin + self.x_axis * p.x + self.y_axis * p.y
    }
}

impl Default for SketchPlane {
    fn default() -> Self {
        Self::xy(0.0)
    }
}
