//! 2D Sketch Profiles
//!
//! Closed polygonal profiles (with holes) and the planes they are placed on.
//! Curved edges are flattened into short segments before they reach a kernel.

mod plane;
mod profile;

pub use plane::SketchPlane;
pub use profile::{ARC_SEGMENT_ANGLE, Bounds2, Profile2D, arc_points, point_in_polygon, signed_area};
