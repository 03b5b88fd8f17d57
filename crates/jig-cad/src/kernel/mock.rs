//! Deterministic in-memory kernel that records every operation.
//!
//! Tracks an axis-aligned bounding box per solid instead of real geometry and
//! records every call, so part recipes can be checked without a B-Rep backend.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::{DVec2, DVec3};
use uuid::Uuid;

use super::{BooleanType, CadError, CadKernel, CadResult, Solid, TessellatedMesh};
use crate::sketch::{Profile2D, SketchPlane};

/// A recorded kernel call
#[derive(Debug, Clone, PartialEq)]
pub enum MockOp {
    Extrude {
        solid: Uuid,
        /// Enclosed area of the profile
        area: f64,
        distance: f64,
        normal: DVec3,
    },
    Revolve {
        solid: Uuid,
        angle: f64,
    },
    Boolean {
        result: Uuid,
        a: Uuid,
        b: Uuid,
        op: BooleanType,
    },
    Translate {
        result: Uuid,
        source: Uuid,
        offset: DVec3,
    },
    Box {
        solid: Uuid,
        min: DVec3,
        size: DVec3,
    },
    Tessellate {
        solid: Uuid,
    },
}

/// Axis-aligned extent of a mock solid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockBounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl MockBounds {
    fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: b.min.min(p),
                max: b.max.max(p),
            },
        ))
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }
}

#[derive(Debug, Default)]
struct MockState {
    solids: HashMap<Uuid, MockBounds>,
    ops: Vec<MockOp>,
}

/// Deterministic test double for the CAD kernel.
#[derive(Debug, Default)]
pub struct MockKernel {
    state: Mutex<MockState>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn store(state: &mut MockState, bounds: MockBounds) -> Solid {
        let id = Uuid::new_v4();
        state.solids.insert(id, bounds);
        Solid::new(id)
    }

    fn lookup(state: &MockState, solid: &Solid) -> CadResult<MockBounds> {
        state
            .solids
            .get(&solid.id)
            .copied()
            .ok_or(CadError::SolidNotFound(solid.id))
    }

    /// All calls made so far, in order
    pub fn ops(&self) -> Vec<MockOp> {
        self.state().ops.clone()
    }

    /// Bounding box of a solid created by this kernel
    pub fn bounds(&self, solid: &Solid) -> Option<MockBounds> {
        self.state().solids.get(&solid.id).copied()
    }

    /// Number of boolean calls of the given type
    pub fn boolean_count(&self, op: BooleanType) -> usize {
        self.state()
            .ops
            .iter()
            .filter(|o| matches!(o, MockOp::Boolean { op: t, .. } if *t == op))
            .count()
    }
}

impl CadKernel for MockKernel {
    fn name(&self) -> &str {
        "mock"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extrude(&self, profile: &Profile2D, plane: &SketchPlane, distance: f64) -> CadResult<Solid> {
        if profile.outer.len() < 3 {
            return Err(CadError::InvalidProfile(
                "Profile must have at least 3 points".into(),
            ));
        }
        if distance == 0.0 {
            return Err(CadError::InvalidProfile("Extrusion distance is zero".into()));
        }

        let sweep = plane.normal() * distance;
        let base: Vec<DVec3> = profile.outer.iter().map(|p| plane.to_world(*p)).collect();
        let bounds = MockBounds::from_points(base.iter().flat_map(|p| [*p, *p + sweep]))
            .ok_or_else(|| CadError::InvalidProfile("Empty profile".into()))?;

        let mut state = self.state();
        let solid = Self::store(&mut state, bounds);
        state.ops.push(MockOp::Extrude {
            solid: solid.id,
            area: profile.area(),
            distance,
            normal: plane.normal(),
        });
        Ok(solid)
    }

    fn revolve(&self, profile: &Profile2D, plane: &SketchPlane, angle: f64) -> CadResult<Solid> {
        if profile.outer.len() < 3 {
            return Err(CadError::InvalidProfile(
                "Profile must have at least 3 points".into(),
            ));
        }
        if profile.outer.iter().any(|p| p.x < -1e-9) && profile.outer.iter().any(|p| p.x > 1e-9) {
            return Err(CadError::InvalidProfile(
                "Profile crosses the revolve axis".into(),
            ));
        }

        let radius = profile.outer.iter().map(|p| p.x.abs()).fold(0.0, f64::max);
        let (y_min, y_max) = profile
            .outer
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            });
        let normal = plane.normal();
        let corners = [y_min, y_max].into_iter().flat_map(|y| {
            [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)]
                .into_iter()
                .map(move |(s, t)| {
                    plane.to_world(DVec2::new(0.0, y))
                        + plane.x_axis * (s * radius)
                        + normal * (t * radius)
                })
        });
        let bounds = MockBounds::from_points(corners)
            .ok_or_else(|| CadError::InvalidProfile("Empty profile".into()))?;

        let mut state = self.state();
        let solid = Self::store(&mut state, bounds);
        state.ops.push(MockOp::Revolve {
            solid: solid.id,
            angle,
        });
        Ok(solid)
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        let mut state = self.state();
        let ba = Self::lookup(&state, a)?;
        let bb = Self::lookup(&state, b)?;

        let bounds = match op {
            BooleanType::Union => MockBounds {
                min: ba.min.min(bb.min),
                max: ba.max.max(bb.max),
            },
            BooleanType::Subtract => ba,
            BooleanType::Intersect => {
                let min = ba.min.max(bb.min);
                let max = ba.max.min(bb.max);
                if min.cmpge(max).any() {
                    return Err(CadError::BooleanFailed(
                        "Intersection is empty".into(),
                    ));
                }
                MockBounds { min, max }
            }
        };

        let solid = Self::store(&mut state, bounds);
        state.ops.push(MockOp::Boolean {
            result: solid.id,
            a: a.id,
            b: b.id,
            op,
        });
        Ok(solid)
    }

    fn translate(&self, solid: &Solid, offset: DVec3) -> CadResult<Solid> {
        let mut state = self.state();
        let b = Self::lookup(&state, solid)?;
        let moved = Self::store(
            &mut state,
            MockBounds {
                min: b.min + offset,
                max: b.max + offset,
            },
        );
        state.ops.push(MockOp::Translate {
            result: moved.id,
            source: solid.id,
            offset,
        });
        Ok(moved)
    }

    fn create_box(&self, min: DVec3, size: DVec3) -> CadResult<Solid> {
        if size.cmple(DVec3::ZERO).any() {
            return Err(CadError::OperationFailed(format!(
                "Box size must be positive, got {size}"
            )));
        }
        let mut state = self.state();
        let solid = Self::store(
            &mut state,
            MockBounds {
                min,
                max: min + size,
            },
        );
        state.ops.push(MockOp::Box {
            solid: solid.id,
            min,
            size,
        });
        Ok(solid)
    }

    fn tessellate(&self, solid: &Solid, _tolerance: f64) -> CadResult<TessellatedMesh> {
        let mut state = self.state();
        let b = Self::lookup(&state, solid)?;
        state.ops.push(MockOp::Tessellate { solid: solid.id });

        let (lo, hi) = (b.min.as_vec3(), b.max.as_vec3());
        let vertices = vec![
            [lo.x, lo.y, lo.z],
            [hi.x, lo.y, lo.z],
            [hi.x, hi.y, lo.z],
            [lo.x, hi.y, lo.z],
            [lo.x, lo.y, hi.z],
            [hi.x, lo.y, hi.z],
            [hi.x, hi.y, hi.z],
            [lo.x, hi.y, hi.z],
        ];
        #[rustfmt::skip]
        let indices = vec![
            0, 2, 1, 0, 3, 2, // bottom
            4, 5, 6, 4, 6, 7, // top
            0, 1, 5, 0, 5, 4, // front
            2, 3, 7, 2, 7, 6, // back
            0, 4, 7, 0, 7, 3, // left
            1, 2, 6, 1, 6, 5, // right
        ];
        Ok(TessellatedMesh {
            vertices,
            normals: Vec::new(),
            indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_extrude_bounds_follow_plane_normal() {
        let kernel = MockKernel::new();
        let profile = Profile2D::rectangle(DVec2::new(5.0, 5.0), 10.0, 10.0);
        let plane = SketchPlane::new(DVec3::new(0.0, 0.0, 3.0), DVec3::X, DVec3::NEG_Z);
        let solid = kernel.extrude(&profile, &plane, 2.0).unwrap();

        let b = kernel.bounds(&solid).unwrap();
        assert_relative_eq!(b.min.z, 1.0);
        assert_relative_eq!(b.max.z, 3.0);
        // Facing down flips local Y
        assert_relative_eq!(b.min.y, -10.0);
        assert_relative_eq!(b.max.y, 0.0);
    }

    #[test]
    fn test_boolean_bounds() {
        let kernel = MockKernel::new();
        let a = kernel.create_box(DVec3::ZERO, DVec3::splat(10.0)).unwrap();
        let b = kernel
            .create_box(DVec3::new(0.0, 0.0, 4.0), DVec3::new(20.0, 20.0, 20.0))
            .unwrap();

        let top = kernel.boolean(&a, &b, BooleanType::Intersect).unwrap();
        let tb = kernel.bounds(&top).unwrap();
        assert_relative_eq!(tb.min.z, 4.0);
        assert_relative_eq!(tb.max.z, 10.0);

        let cut = kernel.boolean(&a, &b, BooleanType::Subtract).unwrap();
        assert_eq!(kernel.bounds(&cut), kernel.bounds(&a));
        assert_eq!(kernel.boolean_count(BooleanType::Subtract), 1);
    }

    #[test]
    fn test_empty_intersection_fails() {
        let kernel = MockKernel::new();
        let a = kernel.create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let b = kernel.create_box(DVec3::splat(5.0), DVec3::ONE).unwrap();
        assert!(matches!(
            kernel.boolean(&a, &b, BooleanType::Intersect),
            Err(CadError::BooleanFailed(_))
        ));
    }

    #[test]
    fn test_revolve_around_vertical_axis() {
        let kernel = MockKernel::new();
        let plane = SketchPlane::new(DVec3::new(5.0, 5.0, 10.0), DVec3::X, DVec3::NEG_Y);
        let profile = Profile2D::new(vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(2.0, 0.0),
            DVec2::new(2.0, -4.0),
            DVec2::new(0.0, -4.0),
        ]);
        let solid = kernel
            .revolve(&profile, &plane, std::f64::consts::TAU)
            .unwrap();
        let b = kernel.bounds(&solid).unwrap();
        assert_relative_eq!(b.min.x, 3.0);
        assert_relative_eq!(b.max.y, 7.0);
        assert_relative_eq!(b.min.z, 6.0);
        assert_relative_eq!(b.max.z, 10.0);
    }

    #[test]
    fn test_tessellate_box_mesh() {
        let kernel = MockKernel::new();
        let solid = kernel.create_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let mesh = kernel.tessellate(&solid, 0.1).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert!(matches!(kernel.ops().last(), Some(MockOp::Tessellate { .. })));
    }
}
