//! Truck CAD Kernel Backend
//!
//! Pure Rust B-Rep kernel using the Truck library.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::{DVec2, DVec3};
use truck_meshalgo::prelude::*;
use truck_modeling::{Point3, Rad, Solid as TruckSolid, Vector3, Vertex, Wire, builder};
use truck_polymesh::PolygonMesh;
use uuid::Uuid;

use super::{BooleanType, CadError, CadKernel, CadResult, Solid, TessellatedMesh};
use crate::sketch::{Profile2D, SketchPlane};

/// Tolerance handed to truck-shapeops
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// Distance below which a profile point counts as lying on the revolve axis
const AXIS_EPSILON: f64 = 1e-9;

/// Truck-based CAD kernel
pub struct TruckKernel {
    /// Storage for solid data (keyed by UUID)
    solids: Mutex<HashMap<Uuid, TruckSolid>>,
}

fn point(p: DVec3) -> Point3 {
    Point3::new(p.x, p.y, p.z)
}

fn vector(v: DVec3) -> Vector3 {
    Vector3::new(v.x, v.y, v.z)
}

impl TruckKernel {
    /// Create a new Truck kernel
    pub fn new() -> Self {
        Self {
            solids: Mutex::new(HashMap::new()),
        }
    }

    fn solids(&self) -> MutexGuard<'_, HashMap<Uuid, TruckSolid>> {
        self.solids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a solid and return a Solid reference
    fn store_solid(&self, solid: TruckSolid) -> Solid {
        let id = Uuid::new_v4();
        self.solids().insert(id, solid);
        Solid::new(id)
    }

    fn get_solid(&self, solid: &Solid) -> CadResult<TruckSolid> {
        self.solids()
            .get(&solid.id)
            .cloned()
            .ok_or(CadError::SolidNotFound(solid.id))
    }

    /// Closed wire through points mapped onto a plane
    fn closed_wire(points: &[DVec2], plane: &SketchPlane) -> Wire {
        let vertices: Vec<Vertex> = points
            .iter()
            .map(|p| builder::vertex(point(plane.to_world(*p))))
            .collect();
        let n = vertices.len();
        let edges: Vec<_> = (0..n)
            .map(|i| builder::line(&vertices[i], &vertices[(i + 1) % n]))
            .collect();
        edges.into()
    }

    /// Open wire through points, first and last not joined
    fn open_wire(points: &[DVec3]) -> Wire {
        let vertices: Vec<Vertex> = points.iter().map(|p| builder::vertex(point(*p))).collect();
        let edges: Vec<_> = vertices
            .windows(2)
            .map(|w| builder::line(&w[0], &w[1]))
            .collect();
        edges.into()
    }

    /// Revolve a loop with one edge lying on the axis.
    ///
    /// `builder::cone` needs an open wire whose ends sit on an axis through
    /// the world origin, so the profile is built relative to the plane origin
    /// and moved into place afterwards.
    fn revolve_touching_axis(
        &self,
        outer: &[DVec2],
        plane: &SketchPlane,
        angle: f64,
    ) -> CadResult<Option<TruckSolid>> {
        let n = outer.len();
        let on_axis = |p: &DVec2| p.x.abs() < AXIS_EPSILON;
        let Some(start) = (0..n).find(|&i| on_axis(&outer[i]) && on_axis(&outer[(i + 1) % n]))
        else {
            return Ok(None);
        };

        // Walk from the far end of the axis edge round to its near end
        let local = plane.with_origin(DVec3::ZERO);
        let points: Vec<DVec3> = (0..n)
            .map(|k| local.to_world(outer[(start + 1 + k) % n]))
            .collect();
        let wire = Self::open_wire(&points);

        let shell = builder::cone(&wire, vector(plane.y_axis), Rad(angle));
        let solid: TruckSolid = truck_topology::Solid::try_new(vec![shell])
            .map_err(|e| CadError::OperationFailed(format!("Failed to close revolved shell: {e:?}")))?;
        Ok(Some(builder::translated(&solid, vector(plane.origin))))
    }

    fn mesh_to_tessellated(mesh: &PolygonMesh) -> TessellatedMesh {
        let positions = mesh.positions();
        let normals = mesh.normals();
        let mut out = TessellatedMesh::new();

        for tri in mesh.faces().triangle_iter() {
            for v in tri.iter() {
                let p = positions[v.pos];
                out.vertices.push([p[0] as f32, p[1] as f32, p[2] as f32]);
                let n = v
                    .nor
                    .and_then(|i| normals.get(i))
                    .map(|n| [n[0] as f32, n[1] as f32, n[2] as f32])
                    .unwrap_or([0.0, 0.0, 1.0]);
                out.normals.push(n);
                out.indices.push(out.indices.len() as u32);
            }
        }
        out
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl CadKernel for TruckKernel {
    fn name(&self) -> &str {
        "truck"
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
        if distance.abs() < 1e-12 {
            return Err(CadError::InvalidProfile("Extrusion distance is zero".into()));
        }

        // Sweep forwards only; a negative distance starts from the far face
        let (plane, distance) = if distance < 0.0 {
            (plane.offset(distance), -distance)
        } else {
            (*plane, distance)
        };

        let profile = profile.normalized();
        let mut wires = vec![Self::closed_wire(&profile.outer, &plane)];
        wires.extend(profile.holes.iter().map(|h| Self::closed_wire(h, &plane)));

        let face = builder::try_attach_plane(&wires)
            .map_err(|e| CadError::OperationFailed(format!("Failed to create face: {:?}", e)))?;
        let solid = builder::tsweep(&face, vector(plane.normal() * distance));

        Ok(self.store_solid(solid))
    }

    fn revolve(&self, profile: &Profile2D, plane: &SketchPlane, angle: f64) -> CadResult<Solid> {
        if profile.outer.len() < 3 {
            return Err(CadError::InvalidProfile(
                "Profile must have at least 3 points".into(),
            ));
        }
        let outer = &profile.outer;
        if outer.iter().any(|p| p.x < -AXIS_EPSILON) && outer.iter().any(|p| p.x > AXIS_EPSILON) {
            return Err(CadError::InvalidProfile(
                "Profile crosses the revolve axis".into(),
            ));
        }

        if let Some(solid) = self.revolve_touching_axis(outer, plane, angle)? {
            return Ok(self.store_solid(solid));
        }

        let wire = Self::closed_wire(&profile.normalized().outer, plane);
        let face = builder::try_attach_plane(&[wire])
            .map_err(|e| CadError::OperationFailed(format!("Failed to create face: {:?}", e)))?;
        let solid = builder::rsweep(
            &face,
            point(plane.origin),
            vector(plane.y_axis),
            Rad(angle),
        );

        Ok(self.store_solid(solid))
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        let solid_a = self.get_solid(a)?;
        let mut solid_b = self.get_solid(b)?;

        if op == BooleanType::Subtract {
            // A ∩ ¬B
            solid_b.not();
        }

        // truck-topology panics instead of failing on some unclosed results
        let result = panic::catch_unwind(AssertUnwindSafe(|| match op {
            BooleanType::Union => truck_shapeops::or(&solid_a, &solid_b, BOOLEAN_TOLERANCE),
            BooleanType::Subtract | BooleanType::Intersect => {
                truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE)
            }
        }))
        .map_err(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "kernel panicked".to_string());
            CadError::BooleanFailed(format!("{:?}: {}", op, reason))
        })?;

        let solid = result.ok_or_else(|| {
            CadError::BooleanFailed(format!("truck returned no solid for {:?}", op))
        })?;
        Ok(self.store_solid(solid))
    }

    fn translate(&self, solid: &Solid, offset: DVec3) -> CadResult<Solid> {
        let source = self.get_solid(solid)?;
        Ok(self.store_solid(builder::translated(&source, vector(offset))))
    }

    fn create_box(&self, min: DVec3, size: DVec3) -> CadResult<Solid> {
        if size.cmple(DVec3::ZERO).any() {
            return Err(CadError::OperationFailed(format!(
                "Box size must be positive, got {size}"
            )));
        }

        let vertex = builder::vertex(point(min));
        let edge = builder::tsweep(&vertex, Vector3::new(size.x, 0.0, 0.0));
        let face = builder::tsweep(&edge, Vector3::new(0.0, size.y, 0.0));
        let solid = builder::tsweep(&face, Vector3::new(0.0, 0.0, size.z));

        Ok(self.store_solid(solid))
    }

    fn tessellate(&self, solid: &Solid, tolerance: f64) -> CadResult<TessellatedMesh> {
        let source = self.get_solid(solid)?;
        let mesh = source.triangulation(tolerance).to_polygon();
        let out = Self::mesh_to_tessellated(&mesh);
        if out.is_empty() {
            return Err(CadError::TessellationFailed(
                "Triangulation produced no faces".into(),
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_tessellates() {
        let kernel = TruckKernel::new();
        let solid = kernel.create_box(DVec3::ZERO, DVec3::new(2.0, 3.0, 4.0)).unwrap();
        let mesh = kernel.tessellate(&solid, 0.1).unwrap();
        assert!(mesh.triangle_count() >= 12);
        for v in &mesh.vertices {
            assert!(v[2] >= -1e-6 && v[2] <= 4.0 + 1e-6);
        }
    }

    #[test]
    fn test_subtract_through_faces() {
        let kernel = TruckKernel::new();
        let block = kernel.create_box(DVec3::ZERO, DVec3::new(10.0, 10.0, 4.0)).unwrap();
        // Slot runs past the top face and both side faces
        let slot = kernel
            .create_box(DVec3::new(3.0, -0.5, 2.0), DVec3::new(4.0, 11.0, 2.5))
            .unwrap();
        let cut = kernel.boolean(&block, &slot, BooleanType::Subtract).unwrap();
        let mesh = kernel.tessellate(&cut, 0.1).unwrap();
        assert!(mesh.triangle_count() > 12);
        for v in &mesh.vertices {
            let inside_slot = v[0] > 3.0 + 1e-4 && v[0] < 7.0 - 1e-4 && v[2] > 2.0 + 1e-4;
            assert!(!inside_slot, "vertex {v:?} left inside the slot");
        }
    }

    #[test]
    fn test_enclosed_cut_does_not_panic() {
        let kernel = TruckKernel::new();
        let block = kernel.create_box(DVec3::ZERO, DVec3::splat(10.0)).unwrap();
        let void = kernel.create_box(DVec3::splat(3.0), DVec3::splat(4.0)).unwrap();
        if let Err(e) = kernel.boolean(&block, &void, BooleanType::Subtract) {
            assert!(matches!(e, CadError::BooleanFailed(_)));
        }
    }

    #[test]
    fn test_missing_solid() {
        let kernel = TruckKernel::new();
        let ghost = Solid::new(Uuid::new_v4());
        assert!(matches!(
            kernel.translate(&ghost, DVec3::X),
            Err(CadError::SolidNotFound(_))
        ));
    }

    #[test]
    fn test_extrude_rejects_degenerate_profile() {
        let kernel = TruckKernel::new();
        let profile = Profile2D::new(vec![DVec2::ZERO, DVec2::X]);
        assert!(matches!(
            kernel.extrude(&profile, &SketchPlane::default(), 1.0),
            Err(CadError::InvalidProfile(_))
        ));
    }
}
