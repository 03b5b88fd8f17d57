//! Kernel interface shared by the truck backend and the test kernels

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::sketch::{Profile2D, SketchPlane};

/// Kernel errors
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Tessellation failed: {0}")]
    TessellationFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Solid not found: {0}")]
    SolidNotFound(Uuid),
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// Triangle soup returned by [`CadKernel::tessellate`]
#[derive(Debug, Clone, Default)]
pub struct TessellatedMesh {
    pub vertices: Vec<[f32; 3]>,
    /// Per-vertex normals, empty when the kernel gives none
    pub normals: Vec<[f32; 3]>,
    /// Three per triangle
    pub indices: Vec<u32>,
}

impl TessellatedMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Triangles as vertex triples; triangles with out-of-range indices are skipped
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            Some([
                *self.vertices.get(tri[0] as usize)?,
                *self.vertices.get(tri[1] as usize)?,
                *self.vertices.get(tri[2] as usize)?,
            ])
        })
    }
}

/// Handle to a solid owned by the kernel that created it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Solid {
    pub id: Uuid,
}

impl Solid {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

/// Boolean combination of two solids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanType {
    Union,
    /// First minus second
    Subtract,
    Intersect,
}

/// Solid modelling backend
///
/// Every operation returns a new solid and leaves its inputs untouched.
pub trait CadKernel: Send + Sync {
    fn name(&self) -> &str;

    /// False for placeholder kernels that fail every operation
    fn is_available(&self) -> bool;

    /// Sweep a closed profile along the plane normal by `distance`
    /// (negative sweeps against the normal)
    fn extrude(&self, profile: &Profile2D, plane: &SketchPlane, distance: f64)
    -> CadResult<Solid>;

    /// Revolve a profile by `angle` radians about the plane's local Y axis
    ///
    /// The profile may touch the axis but must stay on one side of it.
    fn revolve(&self, profile: &Profile2D, plane: &SketchPlane, angle: f64) -> CadResult<Solid>;

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid>;

    fn translate(&self, solid: &Solid, offset: DVec3) -> CadResult<Solid>;

    /// Axis-aligned box from its minimum corner and size
    fn create_box(&self, min: DVec3, size: DVec3) -> CadResult<Solid>;

    /// Triangulate a solid; smaller `tolerance` gives more triangles
    fn tessellate(&self, solid: &Solid, tolerance: f64) -> CadResult<TessellatedMesh>;
}

/// Stand-in used when the crate is built without a backend
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> CadResult<T> {
        Err(CadError::KernelNotAvailable(
            "No CAD kernel available".into(),
        ))
    }
}

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn extrude(
        &self,
        _profile: &Profile2D,
        _plane: &SketchPlane,
        _distance: f64,
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn revolve(&self, _profile: &Profile2D, _plane: &SketchPlane, _angle: f64) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn boolean(&self, _a: &Solid, _b: &Solid, _op: BooleanType) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn translate(&self, _solid: &Solid, _offset: DVec3) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn create_box(&self, _min: DVec3, _size: DVec3) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn tessellate(&self, _solid: &Solid, _tolerance: f64) -> CadResult<TessellatedMesh> {
        Self::unavailable()
    }
}

/// Kernel for the enabled backend feature
pub fn default_kernel() -> Box<dyn CadKernel> {
    #[cfg(feature = "truck")]
    {
        Box::new(super::TruckKernel::new())
    }

    #[cfg(not(feature = "truck"))]
    {
        Box::new(NullKernel)
    }
}
