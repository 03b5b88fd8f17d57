//! CAD Kernel Abstraction and Part Recipes
//!
//! This crate provides:
//! - Abstract CAD kernel traits for solid operations
//! - 2D profiles and sketch planes used as extrusion inputs
//! - Feature operations (extrude, revolve, box, translate) with boolean modes
//! - Part recipes: ordered feature lists replayed against a kernel

pub mod feature;
pub mod kernel;
pub mod recipe;
pub mod sketch;

// Re-exports for convenience
pub use feature::{BooleanOp, Feature, FeatureError, FeatureResult};
pub use kernel::{
    BooleanType, CadError, CadKernel, CadResult, MockBounds, MockKernel, MockOp, NullKernel, Solid,
    TessellatedMesh, default_kernel,
};
pub use recipe::PartRecipe;
pub use sketch::{Bounds2, Profile2D, SketchPlane};

#[cfg(feature = "truck")]
pub use kernel::TruckKernel;
