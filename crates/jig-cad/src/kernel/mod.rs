//! CAD Kernel Abstraction Layer
//!
//! Geometry operations behind one trait so part recipes can run against the
//! Truck B-Rep backend or a bounding-box mock in tests.

mod mock;
mod traits;

#[cfg(feature = "truck")]
mod truck;

pub use mock::{MockBounds, MockKernel, MockOp};
pub use traits::*;

#[cfg(feature = "truck")]
pub use truck::TruckKernel;
