//! Switch Jig Core
//!
//! This crate contains everything between the parameter file and the
//! exported meshes:
//! - CaseParameters: named constants, balancing and validation
//! - Dimensions: values derived from balanced parameters
//! - Outline: PCB/shim/fauxkey outlines imported from DXF
//! - CaseModel: part recipes for the case halves, key, shim and fauxkey
//! - Export: STL meshes and a RON manifest

pub mod constants;
pub mod dimensions;
pub mod display;
pub mod export;
pub mod model;
pub mod outline;
pub mod params;

pub use constants::*;
pub use dimensions::*;
pub use display::*;
pub use export::*;
pub use model::*;
pub use outline::*;
pub use params::*;
