//! Global constants for jig-core

/// DXF file holding the key PCB outline
pub const KEY_OUTLINE_FILE: &str = "pcb.dxf";

/// DXF file holding the shim outline
pub const SHIM_OUTLINE_FILE: &str = "shim.dxf";

/// DXF file holding the fauxkey outline
pub const FAUXKEY_OUTLINE_FILE: &str = "fauxkey.dxf";

/// Part names, in build order
pub const PART_CAVITY: &str = "cavity";
pub const PART_CASE: &str = "case";
pub const PART_TOP: &str = "top";
pub const PART_BOTTOM: &str = "bottom";
pub const PART_KEY: &str = "key";
pub const PART_SHIM: &str = "shim";
pub const PART_FAUXKEY: &str = "fauxkey";

/// Default chord tolerance for tessellation (mm)
pub const DEFAULT_TESSELLATION_TOLERANCE: f64 = 0.05;

/// Manifest written next to the exported meshes
pub const MANIFEST_FILE: &str = "manifest.ron";

/// Relative tolerance for joining DXF segment end points (scaled by drawing size)
pub const OUTLINE_JOIN_TOLERANCE: f64 = 1e-4;

/// Margin added around half-space boxes used to split the case (mm)
pub const SPLIT_MARGIN: f64 = 1.0;

/// Distance a cut tool runs past a face it opens onto (mm)
pub const CUT_OVERSHOOT: f64 = 0.5;
