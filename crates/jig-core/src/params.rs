//! Case parameters
//!
//! Every length is in millimetres. Parameter files are RON; fields missing
//! from a file keep their default value.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// A standoff supporting the key PCB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Standoff {
    /// Offset along the PCB width from its left edge
    pub x: f64,
    /// Extent along X
    pub width: f64,
    /// Extent along Y
    pub height: f64,
}

impl Standoff {
    pub const fn new(x: f64, width: f64, height: f64) -> Self {
        Self { x, width, height }
    }
}

/// Named constants describing the jig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseParameters {
    pub case_base_thickness: f64,
    pub case_front_thickness: f64,
    pub case_back_thickness: f64,
    pub case_side_thickness: f64,
    pub case_top_thickness: f64,
    pub case_bottom_thickness: f64,

    /// Radius of the vertical case edges
    pub case_fillet_radius: f64,
    /// Width of the tongue and groove ring between the halves
    pub case_inset_thickness: f64,
    /// Height of the tongue and groove ring
    pub case_inset_depth: f64,
    /// Inner corner radius of the ring
    pub inset_corner_radius: f64,

    /// Hex pocket depth (2.4 mm nut plus clearance)
    pub nut_height: f64,
    /// Circumscribed diameter of the hex pocket
    pub nut_diameter: f64,
    /// Material left under the nut pocket
    pub nut_depth: f64,
    /// Cut hex nut pockets under the screw holes
    pub use_nut: bool,

    /// Screw centre distance from the outer case edge
    pub screw_inset: f64,
    pub screw_thread_diameter: f64,
    pub screw_head_diameter: f64,
    pub screw_head_depth: f64,
    /// Included countersink angle in degrees
    pub countersink_angle: f64,

    pub pcb_width: f64,
    pub pcb_height: f64,

    /// Standoffs below the key PCB
    pub bottom_standoff_thickness: f64,
    pub key_thickness: f64,
    /// Shim between the key and fauxkey
    pub shim_thickness: f64,
    pub fauxkey_thickness: f64,
    /// Components mounted under the fauxkey
    pub fauxkey_component_thickness: f64,

    /// Cable cutout in the front wall
    pub usb_cutout_width: f64,
    pub usb_cutout_height: f64,
    pub usb_cutout_radius: f64,
    /// Connector relief in the shim and the fauxkey standoff
    pub usb_connector_width: f64,
    pub usb_connector_height: f64,

    /// Key standoffs left standing inside the cavity
    pub standoffs: Vec<Standoff>,
}

impl Default for CaseParameters {
    fn default() -> Self {
        let base = 1.6;
        let pcb_height = 26.3;
        Self {
            case_base_thickness: base,
            case_front_thickness: base,
            case_back_thickness: base,
            case_side_thickness: base + 2.0,
            case_top_thickness: base,
            case_bottom_thickness: base,

            case_fillet_radius: 1.6,
            case_inset_thickness: 0.8,
            case_inset_depth: 1.2,
            inset_corner_radius: 0.8,

            nut_height: 2.6,
            nut_diameter: 6.3,
            nut_depth: 0.6,
            use_nut: false,

            screw_inset: 3.75,
            screw_thread_diameter: 3.0,
            screw_head_diameter: 5.8,
            screw_head_depth: 2.0,
            countersink_angle: 82.0,

            pcb_width: 58.5,
            pcb_height,

            bottom_standoff_thickness: 3.0,
            key_thickness: 1.0,
            shim_thickness: 3.4,
            fauxkey_thickness: 0.8,
            fauxkey_component_thickness: 3.6,

            usb_cutout_width: 8.5,
            usb_cutout_height: 2.8,
            usb_cutout_radius: 1.0,
            usb_connector_width: 10.0,
            usb_connector_height: 9.0,

            standoffs: vec![
                Standoff::new(4.5, 9.0, pcb_height),
                Standoff::new(16.5, 4.0, 10.0),
                Standoff::new(54.0, 9.0, pcb_height),
            ],
        }
    }
}

impl CaseParameters {
    pub fn fauxkey_total_thickness(&self) -> f64 {
        self.fauxkey_thickness + self.fauxkey_component_thickness
    }

    /// Full stack height: top wall, fauxkey, shim, key, standoffs, bottom wall
    pub fn total_thickness(&self) -> f64 {
        self.case_top_thickness
            + self.fauxkey_total_thickness()
            + self.shim_thickness
            + self.key_thickness
            + self.bottom_standoff_thickness
            + self.case_bottom_thickness
    }

    pub fn midpoint(&self) -> f64 {
        self.total_thickness() / 2.0
    }

    /// Material between the cable cutout centre and the top face
    pub fn above_cutout(&self) -> f64 {
        self.usb_cutout_height / 2.0 + self.fauxkey_total_thickness() + self.case_top_thickness
    }

    /// Material between the cable cutout centre and the bottom face
    pub fn below_cutout(&self) -> f64 {
        self.shim_thickness + self.key_thickness + self.bottom_standoff_thickness
            + self.case_bottom_thickness
            - self.usb_cutout_height / 2.0
    }

    /// Thicken the top or bottom wall so the cable cutout sits at mid height
    pub fn balanced(&self) -> Self {
        let above = self.above_cutout();
        let below = self.below_cutout();
        tracing::info!(above, below, "cable cutout clearance");

        let mut out = self.clone();
        if above > below {
            out.case_bottom_thickness += above - below;
        } else {
            out.case_top_thickness += below - above;
        }

        tracing::info!(
            midpoint = out.midpoint(),
            total = out.total_thickness(),
            "balanced stack"
        );
        out
    }

    /// Check that the parameters describe a buildable case
    pub fn validate(&self) -> Result<(), ParamError> {
        let lengths = [
            ("case_base_thickness", self.case_base_thickness),
            ("case_front_thickness", self.case_front_thickness),
            ("case_back_thickness", self.case_back_thickness),
            ("case_side_thickness", self.case_side_thickness),
            ("case_top_thickness", self.case_top_thickness),
            ("case_bottom_thickness", self.case_bottom_thickness),
            ("case_inset_thickness", self.case_inset_thickness),
            ("case_inset_depth", self.case_inset_depth),
            ("nut_height", self.nut_height),
            ("nut_diameter", self.nut_diameter),
            ("nut_depth", self.nut_depth),
            ("screw_inset", self.screw_inset),
            ("screw_thread_diameter", self.screw_thread_diameter),
            ("screw_head_diameter", self.screw_head_diameter),
            ("screw_head_depth", self.screw_head_depth),
            ("pcb_width", self.pcb_width),
            ("pcb_height", self.pcb_height),
            ("bottom_standoff_thickness", self.bottom_standoff_thickness),
            ("key_thickness", self.key_thickness),
            ("shim_thickness", self.shim_thickness),
            ("fauxkey_thickness", self.fauxkey_thickness),
            ("fauxkey_component_thickness", self.fauxkey_component_thickness),
            ("usb_cutout_width", self.usb_cutout_width),
            ("usb_cutout_height", self.usb_cutout_height),
            ("usb_connector_width", self.usb_connector_width),
            ("usb_connector_height", self.usb_connector_height),
        ];
        for (field, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(ParamError::invalid(field, format!("must be positive, got {value}")));
            }
        }

        let radii = [
            ("case_fillet_radius", self.case_fillet_radius),
            ("inset_corner_radius", self.inset_corner_radius),
            ("usb_cutout_radius", self.usb_cutout_radius),
        ];
        for (field, value) in radii {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamError::invalid(field, format!("must not be negative, got {value}")));
            }
        }

        if self.screw_head_diameter <= self.screw_thread_diameter {
            return Err(ParamError::invalid(
                "screw_head_diameter",
                "must be larger than the thread diameter",
            ));
        }
        if !(self.countersink_angle > 0.0 && self.countersink_angle < 180.0) {
            return Err(ParamError::invalid(
                "countersink_angle",
                format!("must lie between 0 and 180 degrees, got {}", self.countersink_angle),
            ));
        }
        // Inner outline of the alignment ring
        let inner_width = self.pcb_width + self.case_front_thickness + self.case_back_thickness
            - self.case_inset_thickness * 2.0;
        let inner_height = self.pcb_height + self.case_side_thickness * 2.0
            - self.case_inset_thickness * 2.0;
        if inner_width <= 0.0 || inner_height <= 0.0 {
            return Err(ParamError::invalid(
                "case_inset_thickness",
                "leaves no room inside the alignment ring",
            ));
        }
        if self.inset_corner_radius * 2.0 > inner_width.min(inner_height) {
            return Err(ParamError::invalid(
                "inset_corner_radius",
                "must be at most half of the inner ring sides",
            ));
        }
        if self.usb_cutout_radius * 2.0 > self.usb_cutout_width.min(self.usb_cutout_height) {
            return Err(ParamError::invalid(
                "usb_cutout_radius",
                "must be at most half of both cutout sides",
            ));
        }
        for (i, s) in self.standoffs.iter().enumerate() {
            if !(s.x.is_finite() && s.width > 0.0 && s.height > 0.0) {
                return Err(ParamError::invalid(
                    "standoffs",
                    format!("standoff {i} needs a finite offset and positive size"),
                ));
            }
        }
        Ok(())
    }

    /// Parse parameters from RON
    pub fn from_ron_str(content: &str) -> Result<Self, ParamError> {
        ron::from_str(content).map_err(|e| ParamError::Deserialize(e.to_string()))
    }

    /// Serialize parameters to pretty RON
    pub fn to_ron_string(&self) -> Result<String, ParamError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ParamError::Serialize(e.to_string()))
    }

    /// Load parameters from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParamError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ParamError::Io(e.to_string()))?;
        Self::from_ron_str(&content)
    }

    /// Save parameters to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ParamError> {
        let content = self.to_ron_string()?;
        std::fs::write(path.as_ref(), content).map_err(|e| ParamError::Io(e.to_string()))
    }
}

/// Parameter errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParamError {
    #[error("Invalid parameter {field}: {reason}")]
    Invalid { field: String, reason: String },
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl ParamError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_total_is_sum_of_components() {
        let p = CaseParameters::default();
        assert_relative_eq!(p.fauxkey_total_thickness(), 4.4);
        assert_relative_eq!(
            p.total_thickness(),
            1.6 + 4.4 + 3.4 + 1.0 + 3.0 + 1.6,
            epsilon = 1e-12
        );
        assert_relative_eq!(p.midpoint(), p.total_thickness() / 2.0);
    }

    #[test]
    fn test_default_balancing_grows_top() {
        let p = CaseParameters::default();
        assert_relative_eq!(p.above_cutout(), 7.4, epsilon = 1e-12);
        assert_relative_eq!(p.below_cutout(), 7.6, epsilon = 1e-12);

        let b = p.balanced();
        assert_relative_eq!(b.case_top_thickness, 1.8, epsilon = 1e-12);
        assert_relative_eq!(b.case_bottom_thickness, 1.6);
        assert_relative_eq!(b.total_thickness(), 15.2, epsilon = 1e-12);
        assert_relative_eq!(b.above_cutout(), b.below_cutout(), epsilon = 1e-12);
        assert_relative_eq!(b.above_cutout(), b.midpoint(), epsilon = 1e-12);
    }

    #[test]
    fn test_balancing_grows_bottom_when_top_heavy() {
        let p = CaseParameters {
            fauxkey_component_thickness: 6.0,
            ..Default::default()
        };
        let diff = p.above_cutout() - p.below_cutout();
        assert!(diff > 0.0);

        let b = p.balanced();
        assert_relative_eq!(b.case_top_thickness, p.case_top_thickness);
        assert_relative_eq!(b.case_bottom_thickness, p.case_bottom_thickness + diff, epsilon = 1e-12);
        assert_relative_eq!(b.above_cutout(), b.midpoint(), epsilon = 1e-12);
    }

    #[test]
    fn test_balancing_is_idempotent() {
        let once = CaseParameters::default().balanced();
        let twice = once.balanced();
        assert_relative_eq!(once.case_top_thickness, twice.case_top_thickness, epsilon = 1e-12);
        assert_relative_eq!(
            once.case_bottom_thickness,
            twice.case_bottom_thickness,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_validate() {
        assert!(CaseParameters::default().validate().is_ok());

        let bad = CaseParameters {
            screw_head_diameter: 2.0,
            ..Default::default()
        };
        match bad.validate() {
            Err(ParamError::Invalid { field, .. }) => assert_eq!(field, "screw_head_diameter"),
            other => panic!("unexpected {other:?}"),
        }

        let bad = CaseParameters {
            key_thickness: f64::NAN,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = CaseParameters {
            usb_cutout_radius: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_inset_ring_limits() {
        // Square corners and an inset wider than the fillet are both fine
        let sharp = CaseParameters {
            case_fillet_radius: 0.0,
            ..Default::default()
        };
        assert!(sharp.validate().is_ok());
        let wide = CaseParameters {
            case_inset_thickness: 2.0,
            ..Default::default()
        };
        assert!(wide.validate().is_ok());

        let swallowed = CaseParameters {
            case_inset_thickness: 20.0,
            ..Default::default()
        };
        match swallowed.validate() {
            Err(ParamError::Invalid { field, .. }) => assert_eq!(field, "case_inset_thickness"),
            other => panic!("unexpected {other:?}"),
        }

        let round = CaseParameters {
            inset_corner_radius: 16.0,
            ..Default::default()
        };
        match round.validate() {
            Err(ParamError::Invalid { field, .. }) => assert_eq!(field, "inset_corner_radius"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_partial_ron_overrides_named_fields() {
        let p = CaseParameters::from_ron_str("(use_nut: true, pcb_width: 60.0)").unwrap();
        assert!(p.use_nut);
        assert_relative_eq!(p.pcb_width, 60.0);
        assert_relative_eq!(p.pcb_height, 26.3);
        assert_eq!(p.standoffs.len(), 3);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jig.ron");

        let p = CaseParameters {
            use_nut: true,
            ..Default::default()
        };
        p.save(&path).unwrap();
        assert_eq!(CaseParameters::load(&path).unwrap(), p);

        assert!(matches!(
            CaseParameters::load(dir.path().join("missing.ron")),
            Err(ParamError::Io(_))
        ));
    }
}
