//! Dimensions derived from balanced parameters

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::params::CaseParameters;

/// Case-level values every part recipe works from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Extent along X (PCB width plus front and back walls)
    pub total_width: f64,
    /// Extent along Y (PCB height plus both side walls)
    pub total_height: f64,
    /// Extent along Z
    pub total_depth: f64,
    pub midpoint: f64,
    /// Height of the cable cutout centre above the top face
    pub usb_cutout_offset: f64,
    /// Centre of the cable cutout on the front wall
    pub usb_cutout_origin: DVec3,
    /// Depth of the cavity cut for the PCB stack
    pub cutout_thickness: f64,
    /// Z where the cavity starts
    pub cutout_offset: f64,
    pub fauxkey_offset: f64,
    pub shim_offset: f64,
    pub key_offset: f64,
    /// Z of the plane separating the case halves
    pub split_height: f64,
    /// Screw hole depth measured from the top face
    pub screw_depth: f64,
    /// Screw and nut centres in the XY plane
    pub screw_positions: [DVec2; 4],
}

impl Dimensions {
    /// Derive dimensions. `params` is expected to be balanced already.
    pub fn new(params: &CaseParameters) -> Self {
        let p = params;
        let total_width = p.pcb_width + p.case_front_thickness + p.case_back_thickness;
        let total_height = p.pcb_height + p.case_side_thickness * 2.0;
        let midpoint = p.midpoint();
        let total_depth = midpoint * 2.0;
        let fauxkey_total = p.fauxkey_total_thickness();

        let center = DVec2::new(total_width / 2.0, total_height / 2.0);
        let half = DVec2::new(
            total_width / 2.0 - p.screw_inset,
            total_height / 2.0 - p.screw_inset,
        );
        let screw_positions = [
            center + DVec2::new(-half.x, -half.y),
            center + DVec2::new(half.x, -half.y),
            center + DVec2::new(half.x, half.y),
            center + DVec2::new(-half.x, half.y),
        ];

        let usb_cutout_origin = DVec3::new(0.0, p.pcb_height / 2.0 + p.case_side_thickness, midpoint);

        let dims = Self {
            total_width,
            total_height,
            total_depth,
            midpoint,
            usb_cutout_offset: p.usb_cutout_height / 2.0 + fauxkey_total + p.case_top_thickness,
            usb_cutout_origin,
            cutout_thickness: p.bottom_standoff_thickness
                + p.key_thickness
                + p.shim_thickness
                + p.fauxkey_thickness
                + p.fauxkey_component_thickness,
            cutout_offset: p.case_top_thickness + fauxkey_total
                - p.fauxkey_thickness
                - p.fauxkey_component_thickness,
            fauxkey_offset: fauxkey_total - p.fauxkey_thickness + p.case_top_thickness,
            shim_offset: fauxkey_total + p.case_top_thickness,
            key_offset: p.shim_thickness + fauxkey_total + p.case_top_thickness,
            split_height: total_depth - midpoint - p.case_inset_depth,
            screw_depth: total_depth - p.nut_depth,
            screw_positions,
        };

        tracing::info!(
            origin = ?dims.usb_cutout_origin,
            "cable cutout origin"
        );
        dims
    }

    /// Centre of the case footprint
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.total_width / 2.0, self.total_height / 2.0)
    }
}
