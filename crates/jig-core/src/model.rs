//! Case model
//!
//! Turns balanced parameters and board outlines into one recipe per part,
//! then replays the recipes against a CAD kernel.
//!
//! Coordinates: the case corner sits at the origin, X runs along the PCB
//! width (front wall at x = 0), Y across it, and Z through the stack with the
//! top wall at z = 0.

use std::collections::HashMap;

use glam::{DVec2, DVec3};
use jig_cad::{BooleanOp, CadKernel, Feature, FeatureError, PartRecipe, Profile2D, SketchPlane, Solid};

use crate::constants::*;
use crate::dimensions::Dimensions;
use crate::display::{DisplayStyle, style_for};
use crate::outline::{Outline, OutlineError, Outlines};
use crate::params::{CaseParameters, ParamError};

/// Model errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("Parameter error: {0}")]
    Param(#[from] ParamError),
    #[error("Outline error: {0}")]
    Outline(#[from] OutlineError),
    #[error("Feature error: {0}")]
    Feature(#[from] FeatureError),
    #[error("The {0} outline has no profiles")]
    EmptyOutline(&'static str),
    #[error("Part '{part}' needs '{missing}', which is not built before it")]
    MissingPart { part: String, missing: String },
}

/// Part recipes for one jig, in build order
#[derive(Debug, Clone)]
pub struct CaseModel {
    /// Balanced parameters
    pub params: CaseParameters,
    pub dimensions: Dimensions,
    recipes: Vec<PartRecipe>,
}

/// A part solid together with its display style
#[derive(Debug, Clone)]
pub struct BuiltPart {
    pub name: String,
    pub solid: Solid,
    /// `None` for intermediate solids (cavity, unsplit case)
    pub style: Option<DisplayStyle>,
}

/// Solids produced by a model build
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub dimensions: Dimensions,
    pub parts: Vec<BuiltPart>,
}

impl BuiltModel {
    pub fn part(&self, name: &str) -> Option<&BuiltPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Parts meant to be shown or exported
    pub fn output_parts(&self) -> impl Iterator<Item = (&BuiltPart, DisplayStyle)> {
        self.parts.iter().filter_map(|p| p.style.map(|s| (p, s)))
    }
}

impl CaseModel {
    /// Validate and balance the parameters, then lay out every part recipe
    pub fn plan(params: &CaseParameters, outlines: &Outlines) -> Result<Self, ModelError> {
        params.validate()?;
        let params = params.balanced();
        let dimensions = Dimensions::new(&params);
        let planner = Planner {
            p: &params,
            d: &dimensions,
        };

        let recipes = vec![
            planner.fauxkey(&outlines.fauxkey)?,
            planner.shim(&outlines.shim)?,
            planner.key(&outlines.key)?,
            planner.cavity(&outlines.key)?,
            planner.case(),
            planner.top(),
            planner.bottom(),
        ];

        Ok(Self {
            params,
            dimensions,
            recipes,
        })
    }

    pub fn recipes(&self) -> &[PartRecipe] {
        &self.recipes
    }

    pub fn recipe(&self, name: &str) -> Option<&PartRecipe> {
        self.recipes.iter().find(|r| r.name == name)
    }

    /// Build every part in order
    pub fn build(&self, kernel: &dyn CadKernel) -> Result<BuiltModel, ModelError> {
        tracing::info!(kernel = kernel.name(), parts = self.recipes.len(), "building jig");

        let mut solids: HashMap<String, Solid> = HashMap::new();
        let mut parts = Vec::with_capacity(self.recipes.len());
        for recipe in &self.recipes {
            if let Some(missing) = recipe.dependencies().into_iter().find(|d| !solids.contains_key(*d)) {
                return Err(ModelError::MissingPart {
                    part: recipe.name.clone(),
                    missing: missing.to_string(),
                });
            }

            let solid = recipe.build(kernel, &solids)?;
            tracing::info!(part = %recipe.name, features = recipe.len(), "built part");

            solids.insert(recipe.name.clone(), solid);
            parts.push(BuiltPart {
                name: recipe.name.clone(),
                solid,
                style: style_for(&recipe.name),
            });
        }

        Ok(BuiltModel {
            dimensions: self.dimensions.clone(),
            parts,
        })
    }
}

/// Lays out the features of each part
struct Planner<'a> {
    p: &'a CaseParameters,
    d: &'a Dimensions,
}

impl Planner<'_> {
    /// Extrude an outline up from z = 0 and move it inside the walls
    fn extrusion(&self, label: &str, outline: &Outline, thickness: f64) -> [Feature; 2] {
        [
            Feature::extrude(
                format!("{label} outline"),
                outline.profiles.clone(),
                SketchPlane::xy(0.0),
                thickness,
                BooleanOp::New,
            ),
            Feature::translate(
                "Place inside walls",
                DVec3::new(self.p.case_front_thickness, self.p.case_side_thickness, 0.0),
            ),
        ]
    }

    /// Centre of the outline's bounding box once placed inside the walls,
    /// with X moved back to the PCB's left edge
    fn anchor(&self, name: &'static str, outline: &Outline) -> Result<DVec2, ModelError> {
        let bounds = outline.bounds().ok_or(ModelError::EmptyOutline(name))?;
        let c = bounds.center();
        Ok(DVec2::new(
            self.p.case_front_thickness + c.x - self.p.pcb_width / 2.0,
            self.p.case_side_thickness + c.y,
        ))
    }

    fn raise(z: f64) -> Feature {
        Feature::translate("Raise to stack height", DVec3::new(0.0, 0.0, z))
    }

    fn fauxkey(&self, outline: &Outline) -> Result<PartRecipe, ModelError> {
        if outline.is_empty() {
            return Err(ModelError::EmptyOutline("fauxkey"));
        }
        let mut recipe = PartRecipe::new(PART_FAUXKEY);
        for f in self.extrusion("Fauxkey", outline, self.p.fauxkey_thickness) {
            recipe.add_feature(f);
        }
        recipe.add_feature(Self::raise(self.d.fauxkey_offset));
        Ok(recipe)
    }

    fn shim(&self, outline: &Outline) -> Result<PartRecipe, ModelError> {
        let anchor = self.anchor("shim", outline)?;
        let bounds = outline.bounds().ok_or(ModelError::EmptyOutline("shim"))?;
        let p = self.p;
        let placed = DVec3::new(p.case_front_thickness, p.case_side_thickness, 0.0);

        let mut recipe = PartRecipe::new(PART_SHIM);
        for f in self.extrusion("Shim", outline, p.shim_thickness) {
            recipe.add_feature(f);
        }
        // Starts at the PCB edge and runs inwards, centred across the board
        let (min, size) = clear_faces(
            DVec3::new(anchor.x, anchor.y - p.usb_connector_width / 2.0, 0.0),
            DVec3::new(p.usb_connector_height, p.usb_connector_width, p.shim_thickness),
            placed + bounds.min.extend(0.0),
            placed + bounds.max.extend(p.shim_thickness),
        );
        recipe.add_feature(Feature::cuboid("Connector relief", min, size, BooleanOp::Cut));
        recipe.add_feature(Self::raise(self.d.shim_offset));
        Ok(recipe)
    }

    fn key(&self, outline: &Outline) -> Result<PartRecipe, ModelError> {
        if outline.is_empty() {
            return Err(ModelError::EmptyOutline("key"));
        }
        let mut recipe = PartRecipe::new(PART_KEY);
        for f in self.extrusion("Key", outline, self.p.key_thickness) {
            recipe.add_feature(f);
        }
        recipe.add_feature(Self::raise(self.d.key_offset));
        Ok(recipe)
    }

    /// Space for the PCB stack, minus the standoffs that stay in the case
    fn cavity(&self, outline: &Outline) -> Result<PartRecipe, ModelError> {
        let anchor = self.anchor("key", outline)?;
        let bounds = outline.bounds().ok_or(ModelError::EmptyOutline("key"))?;
        let (p, d) = (self.p, self.d);
        let cavity_min = DVec3::new(
            p.case_front_thickness + bounds.min.x,
            p.case_side_thickness + bounds.min.y,
            d.cutout_offset,
        );
        let cavity_max = DVec3::new(
            p.case_front_thickness + bounds.max.x,
            p.case_side_thickness + bounds.max.y,
            d.cutout_offset + d.cutout_thickness,
        );

        let mut recipe = PartRecipe::new(PART_CAVITY);
        for f in self.extrusion("Cavity", outline, d.cutout_thickness) {
            recipe.add_feature(f);
        }
        recipe.add_feature(Self::raise(d.cutout_offset));

        // Key standoffs hang down from the cavity's far face
        for (i, s) in p.standoffs.iter().enumerate() {
            let (min, size) = clear_faces(
                DVec3::new(
                    anchor.x + s.x - s.width / 2.0,
                    anchor.y - s.height / 2.0,
                    cavity_max.z - p.bottom_standoff_thickness,
                ),
                DVec3::new(s.width, s.height, p.bottom_standoff_thickness),
                cavity_min,
                cavity_max,
            );
            recipe.add_feature(Feature::cuboid(
                format!("Key standoff {}", i + 1),
                min,
                size,
                BooleanOp::Cut,
            ));
        }

        // Fauxkey standoff rises from the cavity's near face
        let (min, size) = clear_faces(
            DVec3::new(
                anchor.x - p.usb_connector_width / 2.0,
                anchor.y - p.usb_connector_height / 2.0,
                d.cutout_offset,
            ),
            DVec3::new(
                p.usb_connector_width,
                p.usb_connector_height,
                p.fauxkey_component_thickness,
            ),
            cavity_min,
            cavity_max,
        );
        recipe.add_feature(Feature::cuboid("Fauxkey standoff", min, size, BooleanOp::Cut));
        Ok(recipe)
    }

    /// Solid body with the screw holes; hollowed per half after the split
    fn case(&self) -> PartRecipe {
        let (p, d) = (self.p, self.d);
        let center = DVec2::new(d.total_width / 2.0, d.total_height / 2.0);

        let mut recipe = PartRecipe::new(PART_CASE)
            .with(Feature::extrude(
                "Body",
                vec![Profile2D::rounded_rectangle(
                    center,
                    d.total_width,
                    d.total_height,
                    p.case_fillet_radius,
                )],
                SketchPlane::xy(0.0),
                d.total_depth,
                BooleanOp::New,
            ))
            .with(
                Feature::extrude(
                    "Nut pockets",
                    d.screw_positions
                        .iter()
                        .map(|c| Profile2D::regular_polygon(*c, 6, p.nut_diameter))
                        .collect(),
                    SketchPlane::xy(p.nut_depth),
                    p.nut_height,
                    BooleanOp::Cut,
                )
                .suppressed(!p.use_nut),
            );

        // With nuts the thread ends inside the pocket, not on its floor
        let depth = if p.use_nut {
            d.screw_depth - p.nut_height / 2.0
        } else {
            d.screw_depth
        };
        let hole = countersink_profile(
            p.screw_thread_diameter,
            p.screw_head_diameter,
            p.countersink_angle,
            depth,
            CUT_OVERSHOOT,
        );
        for (i, c) in d.screw_positions.iter().enumerate() {
            // Local Y points up, so the profile hangs below the top face
            let plane = SketchPlane::new(DVec3::new(c.x, c.y, d.total_depth), DVec3::X, DVec3::NEG_Y);
            recipe.add_feature(Feature::revolve(
                format!("Screw hole {}", i + 1),
                hole.clone(),
                plane,
                std::f64::consts::TAU,
                BooleanOp::Cut,
            ));
        }
        recipe
    }

    /// Boundary of the alignment tongue, inset from the outer case edge
    fn inset_boundary(&self) -> Profile2D {
        let (p, d) = (self.p, self.d);
        let inset = p.case_inset_thickness * 2.0;
        Profile2D::rounded_rectangle(
            DVec2::new(d.total_width / 2.0, d.total_height / 2.0),
            d.total_width - inset,
            d.total_height - inset,
            p.inset_corner_radius,
        )
    }

    /// Ring between the inset boundary and a copy of the outer case edge
    /// grown past it
    fn alignment_ring(&self) -> Profile2D {
        let (p, d) = (self.p, self.d);
        let m = CUT_OVERSHOOT;
        Profile2D::ring(
            Profile2D::rounded_rectangle(
                DVec2::new(d.total_width / 2.0, d.total_height / 2.0),
                d.total_width + 2.0 * m,
                d.total_height + 2.0 * m,
                p.case_fillet_radius + m,
            ),
            self.inset_boundary(),
        )
    }

    /// Rounded cable slot cut through the front wall
    fn cable_cutout(&self) -> Feature {
        let p = self.p;
        let m = CUT_OVERSHOOT;
        // Local X runs along -Y and local Y along -Z; the slot is symmetric
        let plane = SketchPlane::new(self.d.usb_cutout_origin, DVec3::NEG_Y, DVec3::X).offset(-m);
        Feature::extrude(
            "Cable cutout",
            vec![Profile2D::rounded_rectangle(
                DVec2::ZERO,
                p.usb_cutout_width,
                p.usb_cutout_height,
                p.usb_cutout_radius,
            )],
            plane,
            p.case_front_thickness + 2.0 * m,
            BooleanOp::Cut,
        )
    }

    fn hollow_out() -> Feature {
        Feature::combine("Hollow out", PART_CAVITY, BooleanOp::Cut)
    }

    fn top(&self) -> PartRecipe {
        let d = self.d;
        let m = SPLIT_MARGIN;
        let o = CUT_OVERSHOOT;
        PartRecipe::derived(PART_TOP, PART_CASE)
            .with(Feature::cuboid(
                "Keep above split",
                DVec3::new(-m, -m, d.split_height),
                DVec3::new(
                    d.total_width + 2.0 * m,
                    d.total_height + 2.0 * m,
                    d.total_depth - d.split_height + m,
                ),
                BooleanOp::Intersect,
            ))
            .with(Self::hollow_out())
            .with(Feature::extrude(
                "Alignment groove",
                vec![self.alignment_ring()],
                SketchPlane::xy(d.split_height - o),
                self.p.case_inset_depth + o,
                BooleanOp::Cut,
            ))
            .with(self.cable_cutout())
    }

    fn bottom(&self) -> PartRecipe {
        let d = self.d;
        let m = SPLIT_MARGIN;
        let o = CUT_OVERSHOOT;
        let tongue_top = d.split_height + self.p.case_inset_depth;
        PartRecipe::derived(PART_BOTTOM, PART_CASE)
            .with(Feature::cuboid(
                "Keep below tongue",
                DVec3::new(-m, -m, -m),
                DVec3::new(d.total_width + 2.0 * m, d.total_height + 2.0 * m, tongue_top + m),
                BooleanOp::Intersect,
            ))
            .with(Self::hollow_out())
            // Everything above the split inside the inset boundary goes,
            // leaving the tongue as a lip along the outer edge
            .with(Feature::extrude(
                "Alignment tongue",
                vec![self.inset_boundary()],
                SketchPlane::xy(d.split_height),
                self.p.case_inset_depth + o,
                BooleanOp::Cut,
            ))
            .with(self.cable_cutout())
    }
}

/// Grow a cut box past every face of `body_min..body_max` that it lies flush
/// with, so the cut opens cleanly instead of leaving a zero-thickness skin
fn clear_faces(min: DVec3, size: DVec3, body_min: DVec3, body_max: DVec3) -> (DVec3, DVec3) {
    const EPS: f64 = 1e-9;
    let mut lo = min;
    let mut hi = min + size;
    for i in 0..3 {
        if lo[i] <= body_min[i] + EPS {
            lo[i] = lo[i].min(body_min[i] - CUT_OVERSHOOT);
        }
        if hi[i] >= body_max[i] - EPS {
            hi[i] = hi[i].max(body_max[i] + CUT_OVERSHOOT);
        }
    }
    (lo, hi - lo)
}

/// Half cross-section of a countersunk hole in (radius, height) coordinates
///
/// The head cone narrows from the surface at the included `angle` (degrees)
/// until it meets the thread, which continues down to `depth`. The head
/// diameter carries on `clearance` above the surface.
pub fn countersink_profile(
    thread_diameter: f64,
    head_diameter: f64,
    angle: f64,
    depth: f64,
    clearance: f64,
) -> Profile2D {
    let r = thread_diameter / 2.0;
    let head = head_diameter / 2.0;
    let cone_depth = ((head - r) / (angle.to_radians() / 2.0).tan()).min(depth);
    Profile2D::new(vec![
        DVec2::new(0.0, clearance),
        DVec2::new(head, clearance),
        DVec2::new(head, 0.0),
        DVec2::new(r, -cone_depth),
        DVec2::new(r, -depth),
        DVec2::new(0.0, -depth),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use jig_cad::{Bounds2, BooleanType, MockKernel};

    fn plan(params: &CaseParameters) -> CaseModel {
        let outlines = Outlines::rectangles(params.pcb_width, params.pcb_height);
        CaseModel::plan(params, &outlines).unwrap()
    }

    fn feature_names(recipe: &PartRecipe) -> Vec<&str> {
        recipe.features().map(|f| f.name()).collect()
    }

    fn find_box(recipe: &PartRecipe, name: &str) -> (DVec3, DVec3) {
        match recipe.find(name) {
            Some(Feature::Box { min, size, boolean_op, .. }) => {
                assert_eq!(*boolean_op, BooleanOp::Cut);
                (*min, *size)
            }
            other => panic!("expected box '{name}', got {other:?}"),
        }
    }

    fn find_extrude<'a>(recipe: &'a PartRecipe, name: &str) -> (&'a [Profile2D], SketchPlane, f64) {
        match recipe.find(name) {
            Some(Feature::Extrude {
                profiles, plane, distance, ..
            }) => (profiles.as_slice(), *plane, *distance),
            other => panic!("expected extrusion '{name}', got {other:?}"),
        }
    }

    #[test]
    fn test_recipe_order() {
        let model = plan(&CaseParameters::default());
        let names: Vec<&str> = model.recipes().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![PART_FAUXKEY, PART_SHIM, PART_KEY, PART_CAVITY, PART_CASE, PART_TOP, PART_BOTTOM]
        );

        assert_eq!(
            feature_names(model.recipe(PART_CASE).unwrap()),
            vec![
                "Body",
                "Nut pockets",
                "Screw hole 1",
                "Screw hole 2",
                "Screw hole 3",
                "Screw hole 4",
            ]
        );
        assert_eq!(
            feature_names(model.recipe(PART_TOP).unwrap()),
            vec!["Keep above split", "Hollow out", "Alignment groove", "Cable cutout"]
        );
        assert_eq!(
            feature_names(model.recipe(PART_BOTTOM).unwrap()),
            vec!["Keep below tongue", "Hollow out", "Alignment tongue", "Cable cutout"]
        );
    }

    #[test]
    fn test_nut_pockets_follow_use_nut() {
        let without = plan(&CaseParameters::default());
        assert!(without.recipe(PART_CASE).unwrap().find("Nut pockets").unwrap().is_suppressed());

        let with = plan(&CaseParameters {
            use_nut: true,
            ..Default::default()
        });
        let case = with.recipe(PART_CASE).unwrap();
        assert!(!case.find("Nut pockets").unwrap().is_suppressed());
        let (profiles, plane, distance) = find_extrude(case, "Nut pockets");
        assert_eq!(profiles.len(), 4);
        assert_eq!(profiles[0].outer.len(), 6);
        assert_relative_eq!(plane.origin.z, 0.6);
        assert_relative_eq!(distance, 2.6);

        // The thread stops half way into the pocket
        let Some(Feature::Revolve { profile, .. }) = case.find("Screw hole 1") else {
            panic!("missing screw hole");
        };
        let bottom = profile.outer.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        assert_relative_eq!(bottom, -(14.6 - 1.3), epsilon = 1e-9);
    }

    #[test]
    fn test_standoffs_open_onto_cavity_faces() {
        let model = plan(&CaseParameters::default());
        let cavity = model.recipe(PART_CAVITY).unwrap();
        let o = CUT_OVERSHOOT;

        // Rectangle outline: standoff 1 is flush with the front, both sides
        // and the far face of the cavity (x 1.6..60.1, y 3.6..29.9, z 1.8..13.6)
        let (min, size) = find_box(cavity, "Key standoff 1");
        assert_relative_eq!(min.x, 1.6 - o, epsilon = 1e-9);
        assert_relative_eq!(min.y, 3.6 - o, epsilon = 1e-9);
        assert_relative_eq!(min.z, 10.6, epsilon = 1e-9);
        assert_relative_eq!(size.x, 9.0 + o, epsilon = 1e-9);
        assert_relative_eq!(size.y, 26.3 + 2.0 * o, epsilon = 1e-9);
        assert_relative_eq!(min.z + size.z, 13.6 + o, epsilon = 1e-9);

        // Standoff 2 only touches the far face
        let (min, size) = find_box(cavity, "Key standoff 2");
        assert_relative_eq!(min.x, 1.6 + 16.5 - 2.0, epsilon = 1e-9);
        assert_relative_eq!(min.y, 16.75 - 5.0, epsilon = 1e-9);
        assert_relative_eq!(size.x, 4.0, epsilon = 1e-9);
        assert_relative_eq!(size.z, 3.0 + o, epsilon = 1e-9);

        let (min, size) = find_box(cavity, "Key standoff 3");
        assert_relative_eq!(min.x + size.x, 60.1 + o, epsilon = 1e-9);

        // Fauxkey standoff already runs past the front face
        let (min, size) = find_box(cavity, "Fauxkey standoff");
        assert_relative_eq!(min.x, 1.6 - 5.0, epsilon = 1e-9);
        assert_relative_eq!(min.y, 16.75 - 4.5, epsilon = 1e-9);
        assert_relative_eq!(min.z, 1.8 - o, epsilon = 1e-9);
        assert_relative_eq!(min.z + size.z, 5.4, epsilon = 1e-9);
    }

    #[test]
    fn test_shim_relief() {
        let model = plan(&CaseParameters::default());
        let shim = model.recipe(PART_SHIM).unwrap();
        let o = CUT_OVERSHOOT;

        // Starts at the anchor x, centred on the anchor y, through the whole shim
        let (min, size) = find_box(shim, "Connector relief");
        assert_relative_eq!(min.x, 1.6 - o, epsilon = 1e-9);
        assert_relative_eq!(min.x + size.x, 1.6 + 9.0, epsilon = 1e-9);
        assert_relative_eq!(min.y + size.y / 2.0, 16.75, epsilon = 1e-9);
        assert_relative_eq!(size.y, 10.0, epsilon = 1e-9);
        assert_relative_eq!(min.z, -o, epsilon = 1e-9);
        assert_relative_eq!(size.z, 3.4 + 2.0 * o, epsilon = 1e-9);
    }

    #[test]
    fn test_cable_cutout_plane() {
        let model = plan(&CaseParameters::default());
        let o = CUT_OVERSHOOT;
        for part in [PART_TOP, PART_BOTTOM] {
            let (profiles, plane, distance) = find_extrude(model.recipe(part).unwrap(), "Cable cutout");
            let normal = plane.normal();
            assert_relative_eq!(normal.x, 1.0, epsilon = 1e-12);
            // Front wall runs from x = 0 to 1.6; the cut starts and ends outside it
            assert_relative_eq!(plane.origin.x, -o, epsilon = 1e-12);
            assert_relative_eq!(plane.origin.y, 26.3 / 2.0 + 3.6, epsilon = 1e-9);
            assert_relative_eq!(plane.origin.z, 7.6, epsilon = 1e-9);
            assert_relative_eq!(distance, 1.6 + 2.0 * o, epsilon = 1e-9);

            let slot = profiles[0].bounds().unwrap();
            assert_relative_eq!(slot.width(), 8.5, epsilon = 1e-9);
            assert_relative_eq!(slot.height(), 2.8, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_alignment_groove_and_tongue() {
        let model = plan(&CaseParameters::default());
        let o = CUT_OVERSHOOT;
        let inner_w = 61.7 - 2.0 * 0.8;
        let inner_h = 33.5 - 2.0 * 0.8;

        let (profiles, plane, distance) = find_extrude(model.recipe(PART_TOP).unwrap(), "Alignment groove");
        let ring = &profiles[0];
        let inner = Bounds2::from_points(&ring.holes[0]).unwrap();
        assert_relative_eq!(inner.width(), inner_w, epsilon = 1e-9);
        assert_relative_eq!(inner.height(), inner_h, epsilon = 1e-9);
        let outer = ring.bounds().unwrap();
        assert_relative_eq!(outer.width(), 61.7 + 2.0 * o, epsilon = 1e-9);
        assert_relative_eq!(outer.center().y, 33.5 / 2.0, epsilon = 1e-9);
        // Starts below the top half's lower face and stops at the groove roof
        assert_relative_eq!(plane.origin.z, 6.4 - o, epsilon = 1e-9);
        assert_relative_eq!(plane.origin.z + distance, 6.4 + 1.2, epsilon = 1e-9);

        let (profiles, plane, distance) = find_extrude(model.recipe(PART_BOTTOM).unwrap(), "Alignment tongue");
        let cut = profiles[0].bounds().unwrap();
        assert!(profiles[0].holes.is_empty());
        assert_relative_eq!(cut.width(), inner_w, epsilon = 1e-9);
        assert_relative_eq!(cut.height(), inner_h, epsilon = 1e-9);
        assert_relative_eq!(plane.origin.z, 6.4, epsilon = 1e-9);
        assert_relative_eq!(plane.origin.z + distance, 6.4 + 1.2 + o, epsilon = 1e-9);
    }

    #[test]
    fn test_countersink_plane() {
        let model = plan(&CaseParameters::default());
        let case = model.recipe(PART_CASE).unwrap();
        let Some(Feature::Revolve { plane, angle, boolean_op, .. }) = case.find("Screw hole 1") else {
            panic!("missing screw hole");
        };
        assert_eq!(*boolean_op, BooleanOp::Cut);
        assert_relative_eq!(*angle, std::f64::consts::TAU);
        assert_relative_eq!(plane.origin.z, 15.2, epsilon = 1e-9);
        // Revolve axis is the plane's Y, pointing up out of the top face
        assert_relative_eq!(plane.y_axis.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.normal().y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clear_faces() {
        let body_min = DVec3::ZERO;
        let body_max = DVec3::new(10.0, 10.0, 5.0);
        let o = CUT_OVERSHOOT;

        // Flush with x min and z max only
        let (min, size) = clear_faces(DVec3::new(0.0, 2.0, 3.0), DVec3::new(4.0, 3.0, 2.0), body_min, body_max);
        assert_relative_eq!(min.x, -o);
        assert_relative_eq!(min.y, 2.0);
        assert_relative_eq!(min.z, 3.0);
        assert_relative_eq!(min.x + size.x, 4.0);
        assert_relative_eq!(min.y + size.y, 5.0);
        assert_relative_eq!(min.z + size.z, 5.0 + o);

        // Already past the face: left alone
        let (min, _) = clear_faces(DVec3::new(-3.0, 2.0, 1.0), DVec3::ONE, body_min, body_max);
        assert_relative_eq!(min.x, -3.0);
    }

    #[test]
    fn test_build_with_mock_kernel() {
        let kernel = MockKernel::new();
        let model = plan(&CaseParameters::default());
        let built = model.build(&kernel).unwrap();

        let bounds = |name: &str| kernel.bounds(&built.part(name).unwrap().solid).unwrap();

        let top = bounds(PART_TOP);
        assert_relative_eq!(top.min.z, 6.4, epsilon = 1e-9);
        assert_relative_eq!(top.max.z, 15.2, epsilon = 1e-9);
        assert_relative_eq!(top.max.x, 61.7, epsilon = 1e-9);

        let bottom = bounds(PART_BOTTOM);
        assert_relative_eq!(bottom.min.z, 0.0, epsilon = 1e-9);
        // The tongue stands proud of the split plane
        assert_relative_eq!(bottom.max.z, 7.6, epsilon = 1e-9);

        let fauxkey = bounds(PART_FAUXKEY);
        assert_relative_eq!(fauxkey.min.z, 5.4, epsilon = 1e-9);
        assert_relative_eq!(fauxkey.max.z, 6.2, epsilon = 1e-9);
        assert_relative_eq!(fauxkey.min.x, 1.6, epsilon = 1e-9);
        assert_relative_eq!(fauxkey.min.y, 3.6, epsilon = 1e-9);

        let shim = bounds(PART_SHIM);
        assert_relative_eq!(shim.min.z, 6.2, epsilon = 1e-9);
        assert_relative_eq!(shim.max.z, 9.6, epsilon = 1e-9);

        let key = bounds(PART_KEY);
        assert_relative_eq!(key.min.z, 9.6, epsilon = 1e-9);
        assert_relative_eq!(key.max.z, 10.6, epsilon = 1e-9);

        // Cavity: 3 standoffs + fauxkey standoff; shim: relief; case: 4 holes;
        // each half: cavity, groove or tongue, cable cutout
        assert_eq!(kernel.boolean_count(BooleanType::Subtract), 4 + 1 + 4 + 3 + 3);
        assert_eq!(kernel.boolean_count(BooleanType::Intersect), 2);
        assert_eq!(kernel.boolean_count(BooleanType::Union), 0);
        assert_eq!(built.output_parts().count(), 5);
    }

    #[test]
    fn test_nut_pockets_add_cuts() {
        let kernel = MockKernel::new();
        let model = plan(&CaseParameters {
            use_nut: true,
            ..Default::default()
        });
        model.build(&kernel).unwrap();
        assert_eq!(kernel.boolean_count(BooleanType::Subtract), 15 + 4);
    }

    #[test]
    fn test_build_with_truck_kernel() {
        let kernel = jig_cad::TruckKernel::new();
        let model = plan(&CaseParameters::default());
        let built = model.build(&kernel).unwrap();

        for (part, _) in built.output_parts() {
            let mesh = kernel.tessellate(&part.solid, DEFAULT_TESSELLATION_TOLERANCE).unwrap();
            assert!(!mesh.is_empty(), "{} tessellated to nothing", part.name);
            for v in &mesh.vertices {
                assert!(v[0] >= -1e-3 && v[0] <= 61.7 + 1e-3, "{} spills out: {v:?}", part.name);
                assert!(v[2] >= -1e-3 && v[2] <= 15.2 + 1e-3, "{} spills out: {v:?}", part.name);
            }
        }
    }

    #[test]
    fn test_countersink_profile() {
        let profile = countersink_profile(3.0, 5.8, 82.0, 14.6, 0.5);
        let cone_depth = 1.4 / 41f64.to_radians().tan();
        assert_relative_eq!(profile.outer[0].y, 0.5);
        assert_relative_eq!(profile.outer[1].x, 2.9);
        assert_relative_eq!(profile.outer[2].y, 0.0);
        assert_relative_eq!(profile.outer[3].y, -cone_depth, epsilon = 1e-12);
        assert_relative_eq!(profile.outer[4].y, -14.6);
        assert!(profile.outer.iter().all(|p| p.x >= 0.0));
    }

    #[test]
    fn test_empty_outline_is_rejected() {
        let params = CaseParameters::default();
        let mut outlines = Outlines::rectangles(params.pcb_width, params.pcb_height);
        outlines.key = Outline::default();
        assert!(matches!(
            CaseModel::plan(&params, &outlines),
            Err(ModelError::EmptyOutline(_))
        ));
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let params = CaseParameters {
            pcb_width: -1.0,
            ..Default::default()
        };
        let outlines = Outlines::rectangles(58.5, 26.3);
        assert!(matches!(
            CaseModel::plan(&params, &outlines),
            Err(ModelError::Param(_))
        ));
    }
}
