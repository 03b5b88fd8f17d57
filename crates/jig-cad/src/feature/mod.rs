//! Feature Operations
//!
//! Solid-building steps and how each one combines with the body built so far.

use std::collections::HashMap;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::{BooleanType, CadKernel, Solid};
use crate::sketch::{Profile2D, SketchPlane};

/// Errors raised while applying features
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error("Kernel error: {0}")]
    CadError(#[from] crate::kernel::CadError),

    #[error("{0}")]
    InvalidFeature(String),

    #[error("No feature named '{0}'")]
    FeatureNotFound(String),

    #[error("Feature '{name}' failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: Box<FeatureError>,
    },
}

pub type FeatureResult<T> = Result<T, FeatureError>;

/// How a feature's tool solid combines with the current body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BooleanOp {
    /// Replace the current body
    #[default]
    New,
    /// Union with the body
    Join,
    /// Subtract from the body
    Cut,
    /// Keep the overlap only
    Intersect,
}

impl From<BooleanOp> for Option<BooleanType> {
    fn from(op: BooleanOp) -> Self {
        match op {
            BooleanOp::New => None,
            BooleanOp::Join => Some(BooleanType::Union),
            BooleanOp::Cut => Some(BooleanType::Subtract),
            BooleanOp::Intersect => Some(BooleanType::Intersect),
        }
    }
}

/// A step that produces or modifies a solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Feature {
    /// Extrude profiles along their plane normal
    Extrude {
        name: String,
        /// Profiles extruded one by one and combined in order
        profiles: Vec<Profile2D>,
        /// Plane the profiles are placed on
        plane: SketchPlane,
        /// Extrusion distance; negative goes against the normal
        distance: f64,
        boolean_op: BooleanOp,
        #[serde(default)]
        suppressed: bool,
    },

    /// Revolve a profile around the plane's local Y axis
    Revolve {
        name: String,
        /// Profile in plane coordinates, on one side of the axis
        profile: Profile2D,
        /// Plane the profile is placed on
        plane: SketchPlane,
        /// Radians
        angle: f64,
        boolean_op: BooleanOp,
        #[serde(default)]
        suppressed: bool,
    },

    /// Axis-aligned box
    Box {
        name: String,
        /// Minimum corner
        min: DVec3,
        /// Extent along each axis
        size: DVec3,
        boolean_op: BooleanOp,
        #[serde(default)]
        suppressed: bool,
    },

    /// Combine with the solid of another, already built part
    Combine {
        name: String,
        /// Name of the part whose solid is the tool
        part: String,
        boolean_op: BooleanOp,
        #[serde(default)]
        suppressed: bool,
    },

    /// Move the current body
    Translate {
        name: String,
        /// Offset applied to the body
        offset: DVec3,
        #[serde(default)]
        suppressed: bool,
    },
}

impl Feature {
    pub fn name(&self) -> &str {
        match self {
            Feature::Extrude { name, .. }
            | Feature::Revolve { name, .. }
            | Feature::Box { name, .. }
            | Feature::Combine { name, .. }
            | Feature::Translate { name, .. } => name,
        }
    }

    /// Short label for logs
    pub fn type_name(&self) -> &'static str {
        match self {
            Feature::Extrude { .. } => "Extrude",
            Feature::Revolve { .. } => "Revolve",
            Feature::Box { .. } => "Box",
            Feature::Combine { .. } => "Combine",
            Feature::Translate { .. } => "Translate",
        }
    }

    /// Boolean operation, `None` for features that only move the body
    pub fn boolean_op(&self) -> Option<BooleanOp> {
        match self {
            Feature::Extrude { boolean_op, .. }
            | Feature::Revolve { boolean_op, .. }
            | Feature::Box { boolean_op, .. }
            | Feature::Combine { boolean_op, .. } => Some(*boolean_op),
            Feature::Translate { .. } => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        match self {
            Feature::Extrude { suppressed, .. }
            | Feature::Revolve { suppressed, .. }
            | Feature::Box { suppressed, .. }
            | Feature::Combine { suppressed, .. }
            | Feature::Translate { suppressed, .. } => *suppressed,
        }
    }

    /// Suppressed features are skipped when a recipe is built
    pub fn set_suppressed(&mut self, value: bool) {
        match self {
            Feature::Extrude { suppressed, .. }
            | Feature::Revolve { suppressed, .. }
            | Feature::Box { suppressed, .. }
            | Feature::Combine { suppressed, .. }
            | Feature::Translate { suppressed, .. } => *suppressed = value,
        }
    }

    /// Builder-style suppression
    pub fn suppressed(mut self, value: bool) -> Self {
        self.set_suppressed(value);
        self
    }

    /// Extrude several profiles with the same plane and distance
    pub fn extrude(
        name: impl Into<String>,
        profiles: Vec<Profile2D>,
        plane: SketchPlane,
        distance: f64,
        boolean_op: BooleanOp,
    ) -> Self {
        Feature::Extrude {
            name: name.into(),
            profiles,
            plane,
            distance,
            boolean_op,
            suppressed: false,
        }
    }

    pub fn revolve(
        name: impl Into<String>,
        profile: Profile2D,
        plane: SketchPlane,
        angle: f64,
        boolean_op: BooleanOp,
    ) -> Self {
        Feature::Revolve {
            name: name.into(),
            profile,
            plane,
            angle,
            boolean_op,
            suppressed: false,
        }
    }

    /// Axis-aligned box feature
    pub fn cuboid(name: impl Into<String>, min: DVec3, size: DVec3, boolean_op: BooleanOp) -> Self {
        Feature::Box {
            name: name.into(),
            min,
            size,
            boolean_op,
            suppressed: false,
        }
    }

    /// Create a feature combining with another part's solid
    pub fn combine(name: impl Into<String>, part: impl Into<String>, boolean_op: BooleanOp) -> Self {
        Feature::Combine {
            name: name.into(),
            part: part.into(),
            boolean_op,
            suppressed: false,
        }
    }

    /// Name of the other part this feature needs, if any
    pub fn required_part(&self) -> Option<&str> {
        match self {
            Feature::Combine { part, .. } => Some(part),
            _ => None,
        }
    }

    /// Create a new translate feature
    pub fn translate(name: impl Into<String>, offset: DVec3) -> Self {
        Feature::Translate {
            name: name.into(),
            offset,
            suppressed: false,
        }
    }

    /// Execute this feature against the current body
    ///
    /// `parts` holds the solids of parts built earlier, by name.
    pub fn execute(
        &self,
        kernel: &dyn CadKernel,
        body: Option<&Solid>,
        parts: &HashMap<String, Solid>,
    ) -> FeatureResult<Solid> {
        if self.is_suppressed() {
            return Err(FeatureError::InvalidFeature(
                "Suppressed features cannot be executed".into(),
            ));
        }

        match self {
            Feature::Extrude {
                profiles,
                plane,
                distance,
                boolean_op,
                ..
            } => {
                if profiles.is_empty() {
                    return Err(FeatureError::InvalidFeature(
                        "Extrusion has no profiles".into(),
                    ));
                }

                let mut current = body.cloned();
                for (i, profile) in profiles.iter().enumerate() {
                    let tool = kernel.extrude(profile, plane, *distance)?;
                    // Later profiles of a new body join the first one
                    let op = match boolean_op {
                        BooleanOp::New if i > 0 => BooleanOp::Join,
                        op => *op,
                    };
                    current = Some(combine(kernel, current.as_ref(), tool, op)?);
                }
                current.ok_or_else(|| FeatureError::InvalidFeature("Extrude produced nothing".into()))
            }

            Feature::Revolve {
                profile,
                plane,
                angle,
                boolean_op,
                ..
            } => {
                let tool = kernel.revolve(profile, plane, *angle)?;
                combine(kernel, body, tool, *boolean_op)
            }

            Feature::Box {
                min,
                size,
                boolean_op,
                ..
            } => {
                let tool = kernel.create_box(*min, *size)?;
                combine(kernel, body, tool, *boolean_op)
            }

            Feature::Combine {
                part, boolean_op, ..
            } => {
                let tool = parts
                    .get(part)
                    .cloned()
                    .ok_or_else(|| FeatureError::FeatureNotFound(format!("part '{part}'")))?;
                combine(kernel, body, tool, *boolean_op)
            }

            Feature::Translate { offset, .. } => {
                let body = body.ok_or_else(|| {
                    FeatureError::InvalidFeature("Nothing to translate".into())
                })?;
                Ok(kernel.translate(body, *offset)?)
            }
        }
    }
}

/// Apply a boolean op between the current body and a tool solid
fn combine(
    kernel: &dyn CadKernel,
    body: Option<&Solid>,
    tool: Solid,
    op: BooleanOp,
) -> FeatureResult<Solid> {
    match (Option::<BooleanType>::from(op), body) {
        (None, _) => Ok(tool),
        (Some(BooleanType::Union), None) => Ok(tool),
        (Some(kind), Some(body)) => Ok(kernel.boolean(body, &tool, kind)?),
        (Some(kind), None) => Err(FeatureError::InvalidFeature(format!(
            "{:?} needs an existing body",
            kind
        ))),
    }
}
