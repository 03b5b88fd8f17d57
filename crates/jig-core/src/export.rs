//! STL export of built parts
//!
//! Each output part is tessellated and written as a binary STL. A RON
//! manifest next to the meshes records the part styles and the derived
//! dimensions so a viewer can reassemble the jig.

use std::path::{Path, PathBuf};

use jig_cad::{CadError, CadKernel, TessellatedMesh};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TESSELLATION_TOLERANCE, MANIFEST_FILE};
use crate::dimensions::Dimensions;
use crate::display::PartColor;
use crate::model::BuiltModel;

/// Export options
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Output directory, created when missing
    pub output_dir: PathBuf,
    /// Tessellation tolerance in millimetres
    pub tolerance: f64,
    /// Also write parts that are hidden by default (key PCB, shim)
    pub include_hidden: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            tolerance: DEFAULT_TESSELLATION_TOLERANCE,
            include_hidden: false,
        }
    }
}

/// One exported part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    /// STL file name relative to the manifest
    pub file: String,
    pub color: PartColor,
    pub alpha: f32,
    pub visible: bool,
    pub triangles: usize,
}

/// Summary of an export run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub dimensions: Dimensions,
    pub parts: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let content = std::fs::read_to_string(path).map_err(|e| ExportError::Io(e.to_string()))?;
        ron::from_str(&content).map_err(|e| ExportError::Serialize(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let content = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ExportError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ExportError::Io(e.to_string()))
    }
}

/// Tessellate and write every output part, then the manifest
pub fn export_model(
    model: &BuiltModel,
    kernel: &dyn CadKernel,
    options: &ExportOptions,
) -> Result<Manifest, ExportError> {
    std::fs::create_dir_all(&options.output_dir).map_err(|e| ExportError::Io(e.to_string()))?;

    let mut entries = Vec::new();
    for (part, style) in model.output_parts() {
        if !style.visible && !options.include_hidden {
            tracing::debug!(part = %part.name, "skipping hidden part");
            continue;
        }

        let mesh = kernel.tessellate(&part.solid, options.tolerance)?;
        if mesh.is_empty() {
            return Err(ExportError::EmptyMesh(part.name.clone()));
        }

        let file = sanitize_filename(&part.name) + ".stl";
        let path = options.output_dir.join(&file);
        save_mesh_stl(&mesh, &path)?;
        tracing::info!(part = %part.name, path = %path.display(), triangles = mesh.triangle_count(), "wrote mesh");

        entries.push(ManifestEntry {
            name: part.name.clone(),
            file,
            color: style.color,
            alpha: style.alpha,
            visible: style.visible,
            triangles: mesh.triangle_count(),
        });
    }

    let manifest = Manifest {
        dimensions: model.dimensions.clone(),
        parts: entries,
    };
    manifest.save(options.output_dir.join(MANIFEST_FILE))?;
    Ok(manifest)
}

/// Write a mesh as binary STL, computing facet normals from the winding
pub fn save_mesh_stl(mesh: &TessellatedMesh, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let triangles: Vec<stl_io::Triangle> = mesh
        .triangles()
        .map(|[v0, v1, v2]| stl_io::Triangle {
            normal: stl_io::Normal::new(facet_normal(v0, v1, v2)),
            vertices: [
                stl_io::Vertex::new(v0),
                stl_io::Vertex::new(v1),
                stl_io::Vertex::new(v2),
            ],
        })
        .collect();

    let mut file = std::fs::File::create(path).map_err(|e| ExportError::Io(e.to_string()))?;
    stl_io::write_stl(&mut file, triangles.iter()).map_err(|e| ExportError::Stl(e.to_string()))
}

fn facet_normal(v0: [f32; 3], v1: [f32; 3], v2: [f32; 3]) -> [f32; 3] {
    let (a, b, c) = (
        glam::Vec3::from(v0),
        glam::Vec3::from(v1),
        glam::Vec3::from(v2),
    );
    let n = (b - a).cross(c - a);
    if n.length_squared() > 0.0 {
        n.normalize().into()
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Replace anything but alphanumerics, `_` and `-` with `_`
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Export-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("CAD error: {0}")]
    Cad(#[from] CadError),
    #[error("Tessellation of '{0}' produced no triangles")]
    EmptyMesh(String),
    #[error("STL write error: {0}")]
    Stl(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
}
