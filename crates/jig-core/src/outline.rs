//! Board outlines imported from DXF drawings
//!
//! LINE, ARC, CIRCLE, LWPOLYLINE and POLYLINE entities are flattened into
//! point paths, chained end to end into closed loops, and grouped into
//! profiles by containment (even nesting depth = boundary, odd = hole).

use std::io::BufReader;
use std::path::{Path, PathBuf};

use dxf::Drawing;
use dxf::entities::EntityType;
use glam::DVec2;
use jig_cad::sketch::{Bounds2, Profile2D, arc_points, point_in_polygon, signed_area};

use crate::constants::{
    FAUXKEY_OUTLINE_FILE, KEY_OUTLINE_FILE, OUTLINE_JOIN_TOLERANCE, SHIM_OUTLINE_FILE,
};

/// Outline import errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum OutlineError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("DXF error: {0}")]
    Dxf(String),
    #[error("Outline is not closed near ({x:.3}, {y:.3})")]
    OpenLoop { x: f64, y: f64 },
    #[error("Outline contains no closed loops")]
    Empty,
}

/// A flattened drawing entity
#[derive(Debug, Clone, PartialEq)]
pub struct Path2D {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

impl Path2D {
    pub fn open(points: Vec<DVec2>) -> Self {
        Self {
            points,
            closed: false,
        }
    }

    pub fn closed(points: Vec<DVec2>) -> Self {
        Self {
            points,
            closed: true,
        }
    }
}

/// Closed profiles of one board
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub profiles: Vec<Profile2D>,
}

impl Outline {
    pub fn from_profiles(profiles: Vec<Profile2D>) -> Self {
        Self { profiles }
    }

    /// Rectangle with its lower-left corner at the origin
    pub fn rectangle(width: f64, height: f64) -> Self {
        Self::from_profiles(vec![Profile2D::rectangle(
            DVec2::new(width / 2.0, height / 2.0),
            width,
            height,
        )])
    }

    /// Load an outline from a DXF file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OutlineError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| OutlineError::Io(format!("{}: {}", path.display(), e)))?;
        let drawing = Drawing::load(&mut BufReader::new(file))
            .map_err(|e| OutlineError::Dxf(format!("{}: {}", path.display(), e)))?;

        let outline = Self::from_drawing(&drawing)?;
        tracing::debug!(
            path = %path.display(),
            profiles = outline.profiles.len(),
            "loaded outline"
        );
        Ok(outline)
    }

    /// Build an outline from the entities of a drawing
    pub fn from_drawing(drawing: &Drawing) -> Result<Self, OutlineError> {
        Self::from_paths(paths_from_drawing(drawing))
    }

    /// Chain paths into loops and group them into profiles
    pub fn from_paths(paths: Vec<Path2D>) -> Result<Self, OutlineError> {
        let scale = paths
            .iter()
            .flat_map(|p| p.points.iter())
            .fold(1.0_f64, |m, p| m.max(p.x.abs()).max(p.y.abs()));
        let loops = chain_loops(paths, OUTLINE_JOIN_TOLERANCE * scale)?;
        if loops.is_empty() {
            return Err(OutlineError::Empty);
        }
        Ok(Self::from_profiles(classify_loops(loops)))
    }

    /// Bounding box of all outer boundaries
    pub fn bounds(&self) -> Option<Bounds2> {
        self.profiles
            .iter()
            .filter_map(|p| p.bounds())
            .reduce(|a, b| a.union(&b))
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

/// The three board outlines a jig is built around
#[derive(Debug, Clone, PartialEq)]
pub struct Outlines {
    pub key: Outline,
    pub shim: Outline,
    pub fauxkey: Outline,
}

impl Outlines {
    /// Load `pcb.dxf`, `shim.dxf` and `fauxkey.dxf` from a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, OutlineError> {
        let dir = dir.as_ref();
        let file = |name: &str| -> PathBuf { dir.join(name) };
        Ok(Self {
            key: Outline::load(file(KEY_OUTLINE_FILE))?,
            shim: Outline::load(file(SHIM_OUTLINE_FILE))?,
            fauxkey: Outline::load(file(FAUXKEY_OUTLINE_FILE))?,
        })
    }

    /// Plain PCB-sized rectangles for all three boards
    pub fn rectangles(pcb_width: f64, pcb_height: f64) -> Self {
        let board = Outline::rectangle(pcb_width, pcb_height);
        Self {
            key: board.clone(),
            shim: board.clone(),
            fauxkey: board,
        }
    }
}

/// Flatten the supported entities of a drawing
///
/// Arcs, circles and polylines are stored in their object coordinate
/// system. Only the two flat cases occur in board outlines: a +Z normal maps
/// straight to world XY, a -Z normal mirrors X.
pub fn paths_from_drawing(drawing: &Drawing) -> Vec<Path2D> {
    let mut paths = Vec::new();
    let mut skipped = 0usize;
    for entity in drawing.entities() {
        match &entity.specific {
            EntityType::Line(line) => paths.push(Path2D::open(vec![
                DVec2::new(line.p1.x, line.p1.y),
                DVec2::new(line.p2.x, line.p2.y),
            ])),
            EntityType::Arc(arc) => {
                let start = arc.start_angle.to_radians();
                let mut sweep = (arc.end_angle - arc.start_angle).to_radians();
                if sweep <= 0.0 {
                    sweep += std::f64::consts::TAU;
                }
                let center = DVec2::new(arc.center.x, arc.center.y);
                let points = arc_points(center, arc.radius, start, sweep);
                paths.push(Path2D::open(to_world(points, &arc.normal)));
            }
            EntityType::Circle(circle) => {
                let center = DVec2::new(circle.center.x, circle.center.y);
                let points = Profile2D::circle(center, circle.radius).outer;
                paths.push(Path2D::closed(to_world(points, &circle.normal)));
            }
            EntityType::LwPolyline(poly) => {
                let vertices: Vec<(DVec2, f64)> = poly
                    .vertices
                    .iter()
                    .map(|v| (DVec2::new(v.x, v.y), v.bulge))
                    .collect();
                let path = polyline_path(&vertices, poly.is_closed());
                paths.push(Path2D {
                    points: to_world(path.points, &poly.extrusion_direction),
                    closed: path.closed,
                });
            }
            EntityType::Polyline(poly) => {
                let vertices: Vec<(DVec2, f64)> = poly
                    .vertices()
                    .map(|v| (DVec2::new(v.location.x, v.location.y), v.bulge))
                    .collect();
                let path = polyline_path(&vertices, poly.is_closed());
                paths.push(Path2D {
                    points: to_world(path.points, &poly.normal),
                    closed: path.closed,
                });
            }
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, "ignored unsupported DXF entities");
    }
    paths
}

/// Map object coordinates of a flat entity to world XY
fn to_world(mut points: Vec<DVec2>, normal: &dxf::Vector) -> Vec<DVec2> {
    if normal.z < 0.0 {
        for p in &mut points {
            p.x = -p.x;
        }
    }
    points
}

/// Flatten a polyline whose vertices carry bulge values
pub fn polyline_path(vertices: &[(DVec2, f64)], closed: bool) -> Path2D {
    let n = vertices.len();
    let mut points = Vec::with_capacity(n);
    let segments = if closed { n } else { n.saturating_sub(1) };

    for i in 0..n {
        let (p, bulge) = vertices[i];
        if i < segments {
            let (next, _) = vertices[(i + 1) % n];
            points.extend(bulge_points(p, next, bulge));
        } else {
            points.push(p);
        }
    }

    Path2D { points, closed }
}

/// Points from `p1` along a bulged segment, excluding `p2`
///
/// The bulge is the tangent of a quarter of the included angle; positive
/// bulges turn counter-clockwise.
pub fn bulge_points(p1: DVec2, p2: DVec2, bulge: f64) -> Vec<DVec2> {
    let chord = p2 - p1;
    let length = chord.length();
    if bulge.abs() < 1e-9 || length < 1e-12 {
        return vec![p1];
    }

    let angle = 4.0 * bulge.atan();
    let half = angle / 2.0;
    let offset = length / 2.0 / half.tan();
    let center = (p1 + p2) / 2.0 + chord.perp().normalize() * offset;
    let radius = length / 2.0 / half.sin().abs();
    let start = (p1 - center).y.atan2((p1 - center).x);

    let mut points = arc_points(center, radius, start, angle);
    points.pop();
    points
}

/// Join open paths whose end points meet within `tolerance`
fn chain_loops(paths: Vec<Path2D>, tolerance: f64) -> Result<Vec<Vec<DVec2>>, OutlineError> {
    let (closed, mut open): (Vec<_>, Vec<_>) = paths
        .into_iter()
        .filter(|p| !p.points.is_empty())
        .partition(|p| p.closed);

    let mut loops: Vec<Vec<DVec2>> = closed.into_iter().map(|p| p.points).collect();
    let near = |a: DVec2, b: DVec2| a.distance(b) <= tolerance;

    while let Some(path) = open.pop() {
        let mut chain = path.points;
        loop {
            let (first, last) = (chain[0], chain[chain.len() - 1]);
            if chain.len() > 2 && near(first, last) {
                chain.pop();
                loops.push(chain);
                break;
            }

            let next = open.iter().position(|p| {
                near(p.points[0], last) || near(p.points[p.points.len() - 1], last)
            });
            let Some(index) = next else {
                return Err(OutlineError::OpenLoop {
                    x: last.x,
                    y: last.y,
                });
            };

            let mut points = open.swap_remove(index).points;
            if !near(points[0], last) {
                points.reverse();
            }
            chain.extend(points.into_iter().skip(1));
        }
    }

    Ok(loops
        .into_iter()
        .map(|l| Profile2D::new(l).outer)
        .filter(|l| l.len() >= 3 && signed_area(l).abs() > 1e-12)
        .collect())
}

/// Group loops into profiles by nesting depth
fn classify_loops(mut loops: Vec<Vec<DVec2>>) -> Vec<Profile2D> {
    loops.sort_by(|a, b| signed_area(b).abs().total_cmp(&signed_area(a).abs()));

    // Loops are sorted largest first, so containers always come earlier
    let parents: Vec<Vec<usize>> = (0..loops.len())
        .map(|i| {
            (0..i)
                .filter(|&j| point_in_polygon(&loops[j], loops[i][0]))
                .collect()
        })
        .collect();

    let mut profiles: Vec<(usize, Profile2D)> = Vec::new();
    for (i, containers) in parents.iter().enumerate() {
        if containers.len() % 2 == 0 {
            profiles.push((i, Profile2D::new(loops[i].clone())));
        } else if let Some(&parent) = containers.last()
            && let Some((_, profile)) = profiles.iter_mut().find(|(j, _)| *j == parent)
        {
            profile.holes.push(loops[i].clone());
        }
    }

    profiles.into_iter().map(|(_, p)| p.normalized()).collect()
}
