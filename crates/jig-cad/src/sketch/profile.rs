//! Closed 2D profiles

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Largest angle (radians) spanned by one segment when flattening arcs (10°)
pub const ARC_SEGMENT_ANGLE: f64 = std::f64::consts::PI / 18.0;

/// Points closer than this are merged when building profiles
const POINT_EPSILON: f64 = 1e-9;

/// Axis-aligned 2D bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds2 {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds2 {
    /// Bounding box of a point set, `None` when empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(
            Self {
                min: first,
                max: first,
            },
            |b, p| Self {
                min: b.min.min(*p),
                max: b.max.max(*p),
            },
        ))
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

/// A closed profile: one outer boundary and any number of holes
///
/// Boundaries are implicit polygons; the last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile2D {
    /// Outer boundary
    pub outer: Vec<DVec2>,
    /// Inner boundaries cut out of the outer one
    #[serde(default)]
    pub holes: Vec<Vec<DVec2>>,
}

impl Profile2D {
    /// Create a profile without holes
    pub fn new(outer: Vec<DVec2>) -> Self {
        Self {
            outer: dedup_loop(outer),
            holes: Vec::new(),
        }
    }

    /// Create a profile with holes
    pub fn with_holes(outer: Vec<DVec2>, holes: Vec<Vec<DVec2>>) -> Self {
        Self {
            outer: dedup_loop(outer),
            holes: holes.into_iter().map(dedup_loop).collect(),
        }
    }

    /// Rectangle centred on `center`
    pub fn rectangle(center: DVec2, width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::new(vec![
            center + DVec2::new(-hw, -hh),
            center + DVec2::new(hw, -hh),
            center + DVec2::new(hw, hh),
            center + DVec2::new(-hw, hh),
        ])
    }

    /// Rectangle with rounded corners. The radius is clamped to half the shorter side.
    pub fn rounded_rectangle(center: DVec2, width: f64, height: f64, radius: f64) -> Self {
        let radius = radius.min(width / 2.0).min(height / 2.0);
        if radius <= POINT_EPSILON {
            return Self::rectangle(center, width, height);
        }

        let hw = width / 2.0 - radius;
        let hh = height / 2.0 - radius;
        let quarter = std::f64::consts::FRAC_PI_2;
        let corners = [
            (DVec2::new(hw, -hh), -quarter),
            (DVec2::new(hw, hh), 0.0),
            (DVec2::new(-hw, hh), quarter),
            (DVec2::new(-hw, -hh), 2.0 * quarter),
        ];

        let points = corners
            .iter()
            .flat_map(|(offset, start)| arc_points(center + *offset, radius, *start, quarter))
            .collect();
        Self::new(points)
    }

    /// Regular polygon inscribed in a circle of the given diameter, first vertex on +X
    pub fn regular_polygon(center: DVec2, sides: u32, diameter: f64) -> Self {
        let sides = sides.max(3);
        let radius = diameter / 2.0;
        let points = (0..sides)
            .map(|i| {
                let angle = (i as f64 / sides as f64) * std::f64::consts::TAU;
                center + DVec2::new(angle.cos(), angle.sin()) * radius
            })
            .collect();
        Self::new(points)
    }

    /// Circle approximated by a polygon
    pub fn circle(center: DVec2, radius: f64) -> Self {
        let sides = (std::f64::consts::TAU / ARC_SEGMENT_ANGLE - 1e-9).ceil() as u32;
        Self::regular_polygon(center, sides, radius * 2.0)
    }

    /// The area between two profiles: `outer` keeps its boundary and `inner`'s
    /// boundary becomes a hole
    pub fn ring(outer: Profile2D, inner: Profile2D) -> Self {
        Self::with_holes(outer.outer, vec![inner.outer])
    }

    /// Enclosed area (outer minus holes)
    pub fn area(&self) -> f64 {
        signed_area(&self.outer).abs() - self.holes.iter().map(|h| signed_area(h).abs()).sum::<f64>()
    }

    /// Bounding box of the outer boundary
    pub fn bounds(&self) -> Option<Bounds2> {
        Bounds2::from_points(&self.outer)
    }

    /// Whether the outer boundary is wound counter-clockwise
    pub fn is_ccw(&self) -> bool {
        signed_area(&self.outer) > 0.0
    }

    /// Copy with the outer boundary counter-clockwise and holes clockwise
    pub fn normalized(&self) -> Self {
        let mut outer = self.outer.clone();
        if signed_area(&outer) < 0.0 {
            outer.reverse();
        }
        let holes = self
            .holes
            .iter()
            .map(|h| {
                let mut h = h.clone();
                if signed_area(&h) > 0.0 {
                    h.reverse();
                }
                h
            })
            .collect();
        Self { outer, holes }
    }

    /// Copy moved by `offset`
    pub fn translated(&self, offset: DVec2) -> Self {
        Self {
            outer: self.outer.iter().map(|p| *p + offset).collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().map(|p| *p + offset).collect())
                .collect(),
        }
    }
}

/// Shoelace area, positive for counter-clockwise loops
pub fn signed_area(points: &[DVec2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

/// Even-odd point in polygon test
pub fn point_in_polygon(polygon: &[DVec2], p: DVec2) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Points along an arc, both ends included
///
/// `sweep` is signed (positive = counter-clockwise). Each segment spans at most
/// [`ARC_SEGMENT_ANGLE`].
pub fn arc_points(center: DVec2, radius: f64, start_angle: f64, sweep: f64) -> Vec<DVec2> {
    let segments = ((sweep.abs() / ARC_SEGMENT_ANGLE - 1e-9).ceil() as usize).max(1);
    (0..=segments)
        .map(|i| {
            let angle = start_angle + sweep * (i as f64 / segments as f64);
            center + DVec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

/// Drop consecutive duplicates, including a closing point equal to the first
fn dedup_loop(mut points: Vec<DVec2>) -> Vec<DVec2> {
    points.dedup_by(|a, b| a.distance_squared(*b) < POINT_EPSILON * POINT_EPSILON);
    while points.len() > 1
        && points[0].distance_squared(points[points.len() - 1]) < POINT_EPSILON * POINT_EPSILON
    {
        points.pop();
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_area_and_bounds() {
        let rect = Profile2D::rectangle(DVec2::new(1.0, 2.0), 4.0, 2.0);
        assert_eq!(rect.outer.len(), 4);
        assert!(rect.is_ccw());
        assert_relative_eq!(rect.area(), 8.0);

        let bounds = rect.bounds().unwrap();
        assert_relative_eq!(bounds.min.x, -1.0);
        assert_relative_eq!(bounds.max.y, 3.0);
        assert_relative_eq!(bounds.center().x, 1.0);
    }

    #[test]
    fn test_rounded_rectangle_area() {
        let r = 1.6;
        let profile = Profile2D::rounded_rectangle(DVec2::ZERO, 61.7, 33.5, r);
        let exact = 61.7 * 33.5 - (4.0 - std::f64::consts::PI) * r * r;
        // Flattened arcs cut slightly inside the true corners
        assert!(profile.area() < exact);
        assert_relative_eq!(profile.area(), exact, epsilon = 0.05);

        let bounds = profile.bounds().unwrap();
        assert_relative_eq!(bounds.width(), 61.7, epsilon = 1e-9);
        assert_relative_eq!(bounds.height(), 33.5, epsilon = 1e-9);
        assert!(profile.is_ccw());
    }

    #[test]
    fn test_rounded_rectangle_clamps_radius() {
        // 2.8 tall with radius 5 becomes a stadium of radius 1.4
        let profile = Profile2D::rounded_rectangle(DVec2::ZERO, 8.5, 2.8, 5.0);
        let r: f64 = 1.4;
        let exact = 8.5 * 2.8 - (4.0 - std::f64::consts::PI) * r * r;
        assert_relative_eq!(profile.area(), exact, epsilon = 0.05);

        // No duplicated points where the arcs meet
        for w in profile.outer.windows(2) {
            assert!(w[0].distance(w[1]) > 1e-6);
        }
    }

    #[test]
    fn test_zero_radius_is_plain_rectangle() {
        let profile = Profile2D::rounded_rectangle(DVec2::ZERO, 2.0, 2.0, 0.0);
        assert_eq!(profile.outer.len(), 4);
    }

    #[test]
    fn test_hexagon() {
        let hex = Profile2D::regular_polygon(DVec2::ZERO, 6, 6.3);
        assert_eq!(hex.outer.len(), 6);
        assert_relative_eq!(hex.outer[0].x, 3.15);
        assert_relative_eq!(hex.outer[0].y, 0.0);
        // Area of a regular hexagon with circumradius R: 3√3/2 R²
        let radius: f64 = 3.15;
        assert_relative_eq!(hex.area(), 1.5 * 3f64.sqrt() * radius * radius, epsilon = 1e-9);
    }

    #[test]
    fn test_ring_normalization() {
        let outer = Profile2D::rounded_rectangle(DVec2::ZERO, 10.0, 6.0, 1.6);
        let mut inner = Profile2D::rounded_rectangle(DVec2::ZERO, 8.4, 4.4, 0.8);
        inner.outer.reverse();
        let ring = Profile2D::ring(outer, inner).normalized();

        assert!(ring.is_ccw());
        assert_eq!(ring.holes.len(), 1);
        assert!(signed_area(&ring.holes[0]) < 0.0);
        assert!(ring.area() > 0.0);

        assert!(point_in_polygon(&ring.outer, DVec2::new(4.6, 0.0)));
        assert!(point_in_polygon(&ring.holes[0], DVec2::ZERO));
    }

    #[test]
    fn test_translated() {
        let p = Profile2D::rectangle(DVec2::ZERO, 2.0, 2.0).translated(DVec2::new(3.0, 4.0));
        let b = p.bounds().unwrap();
        assert_relative_eq!(b.center().x, 3.0);
        assert_relative_eq!(b.center().y, 4.0);
    }

    #[test]
    fn test_arc_points_spacing() {
        let pts = arc_points(DVec2::ZERO, 2.0, 0.0, std::f64::consts::PI);
        assert_eq!(pts.len(), 19);
        assert_relative_eq!(pts[18].x, -2.0, epsilon = 1e-12);
    }
}
