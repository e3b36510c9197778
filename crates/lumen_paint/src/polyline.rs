//! Polyline building
//!
//! A [`Polyline`] is a flat list of points assembled from lines, arcs, curves
//! and shape helpers. It is consumed by the tessellators and then dropped or
//! cleared for reuse.

use std::f32::consts::{PI, TAU};

use bitflags::bitflags;
use lumen_core::{Point, Rect};

/// Flatness tolerance for adaptive bezier subdivision
const CURVE_TOLERANCE: f32 = 1.25;

/// Maximum recursion depth of adaptive bezier subdivision
const CURVE_MAX_LEVEL: u32 = 10;

/// Maximum distance between a circle and its polygon approximation
const CIRCLE_MAX_ERROR: f32 = 0.3;

/// Unit circle sampled at 12 steps (30 degrees apart), y down
const CIRCLE_12: [Point; 12] = [
    Point::new(1.0, 0.0),
    Point::new(0.866_025_4, 0.5),
    Point::new(0.5, 0.866_025_4),
    Point::new(0.0, 1.0),
    Point::new(-0.5, 0.866_025_4),
    Point::new(-0.866_025_4, 0.5),
    Point::new(-1.0, 0.0),
    Point::new(-0.866_025_4, -0.5),
    Point::new(-0.5, -0.866_025_4),
    Point::new(0.0, -1.0),
    Point::new(0.5, -0.866_025_4),
    Point::new(0.866_025_4, -0.5),
];

bitflags! {
    /// Which rectangle corners get rounded
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CornerFlags: u8 {
        const TOP_LEFT = 1 << 0;
        const TOP_RIGHT = 1 << 1;
        const BOTTOM_RIGHT = 1 << 2;
        const BOTTOM_LEFT = 1 << 3;

        const TOP = Self::TOP_LEFT.bits() | Self::TOP_RIGHT.bits();
        const BOTTOM = Self::BOTTOM_LEFT.bits() | Self::BOTTOM_RIGHT.bits();
        const LEFT = Self::TOP_LEFT.bits() | Self::BOTTOM_LEFT.bits();
        const RIGHT = Self::TOP_RIGHT.bits() | Self::BOTTOM_RIGHT.bits();
        const ALL = Self::TOP.bits() | Self::BOTTOM.bits();
    }
}

impl Default for CornerFlags {
    fn default() -> Self {
        CornerFlags::ALL
    }
}

/// Number of segments needed for an arc of `radius` sweeping `sweep` radians
/// so the chord never strays further than a fixed error from the circle
pub fn segments_for_arc(radius: f32, sweep: f32) -> u32 {
    if radius <= 0.0 || sweep == 0.0 {
        return 1;
    }
    let err = CIRCLE_MAX_ERROR.min(radius);
    let full = (PI / (1.0 - err / radius).acos()).ceil().clamp(12.0, 512.0);
    ((full * sweep.abs() / TAU).ceil() as u32).max(2)
}

/// Ordered point sequence under construction
#[derive(Clone, Debug, Default)]
pub struct Polyline {
    points: Vec<Point>,
    closed: bool,
}

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            closed: false,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<Point> {
        self.points.last().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn clear(&mut self) -> &mut Self {
        self.points.clear();
        self.closed = false;
        self
    }

    /// Mark the outline as closed: strokes join the last point to the first
    pub fn close(&mut self) -> &mut Self {
        self.closed = true;
        self
    }

    /// Append `p` unless it repeats the last point
    pub fn line_to(&mut self, p: Point) -> &mut Self {
        if self.points.last() != Some(&p) {
            self.points.push(p);
        }
        self
    }

    /// Counter-clockwise on screen (increasing angle) arc of `segments + 1`
    /// points. `a_max` is moved forward by full turns until `a_max >= a_min`.
    pub fn arc_to(
        &mut self,
        center: Point,
        radii: Point,
        a_min: f32,
        mut a_max: f32,
        segments: u32,
    ) -> &mut Self {
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return self.line_to(center);
        }
        while a_max < a_min {
            a_max += TAU;
        }
        self.push_arc(center, radii, a_min, a_max, segments.max(1));
        self
    }

    /// Arc with decreasing angle. `a_max` is moved back by full turns until
    /// `a_max <= a_min`.
    pub fn arc_to_negative(
        &mut self,
        center: Point,
        radii: Point,
        a_min: f32,
        mut a_max: f32,
        segments: u32,
    ) -> &mut Self {
        if radii.x <= 0.0 || radii.y <= 0.0 {
            return self.line_to(center);
        }
        while a_max > a_min {
            a_max -= TAU;
        }
        self.push_arc(center, radii, a_min, a_max, segments.max(1));
        self
    }

    fn push_arc(&mut self, center: Point, radii: Point, a_from: f32, a_to: f32, segments: u32) {
        self.points.reserve(segments as usize + 1);
        for i in 0..=segments {
            let a = a_from + (i as f32 / segments as f32) * (a_to - a_from);
            self.points
                .push(center + Point::new(a.cos() * radii.x, a.sin() * radii.y));
        }
    }

    /// Arc sampled from the 12-step table, both ends inclusive. Step 0 is
    /// +x, step 3 is +y (down), steps past 11 wrap around.
    pub fn arc_to_fast(
        &mut self,
        center: Point,
        radius: f32,
        a_min_of_12: u32,
        a_max_of_12: u32,
    ) -> &mut Self {
        if radius <= 0.0 || a_min_of_12 > a_max_of_12 {
            return self.line_to(center);
        }
        self.points
            .reserve((a_max_of_12 - a_min_of_12) as usize + 1);
        for a in a_min_of_12..=a_max_of_12 {
            let c = CIRCLE_12[(a % 12) as usize];
            self.points.push(center + c * radius);
        }
        self
    }

    /// Cubic bezier from the last point. With `segments == 0` the curve is
    /// subdivided adaptively until flat.
    ///
    /// An empty polyline has no last point, so the curve starts at `cp0`.
    pub fn bezier_curve_to(&mut self, cp0: Point, cp1: Point, end: Point, segments: u32) -> &mut Self {
        let start = match self.last() {
            Some(p) => p,
            None => {
                self.points.push(cp0);
                cp0
            }
        };
        if segments == 0 {
            bezier_casteljau(&mut self.points, start, cp0, cp1, end, CURVE_TOLERANCE, 0);
        } else {
            self.points.reserve(segments as usize);
            for i in 1..=segments {
                let t = i as f32 / segments as f32;
                self.points.push(bezier_point(start, cp0, cp1, end, t));
            }
        }
        self
    }

    /// Quadratic bezier from the last point, raised to a cubic
    ///
    /// An empty polyline starts the curve at `cp`.
    pub fn quad_curve_to(&mut self, cp: Point, end: Point, segments: u32) -> &mut Self {
        let start = self.last().unwrap_or(cp);
        let c0 = start + (cp - start) * (2.0 / 3.0);
        let c1 = end + (cp - end) * (2.0 / 3.0);
        self.bezier_curve_to(c0, c1, end, segments)
    }

    /// Clockwise rectangle outline starting at the top-left corner
    pub fn rectangle(&mut self, min: Point, max: Point, rounding: f32, corners: CornerFlags) -> &mut Self {
        let w = (max.x - min.x).abs();
        let h = (max.y - min.y).abs();
        let rx = if corners.contains(CornerFlags::TOP) || corners.contains(CornerFlags::BOTTOM) {
            0.5
        } else {
            1.0
        };
        let ry = if corners.contains(CornerFlags::LEFT) || corners.contains(CornerFlags::RIGHT) {
            0.5
        } else {
            1.0
        };
        let rounding = rounding.min(w * rx).min(h * ry);

        if rounding <= 0.0 || corners.is_empty() {
            self.line_to(min);
            self.line_to(Point::new(max.x, min.y));
            self.line_to(max);
            self.line_to(Point::new(min.x, max.y));
            return self;
        }

        let r = |flag: CornerFlags| if corners.contains(flag) { rounding } else { 0.0 };
        let (tl, tr, br, bl) = (
            r(CornerFlags::TOP_LEFT),
            r(CornerFlags::TOP_RIGHT),
            r(CornerFlags::BOTTOM_RIGHT),
            r(CornerFlags::BOTTOM_LEFT),
        );
        self.arc_to_fast(Point::new(min.x + tl, min.y + tl), tl, 6, 9);
        self.arc_to_fast(Point::new(max.x - tr, min.y + tr), tr, 9, 12);
        self.arc_to_fast(Point::new(max.x - br, max.y - br), br, 0, 3);
        self.arc_to_fast(Point::new(min.x + bl, max.y - bl), bl, 3, 6);
        self
    }

    pub fn rect(&mut self, rect: &Rect, rounding: f32, corners: CornerFlags) -> &mut Self {
        self.rectangle(rect.min(), rect.max(), rounding, corners)
    }

    /// `segments` points around the ellipse; the closing point is left out
    /// so a closed stroke does not double back over the seam
    pub fn ellipse(&mut self, center: Point, radii: Point, segments: u32) -> &mut Self {
        let segments = segments.max(3);
        let a_max = TAU * (segments - 1) as f32 / segments as f32;
        self.arc_to(center, radii, 0.0, a_max, segments - 1)
    }

    /// Path through `waypoints` with each interior corner replaced by an arc
    /// tangent to both adjacent segments
    pub fn path(&mut self, waypoints: &[Point], corner_radius: f32) -> &mut Self {
        let Some(&first) = waypoints.first() else {
            return self;
        };
        self.line_to(first);
        if waypoints.len() < 2 {
            return self;
        }

        for w in waypoints.windows(3) {
            let (prev, cur, next) = (w[0], w[1], w[2]);
            self.round_corner(prev, cur, next, corner_radius);
        }

        if let Some(&last) = waypoints.last() {
            self.line_to(last);
        }
        self
    }

    fn round_corner(&mut self, prev: Point, cur: Point, next: Point, radius: f32) {
        let to_prev = prev - cur;
        let to_next = next - cur;
        let (len_prev, len_next) = (to_prev.length(), to_next.length());
        if radius <= 0.0 || len_prev <= 0.0 || len_next <= 0.0 {
            self.line_to(cur);
            return;
        }

        let d0 = to_prev / len_prev;
        let d1 = to_next / len_next;
        let angle = d0.dot(d1).clamp(-1.0, 1.0).acos();
        let half_tan = (angle * 0.5).tan();
        // straight through or folding back onto itself
        if angle <= 1e-3 || PI - angle <= 1e-3 || half_tan <= 0.0 {
            self.line_to(cur);
            return;
        }

        let tangent = (radius / half_tan).min(len_prev * 0.5).min(len_next * 0.5);
        let radius = tangent * half_tan;
        let bisector = (d0 + d1).normalize_or_zero();
        let center = cur + bisector * (radius / (angle * 0.5).sin());

        let start = cur + d0 * tangent - center;
        let end = cur + d1 * tangent - center;
        let a0 = start.y.atan2(start.x);
        let mut sweep = end.y.atan2(end.x) - a0;
        if sweep > PI {
            sweep -= TAU;
        } else if sweep < -PI {
            sweep += TAU;
        }

        let segments = segments_for_arc(radius, sweep);
        let radii = Point::splat(radius);
        if sweep >= 0.0 {
            self.arc_to(center, radii, a0, a0 + sweep, segments);
        } else {
            self.arc_to_negative(center, radii, a0, a0 + sweep, segments);
        }
    }

    /// Bounding box of all points
    pub fn bounds(&self) -> Option<Rect> {
        Rect::bounding(&self.points)
    }

    /// True when the outline, taken as closed, turns the same way at every
    /// vertex. Colinear vertices are ignored.
    pub fn is_convex(&self) -> bool {
        is_convex(&self.points)
    }
}

/// Convexity test over a closed point loop
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0f32;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let cross = (b - a).cross(c - b);
        if !cross.is_finite() {
            return false;
        }
        if cross.abs() <= f32::EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

fn bezier_point(p0: Point, p1: Point, p2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let w0 = u * u * u;
    let w1 = 3.0 * u * u * t;
    let w2 = 3.0 * u * t * t;
    let w3 = t * t * t;
    p0 * w0 + p1 * w1 + p2 * w2 + p3 * w3
}

fn bezier_casteljau(
    out: &mut Vec<Point>,
    p1: Point,
    p2: Point,
    p3: Point,
    p4: Point,
    tolerance: f32,
    level: u32,
) {
    let d = p4 - p1;
    let d2 = ((p2.x - p4.x) * d.y - (p2.y - p4.y) * d.x).abs();
    let d3 = ((p3.x - p4.x) * d.y - (p3.y - p4.y) * d.x).abs();

    if (d2 + d3) * (d2 + d3) < tolerance * d.length_sq() {
        out.push(p4);
    } else if level < CURVE_MAX_LEVEL {
        let p12 = (p1 + p2) * 0.5;
        let p23 = (p2 + p3) * 0.5;
        let p34 = (p3 + p4) * 0.5;
        let p123 = (p12 + p23) * 0.5;
        let p234 = (p23 + p34) * 0.5;
        let p1234 = (p123 + p234) * 0.5;
        bezier_casteljau(out, p1, p12, p123, p1234, tolerance, level + 1);
        bezier_casteljau(out, p1234, p234, p34, p4, tolerance, level + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_line_to_dedups() {
        let mut p = Polyline::new();
        p.line_to(Point::new(1.0, 1.0))
            .line_to(Point::new(1.0, 1.0))
            .line_to(Point::new(2.0, 1.0));
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_arc_to_point_count_and_normalization() {
        let mut p = Polyline::new();
        p.arc_to(Point::ZERO, Point::splat(10.0), PI, 0.0, 8);
        assert_eq!(p.len(), 9);
        // 0 was moved to TAU, so the arc passes through 3PI/2 (straight up)
        assert!(close(p.points()[4], Point::new(0.0, -10.0)));
    }

    #[test]
    fn test_arc_to_negative_goes_clockwise() {
        let mut p = Polyline::new();
        p.arc_to_negative(Point::ZERO, Point::splat(10.0), 0.0, PI, 2);
        assert_eq!(p.len(), 3);
        // PI was moved to -PI, the midpoint is at -PI/2
        assert!(close(p.points()[1], Point::new(0.0, -10.0)));
    }

    #[test]
    fn test_zero_radius_arc_is_single_point() {
        let mut p = Polyline::new();
        p.arc_to(Point::new(3.0, 4.0), Point::ZERO, 0.0, PI, 16);
        assert_eq!(p.points(), &[Point::new(3.0, 4.0)]);
    }

    #[test]
    fn test_rectangle_sharp_and_clamped() {
        let mut p = Polyline::new();
        p.rectangle(Point::ZERO, Point::new(10.0, 10.0), 0.0, CornerFlags::ALL);
        assert_eq!(p.len(), 4);

        let mut p = Polyline::new();
        p.rectangle(Point::ZERO, Point::new(10.0, 4.0), 100.0, CornerFlags::ALL);
        let b = p.bounds().unwrap();
        assert!(close(b.max(), Point::new(10.0, 4.0)));
        assert!(close(b.min(), Point::ZERO));
        // 4 corners of 4 table samples each
        assert_eq!(p.len(), 16);
    }

    #[test]
    fn test_ellipse_omits_seam() {
        let mut p = Polyline::new();
        p.ellipse(Point::ZERO, Point::new(5.0, 3.0), 16);
        assert_eq!(p.len(), 16);
        assert!(!close(p.points()[0], p.points()[15]));
    }

    #[test]
    fn test_path_rounds_interior_corners() {
        let mut p = Polyline::new();
        p.path(
            &[Point::ZERO, Point::new(10.0, 0.0), Point::new(10.0, 10.0)],
            4.0,
        );
        assert!(p.len() > 3);
        assert_eq!(p.points()[0], Point::ZERO);
        assert_eq!(p.last(), Some(Point::new(10.0, 10.0)));
        // arc starts 4 units before the corner and ends 4 units after it
        assert!(p.points().iter().any(|q| close(*q, Point::new(6.0, 0.0))));
        assert!(p.points().iter().any(|q| close(*q, Point::new(10.0, 4.0))));
    }

    #[test]
    fn test_is_convex() {
        let mut p = Polyline::new();
        p.rectangle(Point::ZERO, Point::new(4.0, 4.0), 1.0, CornerFlags::ALL);
        assert!(p.is_convex());

        let mut arrow = Polyline::new();
        arrow
            .line_to(Point::ZERO)
            .line_to(Point::new(10.0, 5.0))
            .line_to(Point::new(0.0, 10.0))
            .line_to(Point::new(3.0, 5.0));
        assert!(!arrow.is_convex());
    }
}
