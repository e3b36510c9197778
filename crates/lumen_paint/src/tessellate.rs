//! Stroke and fill tessellation
//!
//! Convex fills and strokes are expanded directly into triangles, with an
//! optional fringe band whose outer edge fades to zero alpha for
//! anti-aliasing. Concave fills go through lyon.

use lumen_core::{Color, Point, Rect};
use lyon::math::point;
use lyon::path::Path as LyonPath;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers,
};

use crate::error::TessellationError;
use crate::vertex::{Mesh, Vertex};

/// Normals averaged from nearly opposite edges are clamped to this scale
const FIXNORMAL_MAX_INV_LEN2: f32 = 100.0;

/// Vertical two-stop color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Gradient {
    pub top: Color,
    pub bottom: Color,
}

impl Gradient {
    pub const fn new(top: Color, bottom: Color) -> Self {
        Self { top, bottom }
    }

    pub const fn solid(color: Color) -> Self {
        Self {
            top: color,
            bottom: color,
        }
    }

    pub fn is_opaque(&self) -> bool {
        self.top.is_opaque() && self.bottom.is_opaque()
    }

    pub fn is_transparent(&self) -> bool {
        self.top.is_transparent() && self.bottom.is_transparent()
    }

    /// Color at height `y` inside `bounds`
    pub fn at(&self, y: f32, bounds: &Rect) -> Color {
        if self.top == self.bottom || bounds.height() <= 0.0 {
            return self.top;
        }
        let t = (y - bounds.y()) / bounds.height();
        self.top.lerp(&self.bottom, t)
    }
}

impl From<Color> for Gradient {
    fn from(color: Color) -> Self {
        Gradient::solid(color)
    }
}

/// Rescale an averaged normal so the offset keeps the band width at joins
fn fix_normal(v: Point) -> Point {
    let d2 = v.length_sq();
    if d2 > 0.000_001 {
        let inv_len2 = (1.0 / d2).min(FIXNORMAL_MAX_INV_LEN2);
        v * inv_len2
    } else {
        v
    }
}

/// Twice the signed area; positive for clockwise outlines on a y-down screen
fn signed_area2(points: &[Point]) -> f32 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].cross(points[(i + 1) % n]))
        .sum()
}

/// Fill a convex polygon
///
/// Triangulated as a fan from the first point. With `aa_size > 0` every
/// point gets an inner and outer vertex `aa_size` apart, and the band between
/// them fades to transparent. Fewer than 3 points produce nothing.
pub fn fill_convex(points: &[Point], gradient: Gradient, aa_size: f32, out: &mut Mesh) {
    let n = points.len();
    if n < 3 {
        return;
    }
    let Some(bounds) = Rect::bounding(points) else {
        return;
    };
    let base = out.next_index();

    if aa_size <= 0.0 {
        out.reserve(n, (n - 2) * 3);
        for p in points {
            out.push_vertex(Vertex::colored(*p, gradient.at(p.y, &bounds)));
        }
        for i in 2..n as u32 {
            out.push_triangle(base, base + i - 1, base + i);
        }
        return;
    }

    out.reserve(n * 2, (n - 2) * 3 + n * 6);
    let inner = base;
    let outer = base + 1;

    for i in 2..n as u32 {
        out.push_triangle(inner, inner + ((i - 1) << 1), inner + (i << 1));
    }

    // Edge normals, flipped for counter-clockwise input so they face outward
    let flip = if signed_area2(points) < 0.0 { -1.0 } else { 1.0 };
    let normals: Vec<Point> = (0..n)
        .map(|i| {
            let d = (points[(i + 1) % n] - points[i]).normalize_or_zero();
            Point::new(d.y, -d.x) * flip
        })
        .collect();

    let half = aa_size * 0.5;
    let mut i0 = n - 1;
    for i1 in 0..n {
        let dm = fix_normal((normals[i0] + normals[i1]) * 0.5) * half;
        let p = points[i1];
        let color = gradient.at(p.y, &bounds);
        out.push_vertex(Vertex::colored(p - dm, color));
        out.push_vertex(Vertex::colored(p + dm, color.with_alpha(0)));

        let (a, b) = ((i1 as u32) << 1, (i0 as u32) << 1);
        out.push_triangle(inner + a, inner + b, outer + b);
        out.push_triangle(outer + b, outer + a, inner + a);
        i0 = i1;
    }
}

/// Fill an arbitrary simple polygon with lyon (non-zero rule)
///
/// Failures are logged here and returned; the mesh is left exactly as it was.
pub fn fill_concave(points: &[Point], gradient: Gradient, out: &mut Mesh) -> Result<(), TessellationError> {
    if points.len() < 3 {
        return Ok(());
    }
    if let Some(index) = points.iter().position(|p| !p.x.is_finite() || !p.y.is_finite()) {
        tracing::warn!(index, points = points.len(), "concave fill has a non-finite point");
        return Err(TessellationError::NonFinite { index });
    }
    let Some(bounds) = Rect::bounding(points) else {
        return Ok(());
    };

    let mut builder = LyonPath::builder();
    builder.begin(point(points[0].x, points[0].y));
    for p in &points[1..] {
        builder.line_to(point(p.x, p.y));
    }
    builder.end(true);
    let path = builder.build();

    let mut geometry: VertexBuffers<Vertex, u32> = VertexBuffers::new();
    let mut tessellator = FillTessellator::new();
    let options = FillOptions::default()
        .with_tolerance(0.1)
        .with_fill_rule(FillRule::NonZero);

    tessellator
        .tessellate_path(
            &path,
            &options,
            &mut BuffersBuilder::new(&mut geometry, |vertex: FillVertex| {
                let pos = vertex.position();
                let p = Point::new(pos.x, pos.y);
                Vertex::colored(p, gradient.at(p.y, &bounds))
            }),
        )
        .map_err(|err| {
            tracing::warn!(error = ?err, points = points.len(), "lyon failed to fill a concave polygon");
            TessellationError::from(err)
        })?;

    let base = out.next_index();
    out.vertices.extend_from_slice(&geometry.vertices);
    out.indices.extend(geometry.indices.iter().map(|i| i + base));
    Ok(())
}

/// Stroke a polyline
///
/// - `aa_size <= 0`: one quad per segment, `thickness` wide.
/// - thin AA (`thickness <= aa_size`): 3 vertices per point, a center line
///   with a fringe of `aa_size` on each side.
/// - thick AA: 4 vertices per point, a solid band `thickness - aa_size` wide
///   plus a fringe on each side.
///
/// Fewer than 2 points produce nothing.
pub fn stroke(
    points: &[Point],
    closed: bool,
    color: Color,
    thickness: f32,
    aa_size: f32,
    out: &mut Mesh,
) {
    let n = points.len();
    if n < 2 {
        return;
    }
    let count = if closed { n } else { n - 1 };

    if aa_size <= 0.0 {
        stroke_solid(points, count, color, thickness, out);
        return;
    }

    let mut normals: Vec<Point> = (0..n)
        .map(|i| {
            let d = (points[(i + 1) % n] - points[i]).normalize_or_zero();
            Point::new(d.y, -d.x)
        })
        .collect();
    if !closed {
        normals[n - 1] = normals[n - 2];
    }

    if thickness > aa_size {
        stroke_thick_aa(points, &normals, closed, count, color, thickness, aa_size, out);
    } else {
        stroke_thin_aa(points, &normals, closed, count, color, aa_size, out);
    }
}

fn stroke_solid(points: &[Point], count: usize, color: Color, thickness: f32, out: &mut Mesh) {
    let n = points.len();
    out.reserve(count * 4, count * 6);
    for i1 in 0..count {
        let i2 = (i1 + 1) % n;
        let (p1, p2) = (points[i1], points[i2]);
        let d = (p2 - p1).normalize_or_zero() * (thickness * 0.5);
        let off = Point::new(d.y, -d.x);

        let base = out.next_index();
        out.push_vertex(Vertex::colored(p1 + off, color));
        out.push_vertex(Vertex::colored(p2 + off, color));
        out.push_vertex(Vertex::colored(p2 - off, color));
        out.push_vertex(Vertex::colored(p1 - off, color));
        out.push_triangle(base, base + 1, base + 2);
        out.push_triangle(base, base + 2, base + 3);
    }
}

fn stroke_thin_aa(
    points: &[Point],
    normals: &[Point],
    closed: bool,
    count: usize,
    color: Color,
    aa_size: f32,
    out: &mut Mesh,
) {
    let n = points.len();
    let transparent = color.with_alpha(0);
    let mut fringe = vec![Point::ZERO; n * 2];

    if !closed {
        let last = n - 1;
        fringe[0] = points[0] + normals[0] * aa_size;
        fringe[1] = points[0] - normals[0] * aa_size;
        fringe[last * 2] = points[last] + normals[last] * aa_size;
        fringe[last * 2 + 1] = points[last] - normals[last] * aa_size;
    }

    let start = out.next_index();
    out.reserve(n * 3, count * 12);
    let mut idx1 = start;
    for i1 in 0..count {
        let i2 = if i1 + 1 == n { 0 } else { i1 + 1 };
        let idx2 = if i1 + 1 == n { start } else { idx1 + 3 };

        let dm = fix_normal((normals[i1] + normals[i2]) * 0.5) * aa_size;
        fringe[i2 * 2] = points[i2] + dm;
        fringe[i2 * 2 + 1] = points[i2] - dm;

        out.indices.extend_from_slice(&[
            idx2, idx1, idx1 + 2,
            idx1 + 2, idx2 + 2, idx2,
            idx2 + 1, idx1 + 1, idx1,
            idx1, idx2, idx2 + 1,
        ]);
        idx1 = idx2;
    }

    for i in 0..n {
        out.push_vertex(Vertex::colored(points[i], color));
        out.push_vertex(Vertex::colored(fringe[i * 2], transparent));
        out.push_vertex(Vertex::colored(fringe[i * 2 + 1], transparent));
    }
}

#[allow(clippy::too_many_arguments)]
fn stroke_thick_aa(
    points: &[Point],
    normals: &[Point],
    closed: bool,
    count: usize,
    color: Color,
    thickness: f32,
    aa_size: f32,
    out: &mut Mesh,
) {
    let n = points.len();
    let transparent = color.with_alpha(0);
    let half_inner = (thickness - aa_size) * 0.5;
    let mut band = vec![Point::ZERO; n * 4];

    if !closed {
        for i in [0, n - 1] {
            let (p, nm) = (points[i], normals[i]);
            band[i * 4] = p + nm * (half_inner + aa_size);
            band[i * 4 + 1] = p + nm * half_inner;
            band[i * 4 + 2] = p - nm * half_inner;
            band[i * 4 + 3] = p - nm * (half_inner + aa_size);
        }
    }

    let start = out.next_index();
    out.reserve(n * 4, count * 18);
    let mut idx1 = start;
    for i1 in 0..count {
        let i2 = if i1 + 1 == n { 0 } else { i1 + 1 };
        let idx2 = if i1 + 1 == n { start } else { idx1 + 4 };

        let dm = fix_normal((normals[i1] + normals[i2]) * 0.5);
        let dm_out = dm * (half_inner + aa_size);
        let dm_in = dm * half_inner;
        let p = points[i2];
        band[i2 * 4] = p + dm_out;
        band[i2 * 4 + 1] = p + dm_in;
        band[i2 * 4 + 2] = p - dm_in;
        band[i2 * 4 + 3] = p - dm_out;

        out.indices.extend_from_slice(&[
            // solid band
            idx2 + 1, idx1 + 1, idx1 + 2,
            idx1 + 2, idx2 + 2, idx2 + 1,
            // outer fringe
            idx2 + 1, idx1 + 1, idx1,
            idx1, idx2, idx2 + 1,
            // inner fringe
            idx2 + 2, idx1 + 2, idx1 + 3,
            idx1 + 3, idx2 + 3, idx2 + 2,
        ]);
        idx1 = idx2;
    }

    for i in 0..n {
        out.push_vertex(Vertex::colored(band[i * 4], transparent));
        out.push_vertex(Vertex::colored(band[i * 4 + 1], color));
        out.push_vertex(Vertex::colored(band[i * 4 + 2], color));
        out.push_vertex(Vertex::colored(band[i * 4 + 3], transparent));
    }
}
