//! Text layout engine
//!
//! Handles line breaking, alignment, and per-glyph quad generation with
//! gradient coloring, kerning, leaning, shadows and outlines.
//!
//! A [`Text`] keeps two derived artifacts: line breaks and geometry. Which
//! of them is current is tracked by [`CacheState`]. Inputs that change how
//! the string wraps invalidate both; inputs that only move or recolor quads
//! invalidate geometry alone. Queries regenerate whatever is stale and
//! otherwise return the cached values untouched.

use std::ops::Range;
use std::sync::Arc;

use lumen_core::{Color, Point, Rect};
use lumen_paint::Vertex;

use crate::align::{Alignment, VAlign};
use crate::font::{Font, Glyph};

/// Leaning is clamped to this many radians either way
const MAX_LEANING: f32 = 1.2;

/// Offsets used for bitmap outlines, one copy per direction
const OUTLINE_DIRECTIONS: [Point; 8] = [
    Point::new(-1.0, -1.0),
    Point::new(0.0, -1.0),
    Point::new(1.0, -1.0),
    Point::new(-1.0, 0.0),
    Point::new(1.0, 0.0),
    Point::new(-1.0, 1.0),
    Point::new(0.0, 1.0),
    Point::new(1.0, 1.0),
];

/// Which derived artifacts are current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Nothing is cached
    Stale,
    /// Line breaks are current, geometry is not
    LinesValid,
    /// Both line breaks and geometry are current
    GeometryValid,
}

/// Glyph outline
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Outline {
    pub color: Color,
    pub width: f32,
}

impl Outline {
    pub fn new(color: Color, width: f32) -> Self {
        Self { color, width }
    }

    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && !self.color.is_transparent()
    }
}

/// Drop shadow drawn under the glyphs
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Shadow {
    pub color: Color,
    pub offset: Point,
}

impl Shadow {
    pub fn new(color: Color, offset: Point) -> Self {
        Self { color, offset }
    }

    pub fn is_visible(&self) -> bool {
        !self.color.is_transparent() && self.offset != Point::ZERO
    }
}

/// Per-line metrics after alignment, as absolute y positions
#[derive(Debug, Clone, PartialEq)]
pub struct LineMetrics {
    /// Byte range of the line in the source string (no trailing newline)
    pub range: Range<usize>,
    pub left: f32,
    pub width: f32,
    pub top: f32,
    pub baseline: f32,
    pub bottom: f32,
    pub cap_height: f32,
    pub x_height: f32,
    pub median: f32,
}

impl LineMetrics {
    fn translate_y(&mut self, dy: f32) {
        self.top += dy;
        self.baseline += dy;
        self.bottom += dy;
        self.cap_height += dy;
        self.x_height += dy;
        self.median += dy;
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }
}

/// Layout cell of one codepoint: pen position to pen plus advance, line top
/// to line bottom
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphBox {
    pub codepoint: char,
    pub byte_index: usize,
    pub line: usize,
    pub rect: Rect,
}

/// Generated text geometry
///
/// `vertices` holds 4 vertices per quad (top-left, top-right, bottom-right,
/// bottom-left): shadow quads first, then outline quads, then the glyphs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextGeometry {
    pub vertices: Vec<Vertex>,
    pub shadow_quads: usize,
    pub outline_quads: usize,
    pub glyph_quads: usize,
    pub lines: Vec<LineMetrics>,
    pub glyphs: Vec<GlyphBox>,
    pub bounds: Rect,
}

impl TextGeometry {
    fn clear(&mut self) {
        self.vertices.clear();
        self.shadow_quads = 0;
        self.outline_quads = 0;
        self.glyph_quads = 0;
        self.lines.clear();
        self.glyphs.clear();
        self.bounds = Rect::ZERO;
    }

    pub fn quad_count(&self) -> usize {
        self.shadow_quads + self.outline_quads + self.glyph_quads
    }

    /// Vertices of the glyph quads alone
    pub fn glyph_vertices(&self) -> &[Vertex] {
        let start = (self.shadow_quads + self.outline_quads) * 4;
        &self.vertices[start..]
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct LineBreak {
    range: Range<usize>,
    width: f32,
}

/// Whitespace a line may be broken after. No-break space is excluded.
fn is_break_opportunity(c: char) -> bool {
    c.is_whitespace() && c != '\u{a0}'
}

/// Laid out, styled text
#[derive(Debug, Clone)]
pub struct Text {
    content: String,
    font: Arc<Font>,
    alignment: Alignment,
    top_color: Color,
    bottom_color: Color,
    outline: Outline,
    shadow: Shadow,
    max_width: f32,
    kerning: bool,
    leaning: f32,
    advance: f32,

    state: CacheState,
    lines: Vec<LineBreak>,
    geometry: TextGeometry,
    line_generations: u64,
    geometry_generations: u64,
}

impl Text {
    pub fn new(content: impl Into<String>, font: Arc<Font>) -> Self {
        Self {
            content: content.into(),
            font,
            alignment: Alignment::default(),
            top_color: Color::WHITE,
            bottom_color: Color::WHITE,
            outline: Outline::default(),
            shadow: Shadow::default(),
            max_width: 0.0,
            kerning: true,
            leaning: 0.0,
            advance: 0.0,
            state: CacheState::Stale,
            lines: Vec::new(),
            geometry: TextGeometry::default(),
            line_generations: 0,
            geometry_generations: 0,
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.set_alignment(alignment);
        self
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.set_color(color);
        self
    }

    pub fn with_max_width(mut self, max_width: f32) -> Self {
        self.set_max_width(max_width);
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inputs
    // ─────────────────────────────────────────────────────────────────────

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn font(&self) -> &Arc<Font> {
        &self.font
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// Top and bottom gradient colors
    pub fn colors(&self) -> (Color, Color) {
        (self.top_color, self.bottom_color)
    }

    pub fn outline(&self) -> Outline {
        self.outline
    }

    pub fn shadow(&self) -> Shadow {
        self.shadow
    }

    pub fn max_width(&self) -> f32 {
        self.max_width
    }

    pub fn kerning(&self) -> bool {
        self.kerning
    }

    pub fn leaning(&self) -> f32 {
        self.leaning
    }

    /// Extra vertical distance added between consecutive lines
    pub fn advance(&self) -> f32 {
        self.advance
    }

    pub fn set_text(&mut self, content: &str) {
        if self.content != content {
            self.content.clear();
            self.content.push_str(content);
            self.invalidate_all();
        }
    }

    pub fn set_font(&mut self, font: Arc<Font>) {
        if !Arc::ptr_eq(&self.font, &font) {
            self.font = font;
            self.invalidate_all();
        }
    }

    /// Wrap width; values `<= 0` disable wrapping
    pub fn set_max_width(&mut self, max_width: f32) {
        if self.max_width != max_width {
            self.max_width = max_width;
            self.invalidate_all();
        }
    }

    pub fn set_kerning(&mut self, kerning: bool) {
        if self.kerning != kerning {
            self.kerning = kerning;
            self.invalidate_all();
        }
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        if self.alignment != alignment {
            self.alignment = alignment;
            self.invalidate_geometry();
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.set_gradient(color, color);
    }

    pub fn set_gradient(&mut self, top: Color, bottom: Color) {
        if (self.top_color, self.bottom_color) != (top, bottom) {
            self.top_color = top;
            self.bottom_color = bottom;
            self.invalidate_geometry();
        }
    }

    pub fn set_outline(&mut self, outline: Outline) {
        if self.outline != outline {
            self.outline = outline;
            self.invalidate_geometry();
        }
    }

    pub fn set_shadow(&mut self, shadow: Shadow) {
        if self.shadow != shadow {
            self.shadow = shadow;
            self.invalidate_geometry();
        }
    }

    /// Oblique angle in radians; positive leans the tops to the right
    pub fn set_leaning(&mut self, leaning: f32) {
        let leaning = leaning.clamp(-MAX_LEANING, MAX_LEANING);
        if self.leaning != leaning {
            self.leaning = leaning;
            self.invalidate_geometry();
        }
    }

    pub fn set_advance(&mut self, advance: f32) {
        if self.advance != advance {
            self.advance = advance;
            self.invalidate_geometry();
        }
    }

    fn invalidate_all(&mut self) {
        self.state = CacheState::Stale;
    }

    fn invalidate_geometry(&mut self) {
        if self.state == CacheState::GeometryValid {
            self.state = CacheState::LinesValid;
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn cache_state(&self) -> CacheState {
        self.state
    }

    /// How many times line breaks have been computed
    pub fn line_generations(&self) -> u64 {
        self.line_generations
    }

    /// How many times geometry has been generated
    pub fn geometry_generations(&self) -> u64 {
        self.geometry_generations
    }

    /// Width of the widest line, trailing whitespace excluded
    pub fn width(&mut self) -> f32 {
        self.ensure_lines();
        self.lines.iter().map(|l| l.width).fold(0.0, f32::max)
    }

    /// Height from the first line's ascent to the last line's descent
    pub fn height(&mut self) -> f32 {
        self.ensure_lines();
        let m = self.font.metrics();
        let n = self.lines.len().max(1);
        m.ascent + m.descent + (n - 1) as f32 * self.line_step()
    }

    pub fn line_count(&mut self) -> usize {
        self.ensure_lines();
        self.lines.len()
    }

    pub fn line_metrics(&mut self) -> &[LineMetrics] {
        self.ensure_geometry();
        &self.geometry.lines
    }

    /// Layout box after alignment
    pub fn bounds(&mut self) -> Rect {
        self.ensure_geometry();
        self.geometry.bounds
    }

    pub fn geometry(&mut self) -> &TextGeometry {
        self.ensure_geometry();
        &self.geometry
    }

    fn line_step(&self) -> f32 {
        self.font.metrics().line_height + self.advance
    }

    fn ensure_lines(&mut self) {
        if self.state == CacheState::Stale {
            self.lines = self.break_lines();
            self.state = CacheState::LinesValid;
            self.line_generations += 1;
            tracing::debug!(lines = self.lines.len(), "text lines regenerated");
        }
    }

    fn ensure_geometry(&mut self) {
        self.ensure_lines();
        if self.state != CacheState::GeometryValid {
            self.build_geometry();
            self.state = CacheState::GeometryValid;
            self.geometry_generations += 1;
            tracing::debug!(
                quads = self.geometry.quad_count(),
                "text geometry regenerated"
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Line breaking
    // ─────────────────────────────────────────────────────────────────────

    fn pen_advance(&self, prev: Option<char>, c: char) -> f32 {
        let kern = match prev {
            Some(p) if self.kerning => self.font.kerning(p, c),
            _ => 0.0,
        };
        kern + self.font.advance(c)
    }

    fn measure(&self, s: &str) -> f32 {
        let mut prev = None;
        let mut width = 0.0;
        for c in s.chars() {
            width += self.pen_advance(prev, c);
            prev = Some(c);
        }
        width
    }

    fn make_line(&self, range: Range<usize>) -> LineBreak {
        let visible = self.content[range.clone()].trim_end_matches(is_break_opportunity);
        LineBreak {
            width: self.measure(visible),
            range,
        }
    }

    fn break_lines(&self) -> Vec<LineBreak> {
        let text = self.content.as_str();
        let wrap = self.max_width > 0.0;
        let mut lines = Vec::new();
        let mut start = 0;
        let mut width = 0.0f32;
        let mut prev: Option<char> = None;
        // byte index just past the last whitespace on the current line
        let mut break_at: Option<usize> = None;

        for (i, c) in text.char_indices() {
            if c == '\n' {
                lines.push(self.make_line(start..i));
                start = i + 1;
                width = 0.0;
                prev = None;
                break_at = None;
                continue;
            }

            if wrap
                && !is_break_opportunity(c)
                && width + self.pen_advance(prev, c) > self.max_width
            {
                // a word with no earlier break point stays whole
                if let Some(b) = break_at.take() {
                    lines.push(self.make_line(start..b));
                    start = b;
                    width = self.measure(&text[b..i]);
                    prev = text[b..i].chars().next_back();
                }
            }

            width += self.pen_advance(prev, c);
            prev = Some(c);
            if is_break_opportunity(c) {
                break_at = Some(i + c.len_utf8());
            }
        }
        lines.push(self.make_line(start..text.len()));
        lines
    }

    // ─────────────────────────────────────────────────────────────────────
    // Geometry
    // ─────────────────────────────────────────────────────────────────────

    fn build_geometry(&mut self) {
        let font = Arc::clone(&self.font);
        let m = *font.metrics();
        let step = self.line_step();
        let shear = self.leaning.tan();
        let snap = font.pixel_snap();
        let h_fraction = self.alignment.horizontal.fraction();
        let (top_color, bottom_color) = (self.top_color, self.bottom_color);

        let geo = &mut self.geometry;
        geo.clear();
        let mut glyph_verts: Vec<Vertex> = Vec::with_capacity(self.content.len() * 4);

        for (line_index, line) in self.lines.iter().enumerate() {
            let baseline = m.ascent + line_index as f32 * step;
            let top = baseline - m.ascent;
            let bottom = baseline + m.descent;

            let mut left = -line.width * h_fraction;
            if snap {
                left = left.trunc();
            }

            let mut pen = left;
            let mut prev: Option<char> = None;
            for (offset, c) in self.content[line.range.clone()].char_indices() {
                if let Some(p) = prev.filter(|_| self.kerning) {
                    pen += font.kerning(p, c);
                }
                prev = Some(c);
                let Some(glyph) = font.glyph(c) else {
                    continue;
                };

                geo.glyphs.push(GlyphBox {
                    codepoint: c,
                    byte_index: line.range.start + offset,
                    line: line_index,
                    rect: Rect::new(pen, top, glyph.advance, bottom - top),
                });
                if glyph.is_visible() {
                    push_glyph_quad(
                        &mut glyph_verts,
                        glyph,
                        pen,
                        baseline,
                        (top, bottom),
                        shear,
                        (top_color, bottom_color),
                    );
                }
                pen += glyph.advance;
            }

            geo.lines.push(LineMetrics {
                range: line.range.clone(),
                left,
                width: line.width,
                top,
                baseline,
                bottom,
                cap_height: baseline - m.cap_height,
                x_height: baseline - m.x_height,
                median: baseline - m.cap_height * 0.5,
            });
        }

        // Vertical alignment moves the anchor line to y = 0
        let (Some(first), Some(last)) = (geo.lines.first(), geo.lines.last()) else {
            return;
        };
        let anchor_y = match self.alignment.vertical {
            VAlign::Top => first.top,
            VAlign::Middle => (first.top + last.bottom) * 0.5,
            VAlign::Bottom => last.bottom,
            VAlign::FirstBaseline => first.baseline,
            VAlign::LastBaseline => last.baseline,
            VAlign::CapHeight => first.cap_height,
            VAlign::XHeight => first.x_height,
            VAlign::Median => (first.median + last.median) * 0.5,
        };
        let mut dy = -anchor_y;
        if snap {
            dy = dy.trunc();
        }

        for v in &mut glyph_verts {
            v.pos[1] += dy;
        }
        for g in &mut geo.glyphs {
            g.rect = g.rect.offset(0.0, dy);
        }
        for l in &mut geo.lines {
            l.translate_y(dy);
        }

        geo.bounds = geo
            .lines
            .iter()
            .map(|l| Rect::new(l.left, l.top, l.width, l.height()))
            .reduce(|a, b| a.union(&b))
            .unwrap_or(Rect::ZERO);

        // Shadow, then outline, then glyphs
        if self.shadow.is_visible() {
            let offset = self.shadow.offset;
            let color = self.shadow.color.to_array();
            geo.vertices.extend(glyph_verts.iter().map(|v| Vertex {
                pos: [v.pos[0] + offset.x, v.pos[1] + offset.y],
                color,
                ..*v
            }));
            geo.shadow_quads = glyph_verts.len() / 4;
        }

        // Distance field fonts draw outlines in the shader
        if self.outline.is_visible() && !font.is_sdf() {
            let color = self.outline.color.to_array();
            for dir in OUTLINE_DIRECTIONS {
                let d = dir * self.outline.width;
                geo.vertices.extend(glyph_verts.iter().map(|v| Vertex {
                    pos: [v.pos[0] + d.x, v.pos[1] + d.y],
                    color,
                    ..*v
                }));
            }
            geo.outline_quads = OUTLINE_DIRECTIONS.len() * glyph_verts.len() / 4;
        }

        geo.glyph_quads = glyph_verts.len() / 4;
        geo.vertices.extend_from_slice(&glyph_verts);
    }
}

fn push_glyph_quad(
    out: &mut Vec<Vertex>,
    g: &Glyph,
    pen: f32,
    baseline: f32,
    (band_top, band_bottom): (f32, f32),
    shear: f32,
    (top_color, bottom_color): (Color, Color),
) {
    let band = band_bottom - band_top;
    let color_at = |y: f32| {
        if band > 0.0 {
            top_color.lerp(&bottom_color, (y - band_top) / band)
        } else {
            top_color
        }
    };
    // shear pivots on the baseline
    let corner = |x: f32, y: f32, u: f32, v: f32| {
        let y = baseline + y;
        let x = pen + x + shear * (baseline - y);
        Vertex::new(Point::new(x, y), Point::new(u, v), color_at(y))
    };
    out.extend_from_slice(&[
        corner(g.x0, g.y0, g.u0, g.v0),
        corner(g.x1, g.y0, g.u1, g.v0),
        corner(g.x1, g.y1, g.u1, g.v1),
        corner(g.x0, g.y1, g.u0, g.v1),
    ]);
}
