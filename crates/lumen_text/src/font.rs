//! Font data model
//!
//! A font here is a rasterized face at a single size: one record per
//! codepoint describing its quad relative to the pen position on the
//! baseline, its advance and where it lives in the atlas.

use lumen_core::{ImageView, TextureFormat};
use rustc_hash::FxHashMap;

use crate::{Result, TextError};

/// Per-codepoint glyph record
///
/// `x0, y0, x1, y1` bound the glyph quad relative to the pen position, with
/// y growing down (so `y0` is negative for glyphs rising above the baseline).
/// `u0, v0, u1, v1` is the matching normalized atlas box.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Glyph {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    pub advance: f32,
    pub u0: f32,
    pub v0: f32,
    pub u1: f32,
    pub v1: f32,
}

impl Glyph {
    /// Glyph with no visible quad (spaces and other blanks)
    pub fn blank(advance: f32) -> Self {
        Self {
            advance,
            ..Default::default()
        }
    }

    /// True when the glyph produces a quad
    pub fn is_visible(&self) -> bool {
        self.x1 > self.x0 && self.y1 > self.y0
    }
}

/// Scalar font metrics, in pixels
///
/// `ascent` and `descent` are both positive distances from the baseline,
/// up and down respectively.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub size: f32,
    pub ascent: f32,
    pub descent: f32,
    pub line_height: f32,
    pub x_height: f32,
    pub cap_height: f32,
}

impl FontMetrics {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("size", self.size),
            ("ascent", self.ascent),
            ("descent", self.descent),
            ("line_height", self.line_height),
            ("x_height", self.x_height),
            ("cap_height", self.cap_height),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(TextError::InvalidMetrics(format!("{name} = {value}")));
            }
        }
        if self.size <= 0.0 || self.line_height <= 0.0 {
            return Err(TextError::InvalidMetrics(
                "size and line_height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validated font
#[derive(Debug, Clone)]
pub struct Font {
    metrics: FontMetrics,
    glyphs: FxHashMap<char, Glyph>,
    kerning: FxHashMap<(char, char), f32>,
    atlas: ImageView,
    sdf_spread: f32,
    pixel_snap: bool,
    fallback: Option<char>,
}

impl Font {
    pub fn builder(metrics: FontMetrics, atlas: ImageView) -> FontBuilder {
        FontBuilder::new(metrics, atlas)
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn atlas(&self) -> &ImageView {
        &self.atlas
    }

    /// Spread of the distance field in pixels; 0 for coverage bitmaps
    pub fn sdf_spread(&self) -> f32 {
        self.sdf_spread
    }

    pub fn is_sdf(&self) -> bool {
        self.sdf_spread > 0.0
    }

    /// Whether line positions should be snapped to whole pixels
    pub fn pixel_snap(&self) -> bool {
        self.pixel_snap
    }

    /// Glyph for `c`. A missing no-break space borrows the regular space;
    /// other missing codepoints use the fallback glyph when there is one.
    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs
            .get(&c)
            .or_else(|| match c {
                '\u{a0}' => self.glyphs.get(&' '),
                _ => None,
            })
            .or_else(|| self.fallback.and_then(|f| self.glyphs.get(&f)))
    }

    pub fn has_glyph(&self, c: char) -> bool {
        self.glyphs.contains_key(&c)
    }

    /// Horizontal advance of `c`, 0 when it has no glyph
    pub fn advance(&self, c: char) -> f32 {
        self.glyph(c).map_or(0.0, |g| g.advance)
    }

    /// Kerning adjustment between two consecutive codepoints
    pub fn kerning(&self, left: char, right: char) -> f32 {
        self.kerning.get(&(left, right)).copied().unwrap_or(0.0)
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }
}

/// Builder for [`Font`]; all validation happens in [`FontBuilder::build`]
#[derive(Debug, Clone)]
pub struct FontBuilder {
    metrics: FontMetrics,
    glyphs: FxHashMap<char, Glyph>,
    kerning: FxHashMap<(char, char), f32>,
    atlas: ImageView,
    sdf_spread: f32,
    pixel_snap: bool,
    fallback: Option<char>,
}

impl FontBuilder {
    pub fn new(metrics: FontMetrics, atlas: ImageView) -> Self {
        Self {
            metrics,
            glyphs: FxHashMap::default(),
            kerning: FxHashMap::default(),
            atlas,
            sdf_spread: 0.0,
            pixel_snap: false,
            fallback: None,
        }
    }

    pub fn glyph(mut self, c: char, glyph: Glyph) -> Self {
        self.glyphs.insert(c, glyph);
        self
    }

    pub fn glyphs(mut self, glyphs: impl IntoIterator<Item = (char, Glyph)>) -> Self {
        self.glyphs.extend(glyphs);
        self
    }

    pub fn kerning(mut self, left: char, right: char, amount: f32) -> Self {
        self.kerning.insert((left, right), amount);
        self
    }

    pub fn sdf_spread(mut self, spread: f32) -> Self {
        self.sdf_spread = spread;
        self
    }

    pub fn pixel_snap(mut self, snap: bool) -> Self {
        self.pixel_snap = snap;
        self
    }

    pub fn fallback(mut self, c: char) -> Self {
        self.fallback = Some(c);
        self
    }

    pub fn build(self) -> Result<Font> {
        self.metrics.validate()?;

        for (&c, g) in &self.glyphs {
            let values = [g.x0, g.y0, g.x1, g.y1, g.advance, g.u0, g.v0, g.u1, g.v1];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(TextError::InvalidGlyph {
                    codepoint: c,
                    reason: "non-finite value".to_string(),
                });
            }
            if g.x1 < g.x0 || g.y1 < g.y0 {
                return Err(TextError::InvalidGlyph {
                    codepoint: c,
                    reason: "inverted quad bounds".to_string(),
                });
            }
            if g.advance < 0.0 {
                return Err(TextError::InvalidGlyph {
                    codepoint: c,
                    reason: format!("negative advance {}", g.advance),
                });
            }
            let in_unit = |v: f32| (0.0..=1.0).contains(&v);
            if !(in_unit(g.u0) && in_unit(g.v0) && in_unit(g.u1) && in_unit(g.v1))
                || g.u1 < g.u0
                || g.v1 < g.v0
            {
                return Err(TextError::InvalidUv(c));
            }
        }

        if let Some((&(l, r), _)) = self.kerning.iter().find(|(_, v)| !v.is_finite()) {
            return Err(TextError::InvalidKerning(l, r));
        }

        if let Some(f) = self.fallback {
            if !self.glyphs.contains_key(&f) {
                return Err(TextError::MissingFallback(f));
            }
        }

        if !self.sdf_spread.is_finite() || self.sdf_spread < 0.0 {
            return Err(TextError::InvalidSdfSpread(self.sdf_spread));
        }
        if self.sdf_spread > 0.0 && self.atlas.format != TextureFormat::Alpha8 {
            tracing::warn!(
                format = ?self.atlas.format,
                "distance field font with a multi-channel atlas"
            );
        }

        tracing::debug!(
            glyphs = self.glyphs.len(),
            kerning_pairs = self.kerning.len(),
            sdf = self.sdf_spread > 0.0,
            "font built"
        );

        Ok(Font {
            metrics: self.metrics,
            glyphs: self.glyphs,
            kerning: self.kerning,
            atlas: self.atlas,
            sdf_spread: self.sdf_spread,
            pixel_snap: self.pixel_snap,
            fallback: self.fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::TextureId;

    fn metrics() -> FontMetrics {
        FontMetrics {
            size: 16.0,
            ascent: 12.0,
            descent: 4.0,
            line_height: 18.0,
            x_height: 6.0,
            cap_height: 9.0,
        }
    }

    fn atlas() -> ImageView {
        ImageView::new(TextureId(1), 128, 128, TextureFormat::Alpha8)
    }

    fn glyph() -> Glyph {
        Glyph {
            x0: 0.0,
            y0: -10.0,
            x1: 8.0,
            y1: 2.0,
            advance: 9.0,
            u0: 0.0,
            v0: 0.0,
            u1: 0.1,
            v1: 0.1,
        }
    }

    #[test]
    fn test_build_valid_font() {
        let font = Font::builder(metrics(), atlas())
            .glyph('a', glyph())
            .glyph('?', glyph())
            .glyph(' ', Glyph::blank(4.0))
            .kerning('a', 'a', -1.0)
            .fallback('?')
            .build()
            .unwrap();
        assert_eq!(font.advance('a'), 9.0);
        assert_eq!(font.kerning('a', 'a'), -1.0);
        assert_eq!(font.kerning('a', 'b'), 0.0);
        // missing codepoints use the fallback
        assert_eq!(font.glyph('z'), Some(&glyph()));
        // no-break space borrows the space
        assert_eq!(font.advance('\u{a0}'), 4.0);
    }

    #[test]
    fn test_rejects_bad_uv() {
        let mut g = glyph();
        g.u1 = 1.5;
        let err = Font::builder(metrics(), atlas()).glyph('a', g).build().unwrap_err();
        assert_eq!(err, TextError::InvalidUv('a'));
    }

    #[test]
    fn test_rejects_inverted_quad() {
        let mut g = glyph();
        g.x1 = -1.0;
        assert!(matches!(
            Font::builder(metrics(), atlas()).glyph('a', g).build(),
            Err(TextError::InvalidGlyph { codepoint: 'a', .. })
        ));
    }

    #[test]
    fn test_rejects_missing_fallback_and_bad_metrics() {
        assert_eq!(
            Font::builder(metrics(), atlas()).fallback('?').build().unwrap_err(),
            TextError::MissingFallback('?')
        );

        let mut m = metrics();
        m.line_height = 0.0;
        assert!(matches!(
            Font::builder(m, atlas()).build(),
            Err(TextError::InvalidMetrics(_))
        ));
    }
}
