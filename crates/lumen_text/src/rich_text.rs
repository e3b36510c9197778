//! Rich text with inline decorators
//!
//! Markup understood by [`RichText::set_markup`]:
//!
//! - `^{...}` superscript
//! - `_{...}` subscript
//! - `![name]` inline image registered with [`RichText::set_image`]
//! - `\x` the character `x`, taken literally
//!
//! Each decorator is replaced in the main text by no-break spaces wide
//! enough to hold it. The embedded element is positioned from the glyph boxes
//! of those spaces every time the main text's geometry is regenerated.

use std::ops::Range;
use std::sync::Arc;

use lumen_core::{Affine2D, Color, ImageView, Rect};
use rustc_hash::FxHashMap;

use crate::align::Alignment;
use crate::font::Font;
use crate::text::{Text, TextGeometry};

/// Scale of superscript and subscript text
const SCRIPT_SCALE: f32 = 0.6;

/// Superscript baseline rise, as a fraction of the font ascent
const SUPERSCRIPT_RISE: f32 = 0.4;

/// Subscript baseline drop, as a fraction of the font ascent
const SUBSCRIPT_DROP: f32 = 0.2;

const RESERVE: char = '\u{a0}';

#[derive(Debug, Clone, PartialEq)]
enum DecoratorKind {
    Superscript,
    Subscript,
    Image(ImageView),
}

#[derive(Debug, Clone)]
struct Decorator {
    kind: DecoratorKind,
    /// Byte range of the reserved spaces in the main text
    range: Range<usize>,
    /// Width the element occupies at scale 1
    width: f32,
    /// Index into `texts` for script decorators
    text_index: Option<usize>,
}

/// Superscript or subscript placed inside a rich text
#[derive(Debug, Clone)]
pub struct EmbeddedText {
    pub text: Text,
    /// Maps the embedded text's space into the rich text's space
    pub transform: Affine2D,
    /// Reserved byte range in the main text
    pub range: Range<usize>,
    /// False when the reserved range produced no glyphs
    pub visible: bool,
}

/// Image placed inside a rich text
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    pub image: ImageView,
    pub rect: Rect,
    pub range: Range<usize>,
    pub visible: bool,
}

/// Text with embedded scripts and images
#[derive(Debug, Clone)]
pub struct RichText {
    markup: String,
    text: Text,
    images: FxHashMap<String, ImageView>,
    decorators: Vec<Decorator>,
    texts: Vec<EmbeddedText>,
    embedded_images: Vec<EmbeddedImage>,
    /// Main text geometry generation the embedded elements were placed for
    placed_for: Option<u64>,
}

impl RichText {
    pub fn new(font: Arc<Font>) -> Self {
        Self {
            markup: String::new(),
            text: Text::new("", font),
            images: FxHashMap::default(),
            decorators: Vec::new(),
            texts: Vec::new(),
            embedded_images: Vec::new(),
            placed_for: None,
        }
    }

    pub fn with_markup(mut self, markup: &str) -> Self {
        self.set_markup(markup);
        self
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// The main text, with decorators replaced by reserved spaces
    pub fn text(&self) -> &Text {
        &self.text
    }

    /// Register an image for `![name]`; re-parses the markup
    pub fn set_image(&mut self, name: impl Into<String>, image: ImageView) {
        self.images.insert(name.into(), image);
        self.reparse();
    }

    pub fn set_markup(&mut self, markup: &str) {
        if self.markup != markup {
            self.markup.clear();
            self.markup.push_str(markup);
            self.reparse();
        }
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.text.set_alignment(alignment);
    }

    pub fn set_max_width(&mut self, max_width: f32) {
        self.text.set_max_width(max_width);
    }

    pub fn set_color(&mut self, color: Color) {
        self.set_gradient(color, color);
    }

    pub fn set_gradient(&mut self, top: Color, bottom: Color) {
        self.text.set_gradient(top, bottom);
        for e in &mut self.texts {
            e.text.set_gradient(top, bottom);
        }
    }

    /// Lay out the main text and place every embedded element
    pub fn layout(&mut self) -> &TextGeometry {
        self.place_embedded();
        self.text.geometry()
    }

    /// Main text plus embedded elements, all laid out
    pub fn parts_mut(&mut self) -> (&mut Text, &mut [EmbeddedText], &[EmbeddedImage]) {
        self.place_embedded();
        (&mut self.text, &mut self.texts, &self.embedded_images)
    }

    pub fn embedded_texts(&mut self) -> &[EmbeddedText] {
        self.place_embedded();
        &self.texts
    }

    pub fn embedded_images(&mut self) -> &[EmbeddedImage] {
        self.place_embedded();
        &self.embedded_images
    }

    fn reparse(&mut self) {
        let font = Arc::clone(self.text.font());
        let (top, bottom) = self.text.colors();
        let reserve_advance = font.advance(RESERVE);
        let line_box = font.metrics().ascent + font.metrics().descent;

        let mut plain = String::with_capacity(self.markup.len());
        self.decorators.clear();
        self.texts.clear();
        self.embedded_images.clear();

        let reserve = |plain: &mut String, width: f32| -> Range<usize> {
            let count = if reserve_advance > 0.0 {
                (width / reserve_advance).ceil().max(1.0) as usize
            } else {
                1
            };
            let start = plain.len();
            plain.extend(std::iter::repeat(RESERVE).take(count));
            start..plain.len()
        };

        let mut chars = self.markup.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        plain.push(next);
                    }
                }
                '^' | '_' if chars.peek() == Some(&'{') => {
                    chars.next();
                    let content: String = chars.by_ref().take_while(|&c| c != '}').collect();
                    let mut sub = Text::new(content, Arc::clone(&font))
                        .with_alignment(Alignment::BASELINE_LEFT);
                    sub.set_gradient(top, bottom);
                    let width = sub.width() * SCRIPT_SCALE;
                    let range = reserve(&mut plain, width);
                    let kind = if c == '^' {
                        DecoratorKind::Superscript
                    } else {
                        DecoratorKind::Subscript
                    };
                    self.decorators.push(Decorator {
                        kind,
                        range: range.clone(),
                        width,
                        text_index: Some(self.texts.len()),
                    });
                    self.texts.push(EmbeddedText {
                        text: sub,
                        transform: Affine2D::IDENTITY,
                        range,
                        visible: false,
                    });
                }
                '!' if chars.peek() == Some(&'[') => {
                    chars.next();
                    let name: String = chars.by_ref().take_while(|&c| c != ']').collect();
                    let Some(image) = self.images.get(&name).copied() else {
                        tracing::warn!(name = %name, "rich text references an unknown image");
                        continue;
                    };
                    let aspect = if image.size().height > 0.0 {
                        image.size().width / image.size().height
                    } else {
                        1.0
                    };
                    let width = line_box * aspect;
                    let range = reserve(&mut plain, width);
                    self.decorators.push(Decorator {
                        kind: DecoratorKind::Image(image),
                        range: range.clone(),
                        width,
                        text_index: None,
                    });
                    self.embedded_images.push(EmbeddedImage {
                        image,
                        rect: Rect::ZERO,
                        range,
                        visible: false,
                    });
                }
                _ => plain.push(c),
            }
        }

        self.text.set_text(&plain);
        self.placed_for = None;
        tracing::debug!(
            decorators = self.decorators.len(),
            "rich text markup parsed"
        );
    }

    fn place_embedded(&mut self) {
        // make sure the main geometry is current before comparing generations
        self.text.geometry();
        let generation = self.text.geometry_generations();
        if self.placed_for == Some(generation) {
            return;
        }

        let ascent = self.text.font().metrics().ascent;
        let geo = self.text.geometry();
        let mut image_index = 0;

        for d in &self.decorators {
            let first = geo
                .glyphs
                .iter()
                .find(|g| d.range.contains(&g.byte_index));
            let placed = first.and_then(|g| geo.lines.get(g.line).map(|line| (g.rect, line)));

            match &d.kind {
                DecoratorKind::Superscript | DecoratorKind::Subscript => {
                    let Some(embedded) = d.text_index.and_then(|i| self.texts.get_mut(i)) else {
                        continue;
                    };
                    embedded.visible = placed.is_some();
                    if let Some((cell, line)) = placed {
                        let baseline = if d.kind == DecoratorKind::Superscript {
                            line.baseline - ascent * SUPERSCRIPT_RISE
                        } else {
                            line.baseline + ascent * SUBSCRIPT_DROP
                        };
                        embedded.transform = Affine2D::translation(cell.x(), baseline)
                            .then(&Affine2D::scale(SCRIPT_SCALE, SCRIPT_SCALE));
                    }
                }
                DecoratorKind::Image(_) => {
                    if let Some(embedded) = self.embedded_images.get_mut(image_index) {
                        embedded.visible = placed.is_some();
                        if let Some((cell, line)) = placed {
                            embedded.rect = Rect::new(cell.x(), line.top, d.width, line.height());
                        }
                    }
                    image_index += 1;
                }
            }
        }

        self.placed_for = Some(generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontMetrics, Glyph};
    use lumen_core::{Point, TextureFormat, TextureId};

    fn font() -> Arc<Font> {
        let metrics = FontMetrics {
            size: 10.0,
            ascent: 10.0,
            descent: 2.0,
            line_height: 12.0,
            x_height: 5.0,
            cap_height: 7.0,
        };
        let atlas = ImageView::new(TextureId(3), 64, 64, TextureFormat::Alpha8);
        let visible = Glyph {
            x0: 0.0,
            y0: -7.0,
            x1: 5.0,
            y1: 0.0,
            advance: 6.0,
            u0: 0.0,
            v0: 0.0,
            u1: 0.1,
            v1: 0.1,
        };
        Arc::new(
            Font::builder(metrics, atlas)
                .glyphs(('a'..='z').map(|c| (c, visible)))
                .glyphs(('0'..='9').map(|c| (c, visible)))
                .glyph(' ', Glyph::blank(3.0))
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_superscript_reserves_space() {
        let mut rich = RichText::new(font()).with_markup("x^{2}");
        // "2" is 6 wide, scaled to 3.6, reserved with 2 spaces of 3
        assert_eq!(rich.text().content(), "x\u{a0}\u{a0}");

        let texts = rich.embedded_texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].visible);
        let origin = texts[0].transform.transform_point(Point::ZERO);
        assert_eq!(origin, Point::new(6.0, 10.0 - 4.0));
    }

    #[test]
    fn test_escape_and_unknown_image() {
        let mut rich = RichText::new(font()).with_markup("a\\^{b} ![nope]");
        assert_eq!(rich.text().content(), "a^{b} ");
        assert!(rich.embedded_images().is_empty());
    }

    #[test]
    fn test_image_follows_alignment() {
        let mut rich = RichText::new(font());
        rich.set_image("dot", ImageView::new(TextureId(9), 16, 16, TextureFormat::Rgba8));
        rich.set_markup("ab![dot]");

        let x_left = rich.embedded_images()[0].rect.x();
        assert_eq!(x_left, 12.0);
        assert_eq!(rich.embedded_images()[0].rect.height(), 12.0);

        rich.set_alignment(Alignment::TOP_RIGHT);
        let x_right = rich.embedded_images()[0].rect.x();
        assert!(x_right < x_left);
    }
}
