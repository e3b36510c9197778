//! Glyph layout for Lumen
//!
//! This crate provides:
//! - Font data model (glyph boxes, atlas UVs, kerning), validated once at build time
//! - Text layout engine (line breaking, alignment, gradient coloring, leaning)
//! - Rich text with inline superscripts, subscripts and images
//! - Fit/align helpers placing text or images into a destination rectangle
//!
//! Glyph rasterization and font file parsing happen elsewhere; a [`Font`] is
//! built from already rasterized glyph records.

pub mod align;
pub mod fit;
pub mod font;
pub mod rich_text;
pub mod text;

pub use align::{Alignment, HAlign, VAlign};
pub use fit::{
    align_and_fit_item, align_and_fit_rect, align_and_fit_text, align_wrap_and_fit_text,
    fit_scale, DimensionFit, SizeFit,
};
pub use font::{Font, FontBuilder, FontMetrics, Glyph};
pub use rich_text::{EmbeddedImage, EmbeddedText, RichText};
pub use text::{CacheState, GlyphBox, LineMetrics, Outline, Shadow, Text, TextGeometry};

use thiserror::Error;

/// Font validation errors
///
/// Raised when a font is built. Layout never fails: by the time geometry is
/// generated the font data is known to be valid.
#[derive(Error, Debug, PartialEq)]
pub enum TextError {
    #[error("Invalid font metrics: {0}")]
    InvalidMetrics(String),

    #[error("Invalid glyph data for {codepoint:?}: {reason}")]
    InvalidGlyph { codepoint: char, reason: String },

    #[error("Glyph UVs for {0:?} fall outside the atlas")]
    InvalidUv(char),

    #[error("Invalid kerning for pair ({0:?}, {1:?})")]
    InvalidKerning(char, char),

    #[error("Fallback glyph {0:?} is not in the font")]
    MissingFallback(char),

    #[error("Invalid distance field spread: {0}")]
    InvalidSdfSpread(f32),
}

pub type Result<T> = std::result::Result<T, TextError>;
