//! Resource handles
//!
//! Textures live on the backend side; the draw list only carries opaque ids
//! plus the sub-rectangle of the texture an image covers.

use crate::geometry::{Rect, Size};

/// Opaque handle to a backend texture
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl TextureId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Pixel layout of a texture, which decides the sampling program
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Single channel coverage or distance (glyph atlases)
    Alpha8,
    /// Four channel color
    #[default]
    Rgba8,
}

impl TextureFormat {
    pub const fn channels(&self) -> u32 {
        match self {
            TextureFormat::Alpha8 => 1,
            TextureFormat::Rgba8 => 4,
        }
    }
}

/// A view into a texture: the texture handle, its pixel size and the
/// normalized UV rectangle the view covers
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageView {
    pub texture: TextureId,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub uv: Rect,
}

impl ImageView {
    /// View covering the whole texture
    pub fn new(texture: TextureId, width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            texture,
            width,
            height,
            format,
            uv: Rect::new(0.0, 0.0, 1.0, 1.0),
        }
    }

    pub fn channels(&self) -> u32 {
        self.format.channels()
    }

    /// Size in pixels of the covered region
    pub fn size(&self) -> Size {
        Size::new(
            self.width as f32 * self.uv.width(),
            self.height as f32 * self.uv.height(),
        )
    }

    /// Sub-view from a pixel rectangle relative to this view
    pub fn sub_view(&self, pixels: Rect) -> ImageView {
        let (w, h) = (self.width.max(1) as f32, self.height.max(1) as f32);
        let uv = Rect::new(
            self.uv.x() + pixels.x() / w,
            self.uv.y() + pixels.y() / h,
            pixels.width() / w,
            pixels.height() / h,
        );
        ImageView { uv, ..*self }
    }
}
