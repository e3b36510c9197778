//! Backend contract
//!
//! The renderer never talks to a graphics API directly. A [`RenderBackend`]
//! owns the GPU buffers, programs and textures; a [`GpuContext`] owns the
//! platform surface the backend draws into.

use lumen_core::{Color, Mat4, Rect, TextureId};
use lumen_paint::Vertex;

use crate::command::{BlendMode, PrimitiveType};
use crate::error::Result;

/// Offscreen render target handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureWrap {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
}

/// Value handed to a named shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue<'a> {
    Mat4(Mat4),
    Color(Color),
    Float(f32),
    Int(i32),
    Rects(&'a [Rect]),
    /// Texture slot a sampler reads from
    Texture(u32),
}

/// Graphics API side of the renderer
pub trait RenderBackend {
    /// Compiled program handle
    type Program;

    /// Upload the shared vertex and index buffers
    ///
    /// Returns `false` when the data does not fit the current buffers; the
    /// renderer then reserves more space and retries.
    fn update_buffers(&mut self, vertices: &[Vertex], indices: &[u32]) -> bool;

    /// Grow the buffers to hold at least this many vertices and indices
    fn reserve_buffers(&mut self, vertices: usize, indices: usize) -> Result<()>;

    fn use_program(&mut self, program: &Self::Program);

    fn set_blend(&mut self, blend: BlendMode);

    /// Restrict drawing to `rect`, or lift the restriction with `None`
    fn set_scissor(&mut self, rect: Option<Rect>);

    /// Bind a texture to a sampler slot; `false` if the texture is unknown
    fn bind_texture(
        &mut self,
        texture: TextureId,
        slot: u32,
        wrap: TextureWrap,
        interpolation: Interpolation,
    ) -> bool;

    fn set_uniform(&mut self, name: &str, value: UniformValue<'_>);

    fn draw_indexed(&mut self, primitive: PrimitiveType, index_offset: u32, index_count: u32);

    fn draw_array(&mut self, primitive: PrimitiveType, vertex_offset: u32, vertex_count: u32);

    /// Render into an offscreen target, or the default surface with `None`
    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>);

    fn set_viewport(&mut self, viewport: Rect);
}

/// Platform surface the backend renders into
pub trait GpuContext {
    /// Make this context current on the calling thread; cheap when it already is
    fn make_current(&mut self) -> Result<()>;

    fn swap_buffers(&mut self) -> Result<()>;

    fn set_vsync(&mut self, enabled: bool) -> Result<()>;
}
