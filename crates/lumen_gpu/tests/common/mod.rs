//! Shared fixtures: a synthetic monospace font and a backend that records
//! every call it receives

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use lumen_core::{ImageView, Mat4, Rect, TextureFormat, TextureId};
use lumen_gpu::{
    BlendMode, FramebufferId, GpuContext, Interpolation, PrimitiveType, RenderBackend,
    RenderError, TextureWrap, UniformValue,
};
use lumen_paint::Vertex;
use lumen_text::{Font, FontMetrics, Glyph};

pub const ATLAS: TextureId = TextureId(100);
pub const SDF_ATLAS: TextureId = TextureId(200);
pub const ADVANCE: f32 = 10.0;

fn font_with(atlas: TextureId, sdf_spread: f32) -> Arc<Font> {
    let metrics = FontMetrics {
        size: 16.0,
        ascent: 12.0,
        descent: 4.0,
        line_height: 20.0,
        x_height: 6.0,
        cap_height: 9.0,
    };
    let atlas = ImageView::new(atlas, 256, 256, TextureFormat::Alpha8);
    let cell = 16.0 / 256.0;
    let glyphs = ('a'..='z').enumerate().map(|(i, c)| {
        let u0 = (i % 16) as f32 * cell;
        let v0 = (i / 16) as f32 * cell;
        (
            c,
            Glyph {
                x0: 1.0,
                y0: -10.0,
                x1: 9.0,
                y1: 2.0,
                advance: ADVANCE,
                u0,
                v0,
                u1: u0 + cell,
                v1: v0 + cell,
            },
        )
    });
    Arc::new(
        Font::builder(metrics, atlas)
            .glyphs(glyphs)
            .glyph(' ', Glyph::blank(ADVANCE))
            .sdf_spread(sdf_spread)
            .build()
            .unwrap(),
    )
}

pub fn monospace() -> Arc<Font> {
    font_with(ATLAS, 0.0)
}

pub fn distance_field() -> Arc<Font> {
    font_with(SDF_ATLAS, 4.0)
}

pub fn rgba_image(id: u64) -> ImageView {
    ImageView::new(TextureId(id), 64, 32, TextureFormat::Rgba8)
}

/// One backend call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { vertices: usize, indices: usize },
    Reserve { vertices: usize, indices: usize },
    UseProgram(&'static str),
    Blend(BlendMode),
    Scissor(Option<Rect>),
    BindTexture(TextureId, u32),
    Transform(Mat4),
    Uniform(String),
    DrawIndexed(PrimitiveType, u32, u32),
    DrawArray(PrimitiveType, u32, u32),
    Framebuffer(Option<FramebufferId>),
    Viewport(Rect),
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub calls: Vec<Call>,
    pub vertex_capacity: usize,
    pub index_capacity: usize,
    /// Reservations above this many vertices fail
    pub max_vertices: usize,
    /// Textures bind_texture accepts
    pub textures: Vec<TextureId>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            vertex_capacity: 1 << 16,
            index_capacity: 1 << 16,
            max_vertices: usize::MAX,
            textures: vec![ATLAS, SDF_ATLAS],
            ..Default::default()
        }
    }

    pub fn draws(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::DrawIndexed(..) | Call::DrawArray(..)))
            .collect()
    }

    pub fn transforms(&self) -> Vec<Mat4> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Transform(m) => Some(*m),
                _ => None,
            })
            .collect()
    }
}

impl RenderBackend for RecordingBackend {
    type Program = &'static str;

    fn update_buffers(&mut self, vertices: &[Vertex], indices: &[u32]) -> bool {
        if vertices.len() > self.vertex_capacity || indices.len() > self.index_capacity {
            return false;
        }
        self.calls.push(Call::Upload {
            vertices: vertices.len(),
            indices: indices.len(),
        });
        true
    }

    fn reserve_buffers(&mut self, vertices: usize, indices: usize) -> lumen_gpu::Result<()> {
        self.calls.push(Call::Reserve { vertices, indices });
        if vertices > self.max_vertices {
            return Err(RenderError::BufferReservation { vertices, indices });
        }
        self.vertex_capacity = vertices;
        self.index_capacity = indices;
        Ok(())
    }

    fn use_program(&mut self, program: &Self::Program) {
        self.calls.push(Call::UseProgram(program));
    }

    fn set_blend(&mut self, blend: BlendMode) {
        self.calls.push(Call::Blend(blend));
    }

    fn set_scissor(&mut self, rect: Option<Rect>) {
        self.calls.push(Call::Scissor(rect));
    }

    fn bind_texture(
        &mut self,
        texture: TextureId,
        slot: u32,
        _wrap: TextureWrap,
        _interpolation: Interpolation,
    ) -> bool {
        if !self.textures.contains(&texture) {
            return false;
        }
        self.calls.push(Call::BindTexture(texture, slot));
        true
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue<'_>) {
        match value {
            UniformValue::Mat4(m) if name == lumen_gpu::TRANSFORM_UNIFORM => {
                self.calls.push(Call::Transform(m))
            }
            _ => self.calls.push(Call::Uniform(name.to_string())),
        }
    }

    fn draw_indexed(&mut self, primitive: PrimitiveType, index_offset: u32, index_count: u32) {
        self.calls
            .push(Call::DrawIndexed(primitive, index_offset, index_count));
    }

    fn draw_array(&mut self, primitive: PrimitiveType, vertex_offset: u32, vertex_count: u32) {
        self.calls
            .push(Call::DrawArray(primitive, vertex_offset, vertex_count));
    }

    fn bind_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.calls.push(Call::Framebuffer(framebuffer));
    }

    fn set_viewport(&mut self, viewport: Rect) {
        self.calls.push(Call::Viewport(viewport));
    }
}

/// Context counters, shared with the test after the context is boxed
#[derive(Debug, Default)]
pub struct ContextLog {
    pub make_current: usize,
    pub swaps: usize,
    pub vsync: Option<bool>,
    pub fail_activation: bool,
}

pub struct TestContext(pub Rc<RefCell<ContextLog>>);

impl GpuContext for TestContext {
    fn make_current(&mut self) -> lumen_gpu::Result<()> {
        let mut log = self.0.borrow_mut();
        if log.fail_activation {
            return Err(RenderError::ContextActivation("context lost".into()));
        }
        log.make_current += 1;
        Ok(())
    }

    fn swap_buffers(&mut self) -> lumen_gpu::Result<()> {
        self.0.borrow_mut().swaps += 1;
        Ok(())
    }

    fn set_vsync(&mut self, enabled: bool) -> lumen_gpu::Result<()> {
        self.0.borrow_mut().vsync = Some(enabled);
        Ok(())
    }
}

pub fn context() -> (Box<dyn GpuContext>, Rc<RefCell<ContextLog>>) {
    let log = Rc::new(RefCell::new(ContextLog::default()));
    (Box::new(TestContext(Rc::clone(&log))), log)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
