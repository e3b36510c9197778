//! Builds a small frame and reports how well it batched
//!
//! Run with `RUST_LOG=lumen_gpu=trace` to see every executed command.

use lumen_core::{Color, Point, Rect, Size, TextureId};
use lumen_gpu::{
    BlendMode, BuiltinProgram, GpuContext, Interpolation, PrimitiveType, RenderBackend,
    RenderConfig, Renderer, TextureWrap, UniformValue,
};
use lumen_paint::{Gradient, Polyline, Vertex};
use tracing_subscriber::EnvFilter;

/// Backend that only counts what it is asked to do
#[derive(Default)]
struct CountingBackend {
    uploads: usize,
    draw_calls: usize,
    elements: u64,
}

impl RenderBackend for CountingBackend {
    type Program = ();

    fn update_buffers(&mut self, _vertices: &[Vertex], _indices: &[u32]) -> bool {
        self.uploads += 1;
        true
    }

    fn reserve_buffers(&mut self, _vertices: usize, _indices: usize) -> lumen_gpu::Result<()> {
        Ok(())
    }

    fn use_program(&mut self, _program: &()) {}

    fn set_blend(&mut self, _blend: BlendMode) {}

    fn set_scissor(&mut self, _rect: Option<Rect>) {}

    fn bind_texture(
        &mut self,
        _texture: TextureId,
        _slot: u32,
        _wrap: TextureWrap,
        _interpolation: Interpolation,
    ) -> bool {
        true
    }

    fn set_uniform(&mut self, _name: &str, _value: UniformValue<'_>) {}

    fn draw_indexed(&mut self, _primitive: PrimitiveType, _offset: u32, count: u32) {
        self.draw_calls += 1;
        self.elements += count as u64;
    }

    fn draw_array(&mut self, _primitive: PrimitiveType, _offset: u32, count: u32) {
        self.draw_calls += 1;
        self.elements += count as u64;
    }

    fn bind_framebuffer(&mut self, _framebuffer: Option<lumen_gpu::FramebufferId>) {}

    fn set_viewport(&mut self, _viewport: Rect) {}
}

struct HeadlessContext;

impl GpuContext for HeadlessContext {
    fn make_current(&mut self) -> lumen_gpu::Result<()> {
        Ok(())
    }

    fn swap_buffers(&mut self) -> lumen_gpu::Result<()> {
        Ok(())
    }

    fn set_vsync(&mut self, _enabled: bool) -> lumen_gpu::Result<()> {
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RenderConfig::load(std::path::Path::new(&path))?,
        None => RenderConfig::default(),
    };
    let mut renderer = Renderer::new(
        CountingBackend::default(),
        Box::new(HeadlessContext),
        config,
        Size::new(1280.0, 720.0),
    );
    renderer.register_program(BuiltinProgram::Simple, ());

    for frame in 0..3 {
        let mut list = renderer.acquire_list();

        // a grid of cells, each with an outline
        for row in 0..8 {
            for col in 0..12 {
                let cell = Rect::new(col as f32 * 100.0 + 10.0, row as f32 * 80.0 + 10.0, 90.0, 70.0);
                list.add_rect(&cell, Color::rgb(40, 44, 52));
                list.add_rect_outline(&cell, Color::rgb(97, 175, 239), 1.0, 4.0);
            }
        }

        // a clipped wave on top
        list.push_clip(&Rect::new(0.0, 300.0, 1280.0, 120.0));
        let mut wave = Polyline::new();
        for i in 0..=64 {
            let x = i as f32 * 20.0;
            let y = 360.0 + (x * 0.02 + frame as f32).sin() * 50.0;
            wave.line_to(Point::new(x, y));
        }
        list.add_polyline(&wave, Color::rgb(229, 192, 123), 3.0);
        list.add_ellipse_filled(
            Point::new(640.0, 360.0),
            Point::new(40.0, 40.0),
            Gradient::new(Color::WHITE, Color::rgba(255, 255, 255, 0)),
            0,
        );
        list.pop_clip();

        let stats = renderer.draw(&list)?;
        println!("frame {frame}: {list}");
        println!(
            "  {} draw calls for {} commands, {} vertices",
            stats.draw_calls, stats.commands, stats.vertices
        );
        renderer.release_list(list);
        renderer.present()?;
    }

    let backend = renderer.backend();
    println!(
        "total: {} uploads, {} draw calls, {} elements, pool {:?}",
        backend.uploads,
        backend.draw_calls,
        backend.elements,
        renderer.pool_stats()
    );
    Ok(())
}
