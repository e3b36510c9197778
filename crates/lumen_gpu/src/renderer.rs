//! Draw list execution
//!
//! The [`Renderer`] uploads a list's buffers once, then walks its commands in
//! order: program, blend mode and scissor are bound, the command's begin ops
//! run, one backend draw call is issued, and the end ops run.

use lumen_core::{Mat4, ObjectPool, PoolStats, Rect, Size};
use rustc_hash::FxHashMap;

use crate::backend::{
    FramebufferId, GpuContext, Interpolation, RenderBackend, TextureWrap, UniformValue,
};
use crate::command::{DeferredOp, DrawCommand, DrawMode, ProgramRef};
use crate::config::RenderConfig;
use crate::draw_list::DrawList;
use crate::error::{RenderError, Result};

/// Uniform receiving projection times model transform before each draw
pub const TRANSFORM_UNIFORM: &str = "u_transform";

/// Compiled programs by identity
#[derive(Debug)]
pub struct ProgramRegistry<P> {
    programs: FxHashMap<ProgramRef, P>,
}

impl<P> Default for ProgramRegistry<P> {
    fn default() -> Self {
        Self {
            programs: FxHashMap::default(),
        }
    }
}

impl<P> ProgramRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a program, returning the one it replaces
    pub fn register(&mut self, program_ref: impl Into<ProgramRef>, program: P) -> Option<P> {
        self.programs.insert(program_ref.into(), program)
    }

    pub fn get(&self, program_ref: &ProgramRef) -> Option<&P> {
        self.programs.get(program_ref)
    }

    pub fn contains(&self, program_ref: &ProgramRef) -> bool {
        self.programs.contains_key(program_ref)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// What one [`Renderer::draw`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Commands in the list
    pub commands: usize,
    /// Backend draw calls issued
    pub draw_calls: usize,
    /// Commands skipped for a missing program or texture
    pub skipped: usize,
    pub vertices: usize,
    pub indices: usize,
    /// Times the GPU buffers had to grow before the upload fit
    pub buffer_grows: usize,
}

/// Executes draw lists on a backend
pub struct Renderer<B: RenderBackend> {
    backend: B,
    context: Box<dyn GpuContext>,
    config: RenderConfig,
    programs: ProgramRegistry<B::Program>,
    lists: ObjectPool<DrawList>,

    viewport: Size,
    projection: Mat4,
    transforms: Vec<Mat4>,
    clips: Vec<Rect>,
    framebuffers: Vec<(FramebufferId, Size)>,

    vertex_capacity: usize,
    index_capacity: usize,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(backend: B, context: Box<dyn GpuContext>, config: RenderConfig, viewport: Size) -> Self {
        let lists = ObjectPool::new(config.renderer.pool_capacity);
        Self {
            vertex_capacity: config.draw_list.initial_vertex_capacity,
            index_capacity: config.draw_list.initial_index_capacity,
            backend,
            context,
            config,
            programs: ProgramRegistry::new(),
            lists,
            viewport,
            projection: Mat4::screen(viewport.width, viewport.height),
            transforms: Vec::new(),
            clips: Vec::new(),
            framebuffers: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn programs(&self) -> &ProgramRegistry<B::Program> {
        &self.programs
    }

    pub fn register_program(&mut self, program_ref: impl Into<ProgramRef>, program: B::Program) {
        let program_ref = program_ref.into();
        if self.programs.register(program_ref, program).is_some() {
            tracing::debug!(program = ?program_ref, "replaced registered program");
        }
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Resize the default target
    pub fn set_viewport_size(&mut self, viewport: Size) {
        self.viewport = viewport;
        if self.framebuffers.is_empty() {
            self.projection = Mat4::screen(viewport.width, viewport.height);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Draw list pool
    // ─────────────────────────────────────────────────────────────────────

    /// Take a cleared draw list, reusing a released one when available
    pub fn acquire_list(&mut self) -> DrawList {
        let mut list = self.lists.acquire();
        list.set_config(self.config.draw_list.clone());
        list
    }

    /// Hand a list back for reuse by a later [`acquire_list`](Self::acquire_list)
    pub fn release_list(&mut self, list: DrawList) {
        self.lists.release(list);
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.lists.stats()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Stacks
    // ─────────────────────────────────────────────────────────────────────

    /// Projection combined with the top of the transform stack
    pub fn current_transform(&self) -> Mat4 {
        match self.transforms.last() {
            Some(model) => self.projection.mul(model),
            None => self.projection,
        }
    }

    pub fn push_transform(&mut self, transform: &Mat4) {
        let combined = match self.transforms.last() {
            Some(model) => model.mul(transform),
            None => *transform,
        };
        self.transforms.push(combined);
    }

    pub fn pop_transform(&mut self) {
        if self.transforms.pop().is_none() {
            tracing::warn!("renderer pop_transform on an empty stack");
        }
    }

    /// Restrict every following command to `rect`, in target space
    pub fn push_clip(&mut self, rect: &Rect) {
        let clip = match self.clips.last() {
            Some(current) => current.intersect(rect),
            None => *rect,
        };
        self.clips.push(clip);
    }

    pub fn pop_clip(&mut self) {
        if self.clips.pop().is_none() {
            tracing::warn!("renderer pop_clip on an empty stack");
        }
    }

    /// Render into an offscreen target of `size` until the matching pop
    pub fn push_framebuffer(&mut self, framebuffer: FramebufferId, size: Size) -> Result<()> {
        self.context.make_current()?;
        self.framebuffers.push((framebuffer, size));
        self.bind_target(Some(framebuffer), size);
        Ok(())
    }

    pub fn pop_framebuffer(&mut self) -> Result<()> {
        self.context.make_current()?;
        if self.framebuffers.pop().is_none() {
            tracing::warn!("renderer pop_framebuffer on an empty stack");
        }
        match self.framebuffers.last().copied() {
            Some((framebuffer, size)) => self.bind_target(Some(framebuffer), size),
            None => self.bind_target(None, self.viewport),
        }
        Ok(())
    }

    fn bind_target(&mut self, framebuffer: Option<FramebufferId>, size: Size) {
        self.backend.bind_framebuffer(framebuffer);
        self.backend.set_viewport(size.to_rect());
        self.projection = Mat4::screen(size.width, size.height);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Execution
    // ─────────────────────────────────────────────────────────────────────

    /// Upload and execute a draw list
    pub fn draw(&mut self, list: &DrawList) -> Result<FrameStats> {
        self.context.make_current()?;
        if self.config.renderer.validate_stacks {
            list.debug_validate();
        }

        let mut stats = FrameStats {
            commands: list.commands().len(),
            vertices: list.vertices().len(),
            indices: list.indices().len(),
            ..Default::default()
        };
        if list.is_empty() {
            return Ok(stats);
        }

        stats.buffer_grows = self.upload(list)?;
        for command in list.commands() {
            if self.execute(command) {
                stats.draw_calls += 1;
            } else {
                stats.skipped += 1;
            }
        }
        self.backend.set_scissor(self.clips.last().copied());

        tracing::debug!(
            commands = stats.commands,
            draw_calls = stats.draw_calls,
            skipped = stats.skipped,
            "draw list executed"
        );
        Ok(stats)
    }

    /// Present the default target
    pub fn present(&mut self) -> Result<()> {
        self.context.make_current()?;
        self.context.swap_buffers()
    }

    pub fn set_vsync(&mut self, enabled: bool) -> Result<()> {
        self.context.make_current()?;
        self.context.set_vsync(enabled)
    }

    /// Upload the list's buffers, growing them once if they do not fit
    fn upload(&mut self, list: &DrawList) -> Result<usize> {
        let (vertices, indices) = (list.vertices(), list.indices());
        if self.backend.update_buffers(vertices, indices) {
            return Ok(0);
        }

        let factor = self.config.renderer.buffer_growth_factor.max(1.0);
        let grow = |current: usize, needed: usize| ((current as f32 * factor) as usize).max(needed);
        let vertex_capacity = grow(self.vertex_capacity, vertices.len());
        let index_capacity = grow(self.index_capacity, indices.len());
        tracing::debug!(
            vertices = vertex_capacity,
            indices = index_capacity,
            "growing GPU buffers"
        );
        self.backend.reserve_buffers(vertex_capacity, index_capacity)?;
        self.vertex_capacity = vertex_capacity;
        self.index_capacity = index_capacity;

        if self.backend.update_buffers(vertices, indices) {
            Ok(1)
        } else {
            Err(RenderError::BufferReservation {
                vertices: vertices.len(),
                indices: indices.len(),
            })
        }
    }

    /// Run one command; `false` when it was skipped
    fn execute(&mut self, command: &DrawCommand) -> bool {
        match self.programs.get(&command.setup.program) {
            Some(program) => self.backend.use_program(program),
            None => {
                tracing::warn!(
                    program = ?command.setup.program,
                    "skipping command with an unregistered program"
                );
                return false;
            }
        }

        tracing::trace!(
            primitive = ?command.primitive,
            blend = ?command.blend,
            elements = command.element_count(),
            "executing draw command"
        );
        self.backend.set_blend(command.blend);
        let scissor = match (command.clip, self.clips.last()) {
            (Some(clip), Some(outer)) => Some(clip.intersect(outer)),
            (Some(clip), None) => Some(clip),
            (None, outer) => outer.copied(),
        };
        self.backend.set_scissor(scissor);

        let depth = self.transforms.len();
        for op in &command.setup.begin {
            if !self.run_op(op) {
                self.transforms.truncate(depth);
                return false;
            }
        }

        let transform = self.current_transform();
        self.backend
            .set_uniform(TRANSFORM_UNIFORM, UniformValue::Mat4(transform));
        match command.draw_mode {
            DrawMode::Indexed => self.backend.draw_indexed(
                command.primitive,
                command.indices_offset,
                command.indices_count,
            ),
            DrawMode::Array => self.backend.draw_array(
                command.primitive,
                command.vertices_offset,
                command.vertices_count,
            ),
        }

        for op in &command.setup.end {
            self.run_op(op);
        }
        if self.transforms.len() != depth {
            tracing::warn!(
                pushed = self.transforms.len() as i64 - depth as i64,
                "command ops left the transform stack unbalanced"
            );
            self.transforms.truncate(depth);
        }
        true
    }

    fn run_op(&mut self, op: &DeferredOp) -> bool {
        match op {
            DeferredOp::PushTransform(transform) => self.push_transform(transform),
            DeferredOp::PopTransform => self.pop_transform(),
            DeferredOp::SetUniformTexture {
                name,
                texture,
                slot,
            } => {
                let bound = self.backend.bind_texture(
                    *texture,
                    *slot,
                    TextureWrap::ClampToEdge,
                    Interpolation::Linear,
                );
                if !bound {
                    tracing::warn!(texture = texture.raw(), "skipping command with an unbound texture");
                    return false;
                }
                self.backend.set_uniform(name, UniformValue::Texture(*slot));
            }
            DeferredOp::SetUniformRects { name, rects } => {
                self.backend.set_uniform(name, UniformValue::Rects(rects))
            }
            DeferredOp::SetUniformColor { name, color } => {
                self.backend.set_uniform(name, UniformValue::Color(*color))
            }
            DeferredOp::SetUniformFloat { name, value } => {
                self.backend.set_uniform(name, UniformValue::Float(*value))
            }
            DeferredOp::SetUniformInt { name, value } => {
                self.backend.set_uniform(name, UniformValue::Int(*value))
            }
        }
        true
    }
}
