//! Draw list
//!
//! Every shape, image and text run is lowered into the list's shared vertex
//! and index buffers, and the list keeps a command stream describing how to
//! draw them. A new primitive extends the last command when both carry the
//! same nonzero batching hash; otherwise it starts a new command snapshotting
//! the current clip, blend mode and program. Commands are only ever appended,
//! so their buffer ranges are contiguous and never overlap.
//!
//! # State stacks
//!
//! Clip, crop, blend, transform and program state are pushed and popped by
//! the caller. They must be balanced at frame boundaries, which
//! [`DrawList::validate_stacks`] checks. Nothing repairs an unbalanced list.
//!
//! ```rust
//! use lumen_core::{Color, Rect};
//! use lumen_gpu::DrawList;
//!
//! let mut list = DrawList::default();
//! list.push_clip(&Rect::new(0.0, 0.0, 100.0, 100.0));
//! list.add_rect(&Rect::new(10.0, 10.0, 20.0, 20.0), Color::RED);
//! list.add_rect(&Rect::new(40.0, 10.0, 20.0, 20.0), Color::BLUE);
//! list.pop_clip();
//!
//! assert!(list.validate_stacks().is_ok());
//! assert_eq!(list.commands().len(), 1);
//! assert_eq!(list.commands_requested(), 2);
//! ```

use std::f32::consts::TAU;
use std::fmt;
use std::sync::Arc;

use lumen_core::{Affine2D, Color, ImageView, Point, Rect, Recycle};
use lumen_paint::polyline::is_convex;
use lumen_paint::{
    fill_concave, fill_convex, segments_for_arc, stroke, CornerFlags, Gradient, Mesh, Polyline,
    Vertex,
};
use lumen_text::{RichText, Text};

use crate::command::{
    batch_hash, BlendMode, BuiltinProgram, DeferredOp, DrawCommand, DrawMode, PrimitiveType,
    ProgramSetup,
};
use crate::config::DrawListConfig;
use crate::error::{RenderError, Result};

/// Sampler uniform textured programs read from
pub const TEXTURE_UNIFORM: &str = "u_texture";
/// Crop rectangle array of the crop-aware programs
pub const CROP_UNIFORM: &str = "u_crop_rects";
/// Distance field spread of the distance field programs
pub const SDF_SPREAD_UNIFORM: &str = "u_sdf_spread";
/// Outline color of distance field text
pub const OUTLINE_COLOR_UNIFORM: &str = "u_outline_color";
/// Outline width of distance field text, in pixels
pub const OUTLINE_WIDTH_UNIFORM: &str = "u_outline_width";

/// Two triangles over a quad's top-left, top-right, bottom-right, bottom-left
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

/// What a submission samples; decides its default program and blend mode
enum Fill {
    /// Untextured, `blended` when any emitted color is translucent
    Shape { blended: bool },
    Texture {
        view: ImageView,
        /// Spread of a distance field atlas
        distance_field: Option<f32>,
    },
}

/// Buffer ranges of one submission
#[derive(Debug, Clone, Copy)]
struct Span {
    vertices_offset: u32,
    vertices_count: u32,
    indices_offset: u32,
    indices_count: u32,
}

/// Resolved GPU state for one submission
struct State {
    blend: BlendMode,
    setup: ProgramSetup,
    batchable: bool,
}

/// Per-frame list of batched draw commands
#[derive(Debug, Clone)]
pub struct DrawList {
    config: DrawListConfig,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    commands: Vec<DrawCommand>,
    commands_requested: usize,

    clip_rects: Vec<Rect>,
    crop_rects: Vec<Rect>,
    blend_modes: Vec<BlendMode>,
    transforms: Vec<Affine2D>,
    programs: Vec<ProgramSetup>,

    // scratch, reused between calls
    path: Polyline,
    points: Vec<Point>,
    mesh: Mesh,
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new(DrawListConfig::default())
    }
}

impl DrawList {
    pub fn new(config: DrawListConfig) -> Self {
        Self {
            vertices: Vec::with_capacity(config.initial_vertex_capacity),
            indices: Vec::with_capacity(config.initial_index_capacity),
            commands: Vec::new(),
            commands_requested: 0,
            clip_rects: Vec::new(),
            crop_rects: Vec::new(),
            blend_modes: Vec::new(),
            transforms: Vec::new(),
            programs: Vec::new(),
            path: Polyline::new(),
            points: Vec::new(),
            mesh: Mesh::new(),
            config,
        }
    }

    pub fn config(&self) -> &DrawListConfig {
        &self.config
    }

    /// Replace the configuration; already recorded commands are kept
    pub fn set_config(&mut self, config: DrawListConfig) {
        self.config = config;
    }

    pub fn aa_size(&self) -> f32 {
        self.config.aa_size
    }

    /// Width of the anti-aliasing fringe for subsequent shapes
    pub fn set_aa_size(&mut self, aa_size: f32) {
        self.config.aa_size = aa_size.max(0.0);
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Vertex buffer as raw bytes, ready for upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Primitives submitted since the last clear, batched or not
    pub fn commands_requested(&self) -> usize {
        self.commands_requested
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop all content and state, keeping allocations
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.commands.clear();
        self.commands_requested = 0;
        self.clip_rects.clear();
        self.crop_rects.clear();
        self.blend_modes.clear();
        self.transforms.clear();
        self.programs.clear();
        self.path.clear();
        self.points.clear();
        self.mesh.clear();
    }

    // ─────────────────────────────────────────────────────────────────────
    // State stacks
    // ─────────────────────────────────────────────────────────────────────

    pub fn current_transform(&self) -> Affine2D {
        self.transforms.last().copied().unwrap_or(Affine2D::IDENTITY)
    }

    /// Active clip in target space
    pub fn current_clip(&self) -> Option<Rect> {
        self.clip_rects.last().copied()
    }

    pub fn crop_rects(&self) -> &[Rect] {
        &self.crop_rects
    }

    /// Clip subsequent draws to `rect`, given in the current transform's
    /// space and intersected with the active clip
    pub fn push_clip(&mut self, rect: &Rect) {
        let rect = self.current_transform().transform_rect(rect);
        let clip = match self.current_clip() {
            Some(current) => current.intersect(&rect),
            None => rect,
        };
        self.clip_rects.push(clip);
    }

    pub fn pop_clip(&mut self) {
        if self.clip_rects.pop().is_none() {
            tracing::warn!("pop_clip without a matching push_clip");
        }
    }

    /// Add a crop rectangle for subsequent textured draws
    pub fn push_crop(&mut self, rect: &Rect) {
        let rect = self.current_transform().transform_rect(rect);
        self.crop_rects.push(rect);
    }

    pub fn pop_crop(&mut self) {
        if self.crop_rects.pop().is_none() {
            tracing::warn!("pop_crop without a matching push_crop");
        }
    }

    /// Override the deduced blend mode
    pub fn push_blend(&mut self, blend: BlendMode) {
        self.blend_modes.push(blend);
    }

    pub fn pop_blend(&mut self) {
        if self.blend_modes.pop().is_none() {
            tracing::warn!("pop_blend without a matching push_blend");
        }
    }

    /// Apply `transform` before the current transform for subsequent draws
    pub fn push_transform(&mut self, transform: &Affine2D) {
        let combined = self.current_transform().then(transform);
        self.transforms.push(combined);
    }

    pub fn pop_transform(&mut self) {
        if self.transforms.pop().is_none() {
            tracing::warn!("pop_transform without a matching push_transform");
        }
    }

    /// Override the deduced program
    pub fn push_program(&mut self, setup: ProgramSetup) {
        self.programs.push(setup);
    }

    pub fn pop_program(&mut self) {
        if self.programs.pop().is_none() {
            tracing::warn!("pop_program without a matching push_program");
        }
    }

    /// Check that every state stack is empty
    pub fn validate_stacks(&self) -> Result<()> {
        let stacks = [
            ("clip", self.clip_rects.len()),
            ("crop", self.crop_rects.len()),
            ("blend", self.blend_modes.len()),
            ("transform", self.transforms.len()),
            ("program", self.programs.len()),
        ];
        for (stack, depth) in stacks {
            if depth != 0 {
                return Err(RenderError::StackImbalance { stack, depth });
            }
        }
        Ok(())
    }

    /// [`validate_stacks`](Self::validate_stacks) that logs instead of failing
    pub fn debug_validate(&self) -> bool {
        match self.validate_stacks() {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "draw list stacks are unbalanced");
                false
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Shapes
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_rect(&mut self, rect: &Rect, color: Color) {
        self.add_rounded_rect(rect, 0.0, CornerFlags::ALL, Gradient::solid(color));
    }

    /// Rectangle with one color per corner, starting top-left, clockwise
    pub fn add_rect_multicolor(&mut self, rect: &Rect, colors: [Color; 4]) {
        if rect.is_empty() {
            return;
        }
        let transform = self.current_transform();
        let span_start = self.span_start();
        for (corner, color) in rect.corners().iter().zip(colors) {
            self.vertices
                .push(Vertex::colored(transform.transform_point(*corner), color));
        }
        self.indices
            .extend(QUAD_INDICES.iter().map(|i| i + span_start.vertices_offset));
        let blended = colors.iter().any(|c| !c.is_opaque());
        self.finish_span(
            span_start,
            PrimitiveType::Triangles,
            DrawMode::Indexed,
            Fill::Shape { blended },
        );
    }

    pub fn add_rounded_rect(
        &mut self,
        rect: &Rect,
        rounding: f32,
        corners: CornerFlags,
        gradient: Gradient,
    ) {
        if rect.is_empty() {
            return;
        }
        self.path.clear().rect(rect, rounding, corners);
        let path = std::mem::take(&mut self.path);
        self.fill_points(path.points(), gradient);
        self.path = path;
    }

    pub fn add_rect_outline(&mut self, rect: &Rect, color: Color, thickness: f32, rounding: f32) {
        if rect.is_empty() {
            return;
        }
        self.path.clear().rect(rect, rounding, CornerFlags::ALL).close();
        self.stroke_scratch_path(color, thickness);
    }

    pub fn add_line(&mut self, from: Point, to: Point, color: Color, thickness: f32) {
        self.path.clear().line_to(from).line_to(to);
        self.stroke_scratch_path(color, thickness);
    }

    /// Stroke a polyline, joining its ends when it is closed
    pub fn add_polyline(&mut self, polyline: &Polyline, color: Color, thickness: f32) {
        self.stroke_points(polyline.points(), polyline.is_closed(), color, thickness);
    }

    /// Fill a polyline's outline
    ///
    /// Convex outlines get an anti-aliased fringe; others go through the
    /// concave tessellator without one.
    pub fn add_polyline_filled(&mut self, polyline: &Polyline, gradient: Gradient) {
        self.fill_points(polyline.points(), gradient);
    }

    /// Stroked ellipse; `segments == 0` picks a count from the radius
    pub fn add_ellipse(
        &mut self,
        center: Point,
        radii: Point,
        color: Color,
        thickness: f32,
        segments: u32,
    ) {
        let segments = ellipse_segments(radii, segments);
        self.path.clear().ellipse(center, radii, segments).close();
        self.stroke_scratch_path(color, thickness);
    }

    pub fn add_ellipse_filled(
        &mut self,
        center: Point,
        radii: Point,
        gradient: Gradient,
        segments: u32,
    ) {
        let segments = ellipse_segments(radii, segments);
        self.path.clear().ellipse(center, radii, segments);
        let path = std::mem::take(&mut self.path);
        self.fill_points(path.points(), gradient);
        self.path = path;
    }

    /// Cubic bezier from `p0` to `p1`; `segments == 0` subdivides adaptively
    #[allow(clippy::too_many_arguments)]
    pub fn add_bezier_curve(
        &mut self,
        p0: Point,
        cp0: Point,
        cp1: Point,
        p1: Point,
        color: Color,
        thickness: f32,
        segments: u32,
    ) {
        self.path
            .clear()
            .line_to(p0)
            .bezier_curve_to(cp0, cp1, p1, segments);
        self.stroke_scratch_path(color, thickness);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Images and text
    // ─────────────────────────────────────────────────────────────────────

    /// Draw `image` stretched over `rect`, tinted by `color`
    pub fn add_image(&mut self, image: &ImageView, rect: &Rect, color: Color) {
        if rect.is_empty() {
            return;
        }
        let transform = self.current_transform();
        let span_start = self.span_start();
        for (corner, uv) in rect.corners().iter().zip(image.uv.corners()) {
            self.vertices
                .push(Vertex::new(transform.transform_point(*corner), uv, color));
        }
        self.indices
            .extend(QUAD_INDICES.iter().map(|i| i + span_start.vertices_offset));
        self.finish_span(
            span_start,
            PrimitiveType::Triangles,
            DrawMode::Indexed,
            Fill::Texture {
                view: *image,
                distance_field: None,
            },
        );
    }

    /// Draw `image` clipped to a rounded rectangle
    pub fn add_image_rounded(
        &mut self,
        image: &ImageView,
        rect: &Rect,
        rounding: f32,
        corners: CornerFlags,
        color: Color,
    ) {
        if rounding <= 0.0 || corners.is_empty() {
            self.add_image(image, rect, color);
            return;
        }
        if rect.is_empty() {
            return;
        }

        self.path.clear().rect(rect, rounding, corners);
        let mut mesh = std::mem::take(&mut self.mesh);
        mesh.clear();
        fill_convex(
            self.path.points(),
            Gradient::solid(color),
            self.config.aa_size,
            &mut mesh,
        );
        let uv = image.uv;
        for v in &mut mesh.vertices {
            let p = v.position();
            let tx = ((p.x - rect.x()) / rect.width()).clamp(0.0, 1.0);
            let ty = ((p.y - rect.y()) / rect.height()).clamp(0.0, 1.0);
            v.uv = [uv.x() + tx * uv.width(), uv.y() + ty * uv.height()];
        }
        mesh.transform(&self.current_transform());
        self.push_mesh(
            &mesh,
            Fill::Texture {
                view: *image,
                distance_field: None,
            },
        );
        self.mesh = mesh;
    }

    /// Draw laid out text with its origin at `position`
    pub fn add_text(&mut self, text: &mut Text, position: Point) {
        self.add_text_transformed(text, &Affine2D::translation(position.x, position.y));
    }

    /// Draw laid out text mapped through `local` and then the current transform
    ///
    /// Distance field text with more vertices than
    /// `sdf_cpu_transform_max_vertices` is stored untransformed; its command
    /// pushes the transform on the renderer's matrix stack instead. Its
    /// outline is set through uniforms rather than extra glyph copies.
    pub fn add_text_transformed(&mut self, text: &mut Text, local: &Affine2D) {
        let font = Arc::clone(text.font());
        let outline = text.outline();
        let geometry = text.geometry();
        let quads = geometry.vertices.len() / 4;
        if quads == 0 {
            return;
        }
        let vertices = &geometry.vertices[..quads * 4];

        let transform = self.current_transform().then(local);
        let distance_field = font.is_sdf().then(|| font.sdf_spread());
        let defer = distance_field.is_some()
            && vertices.len() > self.config.sdf_cpu_transform_max_vertices
            && !transform.is_identity();

        let span_start = self.span_start();
        if defer {
            self.vertices.extend_from_slice(vertices);
        } else {
            self.vertices.extend(vertices.iter().map(|v| Vertex {
                pos: transform.transform_point(v.position()).to_array(),
                ..*v
            }));
        }
        for quad in 0..quads as u32 {
            let base = span_start.vertices_offset + quad * 4;
            self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
        }

        let fill = Fill::Texture {
            view: *font.atlas(),
            distance_field,
        };
        let mut state = self.resolve_state(&fill);
        if distance_field.is_some() && outline.is_visible() {
            state.setup.begin.push(DeferredOp::SetUniformColor {
                name: OUTLINE_COLOR_UNIFORM,
                color: outline.color,
            });
            state.setup.begin.push(DeferredOp::SetUniformFloat {
                name: OUTLINE_WIDTH_UNIFORM,
                value: outline.width,
            });
            state
                .setup
                .mix_uniforms(&(outline.color, outline.width.to_bits()));
        }
        if defer {
            state
                .setup
                .begin
                .push(DeferredOp::PushTransform(transform.to_mat4()));
            state.setup.end.push(DeferredOp::PopTransform);
            state.setup.mix_uniforms(&transform);
            tracing::trace!(
                vertices = vertices.len(),
                "deferring distance field text transform to the GPU"
            );
        }
        let span = self.span_since(span_start);
        self.add_command(PrimitiveType::Triangles, DrawMode::Indexed, span, state);
    }

    /// Draw rich text and its embedded scripts and images
    pub fn add_rich_text(&mut self, rich: &mut RichText, position: Point) {
        let origin = Affine2D::translation(position.x, position.y);
        let (text, embedded_texts, embedded_images) = rich.parts_mut();
        self.add_text_transformed(text, &origin);
        for embedded in embedded_texts.iter_mut().filter(|e| e.visible) {
            self.add_text_transformed(&mut embedded.text, &origin.then(&embedded.transform));
        }
        for embedded in embedded_images.iter().filter(|e| e.visible) {
            self.add_image(
                &embedded.image,
                &embedded.rect.offset(position.x, position.y),
                Color::WHITE,
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Raw submission and composition
    // ─────────────────────────────────────────────────────────────────────

    /// Submit raw vertices, mapped through the current transform
    ///
    /// Indexed submissions without indices are indexed automatically:
    /// triangles take every 4 vertices as a quad, lines join consecutive
    /// vertices, other topologies index the vertices in order. Only
    /// triangle and line lists can share a command with other draws.
    pub fn add_vertices(
        &mut self,
        primitive: PrimitiveType,
        draw_mode: DrawMode,
        vertices: &[Vertex],
        indices: Option<&[u32]>,
    ) {
        let vertices = match (draw_mode, indices, primitive) {
            (DrawMode::Indexed, None, PrimitiveType::Triangles) => {
                &vertices[..vertices.len() - vertices.len() % 4]
            }
            (DrawMode::Indexed, None, PrimitiveType::Lines) if vertices.len() < 2 => &vertices[..0],
            _ => vertices,
        };
        if vertices.is_empty() {
            return;
        }

        let transform = self.current_transform();
        let span_start = self.span_start();
        let base = span_start.vertices_offset;
        self.vertices.extend(vertices.iter().map(|v| Vertex {
            pos: transform.transform_point(v.position()).to_array(),
            ..*v
        }));

        if draw_mode == DrawMode::Indexed {
            let n = vertices.len() as u32;
            match (indices, primitive) {
                (Some(indices), _) => self.indices.extend(indices.iter().map(|i| i + base)),
                (None, PrimitiveType::Triangles) => {
                    for quad in 0..n / 4 {
                        let b = base + quad * 4;
                        self.indices.extend(QUAD_INDICES.iter().map(|i| b + i));
                    }
                }
                (None, PrimitiveType::Lines) => {
                    for i in 0..n - 1 {
                        self.indices.extend([base + i, base + i + 1]);
                    }
                }
                (None, _) => self.indices.extend(base..base + n),
            }
        }

        let blended = vertices.iter().any(|v| v.color[3] != 255);
        let mut state = self.resolve_state(&Fill::Shape { blended });
        state.batchable &= matches!(primitive, PrimitiveType::Triangles | PrimitiveType::Lines);
        let span = self.span_since(span_start);
        self.add_command(primitive, draw_mode, span, state);
    }

    /// Append another list's geometry and commands
    ///
    /// The appended commands keep their own batching: none of them is merged
    /// into this list's last command, even when their states match.
    pub fn add_list(&mut self, other: &DrawList) {
        let base_vertex = self.vertices.len() as u32;
        let base_index = self.indices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.indices
            .extend(other.indices.iter().map(|i| i + base_vertex));
        self.commands.extend(other.commands.iter().map(|c| DrawCommand {
            vertices_offset: c.vertices_offset + base_vertex,
            indices_offset: c.indices_offset + base_index,
            ..c.clone()
        }));
        self.commands_requested += other.commands_requested;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn stroke_scratch_path(&mut self, color: Color, thickness: f32) {
        let path = std::mem::take(&mut self.path);
        self.stroke_points(path.points(), path.is_closed(), color, thickness);
        self.path = path;
    }

    fn stroke_points(&mut self, points: &[Point], closed: bool, color: Color, thickness: f32) {
        if points.len() < 2 || thickness <= 0.0 {
            return;
        }
        self.load_points(points);
        let mut mesh = std::mem::take(&mut self.mesh);
        mesh.clear();
        stroke(
            &self.points,
            closed,
            color,
            thickness,
            self.config.aa_size,
            &mut mesh,
        );
        let blended = mesh.has_translucency();
        self.push_mesh(&mesh, Fill::Shape { blended });
        self.mesh = mesh;
    }

    fn fill_points(&mut self, points: &[Point], gradient: Gradient) {
        if points.len() < 3 {
            return;
        }
        self.load_points(points);
        let mut mesh = std::mem::take(&mut self.mesh);
        mesh.clear();
        if is_convex(&self.points) {
            fill_convex(&self.points, gradient, self.config.aa_size, &mut mesh);
        } else if fill_concave(&self.points, gradient, &mut mesh).is_err() {
            // already logged by the tessellator; the shape is dropped
            mesh.clear();
        }
        let blended = mesh.has_translucency();
        self.push_mesh(&mesh, Fill::Shape { blended });
        self.mesh = mesh;
    }

    /// Copy `points` into scratch storage, mapped through the current transform
    fn load_points(&mut self, points: &[Point]) {
        let transform = self.current_transform();
        self.points.clear();
        self.points
            .extend(points.iter().map(|p| transform.transform_point(*p)));
    }

    /// Append an already transformed mesh
    fn push_mesh(&mut self, mesh: &Mesh, fill: Fill) {
        if mesh.is_empty() {
            return;
        }
        let span_start = self.span_start();
        self.vertices.extend_from_slice(&mesh.vertices);
        self.indices
            .extend(mesh.indices.iter().map(|i| i + span_start.vertices_offset));
        self.finish_span(span_start, PrimitiveType::Triangles, DrawMode::Indexed, fill);
    }

    fn span_start(&self) -> Span {
        Span {
            vertices_offset: self.vertices.len() as u32,
            vertices_count: 0,
            indices_offset: self.indices.len() as u32,
            indices_count: 0,
        }
    }

    fn span_since(&self, start: Span) -> Span {
        Span {
            vertices_count: self.vertices.len() as u32 - start.vertices_offset,
            indices_count: self.indices.len() as u32 - start.indices_offset,
            ..start
        }
    }

    fn finish_span(&mut self, start: Span, primitive: PrimitiveType, draw_mode: DrawMode, fill: Fill) {
        let state = self.resolve_state(&fill);
        let span = self.span_since(start);
        self.add_command(primitive, draw_mode, span, state);
    }

    /// Blend mode and program for a submission, from the stacks or deduced
    fn resolve_state(&self, fill: &Fill) -> State {
        let explicit_blend = self.blend_modes.last().copied();
        match fill {
            Fill::Shape { blended } => {
                let setup = self.programs.last().cloned().unwrap_or_default();
                let deduced = if *blended {
                    BlendMode::Normal
                } else {
                    BlendMode::None
                };
                State {
                    blend: explicit_blend.unwrap_or(deduced),
                    batchable: setup.is_batchable(),
                    setup,
                }
            }
            Fill::Texture {
                view,
                distance_field,
            } => {
                let cropped = !self.crop_rects.is_empty();
                let mut setup = match self.programs.last() {
                    Some(explicit) => explicit.clone(),
                    None => {
                        let builtin = if distance_field.is_some() {
                            BuiltinProgram::DistanceField
                        } else {
                            BuiltinProgram::for_channels(view.channels())
                        };
                        ProgramSetup::new(if cropped {
                            builtin.with_crop()
                        } else {
                            builtin
                        })
                    }
                };
                let batchable = setup.is_batchable();

                setup.begin.push(DeferredOp::SetUniformTexture {
                    name: TEXTURE_UNIFORM,
                    texture: view.texture,
                    slot: 0,
                });
                setup.mix_uniforms(&view.texture);
                if let Some(spread) = distance_field {
                    setup.begin.push(DeferredOp::SetUniformFloat {
                        name: SDF_SPREAD_UNIFORM,
                        value: *spread,
                    });
                    setup.mix_uniforms(&spread.to_bits());
                }
                if cropped {
                    setup.begin.push(DeferredOp::SetUniformRects {
                        name: CROP_UNIFORM,
                        rects: self.crop_rects.clone(),
                    });
                    setup.mix_uniforms(self.crop_rects.as_slice());
                }

                // crops discard fragments, which only composites with blending
                let blend = if cropped {
                    BlendMode::Normal
                } else {
                    explicit_blend.unwrap_or(BlendMode::Normal)
                };
                State {
                    blend,
                    setup,
                    batchable,
                }
            }
        }
    }

    /// Extend the last command or start a new one
    fn add_command(
        &mut self,
        primitive: PrimitiveType,
        draw_mode: DrawMode,
        span: Span,
        state: State,
    ) {
        if span.vertices_count == 0 {
            return;
        }
        self.commands_requested += 1;

        let clip = self.current_clip();
        let hash = if state.batchable && !self.config.disable_batching {
            batch_hash(primitive, draw_mode, state.blend, clip.as_ref(), &state.setup)
        } else {
            0
        };

        if hash != 0 {
            if let Some(last) = self.commands.last_mut() {
                if last.hash == hash {
                    last.vertices_offset = last.vertices_offset.min(span.vertices_offset);
                    last.vertices_count += span.vertices_count;
                    last.indices_offset = last.indices_offset.min(span.indices_offset);
                    last.indices_count += span.indices_count;
                    return;
                }
            }
        }

        self.commands.push(DrawCommand {
            primitive,
            draw_mode,
            blend: state.blend,
            vertices_offset: span.vertices_offset,
            vertices_count: span.vertices_count,
            indices_offset: span.indices_offset,
            indices_count: span.indices_count,
            clip,
            setup: state.setup,
            hash,
        });
    }
}

fn ellipse_segments(radii: Point, segments: u32) -> u32 {
    if segments > 0 {
        segments
    } else {
        segments_for_arc(radii.x.max(radii.y), TAU)
    }
}

impl Recycle for DrawList {
    fn recycle(&mut self) {
        self.clear();
    }
}

impl fmt::Display for DrawList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.commands.len();
        write!(
            f,
            "DrawList: {} commands requested, {} rendered ({} saved by batching), {} vertices, {} indices",
            self.commands_requested,
            rendered,
            self.commands_requested.saturating_sub(rendered),
            self.vertices.len(),
            self.indices.len()
        )
    }
}
