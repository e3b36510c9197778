//! Vertex and mesh buffers

use lumen_core::{Affine2D, Color, Point, Rect, Recycle};

/// A vertex as uploaded to the GPU
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

impl Vertex {
    pub fn new(pos: Point, uv: Point, color: Color) -> Self {
        Self {
            pos: pos.to_array(),
            uv: uv.to_array(),
            color: color.to_array(),
        }
    }

    /// Untextured vertex
    pub fn colored(pos: Point, color: Color) -> Self {
        Self::new(pos, Point::ZERO, color)
    }

    pub fn position(&self) -> Point {
        Point::from(self.pos)
    }

    pub fn color(&self) -> Color {
        Color::from(self.color)
    }
}

/// Local geometry: indices count from this mesh's first vertex
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, indices: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            indices: Vec::with_capacity(indices),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    pub fn reserve(&mut self, vertices: usize, indices: usize) {
        self.vertices.reserve(vertices);
        self.indices.reserve(indices);
    }

    /// Index the next pushed vertex will get
    pub fn next_index(&self) -> u32 {
        self.vertices.len() as u32
    }

    pub fn push_vertex(&mut self, vertex: Vertex) {
        self.vertices.push(vertex);
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Append another mesh, rebasing its indices
    pub fn append(&mut self, other: &Mesh) {
        let base = self.next_index();
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + base));
    }

    /// Apply a transform to every vertex position
    pub fn transform(&mut self, transform: &Affine2D) {
        if transform.is_identity() {
            return;
        }
        for v in &mut self.vertices {
            v.pos = transform.transform_point(Point::from(v.pos)).to_array();
        }
    }

    pub fn bounds(&self) -> Option<Rect> {
        let points: Vec<Point> = self.vertices.iter().map(Vertex::position).collect();
        Rect::bounding(&points)
    }

    /// True when any vertex is not fully opaque
    pub fn has_translucency(&self) -> bool {
        self.vertices.iter().any(|v| v.color[3] != 255)
    }
}

impl Recycle for Mesh {
    fn recycle(&mut self) {
        self.clear();
    }
}
