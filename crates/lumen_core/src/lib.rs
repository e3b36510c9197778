//! Lumen Core
//!
//! Foundational value types shared by every Lumen crate:
//!
//! - **Geometry**: points, sizes, rectangles, 2D affine transforms and 4x4 matrices
//! - **Color**: packed 8-bit RGBA colors as stored in vertices
//! - **Resources**: opaque texture handles and image views into them
//! - **Hashing**: the state hasher used to compute batching keys
//! - **Pooling**: an explicit object pool for recycling per-frame buffers
//!
//! # Example
//!
//! ```rust
//! use lumen_core::{Affine2D, Point, Rect};
//!
//! let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
//! let moved = Affine2D::translation(5.0, 5.0).transform_rect(&rect);
//! assert!(moved.contains(Point::new(15.0, 15.0)));
//! ```

pub mod color;
pub mod geometry;
pub mod hash;
pub mod pool;
pub mod resource;

pub use color::Color;
pub use geometry::{Affine2D, Mat4, Point, Rect, Size};
pub use hash::{hash_of, StateHasher};
pub use pool::{ObjectPool, PoolStats, Recycle};
pub use resource::{ImageView, TextureFormat, TextureId};
