//! Lumen Paint
//!
//! Turns point sequences into GPU-ready triangle geometry.
//!
//! # Features
//!
//! - Polyline building (lines, arcs, bezier curves, rounded rects, ellipses)
//! - Convex fills with an anti-aliased fringe and vertical gradients
//! - Strokes with thin and thick anti-aliased variants
//! - Concave fills through lyon
//!
//! All tessellators append into a [`Mesh`] whose indices are relative to the
//! mesh's first vertex, so the draw list can rebase them when it copies the
//! mesh into its shared buffers.

pub mod error;
pub mod polyline;
pub mod tessellate;
pub mod vertex;

pub use error::TessellationError;
pub use polyline::{segments_for_arc, CornerFlags, Polyline};
pub use tessellate::{fill_concave, fill_convex, stroke, Gradient};
pub use vertex::{Mesh, Vertex};
