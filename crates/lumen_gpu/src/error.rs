//! Renderer error types

use thiserror::Error;

/// Errors raised while rendering a draw list
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The GPU context could not be made current on this thread
    #[error("Failed to activate GPU context: {0}")]
    ContextActivation(String),

    /// The backend could not grow its vertex/index buffers
    #[error("Failed to reserve GPU buffers for {vertices} vertices and {indices} indices")]
    BufferReservation { vertices: usize, indices: usize },

    /// Any other backend failure
    #[error("Backend error: {0}")]
    Backend(String),

    /// A push/pop stack was left unbalanced at a frame boundary
    #[error("Unbalanced {stack} stack: {depth} entries left")]
    StackImbalance { stack: &'static str, depth: usize },
}

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, RenderError>;
