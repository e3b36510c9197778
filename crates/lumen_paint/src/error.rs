//! Tessellation errors

use thiserror::Error;

/// Failure of the concave fill path
///
/// The convex fill and stroke paths cannot fail: degenerate input yields no
/// geometry instead.
#[derive(Debug, Error)]
pub enum TessellationError {
    #[error("point {index} is not finite")]
    NonFinite { index: usize },

    #[error("lyon tessellation failed: {0:?}")]
    Lyon(lyon::tessellation::TessellationError),
}

impl From<lyon::tessellation::TessellationError> for TessellationError {
    fn from(err: lyon::tessellation::TessellationError) -> Self {
        TessellationError::Lyon(err)
    }
}
