//! Batching hash helpers
//!
//! Batching keys are 64-bit FxHash digests of the GPU state a draw needs.
//! The value `0` is reserved by the draw list as the "never batch" marker;
//! a real digest landing on 0 is possible in principle and is accepted.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

use crate::geometry::Rect;

/// Incremental hasher used to build batching keys
#[derive(Default)]
pub struct StateHasher {
    inner: FxHasher,
}

impl StateHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.inner.write_u64(value);
        self
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.inner.write_u32(value);
        self
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.inner.write_u32(value.to_bits());
        self
    }

    pub fn write_rect(&mut self, rect: &Rect) -> &mut Self {
        rect.hash(&mut self.inner);
        self
    }

    /// Hash an optional rect, keeping `None` distinct from any rect
    pub fn write_opt_rect(&mut self, rect: Option<&Rect>) -> &mut Self {
        match rect {
            Some(r) => {
                self.inner.write_u8(1);
                r.hash(&mut self.inner);
            }
            None => self.inner.write_u8(0),
        }
        self
    }

    pub fn write<T: Hash + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.hash(&mut self.inner);
        self
    }

    pub fn finish(&self) -> u64 {
        self.inner.finish()
    }
}

/// One-shot hash of any hashable value
pub fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = FxHasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}
