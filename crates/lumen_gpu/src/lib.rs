//! Lumen GPU
//!
//! Batches shapes, images and text into draw commands and executes them on
//! a pluggable backend.
//!
//! # Features
//!
//! - [`DrawList`]: shared vertex/index buffers plus a command stream where
//!   adjacent draws with equal GPU state merge into one command
//! - Clip, crop, blend, transform and program stacks
//! - [`Renderer`]: uploads a list and issues one backend draw per command
//! - Backend contract as traits ([`RenderBackend`], [`GpuContext`]) so any
//!   graphics API can sit underneath
//! - TOML configuration ([`RenderConfig`])

pub mod backend;
pub mod command;
pub mod config;
pub mod draw_list;
pub mod error;
pub mod renderer;

pub use backend::{
    FramebufferId, GpuContext, Interpolation, RenderBackend, TextureWrap, UniformValue,
};
pub use command::{
    batch_hash, BlendMode, BuiltinProgram, DeferredOp, DrawCommand, DrawMode, PrimitiveType,
    ProgramRef, ProgramSetup,
};
pub use config::{ConfigError, DrawListConfig, RenderConfig, RendererConfig};
pub use draw_list::DrawList;
pub use error::{RenderError, Result};
pub use renderer::{FrameStats, ProgramRegistry, Renderer, TRANSFORM_UNIFORM};
