//! Renderer configuration
//!
//! Loaded from TOML. Every field is optional:
//!
//! ```toml
//! [draw_list]
//! sdf_cpu_transform_max_vertices = 512
//! aa_size = 1.0
//!
//! [renderer]
//! pool_capacity = 4
//! buffer_growth_factor = 1.5
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML was malformed or had fields of the wrong type
    #[error("Failed to parse render config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub draw_list: DrawListConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
}

impl RenderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded render config");
        Ok(config)
    }
}

/// Draw list behavior
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DrawListConfig {
    /// Distance field text batches above this many vertices keep their
    /// vertices untransformed and let the GPU apply the transform
    #[serde(default = "default_sdf_cpu_transform_max_vertices")]
    pub sdf_cpu_transform_max_vertices: usize,
    /// Give every command the "never batch" hash (debugging aid)
    #[serde(default)]
    pub disable_batching: bool,
    /// Width of the anti-aliasing fringe on shapes, 0 disables it
    #[serde(default = "default_aa_size")]
    pub aa_size: f32,
    #[serde(default = "default_initial_vertex_capacity")]
    pub initial_vertex_capacity: usize,
    #[serde(default = "default_initial_index_capacity")]
    pub initial_index_capacity: usize,
}

fn default_sdf_cpu_transform_max_vertices() -> usize {
    256
}

fn default_aa_size() -> f32 {
    1.0
}

fn default_initial_vertex_capacity() -> usize {
    1024
}

fn default_initial_index_capacity() -> usize {
    2048
}

impl Default for DrawListConfig {
    fn default() -> Self {
        Self {
            sdf_cpu_transform_max_vertices: default_sdf_cpu_transform_max_vertices(),
            disable_batching: false,
            aa_size: default_aa_size(),
            initial_vertex_capacity: default_initial_vertex_capacity(),
            initial_index_capacity: default_initial_index_capacity(),
        }
    }
}

/// Renderer behavior
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RendererConfig {
    /// Released draw lists kept for reuse
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
    /// Check draw list stacks before every draw
    #[serde(default = "default_validate_stacks")]
    pub validate_stacks: bool,
    /// Buffer capacity multiplier applied when an upload does not fit
    #[serde(default = "default_buffer_growth_factor")]
    pub buffer_growth_factor: f32,
}

fn default_pool_capacity() -> usize {
    8
}

fn default_validate_stacks() -> bool {
    cfg!(debug_assertions)
}

fn default_buffer_growth_factor() -> f32 {
    2.0
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            pool_capacity: default_pool_capacity(),
            validate_stacks: default_validate_stacks(),
            buffer_growth_factor: default_buffer_growth_factor(),
        }
    }
}
