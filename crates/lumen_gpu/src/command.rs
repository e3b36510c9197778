//! Draw commands and the program state they carry

use lumen_core::{hash_of, Color, Mat4, Rect, StateHasher, TextureId};
use smallvec::SmallVec;

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveType {
    #[default]
    Triangles,
    Lines,
    TriangleFan,
    TriangleStrip,
    LineLoop,
}

/// Whether a command draws through the index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    #[default]
    Indexed,
    Array,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Overwrite the target
    #[default]
    None,
    /// Source-over alpha blending
    Normal,
    Additive,
    Multiply,
}

/// Shader programs every backend is expected to provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinProgram {
    /// Vertex colors only
    Simple,
    /// Alpha-only texture tinted by vertex color
    SingleChannel,
    /// RGBA texture modulated by vertex color
    MultiChannel,
    SingleChannelCrop,
    MultiChannelCrop,
    /// Signed distance field glyphs
    DistanceField,
    DistanceFieldCrop,
}

impl BuiltinProgram {
    /// Crop-aware variant of this program
    pub fn with_crop(self) -> Self {
        match self {
            Self::SingleChannel | Self::SingleChannelCrop => Self::SingleChannelCrop,
            Self::MultiChannel | Self::MultiChannelCrop => Self::MultiChannelCrop,
            Self::DistanceField | Self::DistanceFieldCrop => Self::DistanceFieldCrop,
            // untextured draws have nothing to crop
            Self::Simple => Self::Simple,
        }
    }

    /// Program sampling a texture with the given channel count
    pub fn for_channels(channels: u32) -> Self {
        if channels == 1 {
            Self::SingleChannel
        } else {
            Self::MultiChannel
        }
    }
}

/// Program identity, looked up in the renderer's registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramRef {
    Builtin(BuiltinProgram),
    Custom(u32),
}

impl Default for ProgramRef {
    fn default() -> Self {
        ProgramRef::Builtin(BuiltinProgram::Simple)
    }
}

impl From<BuiltinProgram> for ProgramRef {
    fn from(program: BuiltinProgram) -> Self {
        ProgramRef::Builtin(program)
    }
}

/// GPU state change executed by the renderer around a command's draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredOp {
    /// Multiply the renderer's current transform and push the result
    PushTransform(Mat4),
    PopTransform,
    SetUniformTexture {
        name: &'static str,
        texture: TextureId,
        slot: u32,
    },
    SetUniformRects {
        name: &'static str,
        rects: Vec<Rect>,
    },
    SetUniformColor {
        name: &'static str,
        color: Color,
    },
    SetUniformFloat {
        name: &'static str,
        value: f32,
    },
    SetUniformInt {
        name: &'static str,
        value: i32,
    },
}

/// Program plus the deferred ops run before and after the draw
///
/// `uniforms_hash` stands for everything the ops set; two setups with the same
/// program and the same nonzero `uniforms_hash` are treated as identical.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramSetup {
    pub program: ProgramRef,
    pub begin: SmallVec<[DeferredOp; 4]>,
    pub end: SmallVec<[DeferredOp; 2]>,
    pub uniforms_hash: u64,
}

impl ProgramSetup {
    pub fn new(program: impl Into<ProgramRef>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn with_begin(mut self, op: DeferredOp) -> Self {
        self.begin.push(op);
        self
    }

    pub fn with_end(mut self, op: DeferredOp) -> Self {
        self.end.push(op);
        self
    }

    pub fn with_uniforms_hash(mut self, hash: u64) -> Self {
        self.uniforms_hash = hash;
        self
    }

    /// Fold another value into the uniforms hash
    pub fn mix_uniforms<T: std::hash::Hash + ?Sized>(&mut self, value: &T) {
        self.uniforms_hash = StateHasher::new()
            .write_u64(self.uniforms_hash)
            .write_u64(hash_of(value))
            .finish();
    }

    /// Setups carrying ops without a uniforms hash cannot be compared
    pub fn is_batchable(&self) -> bool {
        self.uniforms_hash != 0 || (self.begin.is_empty() && self.end.is_empty())
    }
}

/// One draw call over a contiguous range of a draw list's buffers
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub primitive: PrimitiveType,
    pub draw_mode: DrawMode,
    pub blend: BlendMode,
    pub vertices_offset: u32,
    pub vertices_count: u32,
    pub indices_offset: u32,
    pub indices_count: u32,
    /// Scissor rectangle in target space
    pub clip: Option<Rect>,
    pub setup: ProgramSetup,
    /// Batching key, 0 when the command must stand alone
    pub hash: u64,
}

impl DrawCommand {
    /// Number of elements the draw call consumes
    pub fn element_count(&self) -> u32 {
        match self.draw_mode {
            DrawMode::Indexed => self.indices_count,
            DrawMode::Array => self.vertices_count,
        }
    }
}

/// Batching key of a draw with the given state
///
/// Texture identity and crop rectangles reach the key through the setup's
/// uniforms hash.
pub fn batch_hash(
    primitive: PrimitiveType,
    draw_mode: DrawMode,
    blend: BlendMode,
    clip: Option<&Rect>,
    setup: &ProgramSetup,
) -> u64 {
    StateHasher::new()
        .write(&draw_mode)
        .write(&primitive)
        .write(&blend)
        .write_opt_rect(clip)
        .write(&setup.program)
        .write_u64(setup.uniforms_hash)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_tracks_state() {
        let setup = ProgramSetup::default();
        let base = batch_hash(
            PrimitiveType::Triangles,
            DrawMode::Indexed,
            BlendMode::None,
            None,
            &setup,
        );
        let blended = batch_hash(
            PrimitiveType::Triangles,
            DrawMode::Indexed,
            BlendMode::Normal,
            None,
            &setup,
        );
        let clipped = batch_hash(
            PrimitiveType::Triangles,
            DrawMode::Indexed,
            BlendMode::None,
            Some(&Rect::new(0.0, 0.0, 1.0, 1.0)),
            &setup,
        );
        assert_ne!(base, blended);
        assert_ne!(base, clipped);

        let mut textured = setup.clone();
        textured.mix_uniforms(&TextureId(4));
        let other = batch_hash(
            PrimitiveType::Triangles,
            DrawMode::Indexed,
            BlendMode::None,
            None,
            &textured,
        );
        assert_ne!(base, other);
    }

    #[test]
    fn test_ops_without_hash_are_unbatchable() {
        let setup = ProgramSetup::new(ProgramRef::Custom(1)).with_begin(DeferredOp::SetUniformFloat {
            name: "time",
            value: 0.5,
        });
        assert!(!setup.is_batchable());
        assert!(setup.with_uniforms_hash(7).is_batchable());
        assert!(ProgramSetup::new(BuiltinProgram::Simple).is_batchable());
    }

    #[test]
    fn test_crop_variants() {
        assert_eq!(BuiltinProgram::for_channels(1).with_crop(), BuiltinProgram::SingleChannelCrop);
        assert_eq!(BuiltinProgram::for_channels(4).with_crop(), BuiltinProgram::MultiChannelCrop);
        assert_eq!(BuiltinProgram::DistanceField.with_crop(), BuiltinProgram::DistanceFieldCrop);
    }
}
