//! GPU plumbing shared by every visualiser.
//!
//! Each visualiser draws into its own offscreen [`LayerTexture`]; the
//! [`Compositor`] stacks the layers onto the window surface.

mod canvas;
mod compositor;
mod cpu_canvas;
mod gpu;
mod layer;
mod shader;
mod surface;

use glam::Vec2;
use thiserror::Error;

use crate::audio::AudioAnalysisData;

// Re-export public types
pub use canvas::{BufferUsage, CompiledShader, DrawCall, GpuCanvas, PipelineOptions};
pub use compositor::Compositor;
pub use cpu_canvas::CpuCanvas;
pub use gpu::GpuDevice;
pub use layer::{LayerTexture, LAYER_FORMAT};
pub use shader::{
    reflect_program, template_shader, validate_wgsl, AttributeInfo, ProgramLayout, ShaderTemplate,
    UniformInfo,
};
pub use surface::{LayoutSize, Surface};

/// Rendering errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("Unknown shader placeholder: {0}")]
    UnknownPlaceholder(String),

    #[error("Shader placeholders left unresolved: {}", .0.join(", "))]
    UnresolvedPlaceholders(Vec<String>),

    #[error("Unknown vertex attribute: {0}")]
    UnknownAttribute(String),

    #[error("Attribute {name} takes {expected} components per vertex, got {actual}")]
    AttributeSize {
        name: String,
        expected: u32,
        actual: u32,
    },

    #[error("Cannot allocate a {0}x{1} pixmap")]
    Pixmap(u32, u32),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Out of GPU memory")]
    OutOfMemory,
}

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, RenderError>;

/// A renderer driven once per frame with the current analysis data
pub trait Visualiser {
    /// Match the backing store to the host layout (`None`) or to an explicit pixel size
    fn resize(&mut self, size: Option<(u32, u32)>);

    /// Draw one frame. The layer is fully redrawn on every call.
    fn render(&mut self, data: &AudioAnalysisData<'_>);

    /// Center of the drawable area in pixels
    fn center(&self) -> Vec2;

    /// Smaller of the two drawable dimensions in pixels
    fn min_dim(&self) -> f32;
}

/// A visualiser the orchestrator can stack and resize
pub trait Layer: Visualiser {
    fn layer_texture(&self) -> &LayerTexture;

    fn surface_mut(&mut self) -> &mut Surface;
}
