//! Parameter definitions with units and documented semantics.
//!
//! All tuning constants for analysis and the visual layers live here:
//! - Units (decibels, pixels, clip-space units, fractions of a dimension)
//! - Documented ranges and meanings
//! - `Default` values matching the shipped look

mod audio;
mod render;
mod visuals;

// Re-export all types
pub use audio::{audio_constants, AnalyserConfig, TimeSmoothing};
pub use render::{LayerConfig, RenderConfig, DEFAULT_BACKGROUND_OPACITY};
pub use visuals::{BackgroundParams, ColorStop, RadialBarsParams, TimeDomainParams};
