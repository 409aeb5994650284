//! Wavering library - audio-reactive radial visualisers

pub mod audio;
pub mod cli;
pub mod geometry;
pub mod params;
pub mod render;
pub mod render_loop;
pub mod visualisers;
