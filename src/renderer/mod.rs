//! WebGPU rendering module
//!
//! Replays the simulation's draw commands as textured quads.

pub mod pipeline;
pub mod vertex;

pub use pipeline::{RenderError, SpriteRenderer};
pub use vertex::{Batch, SpriteVertex, build_batches};
