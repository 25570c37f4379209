//! Draw commands produced by the simulation
//!
//! The simulation never touches the GPU; it emits a flat command list per
//! frame that the renderer replays in order.

use crate::assets::Sprite;

/// A single draw request in screen-space pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    /// Clear the whole canvas
    Clear,
    /// Paint a sprite stretched into the given rectangle
    Sprite {
        sprite: Sprite,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

impl DrawCommand {
    /// Sprite drawn by this command, if any
    pub fn sprite(&self) -> Option<Sprite> {
        match self {
            DrawCommand::Sprite { sprite, .. } => Some(*sprite),
            DrawCommand::Clear => None,
        }
    }
}
