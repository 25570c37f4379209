//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay free of browser and
//! GPU dependencies:
//! - Seeded RNG only
//! - Input arrives as a drained event list
//! - Output is draw commands and effects, never direct platform calls

pub mod arena;
pub mod collision;
pub mod draw;
pub mod entity;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod zones;

pub use arena::{Arena, EnemyId};
pub use collision::Aabb;
pub use draw::DrawCommand;
pub use entity::Entity;
pub use spawner::Spawner;
pub use state::{GamePhase, GameState, OverlayMirror, Screen, StateMachine, Texts};
pub use tick::{Effect, OverlayCommand, SCORE_VIEW, TickOutput, tick};
pub use zones::{Band, Zones};
