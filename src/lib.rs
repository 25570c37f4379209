//! Lane Hopper - A lane-crossing arcade game
//!
//! Core modules:
//! - `sim`: Simulation (entities, zones, spawning, state machine, update step)
//! - `frame`: Frame scheduling and per-frame motion scale
//! - `input`: Keyboard/pointer event queue and direction intent
//! - `audio`: Playback tracking and Web Audio backend
//! - `assets`: Asset manifest, bundle and browser loader
//! - `config`: Game configuration and parameter validation
//! - `settings` / `persistence`: Persisted mute flag
//! - `platform`: Overlay and host shell collaborators
//! - `renderer`: WebGPU sprite pipeline
//! - `game`: Driver that wires the above together

pub mod assets;
pub mod audio;
pub mod config;
pub mod frame;
pub mod game;
pub mod input;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use config::{ConfigError, GameConfig, GameParams};
pub use game::Game;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Nominal frame duration used before a real frame delta exists (ms)
    pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;
    /// Longest frame delta fed into the motion scale (ms)
    pub const MAX_FRAME_MS: f64 = 100.0;
    /// Screen scale factor: `(width + height) / 2 * SCREEN_SCALE_FACTOR`
    pub const SCREEN_SCALE_FACTOR: f32 = 0.003;
    /// Frame scale factor: `screen_scale * rate_ms * FRAME_SCALE_FACTOR`
    pub const FRAME_SCALE_FACTOR: f32 = 0.01;

    /// Player sprite is square, `min(PLAYER_BASE * scale, PLAYER_MAX)`
    pub const PLAYER_BASE: f32 = 40.0;
    pub const PLAYER_MAX: f32 = 120.0;
    /// Enemy sprite dimensions
    pub const ENEMY_BASE_WIDTH: f32 = 60.0;
    pub const ENEMY_MAX_WIDTH: f32 = 180.0;
    pub const ENEMY_BASE_HEIGHT: f32 = 40.0;
    pub const ENEMY_MAX_HEIGHT: f32 = 120.0;
    /// Safe zone height relative to player height
    pub const SAFE_ZONE_RATIO: f32 = 1.25;

    /// Frames between middle-zone dwell points
    pub const DWELL_INTERVAL: u64 = 30;
    /// Points for each dwell interval spent in the middle zone
    pub const DWELL_POINTS: u64 = 1;
    /// Points for reaching the goal
    pub const GOAL_POINTS: u64 = 100;
    /// How far the player's feet may still overlap the middle zone at the goal (px)
    pub const GOAL_SLACK: f32 = 20.0;
    /// Pointer "arrived" threshold as a fraction of player size
    pub const ARRIVE_FRACTION: f32 = 1.0 / 8.0;
}

/// Compute the screen-wide scale factor from canvas dimensions
#[inline]
pub fn screen_scale(width: f32, height: f32) -> f32 {
    (width + height) / 2.0 * consts::SCREEN_SCALE_FACTOR
}
