//! Game state and the phase state machine
//!
//! `GameState` is the explicit context every subsystem works on: screen
//! metrics, validated parameters, zones, entities, counters, input and the
//! overlay mirror all live here.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::arena::Arena;
use super::entity::Entity;
use super::spawner::Spawner;
use super::zones::Zones;
use crate::assets::Sprite;
use crate::config::{GameConfig, GameParams};
use crate::input::InputState;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// Waiting for the asset bundle
    Loading,
    /// Start banner shown, waiting for the start click
    Ready,
    /// Active gameplay
    Play,
    /// All crossings done
    Win,
    /// Out of lives
    Over,
    /// Torn down; no further frames
    Stop,
}

impl GamePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GamePhase::Loading => "loading",
            GamePhase::Ready => "ready",
            GamePhase::Play => "play",
            GamePhase::Win => "win",
            GamePhase::Over => "over",
            GamePhase::Stop => "stop",
        }
    }
}

/// Phase tracker that remembers the phase it left
#[derive(Debug, Clone)]
pub struct StateMachine {
    current: GamePhase,
    prev: Option<GamePhase>,
    pub muted: bool,
    pub background_music_started: bool,
}

impl StateMachine {
    pub fn new(muted: bool) -> Self {
        Self {
            current: GamePhase::Loading,
            prev: None,
            muted,
            background_music_started: false,
        }
    }

    pub fn current(&self) -> GamePhase {
        self.current
    }

    pub fn prev(&self) -> Option<GamePhase> {
        self.prev
    }

    pub fn is(&self, phase: GamePhase) -> bool {
        self.current == phase
    }

    /// True on ticks where the previous `set` left `phase`
    pub fn came_from(&self, phase: GamePhase) -> bool {
        self.prev == Some(phase)
    }

    /// Enter `next`, recording the outgoing phase (also when re-entering)
    pub fn set(&mut self, next: GamePhase) {
        if self.current != next {
            log::debug!("Phase {} -> {}", self.current.as_str(), next.as_str());
        }
        self.prev = Some(self.current);
        self.current = next;
    }
}

/// Canvas dimensions and derived scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Screen {
    pub width: f32,
    pub height: f32,
    pub scale: f32,
}

impl Screen {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            scale: crate::screen_scale(width, height),
        }
    }

    pub fn center_x(&self) -> f32 {
        self.width / 2.0
    }
}

/// Overlay strings taken from the configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texts {
    pub name: String,
    pub start: String,
    pub win: String,
    pub gameover: String,
    pub instructions_desktop: String,
    pub instructions_mobile: String,
}

impl Texts {
    pub fn from_config(config: &GameConfig) -> Self {
        let s = &config.settings;
        Self {
            name: s.name.clone(),
            start: s.start_text.clone(),
            win: s.win_text.clone(),
            gameover: s.gameover_text.clone(),
            instructions_desktop: s.instructions_desktop.clone(),
            instructions_mobile: s.instructions_mobile.clone(),
        }
    }
}

/// What the overlay is currently showing, so commands are emitted on change only
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayMirror {
    pub banner: Option<String>,
    pub button: Option<String>,
    pub instructions: bool,
    pub stats: bool,
    pub score: Option<u64>,
    pub lives: Option<i32>,
    pub mute: Option<bool>,
}

/// Complete game context
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed for the spawn RNG
    pub seed: u64,
    pub rng: Pcg32,
    pub screen: Screen,
    pub params: GameParams,
    pub texts: Texts,
    pub zones: Zones,
    pub machine: StateMachine,
    pub player: Entity,
    pub enemies: Arena<Entity>,
    pub spawner: Spawner,
    pub score: u64,
    pub lives: i32,
    /// Crossings still required to win
    pub wins: i32,
    pub input: InputState,
    pub overlay: OverlayMirror,
}

impl GameState {
    /// Create a state in `Loading` with entities placed for `screen`
    pub fn new(seed: u64, screen: Screen, params: GameParams, texts: Texts, muted: bool) -> Self {
        let zones = Zones::new(screen.height, params.safe_zone);
        let player = Entity::new(
            Sprite::Character,
            Vec2::ZERO,
            params.player_size,
            params.player_speed,
        );
        let spawner = Spawner::new(
            params.enemy_spawn_rate,
            params.enemy_size,
            params.enemy_min_speed,
            params.enemy_max_speed,
        );
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            screen,
            lives: params.lives,
            wins: params.wins,
            params,
            texts,
            zones,
            machine: StateMachine::new(muted),
            player,
            enemies: Arena::new(),
            spawner,
            score: 0,
            input: InputState::default(),
            overlay: OverlayMirror::default(),
        };
        state.reset_player();
        state
    }

    /// Player start: horizontally centered, vertically centered in the bottom band
    pub fn start_position(&self) -> Vec2 {
        let size = self.player.size;
        Vec2::new(
            self.screen.center_x() - size.x / 2.0,
            self.screen.height - (self.params.safe_zone + size.y) / 2.0,
        )
    }

    /// Put the player back at the start and cancel any pointer destination
    pub fn reset_player(&mut self) {
        let start = self.start_position();
        self.player.set_pos(start);
        self.input.pointer_target = self.player.center();
    }

    /// Entities are in place; wait for the start click
    pub fn create(&mut self) {
        self.reset_player();
        self.machine.set(GamePhase::Ready);
    }

    /// Start over with fresh counters and no enemies
    pub fn restart(&mut self) {
        self.score = 0;
        self.lives = self.params.lives;
        self.wins = self.params.wins;
        self.enemies.clear();
        self.machine.background_music_started = false;
        self.create();
        log::info!("Game restarted");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::tests::sample;

    pub(crate) fn state_800x600() -> GameState {
        let screen = Screen::new(800.0, 600.0);
        let config = sample();
        let params = GameParams::from_config(&config, &screen).unwrap();
        GameState::new(42, screen, params, Texts::from_config(&config), false)
    }

    #[test]
    fn test_set_records_prev() {
        let mut machine = StateMachine::new(false);
        assert_eq!(machine.current(), GamePhase::Loading);
        assert_eq!(machine.prev(), None);

        machine.set(GamePhase::Ready);
        machine.set(GamePhase::Play);
        machine.set(GamePhase::Over);
        assert_eq!(machine.current(), GamePhase::Over);
        assert!(machine.came_from(GamePhase::Play));

        machine.set(GamePhase::Over);
        assert_eq!(machine.prev(), Some(GamePhase::Over));
        assert!(!machine.came_from(GamePhase::Play));
    }

    #[test]
    fn test_new_state_is_loading_with_player_at_start() {
        let state = state_800x600();
        assert!(state.machine.is(GamePhase::Loading));
        let start = state.start_position();
        assert_eq!(state.player.pos, start);
        assert!((start.x - 358.0).abs() < 1e-3);
        assert!((start.y - 505.5).abs() < 1e-3);
        assert_eq!(state.input.pointer_target, state.player.center());
        assert_eq!(state.lives, 3);
        assert_eq!(state.wins, 2);
    }

    #[test]
    fn test_player_starts_in_bottom_band() {
        let state = state_800x600();
        let bottom = state.zones.bottom;
        assert!(state.player.y() >= bottom.top);
        assert!(state.player.y() + state.player.height() <= bottom.bottom);
    }

    #[test]
    fn test_restart_resets_counters() {
        let mut state = state_800x600();
        state.create();
        state.machine.set(GamePhase::Play);
        state.score = 250;
        state.lives = 0;
        state.wins = 1;
        state.player.pos = Vec2::new(0.0, 0.0);
        state.machine.set(GamePhase::Over);

        state.restart();
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
        assert_eq!(state.wins, 2);
        assert!(state.enemies.is_empty());
        assert_eq!(state.player.pos, state.start_position());
        assert!(state.machine.is(GamePhase::Ready));
        assert!(state.machine.came_from(GamePhase::Over));
    }
}
