//! Per-frame update step
//!
//! `tick` advances the game by one display frame. It is a pure function of
//! the state, the input drained for this frame and the frame timing: all
//! output is returned as draw commands and effects for the driver to apply.

use glam::Vec2;

use super::draw::DrawCommand;
use super::state::{GamePhase, GameState, OverlayMirror};
use crate::assets::{Sound, Sprite};
use crate::consts::{DWELL_INTERVAL, DWELL_POINTS, GOAL_POINTS, GOAL_SLACK};
use crate::frame::Frame;
use crate::input::{InputEvent, Target};

/// Host view requested when a run ends
pub const SCORE_VIEW: &str = "setScore";

/// Change to the HTML overlay
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayCommand {
    ShowBanner(String),
    HideBanner,
    ShowButton(String),
    HideButton,
    SetInstructions { desktop: String, mobile: String },
    HideInstructions,
    ShowStats,
    SetScore(u64),
    SetLives(i32),
    SetMute(bool),
}

/// Side effect requested by a tick
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Overlay(OverlayCommand),
    PlaySound { sound: Sound, looped: bool },
    /// Final score for the host shell
    ReportScore(u64),
    SetView(&'static str),
    ToggleMute,
    /// The run was restarted; sounds of the old run must stop
    Reset,
    /// Canvas changed size; everything is rebuilt for the new screen
    Resize { width: f32, height: f32 },
}

/// Everything one tick produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub draws: Vec<DrawCommand>,
    pub effects: Vec<Effect>,
    /// False once the game is stopped
    pub reschedule: bool,
}

impl TickOutput {
    fn sound(&mut self, sound: Sound, looped: bool) {
        self.effects.push(Effect::PlaySound { sound, looped });
    }

    fn overlay(&mut self, command: OverlayCommand) {
        self.effects.push(Effect::Overlay(command));
    }
}

/// Advance the game by one frame
pub fn tick(state: &mut GameState, events: &[InputEvent], frame: &Frame) -> TickOutput {
    let mut out = TickOutput::default();

    for event in events {
        handle_event(state, event, &mut out);
    }

    draw_background(state, &mut out);
    sync_stats(state, &mut out);
    check_thresholds(state);

    match state.machine.current() {
        GamePhase::Ready => ready(state, &mut out),
        GamePhase::Play => play(state, frame, &mut out),
        GamePhase::Win => win(state, &mut out),
        GamePhase::Over => over(state, &mut out),
        GamePhase::Loading | GamePhase::Stop => {}
    }

    out.reschedule = !state.machine.is(GamePhase::Stop);
    out
}

fn handle_event(state: &mut GameState, event: &InputEvent, out: &mut TickOutput) {
    let phase = state.machine.current();
    match *event {
        InputEvent::Click { target } => {
            if matches!(phase, GamePhase::Loading | GamePhase::Stop) {
                return;
            }
            match target {
                Target::Button => match phase {
                    GamePhase::Ready => state.machine.set(GamePhase::Play),
                    GamePhase::Win | GamePhase::Over => {
                        state.restart();
                        out.effects.push(Effect::Reset);
                    }
                    _ => {}
                },
                Target::Mute => out.effects.push(Effect::ToggleMute),
                Target::Other => {}
            }
        }
        InputEvent::Resize { width, height } => {
            out.effects.push(Effect::Resize { width, height });
        }
        _ => state.input.apply(event, phase),
    }
}

fn draw_background(state: &GameState, out: &mut TickOutput) {
    out.draws.push(DrawCommand::Clear);
    let sprites = [Sprite::Top, Sprite::Middle, Sprite::Bottom];
    for (sprite, band) in sprites.into_iter().zip(state.zones.bands()) {
        out.draws.push(DrawCommand::Sprite {
            sprite,
            x: 0.0,
            y: band.top,
            width: state.screen.width,
            height: band.height(),
        });
    }
}

fn sync_stats(state: &mut GameState, out: &mut TickOutput) {
    if state.overlay.score != Some(state.score) {
        state.overlay.score = Some(state.score);
        out.overlay(OverlayCommand::SetScore(state.score));
    }
    if state.overlay.lives != Some(state.lives) {
        state.overlay.lives = Some(state.lives);
        out.overlay(OverlayCommand::SetLives(state.lives));
    }
}

/// Out of lives beats out of crossings when both hit on the same frame.
/// Re-entering the current phase moves `prev` forward, which is what keeps
/// the entry actions in `win`/`over` to a single tick.
fn check_thresholds(state: &mut GameState) {
    if !matches!(
        state.machine.current(),
        GamePhase::Play | GamePhase::Win | GamePhase::Over
    ) {
        return;
    }
    if state.lives < 1 {
        state.machine.set(GamePhase::Over);
    } else if state.wins < 1 {
        state.machine.set(GamePhase::Win);
    }
}

fn show_banner(mirror: &mut OverlayMirror, text: &str, out: &mut TickOutput) {
    if mirror.banner.as_deref() != Some(text) {
        mirror.banner = Some(text.to_string());
        out.overlay(OverlayCommand::ShowBanner(text.to_string()));
    }
}

fn show_button(mirror: &mut OverlayMirror, text: &str, out: &mut TickOutput) {
    if mirror.button.as_deref() != Some(text) {
        mirror.button = Some(text.to_string());
        out.overlay(OverlayCommand::ShowButton(text.to_string()));
    }
}

fn ready(state: &mut GameState, out: &mut TickOutput) {
    let mirror = &mut state.overlay;
    show_banner(mirror, &state.texts.name, out);
    show_button(mirror, &state.texts.start, out);
    if !mirror.instructions {
        mirror.instructions = true;
        out.overlay(OverlayCommand::SetInstructions {
            desktop: state.texts.instructions_desktop.clone(),
            mobile: state.texts.instructions_mobile.clone(),
        });
    }
    if mirror.mute != Some(state.machine.muted) {
        mirror.mute = Some(state.machine.muted);
        out.overlay(OverlayCommand::SetMute(state.machine.muted));
    }
}

fn win(state: &mut GameState, out: &mut TickOutput) {
    show_banner(&mut state.overlay, &state.texts.win, out);
    show_button(&mut state.overlay, &state.texts.start, out);
    if state.machine.came_from(GamePhase::Play) {
        out.sound(Sound::Win, false);
        state.machine.set(GamePhase::Win);
    }
}

fn over(state: &mut GameState, out: &mut TickOutput) {
    show_banner(&mut state.overlay, &state.texts.gameover, out);
    show_button(&mut state.overlay, &state.texts.start, out);
    if state.machine.came_from(GamePhase::Play) {
        out.sound(Sound::GameOver, false);
        out.effects.push(Effect::ReportScore(state.score));
        out.effects.push(Effect::SetView(SCORE_VIEW));
        log::info!("Game over with score {}", state.score);
        state.machine.set(GamePhase::Over);
    }
}

fn enter_play(state: &mut GameState, out: &mut TickOutput) {
    let mirror = &mut state.overlay;
    if !mirror.stats {
        mirror.stats = true;
        out.overlay(OverlayCommand::ShowStats);
    }
    if mirror.button.take().is_some() {
        out.overlay(OverlayCommand::HideButton);
    }
    if mirror.banner.take().is_some() {
        out.overlay(OverlayCommand::HideBanner);
    }
    if mirror.instructions {
        mirror.instructions = false;
        out.overlay(OverlayCommand::HideInstructions);
    }
    if !state.machine.muted && !state.machine.background_music_started {
        state.machine.background_music_started = true;
        out.sound(Sound::BackgroundMusic, true);
    }
}

fn play(state: &mut GameState, frame: &Frame, out: &mut TickOutput) {
    if state.machine.came_from(GamePhase::Ready) {
        enter_play(state, out);
    }

    // Enemies: despawn past the right edge, otherwise advance and draw
    let right_edge = state.screen.width;
    let draws = &mut out.draws;
    state.enemies.retain_mut(|_, enemy| {
        if enemy.x() > right_edge {
            return false;
        }
        enemy.move_by(1.0, 0.0, frame.scale);
        draws.push(enemy.draw());
        true
    });

    state
        .spawner
        .run(frame.count, &mut state.rng, state.zones.middle, &mut state.enemies);

    let middle = state.zones.middle;
    if frame.count.is_multiple_of(DWELL_INTERVAL) && middle.contains_y(state.player.y()) {
        state.score += DWELL_POINTS;
    }

    if state.player.y() + state.player.height() - GOAL_SLACK <= middle.top {
        state.reset_player();
        out.sound(Sound::Score, false);
        state.wins -= 1;
        state.score += GOAL_POINTS;
        log::debug!("Goal reached, {} crossings left", state.wins);
    }

    let dir: Vec2 = state.input.direction(&state.player);
    state.player.move_by(dir.x, dir.y, frame.scale);
    out.draws.push(state.player.draw());

    if state.player.collides_with_any(state.enemies.values()) {
        state.reset_player();
        out.sound(Sound::Die, false);
        state.lives -= 1;
        log::debug!("Player hit, {} lives left", state.lives);
    }
}
