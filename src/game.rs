//! Game driver
//!
//! Owns the game state and every collaborator, runs one tick per frame
//! callback and applies the tick's effects. The platform layer only:
//! - pushes input into the queue
//! - asks for frames and cancels them through the scheduler
//! - feeds in load progress and the loaded assets

use crate::assets::{AssetBundle, AssetError, AssetManifest, LoadStatus};
use crate::audio::{AudioOutput, Playlist};
use crate::config::{ConfigError, GameConfig, GameParams};
use crate::frame::{Frame, FrameScheduler};
use crate::input::{InputEvent, InputQueue};
use crate::platform::{Host, Overlay, Platform};
use crate::settings::Settings;
use crate::sim::{DrawCommand, Effect, GamePhase, GameState, Screen, Texts, tick};

type Handle<P> = <<P as Platform>::Audio as AudioOutput>::Handle;

/// What one frame produced for the renderer and the loop
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub frame: Frame,
    pub draws: Vec<DrawCommand>,
    /// Request another frame
    pub reschedule: bool,
}

pub struct Game<P: Platform> {
    config: GameConfig,
    manifest: AssetManifest,
    seed: u64,
    state: GameState,
    scheduler: FrameScheduler,
    input: InputQueue,
    playlist: Playlist<Handle<P>>,
    settings: Settings<P::Storage>,
    overlay: P::Overlay,
    host: P::Host,
    /// Set once sounds are decoded
    audio: Option<P::Audio>,
    load_status: LoadStatus,
    /// Bumped whenever an in-flight load must no longer apply
    generation: u64,
}

impl<P: Platform> Game<P> {
    /// Validate `config` and build a game waiting for its assets
    pub fn new(
        config: GameConfig,
        screen: Screen,
        seed: u64,
        overlay: P::Overlay,
        host: P::Host,
        storage: P::Storage,
    ) -> Result<Self, ConfigError> {
        let params = GameParams::from_config(&config, &screen)?;
        let manifest = AssetManifest::from_config(&config)?;
        let settings = Settings::new(storage, &config.settings.name);
        let muted = settings.load();
        let state = GameState::new(seed, screen, params, Texts::from_config(&config), muted);
        log::info!(
            "Game '{}' initialized with seed {} ({}x{})",
            config.settings.name,
            seed,
            screen.width,
            screen.height
        );

        let total = manifest.total();
        Ok(Self {
            config,
            manifest,
            seed,
            state,
            scheduler: FrameScheduler::new(screen.scale),
            input: InputQueue::new(),
            playlist: Playlist::new(),
            settings,
            overlay,
            host,
            audio: None,
            load_status: LoadStatus::starting(total),
            generation: 0,
        })
    }

    /// Everything the loader has to fetch for the current configuration
    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    pub fn load_status(&self) -> &LoadStatus {
        &self.load_status
    }

    /// Stamp for a load started now; hand it back to the load callbacks
    pub fn load_generation(&self) -> u64 {
        self.generation
    }

    /// Whether a load stamped `generation` may still touch the game
    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && !self.state.machine.is(GamePhase::Stop)
    }

    /// Loader progress callback
    pub fn on_load_progress(&mut self, generation: u64, status: &LoadStatus) {
        if !self.is_current(generation) {
            return;
        }
        self.overlay.set_progress(status.percent());
        self.load_status = status.clone();
    }

    /// Loading failed; the game stays in `Loading`
    pub fn on_load_failed(&mut self, generation: u64, error: AssetError) {
        if !self.is_current(generation) {
            log::debug!("Ignoring failure of superseded load {}: {}", generation, error);
            return;
        }
        log::error!("Asset loading failed: {}", error);
        self.load_status = LoadStatus::Failed(error);
    }

    /// Assets are in: place entities, show the start screen, start a frame loop
    ///
    /// Refused once the game is stopped or when a newer load has been started.
    pub fn create<I, S>(
        &mut self,
        generation: u64,
        bundle: &AssetBundle<I, S>,
        mut audio: P::Audio,
    ) -> Result<(), AssetError> {
        if !self.is_current(generation) {
            log::warn!("Discarding assets from superseded load {}", generation);
            return Err(AssetError::Superseded(generation));
        }
        let missing = bundle.missing(&self.manifest);
        if !missing.is_empty() {
            let error = AssetError::Missing(missing);
            self.on_load_failed(generation, error.clone());
            return Err(error);
        }

        audio.set_suspended(self.state.machine.muted);
        self.audio = Some(audio);

        self.overlay.set_styles(&self.config.colors, bundle.font());
        self.overlay.hide_loading();
        self.load_status = LoadStatus::Ready;

        self.state.create();
        self.scheduler.restart();
        log::info!("Assets ready, waiting for start");
        Ok(())
    }

    /// Queue an input event for the next frame
    ///
    /// Must be called from the platform's event handler: a user gesture
    /// is the only moment browsers let suspended audio resume.
    pub fn push_input(&mut self, event: InputEvent) {
        if event.is_gesture() && !self.state.machine.muted {
            if let Some(audio) = self.audio.as_mut() {
                audio.unlock();
            }
        }
        self.input.push(event);
    }

    /// Record a host frame request; returns the epoch to hand back to `frame`
    pub fn request_frame(&mut self, handle: i32) -> u64 {
        self.scheduler.request(handle)
    }

    /// Run one frame for a callback issued under `epoch`
    ///
    /// Returns `None` when the callback is stale or the game is stopped.
    pub fn frame(&mut self, epoch: u64, now_ms: f64) -> Option<TickReport> {
        let frame = self.scheduler.begin(epoch, now_ms)?;

        if let Some(audio) = self.audio.as_mut() {
            for id in audio.take_completed() {
                self.playlist.complete(id);
            }
        }

        let events = self.input.drain();
        let out = tick(&mut self.state, &events, &frame);
        for effect in out.effects {
            self.apply(effect);
        }

        Some(TickReport {
            frame,
            draws: out.draws,
            reschedule: out.reschedule && !self.scheduler.is_stopped(),
        })
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Overlay(command) => self.overlay.apply(&command),
            Effect::PlaySound { sound, looped } => {
                let Some(audio) = self.audio.as_mut() else {
                    log::warn!("Audio not ready, dropping {}", sound.as_str());
                    return;
                };
                if let Some(handle) = audio.start(sound, looped, self.playlist.next_id()) {
                    self.playlist.play(sound, handle);
                }
            }
            Effect::ReportScore(score) => self.host.report_score(score),
            Effect::SetView(view) => self.host.set_view(view),
            Effect::ToggleMute => {
                self.toggle_mute();
            }
            Effect::Reset => self.playlist.stop_all(),
            Effect::Resize { width, height } => self.resize(width, height),
        }
    }

    /// Flip and persist the mute flag; suspends or resumes all audio
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.settings.toggle_muted();
        self.state.machine.muted = muted;
        self.state.overlay.mute = Some(muted);
        self.overlay.set_mute(muted);
        if let Some(audio) = self.audio.as_mut() {
            audio.set_suspended(muted);
        }
        muted
    }

    /// Stop every sound and start a fresh run at the start screen
    pub fn reset(&mut self) {
        self.playlist.stop_all();
        if self.load_status == LoadStatus::Ready {
            self.state.restart();
        }
    }

    /// Rebuild everything for a new canvas size
    pub fn resize(&mut self, width: f32, height: f32) {
        let screen = Screen::new(width, height);
        let params = match GameParams::from_config(&self.config, &screen) {
            Ok(params) => params,
            Err(e) => {
                log::error!("Keeping previous layout, resize rejected: {}", e);
                return;
            }
        };
        log::info!("Resized to {}x{}", width, height);
        self.playlist.stop_all();
        self.scheduler.set_screen_scale(screen.scale);
        self.state = GameState::new(
            self.seed,
            screen,
            params,
            Texts::from_config(&self.config),
            self.state.machine.muted,
        );
        if self.load_status == LoadStatus::Ready {
            self.state.create();
        }
    }

    /// Apply a live configuration change
    ///
    /// The running loop is cancelled and the game returns to `Loading`; the
    /// caller loads the returned manifest and calls `create` again. On error
    /// nothing changes.
    pub fn reconfigure(
        &mut self,
        scope: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(AssetManifest, Option<i32>), ConfigError> {
        let mut config = self.config.clone();
        config.set_value(scope, key, value)?;
        let params = GameParams::from_config(&config, &self.state.screen)?;
        let manifest = AssetManifest::from_config(&config)?;
        log::info!("Configuration changed: {}.{}", scope, key);

        let pending = self.scheduler.cancel();
        self.generation += 1;
        self.playlist.stop_all();
        self.settings.rename(&config.settings.name);
        let muted = self.settings.load();
        self.state = GameState::new(
            self.seed,
            self.state.screen,
            params,
            Texts::from_config(&config),
            muted,
        );
        self.config = config;
        self.load_status = LoadStatus::starting(manifest.total());
        self.manifest = manifest.clone();
        Ok((manifest, pending))
    }

    /// Stop for good; returns the host frame request still pending, if any
    pub fn destroy(&mut self) -> Option<i32> {
        self.generation += 1;
        self.state.machine.set(GamePhase::Stop);
        self.playlist.stop_all();
        log::info!("Game stopped");
        self.scheduler.stop()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.machine.current()
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn overlay(&self) -> &P::Overlay {
        &self.overlay
    }

    pub fn host(&self) -> &P::Host {
        &self.host
    }

    pub fn audio(&self) -> Option<&P::Audio> {
        self.audio.as_ref()
    }

    pub fn audio_mut(&mut self) -> Option<&mut P::Audio> {
        self.audio.as_mut()
    }

    pub fn playlist(&self) -> &Playlist<Handle<P>> {
        &self.playlist
    }

    pub fn settings(&self) -> &Settings<P::Storage> {
        &self.settings
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{FONT_KEY, ImageData, Sound, Sprite};
    use crate::audio::MemoryAudio;
    use crate::config::tests::sample;
    use crate::input::Target;
    use crate::persistence::{MemoryStorage, Storage};
    use crate::platform::{Headless, MemoryHost, MemoryOverlay};
    use crate::sim::OverlayCommand;

    type TestGame = Game<Headless>;

    fn new_game(storage: MemoryStorage) -> TestGame {
        Game::new(
            sample(),
            Screen::new(800.0, 600.0),
            42,
            MemoryOverlay::default(),
            MemoryHost::default(),
            storage,
        )
        .unwrap()
    }

    fn bundle() -> AssetBundle<ImageData, ()> {
        let mut bundle = AssetBundle::default();
        for sprite in Sprite::ALL {
            bundle.images.insert(sprite, ImageData::solid(1, 1, [255; 4]));
        }
        for sound in Sound::ALL {
            bundle.sounds.insert(sound, ());
        }
        bundle
            .fonts
            .insert(FONT_KEY.to_string(), "Press Start 2P".to_string());
        bundle
    }

    fn create(game: &mut TestGame, bundle: &AssetBundle<ImageData, ()>) -> Result<(), AssetError> {
        let generation = game.load_generation();
        game.create(generation, bundle, MemoryAudio::new())
    }

    fn ready_game() -> TestGame {
        let mut game = new_game(MemoryStorage::new());
        create(&mut game, &bundle()).unwrap();
        game
    }

    /// Run one frame on the current loop
    fn step(game: &mut TestGame, now: f64) -> Option<TickReport> {
        let epoch = game.request_frame(1);
        game.frame(epoch, now)
    }

    fn click(game: &mut TestGame, target: Target) {
        game.push_input(InputEvent::Click { target });
    }

    #[test]
    fn test_new_waits_in_loading() {
        let game = new_game(MemoryStorage::new());
        assert_eq!(game.phase(), GamePhase::Loading);
        assert_eq!(game.load_status(), &LoadStatus::starting(11));
        assert!(game.audio().is_none());
    }

    #[test]
    fn test_invalid_config_rejected_before_start() {
        let mut config = sample();
        config
            .set_value("settings", "enemySpawnRate", serde_json::json!("0"))
            .unwrap();
        let result = Game::<Headless>::new(
            config,
            Screen::new(800.0, 600.0),
            1,
            MemoryOverlay::default(),
            MemoryHost::default(),
            MemoryStorage::new(),
        );
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_create_shows_start_screen() {
        let mut game = ready_game();
        assert_eq!(game.phase(), GamePhase::Ready);
        assert!(game.overlay().loading_hidden);
        assert_eq!(
            game.overlay().styles.get("fontFamily").map(String::as_str),
            Some("Press Start 2P")
        );

        let report = step(&mut game, 0.0).unwrap();
        assert!(report.reschedule);
        assert_eq!(report.frame.count, 0);
        assert!(
            game.overlay()
                .commands
                .contains(&OverlayCommand::ShowBanner("Lane Hopper".to_string()))
        );
    }

    #[test]
    fn test_load_failure_stays_loading() {
        let mut game = new_game(MemoryStorage::new());
        let mut partial = bundle();
        partial.sounds.remove(&Sound::Die);
        let err = create(&mut game, &partial).unwrap_err();
        assert_eq!(err, AssetError::Missing(vec!["dieSound"]));
        assert!(game.load_status().is_failed());
        assert_eq!(game.phase(), GamePhase::Loading);
    }

    #[test]
    fn test_progress_reaches_overlay() {
        let mut game = new_game(MemoryStorage::new());
        let mut status = LoadStatus::starting(4);
        status.advance();
        game.on_load_progress(game.load_generation(), &status);
        assert_eq!(game.overlay().progress, vec![25]);
    }

    #[test]
    fn test_start_plays_music_and_completion_is_tracked() {
        let mut game = ready_game();
        step(&mut game, 0.0);
        click(&mut game, Target::Button);
        step(&mut game, 16.0);
        assert_eq!(game.phase(), GamePhase::Play);
        assert!(game.playlist().is_playing(Sound::BackgroundMusic));

        let id = game.playlist().entries()[0].id;
        game.audio_mut().unwrap().finish(id);
        step(&mut game, 32.0);
        assert!(game.playlist().is_empty());
    }

    #[test]
    fn test_mute_toggled_twice_restores() {
        let mut game = ready_game();
        let key = game.settings().key().to_string();

        click(&mut game, Target::Mute);
        step(&mut game, 0.0);
        assert!(game.state().machine.muted);
        assert!(game.audio().unwrap().suspended);
        assert_eq!(game.settings().storage().get(&key).as_deref(), Some("true"));

        click(&mut game, Target::Mute);
        step(&mut game, 16.0);
        assert!(!game.state().machine.muted);
        assert!(!game.audio().unwrap().suspended);
        assert_eq!(game.settings().storage().get(&key).as_deref(), Some("false"));
    }

    #[test]
    fn test_persisted_mute_is_loaded() {
        let mut storage = MemoryStorage::new();
        storage
            .set(&Settings::<MemoryStorage>::muted_key("Lane Hopper"), "true")
            .unwrap();
        let mut game = new_game(storage);
        assert!(game.state().machine.muted);
        create(&mut game, &bundle()).unwrap();
        assert!(game.audio().unwrap().suspended);
    }

    #[test]
    fn test_game_over_reports_once() {
        let mut game = ready_game();
        click(&mut game, Target::Button);
        step(&mut game, 0.0);
        game.state.lives = 0;
        game.state.score = 42;
        for n in 1..5 {
            step(&mut game, n as f64 * 16.0);
        }
        assert_eq!(game.phase(), GamePhase::Over);
        assert_eq!(game.host().scores, vec![42]);
        assert_eq!(game.host().views, vec!["setScore".to_string()]);
    }

    #[test]
    fn test_restart_stops_sounds() {
        let mut game = ready_game();
        click(&mut game, Target::Button);
        step(&mut game, 0.0);
        game.state.lives = 0;
        step(&mut game, 16.0);
        assert_eq!(game.phase(), GamePhase::Over);

        click(&mut game, Target::Button);
        step(&mut game, 32.0);
        assert_eq!(game.phase(), GamePhase::Ready);
        assert!(game.playlist().is_empty());
        assert_eq!(game.state().lives, 3);
    }

    #[test]
    fn test_reset_mid_run() {
        let mut game = ready_game();
        click(&mut game, Target::Button);
        step(&mut game, 0.0);
        game.state.score = 7;
        game.reset();
        assert_eq!(game.phase(), GamePhase::Ready);
        assert_eq!(game.state().score, 0);
        assert!(game.playlist().is_empty());
        assert_eq!(game.audio().unwrap().log.borrow().paused, vec![1]);
    }

    #[test]
    fn test_destroy_cancels_loop() {
        let mut game = ready_game();
        click(&mut game, Target::Button);
        step(&mut game, 0.0);
        let epoch = game.request_frame(77);

        assert_eq!(game.destroy(), Some(77));
        assert_eq!(game.phase(), GamePhase::Stop);
        assert!(game.playlist().is_empty());
        assert!(game.frame(epoch, 16.0).is_none());
        assert_eq!(game.destroy(), None);
    }

    #[test]
    fn test_late_load_cannot_revive_stopped_game() {
        let mut game = new_game(MemoryStorage::new());
        let generation = game.load_generation();
        game.destroy();

        let err = game
            .create(generation, &bundle(), MemoryAudio::new())
            .unwrap_err();
        assert_eq!(err, AssetError::Superseded(generation));
        assert_eq!(game.phase(), GamePhase::Stop);
        assert!(game.audio().is_none());

        let epoch = game.request_frame(1);
        assert!(game.frame(epoch, 0.0).is_none());

        // a stamp read after teardown is refused too
        let err = create(&mut game, &bundle()).unwrap_err();
        assert!(matches!(err, AssetError::Superseded(_)));
        assert_eq!(game.phase(), GamePhase::Stop);
    }

    #[test]
    fn test_superseded_load_is_discarded() {
        let mut game = new_game(MemoryStorage::new());
        let old = game.load_generation();
        game.reconfigure("settings", "lives", serde_json::json!("5"))
            .unwrap();
        let new = game.load_generation();
        assert_ne!(old, new);

        let mut status = LoadStatus::starting(4);
        status.advance();
        game.on_load_progress(old, &status);
        game.on_load_failed(old, AssetError::Missing(vec!["x"]));
        assert!(game.overlay().progress.is_empty());
        assert!(!game.load_status().is_failed());

        assert_eq!(
            game.create(old, &bundle(), MemoryAudio::new()),
            Err(AssetError::Superseded(old))
        );
        assert_eq!(game.phase(), GamePhase::Loading);

        game.create(new, &bundle(), MemoryAudio::new()).unwrap();
        assert_eq!(game.phase(), GamePhase::Ready);
        assert_eq!(game.state().lives, 5);
    }

    #[test]
    fn test_gesture_unlocks_audio_unless_muted() {
        let mut game = ready_game();
        game.audio_mut().unwrap().suspended = true;
        click(&mut game, Target::Button);
        assert_eq!(game.audio().unwrap().unlocks, 1);
        assert!(!game.audio().unwrap().suspended);

        game.push_input(InputEvent::KeyUp(crate::input::Key::Up));
        assert_eq!(game.audio().unwrap().unlocks, 1);

        game.toggle_mute();
        click(&mut game, Target::Button);
        assert_eq!(game.audio().unwrap().unlocks, 1);
        assert!(game.audio().unwrap().suspended);
    }

    #[test]
    fn test_resize_resets_layout() {
        let mut game = ready_game();
        click(&mut game, Target::Button);
        step(&mut game, 0.0);
        game.push_input(InputEvent::Resize {
            width: 1024.0,
            height: 768.0,
        });
        step(&mut game, 16.0);

        assert_eq!(game.phase(), GamePhase::Ready);
        assert_eq!(game.state().screen.width, 1024.0);
        assert_eq!(game.state().player.pos, game.state().start_position());
        assert!(game.playlist().is_empty());
    }

    #[test]
    fn test_reconfigure_returns_to_loading() {
        let mut game = ready_game();
        let epoch = game.request_frame(5);
        let (manifest, pending) = game
            .reconfigure("settings", "lives", serde_json::json!("5"))
            .unwrap();
        assert_eq!(pending, Some(5));
        assert_eq!(manifest.total(), 11);
        assert_eq!(game.phase(), GamePhase::Loading);
        assert!(game.frame(epoch, 16.0).is_none());

        create(&mut game, &bundle()).unwrap();
        assert_eq!(game.phase(), GamePhase::Ready);
        assert_eq!(game.state().lives, 5);
    }

    #[test]
    fn test_bad_reconfigure_changes_nothing() {
        let mut game = ready_game();
        let result = game.reconfigure("settings", "lives", serde_json::json!("many"));
        assert!(matches!(result, Err(ConfigError::NotANumber { .. })));
        assert_eq!(game.phase(), GamePhase::Ready);
        assert_eq!(game.config().settings.lives, crate::config::Numeric::from("3"));
    }
}
