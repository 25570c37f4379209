//! Lane Hopper entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{AudioContext, Element, HtmlCanvasElement, KeyboardEvent, Response, TouchEvent};

    use lane_hopper::assets;
    use lane_hopper::audio::WebAudio;
    use lane_hopper::input::{InputEvent, Key, Target};
    use lane_hopper::persistence::LocalStorage;
    use lane_hopper::platform::{Browser, DomOverlay, WindowHost};
    use lane_hopper::renderer::SpriteRenderer;
    use lane_hopper::sim::{DrawCommand, Screen};
    use lane_hopper::{ConfigError, Game, GameConfig};

    /// Game plus the renderer that shows it
    struct App {
        game: Game<Browser>,
        renderer: SpriteRenderer,
    }

    impl App {
        fn render(&mut self, draws: &[DrawCommand]) {
            match self.renderer.render(draws) {
                Ok(_) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let (w, h) = self.renderer.size;
                    self.renderer.resize(w, h);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("Out of memory!");
                }
                Err(e) => log::warn!("Render error: {:?}", e),
            }
        }
    }

    type Shared = Rc<RefCell<App>>;

    thread_local! {
        static APP: RefCell<Option<Shared>> = const { RefCell::new(None) };
    }

    /// Change one configuration value from the page
    #[wasm_bindgen]
    pub fn set_config_value(scope: &str, key: &str, value: JsValue) -> Result<(), JsValue> {
        let Some(app) = APP.with(|a| a.borrow().clone()) else {
            return Err(JsValue::from_str("game is not running"));
        };
        let value = js_to_json(&value);
        let pending = {
            let mut a = app.borrow_mut();
            let (_, pending) = a
                .game
                .reconfigure(scope, key, value)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            pending
        };
        if let Some(handle) = pending {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
        wasm_bindgen_futures::spawn_local(load_and_start(app));
        Ok(())
    }

    /// Stop the game for good
    #[wasm_bindgen]
    pub fn destroy() {
        let Some(app) = APP.with(|a| a.borrow_mut().take()) else {
            return;
        };
        let mut a = app.borrow_mut();
        if let Some(handle) = a.game.destroy() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
        if let Some(audio) = a.game.audio() {
            let _ = audio.context().close();
        }
    }

    fn js_to_json(value: &JsValue) -> serde_json::Value {
        if let Some(s) = value.as_string() {
            serde_json::Value::String(s)
        } else if let Some(b) = value.as_bool() {
            serde_json::Value::Bool(b)
        } else if let Some(n) = value.as_f64() {
            serde_json::json!(n)
        } else {
            serde_json::Value::Null
        }
    }

    /// Inline `<script id="config">` document, else `config.json`
    async fn read_config(document: &web_sys::Document) -> Result<GameConfig, ConfigError> {
        if let Some(text) = document
            .get_element_by_id("config")
            .and_then(|el| el.text_content())
            .filter(|t| !t.trim().is_empty())
        {
            return GameConfig::from_json(&text);
        }

        let parse_err = |e: JsValue| ConfigError::Parse(format!("{e:?}"));
        let window = web_sys::window().ok_or_else(|| ConfigError::Parse("no window".into()))?;
        let resp: Response = JsFuture::from(window.fetch_with_str("config.json"))
            .await
            .map_err(parse_err)?
            .dyn_into()
            .map_err(parse_err)?;
        let text = JsFuture::from(resp.text().map_err(parse_err)?)
            .await
            .map_err(parse_err)?
            .as_string()
            .unwrap_or_default();
        GameConfig::from_json(&text)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Lane Hopper starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let (width, height) = window_size();
        canvas.set_width(width);
        canvas.set_height(height);

        let config = match read_config(&document).await {
            Ok(config) => config,
            Err(e) => {
                log::error!("Invalid configuration: {}", e);
                return;
            }
        };

        let seed = js_sys::Date::now() as u64;
        let game = match Game::<Browser>::new(
            config,
            Screen::new(width as f32, height as f32),
            seed,
            DomOverlay::new(document.clone()),
            WindowHost,
            LocalStorage::new(),
        ) {
            Ok(game) => game,
            Err(e) => {
                log::error!("Invalid configuration: {}", e);
                return;
            }
        };

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Failed to create surface: {}", e);
                return;
            }
        };

        let adapter = match instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => adapter,
            Err(e) => {
                log::error!("Failed to get adapter: {}", e);
                return;
            }
        };

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let renderer = match SpriteRenderer::new(surface, &adapter, width, height).await {
            Ok(renderer) => renderer,
            Err(e) => {
                log::error!("Renderer setup failed: {}", e);
                return;
            }
        };

        let app = Rc::new(RefCell::new(App { game, renderer }));
        APP.with(|a| *a.borrow_mut() = Some(app.clone()));

        setup_input_handlers(&canvas, app.clone());
        load_and_start(app).await;
    }

    /// Load the current manifest, then start a fresh frame loop
    ///
    /// The load is stamped with the game's load generation; a reconfigure or
    /// teardown while it is in flight makes the game discard its result.
    async fn load_and_start(app: Shared) {
        let (manifest, generation, ctx) = {
            let a = app.borrow();
            let ctx = a.game.audio().map(|audio| audio.context().clone());
            (a.game.manifest().clone(), a.game.load_generation(), ctx)
        };
        let ctx = match ctx.map_or_else(AudioContext::new, Ok) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("Failed to create audio context: {:?}", e);
                return;
            }
        };

        let result = assets::web::load(&manifest, &ctx, |status| {
            app.borrow_mut().game.on_load_progress(generation, status);
        })
        .await;
        let bundle = match result {
            Ok(bundle) => bundle,
            Err(e) => {
                app.borrow_mut().game.on_load_failed(generation, e);
                return;
            }
        };

        {
            let mut a = app.borrow_mut();
            if a.game.load_generation() != generation {
                log::debug!("Load {} superseded, dropping its assets", generation);
                return;
            }
            for (sprite, image) in &bundle.images {
                a.renderer.upload(*sprite, image);
            }
            let audio = WebAudio::new(ctx, bundle.sounds.clone());
            if let Err(e) = a.game.create(generation, &bundle, audio) {
                log::error!("Cannot start: {}", e);
                return;
            }
        }

        request_animation_frame(app);
        log::info!("Lane Hopper running!");
    }

    fn window_size() -> (u32, u32) {
        let Some(window) = web_sys::window() else {
            return (1, 1);
        };
        let dim = |v: Result<JsValue, JsValue>| {
            v.ok().and_then(|v| v.as_f64()).unwrap_or(1.0).max(1.0) as u32
        };
        (dim(window.inner_width()), dim(window.inner_height()))
    }

    fn target_of(event: &web_sys::Event) -> Target {
        event
            .target()
            .and_then(|t| t.dyn_into::<Element>().ok())
            .map(|el| Target::from_id(&el.id()))
            .unwrap_or(Target::Other)
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Shared) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Keyboard
        for (kind, down) in [("keydown", true), ("keyup", false)] {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let Some(key) = Key::from_code(&event.code()) else {
                    return;
                };
                event.prevent_default();
                let input = if down {
                    InputEvent::KeyDown(key)
                } else {
                    InputEvent::KeyUp(key)
                };
                app.borrow_mut().game.push_input(input);
            });
            let _ = window.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end: move toward the lifted finger
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let Some(touch) = event.changed_touches().get(0) else {
                    return;
                };
                let rect = canvas_clone.get_bounding_client_rect();
                let x = touch.client_x() as f32 - rect.left() as f32;
                let y = touch.client_y() as f32 - rect.top() as f32;
                let target = target_of(&event);
                app.borrow_mut()
                    .game
                    .push_input(InputEvent::PointerEnd { x, y, target });
            });
            let _ = window.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Overlay controls
        for id in ["button", "mute"] {
            let Some(el) = document.get_element_by_id(id) else {
                log::warn!("Overlay control #{} not found", id);
                continue;
            };
            let app = app.clone();
            let target = Target::from_id(id);
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().game.push_input(InputEvent::Click { target });
            });
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize / rotate
        for kind in ["resize", "orientationchange"] {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let (width, height) = window_size();
                canvas_clone.set_width(width);
                canvas_clone.set_height(height);
                let mut a = app.borrow_mut();
                a.renderer.resize(width, height);
                a.game.push_input(InputEvent::Resize {
                    width: width as f32,
                    height: height as f32,
                });
            });
            let _ = window.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Shared) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let epoch = app.borrow().game.scheduler().epoch();
        let callback_app = app.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(callback_app, epoch, time);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => {
                app.borrow_mut().game.request_frame(handle);
            }
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn game_loop(app: Shared, epoch: u64, time: f64) {
        let reschedule = {
            let mut a = app.borrow_mut();
            let Some(report) = a.game.frame(epoch, time) else {
                return;
            };
            a.render(&report.draws);
            report.reschedule
        };

        if reschedule {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Lane Hopper (native) starting...");
    log::info!("Native mode runs a headless session - run with `trunk serve` for the web version");

    let path = std::env::args().nth(1);
    if let Err(e) = headless::run(path.as_deref()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted session against in-memory collaborators
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use lane_hopper::assets::{AssetBundle, FONT_KEY, ImageData, Sound, Sprite};
    use lane_hopper::audio::MemoryAudio;
    use lane_hopper::input::{InputEvent, Key, Target};
    use lane_hopper::persistence::MemoryStorage;
    use lane_hopper::platform::{Headless, MemoryHost, MemoryOverlay};
    use lane_hopper::sim::{GamePhase, Screen};
    use lane_hopper::{Game, GameConfig};

    const DEMO_CONFIG: &str = r#"{
        "settings": {
            "name": "Lane Hopper",
            "fontFamily": "monospace",
            "playerSpeed": 4,
            "enemyMinSpeed": 2,
            "enemyMaxSpeed": 5,
            "enemySpawnRate": 40,
            "lives": 3,
            "wins": 3
        },
        "images": {
            "topImage": "top.png",
            "middleImage": "middle.png",
            "bottomImage": "bottom.png",
            "characterImage": "player.png",
            "enemyImage": "enemy.png"
        },
        "sounds": {
            "backgroundMusic": "music.mp3",
            "winSound": "win.mp3",
            "gameoverSound": "gameover.mp3",
            "scoreSound": "score.mp3",
            "dieSound": "die.mp3"
        }
    }"#;

    const MAX_FRAMES: u64 = 60 * 120;

    pub fn run(path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
        let json = match path {
            Some(path) => std::fs::read_to_string(path)?,
            None => DEMO_CONFIG.to_string(),
        };
        let config = GameConfig::from_json(&json)?;

        let mut game = Game::<Headless>::new(
            config,
            Screen::new(800.0, 600.0),
            1,
            MemoryOverlay::default(),
            MemoryHost::default(),
            MemoryStorage::new(),
        )?;

        let mut bundle: AssetBundle<ImageData, ()> = AssetBundle::default();
        for sprite in Sprite::ALL {
            bundle.images.insert(sprite, ImageData::solid(1, 1, [255; 4]));
        }
        for sound in Sound::ALL {
            bundle.sounds.insert(sound, ());
        }
        bundle
            .fonts
            .insert(FONT_KEY.to_string(), game.config().settings.font_family.clone());
        let generation = game.load_generation();
        game.create(generation, &bundle, MemoryAudio::new())?;

        game.push_input(InputEvent::Click {
            target: Target::Button,
        });
        game.push_input(InputEvent::KeyDown(Key::Up));

        let mut now = 0.0;
        for _ in 0..MAX_FRAMES {
            let epoch = game.request_frame(0);
            let Some(report) = game.frame(epoch, now) else {
                break;
            };
            now += 1000.0 / 60.0;
            if !report.reschedule || matches!(game.phase(), GamePhase::Win | GamePhase::Over) {
                break;
            }
        }

        let state = game.state();
        log::info!(
            "Finished in {} after {} frames: score {}, lives {}, crossings left {}",
            state.machine.current().as_str(),
            game.scheduler().count(),
            state.score,
            state.lives,
            state.wins
        );
        println!(
            "{}: score {} lives {}",
            state.machine.current().as_str(),
            state.score,
            state.lives
        );
        Ok(())
    }
}
