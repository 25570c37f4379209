//! Platform collaborators
//!
//! Everything outside the canvas that the game talks to:
//! - Overlay (HTML banner, button, stats, mute toggle, loading screen)
//! - Host shell (score reporting, view changes)
//! - Audio output and settings storage, bundled per platform
//!
//! `Headless` records every call in memory and is used natively and in
//! tests; `Browser` drives the real DOM (WASM only).

use std::collections::BTreeMap;

use crate::audio::{AudioOutput, MemoryAudio};
use crate::persistence::{MemoryStorage, Storage};
use crate::sim::OverlayCommand;

/// HTML overlay drawn on top of the canvas
pub trait Overlay {
    fn show_banner(&mut self, text: &str);
    fn hide_banner(&mut self);
    fn show_button(&mut self, text: &str);
    fn hide_button(&mut self);
    fn set_instructions(&mut self, desktop: &str, mobile: &str);
    fn hide_instructions(&mut self);
    fn show_stats(&mut self);
    fn set_score(&mut self, score: u64);
    fn set_lives(&mut self, lives: i32);
    fn set_mute(&mut self, muted: bool);
    fn hide_loading(&mut self);
    /// Loading progress in whole percent
    fn set_progress(&mut self, percent: u32);
    /// Colors and font from the configuration
    fn set_styles(&mut self, colors: &BTreeMap<String, String>, font_family: Option<&str>);

    /// Apply a command produced by a tick
    fn apply(&mut self, command: &OverlayCommand) {
        match command {
            OverlayCommand::ShowBanner(text) => self.show_banner(text),
            OverlayCommand::HideBanner => self.hide_banner(),
            OverlayCommand::ShowButton(text) => self.show_button(text),
            OverlayCommand::HideButton => self.hide_button(),
            OverlayCommand::SetInstructions { desktop, mobile } => {
                self.set_instructions(desktop, mobile)
            }
            OverlayCommand::HideInstructions => self.hide_instructions(),
            OverlayCommand::ShowStats => self.show_stats(),
            OverlayCommand::SetScore(score) => self.set_score(*score),
            OverlayCommand::SetLives(lives) => self.set_lives(*lives),
            OverlayCommand::SetMute(muted) => self.set_mute(*muted),
        }
    }
}

/// Page that embeds the game
pub trait Host {
    fn report_score(&mut self, score: u64);
    fn set_view(&mut self, view: &str);
}

/// The set of collaborators one platform provides
pub trait Platform {
    type Overlay: Overlay;
    type Host: Host;
    type Audio: AudioOutput;
    type Storage: Storage;
}

/// In-memory overlay that keeps what it was told
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryOverlay {
    pub commands: Vec<OverlayCommand>,
    pub progress: Vec<u32>,
    pub loading_hidden: bool,
    pub styles: BTreeMap<String, String>,
}

impl Overlay for MemoryOverlay {
    fn show_banner(&mut self, text: &str) {
        self.commands.push(OverlayCommand::ShowBanner(text.to_string()));
    }

    fn hide_banner(&mut self) {
        self.commands.push(OverlayCommand::HideBanner);
    }

    fn show_button(&mut self, text: &str) {
        self.commands.push(OverlayCommand::ShowButton(text.to_string()));
    }

    fn hide_button(&mut self) {
        self.commands.push(OverlayCommand::HideButton);
    }

    fn set_instructions(&mut self, desktop: &str, mobile: &str) {
        self.commands.push(OverlayCommand::SetInstructions {
            desktop: desktop.to_string(),
            mobile: mobile.to_string(),
        });
    }

    fn hide_instructions(&mut self) {
        self.commands.push(OverlayCommand::HideInstructions);
    }

    fn show_stats(&mut self) {
        self.commands.push(OverlayCommand::ShowStats);
    }

    fn set_score(&mut self, score: u64) {
        self.commands.push(OverlayCommand::SetScore(score));
    }

    fn set_lives(&mut self, lives: i32) {
        self.commands.push(OverlayCommand::SetLives(lives));
    }

    fn set_mute(&mut self, muted: bool) {
        self.commands.push(OverlayCommand::SetMute(muted));
    }

    fn hide_loading(&mut self) {
        self.loading_hidden = true;
    }

    fn set_progress(&mut self, percent: u32) {
        self.progress.push(percent);
    }

    fn set_styles(&mut self, colors: &BTreeMap<String, String>, font_family: Option<&str>) {
        self.styles = colors.clone();
        if let Some(font) = font_family {
            self.styles.insert("fontFamily".to_string(), font.to_string());
        }
    }
}

/// In-memory host shell
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryHost {
    pub scores: Vec<u64>,
    pub views: Vec<String>,
}

impl Host for MemoryHost {
    fn report_score(&mut self, score: u64) {
        log::info!("Score reported: {}", score);
        self.scores.push(score);
    }

    fn set_view(&mut self, view: &str) {
        self.views.push(view.to_string());
    }
}

/// Native/test platform
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl Platform for Headless {
    type Overlay = MemoryOverlay;
    type Host = MemoryHost;
    type Audio = MemoryAudio;
    type Storage = MemoryStorage;
}

#[cfg(target_arch = "wasm32")]
pub use web::{Browser, DomOverlay, WindowHost};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::collections::BTreeMap;

    use wasm_bindgen::{JsCast, JsValue};
    use web_sys::{Document, Element, HtmlElement};

    use super::{Host, Overlay, Platform};
    use crate::audio::WebAudio;
    use crate::persistence::LocalStorage;

    /// Class that makes an overlay element visible
    const ACTIVE: &str = "active";

    /// Overlay backed by elements looked up by id
    pub struct DomOverlay {
        document: Document,
        touch: bool,
    }

    impl DomOverlay {
        pub fn new(document: Document) -> Self {
            let touch = web_sys::window()
                .map(|w| w.navigator().max_touch_points() > 0)
                .unwrap_or(false);
            Self { document, touch }
        }

        fn element(&self, id: &str) -> Option<Element> {
            let el = self.document.get_element_by_id(id);
            if el.is_none() {
                log::debug!("Overlay element #{} not found", id);
            }
            el
        }

        fn show(&self, id: &str, text: Option<&str>) {
            if let Some(el) = self.element(id) {
                if let Some(text) = text {
                    el.set_text_content(Some(text));
                }
                let _ = el.class_list().add_1(ACTIVE);
            }
        }

        fn hide(&self, id: &str) {
            if let Some(el) = self.element(id) {
                let _ = el.class_list().remove_1(ACTIVE);
            }
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.element(id) {
                el.set_text_content(Some(text));
            }
        }
    }

    impl Overlay for DomOverlay {
        fn show_banner(&mut self, text: &str) {
            self.show("banner", Some(text));
        }

        fn hide_banner(&mut self) {
            self.hide("banner");
        }

        fn show_button(&mut self, text: &str) {
            self.show("button", Some(text));
        }

        fn hide_button(&mut self) {
            self.hide("button");
        }

        fn set_instructions(&mut self, desktop: &str, mobile: &str) {
            let text = if self.touch { mobile } else { desktop };
            self.show("instructions", Some(text));
        }

        fn hide_instructions(&mut self) {
            self.hide("instructions");
        }

        fn show_stats(&mut self) {
            self.show("stats", None);
        }

        fn set_score(&mut self, score: u64) {
            self.set_text("score", &score.to_string());
        }

        fn set_lives(&mut self, lives: i32) {
            self.set_text("lives", &lives.to_string());
        }

        fn set_mute(&mut self, muted: bool) {
            if let Some(el) = self.element("mute") {
                let _ = el.class_list().toggle_with_force("muted", muted);
                let _ = el.class_list().add_1(ACTIVE);
            }
        }

        fn hide_loading(&mut self) {
            if let Some(el) = self.element("loading") {
                let _ = el.set_attribute("class", "hidden");
            }
        }

        fn set_progress(&mut self, percent: u32) {
            self.set_text("loading-progress", &format!("{percent}%"));
        }

        fn set_styles(&mut self, colors: &BTreeMap<String, String>, font_family: Option<&str>) {
            let Some(body) = self.document.body() else {
                return;
            };
            let style = body.style();
            if let Some(color) = colors.get("textColor") {
                let _ = style.set_property("color", color);
            }
            if let Some(color) = colors.get("backgroundColor") {
                let _ = style.set_property("background-color", color);
            }
            if let Some(font) = font_family {
                let _ = style.set_property("font-family", font);
            }
            if let Some(canvas) = self
                .document
                .get_element_by_id("canvas")
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            {
                let _ = canvas.style().set_property("opacity", "1");
            }
        }
    }

    /// Calls `window.setScore` / `window.setAppView` when the page defines them
    #[derive(Debug, Default)]
    pub struct WindowHost;

    impl WindowHost {
        fn call(name: &str, arg: JsValue) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let Ok(value) = js_sys::Reflect::get(&window, &JsValue::from_str(name)) else {
                return;
            };
            match value.dyn_into::<js_sys::Function>() {
                Ok(func) => {
                    if let Err(e) = func.call1(&window, &arg) {
                        log::warn!("window.{} failed: {:?}", name, e);
                    }
                }
                Err(_) => log::debug!("window.{} is not defined", name),
            }
        }
    }

    impl Host for WindowHost {
        fn report_score(&mut self, score: u64) {
            Self::call("setScore", JsValue::from_f64(score as f64));
        }

        fn set_view(&mut self, view: &str) {
            Self::call("setAppView", JsValue::from_str(view));
        }
    }

    /// Browser platform
    pub struct Browser;

    impl Platform for Browser {
        type Overlay = DomOverlay;
        type Host = WindowHost;
        type Audio = WebAudio;
        type Storage = LocalStorage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_dispatches_commands() {
        let mut overlay = MemoryOverlay::default();
        let commands = [
            OverlayCommand::ShowBanner("Hi".to_string()),
            OverlayCommand::SetInstructions {
                desktop: "keys".to_string(),
                mobile: "tap".to_string(),
            },
            OverlayCommand::SetLives(2),
            OverlayCommand::HideButton,
        ];
        for c in &commands {
            overlay.apply(c);
        }
        assert_eq!(overlay.commands, commands.to_vec());
    }

    #[test]
    fn test_styles_include_font() {
        let mut overlay = MemoryOverlay::default();
        let mut colors = BTreeMap::new();
        colors.insert("textColor".to_string(), "#fff".to_string());
        overlay.set_styles(&colors, Some("Arial"));
        assert_eq!(overlay.styles.get("fontFamily").map(String::as_str), Some("Arial"));
        assert_eq!(overlay.styles.len(), 2);
    }

    #[test]
    fn test_host_records_calls() {
        let mut host = MemoryHost::default();
        host.report_score(120);
        host.set_view("setScore");
        assert_eq!(host.scores, vec![120]);
        assert_eq!(host.views, vec!["setScore".to_string()]);
    }
}
