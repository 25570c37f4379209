//! Asset keys, manifest and loaded bundle
//!
//! The core only ever refers to assets through the `Sprite` and `Sound`
//! enums. The manifest maps them to URLs from the configuration, and the
//! loader (browser only) turns the manifest into a bundle.

use std::collections::HashMap;

use thiserror::Error;

use crate::config::{ConfigError, GameConfig};

/// Key under which the game font is registered
pub const FONT_KEY: &str = "gameFont";

/// Every image the game draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sprite {
    /// Goal band background
    Top,
    /// Traffic band background
    Middle,
    /// Start band background
    Bottom,
    /// Player
    Character,
    Enemy,
}

impl Sprite {
    pub const ALL: [Sprite; 5] = [
        Sprite::Top,
        Sprite::Middle,
        Sprite::Bottom,
        Sprite::Character,
        Sprite::Enemy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sprite::Top => "topImage",
            Sprite::Middle => "middleImage",
            Sprite::Bottom => "bottomImage",
            Sprite::Character => "characterImage",
            Sprite::Enemy => "enemyImage",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// Every sound the game plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sound {
    BackgroundMusic,
    Win,
    GameOver,
    Score,
    Die,
}

impl Sound {
    pub const ALL: [Sound; 5] = [
        Sound::BackgroundMusic,
        Sound::Win,
        Sound::GameOver,
        Sound::Score,
        Sound::Die,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sound::BackgroundMusic => "backgroundMusic",
            Sound::Win => "winSound",
            Sound::GameOver => "gameoverSound",
            Sound::Score => "scoreSound",
            Sound::Die => "dieSound",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssetError {
    #[error("failed to fetch `{key}`: {reason}")]
    Fetch { key: String, reason: String },
    #[error("failed to decode `{key}`: {reason}")]
    Decode { key: String, reason: String },
    #[error("bundle is missing assets: {0:?}")]
    Missing(Vec<&'static str>),
    /// The load was started before a reconfigure or teardown
    #[error("load {0} was superseded")]
    Superseded(u64),
}

/// URLs of everything the game needs before it can leave `Loading`
#[derive(Debug, Clone, PartialEq)]
pub struct AssetManifest {
    pub images: Vec<(Sprite, String)>,
    pub sounds: Vec<(Sound, String)>,
    /// Font family name or stylesheet URL
    pub font: String,
}

impl AssetManifest {
    pub fn from_config(config: &GameConfig) -> Result<Self, ConfigError> {
        let images = Sprite::ALL
            .into_iter()
            .map(|s| config.image_url(s).map(|url| (s, url.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        let sounds = Sound::ALL
            .into_iter()
            .map(|s| config.sound_url(s).map(|url| (s, url.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            images,
            sounds,
            font: config.settings.font_family.clone(),
        })
    }

    /// Number of load steps (images + sounds + font)
    pub fn total(&self) -> usize {
        self.images.len() + self.sounds.len() + 1
    }
}

/// Decoded RGBA8 image
#[derive(Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImageData({}x{})", self.width, self.height)
    }
}

impl ImageData {
    /// Decode PNG/JPEG bytes
    pub fn decode(key: &str, bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes).map_err(|e| AssetError::Decode {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    /// Solid single-color image, used as a stand-in texture
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        Self {
            width,
            height,
            rgba,
        }
    }
}

/// Loaded assets keyed by the names the core requested
#[derive(Debug, Clone)]
pub struct AssetBundle<I, S> {
    pub images: HashMap<Sprite, I>,
    pub sounds: HashMap<Sound, S>,
    pub fonts: HashMap<String, String>,
}

impl<I, S> Default for AssetBundle<I, S> {
    fn default() -> Self {
        Self {
            images: HashMap::new(),
            sounds: HashMap::new(),
            fonts: HashMap::new(),
        }
    }
}

impl<I, S> AssetBundle<I, S> {
    /// Requested keys absent from this bundle
    pub fn missing(&self, manifest: &AssetManifest) -> Vec<&'static str> {
        let mut missing: Vec<&'static str> = manifest
            .images
            .iter()
            .filter(|(s, _)| !self.images.contains_key(s))
            .map(|(s, _)| s.as_str())
            .collect();
        missing.extend(
            manifest
                .sounds
                .iter()
                .filter(|(s, _)| !self.sounds.contains_key(s))
                .map(|(s, _)| s.as_str()),
        );
        if !self.fonts.contains_key(FONT_KEY) {
            missing.push(FONT_KEY);
        }
        missing
    }

    /// Reject a partially populated bundle
    pub fn verify(self, manifest: &AssetManifest) -> Result<Self, AssetError> {
        let missing = self.missing(manifest);
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(AssetError::Missing(missing))
        }
    }

    pub fn font(&self) -> Option<&str> {
        self.fonts.get(FONT_KEY).map(String::as_str)
    }
}

/// Where asset loading stands
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    InProgress { loaded: usize, total: usize },
    Ready,
    Failed(AssetError),
}

impl LoadStatus {
    pub fn starting(total: usize) -> Self {
        LoadStatus::InProgress { loaded: 0, total }
    }

    /// Whole-number percentage, 100 once ready
    pub fn percent(&self) -> u32 {
        match self {
            LoadStatus::InProgress { loaded, total } if *total > 0 => {
                ((*loaded as f64 / *total as f64) * 100.0).floor() as u32
            }
            LoadStatus::InProgress { .. } => 0,
            LoadStatus::Ready => 100,
            LoadStatus::Failed(_) => 0,
        }
    }

    /// Record one more finished asset
    pub fn advance(&mut self) {
        if let LoadStatus::InProgress { loaded, total } = self {
            *loaded = (*loaded + 1).min(*total);
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LoadStatus::Failed(_))
    }
}

/// Font family from a configured value
///
/// Plain names are used as-is; stylesheet URLs (`...?family=Press+Start+2P`)
/// yield the quoted family they declare.
pub fn font_family(src: &str) -> Option<String> {
    if !src.contains("http") {
        return Some(src.to_string());
    }
    let (_, family) = src.split_once("family=")?;
    let family = family.split(['&', ':']).next().unwrap_or(family);
    Some(format!("\"{}\"", family.replace('+', " ")))
}

/// Browser loader: fetch, decode and report progress
#[cfg(target_arch = "wasm32")]
pub mod web {
    use js_sys::{ArrayBuffer, Promise, Uint8Array};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;
    use web_sys::{AudioBuffer, AudioContext, HtmlLinkElement, Response};

    use super::*;

    pub type WebBundle = AssetBundle<ImageData, AudioBuffer>;

    fn js_reason(e: JsValue) -> String {
        e.as_string().unwrap_or_else(|| format!("{e:?}"))
    }

    fn fetch(url: &str) -> Result<Promise, String> {
        let window = web_sys::window().ok_or("no window")?;
        Ok(window.fetch_with_str(url))
    }

    async fn array_buffer(fetch: Promise) -> Result<ArrayBuffer, String> {
        let resp: Response = JsFuture::from(fetch)
            .await
            .map_err(js_reason)?
            .dyn_into()
            .map_err(js_reason)?;
        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let buf = JsFuture::from(resp.array_buffer().map_err(js_reason)?)
            .await
            .map_err(js_reason)?;
        buf.dyn_into().map_err(js_reason)
    }

    async fn decode_sound(ctx: &AudioContext, buf: &ArrayBuffer) -> Result<AudioBuffer, String> {
        let promise = ctx.decode_audio_data(buf).map_err(js_reason)?;
        JsFuture::from(promise)
            .await
            .map_err(js_reason)?
            .dyn_into()
            .map_err(js_reason)
    }

    fn inject_stylesheet(href: &str) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Ok(link) = document.create_element("link") else {
            return;
        };
        let Ok(link) = link.dyn_into::<HtmlLinkElement>() else {
            return;
        };
        link.set_rel("stylesheet");
        link.set_type("text/css");
        link.set_href(href);
        if let Some(head) = document.head() {
            let _ = head.append_child(&link);
        }
    }

    /// Load every asset in `manifest`
    ///
    /// All requests are issued up front and awaited in order, so the
    /// downloads overlap. There is no timeout.
    pub async fn load<F>(
        manifest: &AssetManifest,
        ctx: &AudioContext,
        mut on_progress: F,
    ) -> Result<WebBundle, AssetError>
    where
        F: FnMut(&LoadStatus),
    {
        let mut status = LoadStatus::starting(manifest.total());
        on_progress(&status);

        let fetch_err = |key: &str, reason: String| AssetError::Fetch {
            key: key.to_string(),
            reason,
        };

        let image_requests = manifest
            .images
            .iter()
            .map(|(s, url)| fetch(url).map(|p| (*s, p)).map_err(|r| fetch_err(s.as_str(), r)))
            .collect::<Result<Vec<_>, _>>()?;
        let sound_requests = manifest
            .sounds
            .iter()
            .map(|(s, url)| fetch(url).map(|p| (*s, p)).map_err(|r| fetch_err(s.as_str(), r)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut bundle = WebBundle::default();

        for (sprite, request) in image_requests {
            let key = sprite.as_str();
            let buf = array_buffer(request).await.map_err(|r| fetch_err(key, r))?;
            let image = ImageData::decode(key, &Uint8Array::new(&buf).to_vec())?;
            log::debug!("Loaded {} ({}x{})", key, image.width, image.height);
            bundle.images.insert(sprite, image);
            status.advance();
            on_progress(&status);
        }

        for (sound, request) in sound_requests {
            let key = sound.as_str();
            let buf = array_buffer(request).await.map_err(|r| fetch_err(key, r))?;
            let audio = decode_sound(ctx, &buf)
                .await
                .map_err(|reason| AssetError::Decode {
                    key: key.to_string(),
                    reason,
                })?;
            log::debug!("Loaded {} ({:.1}s)", key, audio.duration());
            bundle.sounds.insert(sound, audio);
            status.advance();
            on_progress(&status);
        }

        if manifest.font.contains("http") {
            inject_stylesheet(&manifest.font);
        }
        let family = font_family(&manifest.font).ok_or_else(|| AssetError::Decode {
            key: FONT_KEY.to_string(),
            reason: format!("no font family in {:?}", manifest.font),
        })?;
        bundle.fonts.insert(FONT_KEY.to_string(), family);
        status.advance();
        on_progress(&status);

        bundle.verify(manifest)
    }
}
