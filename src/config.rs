//! Game configuration
//!
//! The host page supplies a JSON document with four scopes (`settings`,
//! `images`, `sounds`, `colors`). Numeric settings are often typed by hand
//! in a form, so they may arrive as numbers or strings; both are coerced
//! here, once, before the game loop starts.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assets::{Sound, Sprite};
use crate::consts::*;
use crate::sim::Screen;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("setting `{field}` is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },
    #[error("setting `{field}` is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
    #[error("no URL configured for asset `{0}`")]
    MissingAsset(&'static str),
}

/// A setting that may be written as a number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Number(v)
    }
}

impl From<&str> for Numeric {
    fn from(v: &str) -> Self {
        Numeric::Text(v.to_string())
    }
}

impl Numeric {
    /// Integer coercion: truncates numbers, reads the leading integer of strings
    pub fn to_int(&self, field: &'static str) -> Result<i64, ConfigError> {
        let value = match self {
            Numeric::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            Numeric::Number(_) => None,
            Numeric::Text(s) => leading_int(s),
        };
        value.ok_or_else(|| self.not_a_number(field))
    }

    /// Float coercion: reads the leading decimal of strings
    pub fn to_float(&self, field: &'static str) -> Result<f32, ConfigError> {
        let value = match self {
            Numeric::Number(n) if n.is_finite() => Some(*n as f32),
            Numeric::Number(_) => None,
            Numeric::Text(s) => leading_float(s),
        };
        value.ok_or_else(|| self.not_a_number(field))
    }

    fn not_a_number(&self, field: &'static str) -> ConfigError {
        let value = match self {
            Numeric::Number(n) => n.to_string(),
            Numeric::Text(s) => s.clone(),
        };
        ConfigError::NotANumber { field, value }
    }
}

/// Length of an optional sign followed by at least one digit
fn signed_digits(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let sign = usize::from(matches!(bytes.first().copied(), Some(b'+' | b'-')));
    let digits = bytes[sign..].iter().take_while(|b| b.is_ascii_digit()).count();
    (digits > 0).then_some(sign + digits)
}

fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let end = signed_digits(s)?;
    s[..end].parse().ok()
}

fn leading_float(s: &str) -> Option<f32> {
    let s = s.trim_start();
    let mut end = signed_digits(s)?;
    let rest = &s.as_bytes()[end..];
    if rest.first() == Some(&b'.') {
        let frac = rest[1..].iter().take_while(|b| b.is_ascii_digit()).count();
        if frac > 0 {
            end += 1 + frac;
        }
    }
    s[..end].parse().ok()
}

/// `settings` scope
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsScope {
    pub name: String,
    #[serde(default = "default_start_text")]
    pub start_text: String,
    #[serde(default = "default_win_text")]
    pub win_text: String,
    #[serde(default = "default_gameover_text")]
    pub gameover_text: String,
    #[serde(default)]
    pub instructions_desktop: String,
    #[serde(default)]
    pub instructions_mobile: String,
    #[serde(default)]
    pub font_family: String,
    pub player_speed: Numeric,
    pub enemy_min_speed: Numeric,
    pub enemy_max_speed: Numeric,
    pub enemy_spawn_rate: Numeric,
    pub lives: Numeric,
    pub wins: Numeric,
}

fn default_start_text() -> String {
    "Start".to_string()
}

fn default_win_text() -> String {
    "You Win!".to_string()
}

fn default_gameover_text() -> String {
    "Game Over".to_string()
}

/// Complete configuration document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub settings: SettingsScope,
    /// Image URLs keyed by sprite name (`topImage`, `enemyImage`, ...)
    #[serde(default)]
    pub images: BTreeMap<String, String>,
    /// Sound URLs keyed by sound name (`backgroundMusic`, `dieSound`, ...)
    #[serde(default)]
    pub sounds: BTreeMap<String, String>,
    /// Overlay colors (`textColor`, `backgroundColor`, ...)
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn image_url(&self, sprite: Sprite) -> Result<&str, ConfigError> {
        self.images
            .get(sprite.as_str())
            .map(String::as_str)
            .ok_or(ConfigError::MissingAsset(sprite.as_str()))
    }

    pub fn sound_url(&self, sound: Sound) -> Result<&str, ConfigError> {
        self.sounds
            .get(sound.as_str())
            .map(String::as_str)
            .ok_or(ConfigError::MissingAsset(sound.as_str()))
    }

    /// Update one value in a scope (live configuration change)
    ///
    /// `settings` values are matched by their camelCase name; numeric
    /// settings accept either a number or a string.
    pub fn set_value(
        &mut self,
        scope: &str,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), ConfigError> {
        let as_text = |v: &serde_json::Value| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match scope {
            "images" => {
                self.images.insert(key.to_string(), as_text(&value));
            }
            "sounds" => {
                self.sounds.insert(key.to_string(), as_text(&value));
            }
            "colors" => {
                self.colors.insert(key.to_string(), as_text(&value));
            }
            "settings" => {
                let mut doc = serde_json::to_value(&self.settings)
                    .map_err(|e| ConfigError::Parse(e.to_string()))?;
                if let Some(map) = doc.as_object_mut() {
                    map.insert(key.to_string(), value);
                }
                self.settings =
                    serde_json::from_value(doc).map_err(|e| ConfigError::Parse(e.to_string()))?;
            }
            _ => {
                return Err(ConfigError::Invalid {
                    field: "scope",
                    reason: format!("unknown configuration scope `{scope}`"),
                });
            }
        }
        Ok(())
    }
}

/// Validated gameplay parameters derived from config and screen size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameParams {
    pub player_size: Vec2,
    pub player_speed: f32,
    pub enemy_size: Vec2,
    pub enemy_min_speed: f32,
    pub enemy_max_speed: f32,
    pub enemy_spawn_rate: u64,
    pub safe_zone: f32,
    pub lives: i32,
    pub wins: i32,
}

impl GameParams {
    pub fn from_config(config: &GameConfig, screen: &Screen) -> Result<Self, ConfigError> {
        let s = &config.settings;
        let player_speed = s.player_speed.to_float("playerSpeed")?;
        let enemy_min_speed = s.enemy_min_speed.to_int("enemyMinSpeed")? as f32;
        let enemy_max_speed = s.enemy_max_speed.to_int("enemyMaxSpeed")? as f32;
        let spawn_rate = s.enemy_spawn_rate.to_int("enemySpawnRate")?;
        let lives = s.lives.to_int("lives")?;
        let wins = s.wins.to_int("wins")?;

        if spawn_rate < 1 {
            return Err(ConfigError::Invalid {
                field: "enemySpawnRate",
                reason: format!("must be at least 1 frame, got {spawn_rate}"),
            });
        }
        // enemies only despawn past the right edge, so they must move right
        if enemy_min_speed < 1.0 {
            return Err(ConfigError::Invalid {
                field: "enemyMinSpeed",
                reason: format!("must be at least 1, got {enemy_min_speed}"),
            });
        }
        if player_speed <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "playerSpeed",
                reason: format!("must be positive, got {player_speed}"),
            });
        }
        if enemy_min_speed > enemy_max_speed {
            return Err(ConfigError::Invalid {
                field: "enemyMinSpeed",
                reason: format!("{enemy_min_speed} is greater than enemyMaxSpeed {enemy_max_speed}"),
            });
        }
        for (field, value) in [("lives", lives), ("wins", wins)] {
            if !(1..=i64::from(i32::MAX)).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a positive count, got {value}"),
                });
            }
        }

        let scale = screen.scale;
        let player = (PLAYER_BASE * scale).min(PLAYER_MAX);
        let enemy_size = Vec2::new(
            (ENEMY_BASE_WIDTH * scale).min(ENEMY_MAX_WIDTH),
            (ENEMY_BASE_HEIGHT * scale).min(ENEMY_MAX_HEIGHT),
        );

        Ok(Self {
            player_size: Vec2::splat(player),
            player_speed,
            enemy_size,
            enemy_min_speed,
            enemy_max_speed,
            enemy_spawn_rate: spawn_rate as u64,
            safe_zone: player * SAFE_ZONE_RATIO,
            lives: lives as i32,
            wins: wins as i32,
        })
    }
}
