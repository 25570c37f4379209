//! Player preferences
//!
//! The only persisted preference is the mute flag. It lives under a key
//! derived from the game name, so several games on one origin keep
//! separate settings.

use crate::persistence::{Storage, hash_code};

/// Persisted settings on top of a `Storage` backend
#[derive(Debug, Clone)]
pub struct Settings<S> {
    storage: S,
    key: String,
}

impl<S: Storage> Settings<S> {
    pub fn new(storage: S, name: &str) -> Self {
        Self {
            storage,
            key: Self::muted_key(name),
        }
    }

    /// Storage key of the mute flag for game `name`
    pub fn muted_key(name: &str) -> String {
        format!("{}muted", hash_code(name))
    }

    /// Follow a change of game name
    pub fn rename(&mut self, name: &str) {
        self.key = Self::muted_key(name);
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored mute flag; anything but `"true"` counts as unmuted
    pub fn load(&self) -> bool {
        self.storage.get(&self.key).as_deref() == Some("true")
    }

    /// Flip the stored flag and return what storage now holds
    pub fn toggle_muted(&mut self) -> bool {
        let next = if self.load() { "false" } else { "true" };
        if let Err(e) = self.storage.set(&self.key, next) {
            log::warn!("Failed to save mute setting: {}", e);
        }
        let muted = self.load();
        log::info!("Sound {}", if muted { "muted" } else { "unmuted" });
        muted
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_key_uses_name_hash() {
        assert_eq!(Settings::<MemoryStorage>::muted_key("a"), "97muted");
        let settings = Settings::new(MemoryStorage::new(), "hello");
        assert_eq!(settings.key(), "99162322muted");
    }

    #[test]
    fn test_defaults_to_unmuted() {
        let settings = Settings::new(MemoryStorage::new(), "Lane Hopper");
        assert!(!settings.load());
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut settings = Settings::new(MemoryStorage::new(), "Lane Hopper");
        assert!(settings.toggle_muted());
        assert_eq!(settings.storage().get(settings.key()).as_deref(), Some("true"));
        assert!(!settings.toggle_muted());
        assert_eq!(settings.storage().get(settings.key()).as_deref(), Some("false"));
    }

    #[test]
    fn test_garbage_value_reads_unmuted() {
        let mut storage = MemoryStorage::new();
        storage
            .set(&Settings::<MemoryStorage>::muted_key("x"), "yes")
            .unwrap();
        let mut settings = Settings::new(storage, "x");
        assert!(!settings.load());
        assert!(settings.toggle_muted());
    }
}
