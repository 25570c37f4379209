//! Audio playback tracking
//!
//! `Playlist` remembers every sound that is currently playing so it can be
//! stopped by key or all at once. The actual output sits behind
//! `AudioOutput`: Web Audio in the browser, an in-memory recorder elsewhere.
//! Completion callbacks only queue the finished id; the driver drains the
//! queue at the start of each frame.

use std::cell::RefCell;
use std::rc::Rc;

use crate::assets::Sound;

/// A playing sound that can be paused
pub trait Playback {
    fn pause(&mut self);
}

/// Something that can start sounds and be muted as a whole
pub trait AudioOutput {
    type Handle: Playback;

    /// Start `sound`; the id is reported back through `take_completed` when it ends
    fn start(&mut self, sound: Sound, looped: bool, id: u64) -> Option<Self::Handle>;

    /// Suspend or resume everything at once
    fn set_suspended(&mut self, suspended: bool);

    /// Resume output the host suspended until a user gesture
    fn unlock(&mut self);

    /// Ids of sounds that ended since the last call
    fn take_completed(&mut self) -> Vec<u64>;
}

#[derive(Debug)]
pub struct PlaylistEntry<H> {
    pub id: u64,
    pub key: Sound,
    pub handle: H,
}

/// Active playbacks in start order
#[derive(Debug)]
pub struct Playlist<H> {
    entries: Vec<PlaylistEntry<H>>,
    next_id: u64,
}

impl<H> Default for Playlist<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<H: Playback> Playlist<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next `play` call will assign
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn play(&mut self, key: Sound, handle: H) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(PlaylistEntry { id, key, handle });
        id
    }

    /// Drop a finished entry; unknown ids are ignored
    pub fn complete(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Pause and remove every entry playing `key`
    pub fn stop_by_key(&mut self, key: Sound) -> usize {
        let before = self.entries.len();
        self.entries.retain_mut(|e| {
            if e.key == key {
                e.handle.pause();
                false
            } else {
                true
            }
        });
        before - self.entries.len()
    }

    /// Pause and remove everything
    pub fn stop_all(&mut self) {
        for entry in &mut self.entries {
            entry.handle.pause();
        }
        if !self.entries.is_empty() {
            log::debug!("Stopped {} sounds", self.entries.len());
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_playing(&self, key: Sound) -> bool {
        self.entries.iter().any(|e| e.key == key)
    }

    pub fn entries(&self) -> &[PlaylistEntry<H>] {
        &self.entries
    }
}

/// Shared log of what an in-memory output did
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AudioLog {
    pub started: Vec<(u64, Sound, bool)>,
    pub paused: Vec<u64>,
}

#[derive(Debug)]
pub struct MemoryHandle {
    id: u64,
    log: Rc<RefCell<AudioLog>>,
}

impl Playback for MemoryHandle {
    fn pause(&mut self) {
        self.log.borrow_mut().paused.push(self.id);
    }
}

/// Output that records calls instead of producing sound
#[derive(Debug, Default)]
pub struct MemoryAudio {
    pub log: Rc<RefCell<AudioLog>>,
    pub suspended: bool,
    /// Number of gesture unlocks received
    pub unlocks: u32,
    finished: Vec<u64>,
}

impl MemoryAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the sound with `id` reached its end
    pub fn finish(&mut self, id: u64) {
        self.finished.push(id);
    }
}

impl AudioOutput for MemoryAudio {
    type Handle = MemoryHandle;

    fn start(&mut self, sound: Sound, looped: bool, id: u64) -> Option<MemoryHandle> {
        self.log.borrow_mut().started.push((id, sound, looped));
        Some(MemoryHandle {
            id,
            log: self.log.clone(),
        })
    }

    fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    fn unlock(&mut self) {
        self.unlocks += 1;
        self.suspended = false;
    }

    fn take_completed(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.finished)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{WebAudio, WebHandle};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{AudioBuffer, AudioBufferSourceNode, AudioContext, AudioContextState};

    use super::{AudioOutput, Playback};
    use crate::assets::Sound;

    /// A started buffer source and its end listener
    pub struct WebHandle {
        node: AudioBufferSourceNode,
        _on_ended: Closure<dyn FnMut()>,
    }

    impl Playback for WebHandle {
        fn pause(&mut self) {
            // the listener is dropped with the handle, so detach it first
            self.node.set_onended(None);
            if let Err(e) = self.node.stop() {
                log::warn!("Failed to stop sound: {:?}", e);
            }
        }
    }

    /// Web Audio output sharing one `AudioContext`
    pub struct WebAudio {
        ctx: AudioContext,
        buffers: HashMap<Sound, AudioBuffer>,
        completed: Rc<RefCell<Vec<u64>>>,
    }

    impl WebAudio {
        pub fn new(ctx: AudioContext, buffers: HashMap<Sound, AudioBuffer>) -> Self {
            Self {
                ctx,
                buffers,
                completed: Rc::new(RefCell::new(Vec::new())),
            }
        }

        pub fn context(&self) -> &AudioContext {
            &self.ctx
        }

        fn source(&self, buffer: &AudioBuffer, looped: bool) -> Result<AudioBufferSourceNode, JsValue> {
            let node = self.ctx.create_buffer_source()?;
            node.set_buffer(Some(buffer));
            node.set_loop(looped);
            node.connect_with_audio_node(&self.ctx.destination())?;
            Ok(node)
        }
    }

    impl AudioOutput for WebAudio {
        type Handle = WebHandle;

        fn start(&mut self, sound: Sound, looped: bool, id: u64) -> Option<WebHandle> {
            let Some(buffer) = self.buffers.get(&sound) else {
                log::error!("No decoded buffer for {}", sound.as_str());
                return None;
            };
            let node = match self.source(buffer, looped) {
                Ok(node) => node,
                Err(e) => {
                    log::error!("Failed to create source for {}: {:?}", sound.as_str(), e);
                    return None;
                }
            };

            let completed = self.completed.clone();
            let on_ended = Closure::<dyn FnMut()>::new(move || {
                completed.borrow_mut().push(id);
            });
            node.set_onended(Some(on_ended.as_ref().unchecked_ref()));

            if let Err(e) = node.start() {
                log::error!("Failed to start {}: {:?}", sound.as_str(), e);
                return None;
            }
            Some(WebHandle {
                node,
                _on_ended: on_ended,
            })
        }

        fn set_suspended(&mut self, suspended: bool) {
            let result = if suspended {
                self.ctx.suspend()
            } else {
                self.ctx.resume()
            };
            if let Err(e) = result {
                log::warn!("Failed to change audio state: {:?}", e);
            }
        }

        fn unlock(&mut self) {
            // contexts created before the first gesture start suspended
            if self.ctx.state() == AudioContextState::Suspended {
                if let Err(e) = self.ctx.resume() {
                    log::warn!("Failed to resume audio: {:?}", e);
                }
            }
        }

        fn take_completed(&mut self) -> Vec<u64> {
            std::mem::take(&mut *self.completed.borrow_mut())
        }
    }
}
