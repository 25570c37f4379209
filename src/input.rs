//! Input mapping
//!
//! Browser listeners only push `InputEvent`s into an `InputQueue`; the queue
//! is drained once at the start of each tick, so every state change caused
//! by input happens inside the tick in arrival order.

use glam::Vec2;

use crate::consts::ARRIVE_FRACTION;
use crate::sim::{Entity, GamePhase};

/// Arrow keys the game listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Map a `KeyboardEvent.code`
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" => Some(Key::Up),
            "ArrowDown" => Some(Key::Down),
            "ArrowLeft" => Some(Key::Left),
            "ArrowRight" => Some(Key::Right),
            _ => None,
        }
    }
}

/// Overlay element an event landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Start / restart control
    Button,
    Mute,
    Other,
}

impl Target {
    pub fn from_id(id: &str) -> Self {
        match id {
            "button" => Target::Button,
            "mute" => Target::Mute,
            _ => Target::Other,
        }
    }
}

/// Raw input, as delivered by the platform layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    /// Touch/pointer released at client coordinates
    PointerEnd { x: f32, y: f32, target: Target },
    Click { target: Target },
    Resize { width: f32, height: f32 },
}

impl InputEvent {
    /// Events the browser counts as user activation
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            InputEvent::KeyDown(_) | InputEvent::PointerEnd { .. } | InputEvent::Click { .. }
        )
    }
}

/// Which device currently drives the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Keyboard,
    Pointer,
}

/// Held arrow keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keys {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl Keys {
    fn set(&mut self, key: Key, held: bool) {
        match key {
            Key::Up => self.up = held,
            Key::Down => self.down = held,
            Key::Left => self.left = held,
            Key::Right => self.right = held,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    pub active: Device,
    pub keys: Keys,
    /// Last point the player asked to walk to
    pub pointer_target: Vec2,
}

impl InputState {
    /// Apply a key or pointer event
    ///
    /// Pointer events are dropped while the start screen is up and when they
    /// land on the mute control. Click and resize events are not handled here.
    pub fn apply(&mut self, event: &InputEvent, phase: GamePhase) {
        match *event {
            InputEvent::KeyDown(key) => {
                self.active = Device::Keyboard;
                self.keys.set(key, true);
            }
            InputEvent::KeyUp(key) => self.keys.set(key, false),
            InputEvent::PointerEnd { x, y, target } => {
                if phase == GamePhase::Ready || target == Target::Mute {
                    return;
                }
                self.active = Device::Pointer;
                self.pointer_target = Vec2::new(x.floor(), y.floor());
            }
            InputEvent::Click { .. } | InputEvent::Resize { .. } => {}
        }
    }

    /// Directional intent for `player` from the active device
    pub fn direction(&self, player: &Entity) -> Vec2 {
        match self.active {
            Device::Keyboard => keyboard_direction(&self.keys),
            Device::Pointer => pointer_direction(self.pointer_target, player),
        }
    }
}

/// Sum of opposite unit impulses per held key
pub fn keyboard_direction(keys: &Keys) -> Vec2 {
    let axis = |neg: bool, pos: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
    Vec2::new(axis(keys.left, keys.right), axis(keys.up, keys.down))
}

/// Straight-line direction from the player's center toward `target`
///
/// An axis closer than an eighth of the player's size on that axis counts
/// as arrived and contributes nothing. The dominant axis moves at full
/// speed and the minor axis proportionally, so the path is a straight line.
pub fn pointer_direction(target: Vec2, player: &Entity) -> Vec2 {
    let delta = target - player.center();
    let dist = delta.abs();
    let threshold = player.size * ARRIVE_FRACTION;

    let step = |d: f32, dist: f32, threshold: f32| {
        if dist > threshold { d.signum() } else { 0.0 }
    };
    let x = step(delta.x, dist.x, threshold.x);
    let y = step(delta.y, dist.y, threshold.y);
    if x == 0.0 && y == 0.0 {
        return Vec2::ZERO;
    }

    let dir = if dist.x > dist.y {
        Vec2::new(x, y * (dist.y / dist.x))
    } else {
        Vec2::new(x * (dist.x / dist.y), y)
    };
    dir.clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// Events collected between ticks
#[derive(Debug, Default)]
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Take everything queued so far, in arrival order
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Sprite;
    use proptest::prelude::*;

    fn player() -> Entity {
        // center at (100, 100), arrive threshold 5px
        Entity::new(Sprite::Character, Vec2::new(80.0, 80.0), Vec2::new(40.0, 40.0), 1.0)
    }

    #[test]
    fn test_keyboard_direction() {
        let mut keys = Keys::default();
        assert_eq!(keyboard_direction(&keys), Vec2::ZERO);
        keys.up = true;
        keys.right = true;
        assert_eq!(keyboard_direction(&keys), Vec2::new(1.0, -1.0));
        keys.left = true;
        keys.down = true;
        assert_eq!(keyboard_direction(&keys), Vec2::ZERO);
    }

    #[test]
    fn test_gesture_events() {
        assert!(InputEvent::KeyDown(Key::Up).is_gesture());
        assert!(InputEvent::Click { target: Target::Button }.is_gesture());
        assert!(
            InputEvent::PointerEnd {
                x: 1.0,
                y: 2.0,
                target: Target::Other
            }
            .is_gesture()
        );
        assert!(!InputEvent::KeyUp(Key::Up).is_gesture());
        assert!(
            !InputEvent::Resize {
                width: 1.0,
                height: 1.0
            }
            .is_gesture()
        );
    }

    #[test]
    fn test_key_events_switch_device() {
        let mut input = InputState {
            active: Device::Pointer,
            ..Default::default()
        };
        input.apply(&InputEvent::KeyDown(Key::Left), GamePhase::Play);
        assert_eq!(input.active, Device::Keyboard);
        assert!(input.keys.left);
        input.apply(&InputEvent::KeyUp(Key::Left), GamePhase::Play);
        assert!(!input.keys.left);
        assert_eq!(Key::from_code("KeyW"), None);
    }

    #[test]
    fn test_pointer_ignored_in_ready_and_on_mute() {
        let mut input = InputState::default();
        let tap = |target| InputEvent::PointerEnd {
            x: 10.7,
            y: 20.2,
            target,
        };
        input.apply(&tap(Target::Other), GamePhase::Ready);
        assert_eq!(input.active, Device::Keyboard);
        input.apply(&tap(Target::Mute), GamePhase::Play);
        assert_eq!(input.active, Device::Keyboard);
        input.apply(&tap(Target::Other), GamePhase::Play);
        assert_eq!(input.active, Device::Pointer);
        assert_eq!(input.pointer_target, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_pointer_straight_line() {
        let p = player();
        // dx = 100, dy = -50
        let dir = pointer_direction(Vec2::new(200.0, 50.0), &p);
        assert_eq!(dir, Vec2::new(1.0, -0.5));
        // dx = -20, dy = 80
        let dir = pointer_direction(Vec2::new(80.0, 180.0), &p);
        assert_eq!(dir, Vec2::new(-0.25, 1.0));
    }

    #[test]
    fn test_pointer_single_axis_arrived() {
        let p = player();
        let dir = pointer_direction(Vec2::new(103.0, 300.0), &p);
        assert_eq!(dir, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_pointer_arrived() {
        let p = player();
        assert_eq!(pointer_direction(Vec2::new(100.0, 100.0), &p), Vec2::ZERO);
        assert_eq!(pointer_direction(Vec2::new(104.0, 96.0), &p), Vec2::ZERO);
    }

    #[test]
    fn test_direction_uses_active_device() {
        let p = player();
        let mut input = InputState::default();
        input.keys.down = true;
        input.pointer_target = Vec2::new(300.0, 100.0);
        assert_eq!(input.direction(&p), Vec2::new(0.0, 1.0));
        input.active = Device::Pointer;
        assert_eq!(input.direction(&p), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_queue_drains_in_order() {
        let mut queue = InputQueue::new();
        queue.push(InputEvent::KeyDown(Key::Up));
        queue.push(InputEvent::Click {
            target: Target::Button,
        });
        assert_eq!(queue.len(), 2);
        let drained = queue.drain();
        assert_eq!(drained[0], InputEvent::KeyDown(Key::Up));
        assert!(queue.is_empty());
        assert_eq!(Target::from_id("button"), Target::Button);
        assert_eq!(Target::from_id("stats"), Target::Other);
    }

    proptest! {
        #[test]
        fn prop_arrived_is_zero(dx in -4.9f32..4.9, dy in -4.9f32..4.9) {
            let p = player();
            let dir = pointer_direction(p.center() + Vec2::new(dx, dy), &p);
            prop_assert_eq!(dir, Vec2::ZERO);
        }

        #[test]
        fn prop_direction_is_bounded(tx in -2000.0f32..2000.0, ty in -2000.0f32..2000.0) {
            let p = player();
            let dir = pointer_direction(Vec2::new(tx, ty), &p);
            prop_assert!(dir.x.abs() <= 1.0 && dir.y.abs() <= 1.0);
            prop_assert!(dir.x.is_finite() && dir.y.is_finite());
        }
    }
}
