//! Per-frame key state tracking
//!
//! Turns a level snapshot ("is key K down right now") into edge and hold
//! flags. Called exactly once per frame before any consumer reads it.

use bitflags::bitflags;

use crate::constants::input::{KEY_COUNT, SHORT_HOLD_SECONDS};
use crate::hotkey::{vk, Modifiers};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyFlags: u8 {
        /// Key is currently down
        const HELD = 1;
        /// First frame of a press
        const KEY_DOWN = 1 << 1;
        /// First frame after release
        const KEY_UP = 1 << 2;
        /// Held continuously for at least the short-hold threshold
        const SHORT_HOLD = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyState {
    flags: KeyFlags,
    hold_time: f32,
    was_short_held: bool,
}

impl KeyState {
    fn update(&mut self, down: bool, dt: f32, threshold: f32) {
        if down {
            if self.flags.contains(KeyFlags::HELD) {
                self.flags = KeyFlags::HELD;
                if self.hold_time >= threshold {
                    self.flags |= KeyFlags::SHORT_HOLD;
                }
            } else {
                self.flags = KeyFlags::HELD | KeyFlags::KEY_DOWN;
                self.hold_time = 0.0;
            }
            self.hold_time += dt;
        } else {
            if !self.flags.is_empty() {
                self.was_short_held = self.flags.contains(KeyFlags::SHORT_HOLD);
                self.flags = if self.flags == KeyFlags::KEY_UP {
                    KeyFlags::empty()
                } else {
                    KeyFlags::KEY_UP
                };
            }
            self.hold_time = 0.0;
        }
    }

    pub fn flags(&self) -> KeyFlags {
        self.flags
    }

    pub fn is_held(&self) -> bool {
        self.flags.contains(KeyFlags::HELD)
    }

    pub fn key_down(&self) -> bool {
        self.flags.contains(KeyFlags::KEY_DOWN)
    }

    pub fn key_up(&self) -> bool {
        self.flags.contains(KeyFlags::KEY_UP)
    }

    pub fn short_hold(&self) -> bool {
        self.flags.contains(KeyFlags::SHORT_HOLD)
    }

    /// Whether the press that just ended had reached a short hold
    pub fn was_short_held(&self) -> bool {
        self.was_short_held
    }
}

/// Raw level snapshot indexed by virtual-key code
#[derive(Debug, Clone, PartialEq)]
pub struct KeySnapshot {
    down: [bool; KEY_COUNT],
}

impl Default for KeySnapshot {
    fn default() -> Self {
        Self { down: [false; KEY_COUNT] }
    }
}

impl KeySnapshot {
    pub fn from_array(down: [bool; KEY_COUNT]) -> Self {
        Self { down }
    }

    pub fn set(&mut self, code: u8, down: bool) {
        self.down[code as usize] = down;
    }

    /// Generic Shift/Ctrl/Alt also read as down while either side is
    pub fn is_down(&self, code: u8) -> bool {
        let sided = match code {
            vk::SHIFT => [vk::LSHIFT, vk::RSHIFT],
            vk::CONTROL => [vk::LCONTROL, vk::RCONTROL],
            vk::MENU => [vk::LMENU, vk::RMENU],
            _ => return self.down[code as usize],
        };
        self.down[code as usize] || sided.iter().any(|&k| self.down[k as usize])
    }
}

/// Tracks every virtual key across frames
#[derive(Debug, Clone)]
pub struct KeyTracker {
    keys: [KeyState; KEY_COUNT],
    threshold: f32,
}

impl Default for KeyTracker {
    fn default() -> Self {
        Self::new(SHORT_HOLD_SECONDS)
    }
}

impl KeyTracker {
    pub fn new(short_hold_seconds: f32) -> Self {
        Self {
            keys: [KeyState::default(); KEY_COUNT],
            threshold: short_hold_seconds,
        }
    }

    pub fn set_threshold(&mut self, seconds: f32) {
        self.threshold = seconds;
    }

    pub fn update(&mut self, snapshot: &KeySnapshot, dt: f32) {
        for (code, state) in self.keys.iter_mut().enumerate() {
            state.update(snapshot.is_down(code as u8), dt, self.threshold);
        }
    }

    /// Drops all key state, used while keyboard input belongs to someone else
    pub fn reset(&mut self) {
        self.keys = [KeyState::default(); KEY_COUNT];
    }

    pub fn state(&self, code: u8) -> &KeyState {
        &self.keys[code as usize]
    }

    /// Modifier mask of the currently held generic modifier keys
    pub fn modifiers(&self) -> Modifiers {
        let mut mods = Modifiers::empty();
        mods.set(Modifiers::SHIFT, self.keys[vk::SHIFT as usize].is_held());
        mods.set(Modifiers::CTRL, self.keys[vk::CONTROL as usize].is_held());
        mods.set(Modifiers::ALT, self.keys[vk::MENU as usize].is_held());
        mods
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: u8 = 0x41;

    fn frame(tracker: &mut KeyTracker, down: bool, dt: f32) {
        let mut snapshot = KeySnapshot::default();
        snapshot.set(A, down);
        tracker.update(&snapshot, dt);
    }

    #[test]
    fn test_tap_produces_down_then_up() {
        let mut tracker = KeyTracker::new(0.2);
        frame(&mut tracker, true, 0.016);
        assert_eq!(tracker.state(A).flags(), KeyFlags::HELD | KeyFlags::KEY_DOWN);

        frame(&mut tracker, true, 0.016);
        assert_eq!(tracker.state(A).flags(), KeyFlags::HELD);

        frame(&mut tracker, false, 0.016);
        assert!(tracker.state(A).key_up());
        assert!(!tracker.state(A).was_short_held());

        frame(&mut tracker, false, 0.016);
        assert!(tracker.state(A).flags().is_empty());
    }

    #[test]
    fn test_short_hold_after_threshold() {
        let mut tracker = KeyTracker::new(0.2);
        frame(&mut tracker, true, 0.1);
        frame(&mut tracker, true, 0.1);
        assert!(!tracker.state(A).short_hold());
        frame(&mut tracker, true, 0.1);
        assert!(tracker.state(A).short_hold());
        assert!(tracker.state(A).is_held());

        frame(&mut tracker, false, 0.1);
        assert!(tracker.state(A).key_up());
        assert!(tracker.state(A).was_short_held());
    }

    #[test]
    fn test_new_press_restarts_hold_timer() {
        let mut tracker = KeyTracker::new(0.2);
        for _ in 0..5 {
            frame(&mut tracker, true, 0.1);
        }
        frame(&mut tracker, false, 0.1);
        frame(&mut tracker, true, 0.1);
        frame(&mut tracker, true, 0.05);
        assert!(!tracker.state(A).short_hold());
    }

    #[test]
    fn test_modifiers_from_sided_keys() {
        let mut tracker = KeyTracker::default();
        let mut snapshot = KeySnapshot::default();
        snapshot.set(vk::RCONTROL, true);
        snapshot.set(vk::LSHIFT, true);
        tracker.update(&snapshot, 0.016);
        assert_eq!(tracker.modifiers(), Modifiers::CTRL | Modifiers::SHIFT);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut tracker = KeyTracker::default();
        frame(&mut tracker, true, 0.016);
        tracker.reset();
        assert!(tracker.state(A).flags().is_empty());
    }
}
