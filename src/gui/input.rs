//! Overlay-window key events as a virtual-key source
//!
//! Used when evdev devices are unreadable, and by the hotkey capture field.

use eframe::egui::{self, Key};

use crate::hotkey::{Hotkey, Modifiers, vk};
use crate::keystate::KeySnapshot;

pub fn egui_key_to_vk(key: Key) -> Option<u8> {
    let code = match key {
        Key::Escape => vk::ESCAPE,
        Key::Tab => vk::TAB,
        Key::Backspace => vk::BACK,
        Key::Enter => vk::RETURN,
        Key::Space => vk::SPACE,
        Key::Insert => 0x2D,
        Key::Delete => 0x2E,
        Key::Home => 0x24,
        Key::End => 0x23,
        Key::PageUp => 0x21,
        Key::PageDown => 0x22,
        Key::ArrowLeft => 0x25,
        Key::ArrowUp => 0x26,
        Key::ArrowRight => 0x27,
        Key::ArrowDown => 0x28,
        Key::Minus => 0xBD,
        Key::Equals | Key::Plus => 0xBB,
        Key::Comma => 0xBC,
        Key::Period => 0xBE,
        Key::Slash => 0xBF,
        Key::Backslash => 0xDC,
        Key::Semicolon => 0xBA,
        Key::Quote => 0xDE,
        Key::Backtick => 0xC0,
        Key::OpenBracket => 0xDB,
        Key::CloseBracket => 0xDD,
        Key::Num0 => 0x30,
        Key::Num1 => 0x31,
        Key::Num2 => 0x32,
        Key::Num3 => 0x33,
        Key::Num4 => 0x34,
        Key::Num5 => 0x35,
        Key::Num6 => 0x36,
        Key::Num7 => 0x37,
        Key::Num8 => 0x38,
        Key::Num9 => 0x39,
        Key::F1 => 0x70,
        Key::F2 => 0x71,
        Key::F3 => 0x72,
        Key::F4 => 0x73,
        Key::F5 => 0x74,
        Key::F6 => 0x75,
        Key::F7 => 0x76,
        Key::F8 => 0x77,
        Key::F9 => 0x78,
        Key::F10 => 0x79,
        Key::F11 => 0x7A,
        Key::F12 => 0x7B,
        other => {
            // Letters share their ASCII code
            let name = other.name();
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphabetic() => c.to_ascii_uppercase() as u8,
                _ => return None,
            }
        }
    };
    Some(code)
}

fn modifier_keys(snapshot: &mut KeySnapshot, modifiers: egui::Modifiers) {
    snapshot.set(vk::LSHIFT, modifiers.shift);
    snapshot.set(vk::LCONTROL, modifiers.ctrl);
    snapshot.set(vk::LMENU, modifiers.alt);
}

/// Key levels reconstructed from the overlay window's events
#[derive(Debug, Default)]
pub struct EguiKeys {
    snapshot: KeySnapshot,
}

impl EguiKeys {
    pub fn update(&mut self, ctx: &egui::Context) -> KeySnapshot {
        ctx.input(|i| {
            for event in &i.events {
                if let egui::Event::Key { key, pressed, .. } = event
                    && let Some(code) = egui_key_to_vk(*key)
                {
                    self.snapshot.set(code, *pressed);
                }
            }
            if !i.focused {
                self.snapshot = KeySnapshot::default();
            }
            modifier_keys(&mut self.snapshot, i.modifiers);
        });
        self.snapshot.clone()
    }
}

/// Outcome of one frame of hotkey capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    Waiting,
    Cancelled,
    Cleared,
    Bound(Hotkey),
}

/// Reads the first non-modifier key press. Escape cancels, Backspace clears.
pub fn capture_hotkey(ctx: &egui::Context) -> Capture {
    ctx.input(|i| {
        for event in &i.events {
            let egui::Event::Key {
                key,
                pressed: true,
                modifiers,
                ..
            } = event
            else {
                continue;
            };
            return match key {
                Key::Escape => Capture::Cancelled,
                Key::Backspace => Capture::Cleared,
                _ => match egui_key_to_vk(*key) {
                    Some(code) => Capture::Bound(Hotkey::new(code, capture_modifiers(*modifiers))),
                    None => continue,
                },
            };
        }
        Capture::Waiting
    })
}

fn capture_modifiers(modifiers: egui::Modifiers) -> Modifiers {
    let mut out = Modifiers::empty();
    out.set(Modifiers::SHIFT, modifiers.shift);
    out.set(Modifiers::CTRL, modifiers.ctrl);
    out.set(Modifiers::ALT, modifiers.alt);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_egui_keys_map_to_virtual_keys() {
        assert_eq!(egui_key_to_vk(Key::A), Some(0x41));
        assert_eq!(egui_key_to_vk(Key::Z), Some(0x5A));
        assert_eq!(egui_key_to_vk(Key::Num5), Some(0x35));
        assert_eq!(egui_key_to_vk(Key::F12), Some(0x7B));
        assert_eq!(egui_key_to_vk(Key::Enter), Some(vk::RETURN));
        assert_eq!(egui_key_to_vk(Key::Copy), None);
    }

    #[test]
    fn test_capture_modifiers() {
        let mods = capture_modifiers(egui::Modifiers {
            ctrl: true,
            shift: true,
            ..Default::default()
        });
        assert_eq!(mods, Modifiers::SHIFT | Modifiers::CTRL);
    }
}
