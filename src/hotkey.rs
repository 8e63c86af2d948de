//! Packed hotkey bindings and virtual-key names
//!
//! A binding is a single `u32`: modifier bits in the high half and a
//! virtual-key code (Windows numbering) in the low bits.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Virtual-key codes referenced directly by the input layer
pub mod vk {
    pub const BACK: u8 = 0x08;
    pub const TAB: u8 = 0x09;
    pub const RETURN: u8 = 0x0D;
    pub const SHIFT: u8 = 0x10;
    pub const CONTROL: u8 = 0x11;
    pub const MENU: u8 = 0x12;
    pub const ESCAPE: u8 = 0x1B;
    pub const SPACE: u8 = 0x20;
    pub const LSHIFT: u8 = 0xA0;
    pub const RSHIFT: u8 = 0xA1;
    pub const LCONTROL: u8 = 0xA2;
    pub const RCONTROL: u8 = 0xA3;
    pub const LMENU: u8 = 0xA4;
    pub const RMENU: u8 = 0xA5;
}

bitflags! {
    /// Modifier bits as stored in the packed binding
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 16;
        const CTRL = 1 << 17;
        const ALT = 1 << 18;
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HotkeyParseError {
    #[error("hotkey string is empty")]
    Empty,
    #[error("unknown key name '{0}'")]
    UnknownKey(String),
    #[error("hotkey has no base key")]
    MissingKey,
    #[error("hotkey names more than one base key")]
    MultipleKeys,
}

/// A hotkey binding; zero means unbound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hotkey(pub u32);

impl Hotkey {
    pub const NONE: Hotkey = Hotkey(0);

    pub fn new(key: u8, modifiers: Modifiers) -> Self {
        Hotkey(modifiers.bits() | key as u32)
    }

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn key(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub fn modifiers(self) -> Modifiers {
        Modifiers::from_bits_truncate(self.0)
    }

    /// Whether a key pressed under `modifiers` triggers this binding
    pub fn matches(self, key: u8, modifiers: Modifiers) -> bool {
        !self.is_none() && self == Hotkey::new(key, modifiers)
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "None");
        }
        let mods = self.modifiers();
        if mods.contains(Modifiers::SHIFT) {
            write!(f, "Shift + ")?;
        }
        if mods.contains(Modifiers::CTRL) {
            write!(f, "Ctrl + ")?;
        }
        if mods.contains(Modifiers::ALT) {
            write!(f, "Alt + ")?;
        }
        write!(f, "{}", key_name(self.key()))
    }
}

impl FromStr for Hotkey {
    type Err = HotkeyParseError;

    /// Parses "Ctrl + Shift + X" style strings, modifiers in any order
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(HotkeyParseError::Empty);
        }
        if s.eq_ignore_ascii_case("none") {
            return Ok(Hotkey::NONE);
        }

        let mut modifiers = Modifiers::empty();
        let mut key = None;
        for part in s.split('+').map(str::trim) {
            if part.is_empty() {
                continue;
            }
            match part.to_ascii_lowercase().as_str() {
                "shift" => modifiers |= Modifiers::SHIFT,
                "ctrl" | "control" => modifiers |= Modifiers::CTRL,
                "alt" => modifiers |= Modifiers::ALT,
                _ => {
                    let code = key_from_name(part)
                        .ok_or_else(|| HotkeyParseError::UnknownKey(part.to_string()))?;
                    if key.replace(code).is_some() {
                        return Err(HotkeyParseError::MultipleKeys);
                    }
                }
            }
        }

        key.map(|k| Hotkey::new(k, modifiers))
            .ok_or(HotkeyParseError::MissingKey)
    }
}

/// Human readable name of a virtual key
pub fn key_name(code: u8) -> String {
    let name = match code {
        0x01 => "LButton",
        0x02 => "RButton",
        0x04 => "MButton",
        0x05 => "XButton1",
        0x06 => "XButton2",
        0x08 => "Backspace",
        0x09 => "Tab",
        0x0C => "Clear",
        0x0D => "Enter",
        0x10 => "Shift",
        0x11 => "Ctrl",
        0x12 => "Alt",
        0x13 => "Pause",
        0x14 => "CapsLock",
        0x1B => "Escape",
        0x20 => "Space",
        0x21 => "PageUp",
        0x22 => "PageDown",
        0x23 => "End",
        0x24 => "Home",
        0x25 => "Left",
        0x26 => "Up",
        0x27 => "Right",
        0x28 => "Down",
        0x2C => "PrintScreen",
        0x2D => "Insert",
        0x2E => "Delete",
        0x30..=0x39 | 0x41..=0x5A => return (code as char).to_string(),
        0x5B => "LWin",
        0x5C => "RWin",
        0x5D => "Apps",
        0x60..=0x69 => return format!("NumPad{}", code - 0x60),
        0x6A => "Multiply",
        0x6B => "Add",
        0x6C => "Separator",
        0x6D => "Subtract",
        0x6E => "Decimal",
        0x6F => "Divide",
        0x70..=0x87 => return format!("F{}", code - 0x6F),
        0x90 => "NumLock",
        0x91 => "ScrollLock",
        0xA0 => "LShift",
        0xA1 => "RShift",
        0xA2 => "LCtrl",
        0xA3 => "RCtrl",
        0xA4 => "LAlt",
        0xA5 => "RAlt",
        0xBA => ";",
        0xBB => "=",
        0xBC => ",",
        0xBD => "-",
        0xBE => ".",
        0xBF => "/",
        0xC0 => "`",
        0xDB => "[",
        0xDC => "\\",
        0xDD => "]",
        0xDE => "'",
        _ => return format!("Key{code}"),
    };
    name.to_string()
}

/// Inverse of [`key_name`], case-insensitive
pub fn key_from_name(name: &str) -> Option<u8> {
    (1..=u8::MAX).find(|&code| key_name(code).eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packing() {
        let hotkey = Hotkey::new(0x41, Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(hotkey.0, (1 << 16) | (1 << 17) | 0x41);
        assert_eq!(hotkey.key(), 0x41);
        assert_eq!(hotkey.modifiers(), Modifiers::CTRL | Modifiers::SHIFT);
    }

    #[test]
    fn test_display_orders_modifiers() {
        let hotkey = Hotkey::new(0x58, Modifiers::ALT | Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(hotkey.to_string(), "Shift + Ctrl + Alt + X");
        assert_eq!(Hotkey::new(0x70, Modifiers::empty()).to_string(), "F1");
        assert_eq!(Hotkey::new(0x35, Modifiers::CTRL).to_string(), "Ctrl + 5");
        assert_eq!(Hotkey::NONE.to_string(), "None");
    }

    #[test]
    fn test_parse_any_modifier_order() {
        let parsed: Hotkey = "ctrl + shift + x".parse().unwrap();
        assert_eq!(parsed, Hotkey::new(0x58, Modifiers::CTRL | Modifiers::SHIFT));
        let parsed: Hotkey = "Alt+PageDown".parse().unwrap();
        assert_eq!(parsed, Hotkey::new(0x22, Modifiers::ALT));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Hotkey>(), Err(HotkeyParseError::Empty));
        assert_eq!("Ctrl + Shift".parse::<Hotkey>(), Err(HotkeyParseError::MissingKey));
        assert_eq!("A + B".parse::<Hotkey>(), Err(HotkeyParseError::MultipleKeys));
        assert!(matches!("Ctrl + Banana".parse::<Hotkey>(), Err(HotkeyParseError::UnknownKey(_))));
    }

    #[test]
    fn test_display_parse_inverse() {
        for code in [0x08u8, 0x21, 0x30, 0x5A, 0x64, 0x7B, 0xBA, 0xDE] {
            let hotkey = Hotkey::new(code, Modifiers::SHIFT);
            assert_eq!(hotkey.to_string().parse::<Hotkey>().unwrap(), hotkey);
        }
    }

    #[test]
    fn test_matches_requires_exact_modifiers() {
        let hotkey = Hotkey::new(0x41, Modifiers::CTRL);
        assert!(hotkey.matches(0x41, Modifiers::CTRL));
        assert!(!hotkey.matches(0x41, Modifiers::CTRL | Modifiers::SHIFT));
        assert!(!Hotkey::NONE.matches(0, Modifiers::empty()));
    }
}
