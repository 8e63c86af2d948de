//! evdev key source feeding the key tracker
//!
//! One listener thread per keyboard device writes key levels, translated to
//! virtual-key codes, into a shared table. The frame loop only copies it.

use anyhow::{Context, Result};
use evdev::{Device, EventSummary, KeyCode};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, error, info, warn};

use crate::constants::input::{KEY_COUNT, KEY_PRESS, KEY_RELEASE, KEY_REPEAT};
use crate::constants::{paths, permissions};
use crate::hotkey::vk;
use crate::keystate::KeySnapshot;

type KeyTable = [bool; KEY_COUNT];

/// Linux key code to virtual-key code
const KEY_MAP: &[(KeyCode, u8)] = &[
    (KeyCode::KEY_ESC, vk::ESCAPE),
    (KeyCode::KEY_1, 0x31),
    (KeyCode::KEY_2, 0x32),
    (KeyCode::KEY_3, 0x33),
    (KeyCode::KEY_4, 0x34),
    (KeyCode::KEY_5, 0x35),
    (KeyCode::KEY_6, 0x36),
    (KeyCode::KEY_7, 0x37),
    (KeyCode::KEY_8, 0x38),
    (KeyCode::KEY_9, 0x39),
    (KeyCode::KEY_0, 0x30),
    (KeyCode::KEY_MINUS, 0xBD),
    (KeyCode::KEY_EQUAL, 0xBB),
    (KeyCode::KEY_BACKSPACE, vk::BACK),
    (KeyCode::KEY_TAB, vk::TAB),
    (KeyCode::KEY_Q, 0x51),
    (KeyCode::KEY_W, 0x57),
    (KeyCode::KEY_E, 0x45),
    (KeyCode::KEY_R, 0x52),
    (KeyCode::KEY_T, 0x54),
    (KeyCode::KEY_Y, 0x59),
    (KeyCode::KEY_U, 0x55),
    (KeyCode::KEY_I, 0x49),
    (KeyCode::KEY_O, 0x4F),
    (KeyCode::KEY_P, 0x50),
    (KeyCode::KEY_LEFTBRACE, 0xDB),
    (KeyCode::KEY_RIGHTBRACE, 0xDD),
    (KeyCode::KEY_ENTER, vk::RETURN),
    (KeyCode::KEY_LEFTCTRL, vk::LCONTROL),
    (KeyCode::KEY_A, 0x41),
    (KeyCode::KEY_S, 0x53),
    (KeyCode::KEY_D, 0x44),
    (KeyCode::KEY_F, 0x46),
    (KeyCode::KEY_G, 0x47),
    (KeyCode::KEY_H, 0x48),
    (KeyCode::KEY_J, 0x4A),
    (KeyCode::KEY_K, 0x4B),
    (KeyCode::KEY_L, 0x4C),
    (KeyCode::KEY_SEMICOLON, 0xBA),
    (KeyCode::KEY_APOSTROPHE, 0xDE),
    (KeyCode::KEY_GRAVE, 0xC0),
    (KeyCode::KEY_LEFTSHIFT, vk::LSHIFT),
    (KeyCode::KEY_BACKSLASH, 0xDC),
    (KeyCode::KEY_Z, 0x5A),
    (KeyCode::KEY_X, 0x58),
    (KeyCode::KEY_C, 0x43),
    (KeyCode::KEY_V, 0x56),
    (KeyCode::KEY_B, 0x42),
    (KeyCode::KEY_N, 0x4E),
    (KeyCode::KEY_M, 0x4D),
    (KeyCode::KEY_COMMA, 0xBC),
    (KeyCode::KEY_DOT, 0xBE),
    (KeyCode::KEY_SLASH, 0xBF),
    (KeyCode::KEY_RIGHTSHIFT, vk::RSHIFT),
    (KeyCode::KEY_KPASTERISK, 0x6A),
    (KeyCode::KEY_LEFTALT, vk::LMENU),
    (KeyCode::KEY_SPACE, vk::SPACE),
    (KeyCode::KEY_CAPSLOCK, 0x14),
    (KeyCode::KEY_F1, 0x70),
    (KeyCode::KEY_F2, 0x71),
    (KeyCode::KEY_F3, 0x72),
    (KeyCode::KEY_F4, 0x73),
    (KeyCode::KEY_F5, 0x74),
    (KeyCode::KEY_F6, 0x75),
    (KeyCode::KEY_F7, 0x76),
    (KeyCode::KEY_F8, 0x77),
    (KeyCode::KEY_F9, 0x78),
    (KeyCode::KEY_F10, 0x79),
    (KeyCode::KEY_F11, 0x7A),
    (KeyCode::KEY_F12, 0x7B),
    (KeyCode::KEY_NUMLOCK, 0x90),
    (KeyCode::KEY_SCROLLLOCK, 0x91),
    (KeyCode::KEY_KP7, 0x67),
    (KeyCode::KEY_KP8, 0x68),
    (KeyCode::KEY_KP9, 0x69),
    (KeyCode::KEY_KPMINUS, 0x6D),
    (KeyCode::KEY_KP4, 0x64),
    (KeyCode::KEY_KP5, 0x65),
    (KeyCode::KEY_KP6, 0x66),
    (KeyCode::KEY_KPPLUS, 0x6B),
    (KeyCode::KEY_KP1, 0x61),
    (KeyCode::KEY_KP2, 0x62),
    (KeyCode::KEY_KP3, 0x63),
    (KeyCode::KEY_KP0, 0x60),
    (KeyCode::KEY_KPDOT, 0x6E),
    (KeyCode::KEY_KPENTER, vk::RETURN),
    (KeyCode::KEY_RIGHTCTRL, vk::RCONTROL),
    (KeyCode::KEY_KPSLASH, 0x6F),
    (KeyCode::KEY_SYSRQ, 0x2C),
    (KeyCode::KEY_RIGHTALT, vk::RMENU),
    (KeyCode::KEY_HOME, 0x24),
    (KeyCode::KEY_UP, 0x26),
    (KeyCode::KEY_PAGEUP, 0x21),
    (KeyCode::KEY_LEFT, 0x25),
    (KeyCode::KEY_RIGHT, 0x27),
    (KeyCode::KEY_END, 0x23),
    (KeyCode::KEY_DOWN, 0x28),
    (KeyCode::KEY_PAGEDOWN, 0x22),
    (KeyCode::KEY_INSERT, 0x2D),
    (KeyCode::KEY_DELETE, 0x2E),
    (KeyCode::KEY_PAUSE, 0x13),
    (KeyCode::KEY_LEFTMETA, 0x5B),
    (KeyCode::KEY_RIGHTMETA, 0x5C),
    (KeyCode::KEY_COMPOSE, 0x5D),
];

pub fn linux_to_vk(key: KeyCode) -> Option<u8> {
    KEY_MAP.iter().find(|(code, _)| *code == key).map(|&(_, vk)| vk)
}

/// Applies one key event; returns whether the table changed
fn apply_event(table: &mut KeyTable, key: KeyCode, value: i32) -> bool {
    let Some(code) = linux_to_vk(key) else {
        return false;
    };
    let down = match value {
        KEY_PRESS | KEY_REPEAT => true,
        KEY_RELEASE => false,
        _ => return false,
    };
    let slot = &mut table[code as usize];
    let changed = *slot != down;
    *slot = down;
    changed
}

/// Find all keyboard devices (anything exposing letter keys)
fn find_all_keyboard_devices() -> Result<Vec<Device>> {
    info!(path = %paths::DEV_INPUT, "Scanning for keyboard devices...");

    let mut devices = Vec::new();
    for entry in std::fs::read_dir(paths::DEV_INPUT)
        .context(format!("Failed to read {} - are you in the '{}' group?", paths::DEV_INPUT, permissions::INPUT_GROUP))?
    {
        let path = entry?.path();
        let Ok(device) = Device::open(&path) else {
            continue;
        };
        if device.supported_keys().is_some_and(|keys| keys.contains(KeyCode::KEY_A)) {
            info!(device_path = %path.display(), name = ?device.name(), "Found keyboard device");
            devices.push(device);
        }
    }

    if devices.is_empty() {
        anyhow::bail!(
            "No keyboard device found. Ensure you're in '{}' group:\n\
             {}\n\
             Then log out and back in.",
            permissions::INPUT_GROUP,
            permissions::ADD_TO_INPUT_GROUP
        )
    }

    info!(count = devices.len(), "Listening on keyboard device(s)");
    Ok(devices)
}

/// Live key levels shared with the listener threads
#[derive(Clone)]
pub struct KeyboardSource {
    table: Arc<Mutex<KeyTable>>,
}

impl KeyboardSource {
    /// Spawns a listener per keyboard device
    pub fn spawn() -> Result<Self> {
        let devices = find_all_keyboard_devices()?;
        let table = Arc::new(Mutex::new([false; KEY_COUNT]));

        for device in devices {
            let table = Arc::clone(&table);
            thread::Builder::new()
                .name("evdev-listener".to_string())
                .spawn(move || {
                    info!(device = ?device.name(), "Key listener started");
                    if let Err(e) = listen(device, &table) {
                        error!(error = %e, "Key listener error");
                    }
                })
                .context("Failed to spawn key listener thread")?;
        }

        Ok(Self { table })
    }

    pub fn snapshot(&self) -> KeySnapshot {
        let table = match self.table.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        };
        KeySnapshot::from_array(table)
    }
}

fn listen(mut device: Device, table: &Mutex<KeyTable>) -> Result<()> {
    loop {
        // Blocks until events are available
        let events = device.fetch_events().context("Failed to fetch events")?;

        for event in events {
            let EventSummary::Key(_, key, value) = event.destructure() else {
                continue;
            };
            let mut guard = match table.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if apply_event(&mut guard, key, value) {
                debug!(?key, value, "Key event");
            }
        }
    }
}

/// Check if evdev input is available (user has input group permissions)
pub fn check_permissions() -> bool {
    std::fs::read_dir(paths::DEV_INPUT).is_ok()
}

/// Print helpful error message if permissions missing
pub fn print_permission_error() {
    error!(path = %paths::DEV_INPUT, "Cannot access input devices");
    error!(group = %permissions::INPUT_GROUP, "Global hotkeys require group membership");
    error!(command = %permissions::ADD_TO_INPUT_GROUP, "Add user to input group");
    error!("  Then log out and back in");
    warn!(continuing = true, "Falling back to overlay-window key events...");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_keys_translate() {
        assert_eq!(linux_to_vk(KeyCode::KEY_A), Some(0x41));
        assert_eq!(linux_to_vk(KeyCode::KEY_0), Some(0x30));
        assert_eq!(linux_to_vk(KeyCode::KEY_F12), Some(0x7B));
        assert_eq!(linux_to_vk(KeyCode::KEY_RIGHTALT), Some(vk::RMENU));
        assert_eq!(linux_to_vk(KeyCode::KEY_KPENTER), Some(vk::RETURN));
        assert_eq!(linux_to_vk(KeyCode::KEY_MUTE), None);
    }

    #[test]
    fn test_events_drive_levels() {
        let mut table = [false; KEY_COUNT];
        assert!(apply_event(&mut table, KeyCode::KEY_LEFTSHIFT, KEY_PRESS));
        assert!(!apply_event(&mut table, KeyCode::KEY_LEFTSHIFT, KEY_REPEAT));
        assert!(table[vk::LSHIFT as usize]);

        let snapshot = KeySnapshot::from_array(table);
        assert!(snapshot.is_down(vk::SHIFT));

        assert!(apply_event(&mut table, KeyCode::KEY_LEFTSHIFT, KEY_RELEASE));
        assert!(!table[vk::LSHIFT as usize]);
        assert!(!apply_event(&mut table, KeyCode::KEY_VOLUMEUP, KEY_PRESS));
    }
}
