//! Hotkey binding field and the active hotkey overview

use eframe::egui;
use std::hash::Hash;

use crate::gui::constants::*;
use crate::gui::input::{self, Capture};
use crate::hotkey::Hotkey;
use crate::overlay::Overlay;

/// Which hotkey field, if any, is listening for a key or being typed into
#[derive(Default)]
pub struct HotkeyCaptureState {
    listening: Option<egui::Id>,
    typing: Option<(egui::Id, String)>,
    error: Option<(egui::Id, String)>,
}

impl HotkeyCaptureState {
    /// While listening, key presses belong to the field, not the game
    pub fn is_capturing(&self) -> bool {
        self.listening.is_some()
    }

    pub fn cancel(&mut self) {
        self.listening = None;
        self.typing = None;
    }
}

/// Renders a hotkey binding: a button that records the next key press and
/// a text field accepting "Ctrl + Shift + X". Returns true if it changed.
pub fn hotkey_field(ui: &mut egui::Ui, salt: impl Hash, hotkey: &mut Hotkey, state: &mut HotkeyCaptureState) -> bool {
    let id = egui::Id::new(("hotkey_field", salt));
    let mut changed = false;

    ui.horizontal(|ui| {
        if state.listening == Some(id) {
            match input::capture_hotkey(ui.ctx()) {
                Capture::Waiting => {
                    if ui.button("Press a key... (Esc cancels)").clicked() {
                        state.listening = None;
                    }
                }
                Capture::Cancelled => state.listening = None,
                Capture::Cleared => {
                    state.listening = None;
                    changed = !hotkey.is_none();
                    *hotkey = Hotkey::NONE;
                }
                Capture::Bound(bound) => {
                    state.listening = None;
                    changed = bound != *hotkey;
                    *hotkey = bound;
                }
            }
        } else if ui.button("\u{2328} Record").on_hover_text("Backspace clears the binding").clicked() {
            state.listening = Some(id);
            state.typing = None;
        }

        let mut text = match &state.typing {
            Some((typing_id, text)) if *typing_id == id => text.clone(),
            _ => hotkey.to_string(),
        };
        let response = ui.add(
            egui::TextEdit::singleline(&mut text)
                .desired_width(140.0)
                .hint_text("Ctrl + Shift + X"),
        );
        if response.gained_focus() || response.changed() {
            state.typing = Some((id, text));
        }
        if response.lost_focus()
            && let Some((typing_id, typed)) = state.typing.take()
            && typing_id == id
        {
            match typed.parse::<Hotkey>() {
                Ok(parsed) => {
                    state.error = None;
                    changed |= parsed != *hotkey;
                    *hotkey = parsed;
                }
                Err(e) => state.error = Some((id, e.to_string())),
            }
        }
    });

    if let Some((error_id, message)) = &state.error
        && *error_id == id
    {
        ui.colored_label(STATUS_ERROR, message);
    }

    changed
}

/// Lists every binding currently registered with the dispatcher
pub fn active_hotkeys_ui(ui: &mut egui::Ui, overlay: &Overlay) {
    egui::CollapsingHeader::new("Active Hotkeys")
        .id_salt("active_hotkeys")
        .show(ui, |ui| {
            let hotkeys = overlay.active_hotkeys();
            if hotkeys.is_empty() {
                ui.label(egui::RichText::new("No hotkeys are registered right now").weak());
                return;
            }
            egui::Grid::new("active_hotkeys_grid")
                .striped(true)
                .spacing([ITEM_SPACING * 2.0, ITEM_SPACING / 2.0])
                .show(ui, |ui| {
                    for (bar, node, hotkey) in hotkeys {
                        let Some(runtime) = overlay.bar(bar) else {
                            continue;
                        };
                        ui.label(hotkey.to_string());
                        ui.label(&runtime.props.name);
                        let shortcut = runtime.tree.get(node).map_or("", |n| n.props.name.as_str());
                        ui.label(shortcut);
                        ui.end_row();
                    }
                });
        });
}
