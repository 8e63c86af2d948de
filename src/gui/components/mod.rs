//! Settings window components
//!
//! Each component renders one part of the configuration and reports whether
//! it changed anything.

pub mod bar_selector;
pub mod bar_settings;
pub mod condition_editor;
pub mod hotkey_settings;
pub mod settings_editor;
pub mod shortcut_editor;

use eframe::egui;
use std::fmt::Debug;
use std::hash::Hash;

/// Combo box over a fixed list of enum values, labelled by their names
fn enum_combo<T: Copy + PartialEq + Debug>(ui: &mut egui::Ui, salt: impl Hash, value: &mut T, all: &[T]) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt(salt)
        .selected_text(format!("{value:?}"))
        .show_ui(ui, |ui| {
            for &option in all {
                changed |= ui.selectable_value(value, option, format!("{option:?}")).changed();
            }
        });
    changed
}
