//! Condition set editor

use eframe::egui;

use super::enum_combo;
use crate::condition::{ConditionEntry, ConditionKind, ConditionSet, flags, misc};
use crate::gui::constants::*;
use crate::overlay::Overlay;

const LOGIC_OPS: [(i32, &str); 4] = [(0, "OR"), (1, "XOR"), (2, "NOT"), (3, "EQUALS")];
const FLAGS: [(i32, &str); 3] = [
    (flags::GAME_FOCUSED, "Game focused"),
    (flags::POINTER_IN_GAME, "Pointer over game"),
    (flags::SETTINGS_OPEN, "Settings open"),
];
const MISC: [(i32, &str); 3] = [
    (misc::LOGGED_IN, "Logged in"),
    (misc::CHARACTER_ID, "Character id"),
    (misc::CHARACTER_NAME, "Character name"),
];

/// State for the condition set editor
#[derive(Default)]
pub struct ConditionEditorState {
    selected: usize,
}

fn choice_combo(ui: &mut egui::Ui, salt: impl std::hash::Hash, value: &mut i32, choices: &[(i32, &str)]) -> bool {
    let mut changed = false;
    let current = choices
        .iter()
        .find(|(v, _)| v == value)
        .map_or_else(|| value.to_string(), |(_, label)| (*label).to_string());
    egui::ComboBox::from_id_salt(salt)
        .selected_text(current)
        .show_ui(ui, |ui| {
            for &(v, label) in choices {
                changed |= ui.selectable_value(value, v, label).changed();
            }
        });
    changed
}

/// Parameters for one entry, depending on its kind
fn entry_ui(ui: &mut egui::Ui, row: usize, entry: &mut ConditionEntry) -> bool {
    let mut changed = false;
    match entry.kind {
        ConditionKind::Logic => changed |= choice_combo(ui, ("condition_logic", row), &mut entry.condition, &LOGIC_OPS),
        ConditionKind::ConditionFlag => changed |= choice_combo(ui, ("condition_flag", row), &mut entry.condition, &FLAGS),
        ConditionKind::Job | ConditionKind::Role => {
            changed |= ui
                .add(egui::DragValue::new(&mut entry.condition).range(0..=i32::MAX))
                .on_hover_text("Not reported by the Linux client; never matches")
                .changed();
        }
        ConditionKind::Misc => {
            changed |= choice_combo(ui, ("condition_misc", row), &mut entry.condition, &MISC);
            match entry.condition {
                misc::CHARACTER_ID => changed |= ui.add(egui::DragValue::new(&mut entry.arg)).changed(),
                misc::CHARACTER_NAME => {
                    changed |= ui
                        .add(egui::TextEdit::singleline(&mut entry.text).desired_width(140.0))
                        .changed();
                }
                _ => {}
            }
        }
    }
    changed
}

fn set_ui(ui: &mut egui::Ui, set: &mut ConditionSet) -> bool {
    let mut changed = false;
    let mut remove = None;

    ui.horizontal(|ui| {
        ui.label("Name:");
        changed |= ui.text_edit_singleline(&mut set.name).changed();
    });
    ui.add_space(ITEM_SPACING);

    egui::Grid::new("condition_entries")
        .striped(true)
        .spacing([ITEM_SPACING, ITEM_SPACING / 2.0])
        .show(ui, |ui| {
            for (row, entry) in set.conditions.iter_mut().enumerate() {
                let before = entry.kind;
                changed |= enum_combo(ui, ("condition_kind", row), &mut entry.kind, &ConditionKind::ALL);
                if entry.kind != before {
                    entry.condition = 0;
                    entry.arg = 0;
                    entry.text.clear();
                }
                ui.horizontal(|ui| {
                    changed |= entry_ui(ui, row, entry);
                });
                if ui.small_button("🗑").clicked() {
                    remove = Some(row);
                }
                ui.end_row();
            }
        });

    if let Some(row) = remove {
        set.conditions.remove(row);
        changed = true;
    }
    if ui.button("➕ Condition").clicked() {
        set.conditions.push(ConditionEntry::default());
        changed = true;
    }
    changed
}

/// Renders the condition sets and returns true if any changed
pub fn ui(ui: &mut egui::Ui, overlay: &mut Overlay, state: &mut ConditionEditorState) -> bool {
    let mut changed = false;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Condition Sets").strong());
        ui.label(
            egui::RichText::new("Bars gated by a set only show while it holds. Adjacent conditions combine with AND.")
                .weak(),
        );
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            let sets = overlay.condition_sets();
            let label = |i: usize, set: &ConditionSet| {
                if set.name.is_empty() { format!("Set {}", i + 1) } else { set.name.clone() }
            };
            let selected_text = sets.get(state.selected).map_or_else(|| "(none)".to_string(), |s| label(state.selected, s));
            egui::ComboBox::from_id_salt("condition_set_selector")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for (i, set) in sets.iter().enumerate() {
                        ui.selectable_value(&mut state.selected, i, label(i, set));
                    }
                });

            if ui.button("➕ New").clicked() {
                let sets = overlay.condition_sets_mut();
                sets.push(ConditionSet {
                    name: format!("Set {}", sets.len() + 1),
                    conditions: Vec::new(),
                });
                state.selected = sets.len() - 1;
                changed = true;
            }
            if ui.button("🗑 Delete").clicked() && overlay.remove_condition_set(state.selected).is_some() {
                state.selected = state.selected.saturating_sub(1);
                changed = true;
            }
        });

        ui.add_space(ITEM_SPACING);

        if let Some(set) = overlay.condition_sets_mut().get_mut(state.selected) {
            changed |= set_ui(ui, set);
        }
    });

    changed
}
