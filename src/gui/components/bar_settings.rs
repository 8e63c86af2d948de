use eframe::egui;

use super::enum_combo;
use super::hotkey_settings::{HotkeyCaptureState, hotkey_field};
use crate::bar::{BarAlign, DockSide, Visibility};
use crate::constants::validation;
use crate::gui::constants::*;
use crate::overlay::Overlay;

/// Renders the settings of bar `index` and returns true if changes were made
pub fn ui(ui: &mut egui::Ui, overlay: &mut Overlay, index: usize, capture: &mut HotkeyCaptureState) -> bool {
    let mut changed = false;
    let set_names: Vec<String> = overlay
        .condition_sets()
        .iter()
        .enumerate()
        .map(|(i, set)| if set.name.is_empty() { format!("Set {}", i + 1) } else { set.name.clone() })
        .collect();
    let Some(bar) = overlay.bar_mut(index) else {
        return false;
    };
    let props = &mut bar.props;
    let mut position = props.position;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Bar").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Name:");
            changed |= ui.text_edit_singleline(&mut props.name).changed();
        });

        ui.horizontal(|ui| {
            changed |= ui.checkbox(&mut props.editing, "Editing").changed();
            changed |= ui.checkbox(&mut props.locked, "Locked").changed();
            changed |= ui.checkbox(&mut props.hidden, "Hidden").changed();
        });

        ui.horizontal(|ui| {
            ui.label("Condition Set:");
            let selected = usize::try_from(props.condition_set)
                .ok()
                .and_then(|i| set_names.get(i))
                .map_or("None", String::as_str);
            egui::ComboBox::from_id_salt("bar_condition_set")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    changed |= ui.selectable_value(&mut props.condition_set, -1, "None").changed();
                    for (i, name) in set_names.iter().enumerate() {
                        changed |= ui.selectable_value(&mut props.condition_set, i as i32, name).changed();
                    }
                });
        });

        ui.horizontal(|ui| {
            ui.label("Pie Hotkey:");
            changed |= hotkey_field(ui, ("bar_pie", index), &mut props.hotkey, capture);
        });
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Placement").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Dock:");
            changed |= enum_combo(ui, "bar_dock", &mut props.dock, &DockSide::ALL);
            ui.label("Align:");
            changed |= enum_combo(ui, "bar_align", &mut props.align, &BarAlign::ALL);
        });

        ui.horizontal(|ui| {
            ui.label("Visibility:");
            changed |= enum_combo(ui, "bar_visibility", &mut props.visibility, &Visibility::ALL);
            changed |= ui
                .checkbox(&mut props.hint, "Hint")
                .on_hover_text("Keep a sliver of a hidden bar on screen")
                .changed();
        });

        if props.visibility != Visibility::Always {
            ui.horizontal(|ui| {
                ui.label("Reveal Area:");
                changed |= ui
                    .add(egui::Slider::new(&mut props.reveal_area_scale, 0.0..=1.0))
                    .changed();
            });
        }

        ui.horizontal(|ui| {
            ui.label("Position:");
            ui.label("X:");
            ui.add(egui::DragValue::new(&mut position.x).range(-1.0..=1.0).speed(0.001));
            ui.label("Y:");
            ui.add(egui::DragValue::new(&mut position.y).range(-1.0..=1.0).speed(0.001));
        });
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Appearance").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Scale:");
            changed |= ui
                .add(egui::Slider::new(&mut props.scale, validation::MIN_SCALE..=validation::MAX_SCALE))
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label("Font Scale:");
            changed |= ui
                .add(egui::Slider::new(&mut props.font_scale, validation::MIN_SCALE..=validation::MAX_SCALE))
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label("Button Width:");
            changed |= ui
                .add(egui::DragValue::new(&mut props.button_width).range(0..=validation::MAX_WIDTH))
                .changed();
            ui.label("Columns:");
            changed |= ui
                .add(egui::DragValue::new(&mut props.columns).range(0..=validation::MAX_COLUMNS))
                .on_hover_text("0 lays buttons out along the dock side")
                .changed();
        });
        ui.horizontal(|ui| {
            ui.label("Spacing:");
            changed |= ui
                .add(egui::DragValue::new(&mut props.spacing.x).range(0.0..=validation::MAX_SPACING))
                .changed();
            changed |= ui
                .add(egui::DragValue::new(&mut props.spacing.y).range(0.0..=validation::MAX_SPACING))
                .changed();
        });
        changed |= ui.checkbox(&mut props.no_background, "No Background").changed();
    });

    if position != bar.props.position {
        overlay.set_bar_position(index, position);
        changed = true;
    }

    changed
}
