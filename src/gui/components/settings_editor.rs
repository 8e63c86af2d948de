//! Global settings editor

use eframe::egui;

use crate::config::{GlobalSettings, HotkeyEdge};
use crate::gui::constants::{ITEM_SPACING, SECTION_SPACING};

/// Renders the global settings and returns true if any changes were made
pub fn ui(ui: &mut egui::Ui, settings: &mut GlobalSettings) -> bool {
    let mut changed = false;

    ui.group(|ui| {
        ui.label(egui::RichText::new("General").strong());
        ui.add_space(ITEM_SPACING);

        changed |= ui
            .checkbox(&mut settings.export_on_delete, "Export to clipboard before deleting")
            .changed();
        changed |= ui
            .checkbox(&mut settings.always_display_bars, "Display bars while logged out")
            .changed();
        changed |= ui
            .checkbox(&mut settings.resize_repositions_bars, "Move undocked bars with the game window")
            .on_hover_text("Undocked bars keep their relative position when the game window resizes")
            .changed();
        changed |= ui
            .checkbox(&mut settings.use_icon_frame, "Draw a frame around every icon")
            .changed();
        changed |= ui
            .checkbox(&mut settings.no_condition_cache, "Disable condition caching")
            .on_hover_text("Re-evaluate condition sets for every bar instead of once per frame")
            .changed();

        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Snap Threshold:");
            changed |= ui
                .add(egui::Slider::new(&mut settings.snap_threshold, 0..=50).suffix(" px"))
                .changed();
        });

        ui.horizontal(|ui| {
            ui.label("Icon Directory:");
            let mut dir = settings.icon_dir.clone().unwrap_or_default();
            let response = ui.add(
                egui::TextEdit::singleline(&mut dir)
                    .desired_width(260.0)
                    .hint_text("icons/ next to the config file"),
            );
            if response.changed() {
                settings.icon_dir = Some(dir.trim().to_string()).filter(|d| !d.is_empty());
                changed = true;
            }
        });
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Hotkeys").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Trigger On:");
            changed |= ui
                .radio_value(&mut settings.hotkey_edge, HotkeyEdge::Down, "Key down")
                .changed();
            changed |= ui
                .radio_value(&mut settings.hotkey_edge, HotkeyEdge::Up, "Key up")
                .changed();
        });

        ui.horizontal(|ui| {
            ui.label("Short Hold:");
            changed |= ui
                .add(egui::Slider::new(&mut settings.short_hold_seconds, 0.05..=2.0).suffix(" s"))
                .on_hover_text("A pie sharing its key with a shortcut opens after this hold; shorter taps fire the shortcut")
                .changed();
        });
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Pie Menus").strong());
        ui.add_space(ITEM_SPACING);

        changed |= ui
            .checkbox(&mut settings.pies_always_center, "Open at the screen centre")
            .changed();
        ui.add_enabled_ui(settings.pies_always_center, |ui| {
            changed |= ui
                .checkbox(&mut settings.pies_move_mouse, "Move the pointer to the centre")
                .changed();
        });
        changed |= ui
            .checkbox(&mut settings.pies_return_mouse, "Return the pointer on close")
            .changed();
    });

    changed
}
