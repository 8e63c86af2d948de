use eframe::egui;

use crate::config::{BarConfig, BarProps};
use crate::gui::constants::*;
use crate::overlay::Overlay;

pub struct BarSelector {
    show_delete_confirm: bool,
}

impl BarSelector {
    pub fn new() -> Self {
        Self {
            show_delete_confirm: false,
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, overlay: &mut Overlay, selected_idx: &mut usize) -> BarAction {
        let mut action = BarAction::None;
        let count = overlay.bars().len();
        if count > 0 && *selected_idx >= count {
            *selected_idx = count - 1;
        }

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Bar:").strong());

                let selected_text = overlay
                    .bar(*selected_idx)
                    .map_or_else(|| "(no bars)".to_string(), |b| bar_label(&b.props, *selected_idx));
                egui::ComboBox::from_id_salt("bar_selector")
                    .selected_text(selected_text)
                    .show_ui(ui, |ui| {
                        for (idx, bar) in overlay.bars().iter().enumerate() {
                            ui.selectable_value(selected_idx, idx, bar_label(&bar.props, idx));
                        }
                    });
            });

            ui.add_space(ITEM_SPACING);

            ui.horizontal(|ui| {
                if ui.button("➕ New").clicked() {
                    let config = BarConfig {
                        props: BarProps {
                            editing: true,
                            ..BarProps::named(format!("Bar {}", count + 1))
                        },
                        shortcuts: Vec::new(),
                    };
                    *selected_idx = overlay.add_bar(config);
                    action = BarAction::Changed;
                }

                if ui.button("📥 Import").on_hover_text("Import a bar from the clipboard").clicked() {
                    action = BarAction::ImportRequested;
                }

                if count == 0 {
                    return;
                }

                if ui.add_enabled(*selected_idx > 0, egui::Button::new("⬆")).clicked()
                    && overlay.move_bar(*selected_idx, *selected_idx - 1)
                {
                    *selected_idx -= 1;
                    action = BarAction::Changed;
                }
                if ui.add_enabled(*selected_idx + 1 < count, egui::Button::new("⬇")).clicked()
                    && overlay.move_bar(*selected_idx, *selected_idx + 1)
                {
                    *selected_idx += 1;
                    action = BarAction::Changed;
                }

                if ui.button("📋 Export").clicked()
                    && let Some(text) = overlay.export_bar(*selected_idx, false)
                {
                    action = BarAction::Export(text);
                }
                if ui
                    .button("📋 Export (full)")
                    .on_hover_text("Include settings left at their defaults")
                    .clicked()
                    && let Some(text) = overlay.export_bar(*selected_idx, true)
                {
                    action = BarAction::Export(text);
                }

                if ui.button("🗑 Delete").clicked() {
                    self.show_delete_confirm = true;
                }
            });
        });

        if self.show_delete_confirm {
            let confirmed = self.delete_confirm_dialog(ui.ctx(), overlay, selected_idx);
            if confirmed != BarAction::None {
                action = confirmed;
            }
        }

        action
    }

    fn delete_confirm_dialog(&mut self, ctx: &egui::Context, overlay: &mut Overlay, selected_idx: &mut usize) -> BarAction {
        let mut action = BarAction::None;
        let Some(name) = overlay.bar(*selected_idx).map(|b| bar_label(&b.props, *selected_idx)) else {
            self.show_delete_confirm = false;
            return action;
        };

        egui::Window::new("Confirm Delete")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Delete bar '{name}'?"));
                if overlay.global().export_on_delete {
                    ui.label("It will be copied to the clipboard first.");
                } else {
                    ui.colored_label(STATUS_ERROR, "This cannot be undone!");
                }

                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        let export = overlay.remove_bar(*selected_idx);
                        *selected_idx = selected_idx.saturating_sub(1);
                        action = BarAction::Deleted(export);
                        self.show_delete_confirm = false;
                    }

                    if ui.button("Cancel").clicked() {
                        self.show_delete_confirm = false;
                    }
                });
            });

        action
    }
}

impl Default for BarSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn bar_label(props: &BarProps, idx: usize) -> String {
    let name = if props.name.is_empty() {
        format!("Bar {}", idx + 1)
    } else {
        props.name.clone()
    };
    if props.hidden { format!("{name} (hidden)") } else { name }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BarAction {
    None,
    Changed,
    /// Carries the export made before deleting, if any
    Deleted(Option<String>),
    Export(String),
    ImportRequested,
}
