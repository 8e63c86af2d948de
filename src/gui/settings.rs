//! The settings window: bars, shortcuts, condition sets and global options

use std::time::Instant;

use eframe::egui;
use tracing::{info, warn};

use super::components::bar_selector::{BarAction, BarSelector};
use super::components::condition_editor::{self, ConditionEditorState};
use super::components::hotkey_settings::{self, HotkeyCaptureState};
use super::components::shortcut_editor::{self, ShortcutAction, ShortcutEditorState};
use super::components::{bar_settings, settings_editor};
use super::constants::*;
use crate::overlay::Overlay;
use crate::shortcut::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Bars,
    Shortcuts,
    Conditions,
    Global,
}

struct StatusMessage {
    text: String,
    color: egui::Color32,
    shown_at: Instant,
}

/// Clipboard access the window needs; `None` when no clipboard is available
pub trait Clipboard {
    fn get_text(&mut self) -> Option<String>;
    fn set_text(&mut self, text: String) -> bool;
}

impl Clipboard for arboard::Clipboard {
    fn get_text(&mut self) -> Option<String> {
        arboard::Clipboard::get_text(self)
            .inspect_err(|e| warn!(error = %e, "Failed to read clipboard"))
            .ok()
    }

    fn set_text(&mut self, text: String) -> bool {
        arboard::Clipboard::set_text(self, text)
            .inspect_err(|e| warn!(error = %e, "Failed to write clipboard"))
            .is_ok()
    }
}

pub struct SettingsWindow {
    pub open: bool,
    tab: Tab,
    selected_bar: usize,
    bar_selector: BarSelector,
    shortcuts: ShortcutEditorState,
    conditions: ConditionEditorState,
    capture: HotkeyCaptureState,
    status: Option<StatusMessage>,
}

impl SettingsWindow {
    pub fn new(open: bool) -> Self {
        Self {
            open,
            tab: Tab::Bars,
            selected_bar: 0,
            bar_selector: BarSelector::new(),
            shortcuts: ShortcutEditorState::default(),
            conditions: ConditionEditorState::default(),
            capture: HotkeyCaptureState::default(),
            status: None,
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
        if !self.open {
            self.capture.cancel();
        }
    }

    /// Whether key presses currently belong to a hotkey field
    pub fn is_capturing(&self) -> bool {
        self.open && self.capture.is_capturing()
    }

    /// Jumps to a shortcut clicked on a bar in editing mode
    pub fn select_shortcut(&mut self, bar: usize, node: NodeId) {
        self.open = true;
        self.tab = Tab::Shortcuts;
        self.selected_bar = bar;
        self.shortcuts.select(bar, node);
    }

    pub fn set_status(&mut self, text: impl Into<String>, color: egui::Color32) {
        self.status = Some(StatusMessage {
            text: text.into(),
            color,
            shown_at: Instant::now(),
        });
    }

    fn copy(&mut self, clipboard: Option<&mut (dyn Clipboard + '_)>, text: String, what: &str) {
        let copied = match clipboard {
            Some(clipboard) => clipboard.set_text(text),
            None => false,
        };
        if copied {
            self.set_status(format!("Copied {what} to the clipboard"), STATUS_OK);
        } else {
            self.set_status("Clipboard unavailable", STATUS_ERROR);
        }
    }

    fn paste(&mut self, clipboard: Option<&mut (dyn Clipboard + '_)>) -> Option<String> {
        let text = clipboard.and_then(|c| c.get_text());
        if text.is_none() {
            self.set_status("Clipboard unavailable", STATUS_ERROR);
        }
        text
    }

    /// Shows the window; returns its rect in egui points while open
    pub fn show(&mut self, ctx: &egui::Context, overlay: &mut Overlay, mut clipboard: Option<&mut (dyn Clipboard + '_)>) -> Option<egui::Rect> {
        if !self.open {
            return None;
        }
        if self
            .status
            .as_ref()
            .is_some_and(|s| s.shown_at.elapsed().as_secs_f32() > STATUS_SECONDS)
        {
            self.status = None;
        }

        let mut open = self.open;
        let shown = egui::Window::new("Overlay Settings")
            .open(&mut open)
            .default_size([SETTINGS_WIDTH, SETTINGS_HEIGHT])
            .show(ctx, |ui| {
                if let Some(status) = &self.status {
                    ui.colored_label(status.color, &status.text);
                }

                ui.horizontal(|ui| {
                    ui.selectable_value(&mut self.tab, Tab::Bars, "Bars");
                    ui.selectable_value(&mut self.tab, Tab::Shortcuts, "Shortcuts");
                    ui.selectable_value(&mut self.tab, Tab::Conditions, "Conditions");
                    ui.selectable_value(&mut self.tab, Tab::Global, "Global");
                });
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    let changed = match self.tab {
                        Tab::Bars => self.bars_tab(ui, overlay, clipboard.as_deref_mut()),
                        Tab::Shortcuts => self.shortcuts_tab(ui, overlay, clipboard.as_deref_mut()),
                        Tab::Conditions => condition_editor::ui(ui, overlay, &mut self.conditions),
                        Tab::Global => {
                            let changed = settings_editor::ui(ui, overlay.global_mut());
                            if changed {
                                overlay.apply_global();
                            }
                            ui.add_space(SECTION_SPACING);
                            hotkey_settings::active_hotkeys_ui(ui, overlay);
                            changed
                        }
                    };
                    if changed {
                        overlay.mark_dirty();
                    }
                });
            });

        if !open {
            info!("Settings window closed");
            self.open = false;
            self.capture.cancel();
        }
        shown.map(|inner| inner.response.rect)
    }

    fn bars_tab(&mut self, ui: &mut egui::Ui, overlay: &mut Overlay, clipboard: Option<&mut (dyn Clipboard + '_)>) -> bool {
        let mut changed = false;
        match self.bar_selector.ui(ui, overlay, &mut self.selected_bar) {
            BarAction::None => {}
            BarAction::Changed => changed = true,
            BarAction::Deleted(export) => {
                changed = true;
                match export {
                    Some(text) => self.copy(clipboard, text, "the deleted bar"),
                    None => self.set_status("Bar deleted", STATUS_OK),
                }
                return changed;
            }
            BarAction::Export(text) => {
                self.copy(clipboard, text, "the bar");
                return changed;
            }
            BarAction::ImportRequested => {
                if let Some(text) = self.paste(clipboard) {
                    match overlay.import_bar(&text) {
                        Ok(index) => {
                            self.selected_bar = index;
                            self.set_status("Imported a new bar", STATUS_OK);
                            changed = true;
                        }
                        Err(e) => self.set_status(format!("Import failed: {e}"), STATUS_ERROR),
                    }
                }
                return changed;
            }
        }

        ui.add_space(SECTION_SPACING);
        if overlay.bars().is_empty() {
            ui.label("No bars. Create one or import one from the clipboard.");
            return changed;
        }
        changed | bar_settings::ui(ui, overlay, self.selected_bar, &mut self.capture)
    }

    fn shortcuts_tab(&mut self, ui: &mut egui::Ui, overlay: &mut Overlay, clipboard: Option<&mut (dyn Clipboard + '_)>) -> bool {
        let Some(bar) = overlay.bar(self.selected_bar) else {
            ui.label("Select or create a bar on the Bars tab first.");
            return false;
        };
        ui.label(egui::RichText::new(format!("Editing: {}", bar.props.name)).strong());
        ui.add_space(ITEM_SPACING);

        match shortcut_editor::ui(ui, overlay, self.selected_bar, &mut self.shortcuts, &mut self.capture) {
            ShortcutAction::None => false,
            ShortcutAction::Changed => true,
            ShortcutAction::Deleted(export) => {
                match export {
                    Some(text) => self.copy(clipboard, text, "the deleted shortcut"),
                    None => self.set_status("Shortcut deleted", STATUS_OK),
                }
                true
            }
            ShortcutAction::Export(text) => {
                self.copy(clipboard, text, "the shortcut");
                false
            }
            ShortcutAction::ImportRequested(parent) => {
                let Some(text) = self.paste(clipboard) else {
                    return false;
                };
                match overlay.import_into(self.selected_bar, parent, &text) {
                    Ok(added) if !added.is_empty() => {
                        self.set_status(format!("Imported {} shortcut(s)", added.len()), STATUS_OK);
                        true
                    }
                    Ok(_) => {
                        self.set_status("Nothing to import there", STATUS_WARN);
                        false
                    }
                    Err(e) => {
                        self.set_status(format!("Import failed: {e}"), STATUS_ERROR);
                        false
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::shortcut::{ShortcutConfig, ShortcutProps};
    use crate::types::Vec2;

    #[derive(Default)]
    struct MemoryClipboard {
        text: Option<String>,
    }

    impl Clipboard for MemoryClipboard {
        fn get_text(&mut self) -> Option<String> {
            self.text.clone()
        }

        fn set_text(&mut self, text: String) -> bool {
            self.text = Some(text);
            true
        }
    }

    #[test]
    fn test_copy_then_paste_round_trips_exports() {
        let mut config = Configuration::first_start();
        config.bars[0].shortcuts.push(ShortcutConfig::leaf(ShortcutProps::command("a", "/a")));
        let mut overlay = Overlay::new(config, Vec2::new(1000.0, 800.0));
        let mut window = SettingsWindow::new(true);
        let mut clipboard = MemoryClipboard::default();

        let export = overlay.export_bar(0, false).unwrap();
        window.copy(Some(&mut clipboard as &mut dyn Clipboard), export, "the bar");
        assert!(window.status.as_ref().is_some_and(|s| s.color == STATUS_OK));

        let text = window.paste(Some(&mut clipboard as &mut dyn Clipboard)).unwrap();
        let index = overlay.import_bar(&text).unwrap();
        assert_eq!(index, 1);
        assert_eq!(overlay.bar(1).unwrap().tree.len(), 1);
    }

    #[test]
    fn test_missing_clipboard_reports_error() {
        let mut window = SettingsWindow::new(true);
        assert!(window.paste(None).is_none());
        assert!(window.status.as_ref().is_some_and(|s| s.color == STATUS_ERROR));
    }

    #[test]
    fn test_selecting_a_shortcut_opens_its_tab() {
        let config = Configuration::first_start();
        let mut overlay = Overlay::new(config, Vec2::new(1000.0, 800.0));
        let node = overlay
            .add_shortcut(0, None, 0, &ShortcutConfig::leaf(ShortcutProps::command("a", "/a")))
            .unwrap();
        let mut window = SettingsWindow::new(false);
        window.select_shortcut(0, node);
        assert!(window.open);
        assert_eq!(window.tab, Tab::Shortcuts);
        assert!(!window.is_capturing());
    }
}
