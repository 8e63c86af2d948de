//! Shortcut tree editor for the selected bar

use eframe::egui::{self, collapsing_header::CollapsingState};

use super::enum_combo;
use super::hotkey_settings::{HotkeyCaptureState, hotkey_field};
use crate::color::{self, ColorAnimation};
use crate::constants::validation;
use crate::gui::bar_view::color32;
use crate::gui::constants::*;
use crate::overlay::{BarRuntime, Overlay};
use crate::shortcut::name::{self, IconArgs, IconRef};
use crate::shortcut::{NodeId, ShortcutConfig, ShortcutKind, ShortcutMode, ShortcutProps, ShortcutTree};

/// State for the shortcut editor
#[derive(Default)]
pub struct ShortcutEditorState {
    bar: usize,
    selected: Option<NodeId>,
}

impl ShortcutEditorState {
    pub fn select(&mut self, bar: usize, node: NodeId) {
        self.bar = bar;
        self.selected = Some(node);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShortcutAction {
    None,
    Changed,
    /// Carries the export made before deleting, if any
    Deleted(Option<String>),
    Export(String),
    /// Import clipboard contents under this parent
    ImportRequested(Option<NodeId>),
}

fn node_label(props: &ShortcutProps) -> String {
    let parsed = name::parse(&props.name);
    let mut text = match (&parsed.icon, parsed.label.is_empty()) {
        (Some(icon), true) => format!("icon {}", icon.id),
        (_, true) => "(unnamed)".to_string(),
        (_, false) => parsed.label,
    };
    if !props.hotkey.is_none() {
        text = format!("{text}  [{}]", props.hotkey);
    }
    match props.kind {
        ShortcutKind::Command => format!("▶ {text}"),
        ShortcutKind::Category => format!("📁 {text}"),
        ShortcutKind::Spacer => format!("― {text}"),
    }
}

/// Where a new shortcut goes: inside a selected category, after any other
/// selected shortcut, or at the end of the bar
fn insert_target(tree: &ShortcutTree, selected: Option<NodeId>) -> (Option<NodeId>, usize) {
    let Some(node) = selected.and_then(|id| tree.get(id).map(|n| (id, n))) else {
        return (None, tree.roots().len());
    };
    let (id, node) = node;
    if node.props.is_category() {
        return (Some(id), node.children().len());
    }
    let parent = node.parent();
    let index = tree
        .child_list(parent)
        .iter()
        .position(|&c| c == id)
        .map_or(usize::MAX, |i| i + 1);
    (parent, index)
}

/// Position of `id` among its siblings
fn sibling_index(tree: &ShortcutTree, id: NodeId) -> Option<(Option<NodeId>, usize, usize)> {
    let parent = tree.get(id)?.parent();
    let siblings = tree.child_list(parent);
    let index = siblings.iter().position(|&c| c == id)?;
    Some((parent, index, siblings.len()))
}

fn tree_ui(ui: &mut egui::Ui, tree: &ShortcutTree, ids: &[NodeId], selected: &mut Option<NodeId>) {
    for &id in ids {
        let Some(node) = tree.get(id) else {
            continue;
        };
        let label = node_label(&node.props);
        let is_selected = *selected == Some(id);
        if node.props.is_category() {
            CollapsingState::load_with_default_open(ui.ctx(), egui::Id::new(("shortcut_tree", id)), true)
                .show_header(ui, |ui| {
                    if ui.selectable_label(is_selected, label).clicked() {
                        *selected = Some(id);
                    }
                })
                .body(|ui| tree_ui(ui, tree, node.children(), selected));
        } else if ui.selectable_label(is_selected, label).clicked() {
            *selected = Some(id);
        }
    }
}

/// Renders the shortcut tree of bar `bar` with an editor for the selection
pub fn ui(
    ui: &mut egui::Ui,
    overlay: &mut Overlay,
    bar: usize,
    state: &mut ShortcutEditorState,
    capture: &mut HotkeyCaptureState,
) -> ShortcutAction {
    let mut action = ShortcutAction::None;
    if state.bar != bar {
        state.bar = bar;
        state.selected = None;
    }
    let Some(runtime) = overlay.bar(bar) else {
        return action;
    };
    let tree = &runtime.tree;
    if state.selected.is_some_and(|id| !tree.contains(id)) {
        state.selected = None;
    }
    let (insert_parent, insert_index) = insert_target(tree, state.selected);
    let import_parent = state
        .selected
        .and_then(|id| tree.get(id).map(|n| (id, n)))
        .and_then(|(id, n)| if n.props.is_category() { Some(id) } else { n.parent() });
    let position = state.selected.and_then(|id| sibling_index(tree, id));
    let out_target = position
        .and_then(|(parent, _, _)| parent)
        .and_then(|parent| sibling_index(tree, parent))
        .map(|(grandparent, parent_index, _)| (grandparent, parent_index + 1));

    ui.group(|ui| {
        ui.label(egui::RichText::new("Shortcuts").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal_wrapped(|ui| {
            let added = if ui.button("➕ Shortcut").clicked() {
                Some(ShortcutConfig::leaf(ShortcutProps::command("New Shortcut", "")))
            } else if ui.button("➕ Category").clicked() {
                Some(ShortcutConfig::category("New Category", ShortcutMode::Default, Vec::new()))
            } else if ui.button("➕ Spacer").clicked() {
                Some(ShortcutConfig::leaf(ShortcutProps::named("", ShortcutKind::Spacer)))
            } else {
                None
            };
            if let Some(config) = added {
                action = ShortcutAction::Changed;
                state.selected = overlay.add_shortcut(bar, insert_parent, insert_index, &config);
                return;
            }

            if ui.button("📥 Import").on_hover_text("Import from the clipboard").clicked() {
                action = ShortcutAction::ImportRequested(import_parent);
            }

            let (Some(selected), Some((parent, index, count))) = (state.selected, position) else {
                return;
            };

            if ui.add_enabled(index > 0, egui::Button::new("⬆")).clicked() {
                overlay.move_shortcut(bar, selected, parent, index - 1);
                action = ShortcutAction::Changed;
            }
            if ui.add_enabled(index + 1 < count, egui::Button::new("⬇")).clicked() {
                overlay.move_shortcut(bar, selected, parent, index + 1);
                action = ShortcutAction::Changed;
            }
            if ui
                .add_enabled(out_target.is_some(), egui::Button::new("⬅ Out"))
                .on_hover_text("Move out of its category")
                .clicked()
                && let Some((grandparent, at)) = out_target
            {
                overlay.move_shortcut(bar, selected, grandparent, at);
                action = ShortcutAction::Changed;
            }
            if ui.button("📋 Export").clicked()
                && let Some(text) = overlay.export_shortcut(bar, selected, false)
            {
                action = ShortcutAction::Export(text);
            }
            if ui.button("🗑 Delete").clicked() {
                let export = overlay.remove_shortcut(bar, selected);
                state.selected = None;
                action = ShortcutAction::Deleted(export);
            }
        });

        ui.add_space(ITEM_SPACING);

        let Some(runtime) = overlay.bar(bar) else {
            return;
        };
        egui::ScrollArea::vertical()
            .id_salt("shortcut_tree_scroll")
            .max_height(220.0)
            .show(ui, |ui| {
                if runtime.tree.is_empty() {
                    ui.label(egui::RichText::new("This bar has no shortcuts yet").weak());
                }
                tree_ui(ui, &runtime.tree, runtime.tree.roots(), &mut state.selected);
            });
    });

    if let Some(selected) = state.selected
        && let Some(runtime) = overlay.bar_mut(bar)
    {
        ui.add_space(SECTION_SPACING);
        if node_ui(ui, runtime, bar, selected, capture) && action == ShortcutAction::None {
            action = ShortcutAction::Changed;
        }
    }

    action
}

/// Editor for one shortcut; returns true if it changed
fn node_ui(ui: &mut egui::Ui, runtime: &mut BarRuntime, bar: usize, id: NodeId, capture: &mut HotkeyCaptureState) -> bool {
    let mut changed = false;

    let Some(kind) = runtime.tree.get(id).map(|n| n.props.kind) else {
        return false;
    };
    let mut new_kind = kind;

    ui.group(|ui| {
        ui.label(egui::RichText::new("Selected Shortcut").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Type:");
            enum_combo(ui, "shortcut_kind", &mut new_kind, &[ShortcutKind::Command, ShortcutKind::Category, ShortcutKind::Spacer]);
        });
        if new_kind != kind {
            if kind == ShortcutKind::Category {
                ui.colored_label(STATUS_WARN, "Changing the type removes this category's contents");
            }
            changed = true;
        }

        let Some(props) = runtime.tree.get_mut(id).map(|n| &mut n.props) else {
            return;
        };
        changed |= name_ui(ui, &mut props.name);

        if props.is_spacer() {
            return;
        }

        ui.add_space(ITEM_SPACING);

        if props.kind == ShortcutKind::Command {
            ui.label("Command (one per line):");
            changed |= ui
                .add(
                    egui::TextEdit::multiline(&mut props.command)
                        .desired_rows(3)
                        .desired_width(f32::INFINITY)
                        .code_editor()
                        .hint_text("/echo Hello\n/overlay toggle 2"),
                )
                .changed();
        }

        ui.horizontal(|ui| {
            ui.label("Mode:");
            changed |= enum_combo(
                ui,
                "shortcut_mode",
                &mut props.mode,
                &[ShortcutMode::Default, ShortcutMode::Incremental, ShortcutMode::Random],
            );
        })
        .response
        .on_hover_text(match props.kind {
            ShortcutKind::Category => "Default opens the category; the others run one child per activation",
            _ => "Default runs every line; the others run one line per activation",
        });

        ui.horizontal(|ui| {
            ui.label("Hotkey:");
            changed |= hotkey_field(ui, ("shortcut", bar, id), &mut props.hotkey, capture);
        });
        changed |= ui
            .checkbox(&mut props.key_passthrough, "Pass the hotkey through to the game")
            .changed();

        ui.horizontal(|ui| {
            ui.label("Color:");
            let mut rgba = color32(props.color);
            if ui.color_edit_button_srgba(&mut rgba).changed() {
                props.color = color::from_rgba(rgba.to_srgba_unmultiplied());
                changed = true;
            }
            egui::ComboBox::from_id_salt("shortcut_color_animation")
                .selected_text(props.color_animation.label())
                .show_ui(ui, |ui| {
                    for animation in ColorAnimation::ALL {
                        changed |= ui
                            .selectable_value(&mut props.color_animation, animation, animation.label())
                            .changed();
                    }
                });
        });

        if name::parse(&props.name).icon.is_some() {
            ui.horizontal(|ui| {
                ui.label("Icon Zoom:");
                changed |= ui.add(egui::Slider::new(&mut props.icon_zoom, 1.0..=5.0)).changed();
            });
            ui.horizontal(|ui| {
                ui.label("Icon Offset:");
                changed |= ui
                    .add(egui::DragValue::new(&mut props.icon_offset.x).range(-0.5..=0.5).speed(0.005))
                    .changed();
                changed |= ui
                    .add(egui::DragValue::new(&mut props.icon_offset.y).range(-0.5..=0.5).speed(0.005))
                    .changed();
            });
        }

        if props.is_category() {
            ui.add_space(ITEM_SPACING);
            changed |= category_ui(ui, props);
        }
    });

    if new_kind != kind {
        runtime.tree.set_kind(id, new_kind);
        runtime.popups.retain_existing(&runtime.tree);
        runtime.pie.retain_existing(&runtime.tree);
    }

    changed
}

/// Edits the parts of a display name; rebuilds it only when one changes
fn name_ui(ui: &mut egui::Ui, name_text: &mut String) -> bool {
    let mut parsed = name::parse(name_text);
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Label:");
        changed |= ui.text_edit_singleline(&mut parsed.label).changed();
    });

    ui.horizontal(|ui| {
        let mut has_icon = parsed.icon.is_some();
        if ui.checkbox(&mut has_icon, "Icon").changed() {
            parsed.icon = has_icon.then_some(IconRef {
                id: 0,
                args: IconArgs::default(),
            });
            changed = true;
        }
        if let Some(icon) = &mut parsed.icon {
            ui.label("Id:");
            changed |= ui.add(egui::DragValue::new(&mut icon.id)).changed();
            changed |= ui.checkbox(&mut icon.args.frame, "Frame").changed();
        }
    });

    ui.horizontal(|ui| {
        ui.label("Tooltip:");
        let mut tooltip = parsed.tooltip.clone().unwrap_or_default();
        if ui.text_edit_singleline(&mut tooltip).changed() {
            parsed.tooltip = Some(tooltip).filter(|t| !t.is_empty());
            changed = true;
        }
    });

    if changed {
        *name_text = name::compose(&parsed);
    }
    changed
}

fn category_ui(ui: &mut egui::Ui, props: &mut ShortcutProps) -> bool {
    let mut changed = false;

    ui.label(egui::RichText::new("Category").strong());
    ui.horizontal(|ui| {
        ui.label("Width:");
        changed |= ui
            .add(egui::DragValue::new(&mut props.category_width).range(0..=validation::MAX_WIDTH))
            .changed();
        ui.label("Columns:");
        changed |= ui
            .add(egui::DragValue::new(&mut props.category_columns).range(1..=validation::MAX_COLUMNS))
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label("Spacing:");
        changed |= ui
            .add(egui::DragValue::new(&mut props.category_spacing.x).range(0.0..=validation::MAX_SPACING))
            .changed();
        changed |= ui
            .add(egui::DragValue::new(&mut props.category_spacing.y).range(0.0..=validation::MAX_SPACING))
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label("Scale:");
        changed |= ui
            .add(egui::Slider::new(&mut props.category_scale, validation::MIN_SCALE..=validation::MAX_SCALE))
            .changed();
    });
    ui.horizontal(|ui| {
        ui.label("Font Scale:");
        changed |= ui
            .add(egui::Slider::new(&mut props.category_font_scale, validation::MIN_SCALE..=validation::MAX_SCALE))
            .changed();
    });
    ui.horizontal(|ui| {
        changed |= ui.checkbox(&mut props.category_stays_open, "Stays Open").changed();
        changed |= ui.checkbox(&mut props.category_hover_open, "Open on Hover").changed();
        changed |= ui.checkbox(&mut props.category_no_background, "No Background").changed();
    });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> ShortcutConfig {
        ShortcutConfig::leaf(ShortcutProps::command(name, format!("/{name}")))
    }

    fn sample() -> ShortcutTree {
        ShortcutTree::from_configs(&[
            leaf("a"),
            ShortcutConfig::category("cat", ShortcutMode::Default, vec![leaf("x"), leaf("y")]),
            leaf("b"),
        ])
    }

    #[test]
    fn test_insert_target_follows_selection() {
        let tree = sample();
        let roots = tree.roots().to_vec();
        let cat = roots[1];
        let x = tree.get(cat).unwrap().children()[0];

        assert_eq!(insert_target(&tree, None), (None, 3));
        assert_eq!(insert_target(&tree, Some(roots[0])), (None, 1));
        assert_eq!(insert_target(&tree, Some(cat)), (Some(cat), 2));
        assert_eq!(insert_target(&tree, Some(x)), (Some(cat), 1));
    }

    #[test]
    fn test_sibling_index() {
        let tree = sample();
        let roots = tree.roots().to_vec();
        let y = tree.get(roots[1]).unwrap().children()[1];
        assert_eq!(sibling_index(&tree, roots[2]), Some((None, 2, 3)));
        assert_eq!(sibling_index(&tree, y), Some((Some(roots[1]), 1, 2)));
    }

    #[test]
    fn test_node_labels() {
        assert_eq!(node_label(&ShortcutProps::command("Hi##tip", "")), "▶ Hi");
        assert_eq!(node_label(&ShortcutProps::named("::12", ShortcutKind::Category)), "📁 icon 12");
        assert_eq!(node_label(&ShortcutProps::named("", ShortcutKind::Spacer)), "― (unnamed)");
    }
}
