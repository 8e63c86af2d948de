//! Draws bars and their open category popups
//!
//! Drawing only reads the overlay. Everything the pointer does is gathered
//! into [`Interactions`] and applied once the frame's UI is laid out.

use eframe::egui::{self, Align2, Color32, Id, RichText, Sense};

use super::constants::{BAR_FILL, BUTTON_HEIGHT};
use super::icons::{IconCache, IconLookup};
use crate::bar::DockSide;
use crate::color;
use crate::constants::defaults;
use crate::overlay::BarRuntime;
use crate::popup::{AnchorRequest, is_vertical};
use crate::shortcut::{NodeId, ShortcutProps, name};
use crate::types::{Rect, Vec2};

const FONT_SIZE: f32 = 14.0;

/// Maps viewport pixels to egui points and back
#[derive(Debug, Clone, Copy)]
pub struct ViewEnv {
    /// Viewport origin inside the overlay window
    pub origin: egui::Vec2,
    pub elapsed: f32,
    pub use_icon_frame: bool,
}

impl ViewEnv {
    pub fn to_screen(&self, p: Vec2) -> egui::Pos2 {
        egui::pos2(p.x, p.y) + self.origin
    }

    pub fn from_screen(&self, rect: egui::Rect) -> Rect {
        let rect = rect.translate(-self.origin);
        Rect::from_min_max(Vec2::new(rect.min.x, rect.min.y), Vec2::new(rect.max.x, rect.max.y))
    }
}

pub fn color32(color: u32) -> Color32 {
    let [r, g, b, a] = color::to_rgba(color);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// A category button whose popup still needs an anchor
struct PendingAnchor {
    node: NodeId,
    item: Rect,
    sub_level: bool,
    vertical: bool,
}

/// Everything the pointer did to one bar this frame
#[derive(Default)]
pub struct Interactions {
    pub bar_rect: Option<Rect>,
    pub bar_hovered: bool,
    pub popup_rects: Vec<(NodeId, Rect)>,
    pub anchors: Vec<(NodeId, AnchorRequest)>,
    pub clicked: Vec<NodeId>,
    pub hovered: Vec<NodeId>,
    /// Clicked while the bar is in editing mode
    pub selected: Option<NodeId>,
    pub drag: Vec2,
}

impl Interactions {
    /// Rects that should catch the pointer instead of the game
    pub fn hit_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        self.bar_rect.into_iter().chain(self.popup_rects.iter().map(|(_, r)| *r))
    }
}

/// Sizing for one container of buttons
#[derive(Debug, Clone, Copy)]
struct Layout {
    columns: usize,
    width: f32,
    scale: f32,
    font_scale: f32,
    spacing: Vec2,
}

fn bar_columns(dock: DockSide, columns: u32, count: usize) -> usize {
    match columns {
        0 if dock.is_side() => 1,
        0 => count.max(1),
        n => n as usize,
    }
}

fn frame(no_background: bool) -> egui::Frame {
    if no_background {
        egui::Frame::NONE
    } else {
        egui::Frame::NONE
            .fill(BAR_FILL)
            .inner_margin(egui::Margin::same(4))
            .corner_radius(egui::CornerRadius::same(4))
    }
}

struct Walk<'a> {
    runtime: &'a BarRuntime,
    env: &'a ViewEnv,
    icons: &'a mut IconCache,
    out: Interactions,
    pending: Vec<PendingAnchor>,
}

impl Walk<'_> {
    fn needs_anchor(&self, node: NodeId) -> bool {
        self.runtime
            .popups
            .chain()
            .iter()
            .any(|p| p.node == node && p.anchor.is_none())
    }

    fn items(&mut self, ui: &mut egui::Ui, grid: Id, ids: &[NodeId], layout: Layout, sub_level: bool) {
        let vertical = is_vertical(ids.len(), layout.columns as u32);
        egui::Grid::new(grid)
            .spacing([layout.spacing.x, layout.spacing.y])
            .show(ui, |ui| {
                for (i, &id) in ids.iter().enumerate() {
                    if i > 0 && i % layout.columns == 0 {
                        ui.end_row();
                    }
                    self.item(ui, id, layout, sub_level, vertical);
                }
            });
    }

    fn item(&mut self, ui: &mut egui::Ui, id: NodeId, layout: Layout, sub_level: bool, vertical: bool) {
        let runtime = self.runtime;
        let Some(node) = runtime.tree.get(id) else {
            return;
        };
        let props = &node.props;
        let size = egui::vec2(layout.width, BUTTON_HEIGHT * layout.scale);
        let parsed = name::parse(&props.name);
        let color = color32(color::animate(props.color, props.color_animation, self.env.elapsed));
        let text = RichText::new(&parsed.label).color(color).size(FONT_SIZE * layout.font_scale);

        if props.is_spacer() {
            if parsed.label.is_empty() {
                ui.allocate_exact_size(size, Sense::hover());
            } else {
                ui.add_sized(size, egui::Label::new(text));
            }
            return;
        }

        let open = props.is_category() && runtime.popups.is_open(id);
        let button = match parsed.icon {
            Some(icon) => {
                let framed = icon.args.frame || self.env.use_icon_frame;
                match self.icons.get(icon.id) {
                    IconLookup::Ready(texture) => icon_button(&texture, props, color, size.y).frame(framed),
                    IconLookup::Loading => egui::Button::new(text),
                    IconLookup::Missing => match self.icons.get(defaults::MISSING_ICON) {
                        IconLookup::Ready(texture) => icon_button(&texture, props, color, size.y).frame(framed),
                        _ => egui::Button::new(RichText::new("X").color(Color32::RED)),
                    },
                }
            }
            None => egui::Button::new(text),
        };
        let mut response = ui.add_sized(size, button.selected(open));
        if let Some(tooltip) = &parsed.tooltip {
            response = response.on_hover_text(tooltip);
        }

        if response.clicked() {
            if runtime.props.editing {
                self.out.selected = Some(id);
            } else {
                self.out.clicked.push(id);
            }
        }
        if response.hovered() {
            self.out.hovered.push(id);
        }
        if open && self.needs_anchor(id) {
            self.pending.push(PendingAnchor {
                node: id,
                item: self.env.from_screen(response.rect),
                sub_level,
                vertical,
            });
        }
    }

    /// Turns buttons drawn into `container` into anchor requests
    fn flush_anchors(&mut self, container: Rect) {
        let revealed = self.runtime.state.revealed_rect();
        for pending in self.pending.drain(..) {
            self.out.anchors.push((
                pending.node,
                AnchorRequest {
                    item: pending.item,
                    container,
                    revealed,
                    sub_level: pending.sub_level,
                    vertical: pending.vertical,
                },
            ));
        }
    }
}

fn icon_button(texture: &egui::TextureHandle, props: &ShortcutProps, tint: Color32, side: f32) -> egui::Button<'static> {
    let image = egui::Image::from_texture(texture)
        .uv(icon_uv(props))
        .tint(tint)
        .fit_to_exact_size(egui::vec2(side, side));
    egui::Button::image(image)
}

/// Zoom and offset applied to an icon's texture coordinates
fn icon_uv(props: &ShortcutProps) -> egui::Rect {
    let zoom = props.icon_zoom.max(0.01);
    let center = egui::pos2(0.5 + props.icon_offset.x, 0.5 + props.icon_offset.y);
    egui::Rect::from_center_size(center, egui::Vec2::splat(1.0 / zoom))
}

fn pivot_align(pivot: Vec2) -> Align2 {
    let x = match pivot.x {
        x if x < 0.25 => egui::Align::Min,
        x if x > 0.75 => egui::Align::Max,
        _ => egui::Align::Center,
    };
    let y = match pivot.y {
        y if y < 0.25 => egui::Align::Min,
        y if y > 0.75 => egui::Align::Max,
        _ => egui::Align::Center,
    };
    Align2([x, y])
}

/// Draws bar `index` and its popups
pub fn show_bar(ctx: &egui::Context, runtime: &BarRuntime, index: usize, env: &ViewEnv, icons: &mut IconCache) -> Interactions {
    let props = &runtime.props;
    let mut walk = Walk {
        runtime,
        env,
        icons,
        out: Interactions::default(),
        pending: Vec::new(),
    };

    let roots = runtime.tree.roots();
    let layout = Layout {
        columns: bar_columns(props.dock, props.columns, roots.len()),
        width: props.button_width as f32 * props.scale,
        scale: props.scale,
        font_scale: props.font_scale,
        spacing: props.spacing,
    };

    let shown = egui::Area::new(Id::new(("overlay-bar", index)))
        .order(egui::Order::Foreground)
        .fixed_pos(env.to_screen(runtime.state.rect().min))
        .constrain(false)
        .show(ctx, |ui| {
            frame(props.no_background).show(ui, |ui| {
                ui.horizontal(|ui| {
                    if props.editing && !props.locked {
                        let handle = ui
                            .add(egui::Label::new(RichText::new("\u{2630}").weak()).sense(Sense::drag()))
                            .on_hover_text("Drag to move");
                        let delta = handle.drag_delta();
                        walk.out.drag += Vec2::new(delta.x, delta.y);
                    }
                    if roots.is_empty() && props.editing {
                        ui.label(RichText::new(format!("{} (empty)", props.name)).weak());
                    }
                    walk.items(ui, Id::new(("overlay-bar-grid", index)), roots, layout, false);
                });
            });
        });
    let bar_rect = env.from_screen(shown.response.rect);
    walk.out.bar_rect = Some(bar_rect);
    walk.out.bar_hovered = shown.response.contains_pointer();
    walk.flush_anchors(bar_rect);

    for popup in runtime.popups.chain() {
        let (Some(anchor), Some(node)) = (popup.anchor, runtime.tree.get(popup.node)) else {
            continue;
        };
        let p = &node.props;
        let layout = Layout {
            columns: p.category_columns.max(1) as usize,
            width: p.category_width as f32 * p.category_scale,
            scale: p.category_scale,
            font_scale: p.category_font_scale,
            spacing: p.category_spacing,
        };
        let shown = egui::Area::new(Id::new(("overlay-popup", index, popup.node)))
            .order(egui::Order::Foreground)
            .fixed_pos(env.to_screen(anchor.pos))
            .pivot(pivot_align(anchor.pivot))
            .constrain(false)
            .show(ctx, |ui| {
                frame(p.category_no_background).show(ui, |ui| {
                    walk.items(ui, Id::new(("overlay-popup-grid", index, popup.node)), node.children(), layout, true);
                });
            });
        let rect = env.from_screen(shown.response.rect);
        walk.out.popup_rects.push((popup.node, rect));
        walk.flush_anchors(rect);
    }

    walk.out
}
