//! Paints open pie menus over everything else

use eframe::egui::{self, Align2, Color32, FontId, Id, LayerId, Stroke};

use super::bar_view::{ViewEnv, color32};
use super::constants::{PIE_FILL, PIE_HOVER, PIE_SLOT_RADIUS};
use super::icons::{IconCache, IconLookup};
use crate::color;
use crate::constants::pie::DEAD_ZONE;
use crate::overlay::BarRuntime;
use crate::pie::slot_center;
use crate::shortcut::name;

pub fn show_pie(ctx: &egui::Context, runtime: &BarRuntime, index: usize, env: &ViewEnv, icons: &mut IconCache) {
    let pie = &runtime.pie;
    if !pie.is_open() {
        return;
    }
    let painter = ctx.layer_painter(LayerId::new(egui::Order::Tooltip, Id::new(("overlay-pie", index))));
    let center = env.to_screen(pie.center());
    painter.circle_stroke(center, DEAD_ZONE, Stroke::new(1.5, Color32::from_gray(160)));

    for (ring, level) in pie.levels().iter().enumerate() {
        for (n, &id) in level.items.iter().enumerate() {
            let Some(node) = runtime.tree.get(id) else {
                continue;
            };
            let pos = env.to_screen(slot_center(pie.center(), ring, n, level.items.len()));
            let fill = if level.hovered == Some(n) { PIE_HOVER } else { PIE_FILL };
            painter.circle_filled(pos, PIE_SLOT_RADIUS, fill);

            let parsed = name::parse(&node.props.name);
            let tint = color32(color::animate(node.props.color, node.props.color_animation, env.elapsed));
            if let Some(icon) = parsed.icon
                && let IconLookup::Ready(texture) = icons.get(icon.id)
            {
                let rect = egui::Rect::from_center_size(pos, egui::Vec2::splat(PIE_SLOT_RADIUS));
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(texture.id(), rect, uv, tint);
            } else {
                painter.text(pos, Align2::CENTER_CENTER, &parsed.label, FontId::proportional(13.0), tint);
            }
            if node.props.is_category() {
                painter.circle_stroke(pos, PIE_SLOT_RADIUS, Stroke::new(1.0, tint));
            }
        }
    }
}
