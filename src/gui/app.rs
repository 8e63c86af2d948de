//! The overlay window: a transparent, undecorated eframe app covering the
//! screen. Bars are drawn over the game client; the pointer passes through
//! everywhere else.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use eframe::{CreationContext, NativeOptions, egui};
use tracing::{debug, error, info, warn};

use super::bar_view::{self, Interactions, ViewEnv};
use super::constants::*;
use super::icons::IconCache;
use super::input::EguiKeys;
use super::pie_view;
use super::settings::{Clipboard, SettingsWindow};
use crate::activation::CommandSink;
use crate::config::{ConfigStore, Configuration};
use crate::game_window::{GameSnapshot, GameWindowProbe};
use crate::keyboard::KeyboardSource;
use crate::overlay::{FrameInput, Overlay};
use crate::types::{Rect, Vec2};

/// Everything the overlay window needs besides the loaded document
pub struct OverlayOptions {
    pub store: ConfigStore,
    pub sink: Box<dyn CommandSink>,
    /// Global key levels; `None` falls back to the window's own key events
    pub keyboard: Option<KeyboardSource>,
    pub window_prefix: String,
}

/// Where the game client sits inside the overlay window, in egui points
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    origin: egui::Vec2,
    viewport: Vec2,
    /// Pointer relative to `origin`
    pointer: Option<Vec2>,
}

impl Placement {
    /// `client` and `pointer` are root-window pixels; the overlay window
    /// covers the root from its top-left corner
    fn new(client: Option<Rect>, pointer: Option<Vec2>, pixels_per_point: f32, screen: Vec2) -> Self {
        let (min, viewport) = match client {
            Some(client) => (client.min / pixels_per_point, client.size() / pixels_per_point),
            None => (Vec2::ZERO, screen),
        };
        Self {
            origin: egui::vec2(min.x, min.y),
            viewport,
            pointer: pointer.map(|p| p / pixels_per_point - min),
        }
    }
}

struct OverlayApp {
    overlay: Overlay,
    store: ConfigStore,
    sink: Box<dyn CommandSink>,
    keyboard: Option<KeyboardSource>,
    egui_keys: EguiKeys,
    probe: Option<GameWindowProbe>,
    icons: IconCache,
    settings: SettingsWindow,
    clipboard: Option<arboard::Clipboard>,
    last_primary: bool,
    passthrough: Option<bool>,
}

impl OverlayApp {
    fn new(_cc: &CreationContext<'_>, config: Configuration, options: OverlayOptions) -> Result<Self> {
        info!("Initializing overlay window");
        let OverlayOptions {
            store,
            sink,
            keyboard,
            window_prefix,
        } = options;

        let probe = GameWindowProbe::connect(window_prefix)
            .inspect_err(|err| warn!(error = ?err, "No X11 connection, treating the game as focused and logged out"))
            .ok();
        let clipboard = arboard::Clipboard::new()
            .inspect_err(|err| warn!(error = %err, "Clipboard unavailable, import and export disabled"))
            .ok();
        let icons = IconCache::new(store.icon_dir(&config.global)).context("Failed to start icon loader")?;
        // Start with settings open while there is something to set up
        let settings = SettingsWindow::new(config.bars.is_empty() || config.bars.iter().any(|b| b.props.editing));

        Ok(Self {
            overlay: Overlay::new(config, Vec2::ZERO),
            store,
            sink,
            keyboard,
            egui_keys: EguiKeys::default(),
            probe,
            icons,
            settings,
            clipboard,
            last_primary: false,
            passthrough: None,
        })
    }

    fn sample_game(&mut self, ctx: &egui::Context) -> GameSnapshot {
        let mut game = match &mut self.probe {
            Some(probe) => probe.sample().unwrap_or_else(|err| {
                debug!(error = ?err, "Failed to sample game window");
                GameSnapshot::detached()
            }),
            None => GameSnapshot::detached(),
        };
        // The overlay counts as part of the game while it holds focus
        game.focused |= ctx.input(|i| i.focused);
        game.settings_open = self.settings.open;
        game
    }

    /// Feeds one bar's pointer activity back into the overlay
    fn apply(&mut self, index: usize, interactions: Interactions) {
        let overlay = &mut self.overlay;
        if let Some(rect) = interactions.bar_rect {
            overlay.set_bar_size(index, rect.size());
        }
        overlay.note_bar_hovered(index, interactions.bar_hovered);
        for (node, rect) in interactions.popup_rects {
            overlay.set_popup_rect(index, node, rect);
        }
        for (node, request) in &interactions.anchors {
            overlay.anchor_popup(index, *node, request);
        }
        for node in interactions.hovered {
            overlay.hover(index, node, self.sink.as_mut());
        }
        for node in interactions.clicked {
            overlay.click(index, node, self.sink.as_mut());
        }
        if let Some(node) = interactions.selected {
            self.settings.select_shortcut(index, node);
        }
        if interactions.drag != Vec2::ZERO {
            overlay.drag_bar(index, interactions.drag);
        }
    }

    fn save(&mut self) {
        if let Err(err) = self.store.save_with_retry(&self.overlay.configuration()) {
            self.settings.set_status(format!("Failed to save config: {err}"), STATUS_ERROR);
        }
    }
}

impl eframe::App for OverlayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.icons.poll(ctx);
        let game = self.sample_game(ctx);

        let screen = ctx.screen_rect();
        let placement = Placement::new(
            game.client,
            game.pointer,
            ctx.pixels_per_point(),
            Vec2::new(screen.width(), screen.height()),
        );
        let pointer = placement.pointer.or_else(|| {
            ctx.input(|i| i.pointer.latest_pos())
                .map(|p| Vec2::new(p.x - placement.origin.x, p.y - placement.origin.y))
        });
        let window_keys = self.egui_keys.update(ctx);
        let input = FrameInput {
            dt: ctx.input(|i| i.stable_dt).min(MAX_FRAME_SECONDS),
            viewport: placement.viewport,
            pointer,
            keys: self.keyboard.as_ref().map_or(window_keys, KeyboardSource::snapshot),
            keyboard_captured: ctx.wants_keyboard_input() || self.settings.is_capturing(),
            game_focused: game.focused,
        };

        self.overlay.begin_frame(&input, &game);
        let env = ViewEnv {
            origin: placement.origin,
            elapsed: self.overlay.elapsed(),
            use_icon_frame: self.overlay.global().use_icon_frame,
        };

        let mut hit_rects = Vec::new();
        for index in 0..self.overlay.bars().len() {
            if !self.overlay.bars()[index].is_visible() {
                continue;
            }
            self.overlay.consume_activations(index, self.sink.as_mut());
            let Some(runtime) = self.overlay.bar(index) else {
                continue;
            };
            if !runtime.state.should_draw() {
                continue;
            }
            let interactions = bar_view::show_bar(ctx, runtime, index, &env, &mut self.icons);
            hit_rects.extend(interactions.hit_rects());
            self.apply(index, interactions);
        }

        let primary_down = game.primary_down || ctx.input(|i| i.pointer.primary_down());
        if primary_down
            && !self.last_primary
            && let Some(pointer) = pointer
        {
            self.overlay.click_outside(pointer);
        }
        self.last_primary = primary_down;

        let output = self.overlay.end_frame(self.sink.as_mut());
        for (index, runtime) in self.overlay.bars().iter().enumerate() {
            if runtime.is_visible() {
                pie_view::show_pie(ctx, runtime, index, &env, &mut self.icons);
            }
        }
        if let Some(to) = output.warp_pointer
            && let Some(probe) = &self.probe
        {
            let root = (to + Vec2::new(placement.origin.x, placement.origin.y)) * ctx.pixels_per_point();
            if let Err(err) = probe.warp_pointer(root) {
                warn!(error = ?err, "Failed to move pointer for pie menu");
            }
        }

        if self.overlay.take_settings_request() {
            self.settings.toggle();
        }
        let clipboard = self.clipboard.as_mut().map(|c| c as &mut dyn Clipboard);
        let settings_rect = self.settings.show(ctx, &mut self.overlay, clipboard);

        self.icons.set_dir(self.store.icon_dir(self.overlay.global()));
        if self.overlay.take_dirty() {
            self.save();
        }

        // Without X11 the pointer is only visible while the window catches it
        let interactive = self.probe.is_none()
            || self.settings.is_capturing()
            || pointer.is_some_and(|p| {
                hit_rects.iter().any(|r| r.contains(p)) || settings_rect.is_some_and(|r| r.contains(env.to_screen(p)))
            });
        if self.passthrough != Some(!interactive) {
            debug!(passthrough = !interactive, "Pointer passthrough changed");
            ctx.send_viewport_cmd(egui::ViewportCommand::MousePassthrough(!interactive));
            self.passthrough = Some(!interactive);
        }

        ctx.request_repaint_after(Duration::from_millis(REPAINT_INTERVAL_MS));
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0; 4]
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(err) = self.store.save_with_retry(&self.overlay.configuration()) {
            error!(error = ?err, "Failed to save config during shutdown");
        }
        info!("Overlay exiting");
    }
}

pub fn run_overlay(config: Configuration, options: OverlayOptions) -> Result<()> {
    let native = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_transparent(true)
            .with_decorations(false)
            .with_always_on_top()
            .with_maximized(true)
            .with_taskbar(false),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        native,
        Box::new(move |cc| {
            let app = OverlayApp::new(cc, config, options)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow!("Failed to launch overlay window: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_follows_game_client() {
        let client = Rect::from_min_size(Vec2::new(200.0, 100.0), Vec2::new(1600.0, 900.0));
        let placement = Placement::new(Some(client), Some(Vec2::new(400.0, 300.0)), 2.0, Vec2::new(1920.0, 1080.0));
        assert_eq!(placement.origin, egui::vec2(100.0, 50.0));
        assert_eq!(placement.viewport, Vec2::new(800.0, 450.0));
        assert_eq!(placement.pointer, Some(Vec2::new(100.0, 100.0)));
    }

    #[test]
    fn test_placement_without_game_uses_whole_screen() {
        let placement = Placement::new(None, None, 1.0, Vec2::new(1920.0, 1080.0));
        assert_eq!(placement.origin, egui::Vec2::ZERO);
        assert_eq!(placement.viewport, Vec2::new(1920.0, 1080.0));
        assert_eq!(placement.pointer, None);
    }
}
