//! GUI-specific constants for layout, status colors and rendering

use egui;

/// Settings window dimensions
pub const SETTINGS_WIDTH: f32 = 560.0;
pub const SETTINGS_HEIGHT: f32 = 720.0;

/// Layout spacing
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const STATUS_WARN: egui::Color32 = egui::Color32::from_rgb(200, 200, 0);

/// How long a status message stays visible
pub const STATUS_SECONDS: f32 = 4.0;

/// Bar button height at scale 1
pub const BUTTON_HEIGHT: f32 = 24.0;

/// Bar background
pub const BAR_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(20, 20, 24, 200);

/// Pie slot radius and colors
pub const PIE_SLOT_RADIUS: f32 = 34.0;
pub const PIE_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(20, 20, 24, 210);
pub const PIE_HOVER: egui::Color32 = egui::Color32::from_rgba_premultiplied(70, 110, 160, 230);

/// Overlay window title, also the app id
pub const WINDOW_TITLE: &str = "Overlay Bars";

/// Input is polled once per repaint
pub const REPAINT_INTERVAL_MS: u64 = 16;

/// Frame time clamp after a stall
pub const MAX_FRAME_SECONDS: f32 = 0.1;
