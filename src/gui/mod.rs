//! Overlay window and settings UI built on egui/eframe

mod app;
mod bar_view;
mod components;
mod constants;
mod icons;
mod input;
mod pie_view;
mod settings;

pub use app::{OverlayOptions, run_overlay};
