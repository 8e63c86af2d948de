//! Configuration management for overlay bars
//!
//! - **bar**: per-bar persisted records
//! - **document**: the whole document with global settings
//! - **store**: loading and saving the document as JSON

pub mod bar;
pub mod document;
pub mod store;

pub use bar::{BarConfig, BarProps};
pub use document::{Configuration, GlobalSettings, HotkeyEdge};
pub use store::{ConfigStore, default_config_path};
