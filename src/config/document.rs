//! The configuration document: bars, condition sets and global settings

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::bar::{BarConfig, BarProps};
use crate::condition::ConditionSet;
use crate::constants::{input, validation};
use crate::shortcut::ShortcutConfig;

/// Which key edge fires an ordinary hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HotkeyEdge {
    Down,
    #[default]
    Up,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Copy a bar or shortcut to the clipboard before deleting it
    pub export_on_delete: bool,
    /// Undocked bars keep their fractional position when the viewport resizes
    pub resize_repositions_bars: bool,
    pub use_icon_frame: bool,
    /// Show bars even while no character is logged in
    pub always_display_bars: bool,
    /// Re-evaluate condition sets for every bar instead of once per frame
    pub no_condition_cache: bool,
    pub pies_always_center: bool,
    pub pies_move_mouse: bool,
    pub pies_return_mouse: bool,
    pub hotkey_edge: HotkeyEdge,
    pub short_hold_seconds: f32,
    /// Snap distance in pixels for dragged undocked bars (0 = disabled)
    pub snap_threshold: u16,
    /// Directory of `<id>.png` icons; defaults to `icons/` next to the config
    pub icon_dir: Option<String>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            export_on_delete: true,
            resize_repositions_bars: false,
            use_icon_frame: false,
            always_display_bars: false,
            no_condition_cache: false,
            pies_always_center: false,
            pies_move_mouse: false,
            pies_return_mouse: false,
            hotkey_edge: HotkeyEdge::Up,
            short_hold_seconds: input::SHORT_HOLD_SECONDS,
            snap_threshold: 15,
            icon_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub version: u32,
    pub bars: Vec<BarConfig>,
    pub condition_sets: Vec<ConditionSet>,
    #[serde(flatten)]
    pub global: GlobalSettings,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            version: 1,
            bars: Vec::new(),
            condition_sets: Vec::new(),
            global: GlobalSettings::default(),
        }
    }
}

impl Configuration {
    /// Document for first start: a single empty bar in editing mode
    pub fn first_start() -> Self {
        Self {
            bars: vec![BarConfig {
                props: BarProps {
                    editing: true,
                    ..BarProps::named("Bar 1")
                },
                shortcuts: Vec::new(),
            }],
            ..Default::default()
        }
    }

    /// Clamps all values into safe ranges
    pub fn validate_and_clamp(&mut self) {
        if !(0.05..=2.0).contains(&self.global.short_hold_seconds) {
            warn!(short_hold_seconds = self.global.short_hold_seconds, "short_hold_seconds out of range, using default");
            self.global.short_hold_seconds = input::SHORT_HOLD_SECONDS;
        }
        for bar in &mut self.bars {
            bar.props.validate_and_clamp();
            for shortcut in &mut bar.shortcuts {
                clamp_shortcut(shortcut);
            }
        }
    }
}

pub(crate) fn clamp_shortcut(shortcut: &mut ShortcutConfig) {
    use validation::*;

    let props = &mut shortcut.props;
    if props.category_columns == 0 || props.category_columns > MAX_COLUMNS {
        warn!(shortcut = %props.name, columns = props.category_columns, "category columns out of range, clamping");
        props.category_columns = props.category_columns.clamp(1, MAX_COLUMNS);
    }
    if props.category_width == 0 || props.category_width > MAX_WIDTH {
        warn!(shortcut = %props.name, width = props.category_width, "category width out of range, clamping");
        props.category_width = props.category_width.clamp(1, MAX_WIDTH);
    }
    if !(MIN_SCALE..=MAX_SCALE).contains(&props.category_scale) {
        warn!(shortcut = %props.name, scale = props.category_scale, "category scale out of range, clamping");
        props.category_scale = props.category_scale.clamp(MIN_SCALE, MAX_SCALE);
    }
    if !(MIN_SCALE..=MAX_SCALE).contains(&props.category_font_scale) {
        warn!(shortcut = %props.name, font_scale = props.category_font_scale, "category font scale out of range, clamping");
        props.category_font_scale = props.category_font_scale.clamp(MIN_SCALE, MAX_SCALE);
    }
    if !(0.1..=10.0).contains(&props.icon_zoom) {
        warn!(shortcut = %props.name, zoom = props.icon_zoom, "icon zoom out of range, clamping");
        props.icon_zoom = props.icon_zoom.clamp(0.1, 10.0);
    }
    // Only categories own children
    if !props.is_category() && !shortcut.children.is_empty() {
        warn!(shortcut = %props.name, dropped = shortcut.children.len(), "non-category shortcut had children, dropping them");
        shortcut.children.clear();
    }
    for child in &mut shortcut.children {
        clamp_shortcut(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcut::{ShortcutKind, ShortcutProps};

    #[test]
    fn test_first_start_has_editing_bar() {
        let config = Configuration::first_start();
        assert_eq!(config.bars.len(), 1);
        assert!(config.bars[0].props.editing);
        assert!(config.global.export_on_delete);
    }

    #[test]
    fn test_partial_document_loads() {
        let config: Configuration =
            serde_json::from_str(r#"{"bars":[{"n":"Main","d":"Top"}],"no_condition_cache":true}"#).unwrap();
        assert_eq!(config.bars[0].props.name, "Main");
        assert!(config.global.no_condition_cache);
        assert!(config.global.export_on_delete);
        assert_eq!(config.global.hotkey_edge, HotkeyEdge::Up);
    }

    #[test]
    fn test_clamp_drops_children_of_leaves() {
        let mut config = Configuration::default();
        let mut leaf = ShortcutConfig::leaf(ShortcutProps::named("Leaf", ShortcutKind::Command));
        leaf.children.push(ShortcutConfig::default());
        leaf.props.category_columns = 0;
        config.bars.push(BarConfig {
            props: BarProps::named("b"),
            shortcuts: vec![leaf],
        });
        config.validate_and_clamp();
        let leaf = &config.bars[0].shortcuts[0];
        assert!(leaf.children.is_empty());
        assert_eq!(leaf.props.category_columns, 1);
    }
}
