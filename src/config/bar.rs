//! Persisted bar records

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::bar::{BarAlign, DockSide, Visibility};
use crate::constants::{defaults, validation};
use crate::hotkey::Hotkey;
use crate::shortcut::ShortcutConfig;
use crate::types::Vec2;

/// Everything a bar persists except its shortcuts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarProps {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "h")]
    pub hidden: bool,
    #[serde(rename = "v")]
    pub visibility: Visibility,
    #[serde(rename = "a")]
    pub align: BarAlign,
    #[serde(rename = "d")]
    pub dock: DockSide,
    #[serde(rename = "ht")]
    pub hint: bool,
    #[serde(rename = "bW")]
    pub button_width: u32,
    #[serde(rename = "e")]
    pub editing: bool,
    /// Fraction of the usable area, never pixels
    #[serde(rename = "p")]
    pub position: Vec2,
    #[serde(rename = "l")]
    pub locked: bool,
    #[serde(rename = "cC")]
    pub columns: u32,
    #[serde(rename = "s")]
    pub scale: f32,
    #[serde(rename = "rA")]
    pub reveal_area_scale: f32,
    #[serde(rename = "fS")]
    pub font_scale: f32,
    #[serde(rename = "sp")]
    pub spacing: Vec2,
    #[serde(rename = "nB")]
    pub no_background: bool,
    #[serde(rename = "c")]
    pub condition_set: i32,
    /// Pie menu hotkey
    #[serde(rename = "k")]
    pub hotkey: Hotkey,
}

impl Default for BarProps {
    fn default() -> Self {
        Self {
            name: String::new(),
            hidden: false,
            visibility: Visibility::Always,
            align: BarAlign::Center,
            dock: DockSide::Bottom,
            hint: false,
            button_width: defaults::BUTTON_WIDTH,
            editing: false,
            position: Vec2::ZERO,
            locked: false,
            columns: 0,
            scale: 1.0,
            reveal_area_scale: 1.0,
            font_scale: 1.0,
            spacing: defaults::SPACING.into(),
            no_background: false,
            condition_set: -1,
            hotkey: Hotkey::NONE,
        }
    }
}

impl BarProps {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Clamps values into safe ranges, logging each correction
    pub fn validate_and_clamp(&mut self) {
        use validation::*;

        if !(0.0..=1.0).contains(&self.reveal_area_scale) {
            warn!(bar = %self.name, reveal_area_scale = self.reveal_area_scale, "reveal_area_scale outside 0..1, clamping");
            self.reveal_area_scale = self.reveal_area_scale.clamp(0.0, 1.0);
        }
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.scale) {
            warn!(bar = %self.name, scale = self.scale, "scale out of range, clamping");
            self.scale = self.scale.clamp(MIN_SCALE, MAX_SCALE);
        }
        if !(MIN_SCALE..=MAX_SCALE).contains(&self.font_scale) {
            warn!(bar = %self.name, font_scale = self.font_scale, "font_scale out of range, clamping");
            self.font_scale = self.font_scale.clamp(MIN_SCALE, MAX_SCALE);
        }
        if self.button_width == 0 || self.button_width > MAX_WIDTH {
            warn!(bar = %self.name, button_width = self.button_width, "button_width out of range, using default");
            self.button_width = defaults::BUTTON_WIDTH;
        }
        if self.columns > MAX_COLUMNS {
            warn!(bar = %self.name, columns = self.columns, max = MAX_COLUMNS, "columns exceeds maximum, clamping");
            self.columns = MAX_COLUMNS;
        }
        let spacing = Vec2::new(self.spacing.x.clamp(0.0, MAX_SPACING), self.spacing.y.clamp(0.0, MAX_SPACING));
        if spacing != self.spacing {
            warn!(bar = %self.name, "spacing out of range, clamping");
            self.spacing = spacing;
        }
        let position = Vec2::new(self.position.x.clamp(-1.0, 1.0), self.position.y.clamp(-1.0, 1.0));
        if position != self.position || !position.x.is_finite() || !position.y.is_finite() {
            warn!(bar = %self.name, x = self.position.x, y = self.position.y, "position out of range, clamping");
            self.position = if position.x.is_finite() && position.y.is_finite() { position } else { Vec2::ZERO };
        }
    }
}

/// Persisted bar with its shortcut tree inlined
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BarConfig {
    #[serde(flatten)]
    pub props: BarProps,
    #[serde(rename = "sL", default)]
    pub shortcuts: Vec<ShortcutConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_record() {
        let bar: BarConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(bar.props, BarProps::default());
        assert_eq!(bar.props.condition_set, -1);
        assert_eq!(bar.props.dock, DockSide::Bottom);
        assert_eq!(bar.props.visibility, Visibility::Always);
        assert!(bar.shortcuts.is_empty());
    }

    #[test]
    fn test_validate_clamps() {
        let mut props = BarProps {
            reveal_area_scale: 1.5,
            scale: 0.0,
            button_width: 0,
            position: Vec2::new(3.0, f32::NAN),
            ..BarProps::named("x")
        };
        props.validate_and_clamp();
        assert_eq!(props.reveal_area_scale, 1.0);
        assert_eq!(props.scale, validation::MIN_SCALE);
        assert_eq!(props.button_width, defaults::BUTTON_WIDTH);
        assert_eq!(props.position, Vec2::ZERO);
    }
    #[test]
    fn test_columns_load_from_short_key_and_clamp() {
        let mut bar: BarConfig = serde_json::from_str(r#"{"n":"x","cC":3}"#).unwrap();
        assert_eq!(bar.props.columns, 3);
        assert!(serde_json::to_string(&bar).unwrap().contains(r#""cC":3"#));

        bar.props.columns = validation::MAX_COLUMNS + 5;
        bar.props.validate_and_clamp();
        assert_eq!(bar.props.columns, validation::MAX_COLUMNS);
    }
}
