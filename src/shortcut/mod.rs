//! Shortcut model: persisted records, the runtime arena and the name parser

pub mod name;
pub mod tree;

use serde::{Deserialize, Serialize};

use crate::color::ColorAnimation;
use crate::constants::defaults;
use crate::hotkey::Hotkey;
use crate::types::Vec2;

pub use tree::{NodeId, ShortcutTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShortcutKind {
    #[default]
    Command,
    Category,
    Spacer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShortcutMode {
    #[default]
    Default,
    Incremental,
    Random,
}

/// Everything a shortcut persists except its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutProps {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "t")]
    pub kind: ShortcutKind,
    #[serde(rename = "c")]
    pub command: String,
    #[serde(rename = "k")]
    pub hotkey: Hotkey,
    #[serde(rename = "kP")]
    pub key_passthrough: bool,
    #[serde(rename = "m")]
    pub mode: ShortcutMode,
    #[serde(rename = "cl")]
    pub color: u32,
    #[serde(rename = "clA")]
    pub color_animation: ColorAnimation,
    #[serde(rename = "iZ")]
    pub icon_zoom: f32,
    #[serde(rename = "iO")]
    pub icon_offset: Vec2,
    #[serde(rename = "cW")]
    pub category_width: u32,
    #[serde(rename = "cSO")]
    pub category_stays_open: bool,
    #[serde(rename = "cC")]
    pub category_columns: u32,
    #[serde(rename = "cSp")]
    pub category_spacing: Vec2,
    #[serde(rename = "cS")]
    pub category_scale: f32,
    #[serde(rename = "cF")]
    pub category_font_scale: f32,
    #[serde(rename = "cNB")]
    pub category_no_background: bool,
    #[serde(rename = "cH")]
    pub category_hover_open: bool,
}

impl Default for ShortcutProps {
    fn default() -> Self {
        Self {
            name: String::new(),
            kind: ShortcutKind::Command,
            command: String::new(),
            hotkey: Hotkey::NONE,
            key_passthrough: false,
            mode: ShortcutMode::Default,
            color: defaults::COLOR,
            color_animation: ColorAnimation::None,
            icon_zoom: 1.0,
            icon_offset: Vec2::ZERO,
            category_width: defaults::CATEGORY_WIDTH,
            category_stays_open: false,
            category_columns: 1,
            category_spacing: defaults::SPACING.into(),
            category_scale: 1.0,
            category_font_scale: 1.0,
            category_no_background: false,
            category_hover_open: false,
        }
    }
}

impl ShortcutProps {
    pub fn named(name: impl Into<String>, kind: ShortcutKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Default::default()
        }
    }

    pub fn command(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Self::named(name, ShortcutKind::Command)
        }
    }

    pub fn is_category(&self) -> bool {
        self.kind == ShortcutKind::Category
    }

    pub fn is_spacer(&self) -> bool {
        self.kind == ShortcutKind::Spacer
    }
}

/// Persisted shortcut with its subtree inlined
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShortcutConfig {
    #[serde(flatten)]
    pub props: ShortcutProps,
    #[serde(rename = "sL", default)]
    pub children: Vec<ShortcutConfig>,
}

impl ShortcutConfig {
    pub fn leaf(props: ShortcutProps) -> Self {
        Self {
            props,
            children: Vec::new(),
        }
    }

    pub fn category(name: impl Into<String>, mode: ShortcutMode, children: Vec<ShortcutConfig>) -> Self {
        Self {
            props: ShortcutProps {
                mode,
                ..ShortcutProps::named(name, ShortcutKind::Category)
            },
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_keys_on_disk() {
        let config = ShortcutConfig::leaf(ShortcutProps::command("Hi", "say hi"));
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["n"], "Hi");
        assert_eq!(value["c"], "say hi");
        assert_eq!(value["t"], "Command");
        assert_eq!(value["cl"], 0xFFFF_FFFFu32);
        assert!(value["sL"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let config: ShortcutConfig =
            serde_json::from_str(r#"{"n":"Cat","t":"Category","sL":[{"n":"A","c":"/a"}]}"#).unwrap();
        assert!(config.props.is_category());
        assert_eq!(config.props.category_width, defaults::CATEGORY_WIDTH);
        assert_eq!(config.props.category_columns, 1);
        assert_eq!(config.children.len(), 1);
        assert_eq!(config.children[0].props.command, "/a");
        assert_eq!(config.children[0].props.icon_zoom, 1.0);
    }
}
