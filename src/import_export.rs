//! Clipboard strings for bars and shortcut subtrees
//!
//! An export is `base64(deflate(json))`. The JSON wraps the payload in a
//! one-key envelope, `{"b": ...}` for a bar or `{"s": ...}` for a shortcut,
//! so import can try each shape in turn. Plain JSON is accepted as well.

use std::io::{Read, Write};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::document::clamp_shortcut;
use crate::config::{BarConfig, BarProps};
use crate::shortcut::{ShortcutConfig, ShortcutProps};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("clipboard is empty")]
    Empty,
    #[error("not a valid export string: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("export string is corrupt: {0}")]
    Inflate(#[from] std::io::Error),
    #[error("neither a bar ({bar}) nor a shortcut ({shortcut})")]
    Shape {
        bar: serde_json::Error,
        shortcut: serde_json::Error,
    },
}

/// A successfully parsed clipboard payload, already clamped
#[derive(Debug, Clone, PartialEq)]
pub enum Imported {
    Bar(BarConfig),
    Shortcut(ShortcutConfig),
}

#[derive(Serialize, Deserialize)]
struct BarEnvelope {
    b: Value,
}

#[derive(Serialize, Deserialize)]
struct ShortcutEnvelope {
    s: Value,
}

/// Serializes a bar; `full` keeps fields equal to their defaults
pub fn export_bar(bar: &BarConfig, full: bool) -> anyhow::Result<String> {
    let mut value = serde_json::to_value(bar)?;
    if !full {
        strip_bar(&mut value)?;
    }
    encode(&BarEnvelope { b: value })
}

/// Serializes a shortcut with its subtree
pub fn export_shortcut(shortcut: &ShortcutConfig, full: bool) -> anyhow::Result<String> {
    let mut value = serde_json::to_value(shortcut)?;
    if !full {
        strip_shortcut(&mut value, &serde_json::to_value(ShortcutProps::default())?);
    }
    encode(&ShortcutEnvelope { s: value })
}

fn encode<T: Serialize>(envelope: &T) -> anyhow::Result<String> {
    let json = serde_json::to_vec(envelope)?;
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;
    Ok(STANDARD.encode(compressed))
}

fn strip_bar(value: &mut Value) -> anyhow::Result<()> {
    let bar_defaults = serde_json::to_value(BarProps::default())?;
    let shortcut_defaults = serde_json::to_value(ShortcutProps::default())?;
    strip_defaults(value, &bar_defaults);
    if let Some(children) = value.get_mut("sL").and_then(Value::as_array_mut) {
        for child in children {
            strip_shortcut(child, &shortcut_defaults);
        }
    }
    drop_empty_list(value);
    Ok(())
}

fn strip_shortcut(value: &mut Value, defaults: &Value) {
    strip_defaults(value, defaults);
    if let Some(children) = value.get_mut("sL").and_then(Value::as_array_mut) {
        for child in children {
            strip_shortcut(child, defaults);
        }
    }
    drop_empty_list(value);
}

fn strip_defaults(value: &mut Value, defaults: &Value) {
    let (Some(fields), Some(defaults)) = (value.as_object_mut(), defaults.as_object()) else {
        return;
    };
    fields.retain(|key, field| defaults.get(key) != Some(field));
}

fn drop_empty_list(value: &mut Value) {
    if let Some(fields) = value.as_object_mut()
        && fields.get("sL").and_then(Value::as_array).is_some_and(Vec::is_empty)
    {
        fields.remove("sL");
    }
}

fn decode(input: &str) -> Result<Value, ImportError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ImportError::Empty);
    }
    if input.starts_with('{') {
        if let Ok(value) = serde_json::from_str(input) {
            return Ok(value);
        }
    }
    let compressed = STANDARD.decode(input)?;
    let mut json = String::new();
    DeflateDecoder::new(compressed.as_slice()).read_to_string(&mut json)?;
    serde_json::from_str(&json).map_err(|e| ImportError::Inflate(e.into()))
}

/// Parses a clipboard string as a bar, then as a shortcut
pub fn import(input: &str) -> Result<Imported, ImportError> {
    let value = decode(input)?;

    let bar_err = match serde_json::from_value::<BarEnvelope>(value.clone())
        .and_then(|env| serde_json::from_value::<BarConfig>(env.b))
    {
        Ok(mut bar) => {
            debug!(bar = %bar.props.name, shortcuts = bar.shortcuts.len(), "Imported bar");
            bar.props.validate_and_clamp();
            bar.props.editing = false;
            bar.shortcuts.iter_mut().for_each(clamp_shortcut);
            return Ok(Imported::Bar(bar));
        }
        Err(e) => e,
    };

    match serde_json::from_value::<ShortcutEnvelope>(value).and_then(|env| serde_json::from_value::<ShortcutConfig>(env.s)) {
        Ok(mut shortcut) => {
            debug!(shortcut = %shortcut.props.name, "Imported shortcut");
            clamp_shortcut(&mut shortcut);
            Ok(Imported::Shortcut(shortcut))
        }
        Err(shortcut_err) => {
            warn!(bar_error = %bar_err, shortcut_error = %shortcut_err, "Invalid import string");
            Err(ImportError::Shape {
                bar: bar_err,
                shortcut: shortcut_err,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bar::DockSide;
    use crate::hotkey::{Hotkey, Modifiers};
    use crate::shortcut::{ShortcutKind, ShortcutMode};

    fn sample_bar() -> BarConfig {
        let mut hi = ShortcutProps::command("Hi", "/say hi\n/wave");
        hi.hotkey = Hotkey::new(0x31, Modifiers::CTRL);
        let category = ShortcutConfig::category(
            "Greetings",
            ShortcutMode::Incremental,
            vec![
                ShortcutConfig::leaf(hi),
                ShortcutConfig::leaf(ShortcutProps::named("", ShortcutKind::Spacer)),
                ShortcutConfig::leaf(ShortcutProps::command("Bye", "/say bye")),
            ],
        );
        BarConfig {
            props: BarProps {
                dock: DockSide::Left,
                scale: 1.5,
                ..BarProps::named("Main")
            },
            shortcuts: vec![category, ShortcutConfig::leaf(ShortcutProps::command("Solo", "/echo"))],
        }
    }

    #[test]
    fn test_bar_round_trips_minimal_and_full() {
        let bar = sample_bar();
        for full in [false, true] {
            let encoded = export_bar(&bar, full).unwrap();
            assert_eq!(import(&encoded).unwrap(), Imported::Bar(bar.clone()));
        }
    }

    #[test]
    fn test_minimal_omits_defaults() {
        let bar = sample_bar();
        let mut value = serde_json::to_value(&bar).unwrap();
        strip_bar(&mut value).unwrap();
        let fields = value.as_object().unwrap();
        assert!(fields.contains_key("d"));
        assert!(!fields.contains_key("bW"));
        assert!(!fields.contains_key("c"));
        let solo = &value["sL"][1];
        assert_eq!(solo.as_object().unwrap().len(), 2);
        assert!(solo.get("sL").is_none());

        assert!(export_bar(&bar, false).unwrap().len() < export_bar(&bar, true).unwrap().len());
    }

    #[test]
    fn test_shortcut_payload_falls_back_to_shortcut_shape() {
        let shortcut = sample_bar().shortcuts.remove(0);
        let encoded = export_shortcut(&shortcut, false).unwrap();
        assert_eq!(import(&encoded).unwrap(), Imported::Shortcut(shortcut));
    }

    #[test]
    fn test_plain_json_is_accepted() {
        let imported = import(r#"{"s":{"n":"Raw","c":"/raw"}}"#).unwrap();
        let Imported::Shortcut(shortcut) = imported else {
            panic!("expected a shortcut");
        };
        assert_eq!(shortcut.props.command, "/raw");
    }

    #[test]
    fn test_import_clears_editing_and_clamps() {
        let imported = import(r#"{"b":{"n":"x","e":true,"s":99.0}}"#).unwrap();
        let Imported::Bar(bar) = imported else {
            panic!("expected a bar");
        };
        assert!(!bar.props.editing);
        assert_eq!(bar.props.scale, crate::constants::validation::MAX_SCALE);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(import("   "), Err(ImportError::Empty)));
        assert!(matches!(import("not base64 !!"), Err(ImportError::Decode(_))));
        let wrong_shape = STANDARD.encode({
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
            encoder.write_all(br#"{"x":1}"#).unwrap();
            encoder.finish().unwrap()
        });
        assert!(matches!(import(&wrong_shape), Err(ImportError::Shape { .. })));
    }
}
