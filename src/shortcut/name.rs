//! Display-name mini-language
//!
//! `::[flags]<id>[label]##<tooltip>`: a leading `::` introduces an icon
//! reference, `##` splits off a tooltip. Flags are single characters before
//! the id; `_` ends flag parsing and marks the icon as taking no arguments,
//! `f` requests a frame.

const ICON_PREFIX: &str = "::";
const TOOLTIP_DELIMITER: &str = "##";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IconArgs {
    pub frame: bool,
    pub no_args: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconRef {
    pub id: u32,
    pub args: IconArgs,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedName {
    pub label: String,
    pub tooltip: Option<String>,
    pub icon: Option<IconRef>,
}

pub fn parse(name: &str) -> ParsedName {
    let (head, tooltip) = match name.split_once(TOOLTIP_DELIMITER) {
        Some((head, tip)) => (head, Some(tip.to_string()).filter(|t| !t.is_empty())),
        None => (name, None),
    };

    let Some(rest) = head.strip_prefix(ICON_PREFIX) else {
        return ParsedName {
            label: head.to_string(),
            tooltip,
            icon: None,
        };
    };

    let mut args = IconArgs::default();
    let mut flags_end = rest.len();
    for (i, c) in rest.char_indices() {
        if c.is_ascii_digit() {
            flags_end = i;
            break;
        }
        match c {
            '_' => {
                args.no_args = true;
                flags_end = i + 1;
                break;
            }
            'f' => args.frame = true,
            _ => {}
        }
    }

    let rest = &rest[flags_end..];
    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(rest.len(), |(i, _)| i);
    // Unparseable or overflowing ids resolve to 0, which never loads
    let id = rest[..digits_end].parse().unwrap_or(0);

    ParsedName {
        label: rest[digits_end..].trim().to_string(),
        tooltip,
        icon: Some(IconRef { id, args }),
    }
}

/// Inverse of [`parse`] for names built in the editor
pub fn compose(parsed: &ParsedName) -> String {
    let mut name = String::new();
    if let Some(icon) = parsed.icon {
        name.push_str(ICON_PREFIX);
        if icon.args.frame {
            name.push('f');
        }
        if icon.args.no_args {
            name.push('_');
        }
        name.push_str(&icon.id.to_string());
        if !parsed.label.is_empty() {
            name.push(' ');
        }
    }
    name.push_str(&parsed.label);
    if let Some(tooltip) = &parsed.tooltip {
        name.push_str(TOOLTIP_DELIMITER);
        name.push_str(tooltip);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name() {
        let parsed = parse("Attack");
        assert_eq!(parsed.label, "Attack");
        assert_eq!(parsed.tooltip, None);
        assert_eq!(parsed.icon, None);
    }

    #[test]
    fn test_tooltip_split_once() {
        let parsed = parse("Warp##Warp to 0 ## really");
        assert_eq!(parsed.label, "Warp");
        assert_eq!(parsed.tooltip.as_deref(), Some("Warp to 0 ## really"));
        assert_eq!(parse("Empty##").tooltip, None);
    }

    #[test]
    fn test_icon_with_flags() {
        let parsed = parse("::f2912##Scan");
        let icon = parsed.icon.unwrap();
        assert_eq!(icon.id, 2912);
        assert!(icon.args.frame);
        assert!(!icon.args.no_args);
        assert_eq!(parsed.label, "");
        assert_eq!(parsed.tooltip.as_deref(), Some("Scan"));
    }

    #[test]
    fn test_underscore_stops_flag_parsing() {
        let icon = parse("::_f12").icon.unwrap();
        assert!(icon.args.no_args);
        assert!(!icon.args.frame);
        // 'f' after '_' is no longer a flag, so the id cannot parse
        assert_eq!(icon.id, 0);
    }

    #[test]
    fn test_bad_id_is_zero() {
        assert_eq!(parse("::abc").icon.unwrap().id, 0);
        assert_eq!(parse("::99999999999").icon.unwrap().id, 0);
    }

    #[test]
    fn test_compose_inverts_parse() {
        for name in ["Plain", "::f12 Label##Tip", "::_7", "Text##Tooltip"] {
            assert_eq!(compose(&parse(name)), name);
        }
    }
}
