//! Command sinks and the overlay's own `/overlay` commands
//!
//! Activation hands every resolved line to a [`CommandSink`]. Lines starting
//! with `/overlay` are intercepted by [`CommandRouter`] and turned into
//! [`InternalCommand`]s; everything else reaches the configured sink.

use std::collections::HashMap;
use std::process::{Child, Command};

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt as _, KEY_PRESS_EVENT, KEY_RELEASE_EVENT};
use x11rb::protocol::xtest::ConnectionExt as _;

use crate::activation::CommandSink;
use crate::constants::command::INTERNAL_PREFIX;
use crate::game_window::GameWindowProbe;

/// A bar named by 1-based position or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BarRef {
    Index(usize),
    Name(String),
}

impl BarRef {
    fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(n) if n > 0 => BarRef::Index(n - 1),
            _ => BarRef::Name(arg.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalCommand {
    Toggle(BarRef),
    Show(BarRef),
    Hide(BarRef),
    /// Open or close the settings window
    Config,
}

impl InternalCommand {
    /// `None` when the line is not addressed to the overlay
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let rest = line.trim().strip_prefix(INTERNAL_PREFIX)?;
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let rest = rest.trim();
        let (verb, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let arg = arg.trim();
        Some(match (verb, arg.is_empty()) {
            ("config" | "", _) => Ok(InternalCommand::Config),
            ("toggle", false) => Ok(InternalCommand::Toggle(BarRef::parse(arg))),
            ("show", false) => Ok(InternalCommand::Show(BarRef::parse(arg))),
            ("hide", false) => Ok(InternalCommand::Hide(BarRef::parse(arg))),
            ("toggle" | "show" | "hide", true) => Err(format!("{verb} needs a bar name or number")),
            _ => Err(format!("unknown command '{verb}'")),
        })
    }
}

/// Splits internal commands off before they reach the real sink
pub struct CommandRouter<'a> {
    inner: &'a mut dyn CommandSink,
    internal: Vec<InternalCommand>,
}

impl<'a> CommandRouter<'a> {
    pub fn new(inner: &'a mut dyn CommandSink) -> Self {
        Self {
            inner,
            internal: Vec::new(),
        }
    }

    pub fn into_internal(self) -> Vec<InternalCommand> {
        self.internal
    }
}

impl CommandSink for CommandRouter<'_> {
    fn execute(&mut self, command: &str) {
        match InternalCommand::parse(command) {
            Some(Ok(cmd)) => {
                debug!(?cmd, "Internal command");
                self.internal.push(cmd);
            }
            Some(Err(reason)) => warn!(command, %reason, "Invalid overlay command"),
            None => self.inner.execute(command),
        }
    }
}

/// Where resolved commands go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SinkKind {
    /// Only log commands
    #[default]
    Log,
    /// Run each line with `sh -c`
    Shell,
    /// Type each line into the game client through XTEST
    Type,
}

pub fn build_sink(kind: SinkKind, window_prefix: &str) -> Result<Box<dyn CommandSink>> {
    Ok(match kind {
        SinkKind::Log => Box::new(LogSink),
        SinkKind::Shell => Box::new(ShellSink::default()),
        SinkKind::Type => Box::new(TypingSink::connect(window_prefix).context("Failed to set up XTEST typing")?),
    })
}

pub struct LogSink;

impl CommandSink for LogSink {
    fn execute(&mut self, command: &str) {
        info!(command, "Command");
    }
}

#[derive(Default)]
pub struct ShellSink {
    running: Vec<Child>,
}

impl CommandSink for ShellSink {
    fn execute(&mut self, command: &str) {
        // Reap finished children
        self.running.retain_mut(|child| matches!(child.try_wait(), Ok(None)));

        match Command::new("sh").arg("-c").arg(command).spawn() {
            Ok(child) => {
                debug!(command, pid = child.id(), "Spawned shell command");
                self.running.push(child);
            }
            Err(e) => error!(command, error = %e, "Failed to spawn shell command"),
        }
    }
}

const XK_RETURN: u32 = 0xff0d;
const XK_SHIFT_L: u32 = 0xffe1;

/// Types commands into the game client as synthetic key presses
pub struct TypingSink {
    probe: GameWindowProbe,
    /// keysym -> (keycode, needs shift)
    keymap: HashMap<u32, (u8, bool)>,
    shift: u8,
}

impl TypingSink {
    pub fn connect(window_prefix: &str) -> Result<Self> {
        let probe = GameWindowProbe::connect(window_prefix)?;
        let conn = probe.conn();
        let setup = conn.setup();
        let min = setup.min_keycode;
        let max = setup.max_keycode;

        conn.xtest_get_version(2, 2)
            .context("Failed to query XTEST extension")?
            .reply()
            .context("XTEST extension not available")?;

        let mapping = conn
            .get_keyboard_mapping(min, max - min + 1)
            .context("Failed to query keyboard mapping")?
            .reply()
            .context("Failed to get keyboard mapping reply")?;

        let per = mapping.keysyms_per_keycode as usize;
        let mut keymap = HashMap::new();
        for (i, syms) in mapping.keysyms.chunks(per.max(1)).enumerate() {
            let code = min + i as u8;
            for (level, &sym) in syms.iter().take(2).enumerate() {
                if sym != 0 {
                    keymap.entry(sym).or_insert((code, level == 1));
                }
            }
        }
        let shift = keymap
            .get(&XK_SHIFT_L)
            .map(|&(code, _)| code)
            .context("No keycode for Shift_L")?;

        info!(keysyms = keymap.len(), "XTEST typing ready");
        Ok(Self { probe, keymap, shift })
    }

    fn tap(&self, code: u8, shifted: bool) -> Result<()> {
        if shifted {
            self.fake(KEY_PRESS_EVENT, self.shift)?;
        }
        self.fake(KEY_PRESS_EVENT, code)?;
        self.fake(KEY_RELEASE_EVENT, code)?;
        if shifted {
            self.fake(KEY_RELEASE_EVENT, self.shift)?;
        }
        Ok(())
    }

    fn fake(&self, event: u8, code: u8) -> Result<()> {
        self.probe
            .conn()
            .xtest_fake_input(event, code, x11rb::CURRENT_TIME, self.probe.root(), 0, 0, 0)
            .context("Failed to send XTEST input")?;
        Ok(())
    }

    fn type_line(&self, line: &str) -> Result<()> {
        match self.probe.find_game_window()? {
            Some(window) => self.probe.activate_window(window)?,
            None => debug!("No game window, typing into the focused window"),
        }
        for ch in line.chars() {
            // Latin-1 keysyms equal their code points
            match self.keymap.get(&(ch as u32)) {
                Some(&(code, shifted)) => self.tap(code, shifted)?,
                None => debug!(%ch, "No keycode for character, skipping"),
            }
        }
        if let Some(&(code, _)) = self.keymap.get(&XK_RETURN) {
            self.tap(code, false)?;
        }
        self.probe.conn().flush().context("Failed to flush X11 connection")?;
        Ok(())
    }
}

impl CommandSink for TypingSink {
    fn execute(&mut self, command: &str) {
        if let Err(e) = self.type_line(command) {
            error!(command, error = ?e, "Failed to type command");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::tests::RecordingSink;

    #[test]
    fn test_parse_internal_commands() {
        assert_eq!(InternalCommand::parse("/say hi"), None);
        assert_eq!(InternalCommand::parse("/overlayx"), None);
        assert_eq!(InternalCommand::parse("/overlay"), Some(Ok(InternalCommand::Config)));
        assert_eq!(InternalCommand::parse("/overlay config"), Some(Ok(InternalCommand::Config)));
        assert_eq!(
            InternalCommand::parse("/overlay toggle 2"),
            Some(Ok(InternalCommand::Toggle(BarRef::Index(1))))
        );
        assert_eq!(
            InternalCommand::parse("  /overlay hide  Main Bar "),
            Some(Ok(InternalCommand::Hide(BarRef::Name("Main Bar".to_string()))))
        );
        assert!(matches!(InternalCommand::parse("/overlay show"), Some(Err(_))));
        assert!(matches!(InternalCommand::parse("/overlay dance"), Some(Err(_))));
    }

    #[test]
    fn test_router_splits_lines() {
        let mut sink = RecordingSink::default();
        let mut router = CommandRouter::new(&mut sink);
        router.execute("/say hi");
        router.execute("/overlay show 1");
        router.execute("/overlay bogus");
        let internal = router.into_internal();
        assert_eq!(internal, vec![InternalCommand::Show(BarRef::Index(0))]);
        assert_eq!(sink.commands, vec!["/say hi".to_string()]);
    }
}
