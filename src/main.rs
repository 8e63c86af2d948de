#![forbid(unsafe_code)]

mod activation;
mod bar;
mod color;
mod commands;
mod condition;
mod config;
mod constants;
mod dispatcher;
mod game_window;
mod gui;
mod hotkey;
mod import_export;
mod keyboard;
mod keystate;
mod overlay;
mod pie;
mod popup;
mod shortcut;
mod snapping;
mod types;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{Level as TraceLevel, info, warn};
use tracing_subscriber::FmtSubscriber;

use commands::SinkKind;
use config::{ConfigStore, default_config_path};
use gui::OverlayOptions;
use keyboard::KeyboardSource;

/// Configurable button bars and pie menus drawn over the game client
#[derive(Parser, Debug)]
#[command(name = "overlay-bars")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where shortcut commands go
    #[arg(short, long, value_enum, default_value_t = SinkKind::Log)]
    sink: SinkKind,

    /// trace, debug, info, warn or error; overrides LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,

    /// Read keys from the overlay window only, not from /dev/input
    #[arg(long, default_value = "false")]
    no_evdev: bool,

    /// Title prefix identifying game client windows
    #[arg(long, default_value = constants::game::WINDOW_TITLE_PREFIX)]
    window_prefix: String,
}

fn parse_level(level: &str) -> TraceLevel {
    match level.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let log_level = args
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .map_or(TraceLevel::INFO, |level| parse_level(&level));
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = ConfigStore::new(args.config.unwrap_or_else(default_config_path));
    info!(path = %store.path().display(), "Using config file");
    let config = store.load();

    let sink = commands::build_sink(args.sink, &args.window_prefix)?;

    let keyboard = if args.no_evdev {
        info!("Global key input disabled");
        None
    } else if !keyboard::check_permissions() {
        keyboard::print_permission_error();
        None
    } else {
        KeyboardSource::spawn()
            .inspect_err(|err| warn!(error = ?err, "Failed to start key listeners, using overlay-window keys"))
            .ok()
    };

    gui::run_overlay(
        config,
        OverlayOptions {
            store,
            sink,
            keyboard,
            window_prefix: args.window_prefix,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_levels_parse_case_insensitively() {
        assert_eq!(parse_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_level("warn"), TraceLevel::WARN);
        assert_eq!(parse_level("bogus"), TraceLevel::INFO);
    }

    #[test]
    fn test_cli_defaults() {
        let args = Cli::parse_from(["overlay-bars"]);
        assert_eq!(args.sink, SinkKind::Log);
        assert!(!args.no_evdev);
        assert_eq!(args.window_prefix, constants::game::WINDOW_TITLE_PREFIX);
    }
}
