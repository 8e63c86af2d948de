//! Application-wide constants
//!
//! Magic numbers and string literals shared by the overlay core, the input
//! listeners and the GUI layer.

/// X11 protocol constants
pub mod x11 {
    /// Source indication for _NET_ACTIVE_WINDOW (2 = pager/direct user action)
    pub const ACTIVE_WINDOW_SOURCE_PAGER: u32 = 2;
}

/// Input event constants (from evdev)
pub mod input {
    /// Key press event value
    pub const KEY_PRESS: i32 = 1;

    /// Key release event value
    pub const KEY_RELEASE: i32 = 0;

    /// Key repeat event value
    pub const KEY_REPEAT: i32 = 2;

    /// Size of the virtual-key table sampled every frame
    pub const KEY_COUNT: usize = 256;

    /// Upper bound (exclusive) of the virtual-key range scanned by the dispatcher
    pub const SCAN_LIMIT: u8 = 240;

    /// Continuous hold (seconds) after which a key counts as a short hold
    pub const SHORT_HOLD_SECONDS: f32 = 0.2;
}

/// Game window detection constants
pub mod game {
    /// Prefix for game client window titles (followed by character name)
    pub const WINDOW_TITLE_PREFIX: &str = "EVE - ";
}

/// Bar reveal animation and layout
pub mod reveal {
    /// Tween progress gained per second (full slide takes half a second)
    pub const TWEEN_SPEED: f32 = 2.0;

    /// Window padding used for hint insets and popup abutment
    pub const WINDOW_PADDING: [f32; 2] = [8.0, 8.0];
}

/// Command execution limits
pub mod command {
    /// Longest single line handed to a command sink
    pub const MAX_LENGTH: usize = 180;

    /// Prefix of commands handled by the overlay itself
    pub const INTERNAL_PREFIX: &str = "/overlay";
}

/// Radial pie menu limits
pub mod pie {
    /// Maximum slices shown per pie level
    pub const MAX_ITEMS: usize = 6;

    /// Maximum nesting depth of pies
    pub const MAX_LEVELS: usize = 3;

    /// Frames a pie stays closed after one of its items fired
    pub const REOPEN_DELAY_FRAMES: u32 = 2;

    /// Inner radius (pixels) under which no slice is hovered
    pub const DEAD_ZONE: f32 = 24.0;

    /// Radial width (pixels) of one pie level
    pub const RING_WIDTH: f32 = 110.0;
}

/// Config file location
pub mod config {
    /// Application directory name under the platform config dir
    pub const APP_DIR: &str = "overlay-bars";

    /// Config file name
    pub const FILENAME: &str = "config.json";

    /// Extension given to a corrupt config that was moved aside
    pub const BACKUP_EXTENSION: &str = "json.bak";

    /// Directory (under APP_DIR) searched for `<id>.png` icons
    pub const ICON_DIR: &str = "icons";
}

/// Shortcut and bar defaults
pub mod defaults {
    /// Default shortcut color (opaque white, 0xAABBGGRR)
    pub const COLOR: u32 = 0xFFFF_FFFF;

    /// Default bar button width in pixels
    pub const BUTTON_WIDTH: u32 = 100;

    /// Default category popup width in pixels
    pub const CATEGORY_WIDTH: u32 = 140;

    /// Default item spacing
    pub const SPACING: [f32; 2] = [8.0, 4.0];

    /// Icon id rendered when an icon can never be loaded
    pub const MISSING_ICON: u32 = 66001;
}

/// Config validation limits
pub mod validation {
    /// Minimum bar/category scale
    pub const MIN_SCALE: f32 = 0.2;

    /// Maximum bar/category scale
    pub const MAX_SCALE: f32 = 4.0;

    /// Maximum button or category width in pixels
    pub const MAX_WIDTH: u32 = 1000;

    /// Maximum columns for bars and categories
    pub const MAX_COLUMNS: u32 = 12;

    /// Maximum item spacing per axis
    pub const MAX_SPACING: f32 = 32.0;
}

/// File paths
pub mod paths {
    /// Linux input device directory
    pub const DEV_INPUT: &str = "/dev/input";
}

/// Permission-related constants
pub mod permissions {
    /// Linux group required for input device access
    pub const INPUT_GROUP: &str = "input";

    /// Command to add user to input group
    pub const ADD_TO_INPUT_GROUP: &str = "sudo usermod -aG input $USER";
}
