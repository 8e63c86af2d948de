//! X11 probe for the game client window
//!
//! Answers the host queries the overlay needs each frame: is the game
//! focused, who is logged in, where is the client and where is the pointer.

use anyhow::{Context, Result};
use tracing::{debug, trace};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

use crate::condition::{GameState, flags};
use crate::constants::x11;
use crate::types::{Rect, Vec2};

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub wm_name: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub net_active_window: Atom,
    pub net_client_list: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {name} atom"))?
        .reply()
        .context(format!("Failed to get reply for {name} atom"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            wm_name: intern(conn, "WM_NAME")?,
            net_wm_name: intern(conn, "_NET_WM_NAME")?,
            utf8_string: intern(conn, "UTF8_STRING")?,
            net_active_window: intern(conn, "_NET_ACTIVE_WINDOW")?,
            net_client_list: intern(conn, "_NET_CLIENT_LIST")?,
        })
    }
}

/// What a window title says about a game client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameWindowKind {
    LoggedIn(String),
    LoggedOut,
}

/// Classifies a title against the configured prefix, e.g. `"EVE - "`.
/// The prefix without its separator is the logged-out title.
pub fn classify_title(title: &str, prefix: &str) -> Option<GameWindowKind> {
    if let Some(name) = title.strip_prefix(prefix) {
        let name = name.trim();
        return Some(if name.is_empty() {
            GameWindowKind::LoggedOut
        } else {
            GameWindowKind::LoggedIn(name.to_string())
        });
    }
    let bare = prefix.trim_end_matches([' ', '-']);
    (!bare.is_empty() && title == bare).then_some(GameWindowKind::LoggedOut)
}

/// Per-frame view of the game, handed to the condition gate
#[derive(Debug, Clone, Default)]
pub struct GameSnapshot {
    pub focused: bool,
    pub character: Option<String>,
    /// Client area in root coordinates
    pub client: Option<Rect>,
    /// Pointer in root coordinates
    pub pointer: Option<Vec2>,
    pub primary_down: bool,
    pub settings_open: bool,
}

impl GameSnapshot {
    /// Used without an X server: focused, logged out
    pub fn detached() -> Self {
        Self {
            focused: true,
            ..Default::default()
        }
    }

    fn pointer_in_game(&self) -> bool {
        match (self.client, self.pointer) {
            (Some(client), Some(pointer)) => client.contains(pointer),
            _ => false,
        }
    }
}

impl GameState for GameSnapshot {
    fn condition_flag(&self, flag: i32) -> bool {
        match flag {
            flags::GAME_FOCUSED => self.focused,
            flags::POINTER_IN_GAME => self.pointer_in_game(),
            flags::SETTINGS_OPEN => self.settings_open,
            _ => false,
        }
    }

    fn job(&self) -> Option<u32> {
        None
    }

    fn role(&self) -> Option<u32> {
        None
    }

    fn logged_in(&self) -> bool {
        self.character.is_some()
    }

    fn character_id(&self) -> Option<u64> {
        None
    }

    fn character_name(&self) -> Option<&str> {
        self.character.as_deref()
    }
}

pub struct GameWindowProbe {
    conn: RustConnection,
    root: Window,
    atoms: CachedAtoms,
    prefix: String,
    last_game: Option<Window>,
}

impl GameWindowProbe {
    pub fn connect(prefix: impl Into<String>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 server")?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = CachedAtoms::new(&conn)?;
        let prefix = prefix.into();
        debug!(root, prefix = %prefix, "Game window probe connected");
        Ok(Self {
            conn,
            root,
            atoms,
            prefix,
            last_game: None,
        })
    }

    pub fn conn(&self) -> &RustConnection {
        &self.conn
    }

    pub fn root(&self) -> Window {
        self.root
    }

    fn window_property(&self, window: Window, property: Atom, kind: AtomEnum) -> Result<Vec<u32>> {
        let reply = self
            .conn
            .get_property(false, window, property, kind, 0, 1024)
            .context(format!("Failed to query property {property} on window {window}"))?
            .reply()
            .context(format!("Failed to get property {property} reply for window {window}"))?;
        Ok(reply.value32().map(|values| values.collect()).unwrap_or_default())
    }

    pub fn active_window(&self) -> Result<Option<Window>> {
        let windows = self.window_property(self.root, self.atoms.net_active_window, AtomEnum::WINDOW)?;
        Ok(windows.first().copied().filter(|&w| w != x11rb::NONE))
    }

    /// `_NET_WM_NAME`, falling back to `WM_NAME`
    pub fn window_title(&self, window: Window) -> Result<String> {
        let utf8 = self
            .conn
            .get_property(false, window, self.atoms.net_wm_name, self.atoms.utf8_string, 0, 1024)
            .context(format!("Failed to query _NET_WM_NAME for window {window}"))?
            .reply()
            .context(format!("Failed to get _NET_WM_NAME reply for window {window}"))?;
        if !utf8.value.is_empty() {
            return Ok(String::from_utf8_lossy(&utf8.value).into_owned());
        }
        let name = self
            .conn
            .get_property(false, window, self.atoms.wm_name, AtomEnum::STRING, 0, 1024)
            .context(format!("Failed to query WM_NAME for window {window}"))?
            .reply()
            .context(format!("Failed to get WM_NAME reply for window {window}"))?;
        Ok(String::from_utf8_lossy(&name.value).into_owned())
    }

    fn game_kind(&self, window: Window) -> Option<GameWindowKind> {
        self.window_title(window)
            .ok()
            .and_then(|title| classify_title(&title, &self.prefix))
    }

    /// First managed window titled like a game client
    pub fn find_game_window(&self) -> Result<Option<Window>> {
        let clients = self.window_property(self.root, self.atoms.net_client_list, AtomEnum::WINDOW)?;
        Ok(clients.into_iter().find(|&w| self.game_kind(w).is_some()))
    }

    /// Client area in root coordinates
    pub fn geometry(&self, window: Window) -> Result<Rect> {
        let geometry = self
            .conn
            .get_geometry(window)
            .context(format!("Failed to query geometry for window {window}"))?
            .reply()
            .context(format!("Failed to get geometry reply for window {window}"))?;
        let origin = self
            .conn
            .translate_coordinates(window, self.root, 0, 0)
            .context(format!("Failed to translate coordinates for window {window}"))?
            .reply()
            .context(format!("Failed to get translate reply for window {window}"))?;
        Ok(Rect::from_min_size(
            Vec2::new(f32::from(origin.dst_x), f32::from(origin.dst_y)),
            Vec2::new(f32::from(geometry.width), f32::from(geometry.height)),
        ))
    }

    /// Pointer position and whether the primary button is down
    pub fn pointer(&self) -> Result<(Vec2, bool)> {
        let reply = self
            .conn
            .query_pointer(self.root)
            .context("Failed to query pointer")?
            .reply()
            .context("Failed to get pointer reply")?;
        let pos = Vec2::new(f32::from(reply.root_x), f32::from(reply.root_y));
        Ok((pos, reply.mask.contains(KeyButMask::BUTTON1)))
    }

    pub fn warp_pointer(&self, to: Vec2) -> Result<()> {
        self.conn
            .warp_pointer(x11rb::NONE, self.root, 0, 0, 0, 0, to.x as i16, to.y as i16)
            .context("Failed to warp pointer")?;
        self.conn.flush().context("Failed to flush X11 connection after pointer warp")?;
        Ok(())
    }

    /// Samples the game state for this frame
    pub fn sample(&mut self) -> Result<GameSnapshot> {
        let active = self.active_window()?;
        let active_kind = active.and_then(|w| self.game_kind(w).map(|kind| (w, kind)));
        let focused = active_kind.is_some();

        let (window, kind) = match active_kind {
            Some(found) => (Some(found.0), Some(found.1)),
            None => {
                let cached = self.last_game.and_then(|w| self.game_kind(w).map(|kind| (w, kind)));
                match cached {
                    Some((w, kind)) => (Some(w), Some(kind)),
                    None => {
                        let found = self.find_game_window()?;
                        (found, found.and_then(|w| self.game_kind(w)))
                    }
                }
            }
        };
        if window != self.last_game {
            debug!(?window, ?kind, "Game window changed");
            self.last_game = window;
        }

        let (pointer, primary_down) = match self.pointer() {
            Ok((pos, down)) => (Some(pos), down),
            Err(_) => (None, false),
        };
        let snapshot = GameSnapshot {
            focused,
            character: match kind {
                Some(GameWindowKind::LoggedIn(name)) => Some(name),
                _ => None,
            },
            client: window.and_then(|w| self.geometry(w).ok()),
            pointer,
            primary_down,
            settings_open: false,
        };
        trace!(?snapshot, "Sampled game state");
        Ok(snapshot)
    }

    /// Activate (focus) a window using _NET_ACTIVE_WINDOW
    pub fn activate_window(&self, window: Window) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
            .context(format!("Failed to raise window {window} to top of stack"))?;

        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            sequence: 0,
            window,
            type_: self.atoms.net_active_window,
            data: ClientMessageData::from([x11::ACTIVE_WINDOW_SOURCE_PAGER, x11rb::CURRENT_TIME, 0, 0, 0]),
        };
        self.conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                &event,
            )
            .context(format!("Failed to send _NET_ACTIVE_WINDOW event for window {window}"))?;
        self.conn
            .flush()
            .context("Failed to flush X11 connection after window activation")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "EVE - ";

    #[test]
    fn test_classify_titles() {
        assert_eq!(
            classify_title("EVE - Some Pilot", PREFIX),
            Some(GameWindowKind::LoggedIn("Some Pilot".to_string()))
        );
        assert_eq!(classify_title("EVE", PREFIX), Some(GameWindowKind::LoggedOut));
        assert_eq!(classify_title("EVE - ", PREFIX), Some(GameWindowKind::LoggedOut));
        assert_eq!(classify_title("Firefox", PREFIX), None);
        assert_eq!(classify_title("EVE Online Launcher", PREFIX), None);
    }

    #[test]
    fn test_snapshot_answers_conditions() {
        let snapshot = GameSnapshot {
            focused: true,
            character: Some("Pilot".to_string()),
            client: Some(Rect::from_min_size(Vec2::new(100.0, 100.0), Vec2::new(800.0, 600.0))),
            pointer: Some(Vec2::new(150.0, 150.0)),
            primary_down: false,
            settings_open: false,
        };
        assert!(snapshot.logged_in());
        assert!(snapshot.condition_flag(flags::GAME_FOCUSED));
        assert!(snapshot.condition_flag(flags::POINTER_IN_GAME));
        assert!(!snapshot.condition_flag(flags::SETTINGS_OPEN));
        assert_eq!(snapshot.character_name(), Some("Pilot"));

        let detached = GameSnapshot::detached();
        assert!(detached.condition_flag(flags::GAME_FOCUSED));
        assert!(!detached.logged_in());
        assert!(!detached.condition_flag(flags::POINTER_IN_GAME));
    }
}
