//! Global hotkey registry and dispatcher
//!
//! The registry is rebuilt every tick by a collect pass over the visible
//! bars and drained by [`HotkeyDispatcher::dispatch`]. Nothing survives
//! from one tick to the next except the per-key edge latches shared with
//! pie hotkeys.

use tracing::{debug, trace};

use crate::config::HotkeyEdge;
use crate::constants::input::{KEY_COUNT, SCAN_LIMIT};
use crate::hotkey::{Hotkey, vk};
use crate::keystate::KeyTracker;
use crate::shortcut::{NodeId, ShortcutMode, ShortcutTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub bar: usize,
    pub node: NodeId,
    pub hotkey: Hotkey,
    pub passthrough: bool,
    /// Default-mode category: reveal the bar and open the popup chain
    pub reveals: bool,
}

/// A node activation handed to the next frame's tree walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatched {
    pub bar: usize,
    pub node: NodeId,
    pub reveals: bool,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub activated: Vec<Dispatched>,
    /// Keys to withhold from the game this frame
    pub blocked: Vec<u8>,
}

/// Edge selection for a key that is shared with a pie hotkey
#[derive(Debug, Clone, Copy, Default)]
struct KeyLatch {
    use_key_up: bool,
    use_short_hold: bool,
}

pub struct HotkeyDispatcher {
    registry: Vec<Registration>,
    latches: [KeyLatch; KEY_COUNT],
    edge: HotkeyEdge,
    enabled: bool,
    pie_blocked: Vec<u8>,
}

impl HotkeyDispatcher {
    pub fn new(edge: HotkeyEdge) -> Self {
        Self {
            registry: Vec::new(),
            latches: [KeyLatch::default(); KEY_COUNT],
            edge,
            enabled: true,
            pie_blocked: Vec::new(),
        }
    }

    pub fn set_edge(&mut self, edge: HotkeyEdge) {
        self.edge = edge;
    }

    /// Disabled while keyboard input belongs elsewhere (text field, capture
    /// widget, unfocused game); drops the registry
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            debug!(enabled, "Hotkey dispatch toggled");
        }
        self.enabled = enabled;
        if !enabled {
            self.registry.clear();
            self.pie_blocked.clear();
        }
    }

    pub fn registry(&self) -> &[Registration] {
        &self.registry
    }

    /// Registers every bound node of one visible bar
    pub fn collect(&mut self, bar: usize, tree: &ShortcutTree) {
        if !self.enabled {
            return;
        }
        let mut found = Vec::new();
        tree.collect_hotkeys(&mut found);
        for (node, hotkey) in found {
            let Some(props) = tree.get(node).map(|n| &n.props) else {
                continue;
            };
            self.registry.push(Registration {
                bar,
                node,
                hotkey,
                passthrough: props.key_passthrough,
                reveals: props.is_category() && props.mode == ShortcutMode::Default,
            });
        }
    }

    /// Whether a pie hotkey is engaged this frame. Once a shortcut shares
    /// the key the pie waits for a short hold, leaving taps to the shortcut.
    pub fn pie_held(&mut self, keys: &KeyTracker, hotkey: Hotkey) -> bool {
        if !self.enabled || hotkey.is_none() {
            return false;
        }
        let key = hotkey.key();
        let state = keys.state(key);
        let mut held = state.is_held() && hotkey.matches(key, keys.modifiers());
        let latch = &mut self.latches[key as usize];
        if held {
            if latch.use_short_hold {
                held = state.short_hold();
            }
            self.pie_blocked.push(key);
        }
        latch.use_key_up = true;
        latch.use_short_hold = false;
        held
    }

    fn fired(&self, keys: &KeyTracker, code: u8) -> bool {
        let state = keys.state(code);
        if self.latches[code as usize].use_key_up {
            return state.key_up() && !state.was_short_held();
        }
        match self.edge {
            HotkeyEdge::Down => state.key_down(),
            HotkeyEdge::Up => state.key_up(),
        }
    }

    /// Matches the registry against this frame's key edges and drains it
    pub fn dispatch(&mut self, keys: &KeyTracker) -> DispatchOutcome {
        let mut outcome = DispatchOutcome {
            blocked: std::mem::take(&mut self.pie_blocked),
            ..Default::default()
        };
        if !self.enabled {
            self.registry.clear();
            return outcome;
        }
        if self.registry.is_empty() {
            return outcome;
        }

        let modifiers = keys.modifiers();
        for code in 0..SCAN_LIMIT {
            if (vk::SHIFT..=vk::MENU).contains(&code) {
                continue;
            }
            let hotkey = Hotkey::new(code, modifiers);
            let fired = self.fired(keys, code);
            for reg in self.registry.iter().filter(|r| r.hotkey == hotkey) {
                let latch = &mut self.latches[code as usize];
                if latch.use_key_up {
                    latch.use_key_up = false;
                    latch.use_short_hold = true;
                }
                if !fired {
                    break;
                }

                debug!(bar = reg.bar, hotkey = %hotkey, reveals = reg.reveals, "Hotkey fired");
                outcome.activated.push(Dispatched {
                    bar: reg.bar,
                    node: reg.node,
                    reveals: reg.reveals,
                });
                if !reg.passthrough && !outcome.blocked.contains(&code) {
                    outcome.blocked.push(code);
                }
            }
        }

        trace!(registered = self.registry.len(), fired = outcome.activated.len(), "Hotkey registry drained");
        self.registry.clear();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::Modifiers;
    use crate::keystate::KeySnapshot;
    use crate::shortcut::{ShortcutConfig, ShortcutProps};

    const ONE: u8 = 0x31;

    struct Rig {
        tree: ShortcutTree,
        keys: KeyTracker,
        dispatcher: HotkeyDispatcher,
        snapshot: KeySnapshot,
    }

    impl Rig {
        fn new(edge: HotkeyEdge, configs: Vec<ShortcutConfig>) -> Self {
            Self {
                tree: ShortcutTree::from_configs(&configs),
                keys: KeyTracker::new(0.2),
                dispatcher: HotkeyDispatcher::new(edge),
                snapshot: KeySnapshot::default(),
            }
        }

        fn frame(&mut self, pie: Option<Hotkey>) -> (DispatchOutcome, bool) {
            self.keys.update(&self.snapshot, 0.1);
            let pie_open = pie.is_some_and(|hk| self.dispatcher.pie_held(&self.keys, hk));
            self.dispatcher.collect(0, &self.tree);
            (self.dispatcher.dispatch(&self.keys), pie_open)
        }
    }

    fn bound(name: &str, hotkey: Hotkey) -> ShortcutConfig {
        let mut props = ShortcutProps::command(name, format!("/{name}"));
        props.hotkey = hotkey;
        ShortcutConfig::leaf(props)
    }

    #[test]
    fn test_key_up_edge_fires_on_release() {
        let ctrl_one = Hotkey::new(ONE, Modifiers::CTRL);
        let mut rig = Rig::new(HotkeyEdge::Up, vec![bound("a", ctrl_one)]);
        let node = rig.tree.roots()[0];

        rig.snapshot.set(vk::LCONTROL, true);
        rig.snapshot.set(ONE, true);
        let (out, _) = rig.frame(None);
        assert!(out.activated.is_empty());

        rig.snapshot.set(ONE, false);
        let (out, _) = rig.frame(None);
        assert_eq!(out.activated, vec![Dispatched { bar: 0, node, reveals: false }]);
        assert_eq!(out.blocked, vec![ONE]);
    }

    #[test]
    fn test_key_down_edge_and_modifier_mismatch() {
        let mut rig = Rig::new(HotkeyEdge::Down, vec![bound("a", Hotkey::new(ONE, Modifiers::empty()))]);
        rig.snapshot.set(vk::LSHIFT, true);
        rig.snapshot.set(ONE, true);
        assert!(rig.frame(None).0.activated.is_empty());

        rig.snapshot = KeySnapshot::default();
        rig.frame(None);
        rig.snapshot.set(ONE, true);
        assert_eq!(rig.frame(None).0.activated.len(), 1);
    }

    #[test]
    fn test_passthrough_is_not_blocked() {
        let mut config = bound("a", Hotkey::new(ONE, Modifiers::empty()));
        config.props.key_passthrough = true;
        let mut rig = Rig::new(HotkeyEdge::Down, vec![config]);
        rig.snapshot.set(ONE, true);
        let (out, _) = rig.frame(None);
        assert_eq!(out.activated.len(), 1);
        assert!(out.blocked.is_empty());
    }

    #[test]
    fn test_default_category_reveals() {
        let mut category = ShortcutConfig::category("cat", ShortcutMode::Default, vec![bound("inner", Hotkey::new(0x32, Modifiers::empty()))]);
        category.props.hotkey = Hotkey::new(ONE, Modifiers::empty());
        let mut rig = Rig::new(HotkeyEdge::Down, vec![category]);
        assert_eq!(rig.frame(None).0, DispatchOutcome::default());
        assert!(rig.dispatcher.registry().is_empty());

        rig.snapshot.set(ONE, true);
        rig.snapshot.set(0x32, true);
        let (out, _) = rig.frame(None);
        assert_eq!(out.activated.len(), 2);
        assert!(out.activated[0].reveals);
        assert!(!out.activated[1].reveals);
    }

    #[test]
    fn test_disabled_never_fires_or_blocks() {
        let mut rig = Rig::new(HotkeyEdge::Down, vec![bound("a", Hotkey::new(ONE, Modifiers::empty()))]);
        rig.dispatcher.set_enabled(false);
        rig.snapshot.set(ONE, true);
        let (out, pie) = rig.frame(Some(Hotkey::new(ONE, Modifiers::empty())));
        assert_eq!(out, DispatchOutcome::default());
        assert!(!pie);
        assert!(rig.dispatcher.registry().is_empty());
    }

    #[test]
    fn test_unregistered_bar_cannot_fire() {
        let mut rig = Rig::new(HotkeyEdge::Down, vec![bound("a", Hotkey::new(ONE, Modifiers::empty()))]);
        rig.frame(None);
        rig.snapshot.set(ONE, true);
        rig.keys.update(&rig.snapshot, 0.1);
        // Bar hidden this tick: no collect pass
        assert!(rig.dispatcher.dispatch(&rig.keys).activated.is_empty());
    }

    #[test]
    fn test_shared_pie_key_tap_runs_shortcut() {
        let key = Hotkey::new(ONE, Modifiers::empty());
        let mut rig = Rig::new(HotkeyEdge::Down, vec![bound("a", key)]);
        rig.frame(Some(key));

        rig.snapshot.set(ONE, true);
        let (out, pie) = rig.frame(Some(key));
        assert!(out.activated.is_empty());
        assert!(!pie);

        rig.snapshot.set(ONE, false);
        let (out, pie) = rig.frame(Some(key));
        assert_eq!(out.activated.len(), 1);
        assert!(!pie);
    }

    #[test]
    fn test_shared_pie_key_hold_opens_pie_only() {
        let key = Hotkey::new(ONE, Modifiers::empty());
        let mut rig = Rig::new(HotkeyEdge::Down, vec![bound("a", key)]);
        rig.frame(Some(key));

        rig.snapshot.set(ONE, true);
        let mut opened = false;
        for _ in 0..6 {
            let (out, pie) = rig.frame(Some(key));
            assert!(out.activated.is_empty());
            opened |= pie;
        }
        assert!(opened);

        rig.snapshot.set(ONE, false);
        let (out, pie) = rig.frame(Some(key));
        assert!(out.activated.is_empty());
        assert!(!pie);
    }

    #[test]
    fn test_lone_pie_opens_immediately_and_blocks() {
        let key = Hotkey::new(ONE, Modifiers::empty());
        let mut rig = Rig::new(HotkeyEdge::Down, Vec::new());
        rig.snapshot.set(ONE, true);
        let (out, pie) = rig.frame(Some(key));
        assert!(pie);
        assert_eq!(out.blocked, vec![ONE]);
    }
}
