//! Shortcut activation engine
//!
//! Resolves a click, hover or hotkey on a shortcut node into an effect:
//! running command lines, rotating a cursor, or opening a category popup.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::constants::command::MAX_LENGTH;
use crate::popup::PopupStack;
use crate::shortcut::{NodeId, ShortcutKind, ShortcutMode, ShortcutTree};

/// Receives fully resolved single-line commands
pub trait CommandSink {
    fn execute(&mut self, command: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Click,
    /// Pointer hovered a category that opens on hover
    Hover,
    /// Delivered from the hotkey dispatcher
    Hotkey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Ignored,
    Ran { lines: usize },
    PopupOpened(NodeId),
    PopupClosed(NodeId),
}

pub struct ActivationEngine<R: Rng = StdRng> {
    rng: R,
}

impl ActivationEngine<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ActivationEngine<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ActivationEngine<R> {
    pub fn activate(
        &mut self,
        tree: &mut ShortcutTree,
        popups: &mut PopupStack,
        id: NodeId,
        trigger: Trigger,
        sink: &mut dyn CommandSink,
    ) -> Activation {
        let Some(node) = tree.get(id) else {
            return Activation::Ignored;
        };
        let kind = node.props.kind;
        let mode = node.props.mode;
        let parent = node.parent();

        let result = match kind {
            ShortcutKind::Spacer => Activation::Ignored,
            ShortcutKind::Command => self.activate_command(tree, id, mode, trigger, sink),
            ShortcutKind::Category if mode == ShortcutMode::Default => {
                if trigger == Trigger::Hover {
                    if popups.open(tree, id) {
                        Activation::PopupOpened(id)
                    } else {
                        Activation::Ignored
                    }
                } else if popups.toggle(tree, id) {
                    Activation::PopupOpened(id)
                } else {
                    Activation::PopupClosed(id)
                }
            }
            ShortcutKind::Category => self.activate_cycling_category(tree, popups, id, mode, trigger, sink),
        };

        // Any command click closes its popup, even an empty one; categories never do
        if kind == ShortcutKind::Command && trigger != Trigger::Hover {
            close_parent_popup(tree, popups, parent);
        }
        result
    }

    fn activate_command(
        &mut self,
        tree: &mut ShortcutTree,
        id: NodeId,
        mode: ShortcutMode,
        trigger: Trigger,
        sink: &mut dyn CommandSink,
    ) -> Activation {
        if trigger == Trigger::Hover {
            return Activation::Ignored;
        }
        let Some(node) = tree.get(id) else {
            return Activation::Ignored;
        };
        let lines: Vec<String> = node.lines().into_iter().map(str::to_string).collect();
        if lines.is_empty() {
            return Activation::Ignored;
        }

        match mode {
            ShortcutMode::Default => {
                for line in &lines {
                    run_line(sink, line);
                }
                Activation::Ran { lines: lines.len() }
            }
            ShortcutMode::Incremental | ShortcutMode::Random => {
                let count = lines.len();
                let current = tree.clamped_cursor(id, count);
                run_line(sink, &lines[current]);
                let next = self.next_cursor(mode, current, count);
                tree.set_cursor(id, next);
                Activation::Ran { lines: 1 }
            }
        }
    }

    fn activate_cycling_category(
        &mut self,
        tree: &mut ShortcutTree,
        popups: &mut PopupStack,
        id: NodeId,
        mode: ShortcutMode,
        trigger: Trigger,
        sink: &mut dyn CommandSink,
    ) -> Activation {
        let Some(node) = tree.get(id) else {
            return Activation::Ignored;
        };
        let own_lines: Vec<String> = node.lines().into_iter().map(str::to_string).collect();
        let children = node.children().to_vec();

        let mut ran = 0;
        if trigger != Trigger::Hover {
            for line in &own_lines {
                run_line(sink, line);
                ran += 1;
            }
        }

        let count = children.len();
        if count == 0 {
            return if ran > 0 { Activation::Ran { lines: ran } } else { Activation::Ignored };
        }

        let start = tree.clamped_cursor(id, count);
        let pick = (0..count)
            .map(|offset| (start + offset) % count)
            .find(|&i| tree.get(children[i]).is_some_and(|c| !c.props.is_spacer()));
        let Some(pick) = pick else {
            return Activation::Ignored;
        };

        debug!(child = pick, count, "delegating to category child");
        let result = self.activate(tree, popups, children[pick], trigger, sink);
        if result != Activation::Ignored {
            let next = self.next_cursor(mode, pick, count);
            tree.set_cursor(id, next);
        }

        match result {
            Activation::Ran { lines } => Activation::Ran { lines: lines + ran },
            Activation::Ignored if ran > 0 => Activation::Ran { lines: ran },
            other => other,
        }
    }

    fn next_cursor(&mut self, mode: ShortcutMode, current: usize, count: usize) -> usize {
        match mode {
            ShortcutMode::Random if count > 1 => {
                // Never repeat the entry that just ran
                let step = self.rng.gen_range(1..count);
                (current + step) % count
            }
            ShortcutMode::Random => 0,
            _ => (current + 1) % count,
        }
    }
}

/// A command click inside a popup closes that popup unless it stays open
fn close_parent_popup(tree: &ShortcutTree, popups: &mut PopupStack, parent: Option<NodeId>) {
    let Some(parent) = parent else {
        return;
    };
    let stays_open = tree.get(parent).is_some_and(|p| p.props.category_stays_open);
    if !stays_open && popups.is_open(parent) {
        popups.close_from(parent);
    }
}

fn run_line(sink: &mut dyn CommandSink, line: &str) {
    if line.chars().count() > MAX_LENGTH {
        warn!(length = line.chars().count(), max = MAX_LENGTH, "command too long, truncating");
        let cut: String = line.chars().take(MAX_LENGTH).collect();
        sink.execute(&cut);
    } else {
        sink.execute(line);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shortcut::{ShortcutConfig, ShortcutProps};

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub commands: Vec<String>,
    }

    impl CommandSink for RecordingSink {
        fn execute(&mut self, command: &str) {
            self.commands.push(command.to_string());
        }
    }

    fn hi_bye(mode: ShortcutMode) -> ShortcutTree {
        ShortcutTree::from_configs(&[ShortcutConfig::category("Cat", mode, vec![
            ShortcutConfig::leaf(ShortcutProps::command("A", "say hi")),
            ShortcutConfig::leaf(ShortcutProps::command("B", "say bye")),
        ])])
    }

    fn command_tree(command: &str, mode: ShortcutMode) -> (ShortcutTree, NodeId) {
        let mut tree = ShortcutTree::new();
        let mut props = ShortcutProps::command("C", command);
        props.mode = mode;
        let id = tree.push(None, props).unwrap();
        (tree, id)
    }

    #[test]
    fn test_default_command_runs_every_line() {
        let (mut tree, id) = command_tree("/one\n/two", ShortcutMode::Default);
        let mut sink = RecordingSink::default();
        let result = ActivationEngine::seeded(1).activate(&mut tree, &mut PopupStack::default(), id, Trigger::Click, &mut sink);
        assert_eq!(result, Activation::Ran { lines: 2 });
        assert_eq!(sink.commands, vec!["/one", "/two"]);
    }

    #[test]
    fn test_incremental_visits_each_line_in_order() {
        let (mut tree, id) = command_tree("/1\n/2\n/3", ShortcutMode::Incremental);
        let mut engine = ActivationEngine::seeded(1);
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        for _ in 0..6 {
            engine.activate(&mut tree, &mut popups, id, Trigger::Click, &mut sink);
        }
        assert_eq!(sink.commands, vec!["/1", "/2", "/3", "/1", "/2", "/3"]);
        assert_eq!(tree.get(id).unwrap().cursor(), 0);
    }

    #[test]
    fn test_random_never_repeats_immediately() {
        let (mut tree, id) = command_tree("/a\n/b\n/c", ShortcutMode::Random);
        let mut engine = ActivationEngine::seeded(7);
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        for _ in 0..50 {
            engine.activate(&mut tree, &mut popups, id, Trigger::Hotkey, &mut sink);
        }
        assert!(sink.commands.windows(2).all(|w| w[0] != w[1]));
        assert!(tree.get(id).unwrap().cursor() < 3);
    }

    #[test]
    fn test_stale_cursor_is_clamped() {
        let (mut tree, id) = command_tree("/a\n/b", ShortcutMode::Incremental);
        tree.set_cursor(id, 9);
        let mut sink = RecordingSink::default();
        ActivationEngine::seeded(1).activate(&mut tree, &mut PopupStack::default(), id, Trigger::Click, &mut sink);
        assert_eq!(sink.commands, vec!["/b"]);
        assert_eq!(tree.get(id).unwrap().cursor(), 0);
    }

    #[test]
    fn test_default_category_only_opens_popup() {
        let mut tree = hi_bye(ShortcutMode::Default);
        let cat = tree.roots()[0];
        tree.get_mut(cat).unwrap().props.command = "/never".to_string();
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        let mut engine = ActivationEngine::seeded(1);

        assert_eq!(engine.activate(&mut tree, &mut popups, cat, Trigger::Click, &mut sink), Activation::PopupOpened(cat));
        assert!(popups.is_open(cat));
        assert!(sink.commands.is_empty());

        assert_eq!(engine.activate(&mut tree, &mut popups, cat, Trigger::Click, &mut sink), Activation::PopupClosed(cat));
        assert!(sink.commands.is_empty());
    }

    #[test]
    fn test_incremental_category_rotates_children() {
        let mut tree = hi_bye(ShortcutMode::Incremental);
        let cat = tree.roots()[0];
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        let mut engine = ActivationEngine::seeded(1);

        engine.activate(&mut tree, &mut popups, cat, Trigger::Click, &mut sink);
        assert_eq!(sink.commands, vec!["say hi"]);
        assert_eq!(tree.get(cat).unwrap().cursor(), 1);
        assert!(popups.is_empty());

        engine.activate(&mut tree, &mut popups, cat, Trigger::Click, &mut sink);
        assert_eq!(sink.commands, vec!["say hi", "say bye"]);
        assert_eq!(tree.get(cat).unwrap().cursor(), 0);
        assert!(popups.is_empty());
    }

    #[test]
    fn test_child_click_closes_popup_unless_stays_open() {
        let mut tree = hi_bye(ShortcutMode::Default);
        let cat = tree.roots()[0];
        let child = tree.get(cat).unwrap().children()[0];
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        let mut engine = ActivationEngine::seeded(1);

        engine.activate(&mut tree, &mut popups, cat, Trigger::Click, &mut sink);
        engine.activate(&mut tree, &mut popups, child, Trigger::Click, &mut sink);
        assert!(!popups.is_open(cat));

        tree.get_mut(cat).unwrap().props.category_stays_open = true;
        engine.activate(&mut tree, &mut popups, cat, Trigger::Click, &mut sink);
        engine.activate(&mut tree, &mut popups, child, Trigger::Click, &mut sink);
        assert!(popups.is_open(cat));
        assert_eq!(sink.commands, vec!["say hi", "say hi"]);
    }

    #[test]
    fn test_cycling_category_click_keeps_parent_popup_open() {
        let mut tree = ShortcutTree::from_configs(&[ShortcutConfig::category("Outer", ShortcutMode::Default, vec![
            ShortcutConfig::category("Inc", ShortcutMode::Incremental, vec![ShortcutConfig::leaf(ShortcutProps::command(
                "A", "/a",
            ))]),
        ])]);
        let outer = tree.roots()[0];
        let inc = tree.get(outer).unwrap().children()[0];
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        let mut engine = ActivationEngine::seeded(1);

        engine.activate(&mut tree, &mut popups, outer, Trigger::Click, &mut sink);
        let result = engine.activate(&mut tree, &mut popups, inc, Trigger::Click, &mut sink);
        assert_eq!(result, Activation::Ran { lines: 1 });
        assert_eq!(sink.commands, vec!["/a"]);
        assert!(popups.is_open(outer));
    }

    #[test]
    fn test_empty_command_click_still_closes_popup() {
        let mut tree = ShortcutTree::from_configs(&[ShortcutConfig::category("Outer", ShortcutMode::Default, vec![
            ShortcutConfig::leaf(ShortcutProps::command("Blank", "")),
        ])]);
        let outer = tree.roots()[0];
        let blank = tree.get(outer).unwrap().children()[0];
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        let mut engine = ActivationEngine::seeded(1);

        engine.activate(&mut tree, &mut popups, outer, Trigger::Click, &mut sink);
        let result = engine.activate(&mut tree, &mut popups, blank, Trigger::Click, &mut sink);
        assert_eq!(result, Activation::Ignored);
        assert!(sink.commands.is_empty());
        assert!(!popups.is_open(outer));
    }

    #[test]
    fn test_hover_never_runs_commands() {
        let mut tree = hi_bye(ShortcutMode::Incremental);
        let cat = tree.roots()[0];
        tree.get_mut(cat).unwrap().props.command = "/own".to_string();
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        let mut engine = ActivationEngine::seeded(1);

        assert_eq!(engine.activate(&mut tree, &mut popups, cat, Trigger::Hover, &mut sink), Activation::Ignored);
        assert!(sink.commands.is_empty());
        assert_eq!(tree.get(cat).unwrap().cursor(), 0);

        engine.activate(&mut tree, &mut popups, cat, Trigger::Click, &mut sink);
        assert_eq!(sink.commands, vec!["/own", "say hi"]);
    }

    #[test]
    fn test_hover_opens_default_category_without_toggling() {
        let mut tree = hi_bye(ShortcutMode::Default);
        let cat = tree.roots()[0];
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        let mut engine = ActivationEngine::seeded(1);
        engine.activate(&mut tree, &mut popups, cat, Trigger::Hover, &mut sink);
        engine.activate(&mut tree, &mut popups, cat, Trigger::Hover, &mut sink);
        assert!(popups.is_open(cat));
    }

    #[test]
    fn test_spacers_are_skipped() {
        let mut tree = ShortcutTree::from_configs(&[ShortcutConfig::category("Cat", ShortcutMode::Incremental, vec![
            ShortcutConfig::leaf(ShortcutProps::named("", ShortcutKind::Spacer)),
            ShortcutConfig::leaf(ShortcutProps::command("A", "/a")),
        ])]);
        let cat = tree.roots()[0];
        let spacer = tree.get(cat).unwrap().children()[0];
        let mut popups = PopupStack::default();
        let mut sink = RecordingSink::default();
        let mut engine = ActivationEngine::seeded(1);

        assert_eq!(engine.activate(&mut tree, &mut popups, spacer, Trigger::Click, &mut sink), Activation::Ignored);
        engine.activate(&mut tree, &mut popups, cat, Trigger::Click, &mut sink);
        assert_eq!(sink.commands, vec!["/a"]);
        assert_eq!(tree.get(cat).unwrap().cursor(), 0);
    }

    #[test]
    fn test_long_lines_are_truncated() {
        let long = "x".repeat(MAX_LENGTH + 20);
        let (mut tree, id) = command_tree(&long, ShortcutMode::Default);
        let mut sink = RecordingSink::default();
        ActivationEngine::seeded(1).activate(&mut tree, &mut PopupStack::default(), id, Trigger::Click, &mut sink);
        assert_eq!(sink.commands[0].len(), MAX_LENGTH);
    }
}
