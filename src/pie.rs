//! Radial pie menus opened by a held bar hotkey
//!
//! Level 0 is a ring of the bar's top-level shortcuts around the centre.
//! Hovering a default-mode category opens its children as the next ring
//! outward. Releasing the hotkey activates whatever leaf is hovered.

use std::f32::consts::{FRAC_PI_2, TAU};

use tracing::debug;

use crate::constants::pie::{DEAD_ZONE, MAX_ITEMS, MAX_LEVELS, REOPEN_DELAY_FRAMES, RING_WIDTH};
use crate::shortcut::{NodeId, ShortcutMode, ShortcutTree};
use crate::types::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub struct PieLevel {
    pub items: Vec<NodeId>,
    pub hovered: Option<usize>,
}

/// What the hotkey did to the pie this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieTransition {
    None,
    Opened,
    /// Closed by releasing the key; carries the hovered leaf, if any
    Released(Option<NodeId>),
}

#[derive(Debug, Clone, Default)]
pub struct PieMenu {
    open: bool,
    temp_disable: u32,
    center: Vec2,
    levels: Vec<PieLevel>,
    /// Pointer position before the pie warped it to the centre
    saved_pointer: Option<Vec2>,
}

/// Slice index under `pointer`; slice 0 is centred straight up, the rest
/// follow clockwise
pub fn slice_at(center: Vec2, pointer: Vec2, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let delta = pointer - center;
    if delta.length() < DEAD_ZONE {
        return None;
    }
    let arc = TAU / count as f32;
    let angle = (delta.y.atan2(delta.x) + FRAC_PI_2 + arc / 2.0).rem_euclid(TAU);
    Some(((angle / arc) as usize).min(count - 1))
}

/// Centre of slice `n` of `count` on ring `level`
pub fn slot_center(center: Vec2, level: usize, n: usize, count: usize) -> Vec2 {
    let radius = DEAD_ZONE + RING_WIDTH * (level as f32 + 0.5);
    let angle = TAU / count.max(1) as f32 * n as f32 - FRAC_PI_2;
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

/// Shortcuts shown on one ring: spacers skipped, at most `MAX_ITEMS`
pub fn ring_items(tree: &ShortcutTree, parent: Option<NodeId>) -> Vec<NodeId> {
    tree.child_list(parent)
        .iter()
        .copied()
        .filter(|&id| tree.get(id).is_some_and(|n| !n.props.is_spacer()))
        .take(MAX_ITEMS)
        .collect()
}

fn opens_ring(tree: &ShortcutTree, id: NodeId) -> bool {
    tree.get(id)
        .is_some_and(|n| n.props.is_category() && n.props.mode == ShortcutMode::Default)
}

impl PieMenu {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn levels(&self) -> &[PieLevel] {
        &self.levels
    }

    pub fn saved_pointer(&self) -> Option<Vec2> {
        self.saved_pointer
    }

    /// Feeds this frame's hotkey level. `allowed` is false once another
    /// bar's pie claimed the frame.
    pub fn update(&mut self, held: bool, allowed: bool, tree: &ShortcutTree, center: Vec2, saved_pointer: Option<Vec2>) -> PieTransition {
        if held && allowed && self.temp_disable == 0 {
            if self.open {
                return PieTransition::None;
            }
            self.open = true;
            self.center = center;
            self.saved_pointer = saved_pointer;
            self.levels = vec![PieLevel {
                items: ring_items(tree, None),
                hovered: None,
            }];
            debug!(items = self.levels[0].items.len(), "Pie opened");
            return PieTransition::Opened;
        }
        if !held && self.temp_disable > 0 {
            self.temp_disable -= 1;
        }
        if !self.open {
            return PieTransition::None;
        }

        self.open = false;
        let picked = self.hovered_leaf(tree);
        self.levels.clear();
        if picked.is_some() {
            self.temp_disable = REOPEN_DELAY_FRAMES;
        }
        debug!(picked = picked.is_some(), "Pie closed");
        PieTransition::Released(picked)
    }

    /// Recomputes hovered slices from the pointer, opening or collapsing
    /// nested rings
    pub fn hover(&mut self, tree: &ShortcutTree, pointer: Vec2) {
        if !self.open || self.levels.is_empty() {
            return;
        }
        let distance = (pointer - self.center).length();
        if distance < DEAD_ZONE {
            self.levels.truncate(1);
            self.levels[0].hovered = None;
            return;
        }

        let ring = (((distance - DEAD_ZONE) / RING_WIDTH) as usize).min(self.levels.len() - 1);
        self.levels.truncate(ring + 1);
        let level = &mut self.levels[ring];
        level.hovered = slice_at(self.center, pointer, level.items.len());

        let Some(id) = level.hovered.map(|i| level.items[i]) else {
            return;
        };
        if self.levels.len() < MAX_LEVELS && opens_ring(tree, id) {
            self.levels.push(PieLevel {
                items: ring_items(tree, Some(id)),
                hovered: None,
            });
        }
    }

    fn hovered_leaf(&self, tree: &ShortcutTree) -> Option<NodeId> {
        let level = self.levels.last()?;
        let id = level.items.get(level.hovered?).copied()?;
        (!opens_ring(tree, id)).then_some(id)
    }

    /// Drops rings whose nodes were deleted
    pub fn retain_existing(&mut self, tree: &ShortcutTree) {
        let valid = self
            .levels
            .iter()
            .all(|level| level.items.iter().all(|&id| tree.contains(id)));
        if !valid {
            self.open = false;
            self.levels.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shortcut::{ShortcutConfig, ShortcutKind, ShortcutProps};

    const CENTER: Vec2 = Vec2 { x: 500.0, y: 500.0 };

    fn leaf(name: &str) -> ShortcutConfig {
        ShortcutConfig::leaf(ShortcutProps::command(name, format!("/{name}")))
    }

    fn sample() -> ShortcutTree {
        ShortcutTree::from_configs(&[
            leaf("a"),
            ShortcutConfig::leaf(ShortcutProps::named("", ShortcutKind::Spacer)),
            ShortcutConfig::category("cat", ShortcutMode::Default, vec![leaf("x"), leaf("y")]),
            leaf("b"),
        ])
    }

    #[test]
    fn test_slices_run_clockwise_from_top() {
        assert_eq!(slice_at(CENTER, CENTER + Vec2::new(0.0, -50.0), 4), Some(0));
        assert_eq!(slice_at(CENTER, CENTER + Vec2::new(50.0, 0.0), 4), Some(1));
        assert_eq!(slice_at(CENTER, CENTER + Vec2::new(0.0, 50.0), 4), Some(2));
        assert_eq!(slice_at(CENTER, CENTER + Vec2::new(-50.0, 0.0), 4), Some(3));
        assert_eq!(slice_at(CENTER, CENTER + Vec2::new(5.0, 5.0), 4), None);
        assert_eq!(slice_at(CENTER, CENTER + Vec2::new(50.0, 0.0), 0), None);
    }

    #[test]
    fn test_ring_skips_spacers_and_caps_items() {
        let tree = sample();
        assert_eq!(ring_items(&tree, None).len(), 3);

        let many: Vec<_> = (0..10).map(|i| leaf(&i.to_string())).collect();
        let tree = ShortcutTree::from_configs(&many);
        assert_eq!(ring_items(&tree, None).len(), MAX_ITEMS);
    }

    #[test]
    fn test_release_activates_hovered_leaf_and_delays_reopen() {
        let tree = sample();
        let mut pie = PieMenu::default();
        assert_eq!(pie.update(true, true, &tree, CENTER, None), PieTransition::Opened);
        // Three items: "a" up, "cat" lower right, "b" lower left
        pie.hover(&tree, CENTER + Vec2::new(0.0, -60.0));
        let a = tree.roots()[0];
        assert_eq!(pie.update(false, true, &tree, CENTER, None), PieTransition::Released(Some(a)));

        assert_eq!(pie.update(true, true, &tree, CENTER, None), PieTransition::None);
        assert!(!pie.is_open());
        for _ in 0..REOPEN_DELAY_FRAMES {
            pie.update(false, true, &tree, CENTER, None);
        }
        assert_eq!(pie.update(true, true, &tree, CENTER, None), PieTransition::Opened);
    }

    #[test]
    fn test_category_opens_next_ring() {
        let tree = sample();
        let mut pie = PieMenu::default();
        pie.update(true, true, &tree, CENTER, None);
        let cat_dir = slot_center(CENTER, 0, 1, 3) - CENTER;
        pie.hover(&tree, CENTER + cat_dir);
        assert_eq!(pie.levels().len(), 2);

        // Move outward into the second ring, towards the top slice "x"
        pie.hover(&tree, CENTER + Vec2::new(0.0, -(DEAD_ZONE + RING_WIDTH * 1.5)));
        let x = tree.child_list(Some(tree.roots()[2]))[0];
        assert_eq!(pie.update(false, true, &tree, CENTER, None), PieTransition::Released(Some(x)));
    }

    #[test]
    fn test_release_over_category_or_centre_picks_nothing() {
        let tree = sample();
        let mut pie = PieMenu::default();
        pie.update(true, true, &tree, CENTER, None);
        pie.hover(&tree, CENTER);
        assert_eq!(pie.update(false, true, &tree, CENTER, None), PieTransition::Released(None));
        // No activation, so no reopen delay
        assert_eq!(pie.update(true, true, &tree, CENTER, None), PieTransition::Opened);
    }

    #[test]
    fn test_claimed_frame_does_not_open() {
        let tree = sample();
        let mut pie = PieMenu::default();
        assert_eq!(pie.update(true, false, &tree, CENTER, None), PieTransition::None);
        assert!(!pie.is_open());
    }
}
