//! Category popups: which are open and where they anchor
//!
//! A bar keeps a chain of open category popups, outermost first. Opening a
//! category closes any sibling chain below its parent. Anchors are computed
//! once, when the popup first appears.

use crate::shortcut::{NodeId, ShortcutTree};
use crate::types::{Rect, Vec2};

/// Screen point and pivot (0..1 per axis) a popup is placed by
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupAnchor {
    pub pos: Vec2,
    pub pivot: Vec2,
}

/// Geometry of the button that opened a category
#[derive(Debug, Clone, Copy)]
pub struct AnchorRequest {
    /// Screen rect of the invoking button
    pub item: Rect,
    /// Rect of the container drawn at the moment of the click
    pub container: Rect,
    /// Fully revealed rect of the owning bar (first level only)
    pub revealed: Rect,
    /// Whether the invoking button sits inside another category popup
    pub sub_level: bool,
    /// Whether the container lays its items out vertically
    pub vertical: bool,
}

/// Whether a list of `count` items in `columns` columns reads as vertical
pub fn is_vertical(count: usize, columns: u32) -> bool {
    let cols = columns as usize;
    cols > 0 && count >= cols * (cols - 1) + 1
}

/// Computes a popup anchor.
///
/// First-level popups position against the bar's revealed rect so a bar
/// still sliding in does not drag its popup along. The flip direction
/// always follows the root category centre, so a nested chain fans out
/// consistently.
pub fn category_anchor(req: &AnchorRequest, root_center: Vec2, usable: Vec2, padding: Vec2) -> PopupAnchor {
    let (mut pos, min, max) = if req.sub_level {
        (req.item.center(), req.container.min, req.container.max)
    } else {
        let offset = req.item.center() - req.container.min;
        (req.revealed.min + offset, req.revealed.min, req.revealed.max)
    };

    let mut pivot = Vec2::ZERO;
    if req.vertical {
        pivot.y = 0.5;
        if root_center.x < usable.x / 2.0 {
            pivot.x = 0.0;
            pos.x = max.x - padding.x / 2.0;
        } else {
            pivot.x = 1.0;
            pos.x = min.x + padding.x / 2.0;
        }
    } else {
        pivot.x = 0.5;
        if root_center.y < usable.y / 2.0 {
            pivot.y = 0.0;
            pos.y = max.y - padding.y / 2.0;
        } else {
            pivot.y = 1.0;
            pos.y = min.y + padding.y / 2.0;
        }
    }
    PopupAnchor { pos, pivot }
}

#[derive(Debug, Clone)]
pub struct OpenPopup {
    pub node: NodeId,
    pub anchor: Option<PopupAnchor>,
    /// Rect the popup occupied last frame, once drawn
    pub rect: Option<Rect>,
}

#[derive(Debug, Clone, Default)]
pub struct PopupStack {
    open: Vec<OpenPopup>,
    root_center: Vec2,
}

impl PopupStack {
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    pub fn is_open(&self, id: NodeId) -> bool {
        self.open.iter().any(|p| p.node == id)
    }

    pub fn chain(&self) -> &[OpenPopup] {
        &self.open
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut OpenPopup> {
        self.open.iter_mut().find(|p| p.node == id)
    }

    /// Opens `id` if it is closed, keeping only the popups it nests in
    pub fn open(&mut self, tree: &ShortcutTree, id: NodeId) -> bool {
        if self.is_open(id) {
            return false;
        }
        let parent = tree.get(id).and_then(|n| n.parent());
        match parent.and_then(|p| self.open.iter().position(|o| o.node == p)) {
            Some(at) => self.open.truncate(at + 1),
            None => self.open.clear(),
        }
        self.open.push(OpenPopup {
            node: id,
            anchor: None,
            rect: None,
        });
        true
    }

    /// Toggles `id`; returns whether it is open afterwards
    pub fn toggle(&mut self, tree: &ShortcutTree, id: NodeId) -> bool {
        if self.is_open(id) {
            self.close_from(id);
            false
        } else {
            self.open(tree, id)
        }
    }

    /// Closes `id` and every popup nested inside it
    pub fn close_from(&mut self, id: NodeId) {
        if let Some(at) = self.open.iter().position(|p| p.node == id) {
            self.open.truncate(at);
        }
    }

    pub fn close_all(&mut self) {
        self.open.clear();
    }

    /// Drops popups whose nodes no longer exist
    pub fn retain_existing(&mut self, tree: &ShortcutTree) {
        if let Some(at) = self.open.iter().position(|p| !tree.contains(p.node)) {
            self.open.truncate(at);
        }
    }

    pub fn root_center(&self) -> Vec2 {
        self.root_center
    }

    /// Records where the outermost category button sits; nested popups
    /// flip based on this point
    pub fn set_root_center(&mut self, center: Vec2) {
        self.root_center = center;
    }

    /// Whether `p` lies inside any popup drawn last frame
    pub fn contains_point(&self, p: Vec2) -> bool {
        self.open.iter().filter_map(|o| o.rect).any(|r| r.contains(p))
    }
}
