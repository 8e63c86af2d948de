//! Arena-backed shortcut tree
//!
//! Nodes live in a slot map and refer to each other by [`NodeId`]; the parent
//! link is an index, never an owning reference. Each bar owns one tree.

use slotmap::{new_key_type, SlotMap};

use super::{ShortcutConfig, ShortcutKind, ShortcutProps};
use crate::hotkey::Hotkey;

new_key_type! {
    /// Stable handle of a shortcut node within its bar's tree
    pub struct NodeId;
}

#[derive(Debug, Clone)]
pub struct ShortcutNode {
    pub props: ShortcutProps,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Next line or child for Incremental/Random modes (transient)
    cursor: usize,
}

impl ShortcutNode {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Non-empty command lines, `\r` stripped
    pub fn lines(&self) -> Vec<&str> {
        self.props
            .command
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShortcutTree {
    nodes: SlotMap<NodeId, ShortcutNode>,
    roots: Vec<NodeId>,
}

impl ShortcutTree {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            roots: Vec::new(),
        }
    }

    pub fn from_configs(configs: &[ShortcutConfig]) -> Self {
        let mut tree = Self::new();
        for config in configs {
            tree.insert_config(None, usize::MAX, config);
        }
        tree
    }

    pub fn to_configs(&self) -> Vec<ShortcutConfig> {
        self.roots.iter().filter_map(|&id| self.subtree_config(id)).collect()
    }

    /// Deep copy of a node and its descendants as a persisted record
    pub fn subtree_config(&self, id: NodeId) -> Option<ShortcutConfig> {
        let node = self.nodes.get(id)?;
        Some(ShortcutConfig {
            props: node.props.clone(),
            children: node.children.iter().filter_map(|&c| self.subtree_config(c)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&ShortcutNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut ShortcutNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Child list of `parent`, or the root list for `None`
    pub fn child_list(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(id) => self.nodes.get(id).map_or(&[], |n| n.children.as_slice()),
            None => &self.roots,
        }
    }

    fn child_list_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            Some(id) => self.nodes.get_mut(id).map(|n| &mut n.children),
            None => Some(&mut self.roots),
        }
    }

    /// Inserts a record (with its subtree) under `parent` at `index`,
    /// clamped to the end of the list. Only categories accept children.
    pub fn insert_config(&mut self, parent: Option<NodeId>, index: usize, config: &ShortcutConfig) -> Option<NodeId> {
        if let Some(pid) = parent {
            if !self.nodes.get(pid)?.props.is_category() {
                return None;
            }
        }

        let id = self.nodes.insert(ShortcutNode {
            props: config.props.clone(),
            parent,
            children: Vec::new(),
            cursor: 0,
        });
        let list = self.child_list_mut(parent)?;
        let index = index.min(list.len());
        list.insert(index, id);

        if config.props.is_category() {
            for child in &config.children {
                self.insert_config(Some(id), usize::MAX, child);
            }
        }
        Some(id)
    }

    pub fn push(&mut self, parent: Option<NodeId>, props: ShortcutProps) -> Option<NodeId> {
        self.insert_config(parent, usize::MAX, &ShortcutConfig::leaf(props))
    }

    /// Detaches and drops a node with its subtree, returning it as a record
    pub fn remove(&mut self, id: NodeId) -> Option<ShortcutConfig> {
        let config = self.subtree_config(id)?;
        let parent = self.nodes.get(id)?.parent;
        if let Some(list) = self.child_list_mut(parent) {
            list.retain(|&c| c != id);
        }
        self.drop_subtree(id);
        Some(config)
    }

    fn drop_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.drop_subtree(child);
            }
        }
    }

    /// Moves a node under a new parent; refuses to move a node into itself
    /// or one of its descendants
    pub fn move_node(&mut self, id: NodeId, new_parent: Option<NodeId>, index: usize) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        if let Some(pid) = new_parent {
            let Some(target) = self.nodes.get(pid) else {
                return false;
            };
            if !target.props.is_category() || pid == id || self.ancestors(pid).any(|a| a == id) {
                return false;
            }
        }

        let old_parent = self.nodes[id].parent;
        if let Some(list) = self.child_list_mut(old_parent) {
            list.retain(|&c| c != id);
        }
        let Some(list) = self.child_list_mut(new_parent) else {
            return false;
        };
        let index = index.min(list.len());
        list.insert(index, id);
        self.nodes[id].parent = new_parent;
        true
    }

    /// Parent chain of `id`, nearest first, excluding `id` itself
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes.get(id).and_then(|n| n.parent), move |&p| {
            self.nodes.get(p).and_then(|n| n.parent)
        })
    }

    /// Changes a node's type; a node that stops being a category loses its children
    pub fn set_kind(&mut self, id: NodeId, kind: ShortcutKind) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        node.props.kind = kind;
        if kind != ShortcutKind::Category {
            let children = std::mem::take(&mut node.children);
            for child in children {
                self.drop_subtree(child);
            }
        }
    }

    /// Nodes with a bound hotkey, depth-first; spacers never register
    pub fn collect_hotkeys(&self, out: &mut Vec<(NodeId, Hotkey)>) {
        for &root in &self.roots {
            self.collect_from(root, out);
        }
    }

    fn collect_from(&self, id: NodeId, out: &mut Vec<(NodeId, Hotkey)>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.props.is_spacer() {
            return;
        }
        if !node.props.hotkey.is_none() {
            out.push((id, node.props.hotkey));
        }
        for &child in &node.children {
            self.collect_from(child, out);
        }
    }

    /// Cursor clamped into `[0, count)`; zero for empty lists
    pub fn clamped_cursor(&self, id: NodeId, count: usize) -> usize {
        let cursor = self.nodes.get(id).map_or(0, |n| n.cursor);
        cursor.min(count.saturating_sub(1))
    }

    pub fn set_cursor(&mut self, id: NodeId, cursor: usize) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.cursor = cursor;
        }
    }

    /// All node ids, depth-first in display order
    pub fn walk(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }
}
