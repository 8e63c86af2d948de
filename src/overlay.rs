//! Per-frame orchestration of bars, hotkeys and pies
//!
//! One frame runs, in order:
//! 1. [`Overlay::begin_frame`]: key tracker, condition gate, reveal update,
//!    and hand-off of last frame's hotkey activations to each bar
//! 2. the tree walk (renderer or test), which calls
//!    [`Overlay::consume_activations`] first and then reports clicks, hovers
//!    and measured sizes
//! 3. [`Overlay::end_frame`]: slide/snap, pie hotkeys, then the hotkey
//!    dispatcher, whose activations wait for the next frame's walk

use std::mem;

use tracing::{debug, info, trace, warn};

use crate::activation::{Activation, ActivationEngine, CommandSink, Trigger};
use crate::bar::BarState;
use crate::commands::{BarRef, CommandRouter, InternalCommand};
use crate::condition::{ConditionCache, ConditionSet, GameState};
use crate::config::{BarConfig, BarProps, Configuration, GlobalSettings};
use crate::constants::reveal::WINDOW_PADDING;
use crate::dispatcher::{Dispatched, HotkeyDispatcher};
use crate::hotkey::Hotkey;
use crate::import_export::{self, ImportError, Imported};
use crate::keystate::{KeySnapshot, KeyTracker};
use crate::pie::{PieMenu, PieTransition};
use crate::popup::{AnchorRequest, PopupStack, category_anchor};
use crate::shortcut::{NodeId, ShortcutConfig, ShortcutMode, ShortcutTree};
use crate::snapping::find_snap_position;
use crate::types::{Rect, Vec2};

/// Everything the host samples once per frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub dt: f32,
    pub viewport: Vec2,
    pub pointer: Option<Vec2>,
    pub keys: KeySnapshot,
    /// A text field or the hotkey capture widget owns the keyboard
    pub keyboard_captured: bool,
    pub game_focused: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutput {
    /// Keys a hotkey consumed this frame
    pub blocked_keys: Vec<u8>,
    /// Pointer position a pie asked for
    pub warp_pointer: Option<Vec2>,
}

/// One bar with its runtime state
pub struct BarRuntime {
    pub props: BarProps,
    pub tree: ShortcutTree,
    pub state: BarState,
    pub popups: PopupStack,
    pub pie: PieMenu,
    visible: bool,
    pending: Vec<NodeId>,
    /// Buttons under the pointer last frame and this frame
    hovered_before: Vec<NodeId>,
    hovered: Vec<NodeId>,
}

impl BarRuntime {
    fn new(config: &BarConfig, viewport: Vec2) -> Self {
        Self {
            props: config.props.clone(),
            tree: ShortcutTree::from_configs(&config.shortcuts),
            state: BarState::new(&config.props, viewport, WINDOW_PADDING.into()),
            popups: PopupStack::default(),
            pie: PieMenu::default(),
            visible: false,
            pending: Vec::new(),
            hovered_before: Vec::new(),
            hovered: Vec::new(),
        }
    }

    /// Passed the condition gate this frame
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn to_config(&self) -> BarConfig {
        BarConfig {
            props: self.props.clone(),
            shortcuts: self.tree.to_configs(),
        }
    }
}

pub struct Overlay {
    bars: Vec<BarRuntime>,
    condition_sets: Vec<ConditionSet>,
    global: GlobalSettings,
    version: u32,
    keys: KeyTracker,
    dispatcher: HotkeyDispatcher,
    conditions: ConditionCache,
    engine: ActivationEngine,
    queue: Vec<Dispatched>,
    viewport: Vec2,
    pointer: Option<Vec2>,
    dt: f32,
    elapsed: f32,
    dirty: bool,
    settings_requested: bool,
}

impl Overlay {
    pub fn new(config: Configuration, viewport: Vec2) -> Self {
        Self::with_engine(config, viewport, ActivationEngine::new())
    }

    pub fn with_engine(config: Configuration, viewport: Vec2, engine: ActivationEngine) -> Self {
        let Configuration {
            version,
            bars,
            condition_sets,
            global,
        } = config;
        info!(bars = bars.len(), condition_sets = condition_sets.len(), "Overlay ready");
        Self {
            bars: bars.iter().map(|b| BarRuntime::new(b, viewport)).collect(),
            condition_sets,
            keys: KeyTracker::new(global.short_hold_seconds),
            dispatcher: HotkeyDispatcher::new(global.hotkey_edge),
            conditions: ConditionCache::new(!global.no_condition_cache),
            global,
            version,
            engine,
            queue: Vec::new(),
            viewport,
            pointer: None,
            dt: 0.0,
            elapsed: 0.0,
            dirty: false,
            settings_requested: false,
        }
    }

    /// Snapshot of the persisted document
    pub fn configuration(&self) -> Configuration {
        Configuration {
            version: self.version,
            bars: self.bars.iter().map(BarRuntime::to_config).collect(),
            condition_sets: self.condition_sets.clone(),
            global: self.global.clone(),
        }
    }

    pub fn bars(&self) -> &[BarRuntime] {
        &self.bars
    }

    pub fn bar(&self, index: usize) -> Option<&BarRuntime> {
        self.bars.get(index)
    }

    /// Direct access for the settings editor; call [`Self::mark_dirty`] after edits
    pub fn bar_mut(&mut self, index: usize) -> Option<&mut BarRuntime> {
        self.bars.get_mut(index)
    }

    pub fn global(&self) -> &GlobalSettings {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut GlobalSettings {
        &mut self.global
    }

    /// Pushes edited global settings into the input pipeline
    pub fn apply_global(&mut self) {
        self.dispatcher.set_edge(self.global.hotkey_edge);
        self.keys.set_threshold(self.global.short_hold_seconds);
        self.conditions.set_enabled(!self.global.no_condition_cache);
        self.dirty = true;
    }

    pub fn condition_sets(&self) -> &[ConditionSet] {
        &self.condition_sets
    }

    pub fn condition_sets_mut(&mut self) -> &mut Vec<ConditionSet> {
        &mut self.condition_sets
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Seconds since start, drives color animations
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn keys(&self) -> &KeyTracker {
        &self.keys
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Whether anything changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        mem::take(&mut self.dirty)
    }

    /// Whether `/overlay config` ran since the last call
    pub fn take_settings_request(&mut self) -> bool {
        mem::take(&mut self.settings_requested)
    }

    pub fn begin_frame(&mut self, input: &FrameInput, game: &dyn GameState) {
        self.dt = input.dt;
        self.elapsed += input.dt;
        self.pointer = input.pointer;

        let enabled = !input.keyboard_captured && input.game_focused;
        self.dispatcher.set_enabled(enabled);
        if enabled {
            self.keys.update(&input.keys, input.dt);
        } else {
            self.keys.reset();
        }

        if input.viewport != self.viewport {
            debug!(width = input.viewport.x, height = input.viewport.y, "Viewport changed");
            self.viewport = input.viewport;
            let reposition = self.global.resize_repositions_bars;
            for bar in &mut self.bars {
                self.dirty |= bar.state.check_resolution(&mut bar.props, input.viewport, reposition);
            }
        }

        self.conditions.begin_frame(self.condition_sets.len());
        let show_all = self.global.always_display_bars || game.logged_in();
        for bar in &mut self.bars {
            bar.pending.clear();
            bar.hovered_before = mem::take(&mut bar.hovered);
            bar.visible = !bar.props.hidden
                && (show_all || bar.props.editing)
                && self.conditions.check(&self.condition_sets, bar.props.condition_set, game);
            if !bar.visible {
                bar.popups.close_all();
                bar.hovered_before.clear();
                continue;
            }
            bar.popups.retain_existing(&bar.tree);
            bar.pie.retain_existing(&bar.tree);
            bar.state.begin_frame(&bar.props, self.pointer);
            if !bar.popups.is_empty() || bar.pie.is_open() {
                bar.state.reveal();
            }
        }

        for dispatched in mem::take(&mut self.queue) {
            match self.bars.get_mut(dispatched.bar) {
                Some(bar) if bar.visible && bar.tree.contains(dispatched.node) => bar.pending.push(dispatched.node),
                _ => trace!(bar = dispatched.bar, "Dropping stale hotkey activation"),
            }
        }
    }

    /// Applies this frame's hotkey activations for one bar. Called once at
    /// the start of that bar's tree walk; unread activations expire with
    /// the frame.
    pub fn consume_activations(&mut self, bar: usize, sink: &mut dyn CommandSink) -> Vec<Activation> {
        let Some(runtime) = self.bars.get_mut(bar) else {
            return Vec::new();
        };
        let pending = mem::take(&mut runtime.pending);
        let mut results = Vec::with_capacity(pending.len());
        for node in pending {
            let Some(runtime) = self.bars.get_mut(bar) else {
                break;
            };
            let opens_popup = runtime
                .tree
                .get(node)
                .is_some_and(|n| n.props.is_category() && n.props.mode == ShortcutMode::Default);
            if opens_popup {
                // Open the whole chain so a nested category shows in place
                let mut chain: Vec<NodeId> = runtime.tree.ancestors(node).collect();
                chain.reverse();
                chain.push(node);
                for id in chain {
                    runtime.popups.open(&runtime.tree, id);
                }
                runtime.state.reveal();
                results.push(Activation::PopupOpened(node));
            } else {
                results.push(self.activate(bar, node, Trigger::Hotkey, sink));
            }
        }
        results
    }

    /// Resolves an activation and applies any `/overlay` commands it ran
    pub fn activate(&mut self, bar: usize, node: NodeId, trigger: Trigger, sink: &mut dyn CommandSink) -> Activation {
        let Some(runtime) = self.bars.get_mut(bar) else {
            return Activation::Ignored;
        };
        let mut router = CommandRouter::new(sink);
        let result = self
            .engine
            .activate(&mut runtime.tree, &mut runtime.popups, node, trigger, &mut router);
        for command in router.into_internal() {
            self.apply_internal(command);
        }
        result
    }

    pub fn click(&mut self, bar: usize, node: NodeId, sink: &mut dyn CommandSink) -> Activation {
        self.activate(bar, node, Trigger::Click, sink)
    }

    /// Pointer rests on a button. Categories that open on hover activate
    /// once when the pointer enters them, not on every frame it stays.
    pub fn hover(&mut self, bar: usize, node: NodeId, sink: &mut dyn CommandSink) -> Activation {
        let Some(runtime) = self.bars.get_mut(bar) else {
            return Activation::Ignored;
        };
        if !runtime.hovered.contains(&node) {
            runtime.hovered.push(node);
        }
        let entered = !runtime.hovered_before.contains(&node);
        let hover_opens = runtime
            .tree
            .get(node)
            .is_some_and(|n| n.props.is_category() && n.props.category_hover_open);
        if !entered || !hover_opens {
            return Activation::Ignored;
        }
        self.activate(bar, node, Trigger::Hover, sink)
    }

    fn find_bar(&self, bar: &BarRef) -> Option<usize> {
        match bar {
            BarRef::Index(i) => (*i < self.bars.len()).then_some(*i),
            BarRef::Name(name) => self.bars.iter().position(|b| b.props.name.eq_ignore_ascii_case(name)),
        }
    }

    fn apply_internal(&mut self, command: InternalCommand) {
        let (bar, hidden) = match &command {
            InternalCommand::Config => {
                self.settings_requested = true;
                return;
            }
            InternalCommand::Toggle(bar) => (bar, None),
            InternalCommand::Show(bar) => (bar, Some(false)),
            InternalCommand::Hide(bar) => (bar, Some(true)),
        };
        match self.find_bar(bar) {
            Some(index) => match hidden {
                Some(hidden) => self.set_bar_hidden(index, hidden),
                None => self.toggle_bar(index),
            },
            None => warn!(?bar, "No such bar"),
        }
    }

    /// A primary click landed at `pointer`; bars it missed drop their popups
    pub fn click_outside(&mut self, pointer: Vec2) {
        for bar in &mut self.bars {
            if !bar.popups.is_empty() && !bar.state.rect().contains(pointer) && !bar.popups.contains_point(pointer) {
                trace!(bar = %bar.props.name, "Click outside closes popups");
                bar.popups.close_all();
            }
        }
    }

    /// Keeps a pointer-revealed bar out while hovered
    pub fn note_bar_hovered(&mut self, bar: usize, hovered: bool) {
        if let Some(runtime) = self.bars.get_mut(bar) {
            runtime.state.note_hovered(hovered);
        }
    }

    pub fn set_bar_size(&mut self, bar: usize, size: Vec2) {
        if let Some(runtime) = self.bars.get_mut(bar) {
            runtime.state.set_size(size);
        }
    }

    /// Places a just-opened popup next to the button that opened it. A
    /// first-level popup also fixes the side the whole chain fans out to.
    pub fn anchor_popup(&mut self, bar: usize, node: NodeId, request: &AnchorRequest) {
        let viewport = self.viewport;
        let Some(runtime) = self.bars.get_mut(bar) else {
            return;
        };
        if !request.sub_level {
            runtime.popups.set_root_center(request.item.center());
        }
        let anchor = category_anchor(request, runtime.popups.root_center(), viewport, WINDOW_PADDING.into());
        if let Some(popup) = runtime.popups.get_mut(node) {
            popup.anchor = Some(anchor);
        }
    }

    pub fn set_popup_rect(&mut self, bar: usize, node: NodeId, rect: Rect) {
        if let Some(popup) = self.bars.get_mut(bar).and_then(|b| b.popups.get_mut(node)) {
            popup.rect = Some(rect);
        }
    }

    /// Drags a bar, snapping undocked ones to neighbours and screen edges
    pub fn drag_bar(&mut self, bar: usize, delta: Vec2) -> bool {
        let others: Vec<Rect> = self
            .bars
            .iter()
            .enumerate()
            .filter(|(i, b)| *i != bar && b.visible)
            .map(|(_, b)| b.state.rect())
            .chain(std::iter::once(Rect::from_min_size(Vec2::ZERO, self.viewport)))
            .collect();
        let threshold = self.global.snap_threshold;
        let Some(runtime) = self.bars.get_mut(bar) else {
            return false;
        };
        if !runtime.state.drag(&mut runtime.props, delta) {
            return false;
        }
        if !runtime.state.is_docked() {
            let rect = runtime.state.rect();
            if let Some(min) = find_snap_position(rect, &others, threshold) {
                runtime.state.drag(&mut runtime.props, min - rect.min);
            }
        }
        self.dirty = true;
        true
    }

    pub fn end_frame(&mut self, sink: &mut dyn CommandSink) -> FrameOutput {
        let mut output = FrameOutput::default();

        for bar in self.bars.iter_mut().filter(|b| b.visible) {
            if self.pointer.is_some_and(|p| bar.popups.contains_point(p)) {
                bar.state.reveal();
            }
            bar.state.end_frame(self.dt);
        }

        let picked = self.run_pies(&mut output);
        for (bar, node) in picked {
            self.activate(bar, node, Trigger::Click, sink);
        }

        for (index, bar) in self.bars.iter().enumerate() {
            if bar.visible {
                self.dispatcher.collect(index, &bar.tree);
            }
        }
        let outcome = self.dispatcher.dispatch(&self.keys);
        for dispatched in outcome.activated {
            if dispatched.reveals
                && let Some(bar) = self.bars.get_mut(dispatched.bar)
            {
                bar.state.force_reveal();
            }
            self.queue.push(dispatched);
        }
        if !outcome.blocked.is_empty() {
            trace!(keys = ?outcome.blocked, "Keys consumed by hotkeys");
        }
        output.blocked_keys = outcome.blocked;
        output
    }

    /// Pie hotkeys; the first held pie claims the frame
    fn run_pies(&mut self, output: &mut FrameOutput) -> Vec<(usize, NodeId)> {
        let screen_center = self.viewport * 0.5;
        let always_center = self.global.pies_always_center;
        let mut claimed = false;
        let mut picked = Vec::new();

        for (index, bar) in self.bars.iter_mut().enumerate() {
            if !bar.visible || bar.props.hotkey.is_none() {
                if bar.pie.is_open() {
                    bar.pie = PieMenu::default();
                }
                continue;
            }
            if let Some(pointer) = self.pointer {
                bar.pie.hover(&bar.tree, pointer);
            }

            let held = self.dispatcher.pie_held(&self.keys, bar.props.hotkey);
            let center = if always_center { screen_center } else { self.pointer.unwrap_or(screen_center) };
            let warp = always_center && self.global.pies_move_mouse;
            let saved = if warp { self.pointer } else { None };

            match bar.pie.update(held, !claimed, &bar.tree, center, saved) {
                PieTransition::Opened if warp => output.warp_pointer = Some(center),
                PieTransition::Released(node) => {
                    if let Some(node) = node {
                        picked.push((index, node));
                    }
                    if self.global.pies_return_mouse
                        && let Some(back) = bar.pie.saved_pointer()
                    {
                        output.warp_pointer = Some(back);
                    }
                }
                _ => {}
            }
            claimed |= bar.pie.is_open();
        }
        picked
    }

    /// Bound hotkeys of every visible bar, for the settings overview
    pub fn active_hotkeys(&self) -> Vec<(usize, NodeId, Hotkey)> {
        let mut out = Vec::new();
        for (index, bar) in self.bars.iter().enumerate().filter(|(_, b)| b.visible) {
            let mut found = Vec::new();
            bar.tree.collect_hotkeys(&mut found);
            out.extend(found.into_iter().map(|(node, hotkey)| (index, node, hotkey)));
        }
        out
    }

    /// Deletes a condition set; bars gated by it become ungated and later
    /// indices shift down
    pub fn remove_condition_set(&mut self, index: usize) -> Option<ConditionSet> {
        if index >= self.condition_sets.len() {
            return None;
        }
        let removed = self.condition_sets.remove(index);
        let index = index as i32;
        for bar in &mut self.bars {
            let set = &mut bar.props.condition_set;
            if *set == index {
                *set = -1;
            } else if *set > index {
                *set -= 1;
            }
        }
        info!(set = %removed.name, "Removed condition set");
        self.dirty = true;
        Some(removed)
    }

    // Bar operations

    pub fn add_bar(&mut self, config: BarConfig) -> usize {
        info!(bar = %config.props.name, "Adding bar");
        self.bars.push(BarRuntime::new(&config, self.viewport));
        self.dirty = true;
        self.bars.len() - 1
    }

    /// Removes a bar; returns its export string when `export_on_delete` is set
    pub fn remove_bar(&mut self, index: usize) -> Option<String> {
        if index >= self.bars.len() {
            return None;
        }
        let export = self.global.export_on_delete.then(|| self.export_bar(index, false)).flatten();
        let removed = self.bars.remove(index);
        info!(bar = %removed.props.name, exported = export.is_some(), "Removed bar");
        self.queue.clear();
        self.dirty = true;
        export
    }

    pub fn move_bar(&mut self, from: usize, to: usize) -> bool {
        if from >= self.bars.len() || to >= self.bars.len() || from == to {
            return false;
        }
        let bar = self.bars.remove(from);
        self.bars.insert(to, bar);
        self.queue.clear();
        self.dirty = true;
        true
    }

    pub fn set_bar_hidden(&mut self, index: usize, hidden: bool) {
        if let Some(bar) = self.bars.get_mut(index)
            && bar.props.hidden != hidden
        {
            debug!(bar = %bar.props.name, hidden, "Bar visibility changed");
            bar.props.hidden = hidden;
            self.dirty = true;
        }
    }

    pub fn toggle_bar(&mut self, index: usize) {
        if let Some(hidden) = self.bars.get(index).map(|b| b.props.hidden) {
            self.set_bar_hidden(index, !hidden);
        }
    }

    /// Sets the normalized position and re-derives geometry
    pub fn set_bar_position(&mut self, index: usize, position: Vec2) {
        if let Some(bar) = self.bars.get_mut(index) {
            bar.props.position = Vec2::new(position.x.clamp(-1.0, 1.0), position.y.clamp(-1.0, 1.0));
            bar.state.setup_pivot(&bar.props);
            self.dirty = true;
        }
    }

    pub fn export_bar(&self, index: usize, full: bool) -> Option<String> {
        let bar = self.bars.get(index)?;
        import_export::export_bar(&bar.to_config(), full)
            .inspect_err(|e| warn!(error = ?e, "Failed to export bar"))
            .ok()
    }

    pub fn export_shortcut(&self, bar: usize, node: NodeId, full: bool) -> Option<String> {
        let config = self.bars.get(bar)?.tree.subtree_config(node)?;
        import_export::export_shortcut(&config, full)
            .inspect_err(|e| warn!(error = ?e, "Failed to export shortcut"))
            .ok()
    }

    /// Imports a clipboard string as a new bar. A lone shortcut becomes a
    /// bar holding just that shortcut.
    pub fn import_bar(&mut self, text: &str) -> Result<usize, ImportError> {
        let config = match import_export::import(text)? {
            Imported::Bar(bar) => bar,
            Imported::Shortcut(shortcut) => BarConfig {
                props: BarProps::named(shortcut.props.name.clone()),
                shortcuts: vec![shortcut],
            },
        };
        Ok(self.add_bar(config))
    }

    /// Imports a clipboard string into a bar under `parent`. A bar payload
    /// contributes all of its shortcuts.
    pub fn import_into(&mut self, bar: usize, parent: Option<NodeId>, text: &str) -> Result<Vec<NodeId>, ImportError> {
        let shortcuts = match import_export::import(text)? {
            Imported::Bar(imported) => imported.shortcuts,
            Imported::Shortcut(shortcut) => vec![shortcut],
        };
        let mut added = Vec::new();
        for shortcut in &shortcuts {
            let index = self.bars.get(bar).map_or(0, |b| b.tree.child_list(parent).len());
            added.extend(self.add_shortcut(bar, parent, index, shortcut));
        }
        Ok(added)
    }

    // Shortcut operations

    pub fn add_shortcut(&mut self, bar: usize, parent: Option<NodeId>, index: usize, config: &ShortcutConfig) -> Option<NodeId> {
        let id = self.bars.get_mut(bar)?.tree.insert_config(parent, index, config)?;
        self.dirty = true;
        Some(id)
    }

    /// Removes a shortcut subtree; returns its export string when
    /// `export_on_delete` is set
    pub fn remove_shortcut(&mut self, bar: usize, node: NodeId) -> Option<String> {
        let export = self
            .global
            .export_on_delete
            .then(|| self.export_shortcut(bar, node, false))
            .flatten();
        let runtime = self.bars.get_mut(bar)?;
        runtime.tree.remove(node)?;
        runtime.popups.retain_existing(&runtime.tree);
        runtime.pie.retain_existing(&runtime.tree);
        self.dirty = true;
        export
    }

    pub fn move_shortcut(&mut self, bar: usize, node: NodeId, new_parent: Option<NodeId>, index: usize) -> bool {
        let Some(runtime) = self.bars.get_mut(bar) else {
            return false;
        };
        let moved = runtime.tree.move_node(node, new_parent, index);
        if moved {
            runtime.popups.retain_existing(&runtime.tree);
            self.dirty = true;
        }
        moved
    }
}
