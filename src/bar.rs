//! Bar reveal state machine
//!
//! Every frame a bar decides whether it wants to be revealed, then slides
//! (or snaps) between its hidden and revealed positions. Docked bars drop
//! the reveal request at the end of each frame so any collaborator (pointer,
//! hover, open popup, hotkey) has to renew it.

use serde::{Deserialize, Serialize};

use crate::config::BarProps;
use crate::constants::reveal::TWEEN_SPEED;
use crate::types::{Rect, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DockSide {
    Top,
    Right,
    #[default]
    Bottom,
    Left,
    Undocked,
}

impl DockSide {
    pub const ALL: [DockSide; 5] = [DockSide::Top, DockSide::Right, DockSide::Bottom, DockSide::Left, DockSide::Undocked];

    pub fn is_docked(self) -> bool {
        self != DockSide::Undocked
    }

    /// Left/right docked bars stack their buttons vertically by default
    pub fn is_side(self) -> bool {
        matches!(self, DockSide::Left | DockSide::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarAlign {
    Start,
    #[default]
    Center,
    End,
}

impl BarAlign {
    pub const ALL: [BarAlign; 3] = [BarAlign::Start, BarAlign::Center, BarAlign::End];

    fn pivot(self) -> f32 {
        match self {
            BarAlign::Start => 0.0,
            BarAlign::Center => 0.5,
            BarAlign::End => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    Slide,
    Immediate,
    #[default]
    Always,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Visibility::Slide, Visibility::Immediate, Visibility::Always];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Hidden,
    Revealing,
    Revealed,
    Hiding,
}

/// Pivot for a dock side and alignment; undocked bars pivot at their top-left
pub fn dock_pivot(dock: DockSide, align: BarAlign) -> Vec2 {
    let a = align.pivot();
    match dock {
        DockSide::Top => Vec2::new(a, 1.0),
        DockSide::Right => Vec2::new(0.0, a),
        DockSide::Bottom => Vec2::new(a, 0.0),
        DockSide::Left => Vec2::new(1.0, a),
        DockSide::Undocked => Vec2::ZERO,
    }
}

/// Runtime geometry and reveal bookkeeping of one bar
#[derive(Debug, Clone)]
pub struct BarState {
    dock: DockSide,
    visibility: Visibility,
    hint: bool,
    viewport: Vec2,
    padding: Vec2,
    size: Vec2,
    pivot: Vec2,
    hide_pos: Vec2,
    reveal_pos: Vec2,
    pos: Vec2,
    tween_start: Vec2,
    tween_progress: f32,
    reveal: bool,
    last_reveal: bool,
    mouse_revealed: bool,
    first_frame: bool,
}

impl BarState {
    pub fn new(props: &BarProps, viewport: Vec2, padding: Vec2) -> Self {
        let mut state = Self {
            dock: props.dock,
            visibility: props.visibility,
            hint: props.hint,
            viewport,
            padding,
            size: Vec2::ZERO,
            pivot: Vec2::ZERO,
            hide_pos: Vec2::ZERO,
            reveal_pos: Vec2::ZERO,
            pos: Vec2::ZERO,
            tween_start: Vec2::ZERO,
            tween_progress: 1.0,
            reveal: false,
            last_reveal: false,
            mouse_revealed: false,
            first_frame: true,
        };
        state.setup_pivot(props);
        state
    }

    pub fn is_docked(&self) -> bool {
        self.dock.is_docked()
    }

    pub fn pivot(&self) -> Vec2 {
        self.pivot
    }

    /// Current anchor point (the pivot sits here)
    pub fn position(&self) -> Vec2 {
        self.pos
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Screen rect at the current (possibly mid-slide) position
    pub fn rect(&self) -> Rect {
        Rect::from_pivot(self.pos, self.size, self.pivot)
    }

    /// Screen rect the bar occupies once fully revealed
    pub fn revealed_rect(&self) -> Rect {
        if self.is_docked() {
            Rect::from_pivot(self.reveal_pos, self.size, self.pivot)
        } else {
            self.rect()
        }
    }

    pub fn reveal(&mut self) {
        self.reveal = true;
    }

    pub fn hide(&mut self) {
        self.reveal = false;
    }

    /// Reveal immediately and skip the slide; used by hotkeys
    pub fn force_reveal(&mut self) {
        self.reveal = true;
        self.last_reveal = true;
        self.tween_progress = 1.0;
    }

    /// Size measured by the renderer; positions pick it up next frame
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    /// Recomputes pivot and positions, placing the bar at its hidden spot
    pub fn setup_pivot(&mut self, props: &BarProps) {
        self.dock = props.dock;
        self.visibility = props.visibility;
        self.hint = props.hint;
        self.pivot = dock_pivot(props.dock, props.align);
        self.setup_positions(props);
        self.pos = if self.is_docked() { self.hide_pos } else { self.undocked_pos(props) };
        self.tween_start = self.pos;
        self.tween_progress = 1.0;
    }

    fn undocked_pos(&self, props: &BarProps) -> Vec2 {
        props.position.scale(self.viewport).floor()
    }

    fn setup_positions(&mut self, props: &BarProps) {
        let offset = props.position.scale(self.viewport).floor();
        let win = self.viewport;
        let size = self.size;
        match props.dock {
            DockSide::Top => {
                self.hide_pos = Vec2::new(win.x * self.pivot.x + offset.x, 0.0);
                let hint = self.hint_pos(props.hint);
                self.reveal_pos = Vec2::new(self.hide_pos.x, (self.hide_pos.y + size.y + offset.y).max(hint.y + 1.0));
            }
            DockSide::Right => {
                self.hide_pos = Vec2::new(win.x, win.y * self.pivot.y + offset.y);
                let hint = self.hint_pos(props.hint);
                self.reveal_pos = Vec2::new((self.hide_pos.x - size.x + offset.x).min(hint.x - 1.0), self.hide_pos.y);
            }
            DockSide::Bottom => {
                self.hide_pos = Vec2::new(win.x * self.pivot.x + offset.x, win.y);
                let hint = self.hint_pos(props.hint);
                self.reveal_pos = Vec2::new(self.hide_pos.x, (self.hide_pos.y - size.y + offset.y).min(hint.y - 1.0));
            }
            DockSide::Left => {
                self.hide_pos = Vec2::new(0.0, win.y * self.pivot.y + offset.y);
                let hint = self.hint_pos(props.hint);
                self.reveal_pos = Vec2::new((self.hide_pos.x + size.x + offset.x).max(hint.x + 1.0), self.hide_pos.y);
            }
            DockSide::Undocked => {
                self.hide_pos = offset;
                self.reveal_pos = offset;
            }
        }
    }

    /// Hidden position, inset by twice the window padding when hinting
    fn hint_pos(&self, hint: bool) -> Vec2 {
        let mut pos = self.hide_pos;
        if hint {
            let inset = self.padding * 2.0;
            match self.dock {
                DockSide::Top => pos.y += inset.y,
                DockSide::Left => pos.x += inset.x,
                DockSide::Bottom => pos.y -= inset.y,
                DockSide::Right => pos.x -= inset.x,
                DockSide::Undocked => {}
            }
        }
        pos
    }

    /// Applies a viewport size change. Docked bars re-derive their geometry
    /// from the normalized position. Undocked bars keep their pixel position
    /// unless `reposition` is set. Returns whether `props` changed.
    pub fn check_resolution(&mut self, props: &mut BarProps, viewport: Vec2, reposition: bool) -> bool {
        if viewport == self.viewport {
            return false;
        }
        let old = self.viewport;
        let mut changed = false;
        if !props.dock.is_docked() && !reposition && old != Vec2::ZERO {
            props.position = props.position.scale(old).div_or_zero(viewport);
            changed = true;
        }
        self.viewport = viewport;
        self.setup_pivot(props);
        changed
    }

    /// Start-of-frame reveal decision from the pointer position
    pub fn begin_frame(&mut self, props: &BarProps, pointer: Option<Vec2>) {
        if props.dock != self.dock
            || props.visibility != self.visibility
            || dock_pivot(props.dock, props.align) != self.pivot
        {
            self.setup_pivot(props);
        }
        self.hint = props.hint;
        if !self.is_docked() {
            self.pos = self.undocked_pos(props);
        }

        if self.is_docked() || props.visibility == Visibility::Immediate {
            self.setup_positions(props);
            self.check_pointer(props, pointer);
        } else {
            self.reveal();
        }

        if props.editing {
            self.mouse_revealed = true;
            self.reveal();
        }
    }

    fn check_pointer(&mut self, props: &BarProps, pointer: Option<Vec2>) {
        if self.is_docked() && self.reveal {
            return;
        }

        if props.visibility == Visibility::Always || pointer.is_some_and(|p| self.reveal_area(props).contains(p)) {
            self.mouse_revealed = true;
            self.reveal();
        } else {
            self.hide();
        }
    }

    /// Hot zone that reveals the bar, shrunk away from the screen edge
    pub fn reveal_area(&self, props: &BarProps) -> Rect {
        let mut area = self.revealed_rect();
        let size = self.size;
        let hidden = 1.0 - props.reveal_area_scale;
        let hint = self.hint_pos(props.hint);
        match props.dock {
            DockSide::Top => {
                area.max.y = (area.max.y - size.y * hidden).max(area.min.y + 1.0).max(hint.y + 1.0);
            }
            DockSide::Left => {
                area.max.x = (area.max.x - size.x * hidden).max(area.min.x + 1.0).max(hint.x + 1.0);
            }
            DockSide::Bottom => {
                area.min.y = (area.min.y + size.y * hidden).min(area.max.y - 1.0).min(hint.y - 1.0);
            }
            DockSide::Right => {
                area.min.x = (area.min.x + size.x * hidden).min(area.max.x - 1.0).min(hint.x - 1.0);
            }
            DockSide::Undocked => {}
        }
        area
    }

    /// Whether the renderer should draw the bar this frame
    pub fn should_draw(&self) -> bool {
        if self.is_docked() {
            self.first_frame || self.reveal || self.pos != self.hide_pos
        } else {
            self.first_frame || self.reveal || self.last_reveal
        }
    }

    /// Keeps a pointer-revealed bar open while the pointer is over it
    pub fn note_hovered(&mut self, hovered: bool) {
        if self.mouse_revealed && hovered {
            self.reveal();
        }
    }

    /// End-of-frame position update
    pub fn end_frame(&mut self, dt: f32) {
        if !self.reveal {
            self.mouse_revealed = false;
        }

        if self.is_docked() {
            if self.visibility == Visibility::Slide {
                self.tween(dt);
            } else {
                self.last_reveal = self.reveal;
                self.pos = self.target();
            }
            self.hide();
        } else {
            self.last_reveal = self.reveal;
        }
        self.first_frame = false;
    }

    fn target(&self) -> Vec2 {
        if self.reveal { self.reveal_pos } else { self.hint_pos(self.hint) }
    }

    fn tween(&mut self, dt: f32) {
        if self.reveal != self.last_reveal {
            self.last_reveal = self.reveal;
            self.tween_start = self.pos;
            self.tween_progress = 0.0;
        }

        let target = self.target();
        if self.tween_progress >= 1.0 {
            self.pos = target;
            return;
        }

        self.tween_progress = (self.tween_progress + dt * TWEEN_SPEED).min(1.0);
        if self.tween_progress >= 1.0 {
            self.pos = target;
            return;
        }

        // Quartic ease-out
        let x = 1.0 - (self.tween_progress - 1.0).powi(4);
        let start = self.tween_start;
        let step = |s: f32, t: f32| {
            let v = s + (t - s) * x;
            if s <= t { v.clamp(s, t) } else { v.clamp(t, s) }
        };
        self.pos = Vec2::new(step(start.x, target.x), step(start.y, target.y));
    }

    pub fn reveal_state(&self) -> RevealState {
        if self.visibility == Visibility::Always {
            return RevealState::Revealed;
        }
        if !self.is_docked() {
            return if self.reveal || self.last_reveal { RevealState::Revealed } else { RevealState::Hidden };
        }
        let towards_reveal = self.last_reveal;
        let settled = self.pos == if towards_reveal { self.reveal_pos } else { self.hint_pos(self.hint) };
        match (towards_reveal, settled) {
            (true, true) => RevealState::Revealed,
            (true, false) => RevealState::Revealing,
            (false, true) => RevealState::Hidden,
            (false, false) => RevealState::Hiding,
        }
    }

    pub fn is_revealed(&self) -> bool {
        self.reveal_state() == RevealState::Revealed
    }

    /// Moves the bar by a pointer drag; returns whether the position changed
    pub fn drag(&mut self, props: &mut BarProps, delta: Vec2) -> bool {
        if props.locked || delta == Vec2::ZERO {
            return false;
        }
        if self.is_docked() {
            let moved = props.position + delta.div_or_zero(self.viewport);
            props.position = Vec2::new(moved.x.clamp(-1.0, 1.0), moved.y.clamp(-1.0, 1.0));
            self.setup_positions(props);
            self.force_reveal();
            self.pos = self.reveal_pos;
        } else {
            let moved = self.pos + delta;
            props.position = moved.div_or_zero(self.viewport);
            self.pos = self.undocked_pos(props);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Vec2 = Vec2 { x: 1000.0, y: 800.0 };
    const PADDING: Vec2 = Vec2 { x: 8.0, y: 8.0 };
    const SIZE: Vec2 = Vec2 { x: 200.0, y: 40.0 };

    fn docked(visibility: Visibility) -> (BarProps, BarState) {
        let props = BarProps {
            visibility,
            ..BarProps::named("test")
        };
        let mut state = BarState::new(&props, VIEWPORT, PADDING);
        state.set_size(SIZE);
        (props, state)
    }

    fn frame(state: &mut BarState, props: &BarProps, pointer: Option<Vec2>, dt: f32) {
        state.begin_frame(props, pointer);
        state.end_frame(dt);
    }

    #[test]
    fn test_always_visible_is_revealed_every_frame() {
        let (props, mut state) = docked(Visibility::Always);
        for _ in 0..3 {
            frame(&mut state, &props, None, 0.016);
            assert_eq!(state.position(), Vec2::new(500.0, 760.0));
            assert_eq!(state.reveal_state(), RevealState::Revealed);
        }
    }

    #[test]
    fn test_slide_is_monotone_and_lands_exactly() {
        let (props, mut state) = docked(Visibility::Slide);
        let pointer = Some(Vec2::new(500.0, 790.0));
        let mut last_y = 800.0;
        for _ in 0..4 {
            frame(&mut state, &props, pointer, 0.125);
            let y = state.position().y;
            assert!(y <= last_y);
            assert!((760.0..=800.0).contains(&y));
            last_y = y;
        }
        assert_eq!(state.position(), Vec2::new(500.0, 760.0));
        assert_eq!(state.reveal_state(), RevealState::Revealed);

        frame(&mut state, &props, None, 0.125);
        assert_eq!(state.reveal_state(), RevealState::Hiding);
        for _ in 0..4 {
            frame(&mut state, &props, None, 0.125);
        }
        assert_eq!(state.position(), Vec2::new(500.0, 800.0));
        assert_eq!(state.reveal_state(), RevealState::Hidden);
    }

    #[test]
    fn test_forced_reveal_snaps() {
        let (props, mut state) = docked(Visibility::Slide);
        frame(&mut state, &props, None, 0.016);
        assert_eq!(state.reveal_state(), RevealState::Hidden);

        state.force_reveal();
        frame(&mut state, &props, None, 0.016);
        assert_eq!(state.position(), Vec2::new(500.0, 760.0));
        assert!(state.is_revealed());
    }

    #[test]
    fn test_immediate_snaps_both_ways() {
        let (props, mut state) = docked(Visibility::Immediate);
        frame(&mut state, &props, Some(Vec2::new(450.0, 799.0)), 0.016);
        assert_eq!(state.position().y, 760.0);
        frame(&mut state, &props, Some(Vec2::new(10.0, 10.0)), 0.016);
        assert_eq!(state.position().y, 800.0);
    }

    #[test]
    fn test_hint_insets_hidden_position() {
        let (mut props, _) = docked(Visibility::Slide);
        props.hint = true;
        let mut state = BarState::new(&props, VIEWPORT, PADDING);
        state.set_size(SIZE);
        for _ in 0..3 {
            frame(&mut state, &props, None, 0.5);
        }
        assert_eq!(state.position(), Vec2::new(500.0, 784.0));
        assert_eq!(state.reveal_state(), RevealState::Hidden);
    }

    #[test]
    fn test_docked_resize_keeps_normalized_position() {
        let (mut props, mut state) = docked(Visibility::Always);
        props.position = Vec2::new(0.1, 0.0);
        frame(&mut state, &props, None, 0.016);
        let pivot = state.pivot();

        assert!(!state.check_resolution(&mut props, Vec2::new(2000.0, 1000.0), false));
        frame(&mut state, &props, None, 0.016);
        assert_eq!(props.position, Vec2::new(0.1, 0.0));
        assert_eq!(state.pivot(), pivot);
        assert_eq!(state.position(), Vec2::new(1200.0, 960.0));
    }

    #[test]
    fn test_undocked_resize_policy() {
        let props = BarProps {
            dock: DockSide::Undocked,
            position: Vec2::new(0.5, 0.5),
            ..BarProps::named("free")
        };

        let mut kept = props.clone();
        let mut state = BarState::new(&kept, VIEWPORT, PADDING);
        assert_eq!(state.position(), Vec2::new(500.0, 400.0));
        assert!(state.check_resolution(&mut kept, Vec2::new(2000.0, 1600.0), false));
        assert_eq!(kept.position, Vec2::new(0.25, 0.25));
        assert_eq!(state.position(), Vec2::new(500.0, 400.0));

        let mut moved = props.clone();
        let mut state = BarState::new(&moved, VIEWPORT, PADDING);
        assert!(!state.check_resolution(&mut moved, Vec2::new(2000.0, 1600.0), true));
        assert_eq!(state.position(), Vec2::new(1000.0, 800.0));
    }

    #[test]
    fn test_locked_bar_ignores_drag() {
        let (mut props, mut state) = docked(Visibility::Always);
        props.locked = true;
        assert!(!state.drag(&mut props, Vec2::new(10.0, 0.0)));
        props.locked = false;
        assert!(state.drag(&mut props, Vec2::new(100.0, 0.0)));
        assert_eq!(props.position, Vec2::new(0.1, 0.0));
    }

    #[test]
    fn test_dock_pivots() {
        assert_eq!(dock_pivot(DockSide::Top, BarAlign::Start), Vec2::new(0.0, 1.0));
        assert_eq!(dock_pivot(DockSide::Left, BarAlign::End), Vec2::new(1.0, 1.0));
        assert_eq!(dock_pivot(DockSide::Undocked, BarAlign::Center), Vec2::ZERO);
    }
}
