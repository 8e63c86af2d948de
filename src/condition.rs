//! Condition gate for bar visibility
//!
//! A condition set is an ordered list of entries combined left to right.
//! Logic entries set the operator that joins the running result with the
//! next evaluated entry; adjacent non-logic entries are joined with AND.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConditionKind {
    Logic,
    #[default]
    ConditionFlag,
    Job,
    Role,
    Misc,
}

impl ConditionKind {
    pub const ALL: [ConditionKind; 5] = [
        ConditionKind::Logic,
        ConditionKind::ConditionFlag,
        ConditionKind::Job,
        ConditionKind::Role,
        ConditionKind::Misc,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    Or,
    Xor,
    Not,
    Equals,
}

impl LogicOp {
    pub fn from_index(index: i32) -> Option<LogicOp> {
        match index {
            0 => Some(LogicOp::Or),
            1 => Some(LogicOp::Xor),
            2 => Some(LogicOp::Not),
            3 => Some(LogicOp::Equals),
            _ => None,
        }
    }
}

/// Misc condition selectors
pub mod misc {
    /// A character is logged in
    pub const LOGGED_IN: i32 = 0;
    /// The logged in character id equals `arg`
    pub const CHARACTER_ID: i32 = 1;
    /// The logged in character name equals `text`
    pub const CHARACTER_NAME: i32 = 2;
}

/// Condition flag numbers reported by the host
pub mod flags {
    /// The game window has keyboard focus
    pub const GAME_FOCUSED: i32 = 0;
    /// The pointer is inside the game window
    pub const POINTER_IN_GAME: i32 = 1;
    /// The settings window is open
    pub const SETTINGS_OPEN: i32 = 2;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionEntry {
    #[serde(rename = "t")]
    pub kind: ConditionKind,
    #[serde(rename = "c")]
    pub condition: i32,
    #[serde(rename = "a")]
    pub arg: u64,
    #[serde(rename = "s", skip_serializing_if = "String::is_empty")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionSet {
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "c")]
    pub conditions: Vec<ConditionEntry>,
}

/// Read-only view of game state the conditions test against
pub trait GameState {
    fn condition_flag(&self, flag: i32) -> bool;
    fn job(&self) -> Option<u32>;
    fn role(&self) -> Option<u32>;
    fn logged_in(&self) -> bool;
    fn character_id(&self) -> Option<u64>;
    fn character_name(&self) -> Option<&str>;
}

fn check_entry(entry: &ConditionEntry, game: &dyn GameState) -> bool {
    match entry.kind {
        ConditionKind::Logic => true,
        ConditionKind::ConditionFlag => game.condition_flag(entry.condition),
        ConditionKind::Job => game.job() == Some(entry.condition as u32),
        ConditionKind::Role => game.role() == Some(entry.condition as u32),
        ConditionKind::Misc => match entry.condition {
            misc::LOGGED_IN => game.logged_in(),
            misc::CHARACTER_ID => game.character_id() == Some(entry.arg),
            misc::CHARACTER_NAME => game
                .character_name()
                .is_some_and(|name| name.eq_ignore_ascii_case(entry.text.trim())),
            _ => false,
        },
    }
}

impl ConditionSet {
    /// Evaluates the set; an empty set is true
    pub fn evaluate(&self, game: &dyn GameState) -> bool {
        let mut result: Option<bool> = None;
        let mut pending: Option<LogicOp> = None;

        for entry in &self.conditions {
            if entry.kind == ConditionKind::Logic {
                pending = LogicOp::from_index(entry.condition);
                continue;
            }

            let value = check_entry(entry, game);
            result = Some(match (result, pending.take()) {
                (None, Some(LogicOp::Not)) => !value,
                (None, _) => value,
                (Some(acc), None) => acc && value,
                (Some(acc), Some(LogicOp::Or)) => acc || value,
                (Some(acc), Some(LogicOp::Xor)) => acc ^ value,
                (Some(acc), Some(LogicOp::Not)) => acc && !value,
                (Some(acc), Some(LogicOp::Equals)) => acc == value,
            });
        }

        result.unwrap_or(true)
    }
}

/// Evaluates a set by index; unset (-1) or out-of-range indices are true
pub fn evaluate(sets: &[ConditionSet], index: i32, game: &dyn GameState) -> bool {
    usize::try_from(index)
        .ok()
        .and_then(|i| sets.get(i))
        .is_none_or(|set| set.evaluate(game))
}

/// Per-frame memo of set results
#[derive(Debug, Default)]
pub struct ConditionCache {
    results: Vec<Option<bool>>,
    enabled: bool,
}

impl ConditionCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            results: Vec::new(),
            enabled,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Forgets last frame's results
    pub fn begin_frame(&mut self, set_count: usize) {
        self.results.clear();
        self.results.resize(set_count, None);
    }

    pub fn check(&mut self, sets: &[ConditionSet], index: i32, game: &dyn GameState) -> bool {
        if !self.enabled {
            return evaluate(sets, index, game);
        }
        let Ok(i) = usize::try_from(index) else {
            return true;
        };
        if i >= sets.len() {
            return true;
        }
        if self.results.len() < sets.len() {
            self.results.resize(sets.len(), None);
        }
        *self.results[i].get_or_insert_with(|| sets[i].evaluate(game))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    pub(crate) struct FakeGame {
        pub flags: Vec<i32>,
        pub job: Option<u32>,
        pub logged_in: bool,
        pub character: Option<String>,
        pub reads: Cell<u32>,
    }

    impl GameState for FakeGame {
        fn condition_flag(&self, flag: i32) -> bool {
            self.reads.set(self.reads.get() + 1);
            self.flags.contains(&flag)
        }
        fn job(&self) -> Option<u32> {
            self.job
        }
        fn role(&self) -> Option<u32> {
            None
        }
        fn logged_in(&self) -> bool {
            self.logged_in
        }
        fn character_id(&self) -> Option<u64> {
            self.logged_in.then_some(42)
        }
        fn character_name(&self) -> Option<&str> {
            self.character.as_deref()
        }
    }

    fn flag(n: i32) -> ConditionEntry {
        ConditionEntry {
            kind: ConditionKind::ConditionFlag,
            condition: n,
            ..Default::default()
        }
    }

    fn logic(op: i32) -> ConditionEntry {
        ConditionEntry {
            kind: ConditionKind::Logic,
            condition: op,
            ..Default::default()
        }
    }

    fn set(conditions: Vec<ConditionEntry>) -> ConditionSet {
        ConditionSet {
            name: "test".to_string(),
            conditions,
        }
    }

    #[test]
    fn test_unset_or_out_of_range_is_true() {
        let game = FakeGame::default();
        let sets = vec![set(vec![flag(5)])];
        assert!(evaluate(&sets, -1, &game));
        assert!(evaluate(&sets, 1, &game));
        assert!(evaluate(&[], 0, &game));
        assert!(!evaluate(&sets, 0, &game));
    }

    #[test]
    fn test_implicit_and() {
        let game = FakeGame {
            flags: vec![1],
            ..Default::default()
        };
        assert!(!set(vec![flag(1), flag(2)]).evaluate(&game));
        assert!(set(vec![flag(1), flag(1)]).evaluate(&game));
    }

    #[test]
    fn test_operators_left_to_right() {
        let game = FakeGame {
            flags: vec![1],
            ..Default::default()
        };
        // 1 OR 2 -> true
        assert!(set(vec![flag(1), logic(0), flag(2)]).evaluate(&game));
        // 1 XOR 1 -> false
        assert!(!set(vec![flag(1), logic(1), flag(1)]).evaluate(&game));
        // 1 AND NOT 2 -> true
        assert!(set(vec![flag(1), logic(2), flag(2)]).evaluate(&game));
        // 2 EQUALS 3 -> true
        assert!(set(vec![flag(2), logic(3), flag(3)]).evaluate(&game));
        // (2 OR 1) AND 3 -> false, no precedence
        assert!(!set(vec![flag(2), logic(0), flag(1), flag(3)]).evaluate(&game));
        // leading NOT negates the first entry
        assert!(set(vec![logic(2), flag(2)]).evaluate(&game));
    }

    #[test]
    fn test_empty_and_logic_only_sets() {
        let game = FakeGame::default();
        assert!(set(vec![]).evaluate(&game));
        assert!(set(vec![logic(0)]).evaluate(&game));
    }

    #[test]
    fn test_misc_conditions() {
        let game = FakeGame {
            logged_in: true,
            character: Some("Some Pilot".to_string()),
            job: Some(3),
            ..Default::default()
        };
        let misc_entry = |condition, arg, text: &str| ConditionEntry {
            kind: ConditionKind::Misc,
            condition,
            arg,
            text: text.to_string(),
        };
        assert!(set(vec![misc_entry(misc::LOGGED_IN, 0, "")]).evaluate(&game));
        assert!(set(vec![misc_entry(misc::CHARACTER_ID, 42, "")]).evaluate(&game));
        assert!(!set(vec![misc_entry(misc::CHARACTER_ID, 7, "")]).evaluate(&game));
        assert!(set(vec![misc_entry(misc::CHARACTER_NAME, 0, "some pilot")]).evaluate(&game));
        let job = ConditionEntry {
            kind: ConditionKind::Job,
            condition: 3,
            ..Default::default()
        };
        assert!(set(vec![job]).evaluate(&game));
    }

    #[test]
    fn test_cache_evaluates_once_per_frame() {
        let game = FakeGame::default();
        let sets = vec![set(vec![flag(1)])];
        let mut cache = ConditionCache::new(true);
        cache.begin_frame(sets.len());
        cache.check(&sets, 0, &game);
        cache.check(&sets, 0, &game);
        assert_eq!(game.reads.get(), 1);

        cache.begin_frame(sets.len());
        cache.check(&sets, 0, &game);
        assert_eq!(game.reads.get(), 2);

        let mut uncached = ConditionCache::new(false);
        uncached.check(&sets, 0, &game);
        uncached.check(&sets, 0, &game);
        assert_eq!(game.reads.get(), 4);
    }
}
