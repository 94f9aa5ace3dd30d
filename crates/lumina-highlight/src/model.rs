//! Compiled grammar model.
//!
//! These are the immutable artifacts produced by the rule compiler and
//! consumed by the analyzers. Cross-references between states are plain ids
//! into [`SyntaxRule`]'s state table, so the model has no ownership cycles
//! and can be shared behind an `Arc` by any number of analyzers.

use crate::style::{DEFAULT_STYLE_ID, InlineStyle, StyleMapping};
use onig::Regex;
use std::collections::{HashMap, HashSet};

/// Sentinel for "no state transition".
pub const NO_STATE: i32 = -1;

/// One token within a state: a regex pattern with per-group styles, an
/// optional goto-state, and optional per-group sub-state recursion.
#[derive(Debug, Clone)]
pub struct TokenRule {
    /// The token's pattern after variable substitution.
    pub pattern: String,
    /// Style ids keyed by capture group; group 0 styles the whole match.
    pub style_ids: HashMap<i32, i32>,
    /// Sub-state ids keyed by capture group; a group with a sub-state is
    /// re-analyzed under that state instead of receiving its own span.
    pub sub_states: HashMap<i32, i32>,
    /// Captures inside `pattern`.
    pub group_count: i32,
    /// 1-based index of this token's wrapping group within the merged state
    /// regex.
    pub group_offset_start: i32,
    /// State to switch to after this token matches, or [`NO_STATE`].
    pub goto_state: i32,
}

impl Default for TokenRule {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            style_ids: HashMap::new(),
            sub_states: HashMap::new(),
            group_count: 0,
            group_offset_start: 0,
            goto_state: NO_STATE,
        }
    }
}

impl TokenRule {
    /// Style id for `group`, falling back to the whole-match style and then
    /// to the default style.
    pub fn group_style_id(&self, group: i32) -> i32 {
        self.style_ids
            .get(&group)
            .or_else(|| self.style_ids.get(&0))
            .copied()
            .unwrap_or(DEFAULT_STYLE_ID)
    }

    /// Sub-state id for `group`, or [`NO_STATE`].
    pub fn group_sub_state(&self, group: i32) -> i32 {
        self.sub_states.get(&group).copied().unwrap_or(NO_STATE)
    }
}

/// One grammar state: an ordered token list merged into a single alternation.
#[derive(Debug)]
pub struct StateRule {
    /// State name.
    pub name: String,
    /// Token rules, in definition order.
    pub token_rules: Vec<TokenRule>,
    /// The merged alternation `(t0)|(t1)|...|(tn)`.
    pub merged_pattern: String,
    /// Compiled merged pattern; `None` when the state has no tokens.
    pub regex: Option<Regex>,
    /// Total capture groups in the merged regex.
    pub group_count: i32,
    /// State to switch to after the line ends, or [`NO_STATE`].
    pub line_end_state: i32,
}

impl Default for StateRule {
    fn default() -> Self {
        Self {
            name: String::new(),
            token_rules: Vec::new(),
            merged_pattern: String::new(),
            regex: None,
            group_count: 0,
            line_end_state: NO_STATE,
        }
    }
}

/// A block delimiter pair stored for downstream block/indent rendering.
///
/// The tokenizer itself does not consume these.
#[derive(Debug, Clone, Default)]
pub struct BlockPair {
    /// Opening delimiter text (e.g. `{`).
    pub start: String,
    /// Closing delimiter text (e.g. `}`).
    pub end: String,
    /// Branch keywords belonging to the pair (e.g. `else`).
    pub branches: Vec<String>,
}

/// A compiled syntax definition.
///
/// Frozen once the compiler returns; analyzers share it by reference.
#[derive(Debug)]
pub struct SyntaxRule {
    /// Grammar name.
    pub name: String,
    /// File extensions claimed by this grammar, dot included.
    pub file_extensions: HashSet<String>,
    /// Fully realized variable table.
    pub variables: HashMap<String, String>,
    /// Inline styles keyed by style id (inline-style mode only).
    pub inline_styles: HashMap<i32, InlineStyle>,
    /// Per-rule style mapping (inline-style mode only).
    pub style_mapping: Option<StyleMapping>,
    /// Block delimiter pairs for downstream consumers.
    pub block_pairs: Vec<BlockPair>,

    state_rules: HashMap<i32, StateRule>,
    state_ids: HashMap<String, i32>,
    state_id_counter: i32,
}

impl SyntaxRule {
    /// Id of the reserved `default` state.
    pub const DEFAULT_STATE_ID: i32 = 0;
    /// Name of the reserved default state.
    pub const DEFAULT_STATE_NAME: &'static str = "default";

    /// Create an empty rule with only the default state name registered.
    pub(crate) fn new(name: impl Into<String>) -> Self {
        let mut state_ids = HashMap::new();
        state_ids.insert(Self::DEFAULT_STATE_NAME.to_string(), Self::DEFAULT_STATE_ID);
        Self {
            name: name.into(),
            file_extensions: HashSet::new(),
            variables: HashMap::new(),
            inline_styles: HashMap::new(),
            style_mapping: None,
            block_pairs: Vec::new(),
            state_rules: HashMap::new(),
            state_ids,
            state_id_counter: 1,
        }
    }

    /// Id of `state_name`, allocating the next sequential id on first sight.
    pub(crate) fn get_or_create_state_id(&mut self, state_name: &str) -> i32 {
        if let Some(&id) = self.state_ids.get(state_name) {
            return id;
        }
        let id = self.state_id_counter;
        self.state_id_counter += 1;
        self.state_ids.insert(state_name.to_string(), id);
        id
    }

    /// Register `state_name -> id` directly, keeping the allocator ahead of
    /// `id`. Used when importing offset state ids from another rule.
    pub(crate) fn register_state_id(&mut self, state_name: &str, id: i32) {
        self.state_ids.insert(state_name.to_string(), id);
        self.state_id_counter = self.state_id_counter.max(id + 1);
    }

    pub(crate) fn insert_state_rule(&mut self, id: i32, rule: StateRule) {
        self.state_rules.insert(id, rule);
    }

    pub(crate) fn state_rule_mut(&mut self, id: i32) -> Option<&mut StateRule> {
        self.state_rules.get_mut(&id)
    }

    /// Id registered for `state_name`, if any.
    pub fn state_id(&self, state_name: &str) -> Option<i32> {
        self.state_ids.get(state_name).copied()
    }

    /// Whether a state rule exists for `state_id`.
    pub fn contains_state(&self, state_id: i32) -> bool {
        self.state_rules.contains_key(&state_id)
    }

    /// The state rule for `state_id`, if any.
    pub fn state_rule(&self, state_id: i32) -> Option<&StateRule> {
        self.state_rules.get(&state_id)
    }

    /// State ids in ascending order.
    pub fn state_ids_ordered(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.state_rules.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The largest allocated state id, or the default id when no states
    /// exist.
    pub fn max_state_id(&self) -> i32 {
        self.state_ids
            .values()
            .copied()
            .max()
            .unwrap_or(Self::DEFAULT_STATE_ID)
    }

    /// The inline style registered for `style_id`, if any.
    pub fn inline_style(&self, style_id: i32) -> Option<InlineStyle> {
        self.inline_styles.get(&style_id).copied()
    }

    /// Whether this grammar claims `extension` (dot included, exact match).
    pub fn matches_extension(&self, extension: &str) -> bool {
        self.file_extensions.contains(extension)
    }
}
