//! Highlight results.

use crate::model::NO_STATE;
use crate::style::InlineStyle;
use lumina_core::TextRange;
use serde::Serialize;

/// Analyzer options shared by an engine and its analyzers.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightConfig {
    /// When set, spans carry absolute character indices in addition to
    /// line/column, and incremental analysis rewrites indices of untouched
    /// trailing lines.
    pub show_index: bool,
    /// When set, grammars define their own styles inline (`styles` array) and
    /// spans carry an [`InlineStyle`] instead of only an opaque style id.
    pub inline_style: bool,
}

/// One styled region of a single line.
#[derive(Debug, Clone, Serialize)]
pub struct TokenSpan {
    /// The span's range; start and end always share the span's line.
    pub range: TextRange,
    /// Matched text (whole-token spans only).
    pub matched_text: String,
    /// Style id of the span.
    pub style_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Inline style resolved from the grammar, in inline-style mode.
    pub inline_style: Option<InlineStyle>,
    /// State the analyzer was in when the span was matched.
    pub state: i32,
    /// State the token switches to, or -1.
    pub goto_state: i32,
}

impl Default for TokenSpan {
    fn default() -> Self {
        Self {
            range: TextRange::default(),
            matched_text: String::new(),
            style_id: 0,
            inline_style: None,
            state: 0,
            goto_state: NO_STATE,
        }
    }
}

impl PartialEq for TokenSpan {
    // Matched text and the inline style are derived data; spans are equal
    // when they cover the same range with the same style and transitions.
    fn eq(&self, other: &Self) -> bool {
        self.range == other.range
            && self.style_id == other.style_id
            && self.state == other.state
            && self.goto_state == other.goto_state
    }
}

impl Eq for TokenSpan {}

/// The ordered span sequence of one line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LineHighlight {
    /// Spans ordered by start column.
    pub spans: Vec<TokenSpan>,
}

impl LineHighlight {
    /// Append `span`, merging it into the previous span when both touch and
    /// share a style id.
    pub fn push_or_merge_span(&mut self, span: TokenSpan) {
        if let Some(last) = self.spans.last_mut()
            && last.range.end.column == span.range.start.column
            && last.style_id == span.style_id
        {
            last.range.end.column = span.range.end.column;
            last.range.end.index = span.range.end.index;
            return;
        }
        self.spans.push(span);
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Highlighting of a whole document, one entry per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentHighlight {
    /// Per-line highlights; always as many entries as the document has lines.
    pub lines: Vec<LineHighlight>,
}

impl DocumentHighlight {
    /// Append one line's highlight.
    pub fn add_line(&mut self, line: LineHighlight) {
        self.lines.push(line);
    }

    /// Total span count across all lines.
    pub fn span_count(&self) -> usize {
        self.lines.iter().map(|line| line.spans.len()).sum()
    }

    /// Drop all lines.
    pub fn reset(&mut self) {
        self.lines.clear();
    }

    /// Serialize to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A capture group's contribution to a match, in character positions local to
/// the analyzed text.
#[derive(Debug, Clone)]
pub(crate) struct CaptureGroupMatch {
    /// Resolved style id.
    pub style_id: i32,
    /// Start character position.
    pub start: usize,
    /// Length in characters.
    pub length: usize,
}

/// Outcome of one merged-regex search, in character positions.
#[derive(Debug, Default)]
pub(crate) struct MatchResult {
    pub matched: bool,
    pub start: usize,
    pub length: usize,
    pub style_id: i32,
    pub goto_state: i32,
    pub matched_text: String,
    pub capture_groups: Vec<CaptureGroupMatch>,
}

impl MatchResult {
    pub fn none() -> Self {
        Self {
            goto_state: NO_STATE,
            ..Default::default()
        }
    }
}
