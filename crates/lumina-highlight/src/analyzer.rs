//! Line-level tokenization.
//!
//! [`LineAnalyzer`] runs one line of text through a compiled grammar: a
//! single merged-regex search per position, capture-group attribution back to
//! the owning token rule, recursive sub-state expansion, and a zero-width
//! guard that bounds work on grammars with empty lookahead matches.
//!
//! [`TextAnalyzer`] is the stateless multi-line driver built on top of it.

use crate::backend;
use crate::highlight::{
    CaptureGroupMatch, DocumentHighlight, HighlightConfig, LineHighlight, MatchResult, TokenSpan,
};
use crate::model::{NO_STATE, SyntaxRule, TokenRule};
use lumina_core::{TextPosition, TextRange, split_lines, utf8};
use std::sync::Arc;

/// Metadata of the line being analyzed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLineInfo {
    /// Zero-based line number, used for span positions.
    pub line: usize,
    /// The state the analyzer enters the line with.
    pub start_state: i32,
    /// Absolute character index of the line's first character.
    pub start_char_offset: usize,
}

/// Output of analyzing one line.
#[derive(Debug, Default)]
pub struct LineAnalyzeResult {
    /// The line's spans.
    pub highlight: LineHighlight,
    /// The state after the line (line-end transition applied).
    pub end_state: i32,
    /// Characters in the line, terminator excluded.
    pub char_count: usize,
}

/// Single-line analyzer bound to one compiled rule.
#[derive(Debug)]
pub struct LineAnalyzer {
    rule: Arc<SyntaxRule>,
    config: HighlightConfig,
}

impl LineAnalyzer {
    /// Create an analyzer over `rule`.
    pub fn new(rule: Arc<SyntaxRule>, config: HighlightConfig) -> Self {
        Self { rule, config }
    }

    /// The rule driving this analyzer.
    pub fn rule(&self) -> &Arc<SyntaxRule> {
        &self.rule
    }

    /// The analyzer's configuration.
    pub fn config(&self) -> HighlightConfig {
        self.config
    }

    /// Tokenize one line and report the exiting state.
    pub fn analyze_line(&self, text: &str, info: TextLineInfo) -> LineAnalyzeResult {
        let mut result = LineAnalyzeResult::default();
        let char_count = utf8::count_chars(text);

        let mut pos = 0usize;
        let mut state = info.start_state;
        let mut had_zero_width = false;
        while pos < char_count {
            let matched = self.match_at(text, pos, state);
            if !matched.matched {
                // Unrecognizable input never fails; it just advances.
                pos += 1;
                had_zero_width = false;
                continue;
            }
            if matched.length == 0 {
                // One zero-width match per position is allowed so lookahead
                // tokens can switch state; a second in a row must advance.
                if had_zero_width {
                    pos += 1;
                    had_zero_width = false;
                    continue;
                }
                had_zero_width = true;
            } else {
                had_zero_width = false;
                self.emit_spans(&mut result.highlight, &info, state, &matched);
            }
            pos = matched.start + matched.length;
            if matched.goto_state >= 0 {
                state = matched.goto_state;
            }
        }

        if let Some(state_rule) = self.rule.state_rule(state)
            && state_rule.line_end_state >= 0
        {
            state = state_rule.line_end_state;
        }
        result.end_state = state;
        result.char_count = char_count;
        result
    }

    /// Search the current state's merged regex from `start_char_pos`.
    fn match_at(&self, text: &str, start_char_pos: usize, state: i32) -> MatchResult {
        let Some(state_rule) = self.rule.state_rule(state) else {
            return MatchResult::none();
        };
        let Some(regex) = &state_rule.regex else {
            return MatchResult::none();
        };

        let start_byte = utf8::byte_of_char(text, start_char_pos);
        let Some(hit) = backend::search(regex, text, start_byte) else {
            return MatchResult::none();
        };

        let match_start_char = utf8::char_of_byte(text, hit.start);
        let match_end_char = utf8::char_of_byte(text, hit.end);

        let mut result = MatchResult {
            matched: true,
            start: match_start_char,
            length: match_end_char - match_start_char,
            matched_text: text[hit.start..hit.end].to_string(),
            goto_state: NO_STATE,
            ..Default::default()
        };

        // Exactly one token's wrapping group participates in a successful
        // match of the merged alternation; that token owns the match.
        for token in &state_rule.token_rules {
            let wrapping = token.group_offset_start as usize;
            if hit.groups.get(wrapping).copied().flatten() != Some((hit.start, hit.end)) {
                continue;
            }
            result.style_id = token.group_style_id(0);
            result.goto_state = token.goto_state;
            self.collect_capture_groups(text, token, &hit, match_start_char, &mut result);
            break;
        }
        result
    }

    fn collect_capture_groups(
        &self,
        text: &str,
        token: &TokenRule,
        hit: &backend::SearchHit,
        match_start_char: usize,
        result: &mut MatchResult,
    ) {
        let whole_sub_state = token.group_sub_state(0);
        if whole_sub_state >= 0 {
            // The whole match re-analyzes under the sub-state; its spans
            // replace the match's own contribution.
            self.expand_sub_state(
                &text[hit.start..hit.end],
                whole_sub_state,
                match_start_char,
                &mut result.capture_groups,
            );
            return;
        }

        for group in 1..=token.group_count {
            let absolute = (token.group_offset_start + group) as usize;
            let Some(Some((group_start, group_end))) = hit.groups.get(absolute).copied() else {
                continue;
            };
            if group_start < hit.start || group_end > hit.end {
                continue;
            }
            let start_char = utf8::char_of_byte(text, group_start);
            let end_char = utf8::char_of_byte(text, group_end);
            let sub_state = token.group_sub_state(group);
            if sub_state >= 0 {
                self.expand_sub_state(
                    &text[group_start..group_end],
                    sub_state,
                    start_char,
                    &mut result.capture_groups,
                );
            } else {
                result.capture_groups.push(CaptureGroupMatch {
                    style_id: token.group_style_id(group),
                    start: start_char,
                    length: end_char - start_char,
                });
            }
        }
    }

    /// Re-run the match loop over a sub-string under `start_state`,
    /// flattening the produced spans into capture-group matches at
    /// `base_char_offset`. Default-styled output is dropped here so the
    /// enclosing match's surface shows through.
    fn expand_sub_state(
        &self,
        text: &str,
        start_state: i32,
        base_char_offset: usize,
        out: &mut Vec<CaptureGroupMatch>,
    ) {
        let char_count = utf8::count_chars(text);
        let mut pos = 0usize;
        let mut state = start_state;
        let mut had_zero_width = false;
        while pos < char_count {
            let matched = self.match_at(text, pos, state);
            if !matched.matched {
                pos += 1;
                had_zero_width = false;
                continue;
            }
            if matched.length == 0 {
                if had_zero_width {
                    pos += 1;
                    had_zero_width = false;
                    continue;
                }
                had_zero_width = true;
            } else {
                had_zero_width = false;
                if matched.capture_groups.is_empty() {
                    if matched.style_id != 0 {
                        out.push(CaptureGroupMatch {
                            style_id: matched.style_id,
                            start: base_char_offset + matched.start,
                            length: matched.length,
                        });
                    }
                } else {
                    for capture in &matched.capture_groups {
                        if capture.style_id != 0 {
                            out.push(CaptureGroupMatch {
                                style_id: capture.style_id,
                                start: base_char_offset + capture.start,
                                length: capture.length,
                            });
                        }
                    }
                }
            }
            pos = matched.start + matched.length;
            if matched.goto_state >= 0 {
                state = matched.goto_state;
            }
        }
    }

    fn emit_spans(
        &self,
        highlight: &mut LineHighlight,
        info: &TextLineInfo,
        state: i32,
        matched: &MatchResult,
    ) {
        if matched.capture_groups.is_empty() {
            let mut span = self.make_span(
                info,
                state,
                matched.start,
                matched.length,
                matched.style_id,
                matched.goto_state,
            );
            span.matched_text = matched.matched_text.clone();
            highlight.push_or_merge_span(span);
            return;
        }
        for capture in &matched.capture_groups {
            let span = self.make_span(
                info,
                state,
                capture.start,
                capture.length,
                capture.style_id,
                matched.goto_state,
            );
            highlight.push_or_merge_span(span);
        }
    }

    fn make_span(
        &self,
        info: &TextLineInfo,
        state: i32,
        start: usize,
        length: usize,
        style_id: i32,
        goto_state: i32,
    ) -> TokenSpan {
        let (start_index, end_index) = if self.config.show_index {
            (
                info.start_char_offset + start,
                info.start_char_offset + start + length,
            )
        } else {
            (0, 0)
        };
        let inline_style = if self.config.inline_style {
            self.rule.inline_style(style_id)
        } else {
            None
        };
        TokenSpan {
            range: TextRange::new(
                TextPosition::with_index(info.line, start, start_index),
                TextPosition::with_index(info.line, start + length, end_index),
            ),
            matched_text: String::new(),
            style_id,
            inline_style,
            state,
            goto_state,
        }
    }
}

/// Stateless multi-line analyzer.
///
/// Splits the input into lines, threads the exiting state of each line into
/// the next, and accumulates a [`DocumentHighlight`]. For incremental
/// re-analysis over a persistent document use
/// [`DocumentAnalyzer`](crate::DocumentAnalyzer).
#[derive(Debug)]
pub struct TextAnalyzer {
    line_analyzer: LineAnalyzer,
}

impl TextAnalyzer {
    /// Create an analyzer over `rule`.
    pub fn new(rule: Arc<SyntaxRule>, config: HighlightConfig) -> Self {
        Self {
            line_analyzer: LineAnalyzer::new(rule, config),
        }
    }

    /// The rule driving this analyzer.
    pub fn rule(&self) -> &Arc<SyntaxRule> {
        self.line_analyzer.rule()
    }

    /// Analyze a whole text from the default state.
    pub fn analyze(&self, text: &str) -> DocumentHighlight {
        let mut highlight = DocumentHighlight::default();
        let mut state = SyntaxRule::DEFAULT_STATE_ID;
        let mut offset = 0usize;
        for (line, document_line) in split_lines(text).into_iter().enumerate() {
            let result = self.line_analyzer.analyze_line(
                &document_line.text,
                TextLineInfo {
                    line,
                    start_state: state,
                    start_char_offset: offset,
                },
            );
            state = result.end_state;
            offset += result.char_count + document_line.ending.width();
            highlight.add_line(result.highlight);
        }
        highlight
    }

    /// Analyze a single line with caller-supplied entering state and offset.
    pub fn analyze_line(&self, text: &str, info: TextLineInfo) -> LineAnalyzeResult {
        self.line_analyzer.analyze_line(text, info)
    }
}
