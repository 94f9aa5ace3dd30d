//! Incremental document analysis.
//!
//! A [`DocumentAnalyzer`] owns one [`Document`], its [`DocumentHighlight`],
//! and the per-line exiting-state vector. After an edit it re-analyzes the
//! minimum prefix of lines needed to reach a stable point: a line past the
//! edit whose exiting state *and* span list are unchanged from before the
//! edit.

use crate::analyzer::{LineAnalyzer, TextLineInfo};
use crate::highlight::{DocumentHighlight, HighlightConfig, LineHighlight};
use crate::model::SyntaxRule;
use lumina_core::{Document, TextRange};
use std::sync::Arc;

/// Stateful analyzer for one document.
#[derive(Debug)]
pub struct DocumentAnalyzer {
    document: Document,
    highlight: DocumentHighlight,
    line_analyzer: LineAnalyzer,
    config: HighlightConfig,
    /// `line_states[i]` is the exiting state of line `i`.
    line_states: Vec<i32>,
}

impl DocumentAnalyzer {
    /// Create an analyzer owning `document`, driven by `rule`.
    pub fn new(document: Document, rule: Arc<SyntaxRule>, config: HighlightConfig) -> Self {
        Self {
            document,
            highlight: DocumentHighlight::default(),
            line_analyzer: LineAnalyzer::new(rule, config),
            config,
            line_states: Vec::new(),
        }
    }

    /// The analyzed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The rule driving this analyzer.
    pub fn rule(&self) -> &Arc<SyntaxRule> {
        self.line_analyzer.rule()
    }

    /// The current highlight without re-analyzing.
    pub fn highlight(&self) -> &DocumentHighlight {
        &self.highlight
    }

    /// Exiting states per line, as of the last analysis.
    pub fn line_states(&self) -> &[i32] {
        &self.line_states
    }

    /// Analyze the whole document from scratch.
    pub fn analyze(&mut self) -> &DocumentHighlight {
        let line_count = self.document.line_count();
        self.line_states.clear();
        self.line_states.resize(line_count, SyntaxRule::DEFAULT_STATE_ID);
        self.highlight.reset();

        let mut state = SyntaxRule::DEFAULT_STATE_ID;
        let mut offset = 0usize;
        for line in 0..line_count {
            let Some(document_line) = self.document.line(line) else {
                break;
            };
            let result = self.line_analyzer.analyze_line(
                &document_line.text,
                TextLineInfo {
                    line,
                    start_state: state,
                    start_char_offset: offset,
                },
            );
            self.line_states[line] = result.end_state;
            state = result.end_state;
            offset += result.char_count + document_line.ending.width();
            self.highlight.add_line(result.highlight);
        }
        &self.highlight
    }

    /// Apply an edit and re-analyze forward until stable.
    pub fn analyze_incremental(&mut self, range: &TextRange, new_text: &str) -> &DocumentHighlight {
        if self.line_states.len() != self.document.line_count() {
            // Nothing analyzed yet (or the document was swapped out from
            // under us); an incremental pass has no baseline to diff against.
            self.document.patch(range, new_text);
            return self.analyze();
        }

        let old_line_count = self.document.line_count();
        let line_delta = self.document.patch(range, new_text);
        let line_count = self.document.line_count();
        if line_count == 0 {
            self.line_states.clear();
            self.highlight.reset();
            return &self.highlight;
        }

        self.resize_line_tracking(range, line_delta, line_count);

        // A start line past the end appends to the old last line, so that
        // line is the first one whose text can have changed.
        let change_start = range
            .start
            .line
            .min(old_line_count.saturating_sub(1))
            .min(line_count - 1);
        let change_end = range
            .end
            .line
            .saturating_add_signed(line_delta as isize)
            .min(line_count - 1);

        // Seed with the state entering the first re-analyzed line.
        self.line_states[change_start] = if change_start > 0 {
            self.line_states[change_start - 1]
        } else {
            SyntaxRule::DEFAULT_STATE_ID
        };

        let mut state = self.line_states[change_start];
        let mut offset = self.document.char_index_of_line(change_start);
        let mut line = change_start;
        while line < line_count {
            let Some(document_line) = self.document.line(line) else {
                break;
            };
            let old_state = self.line_states[line];
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

            // Past the edited range, an unchanged exiting state plus an
            // unchanged span list means every following line is unaffected.
            let stable = line > change_end
                && old_state == result.end_state
                && self.highlight.lines[line] == result.highlight;
            self.line_states[line] = result.end_state;
            self.highlight.lines[line] = result.highlight;
            line += 1;
            if stable {
                break;
            }
        }

        // Columns of later lines are untouched, but absolute indices shift
        // with the edit's character delta.
        if self.config.show_index {
            while line < line_count {
                for span in &mut self.highlight.lines[line].spans {
                    span.range.start.index = offset + span.range.start.column;
                    span.range.end.index = offset + span.range.end.column;
                }
                offset += self.document.line_char_count(line);
                line += 1;
            }
        }
        &self.highlight
    }

    /// Apply an edit addressed by absolute character indices.
    pub fn analyze_incremental_by_index(
        &mut self,
        start_index: usize,
        end_index: usize,
        new_text: &str,
    ) -> &DocumentHighlight {
        let total = self.document.total_chars();
        let start = self
            .document
            .char_index_to_position(start_index.min(total))
            .unwrap_or_default();
        let end = self
            .document
            .char_index_to_position(end_index.min(total))
            .unwrap_or_default();
        self.analyze_incremental(&TextRange::new(start, end), new_text)
    }

    /// Analyze a single line using the stored entering state, without
    /// touching the cached highlight.
    pub fn analyze_line(&self, line: usize) -> LineHighlight {
        let Some(document_line) = self.document.line(line) else {
            return LineHighlight::default();
        };
        let start_state = if line > 0 {
            self.line_states
                .get(line - 1)
                .copied()
                .unwrap_or(SyntaxRule::DEFAULT_STATE_ID)
        } else {
            SyntaxRule::DEFAULT_STATE_ID
        };
        let result = self.line_analyzer.analyze_line(
            &document_line.text,
            TextLineInfo {
                line,
                start_state,
                start_char_offset: self.document.char_index_of_line(line),
            },
        );
        result.highlight
    }

    /// Grow or shrink the per-line bookkeeping to match the patched document.
    fn resize_line_tracking(&mut self, range: &TextRange, line_delta: i32, line_count: usize) {
        if line_delta < 0 {
            let to = (range.end.line + 1).min(self.line_states.len());
            let from = to.saturating_sub(line_delta.unsigned_abs() as usize);
            self.line_states.drain(from..to);
            self.highlight.lines.drain(from..to);
        } else if line_delta > 0 {
            let at = (range.end.line + 1).min(self.line_states.len());
            let added = line_delta as usize;
            self.line_states
                .splice(at..at, std::iter::repeat_n(SyntaxRule::DEFAULT_STATE_ID, added));
            self.highlight
                .lines
                .splice(at..at, (0..added).map(|_| LineHighlight::default()));
        }
        // Keep the bookkeeping aligned with the document on clamped ranges.
        if self.line_states.len() != line_count {
            self.line_states
                .resize(line_count, SyntaxRule::DEFAULT_STATE_ID);
        }
        if self.highlight.lines.len() != line_count {
            self.highlight
                .lines
                .resize_with(line_count, LineHighlight::default);
        }
    }
}
