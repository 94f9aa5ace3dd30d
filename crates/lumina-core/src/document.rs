//! Patchable line-oriented document.
//!
//! A [`Document`] stores its text as one [`DocumentLine`] per line, each
//! remembering the terminator that originally followed it. Keeping the
//! terminator per line (instead of normalizing to LF) lets [`Document::text`]
//! reproduce the input byte-for-byte after any sequence of patches.

use crate::position::{TextPosition, TextRange};
use crate::utf8;
use serde::{Deserialize, Serialize};

/// The terminator recorded after a line's text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEnding {
    /// No terminator (the last line of a document).
    #[default]
    None,
    /// Unix-style LF (`'\n'`).
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
    /// Classic Mac CR (`'\r'`).
    Cr,
}

impl LineEnding {
    /// Contribution of the terminator to the character stream.
    pub fn width(self) -> usize {
        match self {
            Self::None => 0,
            Self::Lf | Self::Cr => 1,
            Self::Crlf => 2,
        }
    }

    /// The terminator text itself.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// One line of a document: its text without the terminator, plus the
/// terminator that followed it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLine {
    /// Line text, excluding the terminator.
    pub text: String,
    /// Terminator recorded after the text.
    pub ending: LineEnding,
}

impl DocumentLine {
    /// Create a line from its text and terminator.
    pub fn new(text: impl Into<String>, ending: LineEnding) -> Self {
        Self {
            text: text.into(),
            ending,
        }
    }

    /// Number of characters in the line text, excluding the terminator.
    pub fn char_count(&self) -> usize {
        utf8::count_chars(&self.text)
    }
}

/// Split `text` into lines, preserving the terminator of each.
///
/// Recognizes `\r\n`, `\n` and lone `\r`. A trailing terminator produces a
/// final empty line with [`LineEnding::None`]; the empty string produces no
/// lines at all.
pub fn split_lines(text: &str) -> Vec<DocumentLine> {
    let mut lines = Vec::new();
    if text.is_empty() {
        return lines;
    }

    let bytes = text.as_bytes();
    let mut start = 0usize;
    let mut pos = 0usize;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\n' => {
                lines.push(DocumentLine::new(&text[start..pos], LineEnding::Lf));
                pos += 1;
                start = pos;
            }
            b'\r' => {
                let ending = if bytes.get(pos + 1) == Some(&b'\n') {
                    LineEnding::Crlf
                } else {
                    LineEnding::Cr
                };
                lines.push(DocumentLine::new(&text[start..pos], ending));
                pos += ending.width();
                start = pos;
            }
            _ => pos += 1,
        }
    }
    // The final segment, or an empty line when the text ends with a terminator.
    lines.push(DocumentLine::new(&text[start..], LineEnding::None));
    lines
}

/// An incrementally patchable text document identified by a URI.
#[derive(Debug, Clone)]
pub struct Document {
    uri: String,
    lines: Vec<DocumentLine>,
}

impl Document {
    /// Create a document from its URI and initial text.
    pub fn new(uri: impl Into<String>, text: &str) -> Self {
        Self {
            uri: uri.into(),
            lines: split_lines(text),
        }
    }

    /// The document's URI.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Replace the whole content, re-splitting into lines.
    pub fn set_text(&mut self, text: &str) {
        self.lines = split_lines(text);
    }

    /// The full text, re-joined with each line's recorded terminator.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push_str(line.ending.as_str());
        }
        out
    }

    /// Number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The line at `line`, if it exists.
    pub fn line(&self, line: usize) -> Option<&DocumentLine> {
        self.lines.get(line)
    }

    /// Characters on `line` including its terminator width; 0 when out of
    /// range.
    pub fn line_char_count(&self, line: usize) -> usize {
        self.lines
            .get(line)
            .map(|l| l.char_count() + l.ending.width())
            .unwrap_or(0)
    }

    /// Total characters in the document, terminators included.
    pub fn total_chars(&self) -> usize {
        self.lines
            .iter()
            .map(|l| l.char_count() + l.ending.width())
            .sum()
    }

    /// Absolute character index of the first character of `line`.
    pub fn char_index_of_line(&self, line: usize) -> usize {
        self.lines
            .iter()
            .take(line)
            .map(|l| l.char_count() + l.ending.width())
            .sum()
    }

    /// Convert an absolute character index to a position.
    ///
    /// Indices falling inside a multi-character terminator snap to the end of
    /// the line; indices past the end of the document return `None`.
    pub fn char_index_to_position(&self, char_index: usize) -> Option<TextPosition> {
        let mut current = 0usize;
        for (line, doc_line) in self.lines.iter().enumerate() {
            let chars = doc_line.char_count();
            if char_index <= current + chars {
                return Some(TextPosition::with_index(
                    line,
                    char_index - current,
                    char_index,
                ));
            }
            let next = current + chars + doc_line.ending.width();
            if char_index < next {
                return Some(TextPosition::with_index(line, chars, current + chars));
            }
            current = next;
        }
        None
    }

    /// Convert a position to its absolute character index, if valid.
    pub fn position_to_char_index(&self, pos: &TextPosition) -> Option<usize> {
        if !self.is_valid_position(pos) {
            return None;
        }
        Some(self.char_index_of_line(pos.line) + pos.column)
    }

    /// Whether `pos` addresses a character (or the terminator slot) of an
    /// existing line.
    pub fn is_valid_position(&self, pos: &TextPosition) -> bool {
        match self.lines.get(pos.line) {
            Some(line) => pos.column <= line.char_count() + line.ending.width(),
            None => false,
        }
    }

    /// Replace `range` with `new_text` and return the signed change in line
    /// count.
    ///
    /// `new_text` is split on `\r\n` / `\n` / `\r`. The text before
    /// `range.start` stays on the start line, the text after `range.end` is
    /// appended to the last inserted line, and that line keeps the original
    /// end line's terminator. A `range.start.line` past the last line appends
    /// to the document.
    pub fn patch(&mut self, range: &TextRange, new_text: &str) -> i32 {
        if range.start.line >= self.lines.len() {
            return self.append(new_text);
        }

        let mut segments = split_lines(new_text);
        if segments.is_empty() {
            segments.push(DocumentLine::default());
        }

        let start_line = range.start.line;
        let end_line = range.end.line.clamp(start_line, self.lines.len() - 1);
        let old_span = end_line - start_line + 1;

        let first = &self.lines[start_line];
        let prefix = first.text[..utf8::byte_of_char(&first.text, range.start.column)].to_string();
        let last = &self.lines[end_line];
        let end_column = if end_line == range.end.line {
            range.end.column
        } else {
            last.char_count()
        };
        let suffix = last.text[utf8::byte_of_char(&last.text, end_column)..].to_string();
        let last_ending = last.ending;

        let count = segments.len();
        let mut replacement = Vec::with_capacity(count);
        if count == 1 {
            let text = format!("{prefix}{}{suffix}", segments[0].text);
            replacement.push(DocumentLine::new(text, last_ending));
        } else {
            replacement.push(DocumentLine::new(
                format!("{prefix}{}", segments[0].text),
                segments[0].ending,
            ));
            replacement.extend(segments[1..count - 1].iter().cloned());
            replacement.push(DocumentLine::new(
                format!("{}{suffix}", segments[count - 1].text),
                last_ending,
            ));
        }

        self.lines.splice(start_line..=end_line, replacement);
        count as i32 - old_span as i32
    }

    /// Append `text` after the last line and return the line-count delta.
    pub fn append(&mut self, text: &str) -> i32 {
        let segments = split_lines(text);
        if segments.is_empty() {
            return 0;
        }
        if self.lines.is_empty() {
            let added = segments.len();
            self.lines = segments;
            return added as i32;
        }

        let added = segments.len() - 1;
        if let Some(last) = self.lines.last_mut() {
            last.text.push_str(&segments[0].text);
            if segments.len() > 1 {
                last.ending = segments[0].ending;
            }
        }
        self.lines.extend(segments.into_iter().skip(1));
        added as i32
    }

    /// Insert `text` at `position`.
    pub fn insert(&mut self, position: TextPosition, text: &str) -> i32 {
        self.patch(&TextRange::collapsed(position), text)
    }

    /// Delete the text covered by `range`.
    pub fn remove(&mut self, range: &TextRange) -> i32 {
        self.patch(range, "")
    }
}
