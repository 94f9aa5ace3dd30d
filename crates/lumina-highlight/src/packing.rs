//! Flat-buffer serialization of analysis results.
//!
//! Host-language bindings consume highlights as a dense `i32` buffer instead
//! of walking object graphs across the boundary. Layout:
//!
//! ```text
//! [0] span count
//! [1] stride (i32 slots per span): 7, or 9 in inline-style mode
//! -- line-level results insert two more header words: --
//! [2] exiting state id
//! [3] analyzed character count (terminator excluded)
//! -- then span count * stride slots: --
//! startLine, startColumn, startIndex, endLine, endColumn, endIndex,
//!   styleId                                  (stride 7)
//!   foreground, background, tagBits          (stride 9)
//! ```
//!
//! `tagBits`: bit 0 bold, bit 1 italic, bit 2 strikethrough.

use crate::analyzer::LineAnalyzeResult;
use crate::highlight::{DocumentHighlight, LineHighlight, TokenSpan};

/// Slots per span without inline styles.
pub const STRIDE: usize = 7;
/// Slots per span with inline styles.
pub const STRIDE_INLINE: usize = 9;

fn stride(inline_style: bool) -> usize {
    if inline_style { STRIDE_INLINE } else { STRIDE }
}

fn push_span(buffer: &mut Vec<i32>, span: &TokenSpan, inline_style: bool) {
    buffer.push(span.range.start.line as i32);
    buffer.push(span.range.start.column as i32);
    buffer.push(span.range.start.index as i32);
    buffer.push(span.range.end.line as i32);
    buffer.push(span.range.end.column as i32);
    buffer.push(span.range.end.index as i32);
    if inline_style {
        let style = span.inline_style.unwrap_or_default();
        buffer.push(style.foreground as i32);
        buffer.push(style.background as i32);
        buffer.push(style.tag_bits());
    } else {
        buffer.push(span.style_id);
    }
}

/// Pack a whole-document highlight: `[count, stride, spans...]`.
pub fn pack_document_highlight(highlight: &DocumentHighlight, inline_style: bool) -> Vec<i32> {
    let count = highlight.span_count();
    let stride = stride(inline_style);
    let mut buffer = Vec::with_capacity(2 + count * stride);
    buffer.push(count as i32);
    buffer.push(stride as i32);
    for line in &highlight.lines {
        for span in &line.spans {
            push_span(&mut buffer, span, inline_style);
        }
    }
    buffer
}

/// Pack one line's highlight: `[count, stride, spans...]`.
pub fn pack_line_highlight(highlight: &LineHighlight, inline_style: bool) -> Vec<i32> {
    let stride = stride(inline_style);
    let mut buffer = Vec::with_capacity(2 + highlight.spans.len() * stride);
    buffer.push(highlight.spans.len() as i32);
    buffer.push(stride as i32);
    for span in &highlight.spans {
        push_span(&mut buffer, span, inline_style);
    }
    buffer
}

/// Pack a line-level analysis result:
/// `[count, stride, endState, charCount, spans...]`.
pub fn pack_line_result(result: &LineAnalyzeResult, inline_style: bool) -> Vec<i32> {
    let stride = stride(inline_style);
    let mut buffer = Vec::with_capacity(4 + result.highlight.spans.len() * stride);
    buffer.push(result.highlight.spans.len() as i32);
    buffer.push(stride as i32);
    buffer.push(result.end_state);
    buffer.push(result.char_count as i32);
    for span in &result.highlight.spans {
        push_span(&mut buffer, span, inline_style);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::InlineStyle;
    use lumina_core::{TextPosition, TextRange};

    fn span(line: usize, start: usize, end: usize, style_id: i32) -> TokenSpan {
        TokenSpan {
            range: TextRange::new(
                TextPosition::with_index(line, start, start),
                TextPosition::with_index(line, end, end),
            ),
            style_id,
            ..Default::default()
        }
    }

    #[test]
    fn test_pack_style_id_layout() {
        let mut highlight = DocumentHighlight::default();
        highlight.add_line(LineHighlight {
            spans: vec![span(0, 0, 2, 1), span(0, 3, 5, 2)],
        });
        let buffer = pack_document_highlight(&highlight, false);
        assert_eq!(buffer.len(), 2 + 2 * STRIDE);
        assert_eq!(&buffer[..2], &[2, 7]);
        assert_eq!(&buffer[2..9], &[0, 0, 0, 0, 2, 2, 1]);
        assert_eq!(&buffer[9..16], &[0, 3, 3, 0, 5, 5, 2]);
    }

    #[test]
    fn test_pack_inline_style_layout() {
        let mut styled = span(0, 0, 1, 1);
        styled.inline_style = Some(InlineStyle {
            foreground: 0xFF11_2233,
            background: 0xFF00_0000,
            is_bold: true,
            is_italic: true,
            is_strikethrough: false,
        });
        let highlight = LineHighlight { spans: vec![styled] };
        let buffer = pack_line_highlight(&highlight, true);
        assert_eq!(&buffer[..2], &[1, 9]);
        assert_eq!(buffer[8], 0xFF11_2233u32 as i32);
        assert_eq!(buffer[9], 0xFF00_0000u32 as i32);
        assert_eq!(buffer[10], 0b011);
    }

    #[test]
    fn test_pack_line_result_header() {
        let result = LineAnalyzeResult {
            highlight: LineHighlight {
                spans: vec![span(3, 1, 4, 2)],
            },
            end_state: 5,
            char_count: 17,
        };
        let buffer = pack_line_result(&result, false);
        assert_eq!(&buffer[..4], &[1, 7, 5, 17]);
        assert_eq!(&buffer[4..11], &[3, 1, 1, 3, 4, 4, 2]);
    }
}
