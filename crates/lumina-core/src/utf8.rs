//! Char/byte conversion helpers.
//!
//! Columns and character indices in this workspace count Unicode scalar
//! values; the regex backend reports byte spans. These helpers convert
//! between the two on demand.

/// Number of characters in `text`.
pub fn count_chars(text: &str) -> usize {
    text.chars().count()
}

/// Byte offset of the character at `char_pos`, clamped to `text.len()`.
pub fn byte_of_char(text: &str, char_pos: usize) -> usize {
    text.char_indices()
        .nth(char_pos)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Character position of the boundary at `byte_pos`.
///
/// `byte_pos` must lie on a character boundary (regex backends in UTF-8 mode
/// only ever report boundary offsets); offsets past the end count the whole
/// text.
pub fn char_of_byte(text: &str, byte_pos: usize) -> usize {
    if byte_pos >= text.len() {
        return count_chars(text);
    }
    text[..byte_pos].chars().count()
}

/// The substring starting at character `start` spanning `len` characters.
pub fn substring(text: &str, start: usize, len: usize) -> &str {
    let begin = byte_of_char(text, start);
    let end = byte_of_char(text, start + len);
    &text[begin..end]
}
