//! Regex backend.
//!
//! A thin seam over Oniguruma: compile a pattern, count its capture groups,
//! and search from a byte offset reporting per-group byte spans. Everything
//! above this module works in characters; byte spans never escape the
//! analyzer.

use crate::error::SyntaxError;
use onig::{Regex, Region, SearchOptions};

/// Byte spans reported for one successful search.
#[derive(Debug)]
pub(crate) struct SearchHit {
    /// Match start, in bytes.
    pub start: usize,
    /// Match end (exclusive), in bytes.
    pub end: usize,
    /// Per-group byte spans, indexed by group number; `None` for groups that
    /// did not participate in the match. Index 0 is the whole match.
    pub groups: Vec<Option<(usize, usize)>>,
}

/// Compile `pattern` in UTF-8 mode with the backend's default syntax.
pub(crate) fn compile(pattern: &str) -> Result<Regex, SyntaxError> {
    Regex::new(pattern).map_err(|e| SyntaxError::PatternInvalid(format!("{pattern}: {e}")))
}

/// Number of capture groups in `pattern`; also validates the pattern.
pub(crate) fn count_groups(pattern: &str) -> Result<usize, SyntaxError> {
    Ok(compile(pattern)?.captures_len())
}

/// Search `text` from `from_byte`, returning the leftmost match.
pub(crate) fn search(regex: &Regex, text: &str, from_byte: usize) -> Option<SearchHit> {
    let mut region = Region::new();
    regex.search_with_options(
        text,
        from_byte,
        text.len(),
        SearchOptions::SEARCH_OPTION_NONE,
        Some(&mut region),
    )?;
    let (start, end) = region.pos(0)?;
    let groups = (0..region.len()).map(|i| region.pos(i)).collect();
    Some(SearchHit { start, end, groups })
}
