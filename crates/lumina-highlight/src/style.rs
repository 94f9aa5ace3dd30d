//! Style identifiers and inline styles.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The reserved style id for unstyled text.
pub const DEFAULT_STYLE_ID: i32 = 0;
/// The reserved style name mapped to [`DEFAULT_STYLE_ID`].
pub const DEFAULT_STYLE_NAME: &str = "default";

/// Bidirectional mapping between style names and numeric ids.
///
/// `"default" <-> 0` is registered at construction. One global mapping lives
/// on the engine for the engine's lifetime; in inline-style mode each compiled
/// rule additionally carries its own mapping.
#[derive(Debug)]
pub struct StyleMapping {
    name_to_id: HashMap<String, i32>,
    id_to_name: HashMap<i32, String>,
    next_id: i32,
}

impl Default for StyleMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleMapping {
    /// Create a mapping with only the default style registered.
    pub fn new() -> Self {
        let mut mapping = Self {
            name_to_id: HashMap::new(),
            id_to_name: HashMap::new(),
            next_id: 1,
        };
        mapping.register(DEFAULT_STYLE_NAME, DEFAULT_STYLE_ID);
        mapping
    }

    /// Register (or overwrite) the `name <-> id` pair.
    pub fn register(&mut self, name: &str, id: i32) {
        self.name_to_id.insert(name.to_string(), id);
        self.id_to_name.insert(id, name.to_string());
    }

    /// The id registered for `name`, or [`DEFAULT_STYLE_ID`] if unknown.
    pub fn id_of(&self, name: &str) -> i32 {
        self.name_to_id.get(name).copied().unwrap_or(DEFAULT_STYLE_ID)
    }

    /// The name registered for `id`, or [`DEFAULT_STYLE_NAME`] if unknown.
    pub fn name_of(&self, id: i32) -> &str {
        self.id_to_name
            .get(&id)
            .map(String::as_str)
            .unwrap_or(DEFAULT_STYLE_NAME)
    }

    /// The id for `name`, allocating a fresh unused id on first sight.
    ///
    /// Allocation skips ids taken by explicit [`register`](Self::register)
    /// calls, so host-assigned ids stay stable.
    pub fn get_or_create(&mut self, name: &str) -> i32 {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        while self.id_to_name.contains_key(&self.next_id) {
            self.next_id += 1;
        }
        let id = self.next_id;
        self.register(name, id);
        id
    }
}

/// A style defined inside a grammar with explicit colors and attributes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineStyle {
    /// Foreground color, ARGB.
    pub foreground: u32,
    /// Background color, ARGB.
    pub background: u32,
    /// Bold text attribute.
    pub is_bold: bool,
    /// Italic text attribute.
    pub is_italic: bool,
    /// Strikethrough text attribute.
    pub is_strikethrough: bool,
}

impl InlineStyle {
    /// Attribute bits for packed output: bit 0 bold, bit 1 italic, bit 2
    /// strikethrough.
    pub fn tag_bits(&self) -> i32 {
        (self.is_bold as i32) | (self.is_italic as i32) << 1 | (self.is_strikethrough as i32) << 2
    }
}

/// Parse `#RRGGBB` / `#AARRGGBB` (leading `#` optional) into ARGB.
///
/// Six-digit colors get an implied `FF` alpha. Malformed input parses as 0
/// instead of failing the compile.
pub(crate) fn parse_color(color: &str) -> u32 {
    let hex = color.strip_prefix('#').unwrap_or(color);
    let Ok(value) = u32::from_str_radix(hex, 16) else {
        return 0;
    };
    match hex.len() {
        6 => value | 0xFF00_0000,
        8 => value,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style_is_reserved() {
        let mapping = StyleMapping::new();
        assert_eq!(mapping.id_of("default"), 0);
        assert_eq!(mapping.name_of(0), "default");
        assert_eq!(mapping.name_of(42), "default");
    }

    #[test]
    fn test_get_or_create_skips_registered_ids() {
        let mut mapping = StyleMapping::new();
        mapping.register("keyword", 1);
        mapping.register("string", 2);
        assert_eq!(mapping.get_or_create("keyword"), 1);
        let fresh = mapping.get_or_create("comment");
        assert_eq!(fresh, 3);
        assert_eq!(mapping.get_or_create("comment"), fresh);
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#FF0000"), 0xFFFF_0000);
        assert_eq!(parse_color("#80FF0000"), 0x80FF_0000);
        assert_eq!(parse_color("0000FF"), 0xFF00_00FF);
        assert_eq!(parse_color("#xyz"), 0);
        assert_eq!(parse_color("#FFF"), 0);
    }

    #[test]
    fn test_tag_bits() {
        let style = InlineStyle {
            is_bold: true,
            is_strikethrough: true,
            ..Default::default()
        };
        assert_eq!(style.tag_bits(), 0b101);
    }
}
