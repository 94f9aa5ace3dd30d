//! Raw JSON shapes of a syntax definition.
//!
//! These mirror the grammar file structure one-to-one; the compiler turns
//! them into the model types in [`crate::model`].

use serde::Deserialize;
use serde_json::Value;

/// A single entry in a state's spec list.
#[derive(Debug, Clone)]
pub(crate) enum RawStateEntry {
    /// A token spec.
    Token(RawToken),
    /// A line-end directive, consumed by the containing state.
    LineEnd(RawLineEnd),
    /// An import request, consumed by the containing state.
    Import(RawImport),
}

impl<'de> Deserialize<'de> for RawStateEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let Value::Object(map) = &value else {
            return Err(serde::de::Error::custom("state entries must be JSON objects"));
        };

        if map.contains_key("onLineEndState") {
            let entry: RawLineEnd =
                serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            return Ok(Self::LineEnd(entry));
        }

        if map.contains_key("importSyntax") {
            let entry: RawImport =
                serde_json::from_value(value).map_err(serde::de::Error::custom)?;
            return Ok(Self::Import(entry));
        }

        let token: RawToken = serde_json::from_value(value).map_err(serde::de::Error::custom)?;
        Ok(Self::Token(token))
    }
}

/// A token spec as written in the grammar.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawToken {
    /// The token's regex, before variable substitution.
    pub pattern: String,

    #[serde(default)]
    /// State to switch to after the token matches.
    pub state: Option<String>,

    #[serde(default)]
    /// Whole-match style name.
    pub style: Option<String>,

    #[serde(default)]
    /// Alternating `[group, name, group, name, ...]` style list.
    pub styles: Option<Vec<Value>>,

    #[serde(default, rename = "subState")]
    /// Whole-match sub-state name.
    pub sub_state: Option<String>,

    #[serde(default, rename = "subStates")]
    /// Alternating `[group, name, group, name, ...]` sub-state list.
    pub sub_states: Option<Vec<Value>>,
}

/// `{"onLineEndState": "..."}` directive.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawLineEnd {
    #[serde(rename = "onLineEndState")]
    pub state: String,
}

/// `{"importSyntax": "...", "#ifdef": "..."}` directive.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawImport {
    #[serde(rename = "importSyntax")]
    pub syntax_name: String,

    #[serde(default, rename = "#ifdef")]
    /// Macro gating the import; absent means unconditional.
    pub ifdef: Option<String>,
}

/// An inline style spec from the top-level `styles` array.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawStyle {
    pub name: String,

    #[serde(default)]
    pub foreground: Option<String>,

    #[serde(default)]
    pub background: Option<String>,

    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// A `blockPairs` entry.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawBlockPair {
    pub start: String,
    pub end: String,

    #[serde(default)]
    pub branches: Vec<String>,
}
