#![warn(missing_docs)]
//! `lumina-highlight` - Incremental regex-state-machine syntax highlighting.
//!
//! Grammars are declarative JSON: named states hold ordered token patterns
//! with per-capture-group styles, goto-state transitions, line-end
//! transitions, per-group sub-state recursion, and guarded cross-grammar
//! imports. The compiler merges every state's tokens into a single regex
//! alternation so tokenizing a position costs one backend search.
//!
//! Three analysis surfaces share the same line tokenizer:
//!
//! - [`TextAnalyzer`] - stateless batch analysis of a text
//! - [`LineAnalyzer`] - one line at a time, with caller-managed state
//! - [`DocumentAnalyzer`] - owns a [`lumina_core::Document`] and re-analyzes
//!   only the minimum prefix of lines after each edit
//!
//! [`HighlightEngine`] is the root object: it owns the style mapping, the
//! macro set for `#ifdef` import guards, every compiled rule, and a cache of
//! document analyzers keyed by URI.
//!
//! ```
//! use lumina_highlight::{HighlightConfig, HighlightEngine};
//!
//! let mut engine = HighlightEngine::new(HighlightConfig::default());
//! engine.register_style_name("kw", 1);
//! engine
//!     .compile_syntax_from_json(
//!         r#"{ "name": "demo", "fileExtensions": [".d"], "states": {
//!              "default": [ {"pattern": "\\bfn\\b", "style": "kw"} ] } }"#,
//!     )
//!     .unwrap();
//!
//! let analyzer = engine.create_analyzer_by_extension(".d").unwrap();
//! let highlight = analyzer.analyze("fn main");
//! assert_eq!(highlight.lines[0].spans[0].style_id, 1);
//! ```

mod backend;
mod compiler;
mod definition;
mod document_analyzer;
mod engine;
mod error;
mod highlight;
mod model;
mod style;

pub mod analyzer;
pub mod packing;

pub use analyzer::{LineAnalyzeResult, LineAnalyzer, TextAnalyzer, TextLineInfo};
pub use compiler::SyntaxRuleCompiler;
pub use document_analyzer::DocumentAnalyzer;
pub use engine::HighlightEngine;
pub use error::SyntaxError;
pub use highlight::{DocumentHighlight, HighlightConfig, LineHighlight, TokenSpan};
pub use model::{BlockPair, NO_STATE, StateRule, SyntaxRule, TokenRule};
pub use style::{DEFAULT_STYLE_ID, DEFAULT_STYLE_NAME, InlineStyle, StyleMapping};
