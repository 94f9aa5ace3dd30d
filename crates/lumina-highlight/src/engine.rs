//! Engine: compiles rules, owns the style mapping and macro set, and hands
//! out analyzers.

use crate::analyzer::TextAnalyzer;
use crate::compiler::SyntaxRuleCompiler;
use crate::document_analyzer::DocumentAnalyzer;
use crate::error::SyntaxError;
use crate::highlight::HighlightConfig;
use crate::model::SyntaxRule;
use crate::style::StyleMapping;
use lumina_core::Document;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Root object held by hosts.
///
/// Owns the global style mapping, the macro set consulted by `#ifdef` import
/// guards, every compiled rule, and one cached [`DocumentAnalyzer`] per
/// loaded document URI.
#[derive(Debug, Default)]
pub struct HighlightEngine {
    config: HighlightConfig,
    style_mapping: StyleMapping,
    macros: HashSet<String>,
    syntax_rules: Vec<Arc<SyntaxRule>>,
    analyzers: HashMap<String, DocumentAnalyzer>,
}

impl HighlightEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            style_mapping: StyleMapping::new(),
            macros: HashSet::new(),
            syntax_rules: Vec::new(),
            analyzers: HashMap::new(),
        }
    }

    /// The engine's configuration.
    pub fn config(&self) -> HighlightConfig {
        self.config
    }

    /// Register (or overwrite) a style name/id pair on the global mapping.
    ///
    /// Style ids stay stable across compilations within one engine.
    pub fn register_style_name(&mut self, name: &str, id: i32) {
        self.style_mapping.register(name, id);
    }

    /// The name registered for `id` on the global mapping.
    pub fn style_name(&self, id: i32) -> &str {
        self.style_mapping.name_of(id)
    }

    /// Define a macro consulted by `#ifdef` import guards.
    ///
    /// Macro changes affect only compilations performed afterwards.
    pub fn define_macro(&mut self, name: &str) {
        self.macros.insert(name.to_string());
    }

    /// Remove a macro.
    pub fn undefine_macro(&mut self, name: &str) {
        self.macros.remove(name);
    }

    /// Whether `name` is currently defined.
    pub fn is_macro_defined(&self, name: &str) -> bool {
        self.macros.contains(name)
    }

    /// Compile a rule from JSON text and add it to the engine.
    pub fn compile_syntax_from_json(&mut self, json: &str) -> Result<Arc<SyntaxRule>, SyntaxError> {
        let mut compiler = SyntaxRuleCompiler::new(
            &mut self.style_mapping,
            self.config.inline_style,
            &self.macros,
            &self.syntax_rules,
        );
        let rule = Arc::new(compiler.compile_from_json(json)?);
        self.syntax_rules.push(rule.clone());
        Ok(rule)
    }

    /// Compile a rule from a JSON file and add it to the engine.
    pub fn compile_syntax_from_file(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Arc<SyntaxRule>, SyntaxError> {
        let mut compiler = SyntaxRuleCompiler::new(
            &mut self.style_mapping,
            self.config.inline_style,
            &self.macros,
            &self.syntax_rules,
        );
        let rule = Arc::new(compiler.compile_from_file(path)?);
        self.syntax_rules.push(rule.clone());
        Ok(rule)
    }

    /// Look up a compiled rule by grammar name, in insertion order.
    pub fn syntax_rule_by_name(&self, name: &str) -> Option<Arc<SyntaxRule>> {
        self.syntax_rules
            .iter()
            .find(|rule| rule.name == name)
            .cloned()
    }

    /// Look up a compiled rule by file extension, with or without the
    /// leading dot. Matching is case-sensitive and exact.
    pub fn syntax_rule_by_extension(&self, extension: &str) -> Option<Arc<SyntaxRule>> {
        if extension.is_empty() {
            return None;
        }
        let normalized = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{extension}")
        };
        self.syntax_rules
            .iter()
            .find(|rule| rule.matches_extension(&normalized))
            .cloned()
    }

    /// A fresh stateless [`TextAnalyzer`] for the named grammar.
    pub fn create_analyzer_by_name(&self, name: &str) -> Option<TextAnalyzer> {
        self.syntax_rule_by_name(name)
            .map(|rule| TextAnalyzer::new(rule, self.config))
    }

    /// A fresh stateless [`TextAnalyzer`] for the grammar claiming
    /// `extension`.
    pub fn create_analyzer_by_extension(&self, extension: &str) -> Option<TextAnalyzer> {
        self.syntax_rule_by_extension(extension)
            .map(|rule| TextAnalyzer::new(rule, self.config))
    }

    /// Load a document, constructing (or returning the cached)
    /// [`DocumentAnalyzer`] for its URI.
    ///
    /// The rule is resolved from the URI's extension; returns `None` when no
    /// compiled rule claims it. Later calls with an already-loaded URI ignore
    /// the passed document and return the cached analyzer.
    pub fn load_document(&mut self, document: Document) -> Option<&mut DocumentAnalyzer> {
        let uri = document.uri().to_string();
        if !self.analyzers.contains_key(&uri) {
            let rule = self.syntax_rule_by_extension(uri_extension(&uri)?)?;
            self.analyzers
                .insert(uri.clone(), DocumentAnalyzer::new(document, rule, self.config));
        }
        self.analyzers.get_mut(&uri)
    }

    /// The cached analyzer for `uri`, if any.
    pub fn document_analyzer(&mut self, uri: &str) -> Option<&mut DocumentAnalyzer> {
        self.analyzers.get_mut(uri)
    }

    /// Evict the cached analyzer for `uri`.
    pub fn remove_document(&mut self, uri: &str) -> bool {
        self.analyzers.remove(uri).is_some()
    }
}

/// Extension (dot included) of the last path segment of `uri`.
fn uri_extension(uri: &str) -> Option<&str> {
    let file_name = uri.rsplit(['/', '\\']).next().unwrap_or(uri);
    let dot = file_name.rfind('.')?;
    if dot == 0 && !file_name[1..].contains('.') {
        // Dotfiles like `.gitignore` have no extension.
        return None;
    }
    Some(&file_name[dot..])
}
