//! JSON grammar compiler.
//!
//! Translates a declarative JSON syntax definition into the runtime model:
//! one merged regex per state plus a capture-group table mapping each
//! top-level alternative back to its originating token rule.
//!
//! Compilation phases, in order: name and extensions, inline styles (inline
//! mode only), variables, states, state-id resolution, import processing,
//! per-state pattern merging, block pairs. Errors abort the compile; no
//! partial rule is ever returned.

use crate::backend;
use crate::definition::{RawBlockPair, RawImport, RawStateEntry, RawStyle, RawToken};
use crate::error::SyntaxError;
use crate::model::{BlockPair, StateRule, SyntaxRule, TokenRule};
use crate::style::{InlineStyle, StyleMapping, parse_color};
use regex::Regex as RustRegex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Compiles JSON syntax definitions against an engine's style mapping, macro
/// set, and previously compiled rules (for `importSyntax`).
pub struct SyntaxRuleCompiler<'a> {
    style_mapping: &'a mut StyleMapping,
    inline_style: bool,
    macros: &'a HashSet<String>,
    existing_rules: &'a [Arc<SyntaxRule>],
}

/// A token spec with styles resolved but state references still by name.
#[derive(Debug, Default)]
struct ParsedToken {
    rule: TokenRule,
    goto_state: Option<String>,
    sub_states: HashMap<i32, String>,
}

/// A state spec before id resolution.
#[derive(Debug, Default)]
struct ParsedState {
    name: String,
    tokens: Vec<ParsedToken>,
    line_end_state: Option<String>,
    imports: Vec<RawImport>,
}

impl<'a> SyntaxRuleCompiler<'a> {
    /// Create a compiler borrowing the engine's shared compilation inputs.
    pub fn new(
        style_mapping: &'a mut StyleMapping,
        inline_style: bool,
        macros: &'a HashSet<String>,
        existing_rules: &'a [Arc<SyntaxRule>],
    ) -> Self {
        Self {
            style_mapping,
            inline_style,
            macros,
            existing_rules,
        }
    }

    /// Compile a syntax rule from JSON text.
    pub fn compile_from_json(&mut self, json: &str) -> Result<SyntaxRule, SyntaxError> {
        let root: Value =
            serde_json::from_str(json).map_err(|e| SyntaxError::JsonInvalid(e.to_string()))?;

        let name = required_string(&root, "name")?;
        let mut rule = SyntaxRule::new(name);
        parse_file_extensions(&mut rule, &root)?;

        let mut per_rule_mapping = if self.inline_style {
            let mut mapping = StyleMapping::new();
            parse_inline_styles(&mut rule, &root, &mut mapping)?;
            Some(mapping)
        } else {
            None
        };

        parse_variables(&mut rule, &root)?;
        let parsed_states = self.parse_states(&rule, &root, &mut per_rule_mapping)?;

        self.resolve_states(&mut rule, parsed_states)?;

        for state_id in rule.state_ids_ordered() {
            if let Some(state_rule) = rule.state_rule_mut(state_id) {
                compile_state_pattern(state_rule)?;
            }
        }

        parse_block_pairs(&mut rule, &root)?;
        rule.style_mapping = per_rule_mapping;
        Ok(rule)
    }

    /// Compile a syntax rule from a JSON file on disk.
    pub fn compile_from_file(&mut self, path: impl AsRef<Path>) -> Result<SyntaxRule, SyntaxError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(SyntaxError::FileNotExists(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|_| SyntaxError::FileInvalid(path.display().to_string()))?;
        if content.is_empty() {
            return Err(SyntaxError::FileInvalid(path.display().to_string()));
        }
        self.compile_from_json(&content)
    }

    fn parse_states(
        &mut self,
        rule: &SyntaxRule,
        root: &Value,
        per_rule_mapping: &mut Option<StyleMapping>,
    ) -> Result<Vec<ParsedState>, SyntaxError> {
        let Some(states_value) = root.get("states") else {
            return Err(SyntaxError::PropertyMissed("states".to_string()));
        };
        let Value::Object(states) = states_value else {
            return Err(SyntaxError::PropertyInvalid("states".to_string()));
        };

        // `states` keeps JSON object order, which fixes state-id allocation.
        let mut parsed = Vec::with_capacity(states.len());
        for (state_name, state_value) in states {
            let entries: Vec<RawStateEntry> = serde_json::from_value(state_value.clone())
                .map_err(|e| SyntaxError::PropertyInvalid(format!("states.{state_name}: {e}")))?;

            let mut state = ParsedState {
                name: state_name.clone(),
                ..Default::default()
            };
            for entry in entries {
                match entry {
                    RawStateEntry::LineEnd(line_end) => {
                        state.line_end_state = Some(line_end.state);
                    }
                    RawStateEntry::Import(import) => {
                        state.imports.push(import);
                    }
                    RawStateEntry::Token(token) => {
                        state
                            .tokens
                            .push(self.parse_token(rule, token, per_rule_mapping)?);
                    }
                }
            }
            parsed.push(state);
        }
        Ok(parsed)
    }

    fn parse_token(
        &mut self,
        rule: &SyntaxRule,
        raw: RawToken,
        per_rule_mapping: &mut Option<StyleMapping>,
    ) -> Result<ParsedToken, SyntaxError> {
        let mut token = ParsedToken {
            rule: TokenRule {
                pattern: substitute_variables(&raw.pattern, &rule.variables),
                ..Default::default()
            },
            goto_state: raw.state,
            ..Default::default()
        };

        if let Some(style) = &raw.style {
            let style_id = self.resolve_style_id(style, per_rule_mapping);
            token.rule.style_ids.insert(0, style_id);
        } else if let Some(styles) = &raw.styles {
            for (group, style) in parse_group_pairs(styles, "styles")? {
                let style_id = self.resolve_style_id(&style, per_rule_mapping);
                token.rule.style_ids.insert(group, style_id);
            }
        }

        if let Some(sub_state) = raw.sub_state {
            token.sub_states.insert(0, sub_state);
        } else if let Some(sub_states) = &raw.sub_states {
            for (group, sub_state) in parse_group_pairs(sub_states, "subStates")? {
                token.sub_states.insert(group, sub_state);
            }
        }

        // A token with only sub-states is structural; one with neither is an
        // authoring mistake.
        if token.rule.style_ids.is_empty() && token.sub_states.is_empty() {
            return Err(SyntaxError::PropertyInvalid(format!(
                "token '{}' has neither style/styles nor subState/subStates",
                token.rule.pattern
            )));
        }
        Ok(token)
    }

    fn resolve_style_id(&mut self, name: &str, per_rule_mapping: &mut Option<StyleMapping>) -> i32 {
        match per_rule_mapping {
            Some(mapping) => mapping.get_or_create(name),
            None => self.style_mapping.get_or_create(name),
        }
    }

    /// Allocate state ids in first-seen order, bind every name reference to
    /// an id, and splice in imports.
    fn resolve_states(
        &mut self,
        rule: &mut SyntaxRule,
        parsed_states: Vec<ParsedState>,
    ) -> Result<(), SyntaxError> {
        let mut with_ids = Vec::with_capacity(parsed_states.len());
        for state in parsed_states {
            let id = rule.get_or_create_state_id(&state.name);
            with_ids.push((id, state));
        }
        let defined: HashSet<i32> = with_ids.iter().map(|(id, _)| *id).collect();

        let resolve = |rule: &SyntaxRule, name: &str| -> Result<i32, SyntaxError> {
            rule.state_id(name)
                .filter(|id| defined.contains(id))
                .ok_or_else(|| SyntaxError::StateInvalid(name.to_string()))
        };

        let mut imports = Vec::new();
        for (state_id, parsed) in with_ids {
            let mut state_rule = StateRule {
                name: parsed.name,
                ..Default::default()
            };
            if let Some(line_end) = &parsed.line_end_state {
                state_rule.line_end_state = resolve(rule, line_end)?;
            }
            for token in parsed.tokens {
                let mut token_rule = token.rule;
                if let Some(goto) = &token.goto_state {
                    token_rule.goto_state = resolve(rule, goto)?;
                }
                for (group, sub_state) in &token.sub_states {
                    token_rule
                        .sub_states
                        .insert(*group, resolve(rule, sub_state)?);
                }
                state_rule.token_rules.push(token_rule);
            }
            rule.insert_state_rule(state_id, state_rule);
            for import in parsed.imports {
                imports.push((state_id, import));
            }
        }

        for (state_id, import) in imports {
            self.process_import(rule, state_id, &import)?;
        }
        Ok(())
    }

    fn process_import(
        &mut self,
        rule: &mut SyntaxRule,
        target_state_id: i32,
        import: &RawImport,
    ) -> Result<(), SyntaxError> {
        if let Some(macro_name) = &import.ifdef
            && !self.macros.contains(macro_name)
        {
            return Ok(());
        }

        let source = self
            .existing_rules
            .iter()
            .find(|r| r.name == import.syntax_name)
            .ok_or_else(|| SyntaxError::StateInvalid(import.syntax_name.clone()))?;

        let offset = rule.max_state_id() + 1;

        // The source's default-state tokens join the importing state, after
        // its own tokens.
        if let Some(default_state) = source.state_rule(SyntaxRule::DEFAULT_STATE_ID) {
            let imported: Vec<TokenRule> = default_state
                .token_rules
                .iter()
                .map(|token| rewrite_token(token, target_state_id, offset))
                .collect();
            if let Some(target) = rule.state_rule_mut(target_state_id) {
                target.token_rules.extend(imported);
            }
        }

        // Non-default source states come along with offset ids.
        for source_id in source.state_ids_ordered() {
            if source_id == SyntaxRule::DEFAULT_STATE_ID {
                continue;
            }
            let Some(source_state) = source.state_rule(source_id) else {
                continue;
            };
            let imported_name = format!("__imported_{}_{}", source.name, source_state.name);
            let imported_state = StateRule {
                name: imported_name.clone(),
                token_rules: source_state
                    .token_rules
                    .iter()
                    .map(|token| rewrite_token(token, target_state_id, offset))
                    .collect(),
                line_end_state: rewrite_state_ref(
                    source_state.line_end_state,
                    target_state_id,
                    offset,
                ),
                ..Default::default()
            };
            rule.register_state_id(&imported_name, source_id + offset);
            rule.insert_state_rule(source_id + offset, imported_state);
        }

        // Inline styles referenced by the imported tokens keep their source
        // ids; carry the definitions over so spans stay renderable.
        for (style_id, inline_style) in &source.inline_styles {
            rule.inline_styles.entry(*style_id).or_insert(*inline_style);
        }
        Ok(())
    }
}

/// Rewrite a state id from an imported rule: the source's default state maps
/// to the importing state, every other state shifts by `offset`.
fn rewrite_state_ref(state_id: i32, target_state_id: i32, offset: i32) -> i32 {
    match state_id {
        SyntaxRule::DEFAULT_STATE_ID => target_state_id,
        id if id > 0 => id + offset,
        id => id,
    }
}

fn rewrite_token(token: &TokenRule, target_state_id: i32, offset: i32) -> TokenRule {
    let mut rewritten = token.clone();
    rewritten.goto_state = rewrite_state_ref(token.goto_state, target_state_id, offset);
    for sub_state in rewritten.sub_states.values_mut() {
        *sub_state = rewrite_state_ref(*sub_state, target_state_id, offset);
    }
    rewritten
}

/// Merge a state's token patterns into `(t0)|(t1)|...|(tn)` and compile it.
fn compile_state_pattern(state_rule: &mut StateRule) -> Result<(), SyntaxError> {
    let mut merged = String::new();
    let mut total_group_count = 0i32;
    for (idx, token) in state_rule.token_rules.iter_mut().enumerate() {
        let group_count = backend::count_groups(&token.pattern)? as i32;
        token.group_count = group_count;
        token.group_offset_start = 1 + total_group_count;
        total_group_count += 1 + group_count;
        if idx > 0 {
            merged.push('|');
        }
        merged.push('(');
        merged.push_str(&token.pattern);
        merged.push(')');
    }
    state_rule.group_count = total_group_count;
    if !state_rule.token_rules.is_empty() {
        state_rule.regex = Some(backend::compile(&merged)?);
    }
    state_rule.merged_pattern = merged;
    Ok(())
}

fn required_string(root: &Value, key: &str) -> Result<String, SyntaxError> {
    let Some(value) = root.get(key) else {
        return Err(SyntaxError::PropertyMissed(key.to_string()));
    };
    match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(SyntaxError::PropertyInvalid(key.to_string())),
    }
}

fn parse_file_extensions(rule: &mut SyntaxRule, root: &Value) -> Result<(), SyntaxError> {
    if let Some(extensions) = root.get("fileExtensions") {
        let Value::Array(extensions) = extensions else {
            return Err(SyntaxError::PropertyInvalid("fileExtensions".to_string()));
        };
        for extension in extensions {
            match extension {
                Value::String(s) => {
                    rule.file_extensions.insert(s.clone());
                }
                _ => return Err(SyntaxError::PropertyInvalid("fileExtensions".to_string())),
            }
        }
        Ok(())
    } else if root.get("fileExtension").is_some() {
        rule.file_extensions
            .insert(required_string(root, "fileExtension")?);
        Ok(())
    } else {
        Err(SyntaxError::PropertyMissed(
            "fileExtensions or fileExtension".to_string(),
        ))
    }
}

fn parse_inline_styles(
    rule: &mut SyntaxRule,
    root: &Value,
    mapping: &mut StyleMapping,
) -> Result<(), SyntaxError> {
    let Some(styles_value) = root.get("styles") else {
        return Err(SyntaxError::PropertyMissed("styles".to_string()));
    };
    let styles: Vec<RawStyle> = serde_json::from_value(styles_value.clone())
        .map_err(|e| SyntaxError::PropertyInvalid(format!("styles: {e}")))?;

    for raw in styles {
        let mut style = InlineStyle::default();
        if let Some(foreground) = &raw.foreground {
            style.foreground = parse_color(foreground);
        }
        if let Some(background) = &raw.background {
            style.background = parse_color(background);
        }
        for tag in raw.tags.iter().flatten() {
            match tag.as_str() {
                "bold" => style.is_bold = true,
                "italic" => style.is_italic = true,
                "strikethrough" => style.is_strikethrough = true,
                _ => {}
            }
        }
        let style_id = mapping.get_or_create(&raw.name);
        rule.inline_styles.insert(style_id, style);
    }
    Ok(())
}

fn parse_variables(rule: &mut SyntaxRule, root: &Value) -> Result<(), SyntaxError> {
    let Some(variables_value) = root.get("variables") else {
        return Ok(());
    };
    let Value::Object(variables) = variables_value else {
        return Err(SyntaxError::PropertyInvalid("variables".to_string()));
    };

    let mut raw = HashMap::new();
    for (key, value) in variables {
        match value {
            Value::String(s) => {
                raw.insert(key.clone(), s.clone());
            }
            _ => return Err(SyntaxError::PropertyInvalid(key.clone())),
        }
    }
    rule.variables = realize_variables(&raw)?;
    Ok(())
}

fn parse_block_pairs(rule: &mut SyntaxRule, root: &Value) -> Result<(), SyntaxError> {
    let Some(pairs_value) = root.get("blockPairs") else {
        return Ok(());
    };
    let pairs: Vec<RawBlockPair> = serde_json::from_value(pairs_value.clone())
        .map_err(|e| SyntaxError::PropertyInvalid(format!("blockPairs: {e}")))?;
    rule.block_pairs = pairs
        .into_iter()
        .map(|pair| BlockPair {
            start: pair.start,
            end: pair.end,
            branches: pair.branches,
        })
        .collect();
    Ok(())
}

/// Parse an alternating `[group, name, group, name, ...]` list.
fn parse_group_pairs(values: &[Value], field: &str) -> Result<Vec<(i32, String)>, SyntaxError> {
    if values.len() % 2 != 0 {
        return Err(SyntaxError::PropertyInvalid(format!(
            "{field}: odd element count"
        )));
    }
    let mut pairs = Vec::with_capacity(values.len() / 2);
    for chunk in values.chunks_exact(2) {
        let group = chunk[0]
            .as_i64()
            .ok_or_else(|| SyntaxError::PropertyInvalid(format!("{field}: group index")))?;
        let name = chunk[1]
            .as_str()
            .ok_or_else(|| SyntaxError::PropertyInvalid(format!("{field}: name")))?;
        pairs.push((group as i32, name.to_string()));
    }
    Ok(pairs)
}

/// Realize the variable table: every known `${name}` reference expands to the
/// referenced variable's fully realized value; unknown references stay
/// literal (they may be regex text). Cycles are rejected.
fn realize_variables(
    variables: &HashMap<String, String>,
) -> Result<HashMap<String, String>, SyntaxError> {
    let mut realized = HashMap::new();
    let mut visiting = HashSet::new();
    for key in variables.keys() {
        realize_one_variable(key, variables, &mut realized, &mut visiting)?;
    }
    Ok(realized)
}

fn realize_one_variable(
    key: &str,
    variables: &HashMap<String, String>,
    realized: &mut HashMap<String, String>,
    visiting: &mut HashSet<String>,
) -> Result<String, SyntaxError> {
    if let Some(value) = realized.get(key) {
        return Ok(value.clone());
    }
    if !visiting.insert(key.to_string()) {
        return Err(SyntaxError::PropertyInvalid(format!(
            "variables: circular reference '{key}'"
        )));
    }

    let raw = variables.get(key).cloned().unwrap_or_default();
    let mut out = String::new();
    let mut last = 0usize;
    for (start, end, name) in variable_refs(&raw) {
        out.push_str(&raw[last..start]);
        if variables.contains_key(&name) {
            let expanded = realize_one_variable(&name, variables, realized, visiting)?;
            out.push_str(&expanded);
        } else {
            out.push_str(&raw[start..end]);
        }
        last = end;
    }
    out.push_str(&raw[last..]);

    visiting.remove(key);
    realized.insert(key.to_string(), out.clone());
    Ok(out)
}

/// Replace every known `${name}` reference in `text` with its realized value.
fn substitute_variables(text: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::new();
    let mut last = 0usize;
    for (start, end, name) in variable_refs(text) {
        out.push_str(&text[last..start]);
        match variables.get(&name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&text[start..end]),
        }
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

fn variable_refs(text: &str) -> Vec<(usize, usize, String)> {
    // Only ${[A-Za-z0-9_]+} is treated as a variable reference; everything
    // else stays unchanged.
    let re = RustRegex::new(r"\$\{([A-Za-z0-9_]+)\}").expect("valid variable regex");
    re.captures_iter(text)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = cap.get(1)?.as_str().to_string();
            Some((whole.start(), whole.end(), name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_realization_follows_chains() {
        let mut variables = HashMap::new();
        variables.insert("digit".to_string(), "[0-9]".to_string());
        variables.insert("number".to_string(), "${digit}+".to_string());
        variables.insert("pair".to_string(), "${number},${number}".to_string());
        let realized = realize_variables(&variables).unwrap();
        assert_eq!(realized["number"], "[0-9]+");
        assert_eq!(realized["pair"], "[0-9]+,[0-9]+");
    }

    #[test]
    fn test_variable_cycle_is_rejected() {
        let mut variables = HashMap::new();
        variables.insert("a".to_string(), "${b}".to_string());
        variables.insert("b".to_string(), "${a}".to_string());
        let err = realize_variables(&variables).unwrap_err();
        assert_eq!(err.code(), -2);
    }

    #[test]
    fn test_unknown_variable_reference_stays_literal() {
        let mut variables = HashMap::new();
        variables.insert("known".to_string(), "x".to_string());
        let out = substitute_variables("${known}${unknown}", &variables);
        assert_eq!(out, "x${unknown}");
    }

    #[test]
    fn test_group_pairs_shape() {
        let values = vec![
            Value::from(1),
            Value::from("keyword"),
            Value::from(2),
            Value::from("number"),
        ];
        let pairs = parse_group_pairs(&values, "styles").unwrap();
        assert_eq!(pairs, vec![(1, "keyword".into()), (2, "number".into())]);

        let odd = vec![Value::from(1)];
        assert!(parse_group_pairs(&odd, "styles").is_err());
    }
}
