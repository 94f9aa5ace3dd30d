use lumina_highlight::{HighlightConfig, HighlightEngine, SyntaxError, SyntaxRule};

fn engine() -> HighlightEngine {
    let mut engine = HighlightEngine::new(HighlightConfig::default());
    engine.register_style_name("keyword", 1);
    engine.register_style_name("string", 2);
    engine.register_style_name("number", 3);
    engine.register_style_name("comment", 4);
    engine
}

const MINI_SYNTAX: &str = r#"{
  "name": "mini",
  "fileExtensions": [".m"],
  "states": {
    "default": [
      {"pattern": "//[^\n]*", "style": "comment"},
      {"pattern": "/\\*", "state": "block", "style": "comment"},
      {"pattern": "\"[^\"]*\"", "style": "string"},
      {"pattern": "\\b(if|else|return)\\b", "style": "keyword"},
      {"pattern": "\\b[0-9]+\\b", "style": "number"}
    ],
    "block": [
      {"pattern": "\\*/", "state": "default", "style": "comment"},
      {"pattern": "[^*]+|\\*", "style": "comment"}
    ]
  }
}"#;

#[test]
fn test_compile_mini_grammar() {
    let mut engine = engine();
    let rule = engine.compile_syntax_from_json(MINI_SYNTAX).unwrap();

    assert_eq!(rule.name, "mini");
    assert!(rule.matches_extension(".m"));
    assert_eq!(rule.state_id("default"), Some(0));
    assert_eq!(rule.state_id("block"), Some(1));

    let default_state = rule.state_rule(0).unwrap();
    assert_eq!(default_state.token_rules.len(), 5);
    // Wrapping groups: each token adds 1 + its own capture count.
    let offsets: Vec<i32> = default_state
        .token_rules
        .iter()
        .map(|t| t.group_offset_start)
        .collect();
    assert_eq!(offsets, vec![1, 2, 3, 4, 6]);
    assert_eq!(default_state.group_count, 6);
    assert!(default_state.merged_pattern.starts_with("(//[^\n]*)|"));

    let block_state = rule.state_rule(1).unwrap();
    assert_eq!(block_state.token_rules[0].goto_state, 0);
    assert_eq!(rule.state_rule(0).unwrap().token_rules[1].goto_state, 1);
}

#[test]
fn test_single_file_extension_form() {
    let mut engine = engine();
    let rule = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":"t","states":{"default":[{"pattern":"x","style":"keyword"}]}}"#,
        )
        .unwrap();
    assert!(rule.matches_extension("t"));
}

#[test]
fn test_missing_name_is_property_missed() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(r#"{"fileExtensions":[".x"],"states":{}}"#)
        .unwrap_err();
    assert!(matches!(err, SyntaxError::PropertyMissed(_)));
    assert_eq!(err.code(), -1);
    assert_eq!(err.context(), "name");
}

#[test]
fn test_missing_extensions_is_property_missed() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(r#"{"name":"t","states":{}}"#)
        .unwrap_err();
    assert!(matches!(err, SyntaxError::PropertyMissed(_)));
}

#[test]
fn test_malformed_json_is_json_invalid() {
    let mut engine = engine();
    let err = engine.compile_syntax_from_json("{not json").unwrap_err();
    assert!(matches!(err, SyntaxError::JsonInvalid(_)));
    assert_eq!(err.code(), -5);
}

#[test]
fn test_bad_pattern_is_pattern_invalid() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{"default":[{"pattern":"(unclosed","style":"keyword"}]}}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::PatternInvalid(_)));
    assert!(err.context().contains("(unclosed"));
}

#[test]
fn test_unknown_goto_state_is_state_invalid() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{"default":[{"pattern":"x","state":"nowhere","style":"keyword"}]}}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::StateInvalid(_)));
    assert_eq!(err.context(), "nowhere");
}

#[test]
fn test_unknown_line_end_state_is_state_invalid() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{"default":[{"onLineEndState":"gone"},{"pattern":"x","style":"keyword"}]}}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::StateInvalid(_)));
}

#[test]
fn test_token_without_style_or_sub_state_is_rejected() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{"default":[{"pattern":"x"}]}}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::PropertyInvalid(_)));
}

#[test]
fn test_odd_styles_list_is_rejected() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{"default":[{"pattern":"(a)(b)","styles":[1,"keyword",2]}]}}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::PropertyInvalid(_)));
}

#[test]
fn test_capture_group_styles() {
    let mut engine = engine();
    let rule = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{"default":[
                {"pattern":"(\\w+)=(\\d+)","styles":[1,"keyword",2,"number"]}
            ]}}"#,
        )
        .unwrap();
    let token = &rule.state_rule(0).unwrap().token_rules[0];
    assert_eq!(token.group_count, 2);
    assert_eq!(token.group_style_id(1), 1);
    assert_eq!(token.group_style_id(2), 3);
    // Groups without an explicit style fall back to the whole-match style.
    assert_eq!(token.group_style_id(0), 0);
}

#[test]
fn test_variables_substitute_into_patterns() {
    let mut engine = engine();
    let rule = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t",
                "variables":{"digit":"[0-9]","number":"${digit}+"},
                "states":{"default":[{"pattern":"\\b${number}\\b","style":"number"}]}}"#,
        )
        .unwrap();
    let token = &rule.state_rule(0).unwrap().token_rules[0];
    assert_eq!(token.pattern, "\\b[0-9]+\\b");
    assert_eq!(rule.variables["number"], "[0-9]+");
}

#[test]
fn test_variable_cycle_is_rejected() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t",
                "variables":{"a":"${b}","b":"${a}"},
                "states":{"default":[{"pattern":"x","style":"keyword"}]}}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::PropertyInvalid(_)));
}

#[test]
fn test_sub_state_references_resolve() {
    let mut engine = engine();
    let rule = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{
                "default":[{"pattern":"<([^>]*)>","subStates":[1,"inner"],"style":"keyword"}],
                "inner":[{"pattern":"\\w+","style":"string"}]
            }}"#,
        )
        .unwrap();
    let token = &rule.state_rule(0).unwrap().token_rules[0];
    assert_eq!(token.group_sub_state(1), rule.state_id("inner").unwrap());
    assert_eq!(token.group_sub_state(2), -1);
}

#[test]
fn test_pure_sub_state_token_is_accepted() {
    let mut engine = engine();
    let rule = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{
                "default":[{"pattern":"\\[.*\\]","subState":"inner"}],
                "inner":[{"pattern":"\\d+","style":"number"}]
            }}"#,
        )
        .unwrap();
    let token = &rule.state_rule(0).unwrap().token_rules[0];
    assert!(token.style_ids.is_empty());
    assert_eq!(token.group_sub_state(0), 1);
}

#[test]
fn test_block_pairs_are_stored() {
    let mut engine = engine();
    let rule = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t",
                "states":{"default":[{"pattern":"x","style":"keyword"}]},
                "blockPairs":[{"start":"{","end":"}"},{"start":"if","end":"end","branches":["else"]}]}"#,
        )
        .unwrap();
    assert_eq!(rule.block_pairs.len(), 2);
    assert_eq!(rule.block_pairs[1].branches, vec!["else"]);
}

#[test]
fn test_inline_styles_require_styles_array() {
    let mut engine = HighlightEngine::new(HighlightConfig {
        inline_style: true,
        ..Default::default()
    });
    let err = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{"default":[{"pattern":"x","style":"kw"}]}}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::PropertyMissed(_)));
    assert_eq!(err.context(), "styles");
}

#[test]
fn test_inline_styles_parse_colors_and_tags() {
    let mut engine = HighlightEngine::new(HighlightConfig {
        inline_style: true,
        ..Default::default()
    });
    let rule = engine
        .compile_syntax_from_json(
            r##"{"name":"t","fileExtension":".t",
                "styles":[
                    {"name":"kw","foreground":"#FF0000","tags":["bold"]},
                    {"name":"dead","foreground":"#80001122","tags":["italic","strikethrough"]}
                ],
                "states":{"default":[{"pattern":"x","style":"kw"}]}}"##,
        )
        .unwrap();

    let mapping = rule.style_mapping.as_ref().unwrap();
    let kw_id = mapping.id_of("kw");
    let dead_id = mapping.id_of("dead");
    assert_ne!(kw_id, 0);

    let kw = rule.inline_style(kw_id).unwrap();
    assert_eq!(kw.foreground, 0xFFFF_0000);
    assert!(kw.is_bold && !kw.is_italic);

    let dead = rule.inline_style(dead_id).unwrap();
    assert_eq!(dead.foreground, 0x8000_1122);
    assert!(dead.is_italic && dead.is_strikethrough);

    // Token styles resolve through the per-rule mapping in inline mode.
    let token = &rule.state_rule(0).unwrap().token_rules[0];
    assert_eq!(token.group_style_id(0), kw_id);
}

const IMPORT_SOURCE: &str = r#"{
  "name": "base",
  "fileExtensions": [".b"],
  "states": {
    "default": [
      {"pattern": "@\\w+", "style": "keyword"},
      {"pattern": "'", "state": "quote", "style": "string"}
    ],
    "quote": [
      {"pattern": "'", "state": "default", "style": "string"},
      {"pattern": "[^']+", "style": "string"}
    ]
  }
}"#;

const IMPORTER: &str = r#"{
  "name": "host",
  "fileExtensions": [".h"],
  "states": {
    "default": [
      {"pattern": "\\d+", "style": "number"}
    ],
    "embedded": [
      {"pattern": "!", "state": "default", "style": "keyword"},
      {"importSyntax": "base"}
    ]
  }
}"#;

#[test]
fn test_import_merges_default_state_tokens() {
    let mut engine = engine();
    engine.compile_syntax_from_json(IMPORT_SOURCE).unwrap();
    let rule = engine.compile_syntax_from_json(IMPORTER).unwrap();

    let embedded_id = rule.state_id("embedded").unwrap();
    let embedded = rule.state_rule(embedded_id).unwrap();
    // Own token first, then the source's default-state tokens.
    assert_eq!(embedded.token_rules.len(), 3);
    assert_eq!(embedded.token_rules[1].pattern, "@\\w+");

    // The source's default state maps to the importing state; its "quote"
    // state is copied under an offset id with a mangled name.
    let imported_quote = rule.state_id("__imported_base_quote").unwrap();
    assert!(imported_quote > embedded_id);
    assert_eq!(imported_quote, rule.max_state_id());
    assert_eq!(embedded.token_rules[2].goto_state, imported_quote);

    let quote = rule.state_rule(imported_quote).unwrap();
    assert_eq!(quote.token_rules[0].goto_state, embedded_id);
    // Imported states are merged into the alternation pass like any other.
    assert!(quote.regex.is_some());
}

#[test]
fn test_import_with_undefined_macro_is_skipped() {
    let mut engine = engine();
    engine.compile_syntax_from_json(IMPORT_SOURCE).unwrap();
    let guarded = r##"{
      "name": "host",
      "fileExtensions": [".h"],
      "states": {
        "default": [
          {"pattern": "\\d+", "style": "number"},
          {"importSyntax": "base", "#ifdef": "WITH_BASE"}
        ]
      }
    }"##;

    let rule = engine.compile_syntax_from_json(guarded).unwrap();
    assert_eq!(rule.state_rule(0).unwrap().token_rules.len(), 1);
    assert!(rule.state_id("__imported_base_quote").is_none());

    engine.define_macro("WITH_BASE");
    assert!(engine.is_macro_defined("WITH_BASE"));
    let rule = engine.compile_syntax_from_json(guarded).unwrap();
    assert_eq!(rule.state_rule(0).unwrap().token_rules.len(), 3);
    assert!(rule.state_id("__imported_base_quote").is_some());
}

#[test]
fn test_import_of_unknown_syntax_fails() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_json(
            r#"{"name":"t","fileExtension":".t","states":{"default":[
                {"pattern":"x","style":"keyword"},
                {"importSyntax":"missing"}
            ]}}"#,
        )
        .unwrap_err();
    assert!(matches!(err, SyntaxError::StateInvalid(_)));
    assert_eq!(err.context(), "missing");
}

#[test]
fn test_engine_lookup_by_name_and_extension() {
    let mut engine = engine();
    engine.compile_syntax_from_json(MINI_SYNTAX).unwrap();

    assert!(engine.syntax_rule_by_name("mini").is_some());
    assert!(engine.syntax_rule_by_name("maxi").is_none());
    assert!(engine.syntax_rule_by_extension(".m").is_some());
    assert!(engine.syntax_rule_by_extension("m").is_some());
    assert!(engine.syntax_rule_by_extension(".M").is_none());
    assert!(engine.create_analyzer_by_name("mini").is_some());
    assert!(engine.create_analyzer_by_extension(".x").is_none());
}

#[test]
fn test_compile_from_missing_file() {
    let mut engine = engine();
    let err = engine
        .compile_syntax_from_file("/nonexistent/grammar.json")
        .unwrap_err();
    assert!(matches!(err, SyntaxError::FileNotExists(_)));
    assert_eq!(err.code(), -6);
}

#[test]
fn test_default_state_constants() {
    assert_eq!(SyntaxRule::DEFAULT_STATE_ID, 0);
    assert_eq!(SyntaxRule::DEFAULT_STATE_NAME, "default");
}
