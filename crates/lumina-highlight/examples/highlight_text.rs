use lumina_highlight::{HighlightConfig, HighlightEngine};

const SYNTAX: &str = r#"{
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

fn main() {
    let mut engine = HighlightEngine::new(HighlightConfig::default());
    engine.register_style_name("keyword", 1);
    engine.register_style_name("string", 2);
    engine.register_style_name("number", 3);
    engine.register_style_name("comment", 4);
    engine.compile_syntax_from_json(SYNTAX).unwrap();

    let analyzer = engine.create_analyzer_by_extension(".m").unwrap();
    let highlight = analyzer.analyze("if 1 /* open\nstill comment */ return \"done\"");

    for (line, line_highlight) in highlight.lines.iter().enumerate() {
        for span in &line_highlight.spans {
            println!(
                "line {line} [{:>2}..{:<2}] {}",
                span.range.start.column,
                span.range.end.column,
                engine.style_name(span.style_id),
            );
        }
    }
}
