use lumina_core::{Document, TextPosition, TextRange};
use lumina_highlight::{HighlightConfig, HighlightEngine};

const SYNTAX: &str = r#"{
  "name": "mini",
  "fileExtensions": [".m"],
  "states": {
    "default": [
      {"pattern": "/\\*", "state": "block", "style": "comment"},
      {"pattern": "\\b(if|else|return)\\b", "style": "keyword"}
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
    engine.register_style_name("comment", 4);
    engine.compile_syntax_from_json(SYNTAX).unwrap();

    let document = Document::new("demo.m", "/* note\nreturn\nif x");
    let analyzer = engine.load_document(document).unwrap();
    analyzer.analyze();

    // The comment never closes, so every line exits in the block state.
    println!("states before: {:?}", analyzer.line_states());

    // Close the comment at the end of line 0; lines 1..2 re-highlight.
    let caret = TextPosition::new(0, 7);
    analyzer.analyze_incremental(&TextRange::collapsed(caret), " */");
    println!("states after:  {:?}", analyzer.line_states());
    println!("text:          {:?}", analyzer.document().text());

    for (line, line_highlight) in analyzer.highlight().lines.iter().enumerate() {
        for span in &line_highlight.spans {
            println!(
                "line {line} [{:>2}..{:<2}] style {}",
                span.range.start.column, span.range.end.column, span.style_id,
            );
        }
    }
}
