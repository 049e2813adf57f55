//! JavaScript minification on the oxc parser.
//!
//! The source is parsed, compressed, mangled (top-level names stay intact so
//! scripts sharing globals keep working) and printed compactly. `/*! ... */`
//! comments carry license text and are hoisted to the top of the output.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::{Codegen, CodegenOptions, LegalComment};
use oxc_minifier::{Minifier as Compressor, MinifierOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::error::{Error, Result};

/// Minify `source`, read from `path`. `.mjs` files are parsed as modules,
/// everything else as classic scripts.
pub fn minify_script(path: &Path, source: &str) -> Result<String> {
    let module = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mjs"));
    let source_type = SourceType::default().with_module(module);

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = parsed.errors.first() {
        return Err(Error::minify_failed(path.display().to_string(), error.to_string()));
    }
    if parsed.panicked {
        return Err(Error::minify_failed(path.display().to_string(), "parser gave up"));
    }

    let legal: Vec<&str> = parsed
        .program
        .comments
        .iter()
        .map(|comment| comment.span.source_text(source))
        .filter(|text| text.starts_with("/*!"))
        .collect();

    let mut program = parsed.program;
    let compressed = Compressor::new(MinifierOptions::default()).build(&allocator, &mut program);

    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: false,
            legal_comments: LegalComment::None,
            ..CodegenOptions::default()
        })
        .with_symbol_table(compressed.symbol_table)
        .build(&program)
        .code;

    if legal.is_empty() {
        Ok(code)
    } else {
        Ok(format!("{}\n{}", legal.join("\n"), code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(source: &str) -> String {
        minify_script(Path::new("a.js"), source).unwrap()
    }

    #[test]
    fn strips_comments_and_whitespace() {
        let source = "// helper\nfunction add(first, second) {\n    /* sum */\n    return first + second;\n}\nwindow.add = add;\n";
        let out = minify(source);

        assert!(out.len() < source.len());
        assert!(!out.contains("helper"));
        assert!(!out.contains("sum"));
        assert!(!out.contains("\n    "));
        assert!(out.contains("window.add="));
    }

    #[test]
    fn keeps_license_comments_at_the_top() {
        let out = minify("let a = 1;\n/*! MIT licensed */\nwindow.a = a; // note\n");
        assert!(out.starts_with("/*! MIT licensed */\n"));
        assert!(!out.contains("note"));
    }

    #[test]
    fn string_contents_survive() {
        let out = minify("window.s = \"a  //  b\";\nwindow.t = 'c /* d */ e';\n");
        assert!(out.contains("a  //  b"));
        assert!(out.contains("c /* d */ e"));
    }

    #[test]
    fn nested_template_literals_survive() {
        let out = minify("window.s = `${window.ok ? `a  b` : ''}  tail`;\n");
        assert!(out.contains("`a  b`"), "got {out:?}");
        assert!(out.contains("  tail`"), "got {out:?}");
    }

    #[test]
    fn regex_literals_survive() {
        let out = minify("window.r = /a  \\/ [/*] b/g;\nwindow.q = window.x / 2 / 3;\n");
        assert!(out.contains("/a  \\/ [/*] b/g"), "got {out:?}");
    }

    #[test]
    fn non_ascii_identifiers_are_accepted() {
        let out = minify("var a·b = 4;\nvar h = a·b / 2;\nwindow.h = h;\n");
        assert!(out.contains("a·b"), "got {out:?}");
    }

    #[test]
    fn top_level_names_are_kept() {
        let out = minify("function settingsDefaults(value) { return { value: value }; }\n");
        assert!(out.contains("settingsDefaults"), "got {out:?}");
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = minify_script(Path::new("broken.js"), "let = ;\n").unwrap_err();
        assert_eq!(err.code.as_str(), "minify.failed");
        assert_eq!(err.details["path"], "broken.js");
    }
}
