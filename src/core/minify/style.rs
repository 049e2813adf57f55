use std::path::Path;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleOutput {
    /// Release builds.
    Compressed,
    /// Development builds, readable in the browser's inspector.
    Expanded,
}

impl StyleOutput {
    fn grass_style(self) -> grass::OutputStyle {
        match self {
            StyleOutput::Compressed => grass::OutputStyle::Compressed,
            StyleOutput::Expanded => grass::OutputStyle::Expanded,
        }
    }
}

/// Compile a Sass or CSS file. Imports resolve relative to the file.
pub fn compile_style(path: &Path, output: StyleOutput) -> Result<String> {
    let options = grass::Options::default().style(output.grass_style());
    grass::from_path(path, &options)
        .map_err(|e| Error::minify_failed(&path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE: &str = "$c: red;\na {\n  b { color: $c; }\n}\n";

    #[test]
    fn compressed_output_has_no_whitespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.scss");
        fs::write(&path, SOURCE).unwrap();

        let css = compile_style(&path, StyleOutput::Compressed).unwrap();
        assert!(css.contains("a b{color:red}"), "got {css:?}");
    }

    #[test]
    fn expanded_output_is_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.scss");
        fs::write(&path, SOURCE).unwrap();

        let css = compile_style(&path, StyleOutput::Expanded).unwrap();
        assert!(css.contains("a b {\n  color: red;\n}"), "got {css:?}");
    }

    #[test]
    fn partials_are_resolved_through_imports() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_vars.scss"), "$w: 10px;\n").unwrap();
        let path = dir.path().join("app.scss");
        fs::write(&path, "@import \"vars\";\n.x { width: $w; }\n").unwrap();

        let css = compile_style(&path, StyleOutput::Compressed).unwrap();
        assert!(css.contains(".x{width:10px}"), "got {css:?}");
    }

    #[test]
    fn undefined_variable_is_a_minify_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.scss");
        fs::write(&path, "a { color: $missing; }\n").unwrap();

        let err = compile_style(&path, StyleOutput::Compressed).unwrap_err();
        assert_eq!(err.code.as_str(), "minify.failed");
    }
}
