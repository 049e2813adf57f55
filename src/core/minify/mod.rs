//! Format-specific minifiers, chosen by file extension.
//!
//! - `script` - oxc parse, compress and compact print for JavaScript
//! - `style` - Sass compilation in compressed style
//! - `markup` - HTML comment removal and whitespace collapsing
//! - `json` - compact re-serialization

mod json;
mod markup;
mod script;
mod style;

pub use json::minify_json;
pub use markup::minify_html;
pub use script::minify_script;
pub use style::{compile_style, StyleOutput};

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::utils::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Style,
    Markup,
    Json,
    Other,
}

impl AssetKind {
    pub fn of(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("js") | Some("mjs") => AssetKind::Script,
            Some("css") | Some("scss") => AssetKind::Style,
            Some("html") | Some("htm") => AssetKind::Markup,
            Some("json") => AssetKind::Json,
            _ => AssetKind::Other,
        }
    }
}

/// Name of the minified output for `path` (stylesheets always become `.css`).
pub fn output_name(path: &Path) -> PathBuf {
    match AssetKind::of(path) {
        AssetKind::Style => path.with_extension("css"),
        _ => path.to_path_buf(),
    }
}

/// Sass partials are only compiled through the files that import them.
pub fn is_partial(path: &Path) -> bool {
    AssetKind::of(path) == AssetKind::Style
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('_'))
}

/// Dispatches each file to the minifier for its format.
#[derive(Debug, Clone, Default)]
pub struct Minifier {
    banner: Option<String>,
}

impl Minifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every minified script with `banner`.
    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner;
        self
    }

    pub fn minify_file(&self, path: &Path) -> Result<Vec<u8>> {
        let display = path.display().to_string();

        match AssetKind::of(path) {
            AssetKind::Script => {
                let source = io::read_file(path, "read script")?;
                let minified = minify_script(path, &source)?;
                let out = match &self.banner {
                    Some(banner) => format!("{}{}", banner, minified),
                    None => minified,
                };
                Ok(out.into_bytes())
            }
            AssetKind::Style => Ok(compile_style(path, StyleOutput::Compressed)?.into_bytes()),
            AssetKind::Markup => {
                let source = io::read_file(path, "read markup")?;
                Ok(minify_html(&source).into_bytes())
            }
            AssetKind::Json => {
                let source = io::read_file(path, "read json")?;
                Ok(minify_json(&source, &display)?.into_bytes())
            }
            AssetKind::Other => io::read_bytes(path, "read asset"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn kind_follows_extension() {
        assert_eq!(AssetKind::of(Path::new("a/b.js")), AssetKind::Script);
        assert_eq!(AssetKind::of(Path::new("a/b.SCSS")), AssetKind::Style);
        assert_eq!(AssetKind::of(Path::new("a/b.css")), AssetKind::Style);
        assert_eq!(AssetKind::of(Path::new("b.htm")), AssetKind::Markup);
        assert_eq!(AssetKind::of(Path::new("messages.json")), AssetKind::Json);
        assert_eq!(AssetKind::of(Path::new("icon.png")), AssetKind::Other);
        assert_eq!(AssetKind::of(Path::new("LICENSE")), AssetKind::Other);
    }

    #[test]
    fn stylesheets_are_renamed_to_css() {
        assert_eq!(output_name(Path::new("scss/app.scss")), PathBuf::from("scss/app.css"));
        assert_eq!(output_name(Path::new("js/app.js")), PathBuf::from("js/app.js"));
    }

    #[test]
    fn partials_are_detected() {
        assert!(is_partial(Path::new("scss/_vars.scss")));
        assert!(!is_partial(Path::new("scss/app.scss")));
        assert!(!is_partial(Path::new("js/_private.js")));
    }

    #[test]
    fn banner_is_prepended_to_scripts_only() {
        let dir = TempDir::new().unwrap();
        let js = dir.path().join("a.js");
        let json = dir.path().join("a.json");
        fs::write(&js, "window.answer = 42; // meaning\n").unwrap();
        fs::write(&json, "{ \"a\": 1 }").unwrap();

        let minifier = Minifier::new().with_banner(Some("/*! (c) A under MIT */\n".to_string()));

        let out = String::from_utf8(minifier.minify_file(&js).unwrap()).unwrap();
        assert!(out.starts_with("/*! (c) A under MIT */\n"), "got {out:?}");
        assert!(out.contains("window.answer=42"));
        assert!(!out.contains("meaning"));

        let out = String::from_utf8(minifier.minify_file(&json).unwrap()).unwrap();
        assert_eq!(out, "{\"a\":1}");
    }

    #[test]
    fn unknown_formats_pass_through() {
        let dir = TempDir::new().unwrap();
        let txt = dir.path().join("notes.txt");
        fs::write(&txt, "  keep   me  ").unwrap();

        let out = Minifier::new().minify_file(&txt).unwrap();
        assert_eq!(out, b"  keep   me  ");
    }
}
