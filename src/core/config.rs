//! Release configuration.
//!
//! Every value has a default matching the extension's historical build
//! script, so a project only needs a `release.json` to override what differs.
//! The configuration is loaded once and never mutated during a run.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::io;

pub const CONFIG_FILENAME: &str = "release.json";

/// Root configuration structure for release.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReleaseConfig {
    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub lint: LintConfig,

    #[serde(default)]
    pub chrome: ChromeVersionConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub scripts: ScriptConfig,

    #[serde(default)]
    pub styles: StyleConfig,

    #[serde(default)]
    pub images: ImageConfig,

    #[serde(default)]
    pub json: JsonConfig,

    #[serde(default)]
    pub html: HtmlConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Logical path roles, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_src")]
    pub src: PathBuf,
    #[serde(default = "default_dist")]
    pub dist: PathBuf,
    #[serde(default = "default_tmp")]
    pub tmp: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LintConfig {
    /// Command template; `{dir}` is replaced with each entry of `dirs`.
    #[serde(default = "default_lint_command")]
    pub command: String,
    #[serde(default = "default_lint_dirs")]
    pub dirs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChromeVersionConfig {
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_channel")]
    pub channel: String,
    /// How many major versions behind stable the manifest may require.
    #[serde(default = "default_offset")]
    pub offset: u32,
    /// Manifest path relative to `paths.src`.
    #[serde(default = "default_manifest")]
    pub manifest: String,
}

/// One vendored script refreshed from its canonical remote source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteFile {
    /// File name written under `remote.dir`.
    pub file: String,
    /// Path appended to `remote.base_url`.
    pub url_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_base_url")]
    pub base_url: String,
    /// Destination directory relative to `paths.src`.
    #[serde(default = "default_remote_dir")]
    pub dir: String,
    #[serde(default = "default_remote_files")]
    pub files: Vec<RemoteFile>,
    /// Keep the vendored copy when a fetch fails instead of aborting.
    #[serde(default)]
    pub keep_stale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Core scripts merged, in this order, into `output`.
    #[serde(default = "default_merge")]
    pub merge: Vec<String>,
    #[serde(default = "default_script_output")]
    pub output: String,
    /// Boilerplate stripped from the merged file, between two wrapped scripts.
    #[serde(default = "default_wrapper_pattern")]
    pub wrapper_pattern: String,
    #[serde(default = "default_standalone")]
    pub standalone: Vec<String>,
    #[serde(default = "default_libs")]
    pub libs: Vec<String>,
    /// Prefix scripts with a license banner built from package.json.
    #[serde(default = "default_true")]
    pub banner: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    #[serde(default = "default_style_include")]
    pub include: Vec<String>,
    /// Development output directory relative to `paths.src`.
    #[serde(default = "default_style_dev_output")]
    pub dev_output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_include")]
    pub include: Vec<String>,
    #[serde(default = "default_image_exclude")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonConfig {
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    #[serde(default = "default_html_include")]
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout; 0 disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// =============================================================================
// Default value functions (match the historical build script)
// =============================================================================

fn default_src() -> PathBuf {
    PathBuf::from("src")
}

fn default_dist() -> PathBuf {
    PathBuf::from("dist")
}

fn default_tmp() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_lint_command() -> String {
    "eslint --fix {dir}/**/*.js".to_string()
}

fn default_lint_dirs() -> Vec<String> {
    vec!["build".to_string(), "src/js".to_string()]
}

fn default_feed_url() -> String {
    "https://omahaproxy.appspot.com/all.json".to_string()
}

fn default_platform() -> String {
    "win64".to_string()
}

fn default_channel() -> String {
    "stable".to_string()
}

fn default_offset() -> u32 {
    4
}

fn default_manifest() -> String {
    "manifest.json".to_string()
}

fn default_remote_base_url() -> String {
    "https://raw.githubusercontent.com/Kiuryy/".to_string()
}

fn default_remote_dir() -> String {
    "js/lib".to_string()
}

fn default_remote_files() -> Vec<RemoteFile> {
    vec![RemoteFile {
        file: "jsu.js".to_string(),
        url_path: "jsu/master/src/js/jsu.js".to_string(),
    }]
}

fn default_merge() -> Vec<String> {
    vec!["js/extension.js".to_string(), "js/init.js".to_string()]
}

fn default_script_output() -> String {
    "extension.js".to_string()
}

fn default_wrapper_pattern() -> String {
    r#"\}\)\(jsu\);[\s\S]*?\(\$\s*=>\s*\{[\s\S]*?"use strict";"#.to_string()
}

fn default_standalone() -> Vec<String> {
    vec!["js/settings.js".to_string(), "js/background.js".to_string()]
}

fn default_libs() -> Vec<String> {
    vec!["js/lib/jsu.js".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_style_include() -> Vec<String> {
    vec!["scss/*.scss".to_string()]
}

fn default_style_dev_output() -> String {
    "css".to_string()
}

fn default_image_include() -> Vec<String> {
    vec!["img/**/*".to_string()]
}

fn default_image_exclude() -> Vec<String> {
    vec!["**/*.xcf".to_string(), "img/icon/dev/**".to_string()]
}

fn default_locales() -> Vec<String> {
    vec!["_locales/**/*.json".to_string()]
}

fn default_html_include() -> Vec<String> {
    vec!["html/**/*.html".to_string()]
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("extrelease/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            src: default_src(),
            dist: default_dist(),
            tmp: default_tmp(),
        }
    }
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            command: default_lint_command(),
            dirs: default_lint_dirs(),
        }
    }
}

impl Default for ChromeVersionConfig {
    fn default() -> Self {
        Self {
            feed_url: default_feed_url(),
            platform: default_platform(),
            channel: default_channel(),
            offset: default_offset(),
            manifest: default_manifest(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_remote_base_url(),
            dir: default_remote_dir(),
            files: default_remote_files(),
            keep_stale: false,
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            merge: default_merge(),
            output: default_script_output(),
            wrapper_pattern: default_wrapper_pattern(),
            standalone: default_standalone(),
            libs: default_libs(),
            banner: default_true(),
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            include: default_style_include(),
            dev_output: default_style_dev_output(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            include: default_image_include(),
            exclude: default_image_exclude(),
        }
    }
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            locales: default_locales(),
        }
    }
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            include: default_html_include(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl PathConfig {
    pub fn src(&self, root: &Path) -> PathBuf {
        root.join(&self.src)
    }

    pub fn dist(&self, root: &Path) -> PathBuf {
        root.join(&self.dist)
    }

    pub fn tmp(&self, root: &Path) -> PathBuf {
        root.join(&self.tmp)
    }
}

impl ReleaseConfig {
    /// Load `explicit` if given, otherwise `<root>/release.json` when present,
    /// otherwise the defaults.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILENAME);
                if !candidate.exists() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = io::read_file(&path, "read release config")?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| Error::config_invalid_json(path.display().to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("paths.src", &self.paths.src),
            ("paths.dist", &self.paths.dist),
            ("paths.tmp", &self.paths.tmp),
        ] {
            if value.as_os_str().is_empty() {
                return Err(Error::config_invalid_value(key, None, "path cannot be empty"));
            }
        }

        // dist and tmp are wiped on every run.
        let src = lexical(&self.paths.src);
        for (key, value) in [("paths.dist", &self.paths.dist), ("paths.tmp", &self.paths.tmp)] {
            let problem = match lexical(value) {
                None => Some("must stay inside the project root"),
                Some(path) if path.as_os_str().is_empty() => Some("cannot be the project root"),
                Some(path) if src.as_ref().is_some_and(|src| src.starts_with(&path)) => {
                    Some("cannot be src or contain it")
                }
                Some(_) => None,
            };
            if let Some(problem) = problem {
                return Err(Error::config_invalid_value(
                    key,
                    Some(value.display().to_string()),
                    problem,
                ));
            }
        }

        if self.scripts.output.trim().is_empty() {
            return Err(Error::config_invalid_value(
                "scripts.output",
                None,
                "output file name cannot be empty",
            ));
        }

        if !self.lint.command.contains("{dir}") && !self.lint.dirs.is_empty() {
            return Err(Error::config_invalid_value(
                "lint.command",
                Some(self.lint.command.clone()),
                "command must contain the {dir} placeholder",
            ));
        }

        Ok(())
    }
}

/// `path` with `.` and `..` resolved lexically; `None` when it climbs above
/// the directory it is relative to.
fn lexical(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ReleaseConfig::load(dir.path(), None).unwrap();

        assert_eq!(config.paths.src, PathBuf::from("src"));
        assert_eq!(config.lint.dirs, vec!["build", "src/js"]);
        assert_eq!(config.chrome.offset, 4);
        assert_eq!(config.remote.files.len(), 1);
        assert_eq!(config.scripts.merge, vec!["js/extension.js", "js/init.js"]);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "chrome": { "offset": 2 }, "paths": { "dist": "build/out" } }"#,
        )
        .unwrap();

        let config = ReleaseConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.chrome.offset, 2);
        assert_eq!(config.chrome.platform, "win64");
        assert_eq!(config.paths.dist, PathBuf::from("build/out"));
        assert_eq!(config.paths.tmp, PathBuf::from("tmp"));
    }

    #[test]
    fn invalid_json_is_reported_with_path() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), "{ not json").unwrap();

        let err = ReleaseConfig::load(dir.path(), None).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_json");
        assert!(err.details["path"]
            .as_str()
            .unwrap()
            .ends_with(CONFIG_FILENAME));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = ReleaseConfig::load(dir.path(), Some(&dir.path().join("other.json")))
            .unwrap_err();
        assert_eq!(err.code.as_str(), "internal.io_error");
    }

    #[test]
    fn dist_equal_to_src_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "paths": { "dist": "src" } }"#,
        )
        .unwrap();

        let err = ReleaseConfig::load(dir.path(), None).unwrap_err();
        assert_eq!(err.code.as_str(), "config.invalid_value");
    }

    #[test]
    fn wiped_paths_cannot_cover_the_project_or_src() {
        for (paths, key) in [
            (r#"{ "dist": "." }"#, "paths.dist"),
            (r#"{ "dist": "./" }"#, "paths.dist"),
            (r#"{ "tmp": "src/.." }"#, "paths.tmp"),
            (r#"{ "src": "app/src", "dist": "app" }"#, "paths.dist"),
            (r#"{ "dist": "./src/" }"#, "paths.dist"),
            (r#"{ "tmp": "../tmp" }"#, "paths.tmp"),
        ] {
            let dir = TempDir::new().unwrap();
            fs::write(
                dir.path().join(CONFIG_FILENAME),
                format!(r#"{{ "paths": {} }}"#, paths),
            )
            .unwrap();

            let err = ReleaseConfig::load(dir.path(), None).unwrap_err();
            assert_eq!(err.code.as_str(), "config.invalid_value", "{paths}");
            assert_eq!(err.details["key"], key, "{paths}");
        }
    }

    #[test]
    fn sibling_and_nested_output_paths_are_accepted() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "paths": { "dist": "build/dist", "tmp": "./build/tmp/" } }"#,
        )
        .unwrap();

        let config = ReleaseConfig::load(dir.path(), None).unwrap();
        assert_eq!(config.paths.dist, PathBuf::from("build/dist"));
    }

    #[test]
    fn lint_command_needs_placeholder() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME),
            r#"{ "lint": { "command": "eslint ." } }"#,
        )
        .unwrap();

        let err = ReleaseConfig::load(dir.path(), None).unwrap_err();
        assert_eq!(err.details["key"], "lint.command");
    }
}
