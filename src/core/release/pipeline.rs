use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::files::{FileSet, Files};
use crate::http::{HttpClient, ReqwestClient};
use crate::minify::{self, compile_style, Minifier, StyleOutput};
use crate::package::PackageInfo;
use crate::timing::{timed, Reporter, StderrReporter};
use crate::utils::command::{CommandRunner, ShellRunner};
use crate::utils::io;

use super::stages::{self, StageContext};
use super::types::{
    ReleasePlan, ReleasePlanStep, ReleaseRun, ResolvedPaths, RunState, Stage, StageRecord,
    StylesRun,
};

const STYLES_MESSAGE: &str = "Compiled scss files to css directory";

/// One release invocation: configuration, package metadata and the
/// collaborators every stage goes through.
pub struct Release {
    config: ReleaseConfig,
    package: PackageInfo,
    files: Files,
    reporter: Arc<dyn Reporter>,
}

impl Release {
    pub fn new(
        root: impl Into<PathBuf>,
        config: ReleaseConfig,
        package: PackageInfo,
        runner: Arc<dyn CommandRunner>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let banner = if config.scripts.banner {
            package.banner()
        } else {
            None
        };
        let files = Files::new(root, runner, http).with_minifier(Minifier::new().with_banner(banner));

        Self {
            config,
            package,
            files,
            reporter: Arc::new(StderrReporter),
        }
    }

    /// Load `package.json` and the release config from `root` and wire the
    /// shell runner and HTTP client.
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = ReleaseConfig::load(root, config_path)?;
        let package = PackageInfo::load(root)?;
        let http = ReqwestClient::new(&config.http)?;

        log_status!("release", "{} {} in {}", package.name, package.version, root.display());

        Ok(Self::new(root, config, package, Arc::new(ShellRunner), Arc::new(http)))
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn config(&self) -> &ReleaseConfig {
        &self.config
    }

    pub fn package(&self) -> &PackageInfo {
        &self.package
    }

    pub fn paths(&self) -> ResolvedPaths {
        let root = self.files.root();
        ResolvedPaths {
            root: root.to_path_buf(),
            src: self.config.paths.src(root),
            dist: self.config.paths.dist(root),
            tmp: self.config.paths.tmp(root),
        }
    }

    fn context(&self) -> StageContext<'_> {
        let paths = self.paths();
        StageContext {
            config: &self.config,
            package: &self.package,
            files: &self.files,
            reporter: self.reporter.as_ref(),
            src: paths.src,
            dist: paths.dist,
            tmp: paths.tmp,
        }
    }

    /// The stage order and where the run would read and write.
    pub fn plan(&self) -> ReleasePlan {
        let steps = Stage::ALL
            .iter()
            .map(|stage| ReleasePlanStep {
                name: stage.name(),
                message: match stage {
                    Stage::EslintCheck => stage.message_for(&self.config.lint.dirs.join(", ")),
                    Stage::RemoteJs => {
                        let names: Vec<&str> =
                            self.config.remote.files.iter().map(|f| f.file.as_str()).collect();
                        stage.message_for(&names.join(", "))
                    }
                    _ => stage.message().to_string(),
                },
            })
            .collect();

        let mut warnings = Vec::new();
        if self.config.scripts.banner && self.package.banner().is_none() {
            warnings.push(
                "scripts.banner is enabled but package.json lacks author or license; scripts ship without a banner"
                    .to_string(),
            );
        }
        if self.config.remote.keep_stale {
            warnings.push("remote.keep_stale is enabled; failed fetches keep the vendored copy".to_string());
        }

        ReleasePlan {
            name: self.package.name.clone(),
            version: self.package.version.clone(),
            archive: self.package.archive_name(),
            paths: self.paths(),
            steps,
            warnings,
        }
    }

    /// Run every stage in order. The first failing stage aborts the run;
    /// its error carries the stage name and the stages already completed.
    pub fn run(&self) -> Result<ReleaseRun> {
        let start = Instant::now();
        let ctx = self.context();
        let mut state = RunState::default();
        let mut records: Vec<StageRecord> = Vec::with_capacity(Stage::ALL.len());

        for stage in Stage::ALL {
            let stage_start = Instant::now();
            match stages::run(stage, &ctx, &mut state) {
                Ok(timings) => records.push(StageRecord {
                    stage,
                    elapsed_ms: stage_start.elapsed().as_millis(),
                    timings,
                }),
                Err(err) => {
                    let completed: Vec<&str> = records.iter().map(|r| r.stage.name()).collect();
                    return Err(err
                        .with_detail("stage", json!(stage.name()))
                        .with_detail("completed", json!(completed)));
                }
            }
        }

        Ok(ReleaseRun {
            name: self.package.name.clone(),
            version: self.package.version.clone(),
            paths: self.paths(),
            stages: records,
            minimum_chrome_version: state.minimum_chrome_version,
            archive: state.archive,
            elapsed_ms: start.elapsed().as_millis(),
        })
    }

    /// Development build of the stylesheets: expanded CSS written next to
    /// the sources, outside of the release pipeline.
    pub fn styles(&self) -> Result<StylesRun> {
        let src = self.config.paths.src(self.files.root());
        let output = src.join(&self.config.styles.dev_output);
        let set = FileSet::new(&src, self.config.styles.include.iter().map(String::as_str));
        let mut files = 0;

        let timing = timed(self.reporter.as_ref(), STYLES_MESSAGE, || {
            for path in set.resolve()? {
                if minify::is_partial(&path) {
                    continue;
                }
                let css = compile_style(&path, StyleOutput::Expanded)?;
                let name = minify::output_name(Path::new(path.file_name().unwrap_or_default()));
                io::write_file_atomic(&output.join(name), css.as_bytes(), "write compiled style")?;
                files += 1;
            }
            Ok(Some(format!("{} file(s)", files)))
        })?;

        Ok(StylesRun {
            output,
            files,
            timing,
        })
    }
}
