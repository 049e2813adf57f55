//! Stage bodies. Each composes facade calls and is wrapped by [`timed`].

use std::path::{Path, PathBuf};
use std::thread;

use crate::config::ReleaseConfig;
use crate::error::{Error, Result};
use crate::files::{FileSet, Files, Layout};
use crate::package::PackageInfo;
use crate::replace::{replace_files, ReplacementRule};
use crate::timing::{timed, Reporter, TaskTiming};

use super::manifest::{manifest_rules, min_version_rule, minimum_version, FeedQuery};
use super::types::{RunState, Stage};

pub(crate) const INFO_FILE: &str = "info.txt";
pub(crate) const MERGED_SCRIPT: &str = "extension-merged.js";

/// Everything a stage may read. Paths are absolute.
pub(crate) struct StageContext<'a> {
    pub config: &'a ReleaseConfig,
    pub package: &'a PackageInfo,
    pub files: &'a Files,
    pub reporter: &'a dyn Reporter,
    pub src: PathBuf,
    pub dist: PathBuf,
    pub tmp: PathBuf,
}

type Task<'a, T> = Box<dyn FnOnce() -> Result<T> + Send + 'a>;

/// Run independent tasks on scoped threads and wait for all of them.
/// The first error in task order wins.
fn run_concurrently<'a, T: Send + 'a>(tasks: Vec<Task<'a, T>>) -> Result<Vec<T>> {
    thread::scope(|scope| {
        let handles: Vec<_> = tasks.into_iter().map(|task| scope.spawn(task)).collect();

        let results: Vec<Result<T>> = handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(Error::internal_unexpected("Stage worker thread panicked")))
            })
            .collect();

        results.into_iter().collect()
    })
}

/// Root-relative glob for a configured directory.
fn dir_pattern(dir: &Path, suffix: Option<&str>) -> String {
    let dir = dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    match suffix {
        Some(suffix) => format!("{}/{}", dir, suffix),
        None => dir.to_string(),
    }
}

pub(crate) fn run(stage: Stage, ctx: &StageContext, state: &mut RunState) -> Result<Vec<TaskTiming>> {
    match stage {
        Stage::CleanPre => clean_pre(ctx).map(|t| vec![t]),
        Stage::EslintCheck => eslint_check(ctx),
        Stage::UpdateMinimumChromeVersion => update_minimum_chrome_version(ctx, state).map(|t| vec![t]),
        Stage::RemoteJs => remote_js(ctx),
        Stage::Js => js(ctx).map(|t| vec![t]),
        Stage::Css => css(ctx).map(|t| vec![t]),
        Stage::Img => img(ctx).map(|t| vec![t]),
        Stage::Json => json(ctx).map(|t| vec![t]),
        Stage::Html => html(ctx).map(|t| vec![t]),
        Stage::Zip => zip(ctx, state).map(|t| vec![t]),
        Stage::CleanPost => clean_post(ctx).map(|t| vec![t]),
    }
}

fn clean_pre(ctx: &StageContext) -> Result<TaskTiming> {
    timed(ctx.reporter, Stage::CleanPre.message(), || {
        let paths = &ctx.config.paths;
        ctx.files.remove(&[
            dir_pattern(&paths.tmp, Some("*")),
            dir_pattern(&paths.dist, Some("*")),
            "*.zip".to_string(),
        ])?;

        let stamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        ctx.files.create_file(&ctx.tmp.join(INFO_FILE), stamp.as_bytes())?;
        Ok(None)
    })
}

fn eslint_check(ctx: &StageContext) -> Result<Vec<TaskTiming>> {
    let lint = &ctx.config.lint;
    let mut timings = Vec::with_capacity(lint.dirs.len());

    for dir in &lint.dirs {
        let timing = timed(ctx.reporter, &Stage::EslintCheck.message_for(dir), || {
            let output = ctx.files.cmd(&lint.command.replace("{dir}", dir))?;
            let diagnostics = output.stdout.trim();
            if !diagnostics.is_empty() {
                return Err(Error::lint_failed(dir, diagnostics));
            }
            Ok(None)
        })?;
        timings.push(timing);
    }

    Ok(timings)
}

fn update_minimum_chrome_version(ctx: &StageContext, state: &mut RunState) -> Result<TaskTiming> {
    let chrome = &ctx.config.chrome;

    timed(ctx.reporter, Stage::UpdateMinimumChromeVersion.message(), || {
        let feed = ctx.files.get_remote_content(&chrome.feed_url)?;
        let minimum = minimum_version(
            &feed,
            &FeedQuery {
                url: &chrome.feed_url,
                platform: &chrome.platform,
                channel: &chrome.channel,
                offset: chrome.offset,
            },
        )?;

        let manifest = ctx.src.join(&chrome.manifest);
        replace_files(&[(manifest.clone(), manifest)], &[min_version_rule(minimum)])?;

        state.minimum_chrome_version = Some(minimum);
        Ok(Some(format!("v{}", minimum)))
    })
}

fn remote_js(ctx: &StageContext) -> Result<Vec<TaskTiming>> {
    let remote = &ctx.config.remote;
    let lib_dir = ctx.src.join(&remote.dir);

    let tasks: Vec<Task<'_, TaskTiming>> = remote
        .files
        .iter()
        .map(|entry| {
            let destination = lib_dir.join(&entry.file);
            let url = format!("{}{}", remote.base_url, entry.url_path);

            Box::new(move || {
                timed(ctx.reporter, &Stage::RemoteJs.message_for(&entry.file), || {
                    match ctx.files.get_remote_content(&url) {
                        Ok(content) => {
                            ctx.files.create_file(&destination, content.as_bytes())?;
                            Ok(None)
                        }
                        Err(err) if remote.keep_stale => {
                            log_status!("remoteJs", "Keeping vendored {}: {}", entry.file, err.message);
                            Ok(Some("kept stale copy".to_string()))
                        }
                        Err(err) => Err(err),
                    }
                })
            }) as Task<'_, TaskTiming>
        })
        .collect();

    run_concurrently(tasks)
}

fn js(ctx: &StageContext) -> Result<TaskTiming> {
    let scripts = &ctx.config.scripts;

    timed(ctx.reporter, Stage::Js.message(), || {
        let merged = ctx.tmp.join(MERGED_SCRIPT);
        let sources: Vec<PathBuf> = scripts.merge.iter().map(|s| ctx.src.join(s)).collect();
        ctx.files.concat(&sources, &merged)?;

        let output = ctx.tmp.join(&scripts.output);
        replace_files(
            &[(merged, output)],
            &[ReplacementRule::new(scripts.wrapper_pattern.as_str(), "")],
        )?;

        let js_dir = ctx.dist.join("js");
        let lib_dir = js_dir.join("lib");
        let main_sets = [
            FileSet::new(&ctx.tmp, [scripts.output.as_str()]),
            FileSet::new(&ctx.src, scripts.standalone.iter().map(String::as_str)),
        ];
        let lib_sets = [FileSet::new(&ctx.src, scripts.libs.iter().map(String::as_str))];

        let tasks: Vec<Task<'_, usize>> = vec![
            Box::new(|| ctx.files.minify(&main_sets, &js_dir, Layout::Flatten)),
            Box::new(|| ctx.files.minify(&lib_sets, &lib_dir, Layout::Flatten)),
        ];
        run_concurrently(tasks)?;
        Ok(None)
    })
}

fn css(ctx: &StageContext) -> Result<TaskTiming> {
    timed(ctx.reporter, Stage::Css.message(), || {
        let set = FileSet::new(&ctx.src, ctx.config.styles.include.iter().map(String::as_str));
        ctx.files.minify(&[set], &ctx.dist.join("css"), Layout::Flatten)?;
        Ok(None)
    })
}

fn img(ctx: &StageContext) -> Result<TaskTiming> {
    let images = &ctx.config.images;

    timed(ctx.reporter, Stage::Img.message(), || {
        let set = FileSet::new(&ctx.src, images.include.iter().map(String::as_str))
            .excluding(images.exclude.iter().map(String::as_str));
        ctx.files.copy(&set, &ctx.dist, Layout::Relative)?;
        Ok(None)
    })
}

fn json(ctx: &StageContext) -> Result<TaskTiming> {
    let manifest = &ctx.config.chrome.manifest;

    timed(ctx.reporter, Stage::Json.message(), || {
        let script = format!("js/{}", ctx.config.scripts.output);
        replace_files(
            &[(ctx.src.join(manifest), ctx.tmp.join(manifest))],
            &manifest_rules(&script, &ctx.package.version),
        )?;

        let manifest_sets = [FileSet::new(&ctx.tmp, [manifest.as_str()])];
        let locale_sets = [FileSet::new(
            &ctx.src,
            ctx.config.json.locales.iter().map(String::as_str),
        )];

        let tasks: Vec<Task<'_, usize>> = vec![
            Box::new(|| ctx.files.minify(&manifest_sets, &ctx.dist, Layout::Relative)),
            Box::new(|| ctx.files.minify(&locale_sets, &ctx.dist, Layout::Relative)),
        ];
        run_concurrently(tasks)?;
        Ok(None)
    })
}

fn html(ctx: &StageContext) -> Result<TaskTiming> {
    timed(ctx.reporter, Stage::Html.message(), || {
        let set = FileSet::new(&ctx.src, ctx.config.html.include.iter().map(String::as_str));
        ctx.files.minify(&[set], &ctx.dist, Layout::Relative)?;
        Ok(None)
    })
}

fn zip(ctx: &StageContext, state: &mut RunState) -> Result<TaskTiming> {
    timed(ctx.reporter, Stage::Zip.message(), || {
        let archive_name = ctx.package.archive_name();
        let summary = ctx
            .files
            .zip_directory(&ctx.dist, &ctx.files.root().join(&archive_name))?;
        state.archive = Some(summary);
        Ok(Some(archive_name))
    })
}

fn clean_post(ctx: &StageContext) -> Result<TaskTiming> {
    timed(ctx.reporter, Stage::CleanPost.message(), || {
        ctx.files.remove(&[dir_pattern(&ctx.config.paths.tmp, None)])?;
        Ok(None)
    })
}
