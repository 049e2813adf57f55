//! File operations used by the release stages.
//!
//! [`Files`] owns the project root and the injected process/network
//! collaborators. Relative paths are resolved against the root. Glob
//! patterns are expanded with `glob` and filtered with `glob-match`, always
//! on `/`-separated paths relative to the pattern's base.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::minify::{self, Minifier};
use crate::utils::command::{CommandOutput, CommandRunner};
use crate::utils::io;

/// Include/exclude globs evaluated relative to one base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSet {
    pub base: PathBuf,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Where matched files land under the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `dest/<file name>`
    Flatten,
    /// `dest/<path relative to base>`
    Relative,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub entries: usize,
    pub bytes: u64,
    pub sha256: String,
}

impl FileSet {
    pub fn new<S: Into<String>>(base: impl Into<PathBuf>, include: impl IntoIterator<Item = S>) -> Self {
        Self {
            base: base.into(),
            include: include.into_iter().map(Into::into).collect(),
            exclude: Vec::new(),
        }
    }

    pub fn excluding<S: Into<String>>(mut self, exclude: impl IntoIterator<Item = S>) -> Self {
        self.exclude = exclude.into_iter().map(Into::into).collect();
        self
    }

    /// Matched files (directories are skipped), sorted and deduplicated.
    pub fn resolve(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for pattern in &self.include {
            for path in expand(&self.base, pattern)? {
                if !path.is_file() {
                    continue;
                }
                let rel = relative_str(&path, &self.base);
                if self.exclude.iter().any(|ex| glob_match::glob_match(ex, &rel)) {
                    continue;
                }
                files.push(path);
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn target(&self, file: &Path, dest: &Path, layout: Layout) -> PathBuf {
        match layout {
            Layout::Flatten => match file.file_name() {
                Some(name) => dest.join(name),
                None => dest.to_path_buf(),
            },
            Layout::Relative => dest.join(file.strip_prefix(&self.base).unwrap_or(file)),
        }
    }
}

fn expand(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    // Only `pattern` carries glob syntax; the base is taken literally.
    let base = glob::Pattern::escape(&base.to_string_lossy());
    let full = Path::new(&base).join(pattern);
    let full = full.to_string_lossy();
    let paths = glob::glob(&full).map_err(|e| Error::validation_invalid_pattern(pattern, e.to_string()))?;

    paths
        .map(|entry| {
            entry.map_err(|e| Error::internal_io(e.to_string(), Some(format!("expand {}", pattern))))
        })
        .collect()
}

fn relative_str(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Filesystem, process and network operations rooted at a project directory.
#[derive(Clone)]
pub struct Files {
    root: PathBuf,
    runner: Arc<dyn CommandRunner>,
    http: Arc<dyn HttpClient>,
    minifier: Minifier,
}

impl Files {
    pub fn new(root: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            root: root.into(),
            runner,
            http,
            minifier: Minifier::new(),
        }
    }

    pub fn with_minifier(mut self, minifier: Minifier) -> Self {
        self.minifier = minifier;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Delete every entry matching a pattern, except those matching a
    /// `!`-prefixed pattern. Returns the number of entries removed.
    pub fn remove(&self, patterns: &[String]) -> Result<usize> {
        let (negated, positive): (Vec<&String>, Vec<&String>) =
            patterns.iter().partition(|p| p.starts_with('!'));
        let negated: Vec<&str> = negated.iter().map(|p| &p[1..]).collect();

        let mut matched = Vec::new();
        for pattern in positive {
            for path in expand(&self.root, pattern)? {
                let rel = relative_str(&path, &self.root);
                if !negated.iter().any(|n| glob_match::glob_match(n, &rel)) {
                    matched.push(path);
                }
            }
        }
        matched.sort();
        matched.dedup();

        let mut removed = 0;
        for path in matched {
            // Already gone with a parent directory removed above.
            let Ok(meta) = fs::symlink_metadata(&path) else {
                continue;
            };
            let result = if meta.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            result.map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("remove {}", path.display())))
            })?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Copy the files of `set` under `dest`. Returns the number copied.
    pub fn copy(&self, set: &FileSet, dest: &Path, layout: Layout) -> Result<usize> {
        let set = self.rooted(set);
        let dest = self.resolve(dest);
        let files = set.resolve()?;

        for file in &files {
            let target = set.target(file, &dest, layout);
            if let Some(parent) = target.parent() {
                io::ensure_dir(parent, "create copy destination")?;
            }
            fs::copy(file, &target).map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("copy {}", file.display())))
            })?;
        }
        Ok(files.len())
    }

    pub fn create_file(&self, path: &Path, content: &[u8]) -> Result<()> {
        io::write_file_atomic(&self.resolve(path), content, "create file")
    }

    /// Write the sources, in order and without separators, to `dest`.
    pub fn concat(&self, sources: &[PathBuf], dest: &Path) -> Result<()> {
        let mut merged = Vec::new();
        for source in sources {
            merged.extend(io::read_bytes(&self.resolve(source), "read concat source")?);
        }
        io::write_file_atomic(&self.resolve(dest), &merged, "write concat output")
    }

    /// Run a command line in the project root.
    pub fn cmd(&self, command_line: &str) -> Result<CommandOutput> {
        self.runner.run(command_line, &self.root)
    }

    pub fn get_remote_content(&self, url: &str) -> Result<String> {
        self.http.get_text(url)
    }

    /// Minify every file of `sets` under `dest`. Sass partials are skipped.
    /// Returns the number of files written.
    pub fn minify(&self, sets: &[FileSet], dest: &Path, layout: Layout) -> Result<usize> {
        let dest = self.resolve(dest);
        let mut written = 0;

        for set in sets {
            let set = self.rooted(set);
            for file in set.resolve()? {
                if minify::is_partial(&file) {
                    continue;
                }
                let output = self.minifier.minify_file(&file)?;
                let target = minify::output_name(&set.target(&file, &dest, layout));
                io::write_file_atomic(&target, &output, "write minified file")?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// Archive every file under `source` into `archive`, entries sorted and
    /// named relative to `source`.
    pub fn zip_directory(&self, source: &Path, archive: &Path) -> Result<ArchiveSummary> {
        let source = self.resolve(source);
        let archive = self.resolve(archive);
        let zip_err = |e: zip::result::ZipError| {
            Error::internal_io(e.to_string(), Some(format!("write archive {}", archive.display())))
        };

        if let Some(parent) = archive.parent() {
            io::ensure_dir(parent, "create archive directory")?;
        }
        let file = File::create(&archive).map_err(|e| {
            Error::internal_io(e.to_string(), Some(format!("create archive {}", archive.display())))
        })?;

        let mut writer = ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut entries = 0;

        for entry in WalkDir::new(&source).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("walk {}", source.display())))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let name = relative_str(entry.path(), &source);
            let content = io::read_bytes(entry.path(), "read archive entry")?;
            writer.start_file(name, options).map_err(zip_err)?;
            writer.write_all(&content).map_err(|e| {
                Error::internal_io(e.to_string(), Some(format!("write archive {}", archive.display())))
            })?;
            entries += 1;
        }
        writer.finish().map_err(zip_err)?;

        let bytes = io::read_bytes(&archive, "read archive")?;
        Ok(ArchiveSummary {
            sha256: format!("{:x}", Sha256::digest(&bytes)),
            bytes: bytes.len() as u64,
            path: archive,
            entries,
        })
    }

    fn rooted(&self, set: &FileSet) -> FileSet {
        FileSet {
            base: self.resolve(&set.base),
            ..set.clone()
        }
    }
}
