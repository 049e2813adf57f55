use clap::Args;
use std::path::PathBuf;

use extrelease::release::Release;

pub type CmdResult<T> = extrelease::Result<(T, i32)>;

pub mod plan;
pub mod release;
pub mod styles;

/// Where to find the extension project.
#[derive(Args, Debug, Default, Clone)]
pub struct ProjectArgs {
    /// Project root containing package.json (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Release config file (defaults to <root>/release.json when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,
}

impl ProjectArgs {
    pub fn root(&self) -> extrelease::Result<PathBuf> {
        let root = match &self.root {
            Some(root) => PathBuf::from(shellexpand::tilde(root).to_string()),
            None => std::env::current_dir().map_err(|e| {
                extrelease::Error::internal_io(e.to_string(), Some("resolve current directory".to_string()))
            })?,
        };

        if !root.is_dir() {
            return Err(extrelease::Error::validation_invalid_argument(
                "root",
                "Project root is not a directory",
                Some(root.display().to_string()),
                None,
            ));
        }
        Ok(root)
    }

    pub fn config(&self) -> Option<PathBuf> {
        self.config
            .as_deref()
            .map(|path| PathBuf::from(shellexpand::tilde(path).to_string()))
    }

    pub fn load(&self) -> extrelease::Result<Release> {
        let root = self.root()?;
        Release::load(&root, self.config().as_deref())
    }
}

macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (extrelease::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Release(args) => dispatch!(args, release),
        crate::Commands::Plan(args) => dispatch!(args, plan),
        crate::Commands::Styles(args) => dispatch!(args, styles),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_keeps_file_name() {
        let args = ProjectArgs {
            root: None,
            config: Some("~/release.json".to_string()),
        };
        let config = args.config().unwrap();
        assert!(config.ends_with("release.json"));
    }

    #[test]
    fn explicit_root_is_used_verbatim() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = ProjectArgs {
            root: Some(dir.path().display().to_string()),
            config: None,
        };
        assert_eq!(args.root().unwrap(), dir.path());
        assert!(args.config().is_none());
    }

    #[test]
    fn missing_root_is_rejected() {
        let args = ProjectArgs {
            root: Some("/nonexistent/extension/root".to_string()),
            config: None,
        };
        let err = args.root().unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }
}
