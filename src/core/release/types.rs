use serde::Serialize;
use std::path::PathBuf;

use crate::files::ArchiveSummary;
use crate::timing::TaskTiming;

/// The fixed, totally ordered stages of a release run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    CleanPre,
    EslintCheck,
    UpdateMinimumChromeVersion,
    RemoteJs,
    Js,
    Css,
    Img,
    Json,
    Html,
    Zip,
    CleanPost,
}

impl Stage {
    pub const ALL: [Stage; 11] = [
        Stage::CleanPre,
        Stage::EslintCheck,
        Stage::UpdateMinimumChromeVersion,
        Stage::RemoteJs,
        Stage::Js,
        Stage::Css,
        Stage::Img,
        Stage::Json,
        Stage::Html,
        Stage::Zip,
        Stage::CleanPost,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::CleanPre => "cleanPre",
            Stage::EslintCheck => "eslintCheck",
            Stage::UpdateMinimumChromeVersion => "updateMinimumChromeVersion",
            Stage::RemoteJs => "remoteJs",
            Stage::Js => "js",
            Stage::Css => "css",
            Stage::Img => "img",
            Stage::Json => "json",
            Stage::Html => "html",
            Stage::Zip => "zip",
            Stage::CleanPost => "cleanPost",
        }
    }

    /// Completion message. `{}` is filled per sub-task for stages that time
    /// each lint directory or fetched file separately.
    pub fn message(self) -> &'static str {
        match self {
            Stage::CleanPre => "Cleaned tmp and dist directories",
            Stage::EslintCheck => "Performed eslint check for {}",
            Stage::UpdateMinimumChromeVersion => "Updated minimum chrome version",
            Stage::RemoteJs => "Fetched {}",
            Stage::Js => "Moved js files to dist directory",
            Stage::Css => "Moved css files to dist directory",
            Stage::Img => "Moved image files to dist directory",
            Stage::Json => "Moved json files to dist directory",
            Stage::Html => "Moved html files to dist directory",
            Stage::Zip => "Created zip file from dist directory",
            Stage::CleanPost => "Cleaned tmp directory",
        }
    }

    pub fn message_for(self, subject: &str) -> String {
        self.message().replace("{}", subject)
    }
}

/// One completed stage. `elapsed_ms` is wall time, so concurrent tasks
/// inside the stage overlap rather than add up.
#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub elapsed_ms: u128,
    pub timings: Vec<TaskTiming>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPaths {
    pub root: PathBuf,
    pub src: PathBuf,
    pub dist: PathBuf,
    pub tmp: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseRun {
    pub name: String,
    pub version: String,
    pub paths: ResolvedPaths,
    pub stages: Vec<StageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_chrome_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveSummary>,
    pub elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlanStep {
    pub name: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
    pub name: String,
    pub version: String,
    pub archive: String,
    pub paths: ResolvedPaths,
    pub steps: Vec<ReleasePlanStep>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StylesRun {
    pub output: PathBuf,
    pub files: usize,
    pub timing: TaskTiming,
}

/// Values produced by earlier stages and read by later ones.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    pub minimum_chrome_version: Option<u32>,
    pub archive: Option<ArchiveSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_listed_in_run_order() {
        let names: Vec<&str> = Stage::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "cleanPre",
                "eslintCheck",
                "updateMinimumChromeVersion",
                "remoteJs",
                "js",
                "css",
                "img",
                "json",
                "html",
                "zip",
                "cleanPost",
            ]
        );
    }

    #[test]
    fn serialized_name_matches_display_name() {
        for stage in Stage::ALL {
            assert_eq!(serde_json::to_value(stage).unwrap(), stage.name());
        }
    }

    #[test]
    fn per_item_messages_are_filled() {
        assert_eq!(
            Stage::EslintCheck.message_for("src/js"),
            "Performed eslint check for src/js"
        );
        assert_eq!(Stage::Css.message_for("ignored"), "Moved css files to dist directory");
    }
}
