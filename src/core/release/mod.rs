//! The release pipeline.
//!
//! A run walks [`Stage::ALL`] strictly in order. Sub-tasks inside the
//! `remoteJs`, `js` and `json` stages run concurrently, but a stage only
//! returns once all of them have finished.

mod manifest;
mod pipeline;
mod stages;
mod types;

pub use manifest::{manifest_rules, min_version_rule, minimum_version, FeedPlatform, FeedQuery, FeedVersion};
pub use pipeline::Release;
pub use types::{
    ReleasePlan, ReleasePlanStep, ReleaseRun, ResolvedPaths, Stage, StageRecord, StylesRun,
};
