use clap::Args;
use serde::Serialize;

use extrelease::release::ReleasePlan;

use super::{CmdResult, ProjectArgs};

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum PlanOutput {
    #[serde(rename = "plan")]
    Plan { plan: ReleasePlan },
}

pub fn run(args: PlanArgs) -> CmdResult<PlanOutput> {
    let plan = args.project.load()?.plan();
    Ok((PlanOutput::Plan { plan }, 0))
}
