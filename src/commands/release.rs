use clap::Args;
use serde::Serialize;

use extrelease::release::ReleaseRun;

use super::{CmdResult, ProjectArgs};

#[derive(Args)]
pub struct ReleaseArgs {
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum ReleaseOutput {
    #[serde(rename = "release")]
    Run { run: ReleaseRun },
}

pub fn run(args: ReleaseArgs) -> CmdResult<ReleaseOutput> {
    let release = args.project.load()?;
    let run = release.run().inspect_err(crate::output::print_fatal_diagnostic)?;
    Ok((ReleaseOutput::Run { run }, 0))
}
