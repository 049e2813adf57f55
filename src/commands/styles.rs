use clap::Args;
use serde::Serialize;

use extrelease::release::StylesRun;

use super::{CmdResult, ProjectArgs};

#[derive(Args)]
pub struct StylesArgs {
    #[command(flatten)]
    project: ProjectArgs,
}

#[derive(Serialize)]
#[serde(tag = "command")]
pub enum StylesOutput {
    #[serde(rename = "styles")]
    Compile { styles: StylesRun },
}

pub fn run(args: StylesArgs) -> CmdResult<StylesOutput> {
    let styles = args.project.load()?.styles()?;
    Ok((StylesOutput::Compile { styles }, 0))
}
