use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{plan, release, styles};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "extrelease")]
#[command(version = VERSION)]
#[command(about = "Release build pipeline for browser extensions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full release pipeline and package the extension
    Release(release::ReleaseArgs),
    /// Show the stage order and resolved paths without running anything
    Plan(plan::PlanArgs),
    /// Compile stylesheets into the source tree for development
    Styles(styles::StylesArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let (json_result, exit_code) = commands::run_json(cli.command);
    if let Err(err) = output::print_json_result(json_result) {
        eprintln!("{}", err.message);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
