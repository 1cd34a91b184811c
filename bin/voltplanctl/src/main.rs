//! ---
//! vp_section: "05-operator-interfaces"
//! vp_subsection: "binary"
//! vp_type: "source"
//! vp_scope: "code"
//! vp_description: "Operator CLI for panel load analysis and report export."
//! vp_version: "v0.1.0"
//! vp_owner: "panel-engineering"
//! ---
use anyhow::Result;
use clap::{Parser, Subcommand};

mod analyze;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "VoltPlan panel load analysis utility",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Compute circuit groups and per-phase load for an installation")]
    Analyze(analyze::AnalyzeArgs),
    #[command(about = "Compute and write JSON reports to a directory")]
    Export(analyze::ExportArgs),
    #[command(about = "Select the standard breaker for a circuit current")]
    Ladder(analyze::LadderArgs),
    #[command(about = "Validate a configuration file")]
    CheckConfig(analyze::CheckConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => analyze::run_analyze(args)?,
        Commands::Export(args) => analyze::run_export(args)?,
        Commands::Ladder(args) => analyze::run_ladder(args)?,
        Commands::CheckConfig(args) => analyze::run_check_config(args)?,
    }
    Ok(())
}
