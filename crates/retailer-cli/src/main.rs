mod check;
mod parts;
mod resolve;
mod solution;
mod workspace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "retailer")]
#[command(about = "Resolve solution compositions into package manifests")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a composition and print its manifest
    Resolve(resolve::ResolveArgs),

    /// Resolve a composition, check parts and dry run the manifest
    Check(check::CheckArgs),

    /// List packages in the parts catalogue
    Parts(parts::PartsArgs),

    /// Show a single solution, optionally with everything it pulls in
    Solution(solution::SolutionArgs),
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str()))
        .format_timestamp(None)
        .init();
}

fn run() -> Result<i32> {
    let args = Args::parse();
    init_logger(args.verbose);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create async runtime: {}", e))?;

    match args.command {
        Commands::Resolve(resolve_args) => rt.block_on(resolve::execute(resolve_args)),
        Commands::Check(check_args) => rt.block_on(check::execute(check_args)),
        Commands::Parts(parts_args) => rt.block_on(parts::execute(parts_args)),
        Commands::Solution(solution_args) => rt.block_on(solution::execute(solution_args)),
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("Error: {}", e);
            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            ExitCode::FAILURE
        }
    }
}
