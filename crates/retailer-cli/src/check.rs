//! Check command - resolve a composition and validate its manifest.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use retailer_core::catalogue::PartsCatalogue;
use retailer_core::composition::{DryRunOutcome, DryRunValidator};

use crate::workspace::{StoreArgs, Workspace};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Composition JSON file
    #[arg(value_name = "COMPOSITION")]
    pub composition: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Skip the dry run against the dependency resolver
    #[arg(long)]
    pub no_dry_run: bool,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: CheckArgs) -> Result<i32> {
    let workspace = Workspace::load(&args.store)?;
    let composition = workspace.load_composition(&args.composition)?;

    let validator = if args.no_dry_run {
        DryRunValidator::disabled("--no-dry-run given")
    } else {
        DryRunValidator::from_config(&workspace.config)?
    };
    let catalogue = PartsCatalogue::from_config(&workspace.config)?;

    let report = workspace
        .assembler()
        .assemble(&composition, &validator, catalogue.as_ref())
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(0);
    }

    for warning in &report.warnings {
        eprintln!("{} {}", style("Warning:").yellow().bold(), warning);
    }

    match &report.dry_run {
        DryRunOutcome::Passed => println!("{} Dry run passed", style("✓").green().bold()),
        DryRunOutcome::Failed { .. } => println!("{} Dry run failed", style("✗").red().bold()),
        DryRunOutcome::Skipped { .. } => println!("{} Dry run skipped", style("-").dim()),
    }

    println!(
        "{} solutions, {} parts",
        report.solutions.len(),
        report.manifest.required_parts.len()
    );

    let suggested = report.suggested_status();
    if suggested != report.status {
        println!(
            "Status: {} -> {}",
            style(report.status.label()).dim(),
            style(suggested.label()).bold()
        );
    } else {
        println!("Status: {}", report.status.label());
    }

    if report.needs_review() {
        println!("{}", style("The composition needs review.").yellow());
    }

    Ok(0)
}
